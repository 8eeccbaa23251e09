//! MSB-first bit packing
//!
//! Codes are between 2 and 16 bits wide and are packed with their most
//! significant bit first, straddling byte boundaries as needed.

use crate::error::{Error, Result};
use crate::util::OutputHelper;

/// Packs variable-width codes into an [OutputHelper]
///
/// At most 7 bits are ever held back. They are only written out once a
/// later code completes the byte, so a stream must end with a code whose
/// trailing bits can be dropped (see [END_OF_STREAM](crate::END_OF_STREAM)).
pub struct BitWriter<O> {
    out: O,
    bits: u32,
    nbits: u32,
}
impl<O: OutputHelper> BitWriter<O> {
    pub fn new(out: O) -> Self {
        Self {
            out,
            bits: 0,
            nbits: 0,
        }
    }

    /// Append the low `width` bits of `code`
    #[inline]
    pub fn put(&mut self, code: u32, width: u32) -> Result<()> {
        debug_assert!(width <= 16);
        debug_assert!(code >> width == 0);

        self.bits = (self.bits << width) | code;
        self.nbits += width;
        while self.nbits >= 8 {
            self.nbits -= 8;
            self.out.putc((self.bits >> self.nbits) as u8)?;
        }
        self.bits &= (1 << self.nbits) - 1;

        Ok(())
    }

    /// Return the underlying output, dropping any incomplete byte
    pub fn finish(self) -> O {
        self.out
    }

    /// Bits held back from the output
    #[cfg(test)]
    pub fn pending(&self) -> u32 {
        self.nbits
    }
}

/// Unpacks MSB-first codes from a byte slice
pub struct BitReader<'a> {
    inp: &'a [u8],
    pos: usize,
    buf: u64,
    count: u32,
}
impl<'a> BitReader<'a> {
    pub fn new(inp: &'a [u8]) -> Self {
        Self {
            inp,
            pos: 0,
            buf: 0,
            count: 0,
        }
    }

    #[inline]
    fn refill(&mut self, width: u32) -> Result<()> {
        if let Some(word) = self.inp[self.pos..].first_chunk::<4>() {
            self.buf = (self.buf << 32) | u32::from_be_bytes(*word) as u64;
            self.count += 32;
            self.pos += 4;
            return Ok(());
        }

        while self.count < width {
            let b = *self.inp.get(self.pos).ok_or(Error::TruncatedInput)?;
            self.buf = (self.buf << 8) | b as u64;
            self.count += 8;
            self.pos += 1;
        }
        Ok(())
    }

    /// Read a `width`-bit code
    ///
    /// Fails with [Error::TruncatedInput] if fewer than `width` bits remain.
    #[inline]
    pub fn get(&mut self, width: u32) -> Result<u32> {
        debug_assert!(width >= 1 && width <= 16);

        if self.count < width {
            self.refill(width)?;
        }
        self.count -= width;
        Ok(((self.buf >> self.count) & ((1 << width) - 1)) as u32)
    }

    /// Bytes of input pulled into the reader so far
    #[cfg(test)]
    pub fn consumed(&self) -> usize {
        self.pos
    }
}
