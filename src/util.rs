use crate::error::{Error, Result};

/// Byte-level output used by the bit packer
pub trait OutputHelper {
    /// Append one byte, or fail with [Error::ContentTooLarge] if there is no room
    fn putc(&mut self, c: u8) -> Result<()>;
}

/// Token-level output used by the decoder
///
/// Neither function writes anything when it returns an error.
pub trait OutputSink {
    /// Add a single literal byte to the output
    fn put_lit(&mut self, lit: u8) -> Result<()>;
    /// Add a backreference to the output
    ///
    /// An `offset` of 1 means the byte just before the current position.
    ///
    /// Copy `len` bytes, which as usual for LZ77 may exceed `offset`.
    fn put_backref(&mut self, offset: usize, len: usize) -> Result<()>;
    /// Number of bytes produced so far
    fn pos(&self) -> usize;
}

pub struct BufOutput<'a> {
    pub pos: usize,
    pub buf: &'a mut [u8],
}
impl<'a> From<&'a mut [u8]> for BufOutput<'a> {
    fn from(buf: &'a mut [u8]) -> Self {
        Self { pos: 0, buf }
    }
}

impl<'a> OutputHelper for BufOutput<'a> {
    #[inline]
    fn putc(&mut self, c: u8) -> Result<()> {
        let slot = self.buf.get_mut(self.pos).ok_or(Error::ContentTooLarge)?;
        *slot = c;
        self.pos += 1;
        Ok(())
    }
}

impl<'a> OutputSink for BufOutput<'a> {
    #[inline]
    fn put_lit(&mut self, lit: u8) -> Result<()> {
        self.putc(lit)
    }

    fn put_backref(&mut self, offset: usize, len: usize) -> Result<()> {
        if offset == 0 || offset > self.pos {
            return Err(Error::InvalidOffset);
        }
        if self.pos + len > self.buf.len() {
            return Err(Error::ContentTooLarge);
        }

        let start = self.pos - offset;
        if offset >= len {
            self.buf.copy_within(start..start + len, self.pos);
        } else {
            // overlapping, each new byte is a source for the ones after it
            for i in 0..len {
                self.buf[self.pos + i] = self.buf[start + i];
            }
        }
        self.pos += len;

        Ok(())
    }

    fn pos(&self) -> usize {
        self.pos
    }
}

#[cfg(feature = "alloc")]
pub struct VecOutput {
    pub vec: alloc::vec::Vec<u8>,
}
#[cfg(feature = "alloc")]
impl From<alloc::vec::Vec<u8>> for VecOutput {
    fn from(vec: alloc::vec::Vec<u8>) -> Self {
        Self { vec }
    }
}

#[cfg(feature = "alloc")]
impl OutputHelper for VecOutput {
    #[inline]
    fn putc(&mut self, c: u8) -> Result<()> {
        self.vec.push(c);
        Ok(())
    }
}

#[cfg(feature = "alloc")]
impl OutputSink for VecOutput {
    #[inline]
    fn put_lit(&mut self, lit: u8) -> Result<()> {
        self.vec.push(lit);
        Ok(())
    }

    fn put_backref(&mut self, offset: usize, len: usize) -> Result<()> {
        let pos = self.vec.len();
        if offset == 0 || offset > pos {
            return Err(Error::InvalidOffset);
        }

        let start = pos - offset;
        if offset >= len {
            self.vec.extend_from_within(start..start + len);
        } else {
            self.vec.reserve(len);
            for i in 0..len {
                let b = self.vec[start + i];
                self.vec.push(b);
            }
        }

        Ok(())
    }

    fn pos(&self) -> usize {
        self.vec.len()
    }
}
