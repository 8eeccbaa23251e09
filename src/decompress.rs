use tracing::{debug, trace};

use crate::bitio::BitReader;
use crate::error::Result;
use crate::util::*;

#[cfg(feature = "alloc")]
extern crate alloc;

/// 9-bit code that ends the stream (a short offset of 0)
const END_MARKER: u32 = 0x180;

/// Inverse of the length ladder: 2 bits, then 2 more, then 4-bit nibbles
fn get_len(bits: &mut BitReader) -> Result<usize> {
    let v = bits.get(2)?;
    if v != 3 {
        return Ok(v as usize + 2);
    }
    let v = bits.get(2)?;
    if v != 3 {
        return Ok(v as usize + 5);
    }

    let mut len = 8;
    loop {
        let nibble = bits.get(4)?;
        len += nibble as usize;
        if nibble != 15 {
            return Ok(len);
        }
    }
}

fn decompress_impl(inp: &[u8], outp: &mut impl OutputSink) -> Result<()> {
    let mut bits = BitReader::new(inp);

    loop {
        let code = bits.get(9)?;
        if code < 0x100 {
            outp.put_lit(code as u8)?;
            continue;
        }
        if code == END_MARKER {
            return Ok(());
        }

        let offset = if code & 0x80 != 0 {
            // 11 + 7 bit offset
            (code & 0x7f) as usize
        } else {
            // 10 + 11 bit offset, the low 4 bits follow
            (((code & 0x7f) << 4) | bits.get(4)?) as usize
        };
        let len = get_len(&mut bits)?;
        outp.put_backref(offset, len)?;
    }
}

fn run(inp: &[u8], outp: &mut impl OutputSink) -> Result<()> {
    match decompress_impl(inp, outp) {
        Ok(()) => {
            trace!(input_len = inp.len(), output_len = outp.pos(), "decompressed");
            Ok(())
        }
        Err(e) => {
            debug!(
                input_len = inp.len(),
                output_len = outp.pos(),
                error = %e,
                "decompression failed"
            );
            Err(e)
        }
    }
}

/// Decompress the input into a preallocated buffer
///
/// Returns the decompressed size on success. A stream holding only the end
/// marker decodes to `Ok(0)`.
pub fn decompress_to_buf(inp: &[u8], outp: &mut [u8]) -> Result<usize> {
    let mut outp: BufOutput = outp.into();
    run(inp, &mut outp)?;
    Ok(outp.pos)
}

#[cfg(feature = "alloc")]
/// Decompress the input into a [Vec](alloc::vec::Vec)
///
/// `capacity_hint` only preallocates, the output grows as needed.
pub fn decompress_to_vec(
    inp: &[u8],
    capacity_hint: Option<usize>,
) -> Result<alloc::vec::Vec<u8>> {
    let mut ret: VecOutput = if let Some(capacity_hint) = capacity_hint {
        alloc::vec::Vec::with_capacity(capacity_hint)
    } else {
        alloc::vec::Vec::new()
    }
    .into();
    run(inp, &mut ret)?;
    Ok(ret.vec)
}

/// Decode while recording every `(offset, len)` backreference
#[cfg(all(test, feature = "alloc"))]
pub(crate) fn trace_tokens(
    inp: &[u8],
    tokens: &mut alloc::vec::Vec<(usize, usize)>,
) -> Result<alloc::vec::Vec<u8>> {
    struct Tracer<'a> {
        out: VecOutput,
        tokens: &'a mut alloc::vec::Vec<(usize, usize)>,
    }
    impl<'a> OutputSink for Tracer<'a> {
        fn put_lit(&mut self, lit: u8) -> Result<()> {
            self.out.put_lit(lit)
        }
        fn put_backref(&mut self, offset: usize, len: usize) -> Result<()> {
            self.tokens.push((offset, len));
            self.out.put_backref(offset, len)
        }
        fn pos(&self) -> usize {
            self.out.pos()
        }
    }

    let mut tracer = Tracer {
        out: alloc::vec::Vec::new().into(),
        tokens,
    };
    decompress_impl(inp, &mut tracer)?;
    Ok(tracer.out.vec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_literals_and_end() {
        let mut out = [0u8; 4];
        assert_eq!(decompress_to_buf(&[0x20, 0xe0, 0x00], &mut out), Ok(1));
        assert_eq!(out[0], 0x41);

        assert_eq!(decompress_to_buf(&[0x00, 0x80, 0xb0, 0x00], &mut out), Ok(2));
        assert_eq!(out[..2], [1, 2]);
    }

    #[test]
    fn test_only_end_marker() {
        let mut out = [0u8; 4];
        assert_eq!(decompress_to_buf(&[0xc0, 0x00], &mut out), Ok(0));
        // only the top 9 bits of the marker matter
        assert_eq!(decompress_to_buf(&[0xc0, 0x7f], &mut out), Ok(0));
    }

    #[test]
    fn test_stops_at_end_marker() {
        // anything after the marker is never read
        let mut out = [0u8; 8];
        assert_eq!(
            decompress_to_buf(&[0x00, 0xe0, 0x6c, 0x00, 0xde, 0xad], &mut out),
            Ok(5)
        );
        assert_eq!(out[..5], [1; 5]);
    }

    #[test]
    fn test_short_and_long_offsets() {
        // offsets 127 and 128 against an empty output
        let mut out = [0u8; 256];
        assert_eq!(
            decompress_to_buf(&[0xff, 0x98, 0x00], &mut out),
            Err(Error::InvalidOffset)
        );
        assert_eq!(
            decompress_to_buf(&[0x84, 0x01, 0x80], &mut out),
            Err(Error::InvalidOffset)
        );
    }

    #[test]
    fn test_tail_match() {
        let mut out = [0u8; 4];
        assert_eq!(
            decompress_to_buf(&[0x00, 0x80, 0xb0, 0x46, 0x00], &mut out),
            Ok(4)
        );
        assert_eq!(out, [1, 2, 1, 2]);
    }

    #[test]
    fn test_output_too_small() {
        // literal into a full buffer
        let mut out = [0u8; 1];
        assert_eq!(
            decompress_to_buf(&[0x00, 0x80, 0xb0, 0x00], &mut out),
            Err(Error::ContentTooLarge)
        );

        // backreference past the end
        let mut out = [0u8; 4];
        assert_eq!(
            decompress_to_buf(&[0x00, 0xe0, 0x6c, 0x00], &mut out),
            Err(Error::ContentTooLarge)
        );
    }

    #[test]
    fn test_truncated() {
        let mut out = [0u8; 8];
        assert_eq!(decompress_to_buf(&[], &mut out), Err(Error::TruncatedInput));
        // literal, then no end marker
        assert_eq!(
            decompress_to_buf(&[0x20, 0x80], &mut out),
            Err(Error::TruncatedInput)
        );
        // lit 1, offset 1, length nibble cut off
        assert_eq!(
            decompress_to_buf(&[0x00, 0xe0, 0x7f], &mut out),
            Err(Error::TruncatedInput)
        );
    }

    #[test]
    fn test_long_length_chain() {
        // lit 0xaa, offset 1, 1111 1111 0011 -> 8 + 15 + 3 = 26, end
        // 010101010 110000001 1111 1111 0011 1100000000000000
        let inp = [0x55, 0x60, 0x7f, 0xcf, 0x00, 0x00];
        let mut out = [0u8; 27];
        assert_eq!(decompress_to_buf(&inp, &mut out), Ok(27));
        assert_eq!(out, [0xaa; 27]);
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn test_to_vec() {
        let inp = [0x55, 0x60, 0x7f, 0xcf, 0x00, 0x00];
        assert_eq!(decompress_to_vec(&inp, None).unwrap(), [0xaa; 27]);
        assert_eq!(decompress_to_vec(&inp, Some(4)).unwrap(), [0xaa; 27]);
        assert_eq!(
            decompress_to_vec(&[0xff, 0x98, 0x00], None),
            Err(Error::InvalidOffset)
        );
    }
}
