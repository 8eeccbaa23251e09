//! LZS (Lempel-Ziv-Stac) compression
//!
//! A sliding-window LZ77 codec with a 2048-byte window. The output is a bare
//! MSB-first bitstream with no header, terminated by an end-of-stream code:
//!
//! | token                | bits                                  |
//! |----------------------|---------------------------------------|
//! | literal              | `0` + 8-bit byte                      |
//! | match, offset < 128  | `11` + 7-bit offset, then length      |
//! | match, offset ≥ 128  | `10` + 11-bit offset, then length     |
//! | end of stream        | `110000000` (+ 7 zero bits of padding) |
//!
//! Lengths 2–4 take 2 bits, 5–7 take 4 bits, and longer lengths continue
//! with 4-bit nibbles where 15 means more nibbles follow.
//!
//! ```
//! let data = b"abracadabra abracadabra";
//! let mut packed = [0u8; lzs_rs::max_compressed_len(23)];
//! let n = lzs_rs::compress(data, &mut packed).unwrap();
//!
//! let mut unpacked = [0u8; 23];
//! let m = lzs_rs::decompress(&packed[..n], &mut unpacked).unwrap();
//! assert_eq!(&unpacked[..m], data);
//! ```

#![no_std]

mod bitio;
mod compress;
mod decompress;
mod error;
mod hashtab;
#[cfg(feature = "std")]
pub mod pool;
mod util;

pub use compress::CompressState;
#[cfg(feature = "alloc")]
pub use decompress::decompress_to_vec;
pub use decompress::decompress_to_buf;
pub use error::{Error, Result};
#[cfg(feature = "std")]
pub use pool::{StateLease, StatePool};
#[cfg(feature = "alloc")]
extern crate alloc;

/// Back-references reach at most this far (exclusive)
pub const WINDOW_SIZE: usize = 2048;
/// Largest input [compress] accepts
pub const MAX_INPUT_LEN: usize = 65536;
/// 16-bit code ending every stream
pub const END_OF_STREAM: u32 = 0xc000;

/// Worst-case compressed size of `len` bytes
///
/// Reached when every byte is a 9-bit literal; matches are always shorter
/// than the literals they replace.
pub const fn max_compressed_len(len: usize) -> usize {
    (9 * len + 16) / 8
}

#[cfg(feature = "alloc")]
/// Compress the input into a [Vec](alloc::vec::Vec)
///
/// The state is leased from the global pool when `std` is enabled.
pub fn compress_to_vec(src: &[u8]) -> Result<alloc::vec::Vec<u8>> {
    #[cfg(feature = "std")]
    let mut state = pool::global().lease();
    #[cfg(not(feature = "std"))]
    let mut state = CompressState::new_boxed();

    state.compress_to_vec(src)
}

/// Compress `src` into `dst`, returning the number of bytes written
///
/// Fails with [Error::ContentTooLarge] if `dst` is too small or `src` is
/// longer than [MAX_INPUT_LEN], and with [Error::EmptyResult] if `src` is empty.
pub fn compress(src: &[u8], dst: &mut [u8]) -> Result<usize> {
    if src.is_empty() {
        return Err(Error::EmptyResult);
    }

    #[cfg(feature = "std")]
    let mut state = pool::global().lease();
    #[cfg(all(feature = "alloc", not(feature = "std")))]
    let mut state = CompressState::new_boxed();
    // without an allocator the 256 KiB state lives on the stack
    #[cfg(not(feature = "alloc"))]
    let mut state = CompressState::new();

    nonzero(state.compress_to_buf(src, dst)?)
}

/// Decompress `src` into `dst`, returning the number of bytes written
///
/// A stream that decodes to nothing fails with [Error::EmptyResult].
pub fn decompress(src: &[u8], dst: &mut [u8]) -> Result<usize> {
    nonzero(decompress_to_buf(src, dst)?)
}

fn nonzero(len: usize) -> Result<usize> {
    if len == 0 {
        Err(Error::EmptyResult)
    } else {
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let mut out = [0u8; 8];
        assert_eq!(compress(&[], &mut out), Err(Error::EmptyResult));
        assert_eq!(decompress(&[0xc0, 0x00], &mut out), Err(Error::EmptyResult));
        assert_eq!(decompress_to_buf(&[0xc0, 0x00], &mut out), Ok(0));
    }

    #[test]
    fn test_max_compressed_len() {
        assert_eq!(max_compressed_len(0), 2);
        assert_eq!(max_compressed_len(1), 3);
        assert_eq!(max_compressed_len(2), 4);
        assert_eq!(max_compressed_len(8), 11);

        // incompressible input fills the bound exactly
        let inp: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];
        let mut out = [0u8; max_compressed_len(8)];
        assert_eq!(compress(&inp, &mut out), Ok(11));
        assert_eq!(compress(&inp, &mut out[..10]), Err(Error::ContentTooLarge));
    }
}
