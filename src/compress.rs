use tracing::{debug, trace};

use crate::bitio::BitWriter;
use crate::error::{Error, Result};
use crate::hashtab::{in_window, lzs_hash, HashChain, MatchIndex};
use crate::util::*;
use crate::{END_OF_STREAM, MAX_INPUT_LEN, WINDOW_SIZE};

#[cfg(feature = "alloc")]
extern crate alloc;

/// Turns tokens into LZS codes
struct LzsOutput<O> {
    bits: BitWriter<O>,
    lits: usize,
    matches: usize,
}
impl<O: OutputHelper> LzsOutput<O> {
    fn new(out: O) -> Self {
        Self {
            bits: BitWriter::new(out),
            lits: 0,
            matches: 0,
        }
    }

    fn put_lit(&mut self, lit: u8) -> Result<()> {
        self.lits += 1;
        self.bits.put(lit as u32, 9)
    }

    fn put_backref(&mut self, offset: usize, len: usize) -> Result<()> {
        debug_assert!(offset >= 1 && offset < WINDOW_SIZE);
        debug_assert!(len >= 2);

        self.matches += 1;
        if offset < 128 {
            // 11 + 7 bit offset
            self.bits.put(0x180 | offset as u32, 9)?;
        } else {
            // 10 + 11 bit offset
            self.bits.put(0x1000 | offset as u32, 13)?;
        }
        self.put_len(len)
    }

    fn put_len(&mut self, len: usize) -> Result<()> {
        match len {
            2..=4 => self.bits.put((len - 2) as u32, 2),
            5..=7 => self.bits.put((len + 7) as u32, 4),
            _ => {
                // 1111, then nibbles of len - 8 where 15 means "more follow"
                let mut rem = len + 7;
                loop {
                    let nibble = usize::min(rem, 15);
                    self.bits.put(nibble as u32, 4)?;
                    if nibble != 15 {
                        return Ok(());
                    }
                    rem -= 15;
                }
            }
        }
    }

    fn put_end(&mut self) -> Result<()> {
        self.bits.put(END_OF_STREAM, 16)
    }

    fn finish(self) -> O {
        self.bits.finish()
    }
}

/// Find the longest match for `pos`, starting from the chain head `cand`
///
/// Returns `(offset, len)`. A later candidate only wins if it is strictly
/// longer, so ties go to the smallest offset.
fn longest_match(inp: &[u8], pos: usize, mut cand: u16, chain: &HashChain) -> (usize, usize) {
    let mut best_len = 2;
    let mut best_pos = cand as usize;

    while in_window(cand, pos) {
        let c = cand as usize;
        // the first two bytes are equal by construction of the hash
        if inp[c + 2..=c + best_len] == inp[pos + 2..=pos + best_len] {
            best_pos = c;
            loop {
                best_len += 1;
                if pos + best_len == inp.len() {
                    return (pos - best_pos, best_len);
                }
                if inp[pos + best_len] != inp[c + best_len] {
                    break;
                }
            }
        }
        cand = chain.next(cand);
    }

    (pos - best_pos, best_len)
}

/// Holds state for performing compression operations
///
/// The match table is 256 KiB, so prefer [CompressState::new_boxed] or a
/// [StatePool](crate::StatePool) over keeping one on the stack.
pub struct CompressState {
    index: MatchIndex,
}
impl CompressState {
    /// Allocate a new compression state
    pub const fn new() -> Self {
        Self {
            index: MatchIndex::new(),
        }
    }
    #[cfg(feature = "alloc")]
    /// Allocate a new compression state specifically on the heap
    ///
    /// This is a workaround for non-guaranteed copy elision / RVO.
    pub fn new_boxed() -> alloc::boxed::Box<Self> {
        use alloc::alloc::{alloc_zeroed, handle_alloc_error, Layout};

        let layout = Layout::new::<Self>();
        // SAFETY: all-zero is a valid state (every slot tagged with the
        // never-valid generation 0), and the pointer comes from the global
        // allocator with the layout of `Self`.
        unsafe {
            let self_ = alloc_zeroed(layout) as *mut Self;
            if self_.is_null() {
                handle_alloc_error(layout);
            }
            alloc::boxed::Box::from_raw(self_)
        }
    }

    /// Generation tag of the most recent compression
    pub fn generation(&self) -> u16 {
        self.index.generation()
    }

    fn compress_impl<O: OutputHelper>(
        &mut self,
        inp: &[u8],
        outp: &mut LzsOutput<O>,
    ) -> Result<()> {
        if inp.len() > MAX_INPUT_LEN {
            return Err(Error::ContentTooLarge);
        }

        self.index.reset();
        let mut chain = HashChain::new();
        let mut pos = 0;

        while pos + 2 < inp.len() {
            let hash = lzs_hash(inp, pos);
            let head = chain.insert(&mut self.index, hash, pos);

            if !in_window(head, pos) {
                outp.put_lit(inp[pos])?;
                pos += 1;
                continue;
            }

            let (offset, len) = longest_match(inp, pos, head, &chain);
            outp.put_backref(offset, len)?;

            if pos + len + 2 >= inp.len() {
                pos += len;
                break;
            }

            // keep the index complete across the bytes the match covered
            for p in pos + 1..pos + len {
                let hash = lzs_hash(inp, p);
                chain.insert(&mut self.index, hash, p);
            }
            pos += len;
        }

        // one or two bytes left, too short for the main loop
        if pos + 2 == inp.len() {
            let hash = lzs_hash(inp, pos);
            let head = self.index.insert(hash, pos);
            if in_window(head, pos) {
                outp.put_backref(pos - head as usize, 2)?;
            } else {
                outp.put_lit(inp[pos])?;
                outp.put_lit(inp[pos + 1])?;
            }
        } else if pos + 1 == inp.len() {
            outp.put_lit(inp[pos])?;
        }

        outp.put_end()
    }

    fn run<O: OutputHelper>(&mut self, inp: &[u8], out: O) -> Result<O> {
        let mut outp = LzsOutput::new(out);
        match self.compress_impl(inp, &mut outp) {
            Ok(()) => {
                trace!(
                    input_len = inp.len(),
                    literals = outp.lits,
                    matches = outp.matches,
                    generation = self.index.generation(),
                    "compressed"
                );
                Ok(outp.finish())
            }
            Err(e) => {
                debug!(input_len = inp.len(), error = %e, "compression failed");
                Err(e)
            }
        }
    }

    /// Compress the input into a preallocated buffer
    ///
    /// Returns the compressed size on success, or an error otherwise
    pub fn compress_to_buf(&mut self, inp: &[u8], outp: &mut [u8]) -> Result<usize> {
        let out = self.run(inp, BufOutput::from(outp))?;
        Ok(out.pos)
    }

    #[cfg(feature = "alloc")]
    /// Compress the input into a [Vec](alloc::vec::Vec)
    ///
    /// Returns the result on success, or an error otherwise
    pub fn compress_to_vec(&mut self, inp: &[u8]) -> Result<alloc::vec::Vec<u8>> {
        let ret = alloc::vec::Vec::with_capacity(crate::max_compressed_len(inp.len()));
        let out = self.run(inp, VecOutput::from(ret))?;
        Ok(out.vec)
    }
}
impl Default for CompressState {
    fn default() -> Self {
        Self::new()
    }
}
