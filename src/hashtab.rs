//! Match index for the encoder
//!
//! The table is keyed directly by the two bytes at a position, so every
//! candidate it returns is guaranteed to share those two bytes. Slots carry a
//! generation tag in their upper 16 bits, which lets a [MatchIndex] be reused
//! for a new input without clearing 256 KiB each time.

use crate::WINDOW_SIZE;

pub(crate) const HTAB_SZ: usize = 1 << 16;

/// Chain terminator
pub(crate) const NONE: u16 = 0xffff;

/// Hash of the two bytes starting at `pos`
#[inline]
pub(crate) fn lzs_hash(inp: &[u8], pos: usize) -> usize {
    u16::from_le_bytes([inp[pos], inp[pos + 1]]) as usize
}

/// Most recent position for every two-byte prefix
pub struct MatchIndex {
    entries: [u32; HTAB_SZ],
    generation: u16,
}
impl MatchIndex {
    pub const fn new() -> Self {
        Self {
            entries: [0; HTAB_SZ],
            generation: 0,
        }
    }

    /// Invalidate every entry
    ///
    /// Generation 0 is never valid, so on wraparound the table is zeroed once
    /// and numbering restarts at 1.
    pub fn reset(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.entries.fill(0);
            self.generation = 1;
        }
    }

    #[inline]
    pub fn lookup(&self, hash: usize) -> u16 {
        let entry = self.entries[hash];
        if (entry >> 16) as u16 == self.generation && self.generation != 0 {
            entry as u16
        } else {
            NONE
        }
    }

    /// Make `pos` the head for `hash`, returning the previous head
    #[inline]
    pub fn insert(&mut self, hash: usize, pos: usize) -> u16 {
        debug_assert!(pos < NONE as usize);
        let prev = self.lookup(hash);
        self.entries[hash] = ((self.generation as u32) << 16) | pos as u32;
        prev
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }
}

/// Older positions sharing a hash, one slot per window position
pub(crate) struct HashChain {
    links: [u16; WINDOW_SIZE],
}
impl HashChain {
    pub fn new() -> Self {
        Self {
            links: [NONE; WINDOW_SIZE],
        }
    }

    /// Index `pos` and thread it onto the chain for its hash
    ///
    /// Returns the most recent earlier position with the same hash.
    #[inline]
    pub fn insert(&mut self, index: &mut MatchIndex, hash: usize, pos: usize) -> u16 {
        let prev = index.insert(hash, pos);
        self.links[pos % WINDOW_SIZE] = prev;
        prev
    }

    /// The position indexed before `pos` with the same hash
    ///
    /// Only meaningful while `pos` is still inside the window.
    #[inline]
    pub fn next(&self, pos: u16) -> u16 {
        self.links[pos as usize % WINDOW_SIZE]
    }
}

/// Whether `cand` can be referenced from `pos`
#[inline]
pub(crate) fn in_window(cand: u16, pos: usize) -> bool {
    cand != NONE && (cand as usize) + WINDOW_SIZE > pos
}
