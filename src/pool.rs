//! Reuse of [CompressState] between calls
//!
//! A [StateLease] gives one caller exclusive use of a boxed state and puts
//! it back when dropped. States are not cleared on return, every compression
//! starts by advancing the generation tag instead.

use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};

extern crate std;
use std::boxed::Box;
use std::sync::Mutex;
use std::vec::Vec;

use crate::CompressState;

/// Idle states kept around after being returned
pub const MAX_IDLE_STATES: usize = 16;

static GLOBAL_POOL: StatePool = StatePool::new();

/// The process-wide pool used by [compress](crate::compress)
pub fn global() -> &'static StatePool {
    &GLOBAL_POOL
}

pub struct StatePool {
    idle: Mutex<Vec<Box<CompressState>>>,
}
impl StatePool {
    pub const fn new() -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
        }
    }

    /// Check out a state, allocating one if none are idle
    pub fn lease(&self) -> StateLease<'_> {
        let state = self
            .idle
            .lock()
            .ok()
            .and_then(|mut idle| idle.pop())
            .unwrap_or_else(CompressState::new_boxed);
        StateLease {
            state: ManuallyDrop::new(state),
            pool: self,
        }
    }

    /// Number of states waiting to be leased
    pub fn idle(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }

    fn give_back(&self, state: Box<CompressState>) {
        // a poisoned pool just stops recycling
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < MAX_IDLE_STATES {
                idle.push(state);
            }
        }
    }
}
impl Default for StatePool {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive use of a pooled [CompressState]
pub struct StateLease<'a> {
    state: ManuallyDrop<Box<CompressState>>,
    pool: &'a StatePool,
}
impl<'a> Deref for StateLease<'a> {
    type Target = CompressState;
    fn deref(&self) -> &CompressState {
        &self.state
    }
}
impl<'a> DerefMut for StateLease<'a> {
    fn deref_mut(&mut self) -> &mut CompressState {
        &mut self.state
    }
}
impl<'a> Drop for StateLease<'a> {
    fn drop(&mut self) {
        // SAFETY: `state` is never touched again after this
        let state = unsafe { ManuallyDrop::take(&mut self.state) };
        self.pool.give_back(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_lease_returns_on_drop() {
        let pool = StatePool::new();
        assert_eq!(pool.idle(), 0);
        {
            let mut lease = pool.lease();
            let mut out = [0u8; 16];
            lease.compress_to_buf(b"abab", &mut out).unwrap();
            assert_eq!(pool.idle(), 0);
        }
        assert_eq!(pool.idle(), 1);

        // the same state comes back out, one generation on
        let lease = pool.lease();
        assert_eq!(lease.generation(), 1);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_concurrent_leases_are_distinct() {
        let pool = StatePool::new();
        let a = pool.lease();
        let b = pool.lease();
        let pa: *const CompressState = &*a;
        let pb: *const CompressState = &*b;
        assert_ne!(pa, pb);
        drop(a);
        drop(b);
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn test_idle_bounded() {
        let pool = StatePool::new();
        let leases: Vec<_> = (0..MAX_IDLE_STATES + 4).map(|_| pool.lease()).collect();
        drop(leases);
        assert_eq!(pool.idle(), MAX_IDLE_STATES);
    }

    #[test]
    fn test_threads_share_pool() {
        let pool = Arc::new(StatePool::new());
        let handles: Vec<_> = (0..8u8)
            .map(|t| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    let inp: Vec<u8> = (0..1000u32).map(|i| (i % 13) as u8 ^ t).collect();
                    for _ in 0..10 {
                        let packed = pool.lease().compress_to_vec(&inp).unwrap();
                        let unpacked = crate::decompress_to_vec(&packed, None).unwrap();
                        assert_eq!(unpacked, inp);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(pool.idle() <= 8);
    }
}
