use crate::config::Difficulty;
use crate::constants::MINE_BATCH_SIZE;
use crate::error::{ChainError, Result};
use crate::{hash, Block};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct ControlState {
    cancelled: AtomicBool,
    mining: AtomicBool,
    attempts: AtomicU64,
}

/// Shared handle onto a running mine.
///
/// Clones observe the same job: one side mines, the other reads the attempt
/// counter or the "mining" flag and may request cancellation.
#[derive(Clone, Debug, Default)]
pub struct MiningControl {
    state: Arc<ControlState>,
}

impl MiningControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Relaxed)
    }

    pub fn is_mining(&self) -> bool {
        self.state.mining.load(Ordering::Relaxed)
    }

    /// Hash evaluations performed so far.
    pub fn attempts(&self) -> u64 {
        self.state.attempts.load(Ordering::Relaxed)
    }

    pub(crate) fn record_attempts(&self, n: u64) {
        self.state.attempts.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn start(&self) -> ActiveGuard<'_> {
        self.state.mining.store(true, Ordering::Relaxed);
        ActiveGuard { control: self }
    }
}

/// Clears the "mining" flag when the search ends, however it ends.
pub(crate) struct ActiveGuard<'a> {
    control: &'a MiningControl,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.control.state.mining.store(false, Ordering::Relaxed);
    }
}

/// Outcome of one successful mine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningReport {
    pub index: u64,
    pub nonce: u64,
    pub hash: String,
    pub difficulty: u32,
    pub attempts: u64,
    pub elapsed_ms: u64,
}

/// Mine a copy of `block` by searching nonces in parallel.
///
/// Nonces are scanned in fixed-size batches starting at the block's current
/// nonce; within a batch rayon's `find_first` keeps the lowest hit, so the
/// result is the same block the sequential [`Block::mine`] would produce.
/// Cancellation is checked between batches.
pub fn mine_parallel(block: &Block, difficulty: Difficulty, control: &MiningControl) -> Result<Block> {
    let _active = control.start();
    let target = difficulty.get();
    let mut start = block.nonce();

    loop {
        if control.is_cancelled() {
            return Err(ChainError::MiningCancelled {
                index: block.index(),
                attempts: control.attempts(),
            });
        }

        let end = start.saturating_add(MINE_BATCH_SIZE);
        let found = (start..end).into_par_iter().find_first(|nonce| {
            let h = hash::digest(
                block.index(),
                block.previous_hash(),
                block.timestamp(),
                block.data(),
                *nonce,
            );
            hash::meets_difficulty(&h, target)
        });

        match found {
            Some(nonce) => {
                control.record_attempts(nonce - start + 1);
                let mut mined = block.clone();
                mined.seal(nonce);
                debug!(index = block.index(), nonce, "parallel search found nonce");
                return Ok(mined);
            }
            None => {
                control.record_attempts(end - start);
                // wrap like the sequential miner does
                start = if end == u64::MAX { 0 } else { end };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_matches_sequential() {
        let template = Block::new(5, 1_700_000_000_000, "parallel", "prev");
        let difficulty = Difficulty::new(3).unwrap();

        let mut sequential = template.clone();
        sequential.mine(difficulty);

        let control = MiningControl::new();
        let parallel = mine_parallel(&template, difficulty, &control).unwrap();
        assert_eq!(parallel, sequential);
        assert_eq!(control.attempts(), parallel.nonce() + 1);
        assert!(!control.is_mining());
    }

    #[test]
    fn parallel_zero_difficulty_keeps_nonce() {
        let template = Block::new(1, 1, "x", "y");
        let control = MiningControl::new();
        let mined = mine_parallel(&template, Difficulty::ZERO, &control).unwrap();
        assert_eq!(mined, template);
    }

    #[test]
    fn parallel_respects_cancellation() {
        let template = Block::new(9, 1, "x", "y");
        let control = MiningControl::new();
        control.cancel();
        let err = mine_parallel(&template, Difficulty::new(64).unwrap(), &control).unwrap_err();
        assert!(matches!(err, ChainError::MiningCancelled { index: 9, .. }));
    }

    #[test]
    fn control_clones_share_state() {
        let a = MiningControl::new();
        let b = a.clone();
        a.record_attempts(3);
        b.cancel();
        assert_eq!(b.attempts(), 3);
        assert!(a.is_cancelled());
        {
            let _g = a.start();
            assert!(b.is_mining());
        }
        assert!(!b.is_mining());
    }
}
