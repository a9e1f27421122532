use crate::config::{ChainConfig, Difficulty};
use crate::constants::{AUTO_MINE_MAX, AUTO_MINE_MIN};
use crate::error::{ChainError, Result};
use crate::mine::{MiningControl, MiningReport};
use crate::validation::{self, BlockReport};
use crate::{Block, BlockEdit};
use serde::{Deserialize, Serialize};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// One row of the ledger view: a mined block's payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub index: u64,
    pub data: String,
}

/// In-memory chain: never empty, always starts with the genesis block.
#[derive(Clone, Debug, Serialize)]
pub struct Chain {
    blocks: Vec<Block>,
    difficulty: Difficulty,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new(Difficulty::default())
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

impl Chain {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            blocks: vec![Block::genesis()],
            difficulty,
        }
    }

    pub fn from_config(config: &ChainConfig) -> Result<Self> {
        Ok(Self::new(config.validate()?))
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false; kept for the `len`/`is_empty` pairing.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    pub fn latest_block(&self) -> &Block {
        // Construction and reset both leave the genesis block in place.
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Applies to blocks mined from now on; existing blocks are untouched.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        info!(from = %self.difficulty, to = %difficulty, "difficulty changed");
        self.difficulty = difficulty;
    }

    /// Unmined block that would extend the current tip.
    pub fn candidate(&self, data: impl Into<String>) -> Block {
        self.candidate_at(data, now_millis())
    }

    pub fn candidate_at(&self, data: impl Into<String>, timestamp: u64) -> Block {
        let tip = self.latest_block();
        let block = Block::new(self.len() as u64, timestamp, data, tip.hash());
        debug!(index = block.index(), timestamp, "built candidate block");
        block
    }

    /// Mine a new block carrying `data` at the chain's difficulty and append
    /// it. Blocks the caller until a nonce is found.
    pub fn append_block(&mut self, data: impl Into<String>) -> &Block {
        self.append_block_at(data, now_millis())
    }

    pub fn append_block_at(&mut self, data: impl Into<String>, timestamp: u64) -> &Block {
        let mut block = self.candidate_at(data, timestamp);
        block.mine(self.difficulty);
        info!(
            index = block.index(),
            nonce = block.nonce(),
            hash = %block.hash(),
            "mined block"
        );
        self.blocks.push(block);
        self.latest_block()
    }

    /// Cancellable append. Progress is visible through `control`.
    pub fn mine_next(&mut self, data: impl Into<String>, control: &MiningControl) -> Result<MiningReport> {
        let started = Instant::now();
        let before = control.attempts();
        let mut block = self.candidate(data);
        block.mine_with(self.difficulty, control)?;

        let report = MiningReport {
            index: block.index(),
            nonce: block.nonce(),
            hash: block.hash().to_string(),
            difficulty: self.difficulty.get(),
            attempts: control.attempts() - before,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            index = report.index,
            nonce = report.nonce,
            attempts = report.attempts,
            elapsed_ms = report.elapsed_ms,
            "mined block"
        );
        self.blocks.push(block);
        Ok(report)
    }

    /// Append a block mined elsewhere from [`Chain::candidate`].
    ///
    /// Rejected when the chain moved on meanwhile (another append, a reset,
    /// or an edit of the tip's hash) or when the block falls short of the
    /// current difficulty.
    pub fn push_mined(&mut self, block: Block) -> Result<&Block> {
        let tip = self.latest_block();
        if block.index() != self.len() as u64 || block.previous_hash() != tip.hash() {
            warn!(index = block.index(), "rejected stale candidate");
            return Err(ChainError::StaleCandidate {
                index: block.index(),
            });
        }
        if !block.is_hash_valid() || !block.meets_difficulty(self.difficulty) {
            warn!(index = block.index(), "rejected unmined candidate");
            return Err(ChainError::NotMined {
                index: block.index(),
                difficulty: self.difficulty.get(),
            });
        }
        info!(index = block.index(), hash = %block.hash(), "appended mined block");
        self.blocks.push(block);
        Ok(self.latest_block())
    }

    /// Mine `count` blocks back to back, calling `progress(done, total,
    /// report)` after each one.
    pub fn auto_mine<F>(
        &mut self,
        count: usize,
        control: &MiningControl,
        mut progress: F,
    ) -> Result<Vec<MiningReport>>
    where
        F: FnMut(usize, usize, &MiningReport),
    {
        validate_auto_mine_count(count)?;
        let mut reports = Vec::with_capacity(count);
        for done in 1..=count {
            let data = auto_mine_payload(self.len() as u64);
            let report = self.mine_next(data, control)?;
            progress(done, count, &report);
            reports.push(report);
        }
        Ok(reports)
    }

    pub fn is_valid(&self) -> bool {
        validation::is_chain_valid(&self.blocks)
    }

    /// Per-block issues, including blocks short of the current difficulty.
    pub fn audit(&self) -> Vec<BlockReport> {
        validation::audit_chain(&self.blocks, Some(self.difficulty))
    }

    /// Hash/link problems for the block at `index`, if any.
    pub fn validation_error(&self, index: u64) -> Result<Option<String>> {
        let block = self.block(index).ok_or(ChainError::BlockNotFound(index))?;
        let predecessor = index.checked_sub(1).and_then(|p| self.block(p));
        Ok(validation::block_validation_error(block, predecessor))
    }

    /// Tamper with a stored block. Nothing is re-hashed or re-mined.
    pub fn overwrite_block(&mut self, index: u64, edit: BlockEdit) -> Result<&Block> {
        let block = usize::try_from(index)
            .ok()
            .and_then(|i| self.blocks.get_mut(i))
            .ok_or(ChainError::BlockNotFound(index))?;
        warn!(index, ?edit, "overwriting block fields");
        block.overwrite_fields(edit);
        Ok(block)
    }

    /// Back to a lone, freshly built genesis block. Candidates built before
    /// the reset are refused by [`Chain::push_mined`].
    pub fn reset(&mut self) {
        info!(dropped = self.blocks.len() - 1, "chain reset to genesis");
        self.blocks.clear();
        self.blocks.push(Block::genesis());
    }

    /// Payloads of every block after genesis, in chain order.
    pub fn ledger(&self) -> Vec<LedgerEntry> {
        self.blocks
            .iter()
            .skip(1)
            .map(|b| LedgerEntry {
                index: b.index(),
                data: b.data().to_string(),
            })
            .collect()
    }
}

pub fn validate_auto_mine_count(count: usize) -> Result<()> {
    if !(AUTO_MINE_MIN..=AUTO_MINE_MAX).contains(&count) {
        return Err(ChainError::AutoMineCount(count));
    }
    Ok(())
}

pub fn auto_mine_payload(index: u64) -> String {
    format!("Auto-mined block #{index}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationIssue;

    fn easy_chain() -> Chain {
        Chain::new(Difficulty::new(1).unwrap())
    }

    #[test]
    fn new_chain_holds_genesis_only() {
        let chain = easy_chain();
        assert_eq!(chain.len(), 1);
        assert!(!chain.is_empty());
        assert_eq!(chain.latest_block(), &Block::genesis());
        assert!(chain.is_valid());
        assert!(chain.ledger().is_empty());
    }

    #[test]
    fn from_config_rejects_bad_difficulty() {
        let err = Chain::from_config(&ChainConfig { difficulty: 99 }).unwrap_err();
        assert_eq!(err, ChainError::DifficultyOutOfRange(99));
        let chain = Chain::from_config(&ChainConfig::default()).unwrap();
        assert_eq!(chain.difficulty(), Difficulty::default());
    }

    #[test]
    fn append_links_to_tip() {
        let mut chain = easy_chain();
        let genesis_hash = chain.latest_block().hash().to_string();
        let block = chain.append_block("Alice pays Bob 10").clone();
        assert_eq!(block.index(), 1);
        assert_eq!(block.previous_hash(), genesis_hash);
        assert!(block.hash().starts_with('0'));
        assert!(chain.is_valid());
    }

    #[test]
    fn candidate_uses_next_index() {
        let mut chain = easy_chain();
        chain.append_block_at("one", 1);
        let c = chain.candidate_at("two", 2);
        assert_eq!(c.index(), 2);
        assert_eq!(c.previous_hash(), chain.latest_block().hash());
        assert_eq!(c.nonce(), 0);
    }

    #[test]
    fn push_mined_accepts_fresh_candidate() {
        let mut chain = easy_chain();
        let mut c = chain.candidate_at("bg", 10);
        c.mine(chain.difficulty());
        chain.push_mined(c).unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain.is_valid());
    }

    #[test]
    fn push_mined_rejects_after_reset() {
        let mut chain = easy_chain();
        chain.append_block_at("one", 1);
        let mut c = chain.candidate_at("two", 2);
        c.mine(chain.difficulty());
        chain.reset();
        assert_eq!(
            chain.push_mined(c).unwrap_err(),
            ChainError::StaleCandidate { index: 2 }
        );
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn push_mined_rejects_unmined() {
        let mut chain = Chain::new(Difficulty::new(8).unwrap());
        let c = chain.candidate_at("lazy", 3);
        assert_eq!(
            chain.push_mined(c).unwrap_err(),
            ChainError::NotMined {
                index: 1,
                difficulty: 8
            }
        );
    }

    #[test]
    fn mine_next_reports_work() {
        let mut chain = easy_chain();
        let control = MiningControl::new();
        let report = chain.mine_next("reported", &control).unwrap();
        let tip = chain.latest_block();
        assert_eq!(report.index, 1);
        assert_eq!(report.nonce, tip.nonce());
        assert_eq!(report.hash, tip.hash());
        assert_eq!(report.difficulty, 1);
        assert_eq!(report.attempts, tip.nonce());
    }

    #[test]
    fn mine_next_cancelled_leaves_chain_untouched() {
        let mut chain = Chain::new(Difficulty::new(64).unwrap());
        let control = MiningControl::new();
        control.cancel();
        let err = chain.mine_next("never", &control).unwrap_err();
        assert!(matches!(err, ChainError::MiningCancelled { index: 1, .. }));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn auto_mine_reports_progress() {
        let mut chain = easy_chain();
        let control = MiningControl::new();
        let mut seen = Vec::new();
        let reports = chain
            .auto_mine(3, &control, |done, total, _| seen.push((done, total)))
            .unwrap();
        assert_eq!(reports.len(), 3);
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(chain.len(), 4);
        assert_eq!(chain.block(3).unwrap().data(), "Auto-mined block #3");
        assert!(chain.is_valid());
    }

    #[test]
    fn auto_mine_count_bounds() {
        let mut chain = easy_chain();
        let control = MiningControl::new();
        for bad in [0, 1, 11] {
            assert_eq!(
                chain.auto_mine(bad, &control, |_, _, _| {}).unwrap_err(),
                ChainError::AutoMineCount(bad)
            );
        }
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn overwrite_block_is_detected() {
        let mut chain = easy_chain();
        chain.append_block_at("a", 1);
        chain.append_block_at("b", 2);
        chain
            .overwrite_block(1, BlockEdit::default().data("forged"))
            .unwrap();
        assert!(!chain.is_valid());
        let reports = chain.audit();
        assert!(reports[1].has(ValidationIssue::HashMismatch));
        assert!(!reports[2].has(ValidationIssue::LinkMismatch));
        assert!(chain.validation_error(1).unwrap().is_some());
        assert!(chain.validation_error(2).unwrap().is_none());
    }

    #[test]
    fn overwrite_missing_block() {
        let mut chain = easy_chain();
        assert_eq!(
            chain.overwrite_block(4, BlockEdit::default()).unwrap_err(),
            ChainError::BlockNotFound(4)
        );
        assert_eq!(
            chain.validation_error(4).unwrap_err(),
            ChainError::BlockNotFound(4)
        );
    }

    #[test]
    fn set_difficulty_affects_future_blocks() {
        let mut chain = easy_chain();
        chain.append_block_at("easy", 1);
        chain.set_difficulty(Difficulty::new(2).unwrap());
        let b = chain.append_block_at("harder", 2).clone();
        assert!(b.hash().starts_with("00"));
        assert!(chain.is_valid());
    }

    #[test]
    fn ledger_lists_payloads() {
        let mut chain = easy_chain();
        chain.append_block_at("first", 1);
        chain.append_block_at("second", 2);
        assert_eq!(
            chain.ledger(),
            vec![
                LedgerEntry {
                    index: 1,
                    data: "first".into()
                },
                LedgerEntry {
                    index: 2,
                    data: "second".into()
                },
            ]
        );
    }
}
