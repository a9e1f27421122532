use crate::config::Difficulty;
use crate::constants::{GENESIS_DATA, GENESIS_PREVIOUS_HASH, GENESIS_TIMESTAMP};
use crate::error::{ChainError, Result};
use crate::hash;
use crate::mine::MiningControl;
use serde::{Deserialize, Serialize};

/// One sealed unit of data in the chain.
///
/// Fields are only reachable through accessors. The sole ways to change a
/// stored block are mining (nonce and hash) and [`Block::overwrite_fields`],
/// which exists to demonstrate tamper detection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    timestamp: u64,
    data: String,
    previous_hash: String,
    nonce: u64,
    hash: String,
}

impl Block {
    /// Build an unmined block with `nonce = 0` and its hash already computed.
    pub fn new(
        index: u64,
        timestamp: u64,
        data: impl Into<String>,
        previous_hash: impl Into<String>,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp,
            data: data.into(),
            previous_hash: previous_hash.into(),
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.calculate_hash();
        block
    }

    /// The fixed first block. Identical across calls, so a rebuilt chain
    /// always starts from the same genesis hash.
    pub fn genesis() -> Self {
        Self::new(0, GENESIS_TIMESTAMP, GENESIS_DATA, GENESIS_PREVIOUS_HASH)
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    /// Recompute the digest from the stored fields. Ignores the stored hash.
    pub fn calculate_hash(&self) -> String {
        hash::digest(
            self.index,
            &self.previous_hash,
            self.timestamp,
            &self.data,
            self.nonce,
        )
    }

    /// Stored hash equals the digest of the stored fields.
    pub fn is_hash_valid(&self) -> bool {
        self.hash == self.calculate_hash()
    }

    pub fn meets_difficulty(&self, difficulty: Difficulty) -> bool {
        hash::meets_difficulty(&self.hash, difficulty.get())
    }

    /// Increment the nonce until the hash starts with `difficulty` zeros.
    ///
    /// Starting from a fresh block this finds the smallest satisfying nonce.
    /// Unbounded: expect about `16^difficulty` attempts.
    pub fn mine(&mut self, difficulty: Difficulty) {
        while !self.meets_difficulty(difficulty) {
            self.nonce = self.nonce.wrapping_add(1);
            self.hash = self.calculate_hash();
        }
    }

    /// Same search as [`Block::mine`], observable and cancellable through
    /// `control`. On cancellation the block keeps the last nonce tried.
    pub fn mine_with(&mut self, difficulty: Difficulty, control: &MiningControl) -> Result<()> {
        let _active = control.start();
        while !self.meets_difficulty(difficulty) {
            if control.is_cancelled() {
                return Err(ChainError::MiningCancelled {
                    index: self.index,
                    attempts: control.attempts(),
                });
            }
            self.nonce = self.nonce.wrapping_add(1);
            self.hash = self.calculate_hash();
            control.record_attempts(1);
        }
        Ok(())
    }

    /// Set the nonce and refresh the hash to match.
    pub(crate) fn seal(&mut self, nonce: u64) {
        self.nonce = nonce;
        self.hash = self.calculate_hash();
    }

    /// Overwrite stored fields without re-hashing or re-mining.
    ///
    /// This deliberately breaks the block's invariants; validation is what
    /// notices. `index` is not editable.
    pub fn overwrite_fields(&mut self, edit: BlockEdit) {
        let BlockEdit {
            data,
            timestamp,
            previous_hash,
            nonce,
            hash,
        } = edit;
        if let Some(data) = data {
            self.data = data;
        }
        if let Some(timestamp) = timestamp {
            self.timestamp = timestamp;
        }
        if let Some(previous_hash) = previous_hash {
            self.previous_hash = previous_hash;
        }
        if let Some(nonce) = nonce {
            self.nonce = nonce;
        }
        if let Some(hash) = hash {
            self.hash = hash;
        }
    }
}

/// Partial update for [`Block::overwrite_fields`]. `None` leaves a field as is.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlockEdit {
    pub data: Option<String>,
    pub timestamp: Option<u64>,
    pub previous_hash: Option<String>,
    pub nonce: Option<u64>,
    pub hash: Option<String>,
}

impl BlockEdit {
    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn previous_hash(mut self, previous_hash: impl Into<String>) -> Self {
        self.previous_hash = Some(previous_hash.into());
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_none()
            && self.timestamp.is_none()
            && self.previous_hash.is_none()
            && self.nonce.is_none()
            && self.hash.is_none()
    }
}
