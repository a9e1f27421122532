//! Read-only integrity checks over stored blocks.
//!
//! Nothing here mines or mutates: every check recomputes digests from the
//! stored fields and compares. Detected problems come back as data.

use crate::config::Difficulty;
use crate::Block;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a block failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationIssue {
    /// Stored hash differs from the digest of the stored fields.
    HashMismatch,
    /// Stored previous hash differs from the predecessor's stored hash.
    LinkMismatch,
    /// Stored hash lacks the leading zeros the difficulty requires.
    NotMined,
}

impl ValidationIssue {
    pub fn code(self) -> &'static str {
        match self {
            ValidationIssue::HashMismatch => "HASH_MISMATCH",
            ValidationIssue::LinkMismatch => "LINK_MISMATCH",
            ValidationIssue::NotMined => "NOT_MINED",
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            ValidationIssue::HashMismatch => "hash does not match the block's contents",
            ValidationIssue::LinkMismatch => "previous hash does not match the preceding block",
            ValidationIssue::NotMined => "hash does not meet the difficulty target",
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Issues found on one block, in check order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReport {
    pub index: u64,
    pub issues: Vec<ValidationIssue>,
}

impl BlockReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has(&self, issue: ValidationIssue) -> bool {
        self.issues.contains(&issue)
    }

    /// Human-readable summary, `None` when the block is clean.
    pub fn reason(&self) -> Option<String> {
        join_reasons(&self.issues)
    }
}

fn join_reasons(issues: &[ValidationIssue]) -> Option<String> {
    if issues.is_empty() {
        return None;
    }
    Some(
        issues
            .iter()
            .map(|i| i.reason())
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// Field-hash check only; linkage is ignored.
pub fn is_block_hash_valid(block: &Block) -> bool {
    block.is_hash_valid()
}

/// A block with no predecessor has nothing to link to and always passes.
pub fn is_link_valid(block: &Block, predecessor: Option<&Block>) -> bool {
    predecessor.map_or(true, |prev| block.previous_hash() == prev.hash())
}

/// Hash and link checks for one block. Both may fail at once.
pub fn validate_block(block: &Block, predecessor: Option<&Block>) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if !is_block_hash_valid(block) {
        issues.push(ValidationIssue::HashMismatch);
    }
    if !is_link_valid(block, predecessor) {
        issues.push(ValidationIssue::LinkMismatch);
    }
    issues
}

pub fn block_validation_error(block: &Block, predecessor: Option<&Block>) -> Option<String> {
    join_reasons(&validate_block(block, predecessor))
}

/// Every block's hash matches its fields and every non-first block links to
/// the one before it. An empty slice is valid.
pub fn is_chain_valid(blocks: &[Block]) -> bool {
    blocks.iter().enumerate().all(|(i, block)| {
        let predecessor = i.checked_sub(1).map(|p| &blocks[p]);
        block.is_hash_valid() && is_link_valid(block, predecessor)
    })
}

/// Per-block report for the whole sequence.
///
/// With a difficulty, non-genesis blocks whose hash lacks the required
/// zeros are also flagged [`ValidationIssue::NotMined`].
pub fn audit_chain(blocks: &[Block], difficulty: Option<Difficulty>) -> Vec<BlockReport> {
    blocks
        .iter()
        .enumerate()
        .map(|(i, block)| {
            let predecessor = i.checked_sub(1).map(|p| &blocks[p]);
            let mut issues = validate_block(block, predecessor);
            if let Some(d) = difficulty {
                if !block.is_genesis() && !block.meets_difficulty(d) {
                    issues.push(ValidationIssue::NotMined);
                }
            }
            BlockReport {
                index: block.index(),
                issues,
            }
        })
        .collect()
}
