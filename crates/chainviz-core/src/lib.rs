//! Hash-linked toy block chain with proof-of-work mining and tamper
//! detection.
//!
//! A [`Chain`] starts from a fixed genesis block and grows by mining one
//! [`Block`] at a time. Validation recomputes every digest from the stored
//! fields, so direct edits made through [`Block::overwrite_fields`] show up
//! as [`ValidationIssue`]s rather than errors.

pub mod block;
pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod hash;
pub mod mine;
pub mod validation;

pub use block::{Block, BlockEdit};
pub use chain::{Chain, LedgerEntry};
pub use config::{ChainConfig, Difficulty};
pub use error::{ChainError, Result};
pub use mine::{MiningControl, MiningReport};
pub use validation::{
    audit_chain, block_validation_error, is_block_hash_valid, is_chain_valid, validate_block,
    BlockReport, ValidationIssue,
};

/// The fixed first block: index 0, timestamp 0, `"Genesis Block"`, previous hash `"0"`.
pub fn create_genesis_block() -> Block {
    Block::genesis()
}

/// Mine `data` onto `chain` at its configured difficulty.
pub fn append_block<'a>(chain: &'a mut Chain, data: &str) -> &'a Block {
    chain.append_block(data)
}

/// Copy of `block` with `edit` applied and nothing recomputed.
pub fn edit_block_fields(block: &Block, edit: BlockEdit) -> Block {
    let mut edited = block.clone();
    edited.overwrite_fields(edit);
    edited
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facade_round_trip() {
        let mut chain = Chain::new(Difficulty::new(1).unwrap());
        let mined = append_block(&mut chain, "hello").clone();
        assert_eq!(chain.blocks()[0], create_genesis_block());
        assert!(is_chain_valid(chain.blocks()));

        let edited = edit_block_fields(&mined, BlockEdit::default().nonce(mined.nonce() + 1));
        assert_eq!(edited.hash(), mined.hash());
        assert!(!is_block_hash_valid(&edited));
        assert!(block_validation_error(&edited, Some(&chain.blocks()[0])).is_some());
        // original untouched
        assert!(is_block_hash_valid(&mined));
    }
}
