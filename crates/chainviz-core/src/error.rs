use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("difficulty {0} is out of range (0..={max})", max = crate::constants::MAX_DIFFICULTY)]
    DifficultyOutOfRange(u32),

    #[error("block #{0} not found")]
    BlockNotFound(u64),

    #[error("candidate block #{index} no longer extends the chain tip")]
    StaleCandidate { index: u64 },

    #[error("block #{index} does not satisfy difficulty {difficulty}")]
    NotMined { index: u64, difficulty: u32 },

    #[error("mining cancelled for block #{index} after {attempts} attempts")]
    MiningCancelled { index: u64, attempts: u64 },

    #[error("auto-mine count {0} is out of range ({min}..={max})", min = crate::constants::AUTO_MINE_MIN, max = crate::constants::AUTO_MINE_MAX)]
    AutoMineCount(usize),
}

pub type Result<T> = std::result::Result<T, ChainError>;
