pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const GENESIS_DATA: &str = "Genesis Block";
pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const GENESIS_TIMESTAMP: u64 = 0;
pub const DEFAULT_DIFFICULTY: u32 = 2;
pub const MAX_DIFFICULTY: u32 = HASH_HEX_SIZE as u32;
pub const AUTO_MINE_MIN: usize = 2;
pub const AUTO_MINE_MAX: usize = 10;
pub const MINE_BATCH_SIZE: u64 = 1 << 14;
