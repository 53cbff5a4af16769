pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
/// Highest difficulty a SHA-256 hex digest can ever satisfy.
pub const MAX_DIFFICULTY: u32 = HASH_HEX_SIZE as u32;
pub const DEFAULT_DIFFICULTY: u32 = 4;
/// Attempts between two progress events while mining.
pub const PROGRESS_INTERVAL: u64 = 100_000;

pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const GENESIS_TIMESTAMP: &str = "01/01/2018";
pub const GENESIS_DATA: &str = "Genesis block";
