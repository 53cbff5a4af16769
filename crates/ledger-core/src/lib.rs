//! Hash-chained, proof-of-work ledger.
//!
//! A [`Chain`] starts from a fixed genesis block. Each appended [`Block`] is
//! linked to the current tip's hash and mined until its own hash carries the
//! chain's difficulty in leading zero hex characters.
pub mod block;
pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod payload;
pub mod pow;

pub type Hash = [u8; 32];

pub use block::{block_digest, Block};
pub use chain::{genesis_block, Chain};
pub use config::ChainConfig;
pub use error::{LedgerError, Result, ValidationError};
pub use pow::{CancelToken, MiningReport, SearchLimit};
