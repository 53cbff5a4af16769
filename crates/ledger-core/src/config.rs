use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_DIFFICULTY;
use crate::pow::SearchLimit;

/// Parameters fixed for the lifetime of a [`crate::chain::Chain`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Leading zero hex characters required of every mined block.
    pub difficulty: u32,
    /// Cap on nonce attempts per block; `None` searches until found.
    pub max_attempts: Option<u64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_attempts: None,
        }
    }
}

impl ChainConfig {
    pub fn search_limit(&self) -> SearchLimit {
        SearchLimit {
            max_attempts: self.max_attempts,
            cancel: None,
        }
    }
}
