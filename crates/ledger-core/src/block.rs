use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::constants::GENESIS_PREVIOUS_HASH;
use crate::error::Result;
use crate::payload::{canonical_json, to_payload};
use crate::pow::{self, MiningReport, SearchLimit};
use crate::Hash;

/// SHA-256 over the concatenated textual fields of a block.
///
/// `payload` must already be canonical JSON (see [`crate::payload::canonical_json`]).
pub fn block_digest(
    index: u64,
    timestamp: &str,
    payload: &str,
    previous_hash: &str,
    nonce: u64,
) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(index.to_string().as_bytes());
    hasher.update(timestamp.as_bytes());
    hasher.update(payload.as_bytes());
    hasher.update(previous_hash.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

/// A single ledger entry. `hash` is a pure function of the other five fields;
/// anything that changes them without recomputing `hash` is detected by
/// chain validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub timestamp: String,
    pub data: Value,
    pub previous_hash: String,
    pub hash: String,
    pub nonce: u64,
}

impl Block {
    /// Build an unlinked block (`previous_hash` is the `"0"` sentinel, nonce 0).
    pub fn new<T>(index: u64, timestamp: impl Display, data: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        Self::with_link(index, timestamp, data, GENESIS_PREVIOUS_HASH, 0)
    }

    pub fn with_link<T>(
        index: u64,
        timestamp: impl Display,
        data: &T,
        previous_hash: impl Into<String>,
        nonce: u64,
    ) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        Ok(Self::from_value(
            index,
            timestamp,
            to_payload(data)?,
            previous_hash,
            nonce,
        ))
    }

    /// Build from an already-decoded JSON payload. Infallible.
    pub fn from_value(
        index: u64,
        timestamp: impl Display,
        data: Value,
        previous_hash: impl Into<String>,
        nonce: u64,
    ) -> Self {
        let mut block = Block {
            index,
            timestamp: timestamp.to_string(),
            data,
            previous_hash: previous_hash.into(),
            hash: String::new(),
            nonce,
        };
        block.hash = block.compute_hash();
        block
    }

    pub fn digest(&self) -> Hash {
        block_digest(
            self.index,
            &self.timestamp,
            &canonical_json(&self.data),
            &self.previous_hash,
            self.nonce,
        )
    }

    /// Lowercase hex digest of the current field values.
    pub fn compute_hash(&self) -> String {
        hex::encode(self.digest())
    }

    pub fn is_hash_consistent(&self) -> bool {
        self.hash == self.compute_hash()
    }

    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        pow::meets_difficulty(&self.hash, difficulty)
    }

    /// Point this block at its predecessor and refresh `hash`.
    pub fn relink(&mut self, previous_hash: impl Into<String>) {
        self.previous_hash = previous_hash.into();
        self.hash = self.compute_hash();
    }

    /// Search for a nonce until `hash` has `difficulty` leading zero hex chars.
    /// Runs until one is found.
    pub fn mine(&mut self, difficulty: u32) -> Result<MiningReport> {
        self.mine_with(difficulty, &SearchLimit::unbounded())
    }

    /// Like [`Block::mine`], bounded by `limit`. On failure `nonce` and `hash`
    /// are left as they were before the call.
    pub fn mine_with(&mut self, difficulty: u32, limit: &SearchLimit) -> Result<MiningReport> {
        let payload = canonical_json(&self.data);
        let solution = pow::search(self.index, self.nonce, difficulty, limit, |nonce| {
            block_digest(
                self.index,
                &self.timestamp,
                &payload,
                &self.previous_hash,
                nonce,
            )
        })?;

        self.nonce = solution.report.nonce;
        self.hash = hex::encode(solution.hash);
        info!(
            index = self.index,
            nonce = self.nonce,
            attempts = solution.report.attempts,
            "Block mined: {}",
            self.hash
        );
        Ok(solution.report)
    }
}
