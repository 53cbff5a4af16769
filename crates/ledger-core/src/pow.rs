//! Proof-of-work: nonce search against a leading-zero difficulty target.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::constants::{MAX_DIFFICULTY, PROGRESS_INTERVAL};
use crate::error::{LedgerError, Result};
use crate::Hash;

/// Number of leading `'0'` characters in the hex rendering of `hash`.
pub fn count_leading_zero_nibbles(hash: &Hash) -> u32 {
    let mut total = 0u32;
    for b in hash {
        if *b == 0 {
            total += 2;
        } else {
            if *b < 0x10 {
                total += 1;
            }
            break;
        }
    }
    total
}

/// Whether a hex digest starts with at least `difficulty` zero characters.
pub fn meets_difficulty(hash_hex: &str, difficulty: u32) -> bool {
    let leading = hash_hex.bytes().take_while(|c| *c == b'0').count();
    leading >= difficulty as usize
}

pub fn check_difficulty(difficulty: u32) -> Result<()> {
    if difficulty > MAX_DIFFICULTY {
        return Err(LedgerError::DifficultyOutOfRange {
            difficulty,
            max: MAX_DIFFICULTY,
        });
    }
    Ok(())
}

/// Shared flag that stops an in-flight search from another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Bounds on a nonce search. The default runs until a nonce is found.
#[derive(Clone, Debug, Default)]
pub struct SearchLimit {
    pub max_attempts: Option<u64>,
    pub cancel: Option<CancelToken>,
}

impl SearchLimit {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn attempts(max_attempts: u64) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

/// Summary of a successful search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MiningReport {
    pub nonce: u64,
    pub attempts: u64,
    pub elapsed: Duration,
}

/// Winning nonce together with its digest.
#[derive(Clone, Debug)]
pub struct Solution {
    pub hash: Hash,
    pub report: MiningReport,
}

/// Try nonces from `start_nonce` upward until `digest_at(nonce)` has at least
/// `difficulty` leading zero nibbles. `index` only labels errors and events.
pub fn search<F>(
    index: u64,
    start_nonce: u64,
    difficulty: u32,
    limit: &SearchLimit,
    mut digest_at: F,
) -> Result<Solution>
where
    F: FnMut(u64) -> Hash,
{
    check_difficulty(difficulty)?;
    let started = Instant::now();
    let mut nonce = start_nonce;
    let mut attempts = 0u64;
    loop {
        if limit.is_cancelled() {
            return Err(LedgerError::MiningCancelled { index, attempts });
        }
        if limit.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(LedgerError::MiningExhausted { index, attempts });
        }

        let hash = digest_at(nonce);
        attempts += 1;
        if count_leading_zero_nibbles(&hash) >= difficulty {
            return Ok(Solution {
                hash,
                report: MiningReport {
                    nonce,
                    attempts,
                    elapsed: started.elapsed(),
                },
            });
        }
        if attempts % PROGRESS_INTERVAL == 0 {
            debug!(index, nonce, attempts, "mining in progress");
        }
        nonce = nonce
            .checked_add(1)
            .ok_or(LedgerError::NonceOverflow { index })?;
    }
}
