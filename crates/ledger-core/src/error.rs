use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("payload cannot be serialized: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("difficulty {difficulty} exceeds the maximum of {max}")]
    DifficultyOutOfRange { difficulty: u32, max: u32 },

    #[error("mining block {index} gave up after {attempts} attempts")]
    MiningExhausted { index: u64, attempts: u64 },

    #[error("mining block {index} cancelled after {attempts} attempts")]
    MiningCancelled { index: u64, attempts: u64 },

    #[error("nonce space exhausted while mining block {index}")]
    NonceOverflow { index: u64 },
}

/// Reason a stored block failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("block {index}: stored hash {stored} does not match contents ({computed})")]
    ContentMismatch {
        index: u64,
        stored: String,
        computed: String,
    },

    #[error("block {index}: previous hash {found} does not link to {expected}")]
    LinkMismatch {
        index: u64,
        expected: String,
        found: String,
    },
}

impl ValidationError {
    /// Position of the offending block in the chain.
    pub fn index(&self) -> u64 {
        match self {
            ValidationError::ContentMismatch { index, .. }
            | ValidationError::LinkMismatch { index, .. } => *index,
        }
    }
}
