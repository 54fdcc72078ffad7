//! Error kinds surfaced by the scanning pipeline.
//!
//! Expected "nothing here" outcomes are not errors: an absent account or
//! transaction is `Ok(None)`, and a buffer that does not match the expected
//! shape is skipped (see [`SkipReason`]).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// A query could not complete. Safe to retry.
    #[error("network error: {0}")]
    Network(String),
    /// Wrong program id, seed, cursor or config value.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A maintenance transaction could not be signed or was rejected.
    #[error("submission failed: {0}")]
    Submission(String),
    #[error("operation cancelled")]
    Cancelled,
}

impl ScanError {
    /// Whether retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScanError::Network(_))
    }
}

/// Why a transaction or account did not yield a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TransactionNotFound,
    TransactionFailed,
    NoMarkedInstruction,
    MissingInnerInstructions,
    MissingActor,
    MalformedData,
    BufferTooShort,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::TransactionNotFound => "transaction not found",
            SkipReason::TransactionFailed => "transaction failed",
            SkipReason::NoMarkedInstruction => "no instruction carries the program marker",
            SkipReason::MissingInnerInstructions => "inner instructions not reported",
            SkipReason::MissingActor => "target instruction has no valid actor account",
            SkipReason::MalformedData => "instruction data is not valid base58",
            SkipReason::BufferTooShort => "buffer too short",
        };
        f.write_str(s)
    }
}
