//! dice-scanner - on-chain activity reconstruction for the dice wagering program
//!
//! This crate derives the program's addresses, reads claimable balances straight
//! from player-pool account bytes, and rebuilds game activity from the
//! program's transaction history.

pub mod types;
pub mod scanner;

// Re-export main types for convenience
pub use types::{ActivityRecord, ClaimableEntry, RawAccount, TransactionSignature};
pub use scanner::{Scanner, ScannerBuilder, ScannerConfig, ScanError};
