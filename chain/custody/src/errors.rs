//! Custody error types
//!
//! Error taxonomy for the ledger store, the custody controller, host value
//! transfers and persisted snapshots.

use custody_types::ids::AccountId;
use custody_types::numeric::Amount;
use thiserror::Error;

/// Ledger store errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Transaction index {index} out of range: ledger holds {count} records")]
    OutOfRange { index: u64, count: u64 },

    #[error("Record {index} has a timestamp earlier than its predecessor")]
    NonMonotonicTimestamp { index: u64 },

    #[error("Record {index} takes the running balance out of range")]
    Unbalanced { index: u64 },
}

/// Rejection reported by the host when moving value.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{reason}")]
pub struct TransferError {
    pub reason: String,
}

impl TransferError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Custody controller errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CustodyError {
    #[error("Unauthorized: caller is not the owner")]
    Unauthorized,

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Recipient must not be the null account")]
    InvalidRecipient,

    #[error("Owner must not be the null account")]
    InvalidOwner,

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("No balance to withdraw")]
    NoBalance,

    #[error("Transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Ledger diverged from custody: log accounts for {logged}, custody holds {custodied}")]
    Diverged { logged: Amount, custodied: Amount },
}

/// Snapshot persistence errors
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Integrity check failed: expected {expected}, got {actual}")]
    IntegrityFailure { expected: String, actual: String },

    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),

    #[error("Snapshot owner {found} does not match expected owner {expected}")]
    OwnerMismatch { expected: AccountId, found: AccountId },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Custody error: {0}")]
    Custody(#[from] CustodyError),
}

/// Replay configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
