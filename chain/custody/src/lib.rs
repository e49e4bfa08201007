//! Single-Owner Custodial Ledger
//!
//! Accepts deposits from anyone, records every deposit and withdrawal as an
//! immutable indexed log entry, and lets only the owner move value out.
//!
//! # Modules
//! - `ledger`: Append-only transaction log with point lookup by index
//! - `controller`: Owner-gated withdrawals, record-then-transfer sequencing
//! - `access`: Owner guard and the capability it mints
//! - `unit_of_work`: Staged ledger appends, discarded unless committed
//! - `host`: Clock and value-custody collaborators
//! - `events`: Deposited / Withdrawn notifications
//! - `errors`: Error taxonomy
//! - `snapshot`: Integrity-checked persisted state
//! - `shared`: Mutex-serialized controller for multi-threaded hosts
//! - `script`, `config`: Call scripts and configuration for `custody-replay`

pub mod access;
pub mod config;
pub mod controller;
pub mod errors;
pub mod events;
pub mod host;
pub mod ledger;
pub mod script;
pub mod shared;
pub mod snapshot;
pub mod unit_of_work;

pub use controller::CustodyController;
pub use errors::{CustodyError, LedgerError, TransferError};
pub use ledger::{Ledger, TransactionKind, TransactionRecord};
