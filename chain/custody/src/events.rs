//! Ledger notifications
//!
//! One notification is emitted per committed ledger append. Notifications are
//! for external auditors and indexers; nothing inside the crate consumes them.

use custody_types::ids::AccountId;
use custody_types::numeric::Amount;
use serde::{Deserialize, Serialize};

/// Value received into custody and recorded at `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposited {
    pub participant: AccountId,
    pub amount: Amount,
    pub index: u64,
}

/// Value sent out of custody and recorded at `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawn {
    pub participant: AccountId,
    pub amount: Amount,
    pub index: u64,
}

/// Enum wrapper for all ledger notifications, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    Deposited(Deposited),
    Withdrawn(Withdrawn),
}

impl LedgerEvent {
    /// Ledger index the notification refers to.
    pub fn index(&self) -> u64 {
        match self {
            LedgerEvent::Deposited(e) => e.index,
            LedgerEvent::Withdrawn(e) => e.index,
        }
    }
}
