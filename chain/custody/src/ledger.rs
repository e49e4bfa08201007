//! Ledger Store: append-only, index-ordered transaction history
//!
//! Every deposit and withdrawal becomes one `TransactionRecord`. A record's
//! index is its 0-based insertion position; indices are dense and permanent.
//! Nothing in this module mutates or removes a record once appended.
//!
//! Each append also queues a `LedgerEvent` in the notification outbox.

use custody_types::ids::AccountId;
use custody_types::numeric::Amount;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::LedgerError;
use crate::events::{Deposited, LedgerEvent, Withdrawn};

/// Direction of a fund movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

/// A single immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Depositor for a deposit, recipient for a withdrawal
    pub participant: AccountId,
    pub amount: Amount,
    /// Unix milliseconds supplied by the host clock
    pub timestamp: i64,
    pub kind: TransactionKind,
}

/// Append-only transaction log.
#[derive(Debug, Default)]
pub struct Ledger {
    records: Vec<TransactionRecord>,
    /// Notification outbox (one entry per append)
    events: Vec<LedgerEvent>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted records, in order.
    ///
    /// Rejects sequences whose timestamps decrease. No notifications are
    /// queued for restored records.
    pub fn from_records(records: Vec<TransactionRecord>) -> Result<Self, LedgerError> {
        for (i, pair) in records.windows(2).enumerate() {
            if pair[1].timestamp < pair[0].timestamp {
                return Err(LedgerError::NonMonotonicTimestamp {
                    index: i as u64 + 1,
                });
            }
        }
        Ok(Self {
            records,
            events: Vec::new(),
        })
    }

    /// Append a record and return its index.
    ///
    /// Performs no validation of `participant` or `amount`. A `timestamp`
    /// older than the last record is clamped up to it.
    pub fn append(
        &mut self,
        participant: AccountId,
        amount: Amount,
        kind: TransactionKind,
        timestamp: i64,
    ) -> u64 {
        let index = self.count();
        let timestamp = match self.records.last() {
            Some(last) if timestamp < last.timestamp => {
                warn!(
                    index,
                    reported = timestamp,
                    last = last.timestamp,
                    "Host clock went backwards; clamping record timestamp"
                );
                last.timestamp
            }
            _ => timestamp,
        };

        self.records.push(TransactionRecord {
            participant,
            amount,
            timestamp,
            kind,
        });

        let event = match kind {
            TransactionKind::Deposit => LedgerEvent::Deposited(Deposited {
                participant,
                amount,
                index,
            }),
            TransactionKind::Withdrawal => LedgerEvent::Withdrawn(Withdrawn {
                participant,
                amount,
                index,
            }),
        };
        self.events.push(event);

        debug!(index, %participant, %amount, ?kind, "Ledger record appended");
        index
    }

    /// Number of records.
    pub fn count(&self) -> u64 {
        self.records.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Point lookup by index.
    pub fn get(&self, index: u64) -> Result<&TransactionRecord, LedgerError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.records.get(i))
            .ok_or(LedgerError::OutOfRange {
                index,
                count: self.count(),
            })
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    /// Iterate `(index, record)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &TransactionRecord)> + '_ {
        self.records.iter().enumerate().map(|(i, r)| (i as u64, r))
    }

    /// Replay every record in order and return the balance the log
    /// accounts for.
    ///
    /// Each step uses checked arithmetic, so a log whose lifetime turnover
    /// exceeds `Amount::MAX` still nets correctly. Fails with `Unbalanced`
    /// at the first record that would take the running balance below zero
    /// or above `Amount::MAX`.
    pub fn net_balance(&self) -> Result<Amount, LedgerError> {
        self.iter().try_fold(Amount::ZERO, |running, (index, record)| {
            let next = match record.kind {
                TransactionKind::Deposit => running.checked_add(record.amount),
                TransactionKind::Withdrawal => running.checked_sub(record.amount),
            };
            next.ok_or(LedgerError::Unbalanced { index })
        })
    }

    // ───────────────────────── Events ─────────────────────────

    /// Notifications not yet drained.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Drain all notifications (consume and clear). Records are untouched.
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }
}
