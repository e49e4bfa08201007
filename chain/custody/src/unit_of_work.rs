//! Scoped unit of work over the ledger
//!
//! A call stages its ledger appends here, performs its external step (the
//! value transfer), and then either commits or lets the unit drop. Staged
//! records reach the ledger, and their notifications reach the outbox, only
//! on `commit`. Dropping an uncommitted unit, including while unwinding from
//! a panic, discards everything staged.
//!
//! Indices are reserved at staging time. The unit holds the ledger mutably,
//! so nothing else can append between staging and commit and the reserved
//! indices are exactly the ones the ledger assigns.

use custody_types::ids::AccountId;
use custody_types::numeric::Amount;
use tracing::debug;

use crate::ledger::{Ledger, TransactionKind};

#[derive(Debug)]
struct StagedRecord {
    index: u64,
    participant: AccountId,
    amount: Amount,
    kind: TransactionKind,
    timestamp: i64,
}

/// Staged ledger appends for a single call.
#[derive(Debug)]
pub struct UnitOfWork<'a> {
    ledger: &'a mut Ledger,
    staged: Vec<StagedRecord>,
}

impl<'a> UnitOfWork<'a> {
    /// Open a unit of work on `ledger`.
    pub fn begin(ledger: &'a mut Ledger) -> Self {
        Self {
            ledger,
            staged: Vec::new(),
        }
    }

    /// Stage an append and return the index the record will receive.
    pub fn stage(
        &mut self,
        participant: AccountId,
        amount: Amount,
        kind: TransactionKind,
        timestamp: i64,
    ) -> u64 {
        let index = self.ledger.count() + self.staged.len() as u64;
        self.staged.push(StagedRecord {
            index,
            participant,
            amount,
            kind,
            timestamp,
        });
        index
    }

    /// Number of staged appends.
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Apply every staged append to the ledger, in staging order.
    pub fn commit(mut self) -> Vec<u64> {
        let staged = std::mem::take(&mut self.staged);
        staged
            .into_iter()
            .map(|s| {
                let index = self.ledger.append(s.participant, s.amount, s.kind, s.timestamp);
                debug_assert_eq!(index, s.index, "reserved index must match assigned index");
                index
            })
            .collect()
    }

    /// Discard every staged append.
    pub fn rollback(mut self) {
        self.discard();
    }

    fn discard(&mut self) {
        if !self.staged.is_empty() {
            debug!(
                discarded = self.staged.len(),
                first_index = self.staged[0].index,
                "Unit of work rolled back"
            );
            self.staged.clear();
        }
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        self.discard();
    }
}
