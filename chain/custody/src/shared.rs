//! Shared controller for multi-threaded hosts
//!
//! A host that does not serialize calls itself shares one controller behind
//! a single global lock. The lock is held for the whole call, so the
//! stage → transfer → commit sequence of a withdrawal never interleaves with
//! another call.
//!
//! A poisoned lock is recovered. A call that panicked never committed its
//! unit of work, so the ledger still reflects only completed calls.

use custody_types::ids::AccountId;
use custody_types::numeric::Amount;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::controller::CustodyController;
use crate::errors::{CustodyError, SnapshotError};
use crate::events::LedgerEvent;
use crate::host::{Clock, ValueCustody};
use crate::ledger::TransactionRecord;
use crate::snapshot::LedgerSnapshot;

/// Cloneable handle to one controller guarded by a mutex.
#[derive(Debug)]
pub struct SharedController<V, C> {
    inner: Arc<Mutex<CustodyController<V, C>>>,
}

impl<V, C> Clone for SharedController<V, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: ValueCustody, C: Clock> SharedController<V, C> {
    pub fn new(controller: CustodyController<V, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CustodyController<V, C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the controller.
    pub fn with<R>(&self, f: impl FnOnce(&mut CustodyController<V, C>) -> R) -> R {
        f(&mut *self.lock())
    }

    pub fn deposit(&self, participant: AccountId, amount: Amount) -> Result<u64, CustodyError> {
        self.lock().deposit(participant, amount)
    }

    pub fn accept_unsolicited(
        &self,
        participant: AccountId,
        amount: Amount,
    ) -> Result<u64, CustodyError> {
        self.lock().accept_unsolicited(participant, amount)
    }

    pub fn withdraw(&self, caller: &AccountId, amount: Amount) -> Result<u64, CustodyError> {
        self.lock().withdraw(caller, amount)
    }

    pub fn withdraw_all(&self, caller: &AccountId) -> Result<u64, CustodyError> {
        self.lock().withdraw_all(caller)
    }

    pub fn withdraw_to(
        &self,
        caller: &AccountId,
        recipient: AccountId,
        amount: Amount,
    ) -> Result<u64, CustodyError> {
        self.lock().withdraw_to(caller, recipient, amount)
    }

    pub fn balance(&self) -> Amount {
        self.lock().balance()
    }

    pub fn transaction_count(&self) -> u64 {
        self.lock().transaction_count()
    }

    /// Copy of the record at `index`.
    pub fn transaction(&self, index: u64) -> Result<TransactionRecord, CustodyError> {
        self.lock().transaction(index).cloned()
    }

    pub fn owner(&self) -> AccountId {
        *self.lock().owner()
    }

    pub fn drain_events(&self) -> Vec<LedgerEvent> {
        self.lock().drain_events()
    }

    pub fn reconcile(&self) -> Result<Amount, CustodyError> {
        self.lock().reconcile()
    }

    pub fn snapshot(&self) -> Result<LedgerSnapshot, SnapshotError> {
        self.lock().snapshot()
    }
}
