//! Custody Controller: owner-gated withdrawals over the ledger store
//!
//! Every call runs `Start → Authorized? → Validated? → Recorded →
//! Transferred → Done`. A call that fails at any gate leaves the ledger,
//! the notification outbox, and the custodied balance exactly as they were.
//!
//! Withdrawals are record-then-transfer: the withdrawal record is staged in a
//! `UnitOfWork` before the host is asked to move value, and the unit is
//! committed only after the host reports success. Deposits take value in
//! first and record second; recording cannot fail.

use custody_types::ids::AccountId;
use custody_types::numeric::Amount;
use tracing::{info, warn};

use crate::access::{OwnerCapability, OwnerGuard};
use crate::errors::CustodyError;
use crate::events::LedgerEvent;
use crate::host::{Clock, ValueCustody};
use crate::ledger::{Ledger, TransactionKind, TransactionRecord};
use crate::unit_of_work::UnitOfWork;

/// Single long-lived custody service.
///
/// Constructed once with its owner; there is no path that replaces the
/// owner or resets the ledger.
#[derive(Debug)]
pub struct CustodyController<V, C> {
    guard: OwnerGuard,
    ledger: Ledger,
    custody: V,
    clock: C,
}

impl<V: ValueCustody, C: Clock> CustodyController<V, C> {
    /// Create a controller owned by `owner` with an empty ledger.
    pub fn new(owner: AccountId, custody: V, clock: C) -> Result<Self, CustodyError> {
        Self::with_ledger(owner, Ledger::new(), custody, clock)
    }

    /// Create a controller over an existing ledger (used by snapshot restore).
    pub(crate) fn with_ledger(
        owner: AccountId,
        ledger: Ledger,
        custody: V,
        clock: C,
    ) -> Result<Self, CustodyError> {
        let guard = OwnerGuard::new(owner)?;
        info!(%owner, records = ledger.count(), "Custody controller created");
        Ok(Self {
            guard,
            ledger,
            custody,
            clock,
        })
    }

    // ───────────────────────── Deposits ─────────────────────────

    /// Deposit `amount` from `participant`. Open to any caller.
    ///
    /// Returns the index of the Deposit record.
    pub fn deposit(&mut self, participant: AccountId, amount: Amount) -> Result<u64, CustodyError> {
        if amount.is_zero() {
            return Err(CustodyError::InvalidAmount);
        }
        self.record_deposit(participant, amount)
    }

    /// Record value that arrived without an explicit deposit call.
    ///
    /// The host only delivers positive value transfers, so the amount is
    /// not re-checked here.
    pub fn accept_unsolicited(
        &mut self,
        participant: AccountId,
        amount: Amount,
    ) -> Result<u64, CustodyError> {
        self.record_deposit(participant, amount)
    }

    fn record_deposit(&mut self, participant: AccountId, amount: Amount) -> Result<u64, CustodyError> {
        self.custody.receive(&participant, amount).map_err(|e| {
            warn!(%participant, %amount, reason = %e, "Deposit refused by host");
            CustodyError::TransferFailed(e)
        })?;

        let timestamp = self.clock.now();
        let index = self
            .ledger
            .append(participant, amount, TransactionKind::Deposit, timestamp);

        info!(index, %participant, %amount, balance = %self.custody.balance(), "Deposit recorded");
        Ok(index)
    }

    // ───────────────────────── Withdrawals ─────────────────────────

    /// Withdraw `amount` to the owner. Owner only.
    pub fn withdraw(&mut self, caller: &AccountId, amount: Amount) -> Result<u64, CustodyError> {
        let cap = self.guard.authorize(caller)?;
        let owner = cap.owner();
        self.payout(&cap, owner, amount)
    }

    /// Withdraw the entire custodied balance to the owner. Owner only.
    pub fn withdraw_all(&mut self, caller: &AccountId) -> Result<u64, CustodyError> {
        let cap = self.guard.authorize(caller)?;
        let balance = self.custody.balance();
        if balance.is_zero() {
            return Err(CustodyError::NoBalance);
        }
        let owner = cap.owner();
        self.payout(&cap, owner, balance)
    }

    /// Withdraw `amount` to `recipient`. Owner only.
    pub fn withdraw_to(
        &mut self,
        caller: &AccountId,
        recipient: AccountId,
        amount: Amount,
    ) -> Result<u64, CustodyError> {
        let cap = self.guard.authorize(caller)?;
        if recipient.is_nil() {
            return Err(CustodyError::InvalidRecipient);
        }
        self.payout(&cap, recipient, amount)
    }

    /// Validate, stage the Withdrawal record, transfer, then commit.
    fn payout(
        &mut self,
        _cap: &OwnerCapability,
        recipient: AccountId,
        amount: Amount,
    ) -> Result<u64, CustodyError> {
        if amount.is_zero() {
            return Err(CustodyError::InvalidAmount);
        }
        let available = self.custody.balance();
        if amount > available {
            return Err(CustodyError::InsufficientBalance {
                required: amount,
                available,
            });
        }

        let timestamp = self.clock.now();
        let mut uow = UnitOfWork::begin(&mut self.ledger);
        let index = uow.stage(recipient, amount, TransactionKind::Withdrawal, timestamp);

        if let Err(e) = self.custody.send(&recipient, amount) {
            uow.rollback();
            warn!(index, %recipient, %amount, reason = %e, "Withdrawal rolled back: transfer failed");
            return Err(CustodyError::TransferFailed(e));
        }

        uow.commit();
        info!(index, %recipient, %amount, balance = %self.custody.balance(), "Withdrawal recorded");
        Ok(index)
    }

    // ───────────────────────── Read-only accessors ─────────────────────────

    /// Custodied balance as reported by the host.
    pub fn balance(&self) -> Amount {
        self.custody.balance()
    }

    pub fn transaction_count(&self) -> u64 {
        self.ledger.count()
    }

    /// Record at `index`, or `OutOfRange`.
    pub fn transaction(&self, index: u64) -> Result<&TransactionRecord, CustodyError> {
        Ok(self.ledger.get(index)?)
    }

    pub fn owner(&self) -> &AccountId {
        self.guard.owner()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn custody(&self) -> &V {
        &self.custody
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ───────────────────────── Events ─────────────────────────

    /// Notifications not yet drained.
    pub fn events(&self) -> &[LedgerEvent] {
        self.ledger.events()
    }

    /// Drain all notifications (consume and clear).
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        self.ledger.drain_events()
    }

    // ───────────────────────── Audit ─────────────────────────

    /// Check that the balance the log accounts for equals the custodied
    /// balance, and return it.
    ///
    /// Only meaningful when custody started empty and every value movement
    /// went through this controller.
    pub fn reconcile(&self) -> Result<Amount, CustodyError> {
        let logged = self.ledger.net_balance()?;
        let custodied = self.custody.balance();
        if logged != custodied {
            warn!(%logged, %custodied, "Ledger does not reconcile with custody");
            return Err(CustodyError::Diverged { logged, custodied });
        }
        Ok(logged)
    }
}
