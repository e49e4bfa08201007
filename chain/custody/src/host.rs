//! Host collaborators
//!
//! The custody controller does not own value or time. The host supplies:
//! - a timestamp source (`Clock`)
//! - the value-custody mechanism (`ValueCustody`) that holds the custodied
//!   balance, receives value on deposit and moves value out on withdrawal
//!
//! `SystemClock` and `InMemoryCustody` are the implementations used by the
//! replay tool and the tests; `ManualClock` gives tests full control of time.

use chrono::Utc;
use custody_types::ids::AccountId;
use custody_types::numeric::Amount;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

use crate::errors::TransferError;

/// Source of record timestamps (unix milliseconds).
pub trait Clock {
    fn now(&self) -> i64;
}

/// The host's value-custody mechanism.
///
/// `receive` and `send` either move the full amount or move nothing and
/// report why.
pub trait ValueCustody {
    /// Value currently held.
    fn balance(&self) -> Amount;

    /// Take `amount` into custody from `from`.
    fn receive(&mut self, from: &AccountId, amount: Amount) -> Result<(), TransferError>;

    /// Move `amount` out of custody to `to`.
    fn send(&mut self, to: &AccountId, amount: Amount) -> Result<(), TransferError>;
}

/// Wall clock backed by `chrono::Utc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// In-process value custody.
///
/// Tracks the custodied balance and how much each recipient has been paid.
/// Recipients registered with `reject_recipient` refuse incoming value, the
/// way a recipient contract that reverts would.
#[derive(Debug, Default)]
pub struct InMemoryCustody {
    balance: Amount,
    paid_out: HashMap<AccountId, Amount>,
    rejecting: HashSet<AccountId>,
}

impl InMemoryCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future `send` to `recipient` fail.
    pub fn reject_recipient(&mut self, recipient: AccountId) {
        self.rejecting.insert(recipient);
    }

    /// Allow `recipient` to receive value again.
    pub fn accept_recipient(&mut self, recipient: &AccountId) {
        self.rejecting.remove(recipient);
    }

    /// Total value sent to `recipient` so far.
    pub fn paid_to(&self, recipient: &AccountId) -> Amount {
        self.paid_out.get(recipient).copied().unwrap_or(Amount::ZERO)
    }
}

impl ValueCustody for InMemoryCustody {
    fn balance(&self) -> Amount {
        self.balance
    }

    fn receive(&mut self, from: &AccountId, amount: Amount) -> Result<(), TransferError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::new("custodied balance would overflow"))?;
        debug!(%from, %amount, balance = %self.balance, "Value received");
        Ok(())
    }

    fn send(&mut self, to: &AccountId, amount: Amount) -> Result<(), TransferError> {
        if self.rejecting.contains(to) {
            return Err(TransferError::new(format!("recipient {to} rejected the transfer")));
        }
        let remaining = self.balance.checked_sub(amount).ok_or_else(|| {
            TransferError::new(format!(
                "custody holds {} but {} was requested",
                self.balance, amount
            ))
        })?;
        let paid = self.paid_out.entry(*to).or_insert(Amount::ZERO);
        *paid = paid.saturating_add(amount);
        self.balance = remaining;
        debug!(%to, %amount, balance = %self.balance, "Value sent");
        Ok(())
    }
}
