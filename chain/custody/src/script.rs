//! Call scripts for replaying custody activity
//!
//! A script is a JSON array of calls, each naming its caller explicitly:
//!
//! ```json
//! [
//!   { "deposit":      { "from": "0190…", "amount": 100 } },
//!   { "withdraw":     { "caller": "0190…", "amount": 40 } },
//!   { "withdraw_to":  { "caller": "0190…", "recipient": "0190…", "amount": 60 } },
//!   { "withdraw_all": { "caller": "0190…" } }
//! ]
//! ```
//!
//! Failed calls are reported in the outcome list and do not stop the run,
//! mirroring a host that rejects one call and carries on with the next.

use custody_types::ids::AccountId;
use custody_types::numeric::Amount;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::controller::CustodyController;
use crate::errors::CustodyError;
use crate::events::LedgerEvent;
use crate::host::{Clock, ValueCustody};
use crate::ledger::TransactionRecord;

/// One public entry point invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Call {
    Deposit {
        from: AccountId,
        amount: Amount,
    },
    AcceptUnsolicited {
        from: AccountId,
        amount: Amount,
    },
    Withdraw {
        caller: AccountId,
        amount: Amount,
    },
    WithdrawAll {
        caller: AccountId,
    },
    WithdrawTo {
        caller: AccountId,
        recipient: AccountId,
        amount: Amount,
    },
}

/// Result of one scripted call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallOutcome {
    pub call: Call,
    /// Ledger index on success
    pub index: Option<u64>,
    /// Error message on failure
    pub error: Option<String>,
}

/// Invoke the controller entry point named by `call`.
pub fn apply<V: ValueCustody, C: Clock>(
    controller: &mut CustodyController<V, C>,
    call: &Call,
) -> Result<u64, CustodyError> {
    match call {
        Call::Deposit { from, amount } => controller.deposit(*from, *amount),
        Call::AcceptUnsolicited { from, amount } => controller.accept_unsolicited(*from, *amount),
        Call::Withdraw { caller, amount } => controller.withdraw(caller, *amount),
        Call::WithdrawAll { caller } => controller.withdraw_all(caller),
        Call::WithdrawTo {
            caller,
            recipient,
            amount,
        } => controller.withdraw_to(caller, *recipient, *amount),
    }
}

/// Apply `call` and capture its outcome.
pub fn execute<V: ValueCustody, C: Clock>(
    controller: &mut CustodyController<V, C>,
    call: &Call,
) -> CallOutcome {
    let result = apply(controller, call);
    debug!(?call, ?result, "Scripted call executed");
    match result {
        Ok(index) => CallOutcome {
            call: call.clone(),
            index: Some(index),
            error: None,
        },
        Err(e) => CallOutcome {
            call: call.clone(),
            index: None,
            error: Some(e.to_string()),
        },
    }
}

/// Final state of a replay run.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub owner: AccountId,
    pub balance: Amount,
    pub transaction_count: u64,
    pub records: Vec<TransactionRecord>,
    pub events: Vec<LedgerEvent>,
    pub outcomes: Vec<CallOutcome>,
    /// Whether logged deposits minus withdrawals equal the balance
    pub reconciled: bool,
}

impl ReplaySummary {
    /// Collect the summary, draining the controller's notifications.
    pub fn collect<V: ValueCustody, C: Clock>(
        controller: &mut CustodyController<V, C>,
        outcomes: Vec<CallOutcome>,
    ) -> Self {
        let reconciled = controller.reconcile().is_ok();
        let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
        info!(
            calls = outcomes.len(),
            failed,
            records = controller.transaction_count(),
            balance = %controller.balance(),
            reconciled,
            "Replay finished"
        );
        Self {
            owner: *controller.owner(),
            balance: controller.balance(),
            transaction_count: controller.transaction_count(),
            records: controller.ledger().records().to_vec(),
            events: controller.drain_events(),
            outcomes,
            reconciled,
        }
    }
}
