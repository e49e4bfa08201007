//! Custody invariant tests
//!
//! End-to-end checks of the custody controller against an in-memory host:
//! - Reference deposit / withdraw / withdraw-to walkthrough
//! - Owner-only access to outbound transfers
//! - Record-then-transfer rollback on host rejection
//! - Dense, permanent ledger indices
//! - Snapshot save and resume onto a fresh host
//! - Log / balance conservation (proptest)

use custody::errors::{CustodyError, LedgerError};
use custody::events::LedgerEvent;
use custody::host::{InMemoryCustody, ManualClock};
use custody::script::{self, Call};
use custody::snapshot::{self, LedgerSnapshot};
use custody::{CustodyController, TransactionKind};
use custody_types::ids::AccountId;
use custody_types::numeric::Amount;

type Controller = CustodyController<InMemoryCustody, ManualClock>;

fn setup() -> (Controller, AccountId) {
    let owner = AccountId::new();
    let controller =
        CustodyController::new(owner, InMemoryCustody::new(), ManualClock::new(1_700_000_000_000))
            .unwrap();
    (controller, owner)
}

// ═══════════════════════════════════════════════════════════════════
// Reference walkthrough
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_deposit_withdraw_withdraw_to_walkthrough() {
    let (mut custody, owner) = setup();
    let a = AccountId::new();
    let b = AccountId::new();

    assert_eq!(custody.balance(), Amount::ZERO);
    assert_eq!(custody.transaction_count(), 0);

    // deposit(100) from A
    custody.deposit(a, Amount::new(100)).unwrap();
    assert_eq!(custody.transaction_count(), 1);
    assert_eq!(custody.balance(), Amount::new(100));
    let entry = custody.transaction(0).unwrap();
    assert_eq!(
        (entry.participant, entry.amount, entry.kind),
        (a, Amount::new(100), TransactionKind::Deposit)
    );

    // withdraw(40) by owner
    custody.withdraw(&owner, Amount::new(40)).unwrap();
    assert_eq!(custody.transaction_count(), 2);
    assert_eq!(custody.balance(), Amount::new(60));
    let entry = custody.transaction(1).unwrap();
    assert_eq!(
        (entry.participant, entry.amount, entry.kind),
        (owner, Amount::new(40), TransactionKind::Withdrawal)
    );

    // withdraw(1000) by owner fails
    let err = custody.withdraw(&owner, Amount::new(1000)).unwrap_err();
    assert!(matches!(err, CustodyError::InsufficientBalance { .. }));
    assert_eq!(custody.transaction_count(), 2);
    assert_eq!(custody.balance(), Amount::new(60));

    // withdraw_to(B, 60) by owner
    custody.withdraw_to(&owner, b, Amount::new(60)).unwrap();
    assert_eq!(custody.transaction_count(), 3);
    assert_eq!(custody.balance(), Amount::ZERO);
    let entry = custody.transaction(2).unwrap();
    assert_eq!(
        (entry.participant, entry.amount, entry.kind),
        (b, Amount::new(60), TransactionKind::Withdrawal)
    );

    let indices: Vec<u64> = custody.events().iter().map(LedgerEvent::index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    custody.reconcile().unwrap();
}

#[test]
fn test_walkthrough_as_script() {
    let (mut custody, owner) = setup();
    let a = AccountId::new();
    let b = AccountId::new();
    let calls = vec![
        Call::Deposit {
            from: a,
            amount: Amount::new(100),
        },
        Call::Withdraw {
            caller: owner,
            amount: Amount::new(40),
        },
        Call::Withdraw {
            caller: owner,
            amount: Amount::new(1000),
        },
        Call::WithdrawTo {
            caller: owner,
            recipient: b,
            amount: Amount::new(60),
        },
    ];

    let indices: Vec<Option<u64>> = calls
        .iter()
        .map(|c| script::execute(&mut custody, c).index)
        .collect();
    assert_eq!(indices, vec![Some(0), Some(1), None, Some(2)]);
    assert_eq!(custody.custody().paid_to(&b), Amount::new(60));
}

// ═══════════════════════════════════════════════════════════════════
// Access control
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_non_owner_restricted_calls_have_no_effect() {
    let (mut custody, _) = setup();
    custody.deposit(AccountId::new(), Amount::new(500)).unwrap();
    let eve = AccountId::new();
    let events_before = custody.events().len();

    assert_eq!(custody.withdraw(&eve, Amount::new(1)), Err(CustodyError::Unauthorized));
    assert_eq!(custody.withdraw_all(&eve), Err(CustodyError::Unauthorized));
    assert_eq!(
        custody.withdraw_to(&eve, eve, Amount::new(1)),
        Err(CustodyError::Unauthorized)
    );

    assert_eq!(custody.transaction_count(), 1);
    assert_eq!(custody.balance(), Amount::new(500));
    assert_eq!(custody.events().len(), events_before);
    assert_eq!(custody.custody().paid_to(&eve), Amount::ZERO);
}

#[test]
fn test_depositing_does_not_grant_withdrawal_rights() {
    let (mut custody, _) = setup();
    let alice = AccountId::new();
    custody.deposit(alice, Amount::new(10)).unwrap();
    assert_eq!(
        custody.withdraw(&alice, Amount::new(10)),
        Err(CustodyError::Unauthorized)
    );
}

#[test]
fn test_nil_caller_is_unauthorized() {
    let (mut custody, _) = setup();
    custody.deposit(AccountId::new(), Amount::new(10)).unwrap();
    assert_eq!(custody.withdraw_all(&AccountId::NIL), Err(CustodyError::Unauthorized));
}

// ═══════════════════════════════════════════════════════════════════
// Record-then-transfer rollback
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_rejected_transfer_leaves_no_trace() {
    let owner = AccountId::new();
    let mut host = InMemoryCustody::new();
    host.reject_recipient(owner);
    let mut custody = CustodyController::new(owner, host, ManualClock::new(0)).unwrap();
    custody.deposit(AccountId::new(), Amount::new(80)).unwrap();
    custody.drain_events();

    for result in [
        custody.withdraw(&owner, Amount::new(10)),
        custody.withdraw_all(&owner),
    ] {
        assert!(matches!(result, Err(CustodyError::TransferFailed(_))));
    }

    assert_eq!(custody.transaction_count(), 1);
    assert_eq!(custody.balance(), Amount::new(80));
    assert!(custody.events().is_empty());
    custody.reconcile().unwrap();
}

#[test]
fn test_withdraw_to_other_recipient_after_rejection() {
    let owner = AccountId::new();
    let contract = AccountId::new();
    let wallet = AccountId::new();
    let mut host = InMemoryCustody::new();
    host.reject_recipient(contract);
    let mut custody = CustodyController::new(owner, host, ManualClock::new(0)).unwrap();
    custody.deposit(AccountId::new(), Amount::new(80)).unwrap();

    assert!(custody.withdraw_to(&owner, contract, Amount::new(80)).is_err());
    assert_eq!(custody.withdraw_to(&owner, wallet, Amount::new(80)).unwrap(), 1);
    assert_eq!(custody.transaction(1).unwrap().participant, wallet);
    assert_eq!(custody.custody().paid_to(&contract), Amount::ZERO);
}

// ═══════════════════════════════════════════════════════════════════
// Ledger indices
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_out_of_range_on_empty_ledger() {
    let (custody, _) = setup();
    assert_eq!(
        custody.transaction(0),
        Err(CustodyError::Ledger(LedgerError::OutOfRange { index: 0, count: 0 }))
    );
}

#[test]
fn test_failed_calls_do_not_consume_indices() {
    let (mut custody, owner) = setup();
    custody.deposit(AccountId::new(), Amount::new(10)).unwrap();
    let _ = custody.deposit(AccountId::new(), Amount::ZERO);
    let _ = custody.withdraw(&owner, Amount::new(11));
    let _ = custody.withdraw_to(&owner, AccountId::NIL, Amount::new(1));
    let _ = custody.withdraw(&AccountId::new(), Amount::new(1));

    assert_eq!(custody.withdraw_all(&owner).unwrap(), 1);
    assert_eq!(custody.withdraw_all(&owner), Err(CustodyError::NoBalance));
    assert_eq!(custody.transaction_count(), 2);
}

#[test]
fn test_timestamps_non_decreasing_with_backwards_clock() {
    let (mut custody, owner) = setup();
    custody.deposit(AccountId::new(), Amount::new(10)).unwrap();
    custody.clock().set(0);
    custody.withdraw(&owner, Amount::new(5)).unwrap();

    let first = custody.transaction(0).unwrap().timestamp;
    let second = custody.transaction(1).unwrap().timestamp;
    assert!(second >= first);
}

// ═══════════════════════════════════════════════════════════════════
// Snapshot resume
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_resume_from_saved_snapshot_after_turnover_past_max() {
    let (mut custody, owner) = setup();
    custody.deposit(AccountId::new(), Amount::new(100)).unwrap();
    custody.withdraw_all(&owner).unwrap();
    custody.deposit(AccountId::new(), Amount::MAX).unwrap();
    assert_eq!(custody.reconcile(), Ok(Amount::MAX));

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("custody.json");
    custody.snapshot().unwrap().save(&path).unwrap();

    let saved = LedgerSnapshot::load(&path).unwrap();
    let mut resumed =
        snapshot::resume_in_memory(saved, &owner, InMemoryCustody::new(), ManualClock::new(0))
            .unwrap();
    assert_eq!(resumed.balance(), Amount::MAX);
    assert_eq!(resumed.transaction_count(), 3);
    assert_eq!(resumed.withdraw(&owner, Amount::MAX).unwrap(), 3);
    assert_eq!(resumed.reconcile(), Ok(Amount::ZERO));
}

// ═══════════════════════════════════════════════════════════════════
// Fuzz tests (proptest)
// ═══════════════════════════════════════════════════════════════════

mod fuzz {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Deposit(u64),
        Unsolicited(u64),
        Withdraw(u64),
        WithdrawAll,
        WithdrawTo(u64),
        Intruder(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..=1_000).prop_map(Op::Deposit),
            (1u64..=1_000).prop_map(Op::Unsolicited),
            (0u64..=1_500).prop_map(Op::Withdraw),
            Just(Op::WithdrawAll),
            (0u64..=1_500).prop_map(Op::WithdrawTo),
            (0u64..=1_500).prop_map(Op::Intruder),
        ]
    }

    proptest! {
        /// Invariant: balance always equals logged deposits minus logged
        /// withdrawals, and the log grows by one per successful call.
        #[test]
        fn fuzz_log_and_balance_never_diverge(ops in prop::collection::vec(op(), 1..60)) {
            let (mut custody, owner) = setup();
            let depositor = AccountId::new();
            let recipient = AccountId::new();
            let intruder = AccountId::new();
            let mut successes = 0u64;

            for op in ops {
                let count_before = custody.transaction_count();
                let balance_before = custody.balance();
                let result = match op {
                    Op::Deposit(n) => custody.deposit(depositor, Amount::from(n)),
                    Op::Unsolicited(n) => custody.accept_unsolicited(depositor, Amount::from(n)),
                    Op::Withdraw(n) => custody.withdraw(&owner, Amount::from(n)),
                    Op::WithdrawAll => custody.withdraw_all(&owner),
                    Op::WithdrawTo(n) => custody.withdraw_to(&owner, recipient, Amount::from(n)),
                    Op::Intruder(n) => custody.withdraw(&intruder, Amount::from(n)),
                };
                match result {
                    Ok(index) => {
                        prop_assert_eq!(index, count_before);
                        successes += 1;
                    }
                    Err(_) => {
                        prop_assert_eq!(custody.transaction_count(), count_before);
                        prop_assert_eq!(custody.balance(), balance_before);
                    }
                }
                prop_assert!(custody.reconcile().is_ok());
            }

            prop_assert_eq!(custody.transaction_count(), successes);
            prop_assert_eq!(custody.events().len() as u64, successes);
            prop_assert_eq!(custody.custody().paid_to(&intruder), Amount::ZERO);
        }

        /// Invariant: lookups past the end fail for every ledger length.
        #[test]
        fn fuzz_out_of_range_for_any_count(deposits in 0usize..20, past_end in 0u64..5) {
            let (mut custody, _) = setup();
            for _ in 0..deposits {
                custody.deposit(AccountId::new(), Amount::new(1)).unwrap();
            }
            let count = custody.transaction_count();
            prop_assert_eq!(count, deposits as u64);
            prop_assert_eq!(
                custody.transaction(count + past_end),
                Err(CustodyError::Ledger(LedgerError::OutOfRange {
                    index: count + past_end,
                    count,
                }))
            );
        }
    }
}
