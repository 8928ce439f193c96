mod common;

use common::{day, household_id, member, split_transaction, two_member_household};
use household_core::domain::{Category, Household, Transaction, TransactionKind};
use household_core::errors::LedgerError;
use household_core::ledger::{LedgerMutator, Months};
use household_core::storage::Write;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn with_months(months: Months) -> Household {
    Household {
        months,
        ..two_member_household()
    }
}

fn lunch() -> Transaction {
    split_transaction(
        "Lunch",
        Category::Food,
        day(2024, 1, 15),
        &[("a", dec!(10.00)), ("b", dec!(20.00))],
    )
}

#[test]
fn adding_split_expense_builds_bucket() {
    let mutator = LedgerMutator::default();
    let txn = lunch();
    assert_eq!(txn.amount, dec!(30.00));

    let plan = mutator
        .plan_write(&household_id(), &two_member_household(), None, Some(&txn), TransactionKind::Expense)
        .unwrap();
    let bucket = &plan.months[&day(2024, 1, 1)];
    assert_eq!(bucket.e_counter, 1);
    assert_eq!(bucket.i_counter, 0);
    let a = bucket.cell(&member("a"), Category::Food).unwrap();
    let b = bucket.cell(&member("b"), Category::Food).unwrap();
    assert_eq!((a.expense, a.income), (dec!(10.00), Decimal::ZERO));
    assert_eq!((b.expense, b.income), (dec!(20.00), Decimal::ZERO));
    assert_eq!(plan.months.len(), 1);
}

#[test]
fn delete_then_add_restores_identical_months() {
    let mutator = LedgerMutator::default();
    let txn = lunch();
    let other = split_transaction(
        "Salary",
        Category::Salary,
        day(2024, 1, 25),
        &[("a", dec!(1200.00))],
    );
    let seeded = mutator
        .plan_write(&household_id(), &two_member_household(), None, Some(&txn), TransactionKind::Expense)
        .unwrap();
    let seeded = mutator
        .plan_write(&household_id(), &with_months(seeded.months), None, Some(&other), TransactionKind::Income)
        .unwrap();
    let before = seeded.months;

    let mut months = before.clone();
    mutator
        .remove_contribution(&mut months, &txn, TransactionKind::Expense)
        .unwrap();
    assert_ne!(months, before);
    mutator
        .add_contribution(&mut months, &txn, TransactionKind::Expense, false)
        .unwrap();

    assert_eq!(months, before);
    assert_eq!(
        serde_json::to_string(&months).unwrap(),
        serde_json::to_string(&before).unwrap()
    );
}

#[test]
fn editing_across_months_moves_contribution() {
    let mutator = LedgerMutator::default();
    let old = lunch();
    let added = mutator
        .plan_write(&household_id(), &two_member_household(), None, Some(&old), TransactionKind::Expense)
        .unwrap();
    let household = with_months(added.months);

    let mut moved = old.clone();
    moved.timestamp = day(2024, 2, 3);
    let plan = mutator
        .plan_write(&household_id(), &household, Some(&old), Some(&moved), TransactionKind::Expense)
        .unwrap();

    let jan = &plan.months[&day(2024, 1, 1)];
    let feb = &plan.months[&day(2024, 2, 1)];
    assert_eq!(jan.e_counter, 0);
    assert_eq!(feb.e_counter, 1);
    assert!(jan.cell(&member("a"), Category::Food).unwrap().expense.is_zero());
    assert!(jan.cell(&member("b"), Category::Food).unwrap().expense.is_zero());
    assert_eq!(feb.cell(&member("a"), Category::Food).unwrap().expense, dec!(10.00));
    assert_eq!(feb.cell(&member("b"), Category::Food).unwrap().expense, dec!(20.00));
    assert_eq!(plan.transaction.unwrap().id, old.id);
}

#[test]
fn same_month_edit_keeps_counter() {
    let mutator = LedgerMutator::default();
    let old = lunch();
    let added = mutator
        .plan_write(&household_id(), &two_member_household(), None, Some(&old), TransactionKind::Expense)
        .unwrap();
    let mut cheaper = split_transaction(
        "Lunch",
        Category::Groceries,
        day(2024, 1, 16),
        &[("a", dec!(5.00)), ("b", dec!(5.00))],
    );
    cheaper.id = old.id.clone();

    let plan = mutator
        .plan_write(&household_id(), &with_months(added.months), Some(&old), Some(&cheaper), TransactionKind::Expense)
        .unwrap();
    let jan = &plan.months[&day(2024, 1, 1)];
    assert_eq!(jan.e_counter, 1);
    assert_eq!(jan.member_totals(&member("a")).expense, dec!(5.00));
    assert_eq!(jan.member_totals(&member("b")).expense, dec!(5.00));
    assert_eq!(plan.batch.len(), 2);
}

#[test]
fn plan_limit_rejects_and_leaves_months_unchanged() {
    let mutator = LedgerMutator::default();
    let mut months = Months::new();
    months.entry(day(2024, 1, 1)).or_default().e_counter = 350;
    let household = with_months(months.clone());

    let err = mutator
        .plan_write(&household_id(), &household, None, Some(&lunch()), TransactionKind::Expense)
        .unwrap_err();
    match err {
        LedgerError::PlanLimitExceeded { month, kind, limit } => {
            assert_eq!(month, day(2024, 1, 1));
            assert_eq!(kind, TransactionKind::Expense);
            assert_eq!(limit, 350);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(household.months, months);

    // Incomes have their own counter.
    assert!(mutator
        .plan_write(&household_id(), &household, None, Some(&lunch()), TransactionKind::Income)
        .is_ok());
}

#[test]
fn paid_household_ignores_plan_limit() {
    let mutator = LedgerMutator::default();
    let mut months = Months::new();
    months.entry(day(2024, 1, 1)).or_default().e_counter = 350;
    let household = Household {
        is_paid: true,
        ..with_months(months)
    };
    let plan = mutator
        .plan_write(&household_id(), &household, None, Some(&lunch()), TransactionKind::Expense)
        .unwrap();
    assert_eq!(plan.months[&day(2024, 1, 1)].e_counter, 351);
}

#[test]
fn invalid_transaction_is_rejected_before_planning() {
    let mutator = LedgerMutator::default();
    let mut txn = lunch();
    txn.amount = dec!(31.00);
    let err = mutator
        .plan_write(&household_id(), &two_member_household(), None, Some(&txn), TransactionKind::Expense)
        .unwrap_err();
    match err {
        LedgerError::Validation(errors) => assert_eq!(
            errors.amount.as_deref(),
            Some("Must be equal to the total of all members")
        ),
        other => panic!("unexpected error {other:?}"),
    }
}

fn sub_cent_split() -> Transaction {
    let mut txn = split_transaction("Coffee", Category::Food, day(2024, 1, 9), &[("a", dec!(1.00))]);
    txn.members_amount.clear();
    txn.members_amount.insert(member("a"), dec!(0.995));
    txn.members_amount.insert(member("b"), dec!(0.005));
    txn
}

#[test]
fn sub_cent_split_is_rejected_before_planning() {
    let err = LedgerMutator::default()
        .plan_write(
            &household_id(),
            &two_member_household(),
            None,
            Some(&sub_cent_split()),
            TransactionKind::Expense,
        )
        .unwrap_err();
    match err {
        LedgerError::Validation(errors) => {
            assert_eq!(
                errors.members_amount.get(&member("a")).map(String::as_str),
                Some("Must have at most 2 decimals")
            );
            assert!(errors.members_amount.contains_key(&member("b")));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn stored_sub_cent_split_reverses_to_zero() {
    let mutator = LedgerMutator::default();
    let txn = sub_cent_split();
    let mut months = Months::new();
    mutator
        .add_contribution(&mut months, &txn, TransactionKind::Expense, false)
        .unwrap();
    mutator
        .remove_contribution(&mut months, &txn, TransactionKind::Expense)
        .unwrap();

    let bucket = &months[&day(2024, 1, 1)];
    assert_eq!(bucket.e_counter, 0);
    assert_eq!(bucket.member_totals(&member("a")).expense, Decimal::ZERO);
    assert_eq!(bucket.member_totals(&member("b")).expense, Decimal::ZERO);
}

#[test]
fn delete_emits_record_delete_and_months_merge() {
    let mutator = LedgerMutator::default();
    let txn = lunch();
    let added = mutator
        .plan_write(&household_id(), &two_member_household(), None, Some(&txn), TransactionKind::Income)
        .unwrap();
    let plan = mutator
        .plan_write(&household_id(), &with_months(added.months), Some(&txn), None, TransactionKind::Income)
        .unwrap();
    assert!(plan.transaction.is_none());
    assert!(matches!(&plan.batch.writes()[0], Write::Delete { path } if path.as_str().ends_with(&format!("Incomes/{}", txn.id))));
    assert!(matches!(&plan.batch.writes()[1], Write::Set { merge: true, .. }));
    assert_eq!(plan.months[&day(2024, 1, 1)].i_counter, 0);
}

proptest! {
    #[test]
    fn split_sum_matches_amount(cents in proptest::collection::vec(0i64..100_000, 1..6)) {
        prop_assume!(cents.iter().any(|c| *c > 0));
        let split: Vec<(String, Decimal)> = cents
            .iter()
            .enumerate()
            .map(|(idx, c)| (format!("m{idx}"), Decimal::new(*c, 2)))
            .collect();
        let borrowed: Vec<(&str, Decimal)> = split.iter().map(|(id, v)| (id.as_str(), *v)).collect();
        let txn = split_transaction("Split", Category::Home, day(2024, 3, 10), &borrowed);

        prop_assert!(txn.validate().is_ok());
        prop_assert!((txn.split_total() - txn.amount).abs() < dec!(0.01));

        let plan = LedgerMutator::default()
            .plan_write(&household_id(), &two_member_household(), None, Some(&txn), TransactionKind::Expense)
            .unwrap();
        let bucket = &plan.months[&day(2024, 3, 1)];
        let rolled: Decimal = borrowed
            .iter()
            .map(|(id, _)| bucket.member_totals(&member(id)).expense)
            .sum();
        prop_assert_eq!(rolled, txn.amount);
    }
}
