mod common;

use chrono::NaiveDate;
use common::{day, household_id, member, split_transaction, two_member_household};
use household_core::domain::{Category, Household, RecurringTransaction, Timestamp, TransactionKind};
use household_core::errors::LedgerError;
use household_core::ledger::{Calendar, LedgerMutator, Months, Period, RecurrenceEngine};
use household_core::storage::Write;
use proptest::prelude::*;
use rust_decimal_macros::dec;

const DAY: i64 = 86_400_000;

fn template(due: Timestamp, period: Period) -> RecurringTransaction {
    RecurringTransaction::new(
        split_transaction("Gym", Category::Services, due, &[("a", dec!(4.50)), ("b", dec!(4.50))]),
        period,
    )
}

#[test]
fn daily_template_three_days_back_catches_up_through_today() {
    let engine = RecurrenceEngine::default();
    let today = day(2024, 5, 10);
    let due = Timestamp(today.millis() - 2 * DAY);

    let plan = engine
        .materialize_due(&household_id(), &two_member_household(), None, &template(due, Period::Daily), TransactionKind::Expense, today)
        .unwrap();

    let stamps: Vec<_> = plan.materialized.iter().map(|txn| txn.timestamp).collect();
    assert_eq!(stamps, vec![day(2024, 5, 8), day(2024, 5, 9), day(2024, 5, 10)]);
    assert_eq!(plan.template.next_due(), day(2024, 5, 11));
    assert_eq!(plan.months[&day(2024, 5, 1)].e_counter, 3);
    assert_eq!(
        plan.months[&day(2024, 5, 1)].member_totals(&member("a")).expense,
        dec!(13.50)
    );

    // Three records, one months merge, one template upsert.
    assert_eq!(plan.batch.len(), 5);
    let template_write = plan.batch.writes().last().unwrap();
    assert!(matches!(template_write, Write::Set { path, merge: false, .. } if path.as_str().contains("RecurringExpenses")));
}

#[test]
fn lapse_of_three_periods_materializes_each_plus_today() {
    let engine = RecurrenceEngine::default();
    let today = day(2024, 5, 10);
    let plan = engine
        .materialize_due(
            &household_id(),
            &two_member_household(),
            None,
            &template(Timestamp(today.millis() - 3 * DAY), Period::Daily),
            TransactionKind::Expense,
            today,
        )
        .unwrap();
    assert_eq!(plan.materialized.len(), 4);
    assert_eq!(plan.template.next_due(), Timestamp(today.millis() + DAY));
}

#[test]
fn future_template_materializes_nothing() {
    let engine = RecurrenceEngine::default();
    let today = day(2024, 5, 10);
    let due = day(2024, 6, 1);
    let plan = engine
        .materialize_due(&household_id(), &two_member_household(), None, &template(due, Period::Monthly), TransactionKind::Income, today)
        .unwrap();
    assert!(plan.materialized.is_empty());
    assert_eq!(plan.template.next_due(), due);
    assert!(plan.months.is_empty());
    assert_eq!(plan.batch.len(), 1);
}

#[test]
fn monthly_backfill_clamps_to_month_end() {
    let engine = RecurrenceEngine::default();
    let today = day(2024, 4, 15);
    let plan = engine
        .materialize_due(&household_id(), &two_member_household(), None, &template(day(2024, 1, 31), Period::Monthly), TransactionKind::Expense, today)
        .unwrap();
    let stamps: Vec<_> = plan.materialized.iter().map(|txn| txn.timestamp).collect();
    assert_eq!(stamps, vec![day(2024, 1, 31), day(2024, 2, 29), day(2024, 3, 29)]);
    assert_eq!(plan.template.next_due(), day(2024, 4, 29));
    for month in [day(2024, 1, 1), day(2024, 2, 1), day(2024, 3, 1)] {
        assert_eq!(plan.months[&month].e_counter, 1);
    }
}

#[test]
fn plan_limit_aborts_whole_backfill() {
    let engine = RecurrenceEngine::default();
    let mut months = Months::new();
    months.entry(day(2024, 5, 1)).or_default().e_counter = 349;
    let household = Household {
        months: months.clone(),
        ..two_member_household()
    };
    let today = day(2024, 5, 10);

    let err = engine
        .materialize_due(&household_id(), &household, None, &template(Timestamp(today.millis() - DAY), Period::Daily), TransactionKind::Expense, today)
        .unwrap_err();
    assert!(matches!(err, LedgerError::PlanLimitExceeded { .. }));
    assert_eq!(household.months, months);
}

#[test]
fn backfill_cap_rejects_ancient_templates() {
    let engine = RecurrenceEngine::new(LedgerMutator::default(), 10);
    let today = day(2024, 5, 10);
    let err = engine
        .materialize_due(&household_id(), &two_member_household(), None, &template(day(2023, 1, 1), Period::Daily), TransactionKind::Expense, today)
        .unwrap_err();
    match err {
        LedgerError::Validation(errors) => assert!(errors.date.is_some()),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn editing_template_keeps_its_id() {
    let engine = RecurrenceEngine::default();
    let today = day(2024, 5, 10);
    let original = template(day(2024, 6, 1), Period::Yearly);
    let mut edited = template(day(2024, 7, 1), Period::Quarterly);
    edited.transaction.title = "Gym membership".into();

    let plan = engine
        .materialize_due(&household_id(), &two_member_household(), Some(&original), &edited, TransactionKind::Expense, today)
        .unwrap();
    assert_eq!(plan.template.transaction.id, original.transaction.id);
    assert_eq!(plan.template.period, Period::Quarterly);
}

proptest! {
    #[test]
    fn twelve_monthly_steps_equal_one_yearly(year in 1990i32..2100, month in 1u32..=12, dom in 1u32..=28) {
        let calendar = Calendar::default();
        let start = calendar
            .at_midnight(NaiveDate::from_ymd_opt(year, month, dom).unwrap())
            .unwrap();
        let mut stepped = start;
        for _ in 0..12 {
            stepped = calendar.advance(stepped, Period::Monthly).unwrap();
        }
        prop_assert_eq!(stepped, calendar.advance(start, Period::Yearly).unwrap());
    }
}
