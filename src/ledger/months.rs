//! Denormalized monthly rollup stored on the household document.
//!
//! `months[month_start][member][category] = {expense, income}` plus one
//! expense and one income counter per month. The free functions here are
//! value transformers: they clone, change, and return. The `_mut`
//! variants work in place on a working copy the caller already owns.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{round_cents, Category, MemberId, Timestamp, TransactionKind};

/// Rollup keyed by local month-start timestamp.
pub type Months = BTreeMap<Timestamp, MonthBucket>;

/// Income and expense accumulated by one member in one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    #[serde(default)]
    pub expense: Decimal,
    #[serde(default)]
    pub income: Decimal,
}

impl CategoryTotals {
    pub fn get(&self, kind: TransactionKind) -> Decimal {
        match kind {
            TransactionKind::Expense => self.expense,
            TransactionKind::Income => self.income,
        }
    }

    fn get_mut(&mut self, kind: TransactionKind) -> &mut Decimal {
        match kind {
            TransactionKind::Expense => &mut self.expense,
            TransactionKind::Income => &mut self.income,
        }
    }

    /// Income minus expense, rounded to cents.
    pub fn net(&self) -> Decimal {
        round_cents(self.income - self.expense)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthBucket {
    #[serde(rename = "eCounter", default)]
    pub e_counter: i64,
    #[serde(rename = "iCounter", default)]
    pub i_counter: i64,
    #[serde(flatten)]
    pub members: BTreeMap<MemberId, BTreeMap<Category, CategoryTotals>>,
}

impl MonthBucket {
    pub fn counter(&self, kind: TransactionKind) -> i64 {
        match kind {
            TransactionKind::Expense => self.e_counter,
            TransactionKind::Income => self.i_counter,
        }
    }

    fn counter_mut(&mut self, kind: TransactionKind) -> &mut i64 {
        match kind {
            TransactionKind::Expense => &mut self.e_counter,
            TransactionKind::Income => &mut self.i_counter,
        }
    }

    pub fn cell(&self, member: &MemberId, category: Category) -> Option<&CategoryTotals> {
        self.members.get(member)?.get(&category)
    }

    /// Totals of one member across every category.
    pub fn member_totals(&self, member: &MemberId) -> CategoryTotals {
        let mut totals = CategoryTotals::default();
        if let Some(categories) = self.members.get(member) {
            for cell in categories.values() {
                totals.expense += cell.expense;
                totals.income += cell.income;
            }
        }
        totals.expense = round_cents(totals.expense);
        totals.income = round_cents(totals.income);
        totals
    }
}

pub fn ensure_bucket(months: &Months, month_start: Timestamp) -> Months {
    let mut next = months.clone();
    ensure_bucket_mut(&mut next, month_start);
    next
}

pub fn apply_delta(
    months: &Months,
    month_start: Timestamp,
    member: &MemberId,
    category: Category,
    field: TransactionKind,
    delta: Decimal,
) -> Months {
    let mut next = months.clone();
    apply_delta_mut(&mut next, month_start, member, category, field, delta);
    next
}

pub fn adjust_counter(
    months: &Months,
    month_start: Timestamp,
    kind: TransactionKind,
    delta: i64,
) -> Months {
    let mut next = months.clone();
    adjust_counter_mut(&mut next, month_start, kind, delta);
    next
}

pub fn ensure_bucket_mut(months: &mut Months, month_start: Timestamp) -> &mut MonthBucket {
    months.entry(month_start).or_default()
}

pub fn apply_delta_mut(
    months: &mut Months,
    month_start: Timestamp,
    member: &MemberId,
    category: Category,
    field: TransactionKind,
    delta: Decimal,
) {
    let cell = ensure_bucket_mut(months, month_start)
        .members
        .entry(member.clone())
        .or_default()
        .entry(category)
        .or_default()
        .get_mut(field);
    *cell = round_cents(*cell + round_cents(delta));
}

pub fn adjust_counter_mut(
    months: &mut Months,
    month_start: Timestamp,
    kind: TransactionKind,
    delta: i64,
) {
    let counter = ensure_bucket_mut(months, month_start).counter_mut(kind);
    *counter += delta;
    if *counter < 0 {
        tracing::warn!(
            month = %month_start,
            %kind,
            counter = *counter,
            "month counter dropped below zero; rollup is out of sync with the transaction log"
        );
    }
}
