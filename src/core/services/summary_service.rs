//! Read-side tables built from the household rollup.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::core::services::ServiceResult;
use crate::domain::{round_cents, Category, Household, MemberId, Timestamp};
use crate::ledger::{Calendar, CategoryTotals};

/// One month of a member's yearly overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthRow {
    pub month: Timestamp,
    pub income: Decimal,
    pub expense: Decimal,
    pub total: Decimal,
}

/// One category of a member's monthly breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    pub category: Category,
    pub income: Decimal,
    pub expense: Decimal,
    pub total: Decimal,
}

/// Rows plus their column sums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryTable<R> {
    pub rows: Vec<R>,
    pub income: Decimal,
    pub expense: Decimal,
    pub total: Decimal,
}

impl<R> SummaryTable<R> {
    fn new(rows: Vec<R>, cells: impl Iterator<Item = CategoryTotals>) -> Self {
        let (income, expense) = cells.fold((Decimal::ZERO, Decimal::ZERO), |(i, e), cell| {
            (i + cell.income, e + cell.expense)
        });
        let income = round_cents(income);
        let expense = round_cents(expense);
        Self {
            rows,
            income,
            expense,
            total: round_cents(income - expense),
        }
    }
}

pub struct SummaryService;

impl SummaryService {
    /// Month-by-month totals of `member` for the local calendar `year`, in
    /// month order. Months absent from the rollup are omitted.
    pub fn member_year(
        calendar: &Calendar,
        household: &Household,
        member: &MemberId,
        year: i32,
    ) -> ServiceResult<SummaryTable<MonthRow>> {
        let mut rows = Vec::new();
        let mut cells = Vec::new();
        for (month, bucket) in &household.months {
            if calendar.year_of(*month)? != year {
                continue;
            }
            let totals = bucket.member_totals(member);
            rows.push(MonthRow {
                month: *month,
                income: totals.income,
                expense: totals.expense,
                total: totals.net(),
            });
            cells.push(totals);
        }
        Ok(SummaryTable::new(rows, cells.into_iter()))
    }

    /// Category breakdown of `member` for the bucket starting at `month`.
    /// Categories with neither income nor expense are left out.
    pub fn member_month_categories(
        household: &Household,
        member: &MemberId,
        month: Timestamp,
    ) -> SummaryTable<CategoryRow> {
        let cells: Vec<(Category, CategoryTotals)> = household
            .months
            .get(&month)
            .and_then(|bucket| bucket.members.get(member))
            .map(|categories| {
                categories
                    .iter()
                    .filter(|(_, cell)| !cell.income.is_zero() || !cell.expense.is_zero())
                    .map(|(category, cell)| (*category, *cell))
                    .collect()
            })
            .unwrap_or_default();
        let rows: Vec<CategoryRow> = cells
            .iter()
            .map(|(category, cell)| CategoryRow {
                category: *category,
                income: cell.income,
                expense: cell.expense,
                total: cell.net(),
            })
            .collect();
        SummaryTable::new(rows, cells.into_iter().map(|(_, cell)| cell))
    }

    /// Distinct local years that have a bucket, ascending.
    pub fn years(calendar: &Calendar, household: &Household) -> ServiceResult<Vec<i32>> {
        let mut years = BTreeSet::new();
        for month in household.months.keys() {
            years.insert(calendar.year_of(*month)?);
        }
        Ok(years.into_iter().collect())
    }

    /// Active members as `(id, display name)`, ordered by name.
    pub fn active_members(household: &Household) -> Vec<(MemberId, String)> {
        let mut members: Vec<(MemberId, String)> = household
            .active_members()
            .map(|(id, member)| (id.clone(), member.name.clone()))
            .collect();
        members.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        members
    }
}
