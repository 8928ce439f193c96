use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::category::Category;
use crate::domain::common::{round_cents, split_tolerance, MemberId, Timestamp, TransactionId};
use crate::errors::ValidationErrors;
use crate::ledger::period::Period;

/// Whether a transaction is filed as an expense or an income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Expense,
    Income,
}

impl TransactionKind {
    pub fn from_is_expense(is_expense: bool) -> Self {
        if is_expense {
            TransactionKind::Expense
        } else {
            TransactionKind::Income
        }
    }

    pub fn is_expense(self) -> bool {
        matches!(self, TransactionKind::Expense)
    }

    /// Title a fresh form starts with.
    pub fn default_title(self, recurring: bool) -> &'static str {
        match (self, recurring) {
            (TransactionKind::Expense, false) => "Expense",
            (TransactionKind::Income, false) => "Income",
            (TransactionKind::Expense, true) => "Recurring Expense",
            (TransactionKind::Income, true) => "Recurring Income",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Expense => f.write_str("expense"),
            TransactionKind::Income => f.write_str("income"),
        }
    }
}

/// A single recorded income or expense, split between household members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub title: String,
    pub amount: Decimal,
    pub category: Category,
    pub timestamp: Timestamp,
    pub members_amount: BTreeMap<MemberId, Decimal>,
}

impl Transaction {
    pub fn new(
        title: impl Into<String>,
        amount: Decimal,
        category: Category,
        timestamp: Timestamp,
        members_amount: BTreeMap<MemberId, Decimal>,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            title: title.into(),
            amount,
            category,
            timestamp,
            members_amount,
        }
    }

    pub fn with_id(mut self, id: TransactionId) -> Self {
        self.id = id;
        self
    }

    /// Sum of the member split, rounded to cents.
    pub fn split_total(&self) -> Decimal {
        round_cents(self.members_amount.values().copied().sum())
    }

    /// Checks the record invariants: non-empty title, positive cent amount,
    /// non-negative split summing to the amount, representable date.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.title.trim().is_empty() {
            errors.title = Some("Title cannot be empty".into());
        }
        for (member, value) in &self.members_amount {
            if value.is_sign_negative() && !value.is_zero() {
                errors
                    .members_amount
                    .insert(member.clone(), "Must not be negative".into());
            } else if value.normalize().scale() > 2 {
                errors
                    .members_amount
                    .insert(member.clone(), "Must have at most 2 decimals".into());
            }
        }
        if self.amount <= Decimal::ZERO {
            errors.amount = Some("Must be greater than 0".into());
        } else if self.amount.normalize().scale() > 2 {
            errors.amount = Some("Must have at most 2 decimals".into());
        } else if errors.members_amount.is_empty()
            && (self.split_total() - self.amount).abs() >= split_tolerance()
        {
            errors.amount = Some("Must be equal to the total of all members".into());
        }
        if self.timestamp.to_utc().is_none() {
            errors.date = Some("Must be a valid date".into());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Template that materializes a [`Transaction`] every `period`, starting at
/// its `timestamp`, which always holds the next due occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub period: Period,
}

impl RecurringTransaction {
    pub fn new(transaction: Transaction, period: Period) -> Self {
        Self {
            transaction,
            period,
        }
    }

    pub fn next_due(&self) -> Timestamp {
        self.transaction.timestamp
    }

    /// Concrete transaction for the currently due occurrence.
    pub fn occurrence(&self) -> Transaction {
        self.transaction.clone().with_id(TransactionId::generate())
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.transaction.validate()
    }
}
