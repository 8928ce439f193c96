//! Parsing of raw, user-entered transaction input.
//!
//! Amounts arrive as text and may use either `,` or `.` as the decimal
//! separator. Every field is checked before anything is returned so callers
//! can show all problems at once.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::domain::category::Category;
use crate::domain::common::{round_cents, MemberId, Timestamp, TransactionId};
use crate::domain::transaction::{RecurringTransaction, Transaction};
use crate::errors::{LedgerError, Result, ValidationErrors};
use crate::ledger::period::Period;

#[derive(Debug, Clone, Default)]
pub struct TransactionForm {
    pub title: String,
    pub amount: String,
    pub members_amount: BTreeMap<MemberId, String>,
    pub date: Option<Timestamp>,
    pub category: Category,
    pub period: Option<u8>,
}

impl TransactionForm {
    /// Parses a one-off transaction. The returned record carries a fresh id.
    pub fn parse_transaction(&self) -> Result<Transaction> {
        let (transaction, errors) = self.parse_fields();
        errors.into_result()?;
        transaction.ok_or_else(|| LedgerError::Validation(ValidationErrors::general("incomplete form")))
    }

    /// Parses a recurring template; the period code is mandatory.
    pub fn parse_recurring(&self) -> Result<RecurringTransaction> {
        let (transaction, mut errors) = self.parse_fields();
        let period = match self.period {
            Some(code) => match Period::try_from(code) {
                Ok(period) => Some(period),
                Err(err) => {
                    errors.period = Some(err.to_string());
                    None
                }
            },
            None => {
                errors.period = Some("Must select a period".into());
                None
            }
        };
        errors.into_result()?;
        match (transaction, period) {
            (Some(transaction), Some(period)) => Ok(RecurringTransaction::new(transaction, period)),
            _ => Err(LedgerError::Validation(ValidationErrors::general(
                "incomplete form",
            ))),
        }
    }

    fn parse_fields(&self) -> (Option<Transaction>, ValidationErrors) {
        let mut errors = ValidationErrors::default();
        if self.title.trim().is_empty() {
            errors.title = Some("Title cannot be empty".into());
        }

        let mut members = BTreeMap::new();
        for (member, raw) in &self.members_amount {
            match parse_amount(raw) {
                Some(value) if value.is_sign_negative() && !value.is_zero() => {
                    errors
                        .members_amount
                        .insert(member.clone(), "Must not be negative".into());
                }
                Some(value) if value.normalize().scale() > 2 => {
                    errors
                        .members_amount
                        .insert(member.clone(), "Must have at most 2 decimals".into());
                }
                Some(value) => {
                    members.insert(member.clone(), value);
                }
                None => {
                    errors
                        .members_amount
                        .insert(member.clone(), "Must be a number".into());
                }
            }
        }

        let amount = parse_amount(&self.amount);
        match amount {
            None => errors.amount = Some("Must be a number".into()),
            Some(value) if value <= Decimal::ZERO => {
                errors.amount = Some("Must be greater than 0".into())
            }
            Some(value) if errors.members_amount.is_empty() => {
                let sum = round_cents(members.values().copied().sum());
                if sum != round_cents(value) {
                    errors.amount = Some("Must be equal to the total of all members".into());
                }
            }
            Some(_) => {}
        }

        let date = self.date.filter(|timestamp| timestamp.to_utc().is_some());
        if date.is_none() {
            errors.date = Some("Must be a valid date".into());
        }

        let transaction = match (amount, date) {
            (Some(amount), Some(timestamp)) if errors.is_empty() => Some(Transaction {
                id: TransactionId::generate(),
                title: self.title.trim().to_string(),
                amount: round_cents(amount),
                category: self.category,
                timestamp,
                members_amount: members,
            }),
            _ => None,
        };
        (transaction, errors)
    }
}

/// Parses a decimal typed with either `,` or `.` as separator.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    Decimal::from_str(&normalized).ok()
}

/// Keeps the member split equal to `amount` by moving the difference onto
/// `actor`. If that would make the actor's share negative, the actor takes
/// the whole amount and everybody else drops to zero.
pub fn rebalance_split(
    members: &BTreeMap<MemberId, Decimal>,
    amount: Decimal,
    actor: &MemberId,
) -> BTreeMap<MemberId, Decimal> {
    let sum: Decimal = members.values().copied().sum();
    if sum == amount {
        return members.clone();
    }
    let difference = amount - sum;
    let current = members.get(actor).copied().unwrap_or(Decimal::ZERO);
    let adjusted = round_cents(current + difference);
    let mut result = members.clone();
    if adjusted >= Decimal::ZERO {
        result.insert(actor.clone(), adjusted);
    } else {
        for value in result.values_mut() {
            *value = Decimal::ZERO;
        }
        result.insert(actor.clone(), round_cents(amount));
    }
    result
}
