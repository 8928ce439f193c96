//! Keeps the household rollup in step with the transaction log.
//!
//! Every edit is expressed as "remove the old contribution, add the new
//! one" over a private working copy of the caller's `months`, then turned
//! into a single write batch. Nothing here talks to the backend.

use serde_json::json;

use crate::domain::{Household, HouseholdId, Transaction, TransactionKind};
use crate::errors::{LedgerError, Result, ValidationErrors};
use crate::ledger::months::{adjust_counter_mut, apply_delta_mut, Months};
use crate::ledger::period::Calendar;
use crate::storage::{Collection, DocumentPath, WriteBatch};

/// Monthly transaction cap per kind for households without a paid plan.
pub const DEFAULT_PLAN_LIMIT: i64 = 350;

/// Outcome of [`LedgerMutator::plan_write`].
#[derive(Debug, Clone)]
pub struct WritePlan {
    /// Record as it will be stored; `None` for deletions.
    pub transaction: Option<Transaction>,
    pub months: Months,
    pub batch: WriteBatch,
}

#[derive(Debug, Clone)]
pub struct LedgerMutator {
    calendar: Calendar,
    plan_limit: i64,
}

impl Default for LedgerMutator {
    fn default() -> Self {
        Self::new(Calendar::default(), DEFAULT_PLAN_LIMIT)
    }
}

impl LedgerMutator {
    pub fn new(calendar: Calendar, plan_limit: i64) -> Self {
        Self {
            calendar,
            plan_limit,
        }
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn plan_limit(&self) -> i64 {
        self.plan_limit
    }

    /// Computes the rollup and write batch for adding (`old = None`),
    /// editing (both given) or deleting (`new = None`) a transaction.
    ///
    /// An edit keeps the old record's id. The household snapshot is not
    /// modified; the updated rollup is returned in the plan.
    pub fn plan_write(
        &self,
        household_id: &HouseholdId,
        household: &Household,
        old: Option<&Transaction>,
        new: Option<&Transaction>,
        kind: TransactionKind,
    ) -> Result<WritePlan> {
        if old.is_none() && new.is_none() {
            return Err(ValidationErrors::general("nothing to write").into());
        }
        if let Some(new) = new {
            new.validate()?;
        }

        let mut months = household.months.clone();
        if let Some(old) = old {
            self.remove_contribution(&mut months, old, kind)?;
        }

        let collection = Collection::transactions(kind);
        let mut batch = WriteBatch::new();
        let stored = match new {
            Some(new) => {
                let mut record = new.clone();
                if let Some(old) = old {
                    record.id = old.id.clone();
                }
                self.add_contribution(&mut months, &record, kind, household.is_paid)?;
                batch.set(
                    DocumentPath::record(household_id, collection, &record.id),
                    serde_json::to_value(&record)?,
                );
                Some(record)
            }
            None => {
                if let Some(old) = old {
                    batch.delete(DocumentPath::record(household_id, collection, &old.id));
                }
                None
            }
        };
        let rollup = serde_json::to_value(&months)?;
        batch.merge(
            DocumentPath::household(household_id),
            json!({ "months": rollup }),
        );

        tracing::debug!(
            household = %household_id,
            %kind,
            edit = old.is_some() && new.is_some(),
            delete = new.is_none(),
            writes = batch.len(),
            "planned ledger write"
        );
        Ok(WritePlan {
            transaction: stored,
            months,
            batch,
        })
    }

    /// Subtracts every member share of `transaction` from its month and
    /// decrements that month's counter.
    pub fn remove_contribution(
        &self,
        months: &mut Months,
        transaction: &Transaction,
        kind: TransactionKind,
    ) -> Result<()> {
        let month = self.calendar.start_of_month(transaction.timestamp)?;
        for (member, share) in &transaction.members_amount {
            apply_delta_mut(months, month, member, transaction.category, kind, -*share);
        }
        adjust_counter_mut(months, month, kind, -1);
        Ok(())
    }

    /// Adds every member share of `transaction` to its month and increments
    /// the counter, refusing once an unpaid household hits the plan limit.
    pub fn add_contribution(
        &self,
        months: &mut Months,
        transaction: &Transaction,
        kind: TransactionKind,
        is_paid: bool,
    ) -> Result<()> {
        let month = self.calendar.start_of_month(transaction.timestamp)?;
        let used = months
            .get(&month)
            .map(|bucket| bucket.counter(kind))
            .unwrap_or(0);
        if !is_paid && used >= self.plan_limit {
            tracing::info!(month = %month, %kind, used, limit = self.plan_limit, "plan limit reached");
            return Err(LedgerError::PlanLimitExceeded {
                month,
                kind,
                limit: self.plan_limit,
            });
        }
        for (member, share) in &transaction.members_amount {
            apply_delta_mut(months, month, member, transaction.category, kind, *share);
        }
        adjust_counter_mut(months, month, kind, 1);
        Ok(())
    }
}
