use serde_json::json;

use crate::domain::{
    Household, HouseholdId, RecurringTransaction, Timestamp, Transaction, TransactionKind,
};
use crate::errors::{Result, ValidationErrors};
use crate::ledger::months::Months;
use crate::ledger::mutator::LedgerMutator;
use crate::storage::{Collection, DocumentPath, WriteBatch};

/// Upper bound on occurrences materialized by one template save.
pub const DEFAULT_MAX_BACKFILL: usize = 1024;

/// Everything a recurring-template save commits in one batch.
#[derive(Debug, Clone)]
pub struct RecurrencePlan {
    /// Template with its next-due timestamp moved past `today`.
    pub template: RecurringTransaction,
    pub materialized: Vec<Transaction>,
    pub months: Months,
    pub batch: WriteBatch,
}

#[derive(Debug, Clone)]
pub struct RecurrenceEngine {
    mutator: LedgerMutator,
    max_backfill: usize,
}

impl Default for RecurrenceEngine {
    fn default() -> Self {
        Self::new(LedgerMutator::default(), DEFAULT_MAX_BACKFILL)
    }
}

impl RecurrenceEngine {
    pub fn new(mutator: LedgerMutator, max_backfill: usize) -> Self {
        Self {
            mutator,
            max_backfill,
        }
    }

    pub fn mutator(&self) -> &LedgerMutator {
        &self.mutator
    }

    /// Creates (`old = None`) or edits a recurring template and materializes
    /// every occurrence due on or before `today`, advancing the template one
    /// period per occurrence.
    ///
    /// Occurrences already materialized by earlier saves are not touched:
    /// templates do not own their concrete transactions.
    pub fn materialize_due(
        &self,
        household_id: &HouseholdId,
        household: &Household,
        old: Option<&RecurringTransaction>,
        template: &RecurringTransaction,
        kind: TransactionKind,
        today: Timestamp,
    ) -> Result<RecurrencePlan> {
        template.validate()?;

        let mut advanced = template.clone();
        if let Some(old) = old {
            advanced.transaction.id = old.transaction.id.clone();
        }

        let calendar = self.mutator.calendar();
        let mut months = household.months.clone();
        let mut materialized = Vec::new();
        while advanced.next_due() <= today {
            if materialized.len() >= self.max_backfill {
                return Err(ValidationErrors::date(format!(
                    "Next due date is more than {} occurrences in the past",
                    self.max_backfill
                ))
                .into());
            }
            let occurrence = advanced.occurrence();
            self.mutator
                .add_contribution(&mut months, &occurrence, kind, household.is_paid)?;
            materialized.push(occurrence);
            advanced.transaction.timestamp = calendar.advance(advanced.next_due(), advanced.period)?;
        }

        let mut batch = WriteBatch::new();
        let records = Collection::transactions(kind);
        for occurrence in &materialized {
            batch.set(
                DocumentPath::record(household_id, records, &occurrence.id),
                serde_json::to_value(occurrence)?,
            );
        }
        if !materialized.is_empty() {
            let rollup = serde_json::to_value(&months)?;
            batch.merge(
                DocumentPath::household(household_id),
                json!({ "months": rollup }),
            );
        }
        // Replace rather than merge so members dropped from the split disappear.
        batch.set(
            DocumentPath::record(
                household_id,
                Collection::recurring(kind),
                &advanced.transaction.id,
            ),
            serde_json::to_value(&advanced)?,
        );

        tracing::debug!(
            household = %household_id,
            template = %advanced.transaction.id,
            %kind,
            materialized = materialized.len(),
            next_due = %advanced.next_due(),
            "planned recurring template save"
        );
        Ok(RecurrencePlan {
            template: advanced,
            materialized,
            months,
            batch,
        })
    }
}
