//! Services for recurring templates.

use crate::core::services::{commit, decode_record, decode_records, ServiceResult};
use crate::domain::{
    Household, HouseholdId, RecurringTransaction, Timestamp, Transaction, TransactionId,
    TransactionKind,
};
use crate::errors::LedgerError;
use crate::ledger::{Months, RecurrenceEngine, RecurrencePlan};
use crate::storage::{
    Backend, Collection, CollectionPath, DocumentPath, Snapshot, Subscription, Target, WriteBatch,
};

/// Template and occurrences as committed.
#[derive(Debug, Clone)]
pub struct SavedTemplate {
    pub template: RecurringTransaction,
    pub materialized: Vec<Transaction>,
    pub months: Months,
}

pub struct RecurringService;

impl RecurringService {
    /// Creates or edits a template, materializing every occurrence due on or
    /// before `today` in the same batch.
    #[allow(clippy::too_many_arguments)]
    pub fn submit(
        backend: &dyn Backend,
        engine: &RecurrenceEngine,
        household_id: &HouseholdId,
        household: &Household,
        old: Option<&RecurringTransaction>,
        template: &RecurringTransaction,
        kind: TransactionKind,
        today: Timestamp,
    ) -> ServiceResult<SavedTemplate> {
        let RecurrencePlan {
            template,
            materialized,
            months,
            batch,
        } = engine.materialize_due(household_id, household, old, template, kind, today)?;
        commit(backend, batch, "save recurring template")?;
        tracing::info!(
            household = %household_id,
            template = %template.transaction.id,
            materialized = materialized.len(),
            "recurring template saved"
        );
        Ok(SavedTemplate {
            template,
            materialized,
            months,
        })
    }

    /// Deletes the template only. Transactions it already produced stay.
    pub fn delete(
        backend: &dyn Backend,
        household_id: &HouseholdId,
        id: &TransactionId,
        kind: TransactionKind,
    ) -> ServiceResult<()> {
        let mut batch = WriteBatch::new();
        batch.delete(DocumentPath::record(
            household_id,
            Collection::recurring(kind),
            id,
        ));
        commit(backend, batch, "delete recurring template")
    }

    pub fn get(
        backend: &dyn Backend,
        household_id: &HouseholdId,
        kind: TransactionKind,
        id: &TransactionId,
    ) -> ServiceResult<RecurringTransaction> {
        let path = DocumentPath::record(household_id, Collection::recurring(kind), id);
        let value = backend
            .get(&path)?
            .ok_or_else(|| LedgerError::NotFound(path.to_string()))?;
        decode_record(id.as_str(), value)
    }

    /// Templates of `kind`, soonest due first.
    pub fn list(
        backend: &dyn Backend,
        household_id: &HouseholdId,
        kind: TransactionKind,
    ) -> ServiceResult<Vec<RecurringTransaction>> {
        let entries = backend.list(&CollectionPath::of(household_id, Collection::recurring(kind)))?;
        Ok(by_due_date(decode_records(entries)))
    }

    pub fn subscribe<F>(
        backend: &dyn Backend,
        household_id: &HouseholdId,
        kind: TransactionKind,
        mut on_data: F,
    ) -> ServiceResult<Subscription>
    where
        F: FnMut(Vec<RecurringTransaction>) + Send + 'static,
    {
        let target = Target::Collection(CollectionPath::of(
            household_id,
            Collection::recurring(kind),
        ));
        backend.subscribe(
            target,
            Box::new(move |snapshot: &Snapshot| {
                if let Snapshot::Collection(entries) = snapshot {
                    on_data(by_due_date(decode_records(entries.clone())));
                }
            }),
        )
    }
}

fn by_due_date(mut templates: Vec<RecurringTransaction>) -> Vec<RecurringTransaction> {
    templates.sort_by(|a, b| {
        a.next_due()
            .cmp(&b.next_due())
            .then_with(|| a.transaction.id.cmp(&b.transaction.id))
    });
    templates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::services::TransactionService;
    use crate::domain::{Category, MemberId};
    use crate::ledger::Period;
    use crate::storage::MemoryBackend;
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    const DAY: i64 = 86_400_000;
    const TODAY: Timestamp = Timestamp(1_704_499_200_000); // 2024-01-06

    fn rent(due: Timestamp) -> RecurringTransaction {
        let mut members = BTreeMap::new();
        members.insert(MemberId::from("a"), Decimal::new(70_000, 2));
        RecurringTransaction::new(
            Transaction::new("Rent", Decimal::new(70_000, 2), Category::Bills, due, members),
            Period::Monthly,
        )
    }

    #[test]
    fn overdue_template_materializes_and_persists() {
        let backend = MemoryBackend::new();
        let engine = RecurrenceEngine::default();
        let id = HouseholdId::from("h");
        let household = Household::new(MemberId::from("a"), "Ana", "EUR");

        let saved = RecurringService::submit(
            &backend,
            &engine,
            &id,
            &household,
            None,
            &rent(Timestamp(TODAY.0 - DAY)),
            TransactionKind::Expense,
            TODAY,
        )
        .unwrap();
        assert_eq!(saved.materialized.len(), 1);
        assert!(saved.template.next_due() > TODAY);

        let stored = RecurringService::list(&backend, &id, TransactionKind::Expense).unwrap();
        assert_eq!(stored, vec![saved.template.clone()]);
        let records = TransactionService::list_range(
            &backend,
            &id,
            TransactionKind::Expense,
            Timestamp(0),
            TODAY,
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp, Timestamp(TODAY.0 - DAY));
    }

    #[test]
    fn delete_keeps_materialized_transactions() {
        let backend = MemoryBackend::new();
        let engine = RecurrenceEngine::default();
        let id = HouseholdId::from("h");
        let household = Household::new(MemberId::from("a"), "Ana", "EUR");
        let saved = RecurringService::submit(
            &backend,
            &engine,
            &id,
            &household,
            None,
            &rent(TODAY),
            TransactionKind::Expense,
            TODAY,
        )
        .unwrap();

        RecurringService::delete(&backend, &id, &saved.template.transaction.id, TransactionKind::Expense).unwrap();
        assert!(RecurringService::list(&backend, &id, TransactionKind::Expense)
            .unwrap()
            .is_empty());
        assert!(matches!(
            RecurringService::get(&backend, &id, TransactionKind::Expense, &saved.template.transaction.id),
            Err(LedgerError::NotFound(_))
        ));
        assert_eq!(
            TransactionService::list_range(&backend, &id, TransactionKind::Expense, Timestamp(0), TODAY)
                .unwrap()
                .len(),
            1
        );
    }
}
