//! Business logic for one-off income and expense records.

use crate::core::services::{commit, decode_record, decode_records, ServiceResult};
use crate::domain::{Household, HouseholdId, Timestamp, Transaction, TransactionId, TransactionKind};
use crate::errors::LedgerError;
use crate::ledger::{LedgerMutator, Months, WritePlan};
use crate::storage::{
    Backend, Collection, CollectionPath, DocumentPath, Snapshot, Subscription, Target,
};

/// Record and rollup as committed.
#[derive(Debug, Clone)]
pub struct SavedTransaction {
    pub transaction: Transaction,
    pub months: Months,
}

pub struct TransactionService;

impl TransactionService {
    /// Adds (`old = None`) or edits a transaction in one atomic batch.
    pub fn submit(
        backend: &dyn Backend,
        mutator: &LedgerMutator,
        household_id: &HouseholdId,
        household: &Household,
        old: Option<&Transaction>,
        new: &Transaction,
        kind: TransactionKind,
    ) -> ServiceResult<SavedTransaction> {
        let WritePlan {
            transaction,
            months,
            batch,
        } = mutator.plan_write(household_id, household, old, Some(new), kind)?;
        let transaction = transaction.ok_or_else(|| {
            LedgerError::NotFound(format!("planned record for {}", new.id))
        })?;
        let action = if old.is_some() {
            "edit transaction"
        } else {
            "add transaction"
        };
        commit(backend, batch, action)?;
        Ok(SavedTransaction {
            transaction,
            months,
        })
    }

    /// Removes `transaction` and reverses its contribution to the rollup.
    pub fn delete(
        backend: &dyn Backend,
        mutator: &LedgerMutator,
        household_id: &HouseholdId,
        household: &Household,
        transaction: &Transaction,
        kind: TransactionKind,
    ) -> ServiceResult<Months> {
        let plan = mutator.plan_write(household_id, household, Some(transaction), None, kind)?;
        commit(backend, plan.batch, "delete transaction")?;
        Ok(plan.months)
    }

    pub fn get(
        backend: &dyn Backend,
        household_id: &HouseholdId,
        kind: TransactionKind,
        id: &TransactionId,
    ) -> ServiceResult<Transaction> {
        let path = DocumentPath::record(household_id, Collection::transactions(kind), id);
        let value = backend
            .get(&path)?
            .ok_or_else(|| LedgerError::NotFound(path.to_string()))?;
        decode_record(id.as_str(), value)
    }

    /// Records of `kind` with `start <= timestamp <= end`, oldest first.
    pub fn list_range(
        backend: &dyn Backend,
        household_id: &HouseholdId,
        kind: TransactionKind,
        start: Timestamp,
        end: Timestamp,
    ) -> ServiceResult<Vec<Transaction>> {
        let entries = backend.list(&CollectionPath::of(
            household_id,
            Collection::transactions(kind),
        ))?;
        Ok(in_range(decode_records(entries), start, end))
    }

    /// Pushes the records of `kind` inside `[start, end]` now and after every
    /// change to the collection.
    pub fn subscribe_range<F>(
        backend: &dyn Backend,
        household_id: &HouseholdId,
        kind: TransactionKind,
        start: Timestamp,
        end: Timestamp,
        mut on_data: F,
    ) -> ServiceResult<Subscription>
    where
        F: FnMut(Vec<Transaction>) + Send + 'static,
    {
        let target = Target::Collection(CollectionPath::of(
            household_id,
            Collection::transactions(kind),
        ));
        backend.subscribe(
            target,
            Box::new(move |snapshot: &Snapshot| {
                if let Snapshot::Collection(entries) = snapshot {
                    on_data(in_range(decode_records(entries.clone()), start, end));
                }
            }),
        )
    }
}

fn in_range(records: Vec<Transaction>, start: Timestamp, end: Timestamp) -> Vec<Transaction> {
    let mut records: Vec<Transaction> = records
        .into_iter()
        .filter(|txn| txn.timestamp >= start && txn.timestamp <= end)
        .collect();
    records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
    records
}
