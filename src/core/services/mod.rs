//! Stateless services that turn household actions into backend reads and
//! atomic write batches.

pub mod household_service;
pub mod recurring_service;
pub mod summary_service;
pub mod transaction_service;

pub use household_service::HouseholdService;
pub use recurring_service::{RecurringService, SavedTemplate};
pub use summary_service::{CategoryRow, MonthRow, SummaryService, SummaryTable};
pub use transaction_service::{SavedTransaction, TransactionService};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::LedgerError;
use crate::storage::{Backend, WriteBatch};

pub type ServiceResult<T> = Result<T, LedgerError>;

/// Commits `batch` and logs the outcome under `action`. Backend errors are
/// returned untouched.
pub(crate) fn commit(backend: &dyn Backend, batch: WriteBatch, action: &str) -> ServiceResult<()> {
    let writes = batch.len();
    match backend.commit_batch(batch) {
        Ok(()) => {
            tracing::info!(action, writes, "batch committed");
            Ok(())
        }
        Err(err) => {
            tracing::warn!(action, writes, error = %err, "batch rejected");
            Err(err)
        }
    }
}

/// Decodes a stored record, taking its id from the document key when the
/// body does not carry one.
pub(crate) fn decode_record<T: DeserializeOwned>(key: &str, mut value: Value) -> ServiceResult<T> {
    if let Value::Object(fields) = &mut value {
        fields
            .entry("id")
            .or_insert_with(|| Value::String(key.to_string()));
    }
    Ok(serde_json::from_value(value)?)
}

/// Decodes every record of a collection listing, skipping malformed ones.
pub(crate) fn decode_records<T: DeserializeOwned>(entries: Vec<(String, Value)>) -> Vec<T> {
    entries
        .into_iter()
        .filter_map(|(key, value)| match decode_record(&key, value) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(record = %key, error = %err, "skipping malformed record");
                None
            }
        })
        .collect()
}
