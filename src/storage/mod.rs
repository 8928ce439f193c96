//! Document-store boundary: paths, atomic write batches, and realtime
//! subscriptions against an external backend.

pub mod json_backend;
pub mod memory;

use std::fmt;

use serde_json::Value;

use crate::domain::{HouseholdId, MemberId, TransactionId, TransactionKind};
use crate::errors::Result;

pub use json_backend::JsonFileBackend;
pub use memory::MemoryBackend;

const HOUSEHOLD_COLLECTION: &str = "Household";
const USERS_COLLECTION: &str = "Users";

/// Per-household sub-collections holding transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Expenses,
    Incomes,
    RecurringExpenses,
    RecurringIncomes,
}

impl Collection {
    pub fn transactions(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Expense => Collection::Expenses,
            TransactionKind::Income => Collection::Incomes,
        }
    }

    pub fn recurring(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Expense => Collection::RecurringExpenses,
            TransactionKind::Income => Collection::RecurringIncomes,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Collection::Expenses => "Expenses",
            Collection::Incomes => "Incomes",
            Collection::RecurringExpenses => "RecurringExpenses",
            Collection::RecurringIncomes => "RecurringIncomes",
        }
    }
}

/// Slash-separated path of a single document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentPath(String);

impl DocumentPath {
    pub fn household(id: &HouseholdId) -> Self {
        Self(format!("{}/{}", HOUSEHOLD_COLLECTION, id))
    }

    pub fn user(id: &MemberId) -> Self {
        Self(format!("{}/{}", USERS_COLLECTION, id))
    }

    pub fn record(household: &HouseholdId, collection: Collection, id: &TransactionId) -> Self {
        Self(format!(
            "{}/{}",
            CollectionPath::of(household, collection).as_str(),
            id
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, the document key.
    pub fn key(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Path of the collection containing this document.
    pub fn parent(&self) -> CollectionPath {
        match self.0.rsplit_once('/') {
            Some((parent, _)) => CollectionPath(parent.to_string()),
            None => CollectionPath(String::new()),
        }
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn of(household: &HouseholdId, collection: Collection) -> Self {
        Self(format!(
            "{}/{}/{}",
            HOUSEHOLD_COLLECTION,
            household,
            collection.name()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One document mutation inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Replaces the document, or deep-merges object fields when `merge` is set.
    Set {
        path: DocumentPath,
        data: Value,
        merge: bool,
    },
    Delete { path: DocumentPath },
}

impl Write {
    pub fn path(&self) -> &DocumentPath {
        match self {
            Write::Set { path, .. } | Write::Delete { path } => path,
        }
    }
}

/// Ordered set of writes that must be committed all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: DocumentPath, data: Value) -> &mut Self {
        self.writes.push(Write::Set {
            path,
            data,
            merge: false,
        });
        self
    }

    pub fn merge(&mut self, path: DocumentPath, data: Value) -> &mut Self {
        self.writes.push(Write::Set {
            path,
            data,
            merge: true,
        });
        self
    }

    pub fn delete(&mut self, path: DocumentPath) -> &mut Self {
        self.writes.push(Write::Delete { path });
        self
    }

    pub fn extend(&mut self, other: WriteBatch) -> &mut Self {
        self.writes.extend(other.writes);
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Write> {
        self.writes.iter()
    }
}

impl IntoIterator for WriteBatch {
    type Item = Write;
    type IntoIter = std::vec::IntoIter<Write>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}

/// What a subscription listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Document(DocumentPath),
    Collection(CollectionPath),
}

impl Target {
    pub fn is_touched_by(&self, path: &DocumentPath) -> bool {
        match self {
            Target::Document(doc) => doc == path,
            Target::Collection(collection) => &path.parent() == collection,
        }
    }
}

/// State pushed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Document(Option<Value>),
    /// `(document key, data)` pairs ordered by key.
    Collection(Vec<(String, Value)>),
}

pub type Handler = Box<dyn FnMut(&Snapshot) + Send>;

/// Live subscription. Dropping it unsubscribes.
#[must_use = "dropping a Subscription cancels it immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Stops delivery now instead of at drop.
    pub fn cancel(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Abstraction over the hosted document store.
pub trait Backend: Send + Sync {
    /// Applies every write or none of them.
    fn commit_batch(&self, batch: WriteBatch) -> Result<()>;
    fn get(&self, path: &DocumentPath) -> Result<Option<Value>>;
    fn list(&self, collection: &CollectionPath) -> Result<Vec<(String, Value)>>;
    /// Registers `handler`; it fires once with the current state and again
    /// after every commit touching `target`.
    fn subscribe(&self, target: Target, handler: Handler) -> Result<Subscription>;
}

/// Deep-merges `patch` into `target`: objects merge key by key, anything
/// else replaces.
pub fn merge_value(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
