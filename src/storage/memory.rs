//! In-process document store with atomic batches and push subscriptions.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use serde_json::Value;

use super::{
    merge_value, Backend, CollectionPath, DocumentPath, Handler, Snapshot, Subscription, Target,
    Write, WriteBatch,
};
use crate::errors::{LedgerError, Result};

/// Documents keyed by their full path.
pub type Documents = BTreeMap<String, Value>;

type SharedHandler = Arc<HandlerSlot>;

/// A handler plus the latest snapshot still waiting to reach it.
///
/// Only one delivery runs a handler at a time. A commit that finds the
/// handler busy, including one made by the handler itself, parks its
/// snapshot here and the running delivery picks it up before returning.
struct HandlerSlot {
    handler: Mutex<Handler>,
    pending: Mutex<Option<Snapshot>>,
}

impl HandlerSlot {
    fn new(handler: Handler) -> Self {
        Self {
            handler: Mutex::new(handler),
            pending: Mutex::new(None),
        }
    }

    fn park(&self, snapshot: Snapshot) {
        match self.pending.lock() {
            Ok(mut pending) => *pending = Some(snapshot),
            Err(poisoned) => *poisoned.into_inner() = Some(snapshot),
        }
    }

    fn take(&self) -> Option<Snapshot> {
        match self.pending.lock() {
            Ok(mut pending) => pending.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    fn has_pending(&self) -> bool {
        match self.pending.lock() {
            Ok(pending) => pending.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        }
    }

    fn deliver(&self, snapshot: Snapshot) {
        self.park(snapshot);
        loop {
            let mut handler = match self.handler.try_lock() {
                Ok(handler) => handler,
                Err(TryLockError::WouldBlock) => return,
                Err(TryLockError::Poisoned(_)) => {
                    tracing::warn!("skipping subscriber with poisoned handler");
                    return;
                }
            };
            while let Some(snapshot) = self.take() {
                (*handler)(&snapshot);
            }
            drop(handler);
            // A commit racing the unlock may have parked a snapshot.
            if !self.has_pending() {
                return;
            }
        }
    }
}

struct Subscriber {
    target: Target,
    handler: SharedHandler,
}

#[derive(Default)]
struct State {
    documents: Documents,
    subscribers: BTreeMap<u64, Subscriber>,
    next_subscriber: u64,
}

impl State {
    fn snapshot(&self, target: &Target) -> Snapshot {
        match target {
            Target::Document(path) => Snapshot::Document(self.documents.get(path.as_str()).cloned()),
            Target::Collection(collection) => Snapshot::Collection(collect(&self.documents, collection)),
        }
    }
}

/// Cheaply cloneable handle; clones share the same store.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
    offline: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Documents) -> Self {
        let backend = Self::default();
        if let Ok(mut state) = backend.state.lock() {
            state.documents = documents;
        }
        backend
    }

    /// Makes every subsequent call fail with `BackendUnavailable` until reset.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn documents(&self) -> Result<Documents> {
        Ok(self.lock()?.documents.clone())
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().map(|state| state.subscribers.len()).unwrap_or(0)
    }

    /// Commits `batch`, running `persist` on the would-be state before it
    /// becomes visible. A `persist` failure leaves the store untouched.
    pub(crate) fn commit_with<F>(&self, batch: WriteBatch, persist: F) -> Result<()>
    where
        F: FnOnce(&Documents) -> Result<()>,
    {
        self.ensure_online()?;
        let notifications = {
            let mut state = self.lock()?;
            let mut staged = state.documents.clone();
            let mut touched = Vec::with_capacity(batch.len());
            for write in batch {
                touched.push(write.path().clone());
                apply_write(&mut staged, write);
            }
            persist(&staged)?;
            state.documents = staged;
            state
                .subscribers
                .values()
                .filter(|sub| touched.iter().any(|path| sub.target.is_touched_by(path)))
                .map(|sub| (Arc::clone(&sub.handler), state.snapshot(&sub.target)))
                .collect::<Vec<_>>()
        };
        deliver(notifications);
        Ok(())
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LedgerError::BackendUnavailable("backend is offline".into()));
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| LedgerError::BackendUnavailable("document store lock poisoned".into()))
    }
}

impl Backend for MemoryBackend {
    fn commit_batch(&self, batch: WriteBatch) -> Result<()> {
        self.commit_with(batch, |_| Ok(()))
    }

    fn get(&self, path: &DocumentPath) -> Result<Option<Value>> {
        self.ensure_online()?;
        Ok(self.lock()?.documents.get(path.as_str()).cloned())
    }

    fn list(&self, collection: &CollectionPath) -> Result<Vec<(String, Value)>> {
        self.ensure_online()?;
        Ok(collect(&self.lock()?.documents, collection))
    }

    fn subscribe(&self, target: Target, handler: Handler) -> Result<Subscription> {
        self.ensure_online()?;
        let handler: SharedHandler = Arc::new(HandlerSlot::new(handler));
        let (id, initial) = {
            let mut state = self.lock()?;
            let id = state.next_subscriber;
            state.next_subscriber += 1;
            let initial = state.snapshot(&target);
            state.subscribers.insert(
                id,
                Subscriber {
                    target,
                    handler: Arc::clone(&handler),
                },
            );
            (id, initial)
        };
        deliver(vec![(handler, initial)]);

        let state = Arc::downgrade(&self.state);
        Ok(Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                if let Ok(mut state) = state.lock() {
                    state.subscribers.remove(&id);
                }
            }
        }))
    }
}

fn apply_write(documents: &mut Documents, write: Write) {
    match write {
        Write::Set {
            path,
            data,
            merge: true,
        } => match documents.get_mut(path.as_str()) {
            Some(existing) => merge_value(existing, data),
            None => {
                documents.insert(path.as_str().to_string(), data);
            }
        },
        Write::Set { path, data, .. } => {
            documents.insert(path.as_str().to_string(), data);
        }
        Write::Delete { path } => {
            documents.remove(path.as_str());
        }
    }
}

fn collect(documents: &Documents, collection: &CollectionPath) -> Vec<(String, Value)> {
    let prefix = format!("{}/", collection.as_str());
    documents
        .range(prefix.clone()..)
        .take_while(|(path, _)| path.starts_with(&prefix))
        .filter(|(path, _)| !path[prefix.len()..].contains('/'))
        .map(|(path, value)| (path[prefix.len()..].to_string(), value.clone()))
        .collect()
}

// Handlers run outside the store lock so they may call back into the backend,
// including writes to the target they watch.
fn deliver(notifications: Vec<(SharedHandler, Snapshot)>) {
    for (handler, snapshot) in notifications {
        handler.deliver(snapshot);
    }
}
