use std::path::{Path, PathBuf};

use serde_json::Value;

use super::memory::{Documents, MemoryBackend};
use super::{Backend, CollectionPath, DocumentPath, Handler, Subscription, Target, WriteBatch};
use crate::errors::Result;
use crate::utils::persistence::{read_json, write_json_atomic};

/// Document store persisted as one JSON file. Each commit rewrites the file
/// through a temporary sibling and a rename, so a crash never leaves a
/// half-applied batch on disk.
#[derive(Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
    memory: MemoryBackend,
}

impl JsonFileBackend {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let documents: Documents = read_json(&path)?.unwrap_or_default();
        tracing::debug!(path = %path.display(), documents = documents.len(), "opened document store");
        Ok(Self {
            path,
            memory: MemoryBackend::with_documents(documents),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for JsonFileBackend {
    fn commit_batch(&self, batch: WriteBatch) -> Result<()> {
        self.memory
            .commit_with(batch, |documents| write_json_atomic(&self.path, documents))
    }

    fn get(&self, path: &DocumentPath) -> Result<Option<Value>> {
        self.memory.get(path)
    }

    fn list(&self, collection: &CollectionPath) -> Result<Vec<(String, Value)>> {
        self.memory.list(collection)
    }

    fn subscribe(&self, target: Target, handler: Handler) -> Result<Subscription> {
        self.memory.subscribe(target, handler)
    }
}
