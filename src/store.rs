//! Embedded JSON document store.
//!
//! Collections of documents keyed by id, held behind an async read-write
//! lock. Queries scan the collection (no indexing), which is fine at this
//! scale. When opened with a backing file, every mutation flushes the whole
//! store to disk and `open` reloads it on startup.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::query::{Filter, Query};

type Collection = HashMap<String, Value>;
type Collections = HashMap<String, Collection>;

pub struct Store {
    collections: RwLock<Collections>,
    path: Option<PathBuf>,
}

impl Store {
    /// A store with no backing file. Used in tests and when no database
    /// path is configured.
    pub fn in_memory() -> Self {
        Store {
            collections: RwLock::new(Collections::new()),
            path: None,
        }
    }

    /// Opens a file-backed store, loading the existing contents if the
    /// file is present.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let collections = if path.exists() {
            let raw = fs::read(&path).map_err(|source| StoreError::Io {
                path: path.display().to_string(),
                source,
            })?;
            serde_json::from_slice(&raw)?
        } else {
            Collections::new()
        };

        Ok(Store {
            collections: RwLock::new(collections),
            path: Some(path),
        })
    }

    // Runs with the write guard held so flushes can never land out of
    // order; the write itself goes through tokio's blocking pool.
    async fn flush(&self, collections: &Collections) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let raw = serde_json::to_vec(collections)?;
        tokio::fs::write(path, raw).await.map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub async fn insert(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        self.flush(&collections).await
    }

    pub async fn get(&self, collection: &str, id: &str) -> Option<Value> {
        let collections = self.collections.read().await;
        collections.get(collection)?.get(id).cloned()
    }

    /// Shallow-merges `patch`'s fields on top of an existing document and
    /// returns the updated document, or `None` if the id is absent.
    pub async fn merge(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
    ) -> Result<Option<Value>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections.get_mut(collection).and_then(|col| col.get_mut(id)) else {
            return Ok(None);
        };
        if let (Some(target), Some(fields)) = (doc.as_object_mut(), patch.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        let updated = doc.clone();
        self.flush(&collections).await?;
        Ok(Some(updated))
    }

    /// Applies a relative adjustment to a numeric field under the write
    /// lock. Callers never read-modify-write counters through `get`/`merge`;
    /// this is the only correct path for concurrent counter updates.
    /// Returns whether the document existed.
    pub async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|col| col.get_mut(id))
            .and_then(|doc| doc.as_object_mut())
        else {
            return Ok(false);
        };
        let current = doc.get(field).and_then(Value::as_i64).unwrap_or(0);
        doc.insert(field.to_string(), Value::from(current + delta));
        self.flush(&collections).await?;
        Ok(true)
    }

    /// Removes a document, returning it if it was present.
    pub async fn remove(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let mut collections = self.collections.write().await;
        let removed = collections.get_mut(collection).and_then(|col| col.remove(id));
        if removed.is_some() {
            self.flush(&collections).await?;
        }
        Ok(removed)
    }

    /// Runs a filtered, sorted, windowed scan over a collection.
    pub async fn find(&self, collection: &str, query: &Query) -> Vec<Value> {
        let collections = self.collections.read().await;
        let Some(col) = collections.get(collection) else {
            return vec![];
        };

        let mut matched: Vec<Value> = if query.filter.is_empty() {
            col.values().cloned().collect()
        } else {
            col.values()
                .filter(|doc| query.filter.matches(doc))
                .cloned()
                .collect()
        };
        matched.sort_by(|a, b| query.order(a, b));

        matched
            .into_iter()
            .skip(query.skip)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect()
    }

    /// Counts filter matches ignoring any sort or window.
    pub async fn count(&self, collection: &str, filter: &Filter) -> usize {
        let collections = self.collections.read().await;
        match collections.get(collection) {
            Some(col) if filter.is_empty() => col.len(),
            Some(col) => col.values().filter(|doc| filter.matches(doc)).count(),
            None => 0,
        }
    }

    /// Every document in a collection, in no particular order.
    pub async fn all(&self, collection: &str) -> Vec<Value> {
        let collections = self.collections.read().await;
        match collections.get(collection) {
            Some(col) => col.values().cloned().collect(),
            None => vec![],
        }
    }
}
