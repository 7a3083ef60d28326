//! In-memory document store
//!
//! Used for development and tests. Transactions are optimistic: every
//! document read inside a transaction is remembered with the version it had
//! (or as absent), and commit fails with `Conflict` if any of them changed in
//! the meantime. Versions come from a store-wide clock, so a document that is
//! deleted and recreated never reuses a version.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::{Collection, Document, DocumentStore, StoreError, StoreTransaction, WriteOp, WriteSet};

type Key = (Collection, Uuid);

#[derive(Debug, Default)]
struct State {
    docs: HashMap<Key, Document>,
    clock: i64,
}

impl State {
    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }

    fn put(&mut self, collection: Collection, id: Uuid, data: Value) -> Document {
        let version = self.tick();
        let doc = Document { id, data, version };
        self.docs.insert((collection, id), doc.clone());
        doc
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

/// Document store kept in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.docs.get(&(collection, id)).cloned())
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .docs
            .iter()
            .filter(|((c, _), _)| *c == collection)
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    async fn insert(
        &self,
        collection: Collection,
        id: Uuid,
        data: Value,
    ) -> Result<Document, StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if state.docs.contains_key(&(collection, id)) {
            return Err(StoreError::AlreadyExists { collection, id });
        }
        Ok(state.put(collection, id, data))
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        Ok(state.docs.remove(&(collection, id)).is_some())
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            reads: HashMap::new(),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.state.read().map(|_| ()).map_err(|_| poisoned())
    }

    async fn close(&self) {}
}

/// Optimistic transaction over a `MemoryStore`
pub struct MemoryTransaction {
    state: Arc<RwLock<State>>,
    /// Version seen on first read, `None` for documents read as absent
    reads: HashMap<Key, Option<i64>>,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn get(
        &mut self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<Document>, StoreError> {
        let doc = {
            let state = self.state.read().map_err(|_| poisoned())?;
            state.docs.get(&(collection, id)).cloned()
        };
        self.reads
            .entry((collection, id))
            .or_insert_with(|| doc.as_ref().map(|d| d.version));
        Ok(doc)
    }

    async fn commit(self: Box<Self>, writes: WriteSet) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;

        for ((collection, id), seen) in &self.reads {
            let current = state.docs.get(&(*collection, *id)).map(|d| d.version);
            if current != *seen {
                return Err(StoreError::Conflict(format!(
                    "{}/{} changed since it was read",
                    collection, id
                )));
            }
        }

        for write in writes {
            match write {
                WriteOp::Put {
                    collection,
                    id,
                    data,
                } => {
                    state.put(collection, id, data);
                }
                WriteOp::Delete { collection, id } => {
                    state.docs.remove(&(collection, id));
                }
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_get_put_delete() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();

        let doc = store
            .insert(Collection::Tools, id, json!({"nombre": "Llave"}))
            .await
            .unwrap();
        assert_eq!(doc.version, 1);
        assert!(matches!(
            store.insert(Collection::Tools, id, json!({})).await,
            Err(StoreError::AlreadyExists { .. })
        ));

        let tx = store.begin().await.unwrap();
        tx.commit(vec![WriteOp::put(
            Collection::Tools,
            id,
            json!({"nombre": "Llave 10"}),
        )])
        .await
        .unwrap();
        let doc = store.get(Collection::Tools, id).await.unwrap().unwrap();
        assert_eq!(doc.data["nombre"], "Llave 10");
        assert!(doc.version > 1);

        // same id in another collection is a different document
        assert!(store.get(Collection::Products, id).await.unwrap().is_none());

        assert!(store.delete(Collection::Tools, id).await.unwrap());
        assert!(!store.delete(Collection::Tools, id).await.unwrap());
    }

    #[tokio::test]
    async fn test_commit_applies_whole_write_set() {
        let store = MemoryStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store
            .insert(Collection::Products, a, json!({"stock": 1}))
            .await
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.get(Collection::Products, a).await.unwrap();
        tx.commit(vec![
            WriteOp::put(Collection::Products, a, json!({"stock": 0})),
            WriteOp::put(Collection::Annotations, b, json!({"titulo": "x"})),
        ])
        .await
        .unwrap();

        let product = store.get(Collection::Products, a).await.unwrap().unwrap();
        assert_eq!(product.data["stock"], 0);
        assert!(store.get(Collection::Annotations, b).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_stale_read_conflicts_and_writes_nothing() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();
        store
            .insert(Collection::Products, id, json!({"stock": 5}))
            .await
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.get(Collection::Products, id).await.unwrap();

        // concurrent writer
        let writer = store.begin().await.unwrap();
        writer
            .commit(vec![WriteOp::put(
                Collection::Products,
                id,
                json!({"stock": 2}),
            )])
            .await
            .unwrap();

        let err = tx
            .commit(vec![
                WriteOp::put(Collection::Products, id, json!({"stock": 4})),
                WriteOp::put(Collection::Annotations, other, json!({})),
            ])
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let doc = store.get(Collection::Products, id).await.unwrap().unwrap();
        assert_eq!(doc.data["stock"], 2);
        assert!(store.get(Collection::Annotations, other).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_absent_read_conflicts_when_created() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.get(Collection::Annotations, id).await.unwrap().is_none());

        store
            .insert(Collection::Annotations, id, json!({}))
            .await
            .unwrap();

        let err = tx.commit(vec![]).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_delete_and_recreate_is_still_a_conflict() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store
            .insert(Collection::Products, id, json!({"stock": 1}))
            .await
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.get(Collection::Products, id).await.unwrap();

        store.delete(Collection::Products, id).await.unwrap();
        store
            .insert(Collection::Products, id, json!({"stock": 1}))
            .await
            .unwrap();

        assert!(tx.commit(vec![]).await.unwrap_err().is_conflict());
    }
}
