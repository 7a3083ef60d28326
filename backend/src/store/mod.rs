//! Document store abstraction
//!
//! Records are kept as JSON documents keyed by `(collection, id)`. Besides
//! plain single-document operations the store offers a transaction primitive:
//! a transaction can only read, and all of its writes are handed over at once
//! to `commit`, which consumes it. Commit either applies the whole write set
//! or fails, with `StoreError::Conflict` when another writer got in between.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// The persisted collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Annotations,
    Products,
    WorkshopItems,
    Tools,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Annotations => "anotaciones",
            Collection::Products => "lubricentro",
            Collection::WorkshopItems => "inventario_taller",
            Collection::Tools => "herramientas",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored document. `data` never contains the id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub data: Value,
    /// Bumped on every write, starts at 1
    pub version: i64,
}

/// A single write of a transaction's write set
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create or overwrite a document
    Put {
        collection: Collection,
        id: Uuid,
        data: Value,
    },
    Delete {
        collection: Collection,
        id: Uuid,
    },
}

impl WriteOp {
    pub fn put(collection: Collection, id: Uuid, data: Value) -> Self {
        WriteOp::Put {
            collection,
            id,
            data,
        }
    }

    pub fn delete(collection: Collection, id: Uuid) -> Self {
        WriteOp::Delete { collection, id }
    }
}

pub type WriteSet = Vec<WriteOp>;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// A concurrent writer invalidated the transaction; safe to retry
    #[error("transaction conflict: {0}")]
    Conflict(String),

    #[error("document {collection}/{id} already exists")]
    AlreadyExists { collection: Collection, id: Uuid },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        postgres::map_sqlx_error(err)
    }
}

/// Connection to a document store, shared by all handlers
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs and the health endpoint
    fn backend_name(&self) -> &'static str;

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// Every document of a collection, in no particular order
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

    /// Create a new document, failing if the id is taken
    async fn insert(
        &self,
        collection: Collection,
        id: Uuid,
        data: Value,
    ) -> Result<Document, StoreError>;

    /// Returns false when the document did not exist
    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError>;

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Release connections. Called once at shutdown.
    async fn close(&self);
}

/// An open transaction. Reads happen first, the write set is handed over
/// in one piece to `commit`.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Read a document as part of this transaction's read set
    async fn get(&mut self, collection: Collection, id: Uuid)
        -> Result<Option<Document>, StoreError>;

    /// Apply the write set atomically and end the transaction
    async fn commit(self: Box<Self>, writes: WriteSet) -> Result<(), StoreError>;

    /// Abandon the transaction without writing anything
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
