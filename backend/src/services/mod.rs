//! Business logic services for the GTM administration server

use std::marker::PhantomData;

use async_trait::async_trait;
use shared::decode::{decode, encode, Record};
use tracing::warn;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{Collection, DocumentStore, StoreTransaction, WriteOp, WriteSet};

pub mod annotation;
pub mod product;
pub mod reporting;
pub mod tool;
pub mod workshop;

pub use annotation::AnnotationService;
pub use product::ProductService;
pub use reporting::ReportingService;
pub use tool::ToolService;
pub use workshop::WorkshopService;

/// Attempts a transaction gets before a store conflict is surfaced
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Load and decode one record, `None` when it does not exist
pub(crate) async fn fetch<T: Record>(
    store: &dyn DocumentStore,
    collection: Collection,
    id: Uuid,
) -> AppResult<Option<T>> {
    match store.get(collection, id).await? {
        Some(doc) => Ok(Some(decode(doc.id, doc.data)?)),
        None => Ok(None),
    }
}

/// Load and decode a whole collection
pub(crate) async fn fetch_all<T: Record>(
    store: &dyn DocumentStore,
    collection: Collection,
) -> AppResult<Vec<T>> {
    store
        .list(collection)
        .await?
        .into_iter()
        .map(|doc| decode(doc.id, doc.data).map_err(AppError::from))
        .collect()
}

pub(crate) async fn insert_record<T: Record>(
    store: &dyn DocumentStore,
    collection: Collection,
    record: &T,
) -> AppResult<()> {
    store
        .insert(collection, record.id(), encode(record)?)
        .await?;
    Ok(())
}

/// Body of a store transaction: reads through `tx`, then hands back the
/// write set to commit together with the caller's result.
#[async_trait]
pub(crate) trait TransactionBody: Send + Sync {
    type Output: Send;

    async fn plan(&self, tx: &mut dyn StoreTransaction) -> AppResult<(WriteSet, Self::Output)>;
}

/// Run a transaction body, re-running it from scratch on store conflicts up to
/// `max_attempts` times
pub(crate) async fn run_transaction<B: TransactionBody>(
    store: &dyn DocumentStore,
    max_attempts: u32,
    body: &B,
) -> AppResult<B::Output> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let mut tx = store.begin().await?;

        let (writes, output) = match body.plan(tx.as_mut()).await {
            Ok(planned) => planned,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                return Err(e);
            }
        };

        match tx.commit(writes).await {
            Ok(()) => return Ok(output),
            Err(e) if e.is_conflict() && attempt < max_attempts => {
                warn!(attempt, max_attempts, error = %e, "Transaction conflict, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read one record, let `apply` edit it and write it back, all inside one
/// transaction so a concurrent write to the same record is never lost
struct UpdateRecord<T, F> {
    collection: Collection,
    id: Uuid,
    not_found: &'static str,
    apply: F,
    record: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T, F> TransactionBody for UpdateRecord<T, F>
where
    T: Record + Send + 'static,
    F: Fn(&mut T) -> AppResult<()> + Send + Sync,
{
    type Output = T;

    async fn plan(&self, tx: &mut dyn StoreTransaction) -> AppResult<(WriteSet, Self::Output)> {
        let doc = tx
            .get(self.collection, self.id)
            .await?
            .ok_or_else(|| AppError::NotFound(self.not_found.to_string()))?;
        let mut record: T = decode(doc.id, doc.data)?;

        (self.apply)(&mut record)?;
        record.check().map_err(AppError::ValidationError)?;

        let writes = vec![WriteOp::put(self.collection, self.id, encode(&record)?)];
        Ok((writes, record))
    }
}

/// Transactional read-modify-write of a single record
pub(crate) async fn update_record<T, F>(
    store: &dyn DocumentStore,
    max_attempts: u32,
    collection: Collection,
    id: Uuid,
    not_found: &'static str,
    apply: F,
) -> AppResult<T>
where
    T: Record + Send + 'static,
    F: Fn(&mut T) -> AppResult<()> + Send + Sync,
{
    let body = UpdateRecord {
        collection,
        id,
        not_found,
        apply,
        record: PhantomData,
    };
    run_transaction(store, max_attempts, &body).await
}
