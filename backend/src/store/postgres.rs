//! PostgreSQL document store
//!
//! All collections share the `documents` table (see `migrations/`), one JSONB
//! body per `(collection, id)`. Transactions are real database transactions;
//! documents read through a transaction are locked with `FOR UPDATE`, so two
//! transactions touching the same product run one after the other.
//! Serialization failures and deadlocks surface as `StoreError::Conflict`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use super::{Collection, Document, DocumentStore, StoreError, StoreTransaction, WriteOp, WriteSet};
use crate::config::DatabaseConfig;

/// Map sqlx errors to store errors
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = db_err.message().to_string();
            match db_err.code().as_deref() {
                // serialization_failure, deadlock_detected
                Some("40001") | Some("40P01") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Unavailable("connection pool closed".to_string()),
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable("timed out waiting for a connection".to_string())
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(e.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

fn row_to_document(row: &sqlx::postgres::PgRow) -> Result<Document, StoreError> {
    Ok(Document {
        id: row.try_get("id")?,
        data: row.try_get("data")?,
        version: row.try_get("version")?,
    })
}

/// Document store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the pending migrations in `backend/migrations`
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {}", e)))
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query(
            "SELECT id, data, version FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_document).transpose()
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query("SELECT id, data, version FROM documents WHERE collection = $1")
            .bind(collection.as_str())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_document).collect()
    }

    async fn insert(
        &self,
        collection: Collection,
        id: Uuid,
        data: Value,
    ) -> Result<Document, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, version)
            VALUES ($1, $2, $3, 1)
            RETURNING id, data, version
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(&data)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => row_to_document(&row),
            Err(e) if is_unique_violation(&e) => Err(StoreError::AlreadyExists { collection, id }),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTransaction { tx }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Database transaction holding row locks on everything it read
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn get(
        &mut self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, data, version FROM documents
            WHERE collection = $1 AND id = $2
            FOR UPDATE
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_document).transpose()
    }

    async fn commit(self: Box<Self>, writes: WriteSet) -> Result<(), StoreError> {
        let mut tx = self.tx;

        for write in writes {
            match write {
                WriteOp::Put {
                    collection,
                    id,
                    data,
                } => {
                    sqlx::query(
                        r#"
                        INSERT INTO documents (collection, id, data, version)
                        VALUES ($1, $2, $3, 1)
                        ON CONFLICT (collection, id) DO UPDATE
                        SET data = EXCLUDED.data,
                            version = documents.version + 1,
                            updated_at = NOW()
                        "#,
                    )
                    .bind(collection.as_str())
                    .bind(id)
                    .bind(&data)
                    .execute(&mut *tx)
                    .await?;
                }
                WriteOp::Delete { collection, id } => {
                    sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                        .bind(collection.as_str())
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
