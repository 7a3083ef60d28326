//! Annotation service: CRUD plus the stock-adjusting create and cancel
//!
//! Creating a `LUBRICENTRO` annotation debits the stock of every product its
//! lines reference, cancelling it credits the same quantities back. Both run
//! as one store transaction: all products are read and checked first, and the
//! writes (products plus the annotation itself) are committed together.

use std::cmp::Reverse;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::decode::{decode, encode};
use shared::filters::AnnotationFilter;
use shared::models::{
    Annotation, AnnotationItem, AnnotationPatch, AnnotationType, NewAnnotation, Product,
    StockMovement,
};
use shared::types::{paginate, DateRange, PaginatedResponse, Pagination};
use shared::validation::validate_stock;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use super::{fetch, fetch_all, run_transaction, update_record, TransactionBody};
use crate::error::{AppError, AppResult};
use crate::store::{Collection, DocumentStore, StoreTransaction, WriteOp, WriteSet};

pub const ANNOTATION_NOT_FOUND: &str = "Anotación no encontrada";

fn product_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Producto no encontrado (id: {})", id))
}

/// One page of annotations plus the total of the whole filtered set
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationPage {
    #[serde(flatten)]
    pub page: PaginatedResponse<Annotation>,
    pub total_general: Decimal,
}

/// Stock change applied to one product by a create or cancel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockChange {
    #[serde(rename = "productoId")]
    pub product_id: Uuid,
    #[serde(rename = "cantidad")]
    pub quantity: i64,
    /// Stock after the change
    #[serde(rename = "stock")]
    pub stock: i64,
}

/// Result of cancelling an annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cancellation {
    pub id: Uuid,
    #[serde(rename = "tipo")]
    pub kind: AnnotationType,
    #[serde(rename = "restaurados")]
    pub restored: Vec<StockChange>,
    /// Referenced products that no longer exist
    #[serde(rename = "omitidos")]
    pub skipped: Vec<Uuid>,
}

/// Read the products of `movements` and validate the debit, then return the
/// product writes followed by the annotation write
struct CreateWithDebit {
    annotation: Annotation,
    now: DateTime<Utc>,
}

#[async_trait]
impl TransactionBody for CreateWithDebit {
    type Output = Vec<StockChange>;

    async fn plan(&self, tx: &mut dyn StoreTransaction) -> AppResult<(WriteSet, Self::Output)> {
        let movements = self.annotation.stock_movements();

        // Reads and checks first
        let mut debited: Vec<(Product, i64)> = Vec::with_capacity(movements.len());
        for StockMovement {
            product_id,
            quantity,
        } in movements
        {
            let doc = tx
                .get(Collection::Products, product_id)
                .await?
                .ok_or_else(|| product_not_found(product_id))?;
            let product: Product = decode(doc.id, doc.data)?;

            if product.stock < quantity {
                return Err(AppError::InsufficientStock {
                    product: product.display_name(),
                    available: product.stock,
                    requested: quantity,
                });
            }
            debited.push((product, quantity));
        }

        // Then the write set
        let mut writes = Vec::with_capacity(debited.len() + 1);
        let mut changes = Vec::with_capacity(debited.len());
        for (mut product, quantity) in debited {
            product.stock = product
                .stock
                .checked_sub(quantity)
                .ok_or_else(|| {
                    AppError::validation("cantidad", "La cantidad excede el máximo permitido")
                })?;
            product.updated_at = self.now;
            debug!(product_id = %product.id, quantity, stock = product.stock, "Planned stock debit");
            writes.push(WriteOp::put(
                Collection::Products,
                product.id,
                encode(&product)?,
            ));
            changes.push(StockChange {
                product_id: product.id,
                quantity,
                stock: product.stock,
            });
        }
        writes.push(WriteOp::put(
            Collection::Annotations,
            self.annotation.id,
            encode(&self.annotation)?,
        ));

        Ok((writes, changes))
    }
}

/// Credit the stock of the annotation's products back and delete it
struct CancelWithCredit {
    id: Uuid,
    now: DateTime<Utc>,
}

#[async_trait]
impl TransactionBody for CancelWithCredit {
    type Output = Cancellation;

    async fn plan(&self, tx: &mut dyn StoreTransaction) -> AppResult<(WriteSet, Self::Output)> {
        let doc = tx
            .get(Collection::Annotations, self.id)
            .await?
            .ok_or_else(|| AppError::NotFound(ANNOTATION_NOT_FOUND.to_string()))?;
        let annotation: Annotation = decode(doc.id, doc.data)?;

        let mut credited: Vec<(Product, i64)> = Vec::new();
        let mut skipped = Vec::new();
        for StockMovement {
            product_id,
            quantity,
        } in annotation.stock_movements()
        {
            match tx.get(Collection::Products, product_id).await? {
                Some(doc) => {
                    let product: Product = decode(doc.id, doc.data)?;
                    credited.push((product, quantity));
                }
                None => skipped.push(product_id),
            }
        }

        let mut writes = Vec::with_capacity(credited.len() + 1);
        let mut restored = Vec::with_capacity(credited.len());
        for (mut product, quantity) in credited {
            product.stock = product
                .stock
                .checked_add(quantity)
                .filter(|stock| validate_stock(*stock).is_ok())
                .ok_or_else(|| {
                    AppError::validation(
                        "stock",
                        format!(
                            "El stock de {} excede el máximo permitido",
                            product.display_name()
                        ),
                    )
                })?;
            product.updated_at = self.now;
            debug!(product_id = %product.id, quantity, stock = product.stock, "Planned stock credit");
            writes.push(WriteOp::put(
                Collection::Products,
                product.id,
                encode(&product)?,
            ));
            restored.push(StockChange {
                product_id: product.id,
                quantity,
                stock: product.stock,
            });
        }
        writes.push(WriteOp::delete(Collection::Annotations, annotation.id));

        Ok((
            writes,
            Cancellation {
                id: annotation.id,
                kind: annotation.kind,
                restored,
                skipped,
            },
        ))
    }
}

/// Annotation service
#[derive(Clone)]
pub struct AnnotationService {
    store: Arc<dyn DocumentStore>,
    max_attempts: u32,
}

impl AnnotationService {
    pub fn new(store: Arc<dyn DocumentStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts,
        }
    }

    async fn load_all(&self) -> AppResult<Vec<Annotation>> {
        fetch_all(self.store.as_ref(), Collection::Annotations).await
    }

    /// Filtered annotations, newest date first, one page of them
    pub async fn list(
        &self,
        filter: &AnnotationFilter,
        pagination: &Pagination,
    ) -> AppResult<AnnotationPage> {
        let mut annotations: Vec<Annotation> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|a| filter.matches(a))
            .collect();
        annotations.sort_by_key(|a| Reverse((a.date, a.created_at)));

        let total_general = annotations
            .iter()
            .map(|a| a.total)
            .fold(Decimal::ZERO, Decimal::saturating_add);

        Ok(AnnotationPage {
            page: paginate(annotations, pagination),
            total_general,
        })
    }

    /// Annotations dated within the range, oldest first
    pub async fn list_in_range(&self, range: &DateRange) -> AppResult<Vec<Annotation>> {
        let mut annotations: Vec<Annotation> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|a| range.contains(a.date))
            .collect();
        annotations.sort_by_key(|a| (a.date, a.created_at));
        Ok(annotations)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Annotation> {
        fetch(self.store.as_ref(), Collection::Annotations, id)
            .await?
            .ok_or_else(|| AppError::NotFound(ANNOTATION_NOT_FOUND.to_string()))
    }

    /// Create an annotation, debiting stock for lubricentro sales
    #[tracing::instrument(skip(self, input), fields(tipo = %input.kind))]
    pub async fn create(&self, input: NewAnnotation) -> AppResult<Annotation> {
        input.validate()?;

        let now = Utc::now();
        let body = CreateWithDebit {
            annotation: Annotation::from_input(Uuid::new_v4(), input, now),
            now,
        };

        let debits = run_transaction(self.store.as_ref(), self.max_attempts, &body).await?;
        for change in &debits {
            info!(
                annotation_id = %body.annotation.id,
                product_id = %change.product_id,
                quantity = change.quantity,
                stock = change.stock,
                "Stock debited"
            );
        }

        Ok(body.annotation)
    }

    /// Edit an annotation. Stock is left as it is, even when items change.
    pub async fn update(&self, id: Uuid, patch: AnnotationPatch) -> AppResult<Annotation> {
        patch.validate()?;
        if let Some(items) = &patch.items {
            validate_items(items)?;
        }

        let now = Utc::now();
        update_record(
            self.store.as_ref(),
            self.max_attempts,
            Collection::Annotations,
            id,
            ANNOTATION_NOT_FOUND,
            move |annotation: &mut Annotation| {
                annotation.apply_patch(patch.clone(), now);
                Ok(())
            },
        )
        .await
    }

    /// Remove an annotation without touching stock
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.store.delete(Collection::Annotations, id).await? {
            return Err(AppError::NotFound(ANNOTATION_NOT_FOUND.to_string()));
        }
        info!(annotation_id = %id, "Annotation deleted");
        Ok(())
    }

    /// Delete an annotation and give its lubricentro stock back
    #[tracing::instrument(skip(self), fields(tipo = tracing::field::Empty))]
    pub async fn cancel(&self, id: Uuid) -> AppResult<Cancellation> {
        let body = CancelWithCredit {
            id,
            now: Utc::now(),
        };

        let cancellation = run_transaction(self.store.as_ref(), self.max_attempts, &body).await?;
        tracing::Span::current().record("tipo", tracing::field::display(cancellation.kind));
        for change in &cancellation.restored {
            info!(
                annotation_id = %id,
                product_id = %change.product_id,
                quantity = change.quantity,
                stock = change.stock,
                "Stock restored"
            );
        }
        for product_id in &cancellation.skipped {
            info!(annotation_id = %id, %product_id, "Product no longer exists, stock not restored");
        }

        Ok(cancellation)
    }
}

fn validate_items(items: &[AnnotationItem]) -> AppResult<()> {
    for item in items {
        item.validate()?;
    }
    Ok(())
}
