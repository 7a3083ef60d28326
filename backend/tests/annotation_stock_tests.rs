//! Stock-adjusting annotation tests
//!
//! Tests for the lubricentro stock transaction:
//! - Creating a sale debits stock, or fails with no effect at all
//! - Cancelling restores stock and removes the annotation
//! - Plain delete and edits never touch stock
//! - Conflicting transactions are retried
//! - Manual edits never overwrite a concurrent debit
//! - Quantities too large to add up are rejected

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::*;
use gtm_admin::error::AppError;
use gtm_admin::store::{
    Collection, Document, DocumentStore, MemoryStore, StoreError, StoreTransaction, WriteSet,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::Value;
use shared::filters::AnnotationFilter;
use gtm_admin::services::AnnotationService;
use shared::models::{AnnotationItem, AnnotationPatch, AnnotationType, NewAnnotation, ProductPatch};
use shared::validation::{MAX_QUANTITY, MAX_STOCK};
use shared::types::Pagination;
use uuid::Uuid;

async fn annotation_count(fx: &Fixture) -> u64 {
    fx.annotations
        .list(&AnnotationFilter::default(), &Pagination::default())
        .await
        .unwrap()
        .page
        .pagination
        .total_items
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_sale_cancel_and_oversell_scenario() {
    let fx = fixture();
    let p = product(&fx, "Aceite 10W40", 10).await;

    let created = fx.annotations.create(sale(&[(p.id, 4)])).await.unwrap();
    assert_eq!(stock_of(&fx, p.id).await, 6);
    assert_eq!(created.total, Decimal::from(600));

    let cancellation = fx.annotations.cancel(created.id).await.unwrap();
    assert_eq!(cancellation.restored.len(), 1);
    assert_eq!(stock_of(&fx, p.id).await, 10);
    assert!(matches!(
        fx.annotations.get(created.id).await,
        Err(AppError::NotFound(_))
    ));

    let err = fx.annotations.create(sale(&[(p.id, 20)])).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Stock insuficiente para \"Aceite 10W40\". Disponible: 10, solicitado: 20"
    );
    assert_eq!(stock_of(&fx, p.id).await, 10);
    assert_eq!(annotation_count(&fx).await, 0);
}

#[tokio::test]
async fn test_sale_persists_items_and_debits_every_product() {
    let fx = fixture();
    let a = product(&fx, "Aceite 5W30", 8).await;
    let b = product(&fx, "Filtro de aceite", 3).await;

    let created = fx
        .annotations
        .create(sale(&[(a.id, 2), (b.id, 3)]))
        .await
        .unwrap();

    assert_eq!(stock_of(&fx, a.id).await, 6);
    assert_eq!(stock_of(&fx, b.id).await, 0);

    let stored = fx.annotations.get(created.id).await.unwrap();
    assert_eq!(stored.items.len(), 2);
    assert_eq!(stored.total, Decimal::from(750));

    // debited products get a fresh updatedAt
    let a_after = fx.products.get(a.id).await.unwrap();
    assert!(a_after.updated_at >= a.updated_at);
}

#[tokio::test]
async fn test_one_short_product_aborts_everything() {
    let fx = fixture();
    let plenty = product(&fx, "Aceite 15W40", 50).await;
    let short = product(&fx, "Refrigerante", 1).await;

    let err = fx
        .annotations
        .create(sale(&[(plenty.id, 5), (short.id, 2)]))
        .await
        .unwrap_err();

    match err {
        AppError::InsufficientStock {
            product,
            available,
            requested,
        } => {
            assert_eq!(product, "Refrigerante");
            assert_eq!(available, 1);
            assert_eq!(requested, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(stock_of(&fx, plenty.id).await, 50);
    assert_eq!(stock_of(&fx, short.id).await, 1);
    assert_eq!(annotation_count(&fx).await, 0);
}

#[tokio::test]
async fn test_missing_product_aborts_with_its_id() {
    let fx = fixture();
    let existing = product(&fx, "Aditivo", 5).await;
    let missing = Uuid::new_v4();

    let err = fx
        .annotations
        .create(sale(&[(existing.id, 1), (missing, 1)]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(
        err.to_string(),
        format!("Producto no encontrado (id: {})", missing)
    );
    assert_eq!(stock_of(&fx, existing.id).await, 5);
    assert_eq!(annotation_count(&fx).await, 0);
}

#[tokio::test]
async fn test_lines_of_the_same_product_are_checked_together() {
    let fx = fixture();
    let p = product(&fx, "Líquido de freno", 5).await;

    let err = fx
        .annotations
        .create(sale(&[(p.id, 3), (p.id, 3)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InsufficientStock {
            available: 5,
            requested: 6,
            ..
        }
    ));
    assert_eq!(stock_of(&fx, p.id).await, 5);

    fx.annotations
        .create(sale(&[(p.id, 2), (p.id, 3)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&fx, p.id).await, 0);
}

#[tokio::test]
async fn test_lines_without_product_or_quantity_do_not_move_stock() {
    let fx = fixture();
    let p = product(&fx, "Grasa", 4).await;

    let mut input = sale(&[(p.id, 0)]);
    input.items.push(common::line(p.id, 1));
    input.items[1].quantity = None;
    input.items.push(shared::models::AnnotationItem {
        description: "Mano de obra".to_string(),
        quantity: Some(1),
        unit_price: Some(Decimal::from(500)),
        unit: None,
        product_id: None,
    });

    fx.annotations.create(input).await.unwrap();
    assert_eq!(stock_of(&fx, p.id).await, 4);
}

#[tokio::test]
async fn test_other_annotation_types_never_touch_stock() {
    let fx = fixture();
    let p = product(&fx, "Aceite 10W40", 2).await;

    for kind in [
        AnnotationType::Taller,
        AnnotationType::GastosAlquiler,
        AnnotationType::Otro,
    ] {
        let created = fx
            .annotations
            .create(annotation(kind, vec![common::line(p.id, 50)]))
            .await
            .unwrap();
        fx.annotations.cancel(created.id).await.unwrap();
    }
    assert_eq!(stock_of(&fx, p.id).await, 2);
}

#[tokio::test]
async fn test_blank_title_is_rejected_before_touching_stock() {
    let fx = fixture();
    let p = product(&fx, "Aceite", 3).await;

    let mut input = sale(&[(p.id, 1)]);
    input.title = "   ".to_string();

    let err = fx.annotations.create(input).await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(stock_of(&fx, p.id).await, 3);
}

// ============================================================================
// Cancel, delete, edit
// ============================================================================

#[tokio::test]
async fn test_cancel_skips_deleted_products() {
    let fx = fixture();
    let kept = product(&fx, "Aceite 5W30", 10).await;
    let gone = product(&fx, "Filtro de aire", 10).await;

    let created = fx
        .annotations
        .create(sale(&[(kept.id, 4), (gone.id, 2)]))
        .await
        .unwrap();
    fx.products.delete(gone.id).await.unwrap();

    let cancellation = fx.annotations.cancel(created.id).await.unwrap();
    assert_eq!(cancellation.skipped, vec![gone.id]);
    assert_eq!(cancellation.restored.len(), 1);
    assert_eq!(cancellation.restored[0].stock, 10);

    assert_eq!(stock_of(&fx, kept.id).await, 10);
    assert!(fx.annotations.get(created.id).await.is_err());
}

#[tokio::test]
async fn test_cancel_missing_annotation() {
    let fx = fixture();
    let err = fx.annotations.cancel(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.to_string(), "Anotación no encontrada");
}

#[tokio::test]
async fn test_cancel_twice_restores_once() {
    let fx = fixture();
    let p = product(&fx, "Aceite", 10).await;
    let created = fx.annotations.create(sale(&[(p.id, 3)])).await.unwrap();

    fx.annotations.cancel(created.id).await.unwrap();
    assert!(fx.annotations.cancel(created.id).await.is_err());
    assert_eq!(stock_of(&fx, p.id).await, 10);
}

#[tokio::test]
async fn test_plain_delete_keeps_stock_debited() {
    let fx = fixture();
    let p = product(&fx, "Aceite", 10).await;
    let created = fx.annotations.create(sale(&[(p.id, 4)])).await.unwrap();

    fx.annotations.delete(created.id).await.unwrap();
    assert_eq!(stock_of(&fx, p.id).await, 6);
    assert!(fx.annotations.get(created.id).await.is_err());

    assert!(matches!(
        fx.annotations.delete(created.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_editing_items_does_not_readjust_stock() {
    let fx = fixture();
    let p = product(&fx, "Aceite", 10).await;
    let created = fx.annotations.create(sale(&[(p.id, 4)])).await.unwrap();

    let updated = fx
        .annotations
        .update(
            created.id,
            AnnotationPatch {
                items: Some(vec![common::line(p.id, 1)]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.total, Decimal::from(150));
    assert_eq!(stock_of(&fx, p.id).await, 6);

    // cancellation restores what the current items say
    fx.annotations.cancel(created.id).await.unwrap();
    assert_eq!(stock_of(&fx, p.id).await, 7);
}

// ============================================================================
// Conflicts
// ============================================================================

/// Store whose first `conflicts` commits fail as if a concurrent writer won
struct ConflictingStore {
    inner: MemoryStore,
    conflicts: Arc<AtomicU32>,
}

struct ConflictingTransaction {
    inner: Box<dyn StoreTransaction>,
    conflicts: Arc<AtomicU32>,
}

#[async_trait]
impl StoreTransaction for ConflictingTransaction {
    async fn get(
        &mut self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<Document>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn commit(self: Box<Self>, writes: WriteSet) -> Result<(), StoreError> {
        let this = *self;
        let remaining = this.conflicts.load(Ordering::SeqCst);
        if remaining > 0 {
            this.conflicts.store(remaining - 1, Ordering::SeqCst);
            this.inner.rollback().await?;
            return Err(StoreError::Conflict("injected".to_string()));
        }
        this.inner.commit(writes).await
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        this.inner.rollback().await
    }
}

#[async_trait]
impl DocumentStore for ConflictingStore {
    fn backend_name(&self) -> &'static str {
        "conflicting"
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        self.inner.list(collection).await
    }

    async fn insert(
        &self,
        collection: Collection,
        id: Uuid,
        data: Value,
    ) -> Result<Document, StoreError> {
        self.inner.insert(collection, id, data).await
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError> {
        self.inner.delete(collection, id).await
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        Ok(Box::new(ConflictingTransaction {
            inner: self.inner.begin().await?,
            conflicts: self.conflicts.clone(),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) {}
}

fn conflicting_fixture(conflicts: u32, max_attempts: u32) -> Fixture {
    let store = ConflictingStore {
        inner: MemoryStore::new(),
        conflicts: Arc::new(AtomicU32::new(conflicts)),
    };
    fixture_with(Arc::new(store), max_attempts)
}

#[tokio::test]
async fn test_conflicts_are_retried_and_debit_once() {
    let fx = conflicting_fixture(2, 5);
    let p = product(&fx, "Aceite", 10).await;

    fx.annotations.create(sale(&[(p.id, 4)])).await.unwrap();
    assert_eq!(stock_of(&fx, p.id).await, 6);
    assert_eq!(annotation_count(&fx).await, 1);
}

#[tokio::test]
async fn test_conflicts_beyond_max_attempts_fail_cleanly() {
    let fx = conflicting_fixture(10, 3);
    let p = product(&fx, "Aceite", 10).await;

    let err = fx.annotations.create(sale(&[(p.id, 4)])).await.unwrap_err();
    assert!(matches!(err, AppError::Store(StoreError::Conflict(_))));
    assert_eq!(stock_of(&fx, p.id).await, 10);
    assert_eq!(annotation_count(&fx).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sales_never_oversell() {
    let fx = fixture_with(Arc::new(MemoryStore::new()), 50);
    let p = product(&fx, "Aceite", 10).await;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let annotations = fx.annotations.clone();
        let id = p.id;
        handles.push(tokio::spawn(async move {
            annotations.create(sale(&[(id, 1)])).await
        }));
    }

    let mut sold = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            sold += 1;
        }
    }

    let stock = stock_of(&fx, p.id).await;
    assert!(stock >= 0);
    assert_eq!(stock, 10 - sold);
    assert_eq!(annotation_count(&fx).await, sold as u64);
}

// ============================================================================
// Manual edits racing a sale
// ============================================================================

/// Store that commits a pending sale straight to the inner store right before
/// the next transaction commits, as if it had landed between that
/// transaction's read and its write
struct InterleavingStore {
    inner: Arc<MemoryStore>,
    pending: Mutex<Option<NewAnnotation>>,
}

struct InterleavingTransaction {
    inner: Box<dyn StoreTransaction>,
    sale: Option<(AnnotationService, NewAnnotation)>,
}

#[async_trait]
impl StoreTransaction for InterleavingTransaction {
    async fn get(
        &mut self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<Document>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn commit(self: Box<Self>, writes: WriteSet) -> Result<(), StoreError> {
        let this = *self;
        if let Some((service, input)) = this.sale {
            service.create(input).await.expect("interleaved sale");
        }
        this.inner.commit(writes).await
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        this.inner.rollback().await
    }
}

#[async_trait]
impl DocumentStore for InterleavingStore {
    fn backend_name(&self) -> &'static str {
        "interleaving"
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        self.inner.list(collection).await
    }

    async fn insert(
        &self,
        collection: Collection,
        id: Uuid,
        data: Value,
    ) -> Result<Document, StoreError> {
        self.inner.insert(collection, id, data).await
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError> {
        self.inner.delete(collection, id).await
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let pending = self.pending.lock().unwrap().take();
        let sale = pending.map(|input| {
            let direct = AnnotationService::new(self.inner.clone(), MAX_ATTEMPTS);
            (direct, input)
        });
        Ok(Box::new(InterleavingTransaction {
            inner: self.inner.begin().await?,
            sale,
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) {}
}

#[tokio::test]
async fn test_price_edit_keeps_a_sale_committed_meanwhile() {
    let store = Arc::new(InterleavingStore {
        inner: Arc::new(MemoryStore::new()),
        pending: Mutex::new(None),
    });
    let fx = fixture_with(store.clone(), MAX_ATTEMPTS);
    let p = product(&fx, "Aceite 10W40", 10).await;

    *store.pending.lock().unwrap() = Some(sale(&[(p.id, 4)]));
    let patch: ProductPatch = serde_json::from_value(serde_json::json!({
        "precioVenta": "200"
    }))
    .unwrap();
    let updated = fx.products.update(p.id, patch).await.unwrap();

    assert_eq!(updated.stock, 6);
    assert_eq!(updated.sale_price, Decimal::from(200));

    let stored = fx.products.get(p.id).await.unwrap();
    assert_eq!(stored.stock, 6);
    assert_eq!(stored.sale_price, Decimal::from(200));
    assert_eq!(annotation_count(&fx).await, 1);
}

#[tokio::test]
async fn test_manual_stock_correction_wins_over_an_earlier_sale() {
    let store = Arc::new(InterleavingStore {
        inner: Arc::new(MemoryStore::new()),
        pending: Mutex::new(None),
    });
    let fx = fixture_with(store.clone(), MAX_ATTEMPTS);
    let p = product(&fx, "Aceite 10W40", 10).await;

    *store.pending.lock().unwrap() = Some(sale(&[(p.id, 4)]));
    let updated = fx
        .products
        .update(
            p.id,
            ProductPatch {
                stock: Some(25),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // the correction is re-applied on top of the fresh read
    assert_eq!(updated.stock, 25);
    assert_eq!(stock_of(&fx, p.id).await, 25);
}

#[tokio::test]
async fn test_edit_of_missing_product_is_not_found() {
    let fx = fixture();
    let err = fx
        .products
        .update(Uuid::new_v4(), ProductPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.to_string(), "Producto no encontrado");
}

// ============================================================================
// Arithmetic limits
// ============================================================================

#[tokio::test]
async fn test_quantities_that_would_overflow_are_rejected() {
    let fx = fixture();
    let p = product(&fx, "Aceite", 10).await;

    let half = i64::MAX / 2 + 1;
    let err = fx
        .annotations
        .create(sale(&[(p.id, half), (p.id, half)]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(stock_of(&fx, p.id).await, 10);
    assert_eq!(annotation_count(&fx).await, 0);
}

#[tokio::test]
async fn test_oversized_line_total_is_rejected() {
    let fx = fixture();

    let input = annotation(
        AnnotationType::Otro,
        vec![AnnotationItem {
            description: "Importe".to_string(),
            quantity: Some(i64::MAX),
            unit_price: Some(Decimal::from(1_000_000_000_000i64)),
            unit: None,
            product_id: None,
        }],
    );

    let err = fx.annotations.create(input).await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(annotation_count(&fx).await, 0);
}

#[tokio::test]
async fn test_largest_lines_add_up_against_stock() {
    let fx = fixture();
    let p = product(&fx, "Aceite", MAX_QUANTITY).await;

    let err = fx
        .annotations
        .create(sale(&[(p.id, MAX_QUANTITY), (p.id, MAX_QUANTITY)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InsufficientStock { requested, .. } if requested == 2 * MAX_QUANTITY
    ));

    fx.annotations
        .create(sale(&[(p.id, MAX_QUANTITY)]))
        .await
        .unwrap();
    assert_eq!(stock_of(&fx, p.id).await, 0);
}

#[tokio::test]
async fn test_cancel_beyond_max_stock_changes_nothing() {
    let fx = fixture();
    let p = product(&fx, "Aceite", 10).await;
    let created = fx.annotations.create(sale(&[(p.id, 5)])).await.unwrap();

    fx.products
        .update(
            p.id,
            ProductPatch {
                stock: Some(MAX_STOCK),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = fx.annotations.cancel(created.id).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation { ref field, .. } if field == "stock"
    ));
    assert_eq!(stock_of(&fx, p.id).await, MAX_STOCK);
    assert!(fx.annotations.get(created.id).await.is_ok());
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// A sale either debits exactly its quantities or changes nothing, and
    /// cancelling it brings every stock back
    #[test]
    fn prop_create_then_cancel_is_symmetric(
        stocks in prop::collection::vec(0i64..20, 1..5),
        quantities in prop::collection::vec(1i64..10, 1..5),
    ) {
        tokio_test::block_on(async {
            let fx = fixture();
            let mut ids = Vec::new();
            for (i, stock) in stocks.iter().enumerate() {
                ids.push(product(&fx, &format!("Producto {i}"), *stock).await.id);
            }

            let lines: Vec<(Uuid, i64)> = quantities
                .iter()
                .enumerate()
                .map(|(i, qty)| (ids[i % ids.len()], *qty))
                .collect();

            let mut requested = vec![0i64; ids.len()];
            for (i, qty) in quantities.iter().enumerate() {
                requested[i % ids.len()] += qty;
            }
            let enough = stocks.iter().zip(&requested).all(|(s, r)| s >= r);

            match fx.annotations.create(sale(&lines)).await {
                Ok(created) => {
                    prop_assert!(enough);
                    for (i, id) in ids.iter().enumerate() {
                        prop_assert_eq!(stock_of(&fx, *id).await, stocks[i] - requested[i]);
                    }
                    fx.annotations.cancel(created.id).await.unwrap();
                }
                Err(err) => {
                    prop_assert!(!enough);
                    let is_insufficient = matches!(err, AppError::InsufficientStock { .. });
                    prop_assert!(is_insufficient);
                }
            }

            for (i, id) in ids.iter().enumerate() {
                prop_assert_eq!(stock_of(&fx, *id).await, stocks[i]);
            }
            prop_assert_eq!(annotation_count(&fx).await, 0);
            Ok(())
        })?;
    }
}
