//! Helpers shared by the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use gtm_admin::services::{AnnotationService, ProductService};
use gtm_admin::store::{DocumentStore, MemoryStore};
use rust_decimal::Decimal;
use shared::models::{AnnotationItem, AnnotationType, NewAnnotation, NewProduct, Product};
use uuid::Uuid;

pub const MAX_ATTEMPTS: u32 = 5;

pub struct Fixture {
    pub store: Arc<dyn DocumentStore>,
    pub annotations: AnnotationService,
    pub products: ProductService,
}

pub fn fixture() -> Fixture {
    fixture_with(Arc::new(MemoryStore::new()), MAX_ATTEMPTS)
}

pub fn fixture_with(store: Arc<dyn DocumentStore>, max_attempts: u32) -> Fixture {
    Fixture {
        annotations: AnnotationService::new(store.clone(), max_attempts),
        products: ProductService::new(store.clone()).with_max_attempts(max_attempts),
        store,
    }
}

pub fn new_product(description: &str, stock: i64) -> NewProduct {
    NewProduct {
        code: format!("COD-{}", description.len()),
        description: description.to_string(),
        brand: "Castrol".to_string(),
        category: "Aceites".to_string(),
        stock,
        cost_price: Decimal::from(100),
        sale_price: Decimal::from(150),
        location: None,
        applications: vec![],
        filter_type: None,
    }
}

pub async fn product(fx: &Fixture, description: &str, stock: i64) -> Product {
    fx.products
        .create(new_product(description, stock))
        .await
        .unwrap()
}

pub async fn stock_of(fx: &Fixture, id: Uuid) -> i64 {
    fx.products.get(id).await.unwrap().stock
}

pub fn line(product_id: Uuid, quantity: i64) -> AnnotationItem {
    AnnotationItem {
        description: "Venta".to_string(),
        quantity: Some(quantity),
        unit_price: Some(Decimal::from(150)),
        unit: None,
        product_id: Some(product_id),
    }
}

pub fn annotation(kind: AnnotationType, items: Vec<AnnotationItem>) -> NewAnnotation {
    NewAnnotation {
        date: None,
        kind,
        title: "Venta mostrador".to_string(),
        description: String::new(),
        items,
        total: None,
    }
}

pub fn sale(lines: &[(Uuid, i64)]) -> NewAnnotation {
    annotation(
        AnnotationType::Lubricentro,
        lines.iter().map(|(id, qty)| line(*id, *qty)).collect(),
    )
}
