//! Lubricentro product service

use std::cmp::Reverse;
use std::sync::Arc;

use chrono::Utc;
use shared::filters::ProductFilter;
use shared::models::{NewProduct, Product, ProductPatch};
use shared::types::{paginate, PaginatedResponse, Pagination};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{fetch, fetch_all, insert_record, update_record, DEFAULT_MAX_ATTEMPTS};
use crate::error::{AppError, AppResult};
use crate::store::{Collection, DocumentStore};

const NOT_FOUND: &str = "Producto no encontrado";

/// Product service for managing the lubricentro inventory
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn DocumentStore>,
    max_attempts: u32,
}

impl ProductService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Attempts an update gets on store conflicts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Every product, newest first
    pub async fn all(&self) -> AppResult<Vec<Product>> {
        let mut products: Vec<Product> =
            fetch_all(self.store.as_ref(), Collection::Products).await?;
        products.sort_by_key(|p| Reverse(p.created_at));
        Ok(products)
    }

    pub async fn list(
        &self,
        filter: &ProductFilter,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<Product>> {
        let products = self
            .all()
            .await?
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect();
        Ok(paginate(products, pagination))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Product> {
        fetch(self.store.as_ref(), Collection::Products, id)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
    }

    pub async fn create(&self, input: NewProduct) -> AppResult<Product> {
        input.validate()?;

        let product = Product::from_input(Uuid::new_v4(), input, Utc::now());
        insert_record(self.store.as_ref(), Collection::Products, &product).await?;

        info!(product_id = %product.id, codigo = %product.code, stock = product.stock, "Product created");
        Ok(product)
    }

    /// Partial update, read and written in one transaction so sales committed
    /// meanwhile are not overwritten. A stock value here is a manual correction
    /// and is not reconciled with annotations.
    pub async fn update(&self, id: Uuid, patch: ProductPatch) -> AppResult<Product> {
        patch.validate()?;

        let manual_stock = patch.stock;
        let now = Utc::now();
        let product = update_record(
            self.store.as_ref(),
            self.max_attempts,
            Collection::Products,
            id,
            NOT_FOUND,
            move |product: &mut Product| {
                product.apply_patch(patch.clone(), now);
                Ok(())
            },
        )
        .await?;

        if let Some(stock) = manual_stock {
            info!(product_id = %id, stock, "Manual stock correction");
        }
        Ok(product)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.store.delete(Collection::Products, id).await? {
            return Err(AppError::NotFound(NOT_FOUND.to_string()));
        }
        info!(product_id = %id, "Product deleted");
        Ok(())
    }
}
