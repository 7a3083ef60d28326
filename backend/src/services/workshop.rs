//! Workshop inventory (inventario taller) service

use std::sync::Arc;

use chrono::Utc;
use shared::filters::{distinct_locations, WorkshopItemFilter};
use shared::models::{NewWorkshopItem, WorkshopItem, WorkshopItemPatch};
use shared::types::{paginate, PaginatedResponse, Pagination};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{fetch, fetch_all, insert_record, update_record, DEFAULT_MAX_ATTEMPTS};
use crate::error::{AppError, AppResult};
use crate::store::{Collection, DocumentStore};

const NOT_FOUND: &str = "Item no encontrado";

#[derive(Clone)]
pub struct WorkshopService {
    store: Arc<dyn DocumentStore>,
    max_attempts: u32,
}

impl WorkshopService {
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

    /// Every item ordered by name
    pub async fn all(&self) -> AppResult<Vec<WorkshopItem>> {
        let mut items: Vec<WorkshopItem> =
            fetch_all(self.store.as_ref(), Collection::WorkshopItems).await?;
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    pub async fn list(
        &self,
        filter: &WorkshopItemFilter,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<WorkshopItem>> {
        let items = self
            .all()
            .await?
            .into_iter()
            .filter(|i| filter.matches(i))
            .collect();
        Ok(paginate(items, pagination))
    }

    /// Locations in use, for the location filter
    pub async fn locations(&self) -> AppResult<Vec<String>> {
        Ok(distinct_locations(&self.all().await?))
    }

    pub async fn count(&self) -> AppResult<usize> {
        Ok(self.store.list(Collection::WorkshopItems).await?.len())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<WorkshopItem> {
        fetch(self.store.as_ref(), Collection::WorkshopItems, id)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
    }

    pub async fn create(&self, input: NewWorkshopItem) -> AppResult<WorkshopItem> {
        input.validate()?;

        let item = WorkshopItem::from_input(Uuid::new_v4(), input, Utc::now());
        insert_record(self.store.as_ref(), Collection::WorkshopItems, &item).await?;

        info!(item_id = %item.id, nombre = %item.name, "Workshop item created");
        Ok(item)
    }

    pub async fn update(&self, id: Uuid, patch: WorkshopItemPatch) -> AppResult<WorkshopItem> {
        patch.validate()?;

        let now = Utc::now();
        update_record(
            self.store.as_ref(),
            self.max_attempts,
            Collection::WorkshopItems,
            id,
            NOT_FOUND,
            move |item: &mut WorkshopItem| {
                item.apply_patch(patch.clone(), now);
                Ok(())
            },
        )
        .await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.store.delete(Collection::WorkshopItems, id).await? {
            return Err(AppError::NotFound(NOT_FOUND.to_string()));
        }
        info!(item_id = %id, "Workshop item deleted");
        Ok(())
    }
}
