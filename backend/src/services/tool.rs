//! Tool (herramientas) service

use std::sync::Arc;

use chrono::Utc;
use shared::filters::ToolFilter;
use shared::models::{NewTool, Tool, ToolPatch};
use shared::types::{paginate, PaginatedResponse, Pagination};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{fetch, fetch_all, insert_record, update_record, DEFAULT_MAX_ATTEMPTS};
use crate::error::{AppError, AppResult};
use crate::store::{Collection, DocumentStore};

const NOT_FOUND: &str = "Herramienta no encontrada";

#[derive(Clone)]
pub struct ToolService {
    store: Arc<dyn DocumentStore>,
    max_attempts: u32,
}

impl ToolService {
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

    pub async fn list(
        &self,
        filter: &ToolFilter,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<Tool>> {
        let mut tools: Vec<Tool> = fetch_all(self.store.as_ref(), Collection::Tools).await?;
        tools.retain(|t| filter.matches(t));
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(paginate(tools, pagination))
    }

    pub async fn count(&self) -> AppResult<usize> {
        Ok(self.store.list(Collection::Tools).await?.len())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Tool> {
        fetch(self.store.as_ref(), Collection::Tools, id)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
    }

    pub async fn create(&self, input: NewTool) -> AppResult<Tool> {
        input.validate()?;

        let tool = Tool::from_input(Uuid::new_v4(), input, Utc::now());
        insert_record(self.store.as_ref(), Collection::Tools, &tool).await?;

        info!(tool_id = %tool.id, nombre = %tool.name, "Tool created");
        Ok(tool)
    }

    pub async fn update(&self, id: Uuid, patch: ToolPatch) -> AppResult<Tool> {
        patch.validate()?;

        let now = Utc::now();
        update_record(
            self.store.as_ref(),
            self.max_attempts,
            Collection::Tools,
            id,
            NOT_FOUND,
            move |tool: &mut Tool| {
                tool.apply_patch(patch.clone(), now);
                Ok(())
            },
        )
        .await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.store.delete(Collection::Tools, id).await? {
            return Err(AppError::NotFound(NOT_FOUND.to_string()));
        }
        info!(tool_id = %id, "Tool deleted");
        Ok(())
    }
}
