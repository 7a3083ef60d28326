//! HTTP handlers for workshop inventory endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::filters::WorkshopItemFilter;
use shared::models::{NewWorkshopItem, WorkshopItem, WorkshopItemPatch};
use shared::types::{PaginatedResponse, Pagination};
use uuid::Uuid;

use super::{ok, ApiResponse, Deleted};
use crate::error::AppResult;
use crate::services::WorkshopService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WorkshopListQuery {
    pub search: Option<String>,
    pub tipo: Option<String>,
    pub ubicacion: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn list_workshop_items(
    State(state): State<AppState>,
    Query(query): Query<WorkshopListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<WorkshopItem>>>> {
    let filter = WorkshopItemFilter {
        search: query.search,
        tipo: query.tipo,
        ubicacion: query.ubicacion,
    };
    let pagination = Pagination::from_query(query.page, query.per_page);

    let service = WorkshopService::new(state.store);
    Ok(ok(service.list(&filter, &pagination).await?))
}

/// Distinct locations used by workshop items
pub async fn list_workshop_locations(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<String>>>> {
    let service = WorkshopService::new(state.store);
    Ok(ok(service.locations().await?))
}

pub async fn create_workshop_item(
    State(state): State<AppState>,
    Json(input): Json<NewWorkshopItem>,
) -> AppResult<(StatusCode, Json<ApiResponse<WorkshopItem>>)> {
    let service = WorkshopService::new(state.store);
    let item = service.create(input).await?;
    Ok((StatusCode::CREATED, ok(item)))
}

pub async fn get_workshop_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WorkshopItem>>> {
    let service = WorkshopService::new(state.store);
    Ok(ok(service.get(id).await?))
}

pub async fn update_workshop_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<WorkshopItemPatch>,
) -> AppResult<Json<ApiResponse<WorkshopItem>>> {
    let service = WorkshopService::new(state.store)
        .with_max_attempts(state.config.store.transaction_max_attempts);
    Ok(ok(service.update(id, patch).await?))
}

pub async fn delete_workshop_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Deleted>>> {
    let service = WorkshopService::new(state.store);
    service.delete(id).await?;
    Ok(ok(Deleted { id }))
}
