//! HTTP handlers for tool endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::filters::ToolFilter;
use shared::models::{NewTool, Tool, ToolPatch};
use shared::types::{PaginatedResponse, Pagination};
use uuid::Uuid;

use super::{ok, ApiResponse, Deleted};
use crate::error::AppResult;
use crate::services::ToolService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ToolListQuery {
    pub search: Option<String>,
    pub categoria: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn list_tools(
    State(state): State<AppState>,
    Query(query): Query<ToolListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Tool>>>> {
    let filter = ToolFilter {
        search: query.search,
        categoria: query.categoria,
    };
    let pagination = Pagination::from_query(query.page, query.per_page);

    let service = ToolService::new(state.store);
    Ok(ok(service.list(&filter, &pagination).await?))
}

pub async fn create_tool(
    State(state): State<AppState>,
    Json(input): Json<NewTool>,
) -> AppResult<(StatusCode, Json<ApiResponse<Tool>>)> {
    let service = ToolService::new(state.store);
    let tool = service.create(input).await?;
    Ok((StatusCode::CREATED, ok(tool)))
}

pub async fn get_tool(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Tool>>> {
    let service = ToolService::new(state.store);
    Ok(ok(service.get(id).await?))
}

pub async fn update_tool(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ToolPatch>,
) -> AppResult<Json<ApiResponse<Tool>>> {
    let service = ToolService::new(state.store)
        .with_max_attempts(state.config.store.transaction_max_attempts);
    Ok(ok(service.update(id, patch).await?))
}

pub async fn delete_tool(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Deleted>>> {
    let service = ToolService::new(state.store);
    service.delete(id).await?;
    Ok(ok(Deleted { id }))
}
