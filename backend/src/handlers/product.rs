//! HTTP handlers for lubricentro product endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::filters::ProductFilter;
use shared::models::{NewProduct, Product, ProductPatch};
use shared::types::{PaginatedResponse, Pagination};
use uuid::Uuid;

use super::{ok, ApiResponse, Deleted};
use crate::error::AppResult;
use crate::services::ProductService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub categoria: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Product>>>> {
    let filter = ProductFilter {
        search: query.search,
        categoria: query.categoria,
    };
    let pagination = Pagination::from_query(query.page, query.per_page);

    let service = ProductService::new(state.store);
    Ok(ok(service.list(&filter, &pagination).await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<NewProduct>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let service = ProductService::new(state.store);
    let product = service.create(input).await?;
    Ok((StatusCode::CREATED, ok(product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let service = ProductService::new(state.store);
    Ok(ok(service.get(id).await?))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ProductPatch>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let service = ProductService::new(state.store)
        .with_max_attempts(state.config.store.transaction_max_attempts);
    Ok(ok(service.update(id, patch).await?))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Deleted>>> {
    let service = ProductService::new(state.store);
    service.delete(id).await?;
    Ok(ok(Deleted { id }))
}
