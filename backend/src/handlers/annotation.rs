//! HTTP handlers for annotation endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::filters::AnnotationFilter;
use shared::models::{Annotation, AnnotationPatch, NewAnnotation};
use shared::types::{DateRange, Pagination};
use uuid::Uuid;

use super::{ok, ApiResponse, Deleted};
use crate::error::{AppError, AppResult};
use crate::services::annotation::{AnnotationPage, Cancellation};
use crate::services::AnnotationService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AnnotationListQuery {
    pub search: Option<String>,
    pub tipo: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub inicio: NaiveDate,
    pub fin: NaiveDate,
}

fn service(state: &AppState) -> AnnotationService {
    AnnotationService::new(
        state.store.clone(),
        state.config.store.transaction_max_attempts,
    )
}

/// List annotations, newest first
pub async fn list_annotations(
    State(state): State<AppState>,
    Query(query): Query<AnnotationListQuery>,
) -> AppResult<Json<ApiResponse<AnnotationPage>>> {
    let filter = AnnotationFilter {
        search: query.search,
        tipo: query.tipo,
    };
    let pagination = Pagination::from_query(query.page, query.per_page);

    let page = service(&state).list(&filter, &pagination).await?;
    Ok(ok(page))
}

/// Annotations dated between `inicio` and `fin`, both included
pub async fn list_annotations_in_range(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<ApiResponse<Vec<Annotation>>>> {
    let range =
        DateRange::new(query.inicio, query.fin).map_err(|msg| AppError::validation("inicio", msg))?;
    let annotations = service(&state).list_in_range(&range).await?;
    Ok(ok(annotations))
}

/// Create an annotation; lubricentro sales debit stock
pub async fn create_annotation(
    State(state): State<AppState>,
    Json(input): Json<NewAnnotation>,
) -> AppResult<(StatusCode, Json<ApiResponse<Annotation>>)> {
    let annotation = service(&state).create(input).await?;
    Ok((StatusCode::CREATED, ok(annotation)))
}

pub async fn get_annotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Annotation>>> {
    let annotation = service(&state).get(id).await?;
    Ok(ok(annotation))
}

/// Partial update, stock is not re-adjusted
pub async fn update_annotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<AnnotationPatch>,
) -> AppResult<Json<ApiResponse<Annotation>>> {
    let annotation = service(&state).update(id, patch).await?;
    Ok(ok(annotation))
}

/// Delete without restoring stock
pub async fn delete_annotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Deleted>>> {
    service(&state).delete(id).await?;
    Ok(ok(Deleted { id }))
}

/// Delete and restore the stock the annotation debited
pub async fn cancel_annotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Cancellation>>> {
    let cancellation = service(&state).cancel(id).await?;
    Ok(ok(cancellation))
}
