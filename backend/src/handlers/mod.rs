//! HTTP handlers
//!
//! Every successful response is wrapped as `{"success": true, "data": ...}`;
//! failures are rendered by `AppError`.

use axum::Json;
use serde::Serialize;
use uuid::Uuid;

pub mod annotation;
pub mod health;
pub mod product;
pub mod reporting;
pub mod tool;
pub mod workshop;

pub use annotation::*;
pub use health::*;
pub use product::*;
pub use reporting::*;
pub use tool::*;
pub use workshop::*;

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

/// Body returned by delete endpoints
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: Uuid,
}
