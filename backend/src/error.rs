//! Error handling for the GTM administration server
//!
//! Every failure reaches the client as `{"success": false, "error", "code"}`
//! with messages in Spanish, the language of the shop.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::decode::DecodeError;
use thiserror::Error;

use crate::store::StoreError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("Stock insuficiente para \"{product}\". Disponible: {available}, solicitado: {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    // Validation errors
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("Datos inválidos: {0}")]
    ValidationError(String),

    // Stored data that does not match its schema
    #[error("Datos almacenados inválidos: {0}")]
    Decode(#[from] DecodeError),

    // Storage errors, including exhausted transaction retries
    #[error("Error de almacenamiento: {0}")]
    Store(#[from] StoreError),

    // Internal errors
    #[error("Error interno: {0}")]
    Internal(String),

    #[error("Error interno del servidor")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::InsufficientStock { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_STOCK")
            }
            AppError::Validation { .. } | AppError::ValidationError(_) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            AppError::Decode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DECODE_ERROR"),
            AppError::Store(StoreError::Unavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORE_ERROR")
            }
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            AppError::Internal(_) | AppError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Log the error for debugging
        tracing::error!(code, "Error: {:?}", self);

        let field = match &self {
            AppError::Validation { field, .. } => Some(field.clone()),
            _ => None,
        };

        // Internal details stay in the log
        let error = match &self {
            AppError::InternalError(_) => "Error interno del servidor".to_string(),
            other => other.to_string(),
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error,
                code,
                field,
            }),
        )
            .into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
