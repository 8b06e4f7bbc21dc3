//! Health check, API documentation and fallback handlers.

use axum::{http::StatusCode, response::Json};
use utoipa::OpenApi;

use crate::{ApiDoc, errors::AppError};

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health check passed")
    )
)]
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// OpenAPI document describing this server.
pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}
