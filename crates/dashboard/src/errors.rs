use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use seed_data::db::SeedError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error("Not found")]
    NotFound,
}

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Seed(e) => {
                error!("Seed error: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
