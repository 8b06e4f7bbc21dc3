//! Database seeding handler.

use axum::{Extension, response::Json};
use seed_data::db::Seeder;
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::{AppError, ErrorResponse};

#[derive(Debug, Serialize, ToSchema)]
pub struct SeedResponse {
    pub message: String,
}

/// Create the dashboard tables if needed and load the placeholder data.
///
/// Rows that already exist are left untouched, so calling this repeatedly is safe.
#[utoipa::path(
    get,
    path = "/seed",
    tag = "seed",
    responses(
        (status = 200, description = "Database seeded", body = SeedResponse),
        (status = 500, description = "Seeding failed", body = ErrorResponse)
    )
)]
pub async fn seed_database(
    Extension(seeder): Extension<Seeder>,
) -> Result<Json<SeedResponse>, AppError> {
    seeder.seed_database().await?;
    Ok(Json(SeedResponse {
        message: "Database seeded successfully".to_string(),
    }))
}
