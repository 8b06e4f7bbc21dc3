pub mod config;
pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::{
    Extension, Router,
    http::{HeaderName, HeaderValue, Method, header},
    routing::get,
};
use seed_data::{
    dataset::Dataset,
    db::{PgConnector, Seeder},
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use crate::{
    config::Config,
    errors::ErrorResponse,
    handlers::{SeedResponse, health_check, not_found, openapi, seed_database},
};

#[derive(OpenApi)]
#[openapi(
    paths(handlers::health_check, handlers::seed_database),
    components(schemas(SeedResponse, ErrorResponse)),
    tags(
        (name = "seed", description = "Placeholder data loading"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

pub fn create_router(seeder: Seeder) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/seed", get(seed_database))
        .route("/api-docs/openapi.json", get(openapi))
        .fallback(not_found)
        .layer(Extension(seeder))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let connector = PgConnector::new(&config.database_url)?;
    tracing::info!("Seeding target database at {}", connector.target());
    let seeder = Seeder::new(Arc::new(connector), Arc::new(Dataset::placeholder()));
    let app = create_router(seeder);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;

    tracing::info!("Server running on http://0.0.0.0:{}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
