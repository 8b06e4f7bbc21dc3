//! Seeds the dashboard database with the placeholder dataset.
//!
//! Run with:
//! ```
//! cargo run -p seed-data --bin seed
//! ```

use std::sync::Arc;

use seed_data::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SeedConfig::from_env();

    let seeder = Seeder::new(
        Arc::new(PgConnector::new(&config.database_url)?),
        Arc::new(Dataset::placeholder()),
    );

    let report = seeder.seed_database().await?;

    tracing::info!("Seed completed!");
    tracing::info!("  Users: {}", report.users);
    tracing::info!("  Customers: {}", report.customers);
    tracing::info!("  Invoices: {}", report.invoices);
    tracing::info!("  Revenue: {}", report.revenue);

    Ok(())
}
