//! Integration tests for seeding a real PostgreSQL database.
//!
//! These tests verify:
//! - Seeding twice leaves the same row counts
//! - Stored passwords are hashed and verify against the plaintext
//! - Existing revenue is never overwritten
//! - Every table is created even when its dataset is empty
//! - Overlapping seeding runs do not duplicate invoices
//!
//! To run these tests, you need a PostgreSQL database and the
//! DATABASE_URL environment variable set.
//!
//! Run with: `DATABASE_URL=postgres://... cargo nextest run -p seed-data seed_database`
//!
//! Note: each test works inside its own freshly created schema and drops it
//! afterwards, so they can safely run against a development database.

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use seed_data::prelude::*;
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use uuid::Uuid;

/// A throwaway schema plus a connector whose sessions resolve tables inside it.
struct TestSchema {
    admin: PgPool,
    name: String,
    connector: PgConnector,
}

impl TestSchema {
    /// Creates the schema, skipping tests if DATABASE_URL is not set or unreachable.
    async fn create() -> Option<Self> {
        let database_url = match env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("Skipping test: DATABASE_URL not set");
                return None;
            }
        };

        let admin = match PgPoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await
        {
            Ok(pool) => pool,
            Err(e) => {
                eprintln!("Skipping test: Failed to connect to database: {e}");
                return None;
            }
        };

        // Keep uuid_generate_v4() reachable from every test schema; a concurrent creator may win.
        let _ = sqlx::query(r#"CREATE EXTENSION IF NOT EXISTS "uuid-ossp" SCHEMA public"#)
            .execute(&admin)
            .await;

        let name = format!("seed_test_{}", Uuid::new_v4().simple());
        sqlx::query(&format!("CREATE SCHEMA {name}"))
            .execute(&admin)
            .await
            .expect("Failed to create test schema");

        let options = PgConnectOptions::from_str(&database_url)
            .expect("Invalid DATABASE_URL")
            .options([("search_path", format!("{name},public"))]);

        Some(Self {
            admin,
            name,
            connector: PgConnector::from_options(options),
        })
    }

    fn seeder(&self, dataset: Dataset) -> Seeder {
        Seeder::new(Arc::new(self.connector.clone()), Arc::new(dataset))
    }

    async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}.{table}", self.name))
            .fetch_one(&self.admin)
            .await
            .expect("Failed to count rows")
    }

    async fn cleanup(self) {
        let _ = sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.name))
            .execute(&self.admin)
            .await;
    }
}

#[tokio::test]
async fn test_seed_twice_keeps_row_counts() {
    let Some(schema) = TestSchema::create().await else {
        return;
    };
    let seeder = schema.seeder(Dataset::placeholder());

    let first = seeder.seed_database().await.expect("First seed failed");
    let counts = [
        schema.count("users").await,
        schema.count("customers").await,
        schema.count("invoices").await,
        schema.count("revenue").await,
    ];

    let second = seeder.seed_database().await.expect("Second seed failed");
    let recounts = [
        schema.count("users").await,
        schema.count("customers").await,
        schema.count("invoices").await,
        schema.count("revenue").await,
    ];

    assert_eq!(first.total(), 32);
    assert_eq!(counts, [1, 6, 13, 12]);
    assert_eq!(second, SeedReport::default());
    assert_eq!(recounts, counts);

    schema.cleanup().await;
}

#[tokio::test]
async fn test_seeded_passwords_verify() {
    let Some(schema) = TestSchema::create().await else {
        return;
    };
    let dataset = Dataset::placeholder();
    schema
        .seeder(dataset.clone())
        .seed_database()
        .await
        .expect("Seed failed");

    let rows: Vec<(Uuid, String)> =
        sqlx::query_as(&format!("SELECT id, password FROM {}.users", schema.name))
            .fetch_all(&schema.admin)
            .await
            .expect("Failed to load users");

    assert_eq!(rows.len(), dataset.users.len());
    for user in &dataset.users {
        let (_, stored) = rows
            .iter()
            .find(|(id, _)| *id == user.id)
            .expect("Seeded user missing");
        assert_ne!(stored, &user.password);
        assert!(verify_password(&user.password, stored).unwrap());
    }

    schema.cleanup().await;
}

#[tokio::test]
async fn test_revenue_is_not_overwritten() {
    let Some(schema) = TestSchema::create().await else {
        return;
    };
    let january = |revenue| Dataset {
        revenue: vec![Revenue {
            month: "Jan".to_string(),
            revenue,
        }],
        ..Default::default()
    };

    schema.seeder(january(1000)).seed_database().await.unwrap();
    let report = schema.seeder(january(2000)).seed_database().await.unwrap();

    let stored: i32 = sqlx::query_scalar(&format!(
        "SELECT revenue FROM {}.revenue WHERE month = 'Jan'",
        schema.name
    ))
    .fetch_one(&schema.admin)
    .await
    .unwrap();

    assert_eq!(report.revenue, 0);
    assert_eq!(stored, 1000);

    schema.cleanup().await;
}

#[tokio::test]
async fn test_customers_only_creates_every_table() {
    let Some(schema) = TestSchema::create().await else {
        return;
    };
    let dataset = Dataset {
        customers: Dataset::placeholder().customers,
        ..Default::default()
    };

    let report = schema.seeder(dataset).seed_database().await.unwrap();

    let mut tables: Vec<String> = sqlx::query_scalar(
        "SELECT table_name::text FROM information_schema.tables WHERE table_schema = $1",
    )
    .bind(&schema.name)
    .fetch_all(&schema.admin)
    .await
    .unwrap();
    tables.sort();

    assert_eq!(report.customers, 6);
    assert_eq!(tables, ["customers", "invoices", "revenue", "users"]);
    assert_eq!(schema.count("customers").await, 6);
    assert_eq!(schema.count("users").await, 0);
    assert_eq!(schema.count("invoices").await, 0);
    assert_eq!(schema.count("revenue").await, 0);

    schema.cleanup().await;
}

#[tokio::test]
async fn test_concurrent_seeds_do_not_duplicate_invoices() {
    let Some(schema) = TestSchema::create().await else {
        return;
    };
    let first = schema.seeder(Dataset::placeholder());
    let second = schema.seeder(Dataset::placeholder());

    let (a, b) = tokio::join!(first.seed_database(), second.seed_database());
    let a = a.expect("First concurrent seed failed");
    let b = b.expect("Second concurrent seed failed");

    assert_eq!(a.invoices + b.invoices, 13);
    assert_eq!(a.total() + b.total(), 32);
    assert_eq!(schema.count("invoices").await, 13);
    assert_eq!(schema.count("users").await, 1);
    assert_eq!(schema.count("customers").await, 6);
    assert_eq!(schema.count("revenue").await, 12);

    schema.cleanup().await;
}
