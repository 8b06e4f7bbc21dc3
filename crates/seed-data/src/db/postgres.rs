//! PostgreSQL-backed seeding session.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use time::Date;
use tracing::debug;
use uuid::Uuid;

use super::{Connector, SeedError, SeedStore};
use crate::models::{Customer, HashedUser, Invoice, Revenue};

/// Session-level advisory lock held for a whole seeding run, so overlapping
/// runs against one database take turns.
const SEED_LOCK_KEY: i64 = 0x5EED_DA7A;

const CREATE_UUID_EXTENSION: &str = r#"CREATE EXTENSION IF NOT EXISTS "uuid-ossp""#;

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    )
"#;

const CREATE_CUSTOMERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS customers (
        id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL,
        image_url VARCHAR(255) NOT NULL
    )
"#;

const CREATE_INVOICES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS invoices (
        id UUID DEFAULT uuid_generate_v4() PRIMARY KEY,
        customer_id UUID NOT NULL,
        amount INT NOT NULL,
        status VARCHAR(255) NOT NULL,
        date DATE NOT NULL
    )
"#;

const CREATE_REVENUE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS revenue (
        month VARCHAR(4) NOT NULL UNIQUE,
        revenue INT NOT NULL
    )
"#;

/// Opens a dedicated single-connection session per seeding run.
#[derive(Debug, Clone)]
pub struct PgConnector {
    options: PgConnectOptions,
}

impl PgConnector {
    /// Parses a `postgres://` URL. Nothing is opened until [`Connector::connect`].
    pub fn new(database_url: &str) -> Result<Self, SeedError> {
        let options = PgConnectOptions::from_str(database_url).map_err(SeedError::Connect)?;
        Ok(Self::from_options(options))
    }

    pub fn from_options(options: PgConnectOptions) -> Self {
        Self { options }
    }

    /// `host:port/database` of the target, without credentials.
    pub fn target(&self) -> String {
        format!(
            "{}:{}/{}",
            self.options.get_host(),
            self.options.get_port(),
            self.options.get_database().unwrap_or_default()
        )
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self) -> Result<Box<dyn SeedStore>, SeedError> {
        // One connection: all four table loads share it and the driver queues their statements.
        // It must outlive the run because it holds the advisory lock.
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(self.options.clone())
            .await
            .map_err(SeedError::Connect)?;

        let locked = sqlx::query("SELECT pg_advisory_lock($1)")
            .bind(SEED_LOCK_KEY)
            .execute(&pool)
            .await;
        if let Err(e) = locked {
            pool.close().await;
            return Err(SeedError::Connect(e));
        }

        debug!("Opened seeding session");
        Ok(Box::new(PgSeedStore::new(pool)))
    }
}

/// Seeding session over a [`PgPool`].
pub struct PgSeedStore {
    pool: PgPool,
}

impl PgSeedStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn execute(&self, statement: &str) -> Result<(), SeedError> {
        sqlx::query(statement).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SeedStore for PgSeedStore {
    async fn seed_users(&self, users: &[HashedUser]) -> Result<u64, SeedError> {
        self.execute(CREATE_UUID_EXTENSION).await?;
        self.execute(CREATE_USERS_TABLE).await?;

        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
        let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
        let emails: Vec<&str> = users.iter().map(|u| u.email.as_str()).collect();
        let hashes: Vec<&str> = users.iter().map(|u| u.password_hash.as_str()).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password)
            SELECT * FROM UNNEST($1::uuid[], $2::text[], $3::text[], $4::text[])
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&ids)
        .bind(&names)
        .bind(&emails)
        .bind(&hashes)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn seed_customers(&self, customers: &[Customer]) -> Result<u64, SeedError> {
        self.execute(CREATE_UUID_EXTENSION).await?;
        self.execute(CREATE_CUSTOMERS_TABLE).await?;

        let ids: Vec<Uuid> = customers.iter().map(|c| c.id).collect();
        let names: Vec<&str> = customers.iter().map(|c| c.name.as_str()).collect();
        let emails: Vec<&str> = customers.iter().map(|c| c.email.as_str()).collect();
        let images: Vec<&str> = customers.iter().map(|c| c.image_url.as_str()).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, image_url)
            SELECT * FROM UNNEST($1::uuid[], $2::text[], $3::text[], $4::text[])
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&ids)
        .bind(&names)
        .bind(&emails)
        .bind(&images)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn seed_invoices(&self, invoices: &[Invoice]) -> Result<u64, SeedError> {
        self.execute(CREATE_UUID_EXTENSION).await?;
        self.execute(CREATE_INVOICES_TABLE).await?;

        let customer_ids: Vec<Uuid> = invoices.iter().map(|i| i.customer_id).collect();
        let amounts: Vec<i32> = invoices.iter().map(|i| i.amount).collect();
        let statuses: Vec<&str> = invoices.iter().map(|i| i.status.as_str()).collect();
        let dates: Vec<Date> = invoices.iter().map(|i| i.date).collect();

        // Ids are generated by the database, so an identical existing row counts as the conflict.
        let result = sqlx::query(
            r#"
            INSERT INTO invoices (customer_id, amount, status, date)
            SELECT i.customer_id, i.amount, i.status, i.date
            FROM UNNEST($1::uuid[], $2::int4[], $3::text[], $4::date[])
                AS i(customer_id, amount, status, date)
            WHERE NOT EXISTS (
                SELECT 1 FROM invoices e
                WHERE e.customer_id = i.customer_id
                  AND e.amount = i.amount
                  AND e.status = i.status
                  AND e.date = i.date
            )
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&customer_ids)
        .bind(&amounts)
        .bind(&statuses)
        .bind(&dates)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn seed_revenue(&self, revenue: &[Revenue]) -> Result<u64, SeedError> {
        self.execute(CREATE_REVENUE_TABLE).await?;

        let months: Vec<&str> = revenue.iter().map(|r| r.month.as_str()).collect();
        let amounts: Vec<i32> = revenue.iter().map(|r| r.revenue).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO revenue (month, revenue)
            SELECT * FROM UNNEST($1::text[], $2::int4[])
            ON CONFLICT (month) DO NOTHING
            "#,
        )
        .bind(&months)
        .bind(&amounts)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn close(&self) -> Result<(), SeedError> {
        let unlocked = sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(SEED_LOCK_KEY)
            .execute(&self.pool)
            .await;
        // Closing the connection drops the lock even when the unlock failed.
        self.pool.close().await;
        unlocked?;
        debug!("Closed seeding session");
        Ok(())
    }
}
