//! Database seeding utilities.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use super::{Connector, SeedStore};
use crate::dataset::Dataset;
use crate::models::{HashedUser, User};
use crate::password::hash_password;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Password hashing failed: {0}")]
    Hash(String),
    #[error("Seeding task failed: {0}")]
    Task(String),
}

/// Rows inserted per table by one seeding run. Rows skipped on conflict are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub users: u64,
    pub customers: u64,
    pub invoices: u64,
    pub revenue: u64,
}

impl SeedReport {
    pub fn total(&self) -> u64 {
        self.users + self.customers + self.invoices + self.revenue
    }
}

/// Loads a [`Dataset`] into the store reached through a [`Connector`].
#[derive(Clone)]
pub struct Seeder {
    connector: Arc<dyn Connector>,
    dataset: Arc<Dataset>,
}

impl Seeder {
    pub fn new(connector: Arc<dyn Connector>, dataset: Arc<Dataset>) -> Self {
        Self { connector, dataset }
    }

    /// Opens a session, seeds all four tables concurrently and closes the session.
    ///
    /// The session is closed exactly once whether or not seeding succeeded. When
    /// several tables fail, the first error in users, customers, invoices,
    /// revenue order is returned.
    pub async fn seed_database(&self) -> Result<SeedReport, SeedError> {
        info!("Seeding database ({} records)...", self.dataset.len());

        let store = self.connector.connect().await?;
        let outcome = self.seed_tables(store.as_ref()).await;
        let closed = store.close().await;

        match outcome {
            Ok(report) => {
                closed?;
                info!(
                    users = report.users,
                    customers = report.customers,
                    invoices = report.invoices,
                    revenue = report.revenue,
                    "Seeded database"
                );
                Ok(report)
            }
            Err(e) => {
                error!("Error seeding database: {e}");
                if let Err(close_err) = closed {
                    warn!("Failed to close seeding session: {close_err}");
                }
                Err(e)
            }
        }
    }

    async fn seed_tables(&self, store: &dyn SeedStore) -> Result<SeedReport, SeedError> {
        let (users, customers, invoices, revenue) = tokio::join!(
            self.seed_users(store),
            self.seed_customers(store),
            self.seed_invoices(store),
            self.seed_revenue(store),
        );

        Ok(SeedReport {
            users: users?,
            customers: customers?,
            invoices: invoices?,
            revenue: revenue?,
        })
    }

    /// Hashes every password off the async runtime, then inserts the users.
    async fn seed_users(&self, store: &dyn SeedStore) -> Result<u64, SeedError> {
        info!("Seeding {} users...", self.dataset.users.len());

        let dataset = Arc::clone(&self.dataset);
        let users = tokio::task::spawn_blocking(move || hash_users(&dataset.users))
            .await
            .map_err(|e| SeedError::Task(e.to_string()))??;

        let inserted = store.seed_users(&users).await?;
        info!("Seeded {inserted}/{} users", users.len());
        Ok(inserted)
    }

    async fn seed_customers(&self, store: &dyn SeedStore) -> Result<u64, SeedError> {
        let customers = &self.dataset.customers;
        info!("Seeding {} customers...", customers.len());

        let inserted = store.seed_customers(customers).await?;
        info!("Seeded {inserted}/{} customers", customers.len());
        Ok(inserted)
    }

    async fn seed_invoices(&self, store: &dyn SeedStore) -> Result<u64, SeedError> {
        let invoices = &self.dataset.invoices;
        info!("Seeding {} invoices...", invoices.len());

        let inserted = store.seed_invoices(invoices).await?;
        info!("Seeded {inserted}/{} invoices", invoices.len());
        Ok(inserted)
    }

    async fn seed_revenue(&self, store: &dyn SeedStore) -> Result<u64, SeedError> {
        let revenue = &self.dataset.revenue;
        info!("Seeding {} revenue entries...", revenue.len());

        let inserted = store.seed_revenue(revenue).await?;
        info!("Seeded {inserted}/{} revenue entries", revenue.len());
        Ok(inserted)
    }
}

/// Replaces each user's plaintext password with its argon2 hash.
pub fn hash_users(users: &[User]) -> Result<Vec<HashedUser>, SeedError> {
    users
        .iter()
        .map(|user| {
            Ok(HashedUser {
                id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
                password_hash: hash_password(&user.password)?,
            })
        })
        .collect()
}
