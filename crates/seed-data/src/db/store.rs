use async_trait::async_trait;

use super::SeedError;
use crate::models::{Customer, HashedUser, Invoice, Revenue};

/// One open session against the backing store.
///
/// Every `seed_*` call creates its table if needed and then inserts the given
/// rows, skipping rows whose key is already present. The return value is the
/// number of rows actually inserted.
#[async_trait]
pub trait SeedStore: Send + Sync {
    async fn seed_users(&self, users: &[HashedUser]) -> Result<u64, SeedError>;

    async fn seed_customers(&self, customers: &[Customer]) -> Result<u64, SeedError>;

    async fn seed_invoices(&self, invoices: &[Invoice]) -> Result<u64, SeedError>;

    async fn seed_revenue(&self, revenue: &[Revenue]) -> Result<u64, SeedError>;

    /// Releases the session. Called exactly once per session.
    async fn close(&self) -> Result<(), SeedError>;
}

/// Opens [`SeedStore`] sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn SeedStore>, SeedError>;
}
