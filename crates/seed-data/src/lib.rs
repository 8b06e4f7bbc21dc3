//! Placeholder data and database seeding for the acme dashboard.
//!
//! This crate owns the fixed demo dataset (users, customers, invoices and
//! monthly revenue) and the [`Seeder`](db::Seeder) that loads it into
//! PostgreSQL. Seeding is idempotent: tables are created if absent and rows
//! whose key already exists are skipped, never replaced.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use seed_data::prelude::*;
//!
//! let seeder = Seeder::new(
//!     Arc::new(PgConnector::new(&database_url)?),
//!     Arc::new(Dataset::placeholder()),
//! );
//! let report = seeder.seed_database().await?;
//! ```

pub mod config;
pub mod dataset;
pub mod db;
pub mod models;
pub mod password;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::SeedConfig;
    pub use crate::dataset::Dataset;
    pub use crate::db::{
        Connector, MemoryConnector, PgConnector, SeedError, SeedReport, SeedStore, Seeder,
    };
    pub use crate::models::{Customer, HashedUser, Invoice, InvoiceStatus, Revenue, User};
    pub use crate::password::{hash_password, verify_password};
}
