//! Database integration for seeding the dashboard tables.
//!
//! The [`Seeder`] opens one session through a [`Connector`], loads the four
//! tables concurrently and always closes the session before returning.
//! [`PgConnector`] talks to PostgreSQL; [`MemoryConnector`] keeps rows in
//! process with the same ignore-on-conflict rules.

mod memory;
mod postgres;
mod seeder;
mod store;

pub use memory::{MemoryConnector, MemorySnapshot};
pub use postgres::{PgConnector, PgSeedStore};
pub use seeder::{SeedError, SeedReport, Seeder, hash_users};
pub use store::{Connector, SeedStore};
