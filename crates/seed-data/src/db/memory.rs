//! In-process store with the same conflict rules and column limits as the
//! PostgreSQL schema. Violations surface as [`SeedError::Database`], like the
//! server's own errors.
//!
//! Useful for running the dashboard without a database and for exercising
//! the seeding flow in tests. Sessions can be made to fail on demand to
//! simulate a lost connection.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use super::{Connector, SeedError, SeedStore};
use crate::models::{Customer, HashedUser, Invoice, Revenue};

#[derive(Debug, Default)]
struct Tables {
    created: BTreeSet<&'static str>,
    users: BTreeMap<Uuid, HashedUser>,
    customers: BTreeMap<Uuid, Customer>,
    invoices: Vec<(Uuid, Invoice)>,
    revenue: BTreeMap<String, i32>,
}

#[derive(Debug, Default)]
struct Shared {
    tables: Mutex<Tables>,
    disconnected: AtomicBool,
    connects: AtomicUsize,
    closes: AtomicUsize,
}

/// Read-only copy of the in-memory tables.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshot {
    pub tables: BTreeSet<&'static str>,
    pub users: Vec<HashedUser>,
    pub customers: Vec<Customer>,
    pub invoices: Vec<Invoice>,
    pub revenue: BTreeMap<String, i32>,
}

/// Connector for an in-memory database shared by every session it opens.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    shared: Arc<Shared>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every connect and statement fails as if the server went away.
    pub fn set_disconnected(&self, disconnected: bool) {
        self.shared
            .disconnected
            .store(disconnected, Ordering::SeqCst);
    }

    /// Number of sessions opened so far.
    pub fn connect_count(&self) -> usize {
        self.shared.connects.load(Ordering::SeqCst)
    }

    /// Number of sessions closed so far.
    pub fn close_count(&self) -> usize {
        self.shared.closes.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        let tables = lock(&self.shared.tables);
        MemorySnapshot {
            tables: tables.created.clone(),
            users: tables.users.values().cloned().collect(),
            customers: tables.customers.values().cloned().collect(),
            invoices: tables.invoices.iter().map(|(_, i)| i.clone()).collect(),
            revenue: tables.revenue.clone(),
        }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> Result<Box<dyn SeedStore>, SeedError> {
        if self.shared.disconnected.load(Ordering::SeqCst) {
            return Err(SeedError::Connect(sqlx::Error::PoolClosed));
        }
        self.shared.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            shared: Arc::clone(&self.shared),
            closed: AtomicBool::new(false),
        }))
    }
}

struct MemorySession {
    shared: Arc<Shared>,
    closed: AtomicBool,
}

impl MemorySession {
    /// Fails when the session or the whole database is unavailable, otherwise
    /// marks `table` as created and returns the locked tables.
    fn open_table(&self, table: &'static str) -> Result<MutexGuard<'_, Tables>, SeedError> {
        if self.closed.load(Ordering::SeqCst) || self.shared.disconnected.load(Ordering::SeqCst) {
            return Err(SeedError::Database(sqlx::Error::PoolClosed));
        }
        let mut tables = lock(&self.shared.tables);
        tables.created.insert(table);
        Ok(tables)
    }
}

fn lock(tables: &Mutex<Tables>) -> MutexGuard<'_, Tables> {
    tables.lock().unwrap_or_else(PoisonError::into_inner)
}

fn rejected(message: String) -> SeedError {
    SeedError::Database(sqlx::Error::Protocol(message))
}

/// `VARCHAR(limit)` counts characters, not bytes.
fn check_varchar(value: &str, limit: usize) -> Result<(), SeedError> {
    if value.chars().count() > limit {
        return Err(rejected(format!(
            "value too long for type character varying({limit})"
        )));
    }
    Ok(())
}

#[async_trait]
impl SeedStore for MemorySession {
    async fn seed_users(&self, users: &[HashedUser]) -> Result<u64, SeedError> {
        let mut tables = self.open_table("users")?;

        // Validate the whole batch first so a failing statement inserts nothing.
        let mut pending: BTreeMap<Uuid, &HashedUser> = BTreeMap::new();
        for user in users {
            check_varchar(&user.name, 255)?;
            if tables.users.contains_key(&user.id) || pending.contains_key(&user.id) {
                continue;
            }
            let email_taken = tables.users.values().any(|u| u.email == user.email)
                || pending.values().any(|u| u.email == user.email);
            if email_taken {
                return Err(rejected(format!(
                    "duplicate key value violates unique constraint \"users_email_key\": {}",
                    user.email
                )));
            }
            pending.insert(user.id, user);
        }

        let inserted = pending.len() as u64;
        for (id, user) in pending {
            tables.users.insert(id, user.clone());
        }
        Ok(inserted)
    }

    async fn seed_customers(&self, customers: &[Customer]) -> Result<u64, SeedError> {
        let mut tables = self.open_table("customers")?;

        for customer in customers {
            check_varchar(&customer.name, 255)?;
            check_varchar(&customer.email, 255)?;
            check_varchar(&customer.image_url, 255)?;
        }

        let mut inserted = 0;
        for customer in customers {
            if !tables.customers.contains_key(&customer.id) {
                tables.customers.insert(customer.id, customer.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn seed_invoices(&self, invoices: &[Invoice]) -> Result<u64, SeedError> {
        let mut tables = self.open_table("invoices")?;

        for invoice in invoices {
            check_varchar(invoice.status.as_str(), 255)?;
        }

        let is_same = |a: &Invoice, b: &Invoice| {
            a.customer_id == b.customer_id
                && a.amount == b.amount
                && a.status == b.status
                && a.date == b.date
        };

        // Duplicates are checked against rows that existed before this batch.
        let fresh: Vec<Invoice> = invoices
            .iter()
            .filter(|new| !tables.invoices.iter().any(|(_, old)| is_same(old, new)))
            .cloned()
            .collect();

        let inserted = fresh.len() as u64;
        tables
            .invoices
            .extend(fresh.into_iter().map(|invoice| (Uuid::new_v4(), invoice)));
        Ok(inserted)
    }

    async fn seed_revenue(&self, revenue: &[Revenue]) -> Result<u64, SeedError> {
        let mut tables = self.open_table("revenue")?;

        for entry in revenue {
            check_varchar(&entry.month, 4)?;
        }

        let mut inserted = 0;
        for entry in revenue {
            if !tables.revenue.contains_key(&entry.month) {
                tables.revenue.insert(entry.month.clone(), entry.revenue);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn close(&self) -> Result<(), SeedError> {
        self.closed.store(true, Ordering::SeqCst);
        self.shared.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::models::InvoiceStatus;

    fn hashed(id: Uuid, email: &str) -> HashedUser {
        HashedUser {
            id,
            name: "User".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn test_users_skip_existing_id() {
        let connector = MemoryConnector::new();
        let session = connector.connect().await.unwrap();
        let id = Uuid::new_v4();

        assert_eq!(session.seed_users(&[hashed(id, "a@x.com")]).await.unwrap(), 1);
        assert_eq!(session.seed_users(&[hashed(id, "b@x.com")]).await.unwrap(), 0);

        let snapshot = connector.snapshot();
        assert_eq!(snapshot.users.len(), 1);
        assert_eq!(snapshot.users[0].email, "a@x.com");
    }

    #[tokio::test]
    async fn test_users_duplicate_email_is_an_error() {
        let connector = MemoryConnector::new();
        let session = connector.connect().await.unwrap();

        session
            .seed_users(&[hashed(Uuid::new_v4(), "a@x.com")])
            .await
            .unwrap();
        let result = session
            .seed_users(&[hashed(Uuid::new_v4(), "c@x.com"), hashed(Uuid::new_v4(), "a@x.com")])
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, SeedError::Database(_)));
        assert!(err.to_string().contains("users_email_key"));
        assert_eq!(connector.snapshot().users.len(), 1);
    }

    #[tokio::test]
    async fn test_revenue_month_longer_than_four_chars_is_rejected() {
        let connector = MemoryConnector::new();
        let session = connector.connect().await.unwrap();
        let month = |month: &str| Revenue {
            month: month.to_string(),
            revenue: 100,
        };

        let result = session.seed_revenue(&[month("Jan"), month("Janu.")]).await;

        let err = result.unwrap_err();
        assert!(matches!(err, SeedError::Database(_)));
        assert!(err.to_string().contains("character varying(4)"));
        assert!(connector.snapshot().revenue.is_empty());
        assert_eq!(session.seed_revenue(&[month("Juni")]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_customer_fields_longer_than_255_chars_are_rejected() {
        let connector = MemoryConnector::new();
        let session = connector.connect().await.unwrap();
        let customer = Customer {
            id: Uuid::new_v4(),
            name: "é".repeat(255),
            email: "a@x.com".to_string(),
            image_url: "/customers/a.png".to_string(),
        };
        let too_long = Customer {
            id: Uuid::new_v4(),
            image_url: format!("/{}", "x".repeat(255)),
            ..customer.clone()
        };

        assert!(matches!(
            session.seed_customers(&[customer.clone(), too_long]).await,
            Err(SeedError::Database(_))
        ));
        assert!(connector.snapshot().customers.is_empty());
        assert_eq!(session.seed_customers(&[customer]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_user_name_longer_than_255_chars_is_rejected() {
        let connector = MemoryConnector::new();
        let session = connector.connect().await.unwrap();
        let user = HashedUser {
            name: "n".repeat(256),
            ..hashed(Uuid::new_v4(), "a@x.com")
        };

        assert!(session.seed_users(&[user]).await.is_err());
        assert!(connector.snapshot().users.is_empty());
    }

    #[tokio::test]
    async fn test_revenue_is_not_overwritten() {
        let connector = MemoryConnector::new();
        let session = connector.connect().await.unwrap();
        let jan = |revenue| Revenue {
            month: "Jan".to_string(),
            revenue,
        };

        assert_eq!(session.seed_revenue(&[jan(1000)]).await.unwrap(), 1);
        assert_eq!(session.seed_revenue(&[jan(2000)]).await.unwrap(), 0);
        assert_eq!(connector.snapshot().revenue.get("Jan"), Some(&1000));
    }

    #[tokio::test]
    async fn test_identical_invoices_are_inserted_once() {
        let connector = MemoryConnector::new();
        let session = connector.connect().await.unwrap();
        let invoice = Invoice {
            customer_id: Uuid::new_v4(),
            amount: 666,
            status: InvoiceStatus::Pending,
            date: date!(2023 - 06 - 27),
        };

        assert_eq!(session.seed_invoices(&[invoice.clone()]).await.unwrap(), 1);
        assert_eq!(session.seed_invoices(&[invoice]).await.unwrap(), 0);
        assert_eq!(connector.snapshot().invoices.len(), 1);
    }

    #[tokio::test]
    async fn test_closed_session_rejects_statements() {
        let connector = MemoryConnector::new();
        let session = connector.connect().await.unwrap();
        session.close().await.unwrap();

        assert!(session.seed_customers(&[]).await.is_err());
        assert_eq!(connector.close_count(), 1);
    }

    #[tokio::test]
    async fn test_disconnected_refuses_sessions() {
        let connector = MemoryConnector::new();
        connector.set_disconnected(true);

        assert!(matches!(
            connector.connect().await,
            Err(SeedError::Connect(_))
        ));
        assert_eq!(connector.connect_count(), 0);
    }
}
