//! Record types for the four seeded tables.

use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

/// A dashboard login. The password is plaintext here and hashed before storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// A user whose password has been replaced by its hash, ready for insertion.
#[derive(Debug, Clone)]
pub struct HashedUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Path or URL of the customer's avatar.
    pub image_url: String,
}

/// An invoice. The row id is generated by the database on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub customer_id: Uuid,
    /// Amount in cents.
    pub amount: i32,
    pub status: InvoiceStatus,
    pub date: Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    /// Label stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }
}

/// Revenue for one month, keyed by a short month label such as `Jan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revenue {
    pub month: String,
    pub revenue: i32,
}
