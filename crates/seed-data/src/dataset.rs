//! The fixed dataset loaded into a fresh dashboard database.

use time::{Date, macros::date};
use uuid::{Uuid, uuid};

use crate::models::{Customer, Invoice, InvoiceStatus, Revenue, User};

/// Records handed to the seeder. Each vector is seeded into its own table.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub users: Vec<User>,
    pub customers: Vec<Customer>,
    pub invoices: Vec<Invoice>,
    pub revenue: Vec<Revenue>,
}

const EVIL_RABBIT: Uuid = uuid!("d6e15727-9fe1-4961-8c5b-ea44a9bd81aa");
const DELBA_DE_OLIVEIRA: Uuid = uuid!("3958dc9e-712f-4377-85e9-fec4b6a6442a");
const LEE_ROBINSON: Uuid = uuid!("3958dc9e-742f-4377-85e9-fec4b6a6442a");
const MICHAEL_NOVOTNY: Uuid = uuid!("76d65c26-f784-44a2-ac19-586678f7c2f2");
const AMY_BURNS: Uuid = uuid!("cc27c14a-0acf-4f4a-a6c9-d45682c144b9");
const BALAZS_ORBAN: Uuid = uuid!("13d07535-c59e-4157-a011-f8d2ef4e0cbb");

impl Dataset {
    /// The demo dataset: one login, six customers, their invoices and a year of revenue.
    pub fn placeholder() -> Self {
        Self {
            users: placeholder_users(),
            customers: placeholder_customers(),
            invoices: placeholder_invoices(),
            revenue: placeholder_revenue(),
        }
    }

    /// Total number of records across all four tables.
    pub fn len(&self) -> usize {
        self.users.len() + self.customers.len() + self.invoices.len() + self.revenue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn placeholder_users() -> Vec<User> {
    vec![User {
        id: uuid!("410544b2-4001-4271-9855-fec4b6a6442a"),
        name: "User".to_string(),
        email: "user@nextmail.com".to_string(),
        password: "123456".to_string(),
    }]
}

fn placeholder_customers() -> Vec<Customer> {
    [
        (EVIL_RABBIT, "Evil Rabbit", "evil@rabbit.com", "evil-rabbit"),
        (
            DELBA_DE_OLIVEIRA,
            "Delba de Oliveira",
            "delba@oliveira.com",
            "delba-de-oliveira",
        ),
        (LEE_ROBINSON, "Lee Robinson", "lee@robinson.com", "lee-robinson"),
        (
            MICHAEL_NOVOTNY,
            "Michael Novotny",
            "michael@novotny.com",
            "michael-novotny",
        ),
        (AMY_BURNS, "Amy Burns", "amy@burns.com", "amy-burns"),
        (BALAZS_ORBAN, "Balazs Orban", "balazs@orban.com", "balazs-orban"),
    ]
    .into_iter()
    .map(|(id, name, email, slug)| Customer {
        id,
        name: name.to_string(),
        email: email.to_string(),
        image_url: format!("/customers/{slug}.png"),
    })
    .collect()
}

fn placeholder_invoices() -> Vec<Invoice> {
    use InvoiceStatus::{Paid, Pending};

    let rows: [(Uuid, i32, InvoiceStatus, Date); 13] = [
        (EVIL_RABBIT, 15795, Pending, date!(2022 - 12 - 06)),
        (DELBA_DE_OLIVEIRA, 20348, Pending, date!(2022 - 11 - 14)),
        (AMY_BURNS, 3040, Paid, date!(2022 - 10 - 29)),
        (MICHAEL_NOVOTNY, 44800, Paid, date!(2023 - 09 - 10)),
        (BALAZS_ORBAN, 34577, Pending, date!(2023 - 08 - 05)),
        (LEE_ROBINSON, 54246, Pending, date!(2023 - 07 - 16)),
        (EVIL_RABBIT, 666, Pending, date!(2023 - 06 - 27)),
        (MICHAEL_NOVOTNY, 32545, Paid, date!(2023 - 06 - 09)),
        (AMY_BURNS, 1250, Paid, date!(2023 - 06 - 17)),
        (BALAZS_ORBAN, 8546, Paid, date!(2023 - 06 - 07)),
        (DELBA_DE_OLIVEIRA, 500, Paid, date!(2023 - 08 - 19)),
        (BALAZS_ORBAN, 8945, Paid, date!(2023 - 06 - 03)),
        (LEE_ROBINSON, 1000, Paid, date!(2022 - 06 - 05)),
    ];

    rows.into_iter()
        .map(|(customer_id, amount, status, date)| Invoice {
            customer_id,
            amount,
            status,
            date,
        })
        .collect()
}

fn placeholder_revenue() -> Vec<Revenue> {
    [
        ("Jan", 2000),
        ("Feb", 1800),
        ("Mar", 2200),
        ("Apr", 2500),
        ("May", 2300),
        ("Jun", 3200),
        ("Jul", 3500),
        ("Aug", 3700),
        ("Sep", 2500),
        ("Oct", 2800),
        ("Nov", 3000),
        ("Dec", 4800),
    ]
    .into_iter()
    .map(|(month, revenue)| Revenue {
        month: month.to_string(),
        revenue,
    })
    .collect()
}
