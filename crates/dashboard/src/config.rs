//! Server configuration read from the environment.

use seed_data::config::DEFAULT_DATABASE_URL;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database seeded by `GET /seed`.
    pub database_url: String,
    /// Port the HTTP server binds on all interfaces.
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Reads `DATABASE_URL` and `PORT`. Missing or unparsable values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            port: lookup("PORT")
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(defaults.port),
        }
    }
}
