//! Store configuration
//!
//! One value matters here: the connection URL. It is read once at startup
//! (from `DATABASE_URL`, after loading a `.env` file if present) and passed
//! explicitly into [`StoreConn::connect`](crate::StoreConn::connect) rather
//! than living in global state.

use anyhow::{anyhow, Result};
use config::Config;

/// Fallback connection URL: an embedded store at a fixed relative path.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:///data/perfumes.db";

/// Configuration for opening the perfume store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Connection URL. `sqlite:///<path>` (or a bare path) selects the
    /// embedded backend; any URL containing `postgres` selects the
    /// client/server backend.
    pub database_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            database_url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

impl StoreConfig {
    /// Build a configuration from an explicit URL.
    ///
    /// An empty URL falls back to [`DEFAULT_DATABASE_URL`].
    pub fn new(database_url: &str) -> StoreConfig {
        if database_url.is_empty() {
            StoreConfig::default()
        } else {
            StoreConfig {
                database_url: database_url.to_string(),
            }
        }
    }

    /// Load the configuration from the environment.
    ///
    /// Reads `DATABASE_URL`, honoring a `.env` file in the working directory.
    /// Falls back to the embedded store at `data/perfumes.db` when unset.
    pub fn from_env() -> Result<StoreConfig> {
        dotenvy::dotenv().ok();

        let settings = Config::builder()
            .add_source(config::Environment::default())
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let database_url = settings
            .get_string("database_url")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        Ok(StoreConfig::new(&database_url))
    }
}
