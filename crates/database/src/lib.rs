//! SQLite persistence layer for AgriLog.
//!
//! Accounts, profiles, farm activities, access requests and the admin-side
//! tables, each behind a module of free async functions over a
//! [`SqlitePool`].
//!
//! # Example
//!
//! ```no_run
//! use database::{account, farm_activity, models::{ActivityType, Role}, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:agrilog.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let farmer = account::create_account(
//!         db.pool(),
//!         &account::NewAccount {
//!             email: "amina@example.com".to_string(),
//!             password_hash: "$argon2id$...".to_string(),
//!             full_name: "Amina".to_string(),
//!             phone_number: None,
//!             village_location: Some("Kisumu".to_string()),
//!             preferred_language: None,
//!             role: Role::Farmer,
//!             institution: None,
//!             admin_organization: None,
//!         },
//!     )
//!     .await?;
//!
//!     let activity = farm_activity::NewActivity::new(
//!         &farmer.id,
//!         ActivityType::Planting,
//!         "2025-03-01T08:00:00Z",
//!     );
//!     farm_activity::create_activity(db.pool(), &activity).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod access_request;
pub mod account;
pub mod audit_log;
pub mod data_permission;
pub mod error;
pub mod farm_activity;
pub mod field;
pub mod institution_profile;
pub mod models;
pub mod profile;
pub mod session;
pub mod system_setting;
pub mod user_role;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/agrilog.db?mode=rwc`.
    /// `sqlite::memory:` gives a private in-memory store, which the tests use.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(url, pool_size, "Connected to database");

        Ok(Self { pool })
    }

    /// Bring the schema up to date.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::debug!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
