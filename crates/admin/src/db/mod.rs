//! Database operations for the label back office.
//!
//! ## Tables
//!
//! - `carrier_configs` - Correios contract per tenant (access code obfuscated)
//! - `shipping_labels` - One row per accepted pre-posting
//! - `sales` - Tracking code propagated from the label
//! - `tracking_history` - Timeline events per sale
//! - `carrier_error_logs` - Every failed carrier interaction, with the payload sent
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p correio-labels-cli -- migrate
//! ```

pub mod carrier_configs;
pub mod error_logs;
pub mod labels;
pub mod repository;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carrier_configs::CarrierConfigRepository;
pub use error_logs::{ErrorLogRepository, NewCarrierErrorLog};
pub use labels::LabelRepository;
pub use repository::{CarrierConfigStore, ErrorLogStore, LabelStore};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate tracking code).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-violation into `RepositoryError::Conflict`.
pub(crate) fn map_unique_violation(err: sqlx::Error, what: &str) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(format!("{what} already exists"))
        }
        _ => RepositoryError::Database(err),
    }
}
