//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Carrier
//! POST /api/carrier/correios   - Run a Correios action (see `carrier`)
//! ```

use axum::Router;

use crate::state::AppState;

pub mod carrier;
pub mod health;

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(carrier::router())
}
