//! Correios label back office library.
//!
//! This crate provides the admin functionality as a library,
//! allowing it to be tested and reused.
//!
//! # Security
//!
//! This crate handles carrier credentials and a storage service key.
//! Access codes are stored obfuscated and only revealed in memory when
//! a carrier session is opened.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod correios;
pub mod db;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

use axum::Router;

/// The full application router with state applied.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app(state: state::AppState) -> Router {
    routes::routes().with_state(state)
}
