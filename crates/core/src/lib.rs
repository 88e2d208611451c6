//! Correio Labels Core - carrier domain logic.
//!
//! Pure building blocks for Correios pre-posting labels, shared by the
//! `admin` service and the `cli`:
//!
//! - [`types`] - IDs, carrier configuration, requests and label records
//! - [`credential`] - reversible obfuscation of stored access codes
//! - [`dimensions`] - per-service package limits and validation
//! - [`services`] - catalogue of contracted service codes
//! - [`phone`] and [`sanitize`] - field normalizers
//! - [`postal_object`] and [`payload`] - the request documents
//!
//! Nothing here does I/O; HTTP, storage and persistence live in `admin`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod credential;
pub mod dimensions;
pub mod payload;
pub mod phone;
pub mod postal_object;
pub mod sanitize;
pub mod services;
pub mod types;

pub use types::*;
