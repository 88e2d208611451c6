//! Core types for Correio Labels.
//!
//! This module provides type-safe wrappers for the carrier integration's
//! domain concepts.

pub mod carrier;
pub mod id;
pub mod label;
pub mod request;
pub mod status;

pub use carrier::{Address, CarrierConfig, SenderIdentity};
pub use id::*;
pub use label::{LabelRecord, TrackingEvent};
pub use request::{LabelRequest, PackageOverride, Recipient};
pub use status::*;
