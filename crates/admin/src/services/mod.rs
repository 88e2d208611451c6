//! Business logic services for the back office.
//!
//! # Services
//!
//! - `labels` - Correios label generation, connection test and carrier settings

pub mod labels;

pub use labels::{
    CarrierSettings, ConnectionReport, GeneratedLabel, LabelError, LabelService,
};
