//! Package dimension validation against per-service carrier limits.
//!
//! Correios rejects packages whose weight or measures fall outside the
//! bounds of the contracted service, and rejects non-integer values
//! outright. [`validate`] repairs whatever the operator (or the tenant
//! defaults) supplied into something the carrier accepts:
//!
//! 1. pick requested, else tenant default, else [`FALLBACK`] per axis;
//! 2. clamp each axis to the service's inclusive `[min, max]`;
//! 3. round to whole grams / centimetres;
//! 4. grow `length` until the minimum sum of dimensions is met.
//!
//! Rounding happens before the sum repair so the rounded sum can never fall
//! back under the minimum. Step 4 does not re-clamp `length`: with the
//! compiled table the grown length is bounded by
//! `min_sum - min_height - min_width`, which sits below every service's
//! `max_length`.

use serde::{Deserialize, Serialize};

/// Dimensions as typed by an operator or stored as tenant defaults.
///
/// Weight in grams, measures in centimetres. `None` and zero both mean
/// "not provided".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestedDims {
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub length: Option<f64>,
}

/// Validated, whole-number package dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageDims {
    /// Grams.
    pub weight: u32,
    /// Centimetres.
    pub height: u32,
    /// Centimetres.
    pub width: u32,
    /// Centimetres.
    pub length: u32,
}

impl PackageDims {
    /// `height + width + length`.
    #[must_use]
    pub const fn sum(&self) -> u32 {
        self.height + self.width + self.length
    }
}

/// Hardcoded last-resort values: 500 g, 2 cm, 11 cm, 16 cm.
pub const FALLBACK: PackageDims = PackageDims {
    weight: 500,
    height: 2,
    width: 11,
    length: 16,
};

/// Inclusive bounds accepted by one carrier service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceLimits {
    pub min_weight: f64,
    pub max_weight: f64,
    pub min_height: f64,
    pub max_height: f64,
    pub min_width: f64,
    pub max_width: f64,
    pub min_length: f64,
    pub max_length: f64,
    pub min_sum_of_dimensions: f64,
    pub max_sum_of_dimensions: f64,
}

/// Limits applied to unknown service codes, and to regular SEDEX/PAC.
pub const DEFAULT_LIMITS: ServiceLimits = ServiceLimits {
    min_weight: 1.0,
    max_weight: 30_000.0,
    min_height: 1.0,
    max_height: 100.0,
    min_width: 10.0,
    max_width: 100.0,
    min_length: 15.0,
    max_length: 100.0,
    min_sum_of_dimensions: 29.0,
    max_sum_of_dimensions: 200.0,
};

/// SEDEX 10 / SEDEX 12 carry at most 10 kg.
const TIME_DEFINITE_LIMITS: ServiceLimits = ServiceLimits {
    max_weight: 10_000.0,
    ..DEFAULT_LIMITS
};

const MINI_ENVIOS_LIMITS: ServiceLimits = ServiceLimits {
    min_weight: 1.0,
    max_weight: 300.0,
    min_height: 1.0,
    max_height: 4.0,
    min_width: 10.0,
    max_width: 16.0,
    min_length: 15.0,
    max_length: 24.0,
    min_sum_of_dimensions: 26.0,
    max_sum_of_dimensions: 44.0,
};

/// Look up the limits for a service code.
#[must_use]
pub fn limits_for(service_code: &str) -> &'static ServiceLimits {
    match service_code.trim() {
        "03158" | "03140" => &TIME_DEFINITE_LIMITS,
        "04227" => &MINI_ENVIOS_LIMITS,
        _ => &DEFAULT_LIMITS,
    }
}

/// Repair requested dimensions into values the carrier accepts for
/// `service_code`.
#[must_use]
pub fn validate(
    requested: &RequestedDims,
    tenant_defaults: &RequestedDims,
    service_code: &str,
) -> PackageDims {
    let limits = limits_for(service_code);

    let weight = pick(requested.weight, tenant_defaults.weight, FALLBACK.weight);
    let height = pick(requested.height, tenant_defaults.height, FALLBACK.height);
    let width = pick(requested.width, tenant_defaults.width, FALLBACK.width);
    let length = pick(requested.length, tenant_defaults.length, FALLBACK.length);

    let weight = whole(clamp(weight, limits.min_weight, limits.max_weight));
    let height = whole(clamp(height, limits.min_height, limits.max_height));
    let width = whole(clamp(width, limits.min_width, limits.max_width));
    let mut length = whole(clamp(length, limits.min_length, limits.max_length));

    let min_sum = whole(limits.min_sum_of_dimensions);
    if height + width + length < min_sum {
        length = min_sum - height - width;
    }

    PackageDims {
        weight,
        height,
        width,
        length,
    }
}

fn pick(requested: Option<f64>, default: Option<f64>, fallback: u32) -> f64 {
    requested
        .filter(|v| provided(*v))
        .or_else(|| default.filter(|v| provided(*v)))
        .unwrap_or_else(|| f64::from(fallback))
}

fn provided(value: f64) -> bool {
    value.is_finite() && value != 0.0
}

/// Minimum first, then maximum.
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "values are clamped to small positive carrier limits before rounding"
)]
fn whole(value: f64) -> u32 {
    value.round() as u32
}
