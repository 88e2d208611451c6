//! Enums for carrier settings and label lifecycle.

use serde::{Deserialize, Serialize};

/// Correios API environment a tenant's contract runs against.
///
/// Stored with the carrier's own vocabulary (`HOMOLOGACAO` / `PRODUCAO`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CarrierEnvironment {
    /// Carrier sandbox ("homologação").
    #[default]
    #[serde(rename = "HOMOLOGACAO", alias = "staging")]
    Staging,
    /// Live contract.
    #[serde(rename = "PRODUCAO", alias = "production")]
    Production,
}

impl CarrierEnvironment {
    /// The stored/wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Staging => "HOMOLOGACAO",
            Self::Production => "PRODUCAO",
        }
    }
}

impl std::fmt::Display for CarrierEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CarrierEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HOMOLOGACAO" | "staging" => Ok(Self::Staging),
            "PRODUCAO" | "production" => Ok(Self::Production),
            _ => Err(format!("invalid carrier environment: {s}")),
        }
    }
}

/// Physical package shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PackageType {
    #[serde(rename = "envelope")]
    Envelope,
    #[default]
    #[serde(rename = "caixa", alias = "box")]
    Box,
    #[serde(rename = "cilindro", alias = "cylinder")]
    Cylinder,
}

impl PackageType {
    /// The stored representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Envelope => "envelope",
            Self::Box => "caixa",
            Self::Cylinder => "cilindro",
        }
    }

    /// Carrier `tipoObjeto` value.
    #[must_use]
    pub const fn object_type(&self) -> &'static str {
        match self {
            Self::Envelope => "ENVELOPE",
            Self::Box => "CAIXA",
            Self::Cylinder => "CILINDRO",
        }
    }

    /// Carrier `codigoFormatoObjeto` value.
    #[must_use]
    pub const fn format_code(&self) -> &'static str {
        match self {
            Self::Envelope => "1",
            Self::Box => "2",
            Self::Cylinder => "3",
        }
    }
}

impl std::str::FromStr for PackageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "envelope" => Ok(Self::Envelope),
            "caixa" | "box" => Ok(Self::Box),
            "cilindro" | "cylinder" => Ok(Self::Cylinder),
            _ => Err(format!("invalid package type: {s}")),
        }
    }
}

/// Lifecycle of a persisted shipping label.
///
/// Label generation only ever creates [`LabelStatus::Generated`]; the other
/// states are written by downstream tracking updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LabelStatus {
    #[default]
    Generated,
    Posted,
    InTransit,
    Delivered,
    Cancelled,
}

impl std::fmt::Display for LabelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generated => write!(f, "generated"),
            Self::Posted => write!(f, "posted"),
            Self::InTransit => write!(f, "in_transit"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for LabelStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generated" => Ok(Self::Generated),
            "posted" => Ok(Self::Posted),
            "in_transit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid label status: {s}")),
        }
    }
}
