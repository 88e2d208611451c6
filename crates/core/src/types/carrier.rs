//! Per-tenant Correios account settings.

use serde::{Deserialize, Serialize};

use super::id::TenantId;
use super::status::{CarrierEnvironment, PackageType};
use crate::dimensions::RequestedDims;

/// A postal address as entered in the back office.
///
/// Values are kept exactly as typed; the payload assembler normalizes them
/// (digit-only postal code, upper-case state) when building carrier
/// documents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub number: String,
    #[serde(default)]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    /// Two-letter state code (UF).
    pub state: String,
    /// CEP, with or without punctuation.
    pub postal_code: String,
}

/// The shipping party printed as sender on every label of a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SenderIdentity {
    pub name: String,
    /// CPF or CNPJ, with or without punctuation.
    pub tax_id: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub address: Address,
}

/// Correios contract configuration for one tenant.
///
/// One row per tenant, upserted by the settings form and read-only while a
/// label is generated. `access_code` is always held in its obfuscated
/// storage form (see [`crate::credential::CredentialCodec`]); `Debug` is
/// implemented manually so it never reaches logs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierConfig {
    pub tenant_id: TenantId,
    /// Correios portal user ("idCorreios").
    pub account_id: String,
    /// Obfuscated API access code.
    pub access_code: String,
    pub contract_number: String,
    /// Postage card ("cartão de postagem") number.
    pub postage_card: String,
    pub environment: CarrierEnvironment,
    pub sender: SenderIdentity,
    pub default_service_code: String,
    pub default_package_type: PackageType,
    /// Tenant-wide package defaults (grams / centimetres).
    pub default_dims: RequestedDims,
    pub active: bool,
}

impl std::fmt::Debug for CarrierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrierConfig")
            .field("tenant_id", &self.tenant_id)
            .field("account_id", &self.account_id)
            .field("access_code", &"[REDACTED]")
            .field("contract_number", &self.contract_number)
            .field("postage_card", &self.postage_card)
            .field("environment", &self.environment)
            .field("sender", &self.sender)
            .field("default_service_code", &self.default_service_code)
            .field("default_package_type", &self.default_package_type)
            .field("default_dims", &self.default_dims)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_debug_redacts_access_code() {
        let config = CarrierConfig {
            tenant_id: TenantId::generate(),
            account_id: "loja-exemplo".to_string(),
            access_code: "c3VwZXItc2VjcmV0".to_string(),
            contract_number: "9912345678".to_string(),
            postage_card: "0076543210".to_string(),
            environment: CarrierEnvironment::Production,
            sender: SenderIdentity::default(),
            default_service_code: "03298".to_string(),
            default_package_type: PackageType::Box,
            default_dims: RequestedDims::default(),
            active: true,
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("loja-exemplo"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("c3VwZXItc2VjcmV0"));
    }
}
