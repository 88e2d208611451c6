//! Catalogue of Correios services offered to tenants.

use serde::Serialize;

/// A contracted Correios shipping product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CarrierService {
    pub code: &'static str,
    pub name: &'static str,
}

/// Known service codes, in the order the settings form lists them.
pub const SERVICES: &[CarrierService] = &[
    CarrierService {
        code: "03220",
        name: "SEDEX CONTRATO AG",
    },
    CarrierService {
        code: "03298",
        name: "PAC CONTRATO AG",
    },
    CarrierService {
        code: "03140",
        name: "SEDEX 12 CONTRATO AG",
    },
    CarrierService {
        code: "03158",
        name: "SEDEX 10 CONTRATO AG",
    },
    CarrierService {
        code: "04227",
        name: "CORREIOS MINI ENVIOS CTR AG",
    },
    CarrierService {
        code: "04162",
        name: "SEDEX CONTRATO AGENCIA",
    },
    CarrierService {
        code: "04669",
        name: "PAC CONTRATO AGENCIA",
    },
];

/// Look up a service by code.
#[must_use]
pub fn find_service(code: &str) -> Option<&'static CarrierService> {
    let code = code.trim();
    SERVICES.iter().find(|service| service.code == code)
}

/// Display name for a service code, falling back to the code itself.
#[must_use]
pub fn service_name(code: &str) -> String {
    find_service(code).map_or_else(|| code.trim().to_string(), |service| service.name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_known_service() {
        let pac = find_service("03298");
        assert_eq!(pac.map(|s| s.name), Some("PAC CONTRATO AG"));
    }

    #[test]
    fn test_unknown_service_name_is_code() {
        assert_eq!(service_name(" 12345 "), "12345");
    }

    #[test]
    fn test_codes_are_unique() {
        for (i, a) in SERVICES.iter().enumerate() {
            for b in SERVICES.iter().skip(i + 1) {
                assert_ne!(a.code, b.code);
            }
        }
    }
}
