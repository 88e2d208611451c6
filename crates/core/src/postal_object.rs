//! The carrier's "objeto postal": one physical package in a pre-posting.
//!
//! Every numeric field is a JSON **string**. Some Correios contracts reject
//! numbers in these positions outright, so the struct only has `String`
//! fields and [`wire_number`] is the single place numbers become text.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dimensions::PackageDims;
use crate::types::PackageType;

/// Declared value used when the operator gives none: R$ 100,00.
pub const DEFAULT_DECLARED_VALUE_CENTS: i64 = 10_000;

/// Description printed on the single content-declaration line.
pub const CONTENT_DESCRIPTION: &str = "Produtos diversos";

/// Measures block of a postal object, in centimetres.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionBlock {
    #[serde(rename = "altura")]
    pub height: String,
    #[serde(rename = "largura")]
    pub width: String,
    #[serde(rename = "comprimento")]
    pub length: String,
    #[serde(rename = "diametro")]
    pub diameter: String,
}

/// One line of a content declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "conteudo")]
    pub description: String,
    #[serde(rename = "quantidade")]
    pub quantity: String,
    #[serde(rename = "valor")]
    pub value: String,
    #[serde(rename = "peso")]
    pub weight: String,
}

/// Package sub-document of a pre-posting request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalObject {
    #[serde(rename = "tipoObjeto")]
    pub object_type: String,
    #[serde(rename = "codigoFormatoObjeto")]
    pub format_code: String,
    /// Grams.
    #[serde(rename = "peso")]
    pub weight: String,
    /// Sender acknowledges the package holds no prohibited items ("1").
    #[serde(rename = "cienteObjetoNaoProibido")]
    pub prohibited_items_acknowledged: String,
    /// Reais with two decimals, e.g. `"100.00"`.
    #[serde(rename = "vlrDeclarado")]
    pub declared_value: String,
    #[serde(rename = "dimensao")]
    pub dimensions: DimensionBlock,
    #[serde(
        rename = "itensDeclaracaoConteudo",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub content_items: Vec<ContentItem>,
}

/// Render a whole number the way the carrier wants it: as a string.
#[must_use]
pub fn wire_number(value: u32) -> String {
    value.to_string()
}

/// Convert centavos to reais with exactly two decimals.
///
/// Missing or non-positive amounts fall back to
/// [`DEFAULT_DECLARED_VALUE_CENTS`].
#[must_use]
pub fn declared_value(cents: Option<i64>) -> Decimal {
    let cents = cents
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_DECLARED_VALUE_CENTS);
    Decimal::new(cents, 2).round_dp(2)
}

/// Build the postal object for validated dimensions.
///
/// With `include_content_declaration`, exactly one declaration line is
/// attached. The carrier requires it whenever no valid fiscal document
/// travels with the shipment.
#[must_use]
pub fn build_postal_object(
    package_type: PackageType,
    dims: &PackageDims,
    declared_value_cents: Option<i64>,
    include_content_declaration: bool,
) -> PostalObject {
    let weight = wire_number(dims.weight);
    let declared = format!("{:.2}", declared_value(declared_value_cents));

    let content_items = if include_content_declaration {
        vec![ContentItem {
            description: CONTENT_DESCRIPTION.to_string(),
            quantity: wire_number(1),
            value: declared.clone(),
            weight: weight.clone(),
        }]
    } else {
        Vec::new()
    };

    PostalObject {
        object_type: package_type.object_type().to_string(),
        format_code: package_type.format_code().to_string(),
        weight,
        prohibited_items_acknowledged: wire_number(1),
        declared_value: declared,
        dimensions: DimensionBlock {
            height: wire_number(dims.height),
            width: wire_number(dims.width),
            length: wire_number(dims.length),
            diameter: wire_number(0),
        },
        content_items,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::Value;

    use super::*;

    const DIMS: PackageDims = PackageDims {
        weight: 750,
        height: 8,
        width: 20,
        length: 30,
    };

    #[test]
    fn test_default_declared_value() {
        let object = build_postal_object(PackageType::Box, &DIMS, None, false);
        assert_eq!(object.declared_value, "100.00");
    }

    #[test]
    fn test_declared_value_from_cents() {
        assert_eq!(format!("{:.2}", declared_value(Some(15_990))), "159.90");
        assert_eq!(format!("{:.2}", declared_value(Some(5))), "0.05");
        assert_eq!(format!("{:.2}", declared_value(Some(-100))), "100.00");
    }

    #[test]
    fn test_content_declaration_line() {
        let object = build_postal_object(PackageType::Box, &DIMS, Some(2_500), true);
        assert_eq!(object.content_items.len(), 1);

        let item = &object.content_items[0];
        assert_eq!(item.description, CONTENT_DESCRIPTION);
        assert_eq!(item.quantity, "1");
        assert_eq!(item.value, "25.00");
        assert_eq!(item.weight, "750");
    }

    #[test]
    fn test_no_declaration_omits_items_field() {
        let object = build_postal_object(PackageType::Envelope, &DIMS, None, false);
        let json = serde_json::to_value(&object).unwrap();
        assert!(json.get("itensDeclaracaoConteudo").is_none());
        assert_eq!(json["tipoObjeto"], "ENVELOPE");
        assert_eq!(json["codigoFormatoObjeto"], "1");
    }

    #[test]
    fn test_numeric_fields_serialize_as_strings() {
        let object = build_postal_object(PackageType::Cylinder, &DIMS, Some(12_345), true);
        let json = serde_json::to_value(&object).unwrap();

        for field in ["peso", "vlrDeclarado", "codigoFormatoObjeto", "cienteObjetoNaoProibido"] {
            assert!(json[field].is_string(), "{field} should be a string");
        }
        for field in ["altura", "largura", "comprimento", "diametro"] {
            assert!(json["dimensao"][field].is_string(), "{field} should be a string");
        }

        let item = &json["itensDeclaracaoConteudo"][0];
        assert!(matches!(item["quantidade"], Value::String(_)));
        assert!(matches!(item["valor"], Value::String(_)));
        assert!(matches!(item["peso"], Value::String(_)));
    }
}
