//! Pre-posting request documents.
//!
//! [`assemble`] turns a tenant's [`CarrierConfig`] and a [`LabelRequest`]
//! into the canonical [`CarrierPayload`]. The structural fallbacks used when
//! the carrier rejects the canonical shape live in [`variants`].
//!
//! The invoice key decides the document's shape: a valid 44-digit NF-e key
//! attaches a fiscal-document block, anything else embeds a content
//! declaration in the postal object and sets the root flag. Sending neither
//! makes Correios answer with PPN-347 and a cascade of null-field errors.

pub mod variants;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::dimensions::{PackageDims, RequestedDims, validate};
use crate::phone::{PhoneKind, parse_phone};
use crate::postal_object::{PostalObject, build_postal_object, declared_value};
use crate::sanitize::{digits_only, non_blank, state_code};
use crate::types::{Address, CarrierConfig, LabelRequest, Recipient, SenderIdentity};

/// Digits in an NF-e access key.
pub const INVOICE_KEY_DIGITS: usize = 44;

/// Root flag value meaning "this shipment carries a content declaration".
pub const CONTENT_DECLARATION_FLAG: &str = "S";

/// Address sub-document shared by sender and recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyAddress {
    #[serde(rename = "cep")]
    pub postal_code: String,
    #[serde(rename = "logradouro")]
    pub street: String,
    #[serde(rename = "numero")]
    pub number: String,
    #[serde(rename = "complemento", skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    #[serde(rename = "bairro")]
    pub neighborhood: String,
    #[serde(rename = "cidade")]
    pub city: String,
    #[serde(rename = "uf")]
    pub state: String,
}

/// Sender ("remetente") or recipient ("destinatario").
///
/// Mobile and landline pairs are mutually exclusive; at most one is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Party {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "cpfCnpj", skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(rename = "dddTelefone", skip_serializing_if = "Option::is_none")]
    pub landline_area_code: Option<String>,
    #[serde(rename = "telefone", skip_serializing_if = "Option::is_none")]
    pub landline_number: Option<String>,
    #[serde(rename = "dddCelular", skip_serializing_if = "Option::is_none")]
    pub mobile_area_code: Option<String>,
    #[serde(rename = "celular", skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(rename = "email", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "endereco")]
    pub address: PartyAddress,
}

/// NF-e reference replacing the content declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiscalDocument {
    #[serde(rename = "chaveNFe")]
    pub access_key: String,
    #[serde(rename = "numeroNotaFiscal", skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
}

/// Canonical pre-posting request body.
///
/// The postal object is held as a single value and always serialized as a
/// one-element `objetosPostais` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarrierPayload {
    #[serde(rename = "codigoServico")]
    pub service_code: String,
    #[serde(rename = "remetente")]
    pub sender: Party,
    #[serde(rename = "destinatario")]
    pub recipient: Party,
    #[serde(rename = "objetosPostais", serialize_with = "single_element_array")]
    pub postal_object: PostalObject,
    #[serde(rename = "documentoFiscal", skip_serializing_if = "Option::is_none")]
    pub fiscal_document: Option<FiscalDocument>,
    #[serde(
        rename = "possuiDeclaracaoConteudo",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_declaration_flag: Option<String>,
}

fn single_element_array<S: Serializer>(
    object: &PostalObject,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    [object].serialize(serializer)
}

/// The canonical payload plus the facts the rest of the flow needs.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledRequest {
    pub payload: CarrierPayload,
    /// Dimensions after validation against the service limits.
    pub dimensions: PackageDims,
    /// Declared value in reais.
    pub declared_value: Decimal,
    pub has_valid_invoice_key: bool,
}

/// An invoice key counts only if exactly 44 digits survive stripping.
///
/// Upstream bugs regularly hand us `"undefined"`, `"null"` or keys with
/// stray whitespace; all of those are treated as "no invoice".
#[must_use]
pub fn has_valid_invoice_key(key: Option<&str>) -> bool {
    key.is_some_and(|key| digits_only(key).len() == INVOICE_KEY_DIGITS)
}

/// Build the canonical pre-posting document.
#[must_use]
pub fn assemble(config: &CarrierConfig, request: &LabelRequest) -> AssembledRequest {
    let service_code = non_blank(request.service_code.as_deref())
        .unwrap_or_else(|| config.default_service_code.trim().to_string());

    let requested = request
        .package
        .as_ref()
        .map(|package| package.dims)
        .unwrap_or_default();
    let declared_cents = request
        .package
        .as_ref()
        .and_then(|package| package.declared_value_cents);

    let dimensions = validate(&requested, &config.default_dims, &service_code);
    let has_valid_invoice_key = has_valid_invoice_key(request.invoice_key.as_deref());

    let postal_object = build_postal_object(
        config.default_package_type,
        &dimensions,
        declared_cents,
        !has_valid_invoice_key,
    );

    let fiscal_document = has_valid_invoice_key.then(|| FiscalDocument {
        access_key: digits_only(request.invoice_key.as_deref().unwrap_or_default()),
        number: non_blank(request.invoice_number.as_deref()),
    });

    let payload = CarrierPayload {
        service_code,
        sender: sender_party(&config.sender),
        recipient: recipient_party(&request.recipient),
        postal_object,
        fiscal_document,
        content_declaration_flag: (!has_valid_invoice_key)
            .then(|| CONTENT_DECLARATION_FLAG.to_string()),
    };

    AssembledRequest {
        payload,
        dimensions,
        declared_value: declared_value(declared_cents),
        has_valid_invoice_key,
    }
}

fn sender_party(sender: &SenderIdentity) -> Party {
    party(
        &sender.name,
        Some(sender.tax_id.as_str()),
        sender.phone.as_deref(),
        sender.email.as_deref(),
        &sender.address,
    )
}

fn recipient_party(recipient: &Recipient) -> Party {
    party(
        &recipient.name,
        recipient.tax_id.as_deref(),
        recipient.phone.as_deref(),
        recipient.email.as_deref(),
        &recipient.address,
    )
}

fn party(
    name: &str,
    tax_id: Option<&str>,
    phone: Option<&str>,
    email: Option<&str>,
    address: &Address,
) -> Party {
    let mut party = Party {
        name: name.trim().to_string(),
        tax_id: tax_id.map(digits_only).filter(|digits| !digits.is_empty()),
        landline_area_code: None,
        landline_number: None,
        mobile_area_code: None,
        mobile_number: None,
        email: non_blank(email),
        address: party_address(address),
    };

    match phone.and_then(parse_phone) {
        Some(parsed) if parsed.kind == PhoneKind::Mobile => {
            party.mobile_area_code = Some(parsed.area_code);
            party.mobile_number = Some(parsed.local_number);
        }
        Some(parsed) => {
            party.landline_area_code = Some(parsed.area_code);
            party.landline_number = Some(parsed.local_number);
        }
        None => {}
    }

    party
}

fn party_address(address: &Address) -> PartyAddress {
    PartyAddress {
        postal_code: digits_only(&address.postal_code),
        street: address.street.trim().to_string(),
        number: address.number.trim().to_string(),
        complement: non_blank(address.complement.as_deref()),
        neighborhood: address.neighborhood.trim().to_string(),
        city: address.city.trim().to_string(),
        state: state_code(&address.state),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{CarrierEnvironment, PackageOverride, PackageType, TenantId};

    pub(crate) const VALID_KEY: &str = "43210612345678000199550010000012341000012345";

    pub(crate) fn config() -> CarrierConfig {
        CarrierConfig {
            tenant_id: TenantId::generate(),
            account_id: "loja-exemplo".to_string(),
            access_code: "xor1:AAAA".to_string(),
            contract_number: "9912345678".to_string(),
            postage_card: "0076543210".to_string(),
            environment: CarrierEnvironment::Production,
            sender: SenderIdentity {
                name: "Loja Exemplo LTDA".to_string(),
                tax_id: "12.345.678/0001-99".to_string(),
                phone: Some("(51) 3222-1234".to_string()),
                email: Some("envios@lojaexemplo.com.br".to_string()),
                address: Address {
                    street: "Av. Ipiranga".to_string(),
                    number: "6681".to_string(),
                    complement: Some("Sala 10".to_string()),
                    neighborhood: "Partenon".to_string(),
                    city: "Porto Alegre".to_string(),
                    state: "rs".to_string(),
                    postal_code: "90619-900".to_string(),
                },
            },
            default_service_code: "03298".to_string(),
            default_package_type: PackageType::Box,
            default_dims: RequestedDims {
                weight: Some(800.0),
                height: Some(10.0),
                width: Some(20.0),
                length: Some(30.0),
            },
            active: true,
        }
    }

    pub(crate) fn request(tenant_id: TenantId) -> LabelRequest {
        LabelRequest {
            tenant_id,
            sale_id: None,
            recipient: Recipient {
                name: " Maria Souza ".to_string(),
                tax_id: Some("123.456.789-09".to_string()),
                phone: Some("5551999998888".to_string()),
                email: Some(" ".to_string()),
                address: Address {
                    street: "Rua das Flores".to_string(),
                    number: "120".to_string(),
                    complement: None,
                    neighborhood: "Centro".to_string(),
                    city: "Caxias do Sul".to_string(),
                    state: "rs".to_string(),
                    postal_code: "95020-000".to_string(),
                },
            },
            package: None,
            service_code: None,
            invoice_number: None,
            invoice_key: None,
        }
    }

    #[test]
    fn test_invoice_key_validity() {
        assert!(!has_valid_invoice_key(None));
        assert!(!has_valid_invoice_key(Some("")));
        assert!(!has_valid_invoice_key(Some("undefined")));
        assert!(!has_valid_invoice_key(Some("null")));
        assert!(has_valid_invoice_key(Some(VALID_KEY)));
        assert!(has_valid_invoice_key(Some(&format!(" {VALID_KEY}\n"))));
        assert!(!has_valid_invoice_key(Some(&VALID_KEY[..43])));
        assert!(!has_valid_invoice_key(Some(&format!("{VALID_KEY}1"))));

        // 44 characters, but only 43 of them are digits.
        let with_letter = format!("A{}", &VALID_KEY[1..]);
        assert_eq!(with_letter.len(), 44);
        assert!(!has_valid_invoice_key(Some(&with_letter)));
    }

    #[test]
    fn test_no_invoice_embeds_content_declaration() {
        let config = config();
        let assembled = assemble(&config, &request(config.tenant_id));
        let json = serde_json::to_value(&assembled.payload).unwrap();

        assert!(!assembled.has_valid_invoice_key);
        assert_eq!(json["possuiDeclaracaoConteudo"], "S");
        assert!(json.get("documentoFiscal").is_none());

        let objects = json["objetosPostais"].as_array().unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0]["tipoObjeto"], "CAIXA");
        assert_eq!(objects[0]["codigoFormatoObjeto"], "2");
        assert_eq!(objects[0]["vlrDeclarado"], "100.00");

        let items = objects[0]["itensDeclaracaoConteudo"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["peso"], "800");
        assert_eq!(items[0]["peso"], objects[0]["peso"]);
    }

    #[test]
    fn test_valid_invoice_attaches_fiscal_document() {
        let config = config();
        let mut request = request(config.tenant_id);
        request.invoice_key = Some(format!(" {VALID_KEY} "));
        request.invoice_number = Some("1234".to_string());

        let assembled = assemble(&config, &request);
        let json = serde_json::to_value(&assembled.payload).unwrap();

        assert!(assembled.has_valid_invoice_key);
        assert_eq!(json["documentoFiscal"]["chaveNFe"], VALID_KEY);
        assert_eq!(json["documentoFiscal"]["numeroNotaFiscal"], "1234");
        assert!(json.get("possuiDeclaracaoConteudo").is_none());
        assert!(json["objetosPostais"][0].get("itensDeclaracaoConteudo").is_none());
    }

    #[test]
    fn test_parties_are_normalized() {
        let config = config();
        let assembled = assemble(&config, &request(config.tenant_id));
        let payload = &assembled.payload;

        assert_eq!(payload.sender.tax_id.as_deref(), Some("12345678000199"));
        assert_eq!(payload.sender.address.postal_code, "90619900");
        assert_eq!(payload.sender.address.state, "RS");
        assert_eq!(payload.sender.landline_area_code.as_deref(), Some("51"));
        assert_eq!(payload.sender.landline_number.as_deref(), Some("32221234"));
        assert!(payload.sender.mobile_number.is_none());

        assert_eq!(payload.recipient.name, "Maria Souza");
        assert_eq!(payload.recipient.tax_id.as_deref(), Some("12345678909"));
        assert_eq!(payload.recipient.mobile_area_code.as_deref(), Some("51"));
        assert_eq!(payload.recipient.mobile_number.as_deref(), Some("999998888"));
        assert!(payload.recipient.landline_number.is_none());
        assert!(payload.recipient.email.is_none());
        assert!(payload.recipient.address.complement.is_none());
    }

    #[test]
    fn test_unparseable_phone_omits_fields() {
        let config = config();
        let mut request = request(config.tenant_id);
        request.recipient.phone = Some("123".to_string());

        let json = serde_json::to_value(assemble(&config, &request).payload).unwrap();
        let recipient = json["destinatario"].as_object().unwrap();
        for field in ["dddTelefone", "telefone", "dddCelular", "celular"] {
            assert!(!recipient.contains_key(field), "{field} should be omitted");
        }
    }

    #[test]
    fn test_service_override_and_package_override() {
        let config = config();
        let mut request = request(config.tenant_id);
        request.service_code = Some("04227".to_string());
        request.package = Some(PackageOverride {
            dims: RequestedDims {
                weight: Some(250.0),
                ..RequestedDims::default()
            },
            declared_value_cents: Some(4_990),
        });

        let assembled = assemble(&config, &request);
        assert_eq!(assembled.payload.service_code, "04227");
        assert_eq!(assembled.dimensions.weight, 250);
        // Tenant default height of 10 cm is clamped to the Mini Envios max.
        assert_eq!(assembled.dimensions.height, 4);
        assert_eq!(assembled.payload.postal_object.declared_value, "49.90");
        assert_eq!(format!("{:.2}", assembled.declared_value), "49.90");
    }

    #[test]
    fn test_blank_service_override_uses_default() {
        let config = config();
        let mut request = request(config.tenant_id);
        request.service_code = Some("  ".to_string());
        assert_eq!(assemble(&config, &request).payload.service_code, "03298");
    }
}
