//! Structural fallbacks for the pre-posting document.
//!
//! Some Correios contracts still validate against older schemas and reject
//! the canonical document with a format or weight complaint. Each variant
//! here is a pure function of the canonical [`CarrierPayload`].

use serde::Serialize;
use serde_json::Value;

use super::{CarrierPayload, FiscalDocument, Party};
use crate::postal_object::PostalObject;

/// Shape of the request body sent to the pre-posting endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmitVariant {
    /// The document as assembled.
    Canonical,
    /// Every number inside the postal objects forced back to a string.
    Restringified,
    /// Singular `objetoPostal` instead of the `objetosPostais` array.
    SingularObject,
    /// Postal object fields merged into the root.
    Flattened,
}

impl SubmitVariant {
    /// Order in which fallbacks are tried after the canonical shape fails.
    pub const FALLBACKS: [Self; 3] = [Self::Restringified, Self::SingularObject, Self::Flattened];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Canonical => "canonical",
            Self::Restringified => "restringified",
            Self::SingularObject => "singular_object",
            Self::Flattened => "flattened",
        }
    }

    /// Render the request body for this variant.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization fails, which the payload's
    /// string-only fields make practically impossible.
    pub fn render(self, payload: &CarrierPayload) -> Result<Value, serde_json::Error> {
        match self {
            Self::Canonical => serde_json::to_value(payload),
            Self::Restringified => restringified(payload),
            Self::SingularObject => singular_object(payload),
            Self::Flattened => flattened(payload),
        }
    }
}

impl std::fmt::Display for SubmitVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize)]
struct SingularPayload<'a> {
    #[serde(rename = "codigoServico")]
    service_code: &'a str,
    #[serde(rename = "remetente")]
    sender: &'a Party,
    #[serde(rename = "destinatario")]
    recipient: &'a Party,
    #[serde(rename = "objetoPostal")]
    postal_object: &'a PostalObject,
    #[serde(rename = "documentoFiscal", skip_serializing_if = "Option::is_none")]
    fiscal_document: Option<&'a FiscalDocument>,
    #[serde(
        rename = "possuiDeclaracaoConteudo",
        skip_serializing_if = "Option::is_none"
    )]
    content_declaration_flag: Option<&'a str>,
}

#[derive(Serialize)]
struct FlattenedPayload<'a> {
    #[serde(rename = "codigoServico")]
    service_code: &'a str,
    #[serde(rename = "remetente")]
    sender: &'a Party,
    #[serde(rename = "destinatario")]
    recipient: &'a Party,
    #[serde(flatten)]
    postal_object: &'a PostalObject,
    #[serde(rename = "documentoFiscal", skip_serializing_if = "Option::is_none")]
    fiscal_document: Option<&'a FiscalDocument>,
    #[serde(
        rename = "possuiDeclaracaoConteudo",
        skip_serializing_if = "Option::is_none"
    )]
    content_declaration_flag: Option<&'a str>,
}

/// Canonical shape with every number in the postal objects as a string.
///
/// # Errors
///
/// Propagates serialization failures.
pub fn restringified(payload: &CarrierPayload) -> Result<Value, serde_json::Error> {
    let mut body = serde_json::to_value(payload)?;
    if let Some(objects) = body.get_mut("objetosPostais") {
        stringify_numbers(objects);
    }
    Ok(body)
}

/// Single `objetoPostal` object in place of the array.
///
/// # Errors
///
/// Propagates serialization failures.
pub fn singular_object(payload: &CarrierPayload) -> Result<Value, serde_json::Error> {
    serde_json::to_value(SingularPayload {
        service_code: &payload.service_code,
        sender: &payload.sender,
        recipient: &payload.recipient,
        postal_object: &payload.postal_object,
        fiscal_document: payload.fiscal_document.as_ref(),
        content_declaration_flag: payload.content_declaration_flag.as_deref(),
    })
}

/// Postal object fields placed directly on the root document.
///
/// The postal object carries no content-declaration flag of its own, so the
/// root flag appears exactly once.
///
/// # Errors
///
/// Propagates serialization failures.
pub fn flattened(payload: &CarrierPayload) -> Result<Value, serde_json::Error> {
    serde_json::to_value(FlattenedPayload {
        service_code: &payload.service_code,
        sender: &payload.sender,
        recipient: &payload.recipient,
        postal_object: &payload.postal_object,
        fiscal_document: payload.fiscal_document.as_ref(),
        content_declaration_flag: payload.content_declaration_flag.as_deref(),
    })
}

fn stringify_numbers(value: &mut Value) {
    match value {
        Value::Number(number) => *value = Value::String(number.to_string()),
        Value::Array(items) => items.iter_mut().for_each(stringify_numbers),
        Value::Object(fields) => fields.values_mut().for_each(stringify_numbers),
        Value::Null | Value::Bool(_) | Value::String(_) => {}
    }
}
