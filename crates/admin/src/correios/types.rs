//! Wire types for the Correios endpoints we call.

use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body of the postage-card token request.
#[derive(Debug, Serialize)]
pub struct AuthRequest<'a> {
    /// Postage card number.
    pub numero: &'a str,
}

/// Successful token response.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    /// Local Brasília time, without offset.
    #[serde(rename = "expiraEm", default)]
    pub expires_at: Option<String>,
    #[serde(rename = "ambiente", default)]
    pub environment: Option<String>,
}

impl AuthResponse {
    /// Expiry as a naive timestamp, when the carrier sent a parseable one.
    #[must_use]
    pub fn expiry(&self) -> Option<NaiveDateTime> {
        self.expires_at
            .as_deref()
            .and_then(|value| NaiveDateTime::from_str(value.trim()).ok())
    }
}

/// Successful pre-posting response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PrePostingResponse {
    pub id: String,
    #[serde(rename = "codigoRastreio")]
    pub tracking_code: String,
    #[serde(rename = "valorServico", default, deserialize_with = "lenient_decimal")]
    pub service_cost: Option<Decimal>,
    #[serde(rename = "valorTotal", default, deserialize_with = "lenient_decimal")]
    pub total_cost: Option<Decimal>,
}

impl PrePostingResponse {
    /// Amount charged for the shipment, preferring the total.
    #[must_use]
    pub fn shipping_cost(&self) -> Option<Decimal> {
        self.total_cost.or(self.service_cost)
    }
}

/// Money fields arrive as numbers, dotted strings or comma strings
/// depending on the contract. Anything else is dropped.
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(decimal_from_value))
}

fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => Decimal::from_str(&number.to_string()).ok(),
        Value::String(text) => Decimal::from_str(&text.trim().replace(',', ".")).ok(),
        _ => None,
    }
}

/// Code, message and cause pulled out of a carrier error body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub cause: Option<String>,
}

impl ErrorDetails {
    /// Parse an error body.
    ///
    /// JSON bodies are searched for the field names Correios has used over
    /// time (`msgs`, `mensagem`, `message`, `codigo`, `causa`...). Anything
    /// that is not a JSON object becomes the message as-is.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(trimmed) else {
            return Self {
                message: (!trimmed.is_empty()).then(|| trimmed.to_string()),
                ..Self::default()
            };
        };

        let message = fields
            .get("msgs")
            .and_then(joined_messages)
            .or_else(|| first_text(&fields, &["mensagem", "message", "error"]))
            .or_else(|| (!trimmed.is_empty()).then(|| trimmed.to_string()));

        Self {
            code: first_text(&fields, &["codigo", "code"]),
            message,
            cause: first_text(&fields, &["causa", "cause"]),
        }
    }
}

fn joined_messages(value: &Value) -> Option<String> {
    let joined = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_text)
            .collect::<Vec<_>>()
            .join("; "),
        other => scalar_text(other)?,
    };
    (!joined.is_empty()).then_some(joined)
}

fn first_text(fields: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find_map(scalar_text)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_prepost_response_numeric_costs() {
        let response: PrePostingResponse = serde_json::from_str(
            r#"{"id":"PRE123","codigoRastreio":"AB123456789BR","valorServico":23.5,"valorTotal":"25,10"}"#,
        )
        .unwrap();
        assert_eq!(response.tracking_code, "AB123456789BR");
        assert_eq!(response.service_cost, Some(Decimal::new(235, 1)));
        assert_eq!(response.total_cost, Some(Decimal::new(2510, 2)));
        assert_eq!(response.shipping_cost(), Some(Decimal::new(2510, 2)));
    }

    #[test]
    fn test_prepost_response_without_costs() {
        let response: PrePostingResponse =
            serde_json::from_str(r#"{"id":"PRE1","codigoRastreio":"AB1BR","valorServico":null}"#)
                .unwrap();
        assert_eq!(response.shipping_cost(), None);
    }

    #[test]
    fn test_garbage_cost_is_dropped() {
        let response: PrePostingResponse = serde_json::from_str(
            r#"{"id":"PRE1","codigoRastreio":"AB1BR","valorServico":"n/a","valorTotal":{}}"#,
        )
        .unwrap();
        assert_eq!(response.shipping_cost(), None);
    }

    #[test]
    fn test_auth_response_expiry() {
        let response: AuthResponse = serde_json::from_str(
            r#"{"token":"abc","expiraEm":"2026-10-18T23:59:59","ambiente":"PRODUCAO"}"#,
        )
        .unwrap();
        assert_eq!(
            response.expiry().map(|at| at.to_string()),
            Some("2026-10-18 23:59:59".to_string())
        );
        assert_eq!(response.environment.as_deref(), Some("PRODUCAO"));
    }

    #[test]
    fn test_error_details_msgs_array() {
        let details = ErrorDetails::parse(
            r#"{"msgs":["PPN-295: peso não informado","PPN-100: outro"],"causa":"validacao"}"#,
        );
        assert_eq!(
            details.message.as_deref(),
            Some("PPN-295: peso não informado; PPN-100: outro")
        );
        assert_eq!(details.cause.as_deref(), Some("validacao"));
    }

    #[test]
    fn test_error_details_numeric_code() {
        let details = ErrorDetails::parse(r#"{"code":401,"message":"Unauthorized"}"#);
        assert_eq!(details.code.as_deref(), Some("401"));
        assert_eq!(details.message.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn test_error_details_unknown_json_keeps_raw() {
        let details = ErrorDetails::parse(r#"{"timestamp":"now"}"#);
        assert_eq!(details.message.as_deref(), Some(r#"{"timestamp":"now"}"#));
    }

    #[test]
    fn test_error_details_plain_text() {
        let details = ErrorDetails::parse("  upstream timeout ");
        assert_eq!(details.message.as_deref(), Some("upstream timeout"));
        assert_eq!(ErrorDetails::parse("").message, None);
    }
}
