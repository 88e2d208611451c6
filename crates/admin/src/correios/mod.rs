//! Correios pre-posting API client.
//!
//! Covers the slice of the carrier API needed to print a label:
//!
//! - token issue for a postage card (`auth`)
//! - pre-posting submission with structural fallbacks (`client`, `retry`)
//! - label and content-declaration PDF download (`client`)
//!
//! # Architecture
//!
//! [`CorreiosClient`] holds the HTTP client and the per-environment base
//! URLs. Authenticating yields a [`CorreiosSession`] bound to one base URL
//! and one bearer token, so a submission can never go out unauthenticated.
//!
//! The API is strict and its documentation lags behind what production
//! validates. Every rejection keeps the carrier's raw body in a
//! [`CarrierFault`] so it can be written to the error log verbatim.

pub mod auth;
pub mod client;
pub mod retry;
pub mod types;

pub use auth::CorreiosToken;
pub use client::{CorreiosClient, CorreiosEndpoints, CorreiosSession, Submission};

use serde_json::Value;
use thiserror::Error;

/// A non-2xx answer from the carrier, kept close to the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierFault {
    /// Path of the endpoint that answered, e.g. `/prepostagem/v1/prepostagens`.
    pub endpoint: String,
    pub status: u16,
    pub code: Option<String>,
    /// Carrier message, verbatim when one could be extracted.
    pub message: String,
    pub cause: Option<String>,
    pub raw_body: String,
}

impl CarrierFault {
    /// Build a fault from a response status and body text.
    #[must_use]
    pub fn from_body(endpoint: impl Into<String>, status: u16, raw_body: String) -> Self {
        let details = types::ErrorDetails::parse(&raw_body);
        let message = details
            .message
            .unwrap_or_else(|| format!("HTTP {status} without a response body"));

        Self {
            endpoint: endpoint.into(),
            status,
            code: details.code,
            message,
            cause: details.cause,
            raw_body,
        }
    }
}

impl std::fmt::Display for CarrierFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{code}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Errors that can occur when talking to Correios.
#[derive(Debug, Error)]
pub enum CorreiosError {
    /// Transport failure, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport failure while a pre-posting attempt was in flight.
    #[error("HTTP error while submitting the pre-posting: {source}")]
    SubmitTransport {
        source: reqwest::Error,
        /// Exact body of the attempt that never got an answer.
        attempted_payload: Value,
    },

    /// Token request refused; the carrier message is kept verbatim.
    #[error("Correios authentication failed: {0}")]
    AuthenticationFailed(CarrierFault),

    /// Pre-posting refused.
    #[error("Correios rejected the pre-posting: {fault}")]
    Rejected {
        fault: CarrierFault,
        /// Exact body that was sent with the rejected attempt.
        attempted_payload: Option<Value>,
    },

    /// Label or declaration PDF could not be downloaded.
    #[error("Correios document unavailable: {0}")]
    Document(CarrierFault),

    /// A 2xx answer we could not make sense of.
    #[error("Unexpected response from {endpoint}: {reason}")]
    UnexpectedResponse { endpoint: String, reason: String },

    /// Request body could not be rendered.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CorreiosError {
    /// Carrier fault behind this error, if the carrier answered at all.
    #[must_use]
    pub const fn fault(&self) -> Option<&CarrierFault> {
        match self {
            Self::AuthenticationFailed(fault) | Self::Document(fault) => Some(fault),
            Self::Rejected { fault, .. } => Some(fault),
            Self::Http(_)
            | Self::SubmitTransport { .. }
            | Self::UnexpectedResponse { .. }
            | Self::Json(_) => None,
        }
    }

    /// Body sent with the failed attempt, when there was one.
    #[must_use]
    pub const fn attempted_payload(&self) -> Option<&Value> {
        match self {
            Self::Rejected {
                attempted_payload, ..
            } => attempted_payload.as_ref(),
            Self::SubmitTransport {
                attempted_payload, ..
            } => Some(attempted_payload),
            _ => None,
        }
    }

    /// Endpoint the failed call targeted.
    #[must_use]
    pub fn endpoint(&self) -> Option<String> {
        match self {
            Self::Http(err) | Self::SubmitTransport { source: err, .. } => {
                err.url().map(|url| url.path().to_string())
            }
            Self::UnexpectedResponse { endpoint, .. } => Some(endpoint.clone()),
            _ => self.fault().map(|fault| fault.endpoint.clone()),
        }
    }

    /// Whether the carrier refused the document's shape rather than its data.
    ///
    /// Only these rejections are worth retrying with another variant.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        match self {
            Self::Rejected { fault, .. } => retry::is_structural_rejection(fault),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_from_json_body() {
        let fault = CarrierFault::from_body(
            "/prepostagem/v1/prepostagens",
            400,
            r#"{"msgs":["PPN-295: O peso do objeto deve ser informado."]}"#.to_string(),
        );
        assert_eq!(fault.message, "PPN-295: O peso do objeto deve ser informado.");
        assert_eq!(fault.status, 400);
    }

    #[test]
    fn test_fault_from_text_body() {
        let fault = CarrierFault::from_body("/token", 502, "Bad Gateway".to_string());
        assert_eq!(fault.message, "Bad Gateway");
        assert!(fault.code.is_none());
    }

    #[test]
    fn test_fault_from_empty_body() {
        let fault = CarrierFault::from_body("/token", 503, String::new());
        assert_eq!(fault.message, "HTTP 503 without a response body");
    }

    #[test]
    fn test_fault_display_includes_code() {
        let fault = CarrierFault::from_body(
            "/token/v1/autentica/cartaopostagem",
            401,
            r#"{"codigo":"CWS-401","mensagem":"Credenciais invalidas"}"#.to_string(),
        );
        assert_eq!(fault.to_string(), "[CWS-401] Credenciais invalidas");
    }

    #[test]
    fn test_rejected_exposes_attempted_payload() {
        let body = serde_json::json!({ "codigoServico": "03298" });
        let err = CorreiosError::Rejected {
            fault: CarrierFault::from_body("/p", 422, "nope".to_string()),
            attempted_payload: Some(body.clone()),
        };
        assert_eq!(err.attempted_payload(), Some(&body));
        assert_eq!(err.endpoint().as_deref(), Some("/p"));
        assert!(!err.is_structural());
    }

    #[tokio::test]
    async fn test_transport_failure_exposes_attempted_payload() {
        let source = reqwest::Client::new()
            .post("http://127.0.0.1:9/prepostagem/v1/prepostagens")
            .send()
            .await
            .expect_err("nothing listens on the discard port");
        let body = serde_json::json!({ "objetoPostal": { "peso": "300" } });

        let err = CorreiosError::SubmitTransport {
            source,
            attempted_payload: body.clone(),
        };

        assert_eq!(err.attempted_payload(), Some(&body));
        assert_eq!(err.endpoint().as_deref(), Some("/prepostagem/v1/prepostagens"));
        assert!(err.fault().is_none());
        assert!(!err.is_structural());
    }
}
