//! Correios HTTP client.
//!
//! ```text
//! CorreiosClient --authenticate--> CorreiosSession --submit--> Submission
//!                                        |
//!                                        +--fetch_label / fetch_declaration
//! ```

use std::time::Duration;

use correio_labels_core::payload::CarrierPayload;
use correio_labels_core::payload::variants::SubmitVariant;
use correio_labels_core::types::CarrierEnvironment;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::auth::{CorreiosToken, authenticate};
use super::retry::submit_with_fallbacks;
use super::types::PrePostingResponse;
use super::{CarrierFault, CorreiosError};

/// Production API base URL.
pub const PRODUCTION_URL: &str = "https://api.correios.com.br";
/// Staging ("homologação") API base URL.
pub const STAGING_URL: &str = "https://apihom.correios.com.br";

const PREPOSTING_PATH: &str = "/prepostagem/v1/prepostagens";

/// Base URLs per environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorreiosEndpoints {
    pub production: String,
    pub staging: String,
}

impl Default for CorreiosEndpoints {
    fn default() -> Self {
        Self {
            production: PRODUCTION_URL.to_string(),
            staging: STAGING_URL.to_string(),
        }
    }
}

impl CorreiosEndpoints {
    /// Base URL for an environment, without a trailing slash.
    #[must_use]
    pub fn base_url(&self, environment: CarrierEnvironment) -> &str {
        let url = match environment {
            CarrierEnvironment::Production => &self.production,
            CarrierEnvironment::Staging => &self.staging,
        };
        url.trim_end_matches('/')
    }
}

/// Unauthenticated entry point to the Correios API.
#[derive(Debug, Clone)]
pub struct CorreiosClient {
    http: reqwest::Client,
    endpoints: CorreiosEndpoints,
}

/// An accepted pre-posting.
#[derive(Debug, Clone)]
pub struct Submission {
    pub response: PrePostingResponse,
    /// Response body as received.
    pub raw_response: Value,
    /// Variant the carrier accepted.
    pub variant: SubmitVariant,
    /// Exact body of the accepted attempt.
    pub sent_payload: Value,
}

/// Client bound to one environment and one bearer token.
#[derive(Debug)]
pub struct CorreiosSession<'a> {
    http: &'a reqwest::Client,
    base_url: &'a str,
    token: CorreiosToken,
}

impl CorreiosClient {
    /// Create a client whose every request times out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `CorreiosError::Http` if the HTTP client cannot be built.
    pub fn new(endpoints: CorreiosEndpoints, timeout: Duration) -> Result<Self, CorreiosError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, endpoints })
    }

    #[must_use]
    pub const fn endpoints(&self) -> &CorreiosEndpoints {
        &self.endpoints
    }

    /// Obtain a token and open a session against `environment`.
    ///
    /// # Errors
    ///
    /// Returns `CorreiosError::AuthenticationFailed` if the carrier refuses
    /// the credentials.
    pub async fn authenticate(
        &self,
        environment: CarrierEnvironment,
        account_id: &str,
        access_code: &SecretString,
        postage_card: &str,
    ) -> Result<CorreiosSession<'_>, CorreiosError> {
        let base_url = self.endpoints.base_url(environment);
        let token =
            authenticate(&self.http, base_url, account_id, access_code, postage_card).await?;

        Ok(CorreiosSession {
            http: &self.http,
            base_url,
            token,
        })
    }
}

impl CorreiosSession<'_> {
    #[must_use]
    pub const fn token(&self) -> &CorreiosToken {
        &self.token
    }

    /// Submit a pre-posting, falling back through the structural variants.
    ///
    /// # Errors
    ///
    /// Returns the error of the first non-structural rejection, or of the
    /// last variant when all of them were refused.
    pub async fn submit(&self, payload: &CarrierPayload) -> Result<Submission, CorreiosError> {
        let ((response, raw_response, sent_payload), variant) =
            submit_with_fallbacks(payload, |variant, body| self.submit_once(variant, body))
                .await?;

        Ok(Submission {
            response,
            raw_response,
            variant,
            sent_payload,
        })
    }

    /// One POST to the pre-posting endpoint.
    #[instrument(skip(self, body))]
    async fn submit_once(
        &self,
        variant: SubmitVariant,
        body: Value,
    ) -> Result<(PrePostingResponse, Value, Value), CorreiosError> {
        let sent = self
            .http
            .post(format!("{}{PREPOSTING_PATH}", self.base_url))
            .bearer_auth(self.token.token.expose_secret())
            .json(&body)
            .send()
            .await;
        let response = match sent {
            Ok(response) => response,
            Err(source) => return Err(in_flight(source, body)),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(source) => return Err(in_flight(source, body)),
        };

        if !status.is_success() {
            return Err(CorreiosError::Rejected {
                fault: CarrierFault::from_body(PREPOSTING_PATH, status.as_u16(), text),
                attempted_payload: Some(body),
            });
        }

        let raw: Value = serde_json::from_str(&text).map_err(|e| {
            CorreiosError::UnexpectedResponse {
                endpoint: PREPOSTING_PATH.to_string(),
                reason: format!("invalid JSON: {e}"),
            }
        })?;
        let parsed: PrePostingResponse =
            serde_json::from_value(raw.clone()).map_err(|e| CorreiosError::UnexpectedResponse {
                endpoint: PREPOSTING_PATH.to_string(),
                reason: format!("missing pre-posting fields: {e}"),
            })?;

        debug!(prepost_id = %parsed.id, tracking_code = %parsed.tracking_code, "Pre-posting accepted");
        Ok((parsed, raw, body))
    }

    /// Download the label PDF.
    ///
    /// # Errors
    ///
    /// Returns `CorreiosError::Document` on any non-2xx answer.
    #[instrument(skip(self))]
    pub async fn fetch_label(&self, prepost_id: &str) -> Result<Vec<u8>, CorreiosError> {
        self.fetch_pdf(&format!("{PREPOSTING_PATH}/{prepost_id}/rotulo"))
            .await
    }

    /// Download the content declaration PDF.
    ///
    /// The current path is tried first, then the legacy one.
    ///
    /// # Errors
    ///
    /// Returns the legacy path's error when both fail.
    #[instrument(skip(self))]
    pub async fn fetch_declaration(&self, prepost_id: &str) -> Result<Vec<u8>, CorreiosError> {
        let current = format!("{PREPOSTING_PATH}/{prepost_id}/declaracaoConteudo");
        match self.fetch_pdf(&current).await {
            Ok(pdf) => Ok(pdf),
            Err(err) => {
                warn!(error = %err, "Declaration path failed, trying legacy path");
                self.fetch_pdf(&format!("{PREPOSTING_PATH}/declaracaoconteudo/{prepost_id}"))
                    .await
            }
        }
    }

    async fn fetch_pdf(&self, path: &str) -> Result<Vec<u8>, CorreiosError> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(self.token.token.expose_secret())
            .header(reqwest::header::ACCEPT, "application/pdf")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CorreiosError::Document(CarrierFault::from_body(
                path,
                status.as_u16(),
                body,
            )));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(CorreiosError::UnexpectedResponse {
                endpoint: path.to_string(),
                reason: "empty document".to_string(),
            });
        }

        Ok(bytes.to_vec())
    }
}

const fn in_flight(source: reqwest::Error, attempted_payload: Value) -> CorreiosError {
    CorreiosError::SubmitTransport {
        source,
        attempted_payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let endpoints = CorreiosEndpoints::default();
        assert_eq!(
            endpoints.base_url(CarrierEnvironment::Production),
            "https://api.correios.com.br"
        );
        assert_eq!(
            endpoints.base_url(CarrierEnvironment::Staging),
            "https://apihom.correios.com.br"
        );
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let endpoints = CorreiosEndpoints {
            production: "http://127.0.0.1:9000/".to_string(),
            staging: "http://127.0.0.1:9001".to_string(),
        };
        assert_eq!(
            endpoints.base_url(CarrierEnvironment::Production),
            "http://127.0.0.1:9000"
        );
    }
}
