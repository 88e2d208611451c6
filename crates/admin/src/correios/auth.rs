//! Correios token issue.
//!
//! Tokens are tied to a postage card: Basic auth with the portal account and
//! API access code, the card number in the body.

use chrono::NaiveDateTime;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use super::types::{AuthRequest, AuthResponse};
use super::{CarrierFault, CorreiosError};

/// Token endpoint path, relative to the environment base URL.
pub const AUTH_PATH: &str = "/token/v1/autentica/cartaopostagem";

/// Bearer token obtained for one postage card.
#[derive(Debug, Clone)]
pub struct CorreiosToken {
    pub token: SecretString,
    /// Expiry as reported by the carrier (Brasília local time).
    pub expires_at: Option<NaiveDateTime>,
    /// Environment the carrier says issued the token.
    pub environment: Option<String>,
}

/// Request a token for `postage_card`.
///
/// # Errors
///
/// Returns `CorreiosError::AuthenticationFailed` with the carrier's message
/// on any non-2xx answer, or `CorreiosError::Http` on transport failure.
#[instrument(skip(client, access_code), fields(account_id = %account_id))]
pub async fn authenticate(
    client: &reqwest::Client,
    base_url: &str,
    account_id: &str,
    access_code: &SecretString,
    postage_card: &str,
) -> Result<CorreiosToken, CorreiosError> {
    let response = client
        .post(format!("{base_url}{AUTH_PATH}"))
        .basic_auth(account_id, Some(access_code.expose_secret()))
        .json(&AuthRequest {
            numero: postage_card,
        })
        .send()
        .await?;

    let status = response.status();

    if status.is_success() {
        let auth_response: AuthResponse = response.json().await?;
        if auth_response.token.trim().is_empty() {
            return Err(CorreiosError::UnexpectedResponse {
                endpoint: AUTH_PATH.to_string(),
                reason: "token response without a token".to_string(),
            });
        }

        Ok(CorreiosToken {
            expires_at: auth_response.expiry(),
            environment: auth_response.environment.clone(),
            token: SecretString::from(auth_response.token),
        })
    } else {
        let body = response.text().await.unwrap_or_default();

        Err(CorreiosError::AuthenticationFailed(CarrierFault::from_body(
            AUTH_PATH,
            status.as_u16(),
            body,
        )))
    }
}
