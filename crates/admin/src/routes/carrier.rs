//! Caller-facing Correios actions.
//!
//! A single endpoint dispatches on the `action` field of the JSON body:
//!
//! ```text
//! POST /api/carrier/correios
//!   { "action": "get_services" }
//!   { "action": "test_connection", "tenant_id": "..." }
//!   { "action": "save_config", "tenant_id": "...", "config": { ... } }
//!   { "action": "generate_label", "tenant_id": "...", "recipient": { ... }, ... }
//! ```
//!
//! The answer is always HTTP 200 with a `success` flag; failures carry an
//! `error` string and, when the carrier answered, `details` about it.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use correio_labels_core::{LabelRequest, TenantId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{instrument, warn};

use crate::services::{CarrierSettings, LabelError};
use crate::state::AppState;

/// Build the carrier actions router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/carrier/correios", post(handle_action))
}

// =============================================================================
// API Types
// =============================================================================

/// Request body, tagged by `action`.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CarrierAction {
    GetServices,
    TestConnection {
        tenant_id: TenantId,
    },
    SaveConfig {
        tenant_id: TenantId,
        config: CarrierSettings,
    },
    GenerateLabel(LabelRequest),
}

impl CarrierAction {
    const fn name(&self) -> &'static str {
        match self {
            Self::GetServices => "get_services",
            Self::TestConnection { .. } => "test_connection",
            Self::SaveConfig { .. } => "save_config",
            Self::GenerateLabel(_) => "generate_label",
        }
    }
}

/// What the carrier said, when it said something.
#[derive(Debug, Serialize)]
pub struct CarrierDiagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl CarrierDiagnostics {
    fn from_error(err: &LabelError) -> Option<Self> {
        let carrier = err.carrier()?;
        let fault = carrier.fault();
        Some(Self {
            endpoint: carrier.endpoint(),
            status: fault.map(|fault| fault.status),
            code: fault.and_then(|fault| fault.code.clone()),
            cause: fault.and_then(|fault| fault.cause.clone()),
        })
    }
}

/// API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<CarrierDiagnostics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiResponse {
    fn success(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            details: None,
            data,
        }
    }

    fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            details: None,
            data: None,
        }
    }

    fn from_label_error(err: &LabelError) -> Self {
        Self {
            details: CarrierDiagnostics::from_error(err),
            ..Self::error(err.to_string())
        }
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// POST /api/carrier/correios - run one carrier action.
#[instrument(skip(state, body))]
async fn handle_action(
    State(state): State<AppState>,
    body: Result<Json<CarrierAction>, JsonRejection>,
) -> Json<ApiResponse> {
    let action = match body {
        Ok(Json(action)) => action,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected carrier action body");
            return Json(ApiResponse::error(format!(
                "Invalid request: {}",
                rejection.body_text()
            )));
        }
    };

    let name = action.name();
    let result = run(&state, action).await;

    Json(match result {
        Ok(response) => response,
        Err(err) => {
            warn!(action = name, error = %err, "Carrier action failed");
            ApiResponse::from_label_error(&err)
        }
    })
}

async fn run(state: &AppState, action: CarrierAction) -> Result<ApiResponse, LabelError> {
    let service = state.labels();

    match action {
        CarrierAction::GetServices => Ok(ApiResponse::success(
            "Services loaded",
            Some(to_data(service.get_services())),
        )),
        CarrierAction::TestConnection { tenant_id } => {
            let report = service.test_connection(tenant_id).await?;
            Ok(ApiResponse::success(
                format!("Connected to Correios ({})", report.environment),
                Some(to_data(&report)),
            ))
        }
        CarrierAction::SaveConfig { tenant_id, config } => {
            service.save_config(tenant_id, config).await?;
            Ok(ApiResponse::success("Correios settings saved", None))
        }
        CarrierAction::GenerateLabel(request) => {
            let label = service.generate_label(request).await?;
            Ok(ApiResponse::success(
                format!("Label generated: {}", label.tracking_code),
                Some(to_data(&label)),
            ))
        }
    }
}

fn to_data<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_action_tags() {
        let action: CarrierAction =
            serde_json::from_str(r#"{"action":"get_services"}"#).unwrap();
        assert_eq!(action.name(), "get_services");

        let action: CarrierAction = serde_json::from_str(
            r#"{"action":"test_connection","tenant_id":"7f1c1f5e-2f3b-4c47-9d61-0a4b8f1e2d3c"}"#,
        )
        .unwrap();
        assert_eq!(action.name(), "test_connection");
    }

    #[test]
    fn test_generate_label_body_is_flat() {
        let action: CarrierAction = serde_json::from_value(serde_json::json!({
            "action": "generate_label",
            "tenant_id": "7f1c1f5e-2f3b-4c47-9d61-0a4b8f1e2d3c",
            "recipient": {
                "name": "Ana",
                "address": {
                    "street": "Rua A", "number": "1", "neighborhood": "Centro",
                    "city": "Recife", "state": "PE", "postal_code": "50000-000"
                }
            },
            "invoice_key": "undefined"
        }))
        .unwrap();

        let CarrierAction::GenerateLabel(request) = action else {
            panic!("expected generate_label");
        };
        assert_eq!(request.invoice_key.as_deref(), Some("undefined"));
    }

    #[test]
    fn test_error_response_shape() {
        let json = serde_json::to_value(ApiResponse::from_label_error(&LabelError::NotConfigured))
            .unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Correios is not configured for this account");
        assert!(json.get("details").is_none());
        assert!(json.get("data").is_none());
    }
}
