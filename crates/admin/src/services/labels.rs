//! Label generation service.
//!
//! Drives one label from request to stored PDF:
//!
//! 1. load and check the tenant's carrier configuration
//! 2. assemble and validate the pre-posting document
//! 3. authenticate, submit (with structural fallbacks), download the label
//! 4. download the content declaration when no NF-e travels with the package
//! 5. upload the PDFs, insert the label record, propagate the tracking code
//!
//! Steps 1-3 are fatal. From step 4 on the carrier has already issued a
//! tracking code, so failures are logged and reported as warnings but never
//! take the code away from the caller.
//!
//! Every failure, fatal or not, is written to the carrier error log.

use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use correio_labels_core::credential::CredentialCodec;
use correio_labels_core::dimensions::RequestedDims;
use correio_labels_core::payload::assemble;
use correio_labels_core::sanitize::{digits_only, non_blank};
use correio_labels_core::services::{CarrierService, SERVICES, service_name};
use correio_labels_core::{
    Address, CarrierConfig, CarrierEnvironment, LabelId, LabelRecord, LabelRequest, LabelStatus,
    PackageType, SenderIdentity, TenantId, TrackingEvent,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::correios::{CorreiosClient, CorreiosError, CorreiosSession};
use crate::db::{
    CarrierConfigStore, ErrorLogStore, LabelStore, NewCarrierErrorLog, RepositoryError,
};
use crate::storage::{BlobStore, PDF_CONTENT_TYPE, declaration_path, label_path};

const POSTAL_CODE_DIGITS: usize = 8;

/// Errors returned by the label service.
#[derive(Debug, Error)]
pub enum LabelError {
    /// Tenant has never saved a carrier configuration.
    #[error("Correios is not configured for this account")]
    NotConfigured,

    /// Configuration exists but is switched off.
    #[error("Correios integration is disabled for this account")]
    Inactive,

    /// Configuration is missing something the carrier needs.
    #[error("Invalid Correios configuration: {0}")]
    InvalidConfig(String),

    /// Request is missing something the carrier needs.
    #[error("Invalid label request: {0}")]
    InvalidRequest(String),

    /// Carrier call failed.
    #[error(transparent)]
    Carrier(#[from] CorreiosError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl LabelError {
    #[must_use]
    pub const fn carrier(&self) -> Option<&CorreiosError> {
        match self {
            Self::Carrier(err) => Some(err),
            _ => None,
        }
    }
}

/// A label the carrier accepted.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedLabel {
    pub label_id: LabelId,
    pub tracking_code: String,
    pub pre_posting_id: String,
    pub service_code: String,
    pub service_name: String,
    pub label_url: Option<String>,
    pub declaration_url: Option<String>,
    pub shipping_cost: Option<Decimal>,
    /// Shape of the document the carrier accepted.
    pub submitted_as: &'static str,
    /// Non-fatal problems after the tracking code was issued.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Outcome of a connection test.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
    pub environment: CarrierEnvironment,
    pub account_id: String,
    pub token_expires_at: Option<NaiveDateTime>,
}

/// Carrier settings as submitted by the settings form.
///
/// `access_code` is plaintext here. Leaving it blank keeps the stored one.
#[derive(Clone, Deserialize)]
pub struct CarrierSettings {
    pub account_id: String,
    #[serde(default)]
    pub access_code: Option<String>,
    pub contract_number: String,
    pub postage_card: String,
    pub environment: CarrierEnvironment,
    pub sender: SenderIdentity,
    pub default_service_code: String,
    #[serde(default)]
    pub default_package_type: PackageType,
    #[serde(default)]
    pub default_dims: RequestedDims,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl std::fmt::Debug for CarrierSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrierSettings")
            .field("account_id", &self.account_id)
            .field("access_code", &self.access_code.as_ref().map(|_| "[REDACTED]"))
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

/// Label generation and carrier settings.
#[derive(Clone)]
pub struct LabelService {
    configs: Arc<dyn CarrierConfigStore>,
    labels: Arc<dyn LabelStore>,
    error_log: Arc<dyn ErrorLogStore>,
    blobs: Arc<dyn BlobStore>,
    correios: CorreiosClient,
    codec: CredentialCodec,
}

impl LabelService {
    #[must_use]
    pub fn new(
        configs: Arc<dyn CarrierConfigStore>,
        labels: Arc<dyn LabelStore>,
        error_log: Arc<dyn ErrorLogStore>,
        blobs: Arc<dyn BlobStore>,
        correios: CorreiosClient,
        codec: CredentialCodec,
    ) -> Self {
        Self {
            configs,
            labels,
            error_log,
            blobs,
            correios,
            codec,
        }
    }

    /// Known Correios services.
    #[must_use]
    pub const fn get_services(&self) -> &'static [CarrierService] {
        SERVICES
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Validate and store a tenant's carrier settings.
    ///
    /// # Errors
    ///
    /// Returns `LabelError::InvalidConfig` when a required field is blank,
    /// or a repository error if the upsert fails.
    #[instrument(skip(self, settings), fields(tenant_id = %tenant_id))]
    pub async fn save_config(
        &self,
        tenant_id: TenantId,
        settings: CarrierSettings,
    ) -> Result<(), LabelError> {
        let result = self.save_config_inner(tenant_id, settings).await;
        if let Err(err) = &result {
            self.log_failure(tenant_id, "save_config", err, None).await;
        }
        result
    }

    async fn save_config_inner(
        &self,
        tenant_id: TenantId,
        settings: CarrierSettings,
    ) -> Result<(), LabelError> {
        validate_settings(&settings)?;

        let access_code = match non_blank(settings.access_code.as_deref()) {
            Some(plain) => self.codec.obfuscate(&plain),
            None => self
                .configs
                .find(tenant_id)
                .await?
                .map(|existing| existing.access_code)
                .ok_or_else(|| LabelError::InvalidConfig("access code is required".to_string()))?,
        };

        let config = CarrierConfig {
            tenant_id,
            account_id: settings.account_id.trim().to_string(),
            access_code,
            contract_number: settings.contract_number.trim().to_string(),
            postage_card: settings.postage_card.trim().to_string(),
            environment: settings.environment,
            sender: settings.sender,
            default_service_code: settings.default_service_code.trim().to_string(),
            default_package_type: settings.default_package_type,
            default_dims: settings.default_dims,
            active: settings.active,
        };

        self.configs.upsert(&config).await?;
        info!(environment = %config.environment, "Carrier settings saved");
        Ok(())
    }

    // =========================================================================
    // Connection test
    // =========================================================================

    /// Authenticate with the stored configuration.
    ///
    /// # Errors
    ///
    /// Returns `LabelError::NotConfigured` without a configuration, or the
    /// carrier's authentication error.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn test_connection(&self, tenant_id: TenantId) -> Result<ConnectionReport, LabelError> {
        let result = async {
            let config = self.load_config(tenant_id, false).await?;
            let session = self.open_session(&config).await?;
            Ok::<_, LabelError>(ConnectionReport {
                environment: config.environment,
                account_id: config.account_id.clone(),
                token_expires_at: session.token().expires_at,
            })
        }
        .await;

        if let Err(err) = &result {
            self.log_failure(tenant_id, "test_connection", err, None).await;
        }
        result
    }

    // =========================================================================
    // Label generation
    // =========================================================================

    /// Generate one label.
    ///
    /// # Errors
    ///
    /// Returns configuration, request, authentication, submission and label
    /// download errors. Later failures are reported in
    /// [`GeneratedLabel::warnings`].
    #[instrument(skip(self, request), fields(tenant_id = %request.tenant_id))]
    pub async fn generate_label(&self, request: LabelRequest) -> Result<GeneratedLabel, LabelError> {
        let tenant_id = request.tenant_id;

        let config = match self.load_config(tenant_id, true).await {
            Ok(config) => config,
            Err(err) => {
                self.log_failure(tenant_id, "generate_label", &err, None).await;
                return Err(err);
            }
        };
        if let Err(err) = validate_request(&request) {
            self.log_failure(tenant_id, "generate_label", &err, None).await;
            return Err(err);
        }

        let assembled = assemble(&config, &request);
        let canonical = serde_json::to_value(&assembled.payload).ok();

        let session = match self.open_session(&config).await {
            Ok(session) => session,
            Err(err) => {
                self.log_failure(tenant_id, "generate_label", &err, None).await;
                return Err(err);
            }
        };

        let submission = match session.submit(&assembled.payload).await {
            Ok(submission) => submission,
            Err(err) => {
                let err = LabelError::from(err);
                self.log_failure(tenant_id, "generate_label", &err, canonical.as_ref())
                    .await;
                return Err(err);
            }
        };

        let response = &submission.response;
        let tracking_code = response.tracking_code.clone();
        info!(
            tracking_code = %tracking_code,
            variant = %submission.variant,
            "Pre-posting accepted"
        );

        let label_pdf = match session.fetch_label(&response.id).await {
            Ok(pdf) => pdf,
            Err(err) => {
                let err = LabelError::from(err);
                self.log_failure(tenant_id, "generate_label", &err, Some(&submission.sent_payload))
                    .await;
                return Err(err);
            }
        };

        let mut warnings = Vec::new();

        let declaration_pdf = if assembled.has_valid_invoice_key {
            None
        } else {
            self.fetch_declaration(&session, tenant_id, &response.id, &mut warnings)
                .await
        };

        let label_url = self
            .store_pdf(
                tenant_id,
                &label_path(tenant_id, &tracking_code),
                label_pdf,
                &mut warnings,
            )
            .await;
        let declaration_url = match declaration_pdf {
            Some(pdf) => {
                self.store_pdf(
                    tenant_id,
                    &declaration_path(tenant_id, &tracking_code),
                    pdf,
                    &mut warnings,
                )
                .await
            }
            None => None,
        };

        let service_code = assembled.payload.service_code.clone();
        let record = LabelRecord {
            id: LabelId::generate(),
            tenant_id,
            sale_id: request.sale_id,
            tracking_code: tracking_code.clone(),
            service_name: service_name(&service_code),
            service_code,
            recipient: request.recipient.clone(),
            dimensions: assembled.dimensions,
            declared_value: assembled.declared_value,
            shipping_cost: response.shipping_cost(),
            label_pdf_url: label_url.clone(),
            declaration_pdf_url: declaration_url.clone(),
            status: LabelStatus::Generated,
            pre_posting_id: response.id.clone(),
            api_response: submission.raw_response.clone(),
            created_at: Utc::now(),
        };

        self.persist(&record, &mut warnings).await;

        Ok(GeneratedLabel {
            label_id: record.id,
            tracking_code,
            pre_posting_id: record.pre_posting_id,
            service_code: record.service_code,
            service_name: record.service_name,
            label_url,
            declaration_url,
            shipping_cost: record.shipping_cost,
            submitted_as: submission.variant.as_str(),
            warnings,
        })
    }

    // =========================================================================
    // Steps
    // =========================================================================

    async fn load_config(
        &self,
        tenant_id: TenantId,
        require_active: bool,
    ) -> Result<CarrierConfig, LabelError> {
        let config = self
            .configs
            .find(tenant_id)
            .await?
            .ok_or(LabelError::NotConfigured)?;

        if require_active && !config.active {
            return Err(LabelError::Inactive);
        }

        for (field, value) in [
            ("account id", &config.account_id),
            ("access code", &config.access_code),
            ("postage card", &config.postage_card),
        ] {
            if value.trim().is_empty() {
                return Err(LabelError::InvalidConfig(format!("{field} is missing")));
            }
        }

        Ok(config)
    }

    async fn open_session(&self, config: &CarrierConfig) -> Result<CorreiosSession<'_>, LabelError> {
        let access_code = SecretString::from(self.codec.reveal(&config.access_code));
        let session = self
            .correios
            .authenticate(
                config.environment,
                &config.account_id,
                &access_code,
                &config.postage_card,
            )
            .await?;
        Ok(session)
    }

    async fn fetch_declaration(
        &self,
        session: &CorreiosSession<'_>,
        tenant_id: TenantId,
        prepost_id: &str,
        warnings: &mut Vec<String>,
    ) -> Option<Vec<u8>> {
        match session.fetch_declaration(prepost_id).await {
            Ok(pdf) => Some(pdf),
            Err(err) => {
                warn!(error = %err, "Content declaration unavailable");
                let err = LabelError::from(err);
                warnings.push(format!("content declaration unavailable: {err}"));
                self.log_failure(tenant_id, "fetch_declaration", &err, None)
                    .await;
                None
            }
        }
    }

    async fn store_pdf(
        &self,
        tenant_id: TenantId,
        path: &str,
        pdf: Vec<u8>,
        warnings: &mut Vec<String>,
    ) -> Option<String> {
        match self.blobs.upload(path, pdf, PDF_CONTENT_TYPE).await {
            Ok(()) => Some(self.blobs.public_url(path)),
            Err(err) => {
                warn!(error = %err, path, "PDF upload failed");
                let message = format!("upload of {path} failed: {err}");
                self.log_message(tenant_id, "upload_document", message.clone())
                    .await;
                warnings.push(message);
                None
            }
        }
    }

    async fn persist(&self, record: &LabelRecord, warnings: &mut Vec<String>) {
        if let Err(err) = self.labels.insert_label(record).await {
            error!(error = %err, tracking_code = %record.tracking_code, "Label record not saved");
            let message = format!("label record not saved: {err}");
            self.log_message(record.tenant_id, "save_label", message.clone())
                .await;
            warnings.push(message);
        }

        let Some(sale_id) = record.sale_id else {
            return;
        };

        let changed = match self
            .labels
            .set_sale_tracking_code(record.tenant_id, sale_id, &record.tracking_code)
            .await
        {
            Ok(changed) => changed,
            Err(err) => {
                error!(error = %err, %sale_id, "Tracking code not propagated to sale");
                let message = format!("tracking code not propagated to sale: {err}");
                self.log_message(record.tenant_id, "propagate_tracking", message.clone())
                    .await;
                warnings.push(message);
                return;
            }
        };

        if !changed {
            return;
        }

        let event = TrackingEvent {
            sale_id,
            tracking_code: record.tracking_code.clone(),
            status: LabelStatus::Generated,
            description: format!("Etiqueta gerada: {}", record.service_name),
            occurred_at: record.created_at,
        };
        if let Err(err) = self.labels.append_tracking_event(&event).await {
            error!(error = %err, %sale_id, "Tracking event not recorded");
            let message = format!("tracking event not recorded: {err}");
            self.log_message(record.tenant_id, "propagate_tracking", message.clone())
                .await;
            warnings.push(message);
        }
    }

    // =========================================================================
    // Error log
    // =========================================================================

    async fn log_failure(
        &self,
        tenant_id: TenantId,
        action: &str,
        err: &LabelError,
        payload: Option<&Value>,
    ) {
        let carrier = err.carrier();
        let fault = carrier.and_then(CorreiosError::fault);

        let entry = NewCarrierErrorLog {
            tenant_id,
            action: action.to_string(),
            endpoint: carrier.and_then(CorreiosError::endpoint),
            http_status: fault.map(|fault| fault.status),
            raw_body: fault.map(|fault| fault.raw_body.clone()),
            payload: carrier
                .and_then(CorreiosError::attempted_payload)
                .or(payload)
                .cloned(),
            message: err.to_string(),
            created_at: Utc::now(),
        };
        self.write_log(&entry).await;
    }

    async fn log_message(&self, tenant_id: TenantId, action: &str, message: String) {
        let entry = NewCarrierErrorLog {
            tenant_id,
            action: action.to_string(),
            endpoint: None,
            http_status: None,
            raw_body: None,
            payload: None,
            message,
            created_at: Utc::now(),
        };
        self.write_log(&entry).await;
    }

    async fn write_log(&self, entry: &NewCarrierErrorLog) {
        if let Err(err) = self.error_log.log_error(entry).await {
            error!(error = %err, action = %entry.action, "Failed to write carrier error log");
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_settings(settings: &CarrierSettings) -> Result<(), LabelError> {
    let sender = &settings.sender;
    let required = [
        ("account id", settings.account_id.as_str()),
        ("contract number", settings.contract_number.as_str()),
        ("postage card", settings.postage_card.as_str()),
        ("default service code", settings.default_service_code.as_str()),
        ("sender name", sender.name.as_str()),
        ("sender tax id", sender.tax_id.as_str()),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(LabelError::InvalidConfig(format!("{field} is required")));
        }
    }

    validate_address(&sender.address, "sender").map_err(LabelError::InvalidConfig)
}

fn validate_request(request: &LabelRequest) -> Result<(), LabelError> {
    if request.recipient.name.trim().is_empty() {
        return Err(LabelError::InvalidRequest(
            "recipient name is required".to_string(),
        ));
    }
    validate_address(&request.recipient.address, "recipient").map_err(LabelError::InvalidRequest)
}

fn validate_address(address: &Address, party: &str) -> Result<(), String> {
    let required = [
        ("street", address.street.as_str()),
        ("number", address.number.as_str()),
        ("neighborhood", address.neighborhood.as_str()),
        ("city", address.city.as_str()),
        ("state", address.state.as_str()),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(format!("{party} {field} is required"));
        }
    }

    if digits_only(&address.postal_code).len() != POSTAL_CODE_DIGITS {
        return Err(format!("{party} postal code must have 8 digits"));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use correio_labels_core::SaleId;

    use super::*;
    use crate::correios::CorreiosEndpoints;
    use crate::storage::StorageError;

    #[derive(Default)]
    struct MemoryConfigs(Mutex<HashMap<TenantId, CarrierConfig>>);

    #[async_trait]
    impl CarrierConfigStore for MemoryConfigs {
        async fn find(&self, tenant_id: TenantId) -> Result<Option<CarrierConfig>, RepositoryError> {
            Ok(self.0.lock().unwrap().get(&tenant_id).cloned())
        }

        async fn upsert(&self, config: &CarrierConfig) -> Result<(), RepositoryError> {
            self.0
                .lock()
                .unwrap()
                .insert(config.tenant_id, config.clone());
            Ok(())
        }
    }

    struct NoLabels;

    #[async_trait]
    impl LabelStore for NoLabels {
        async fn insert_label(&self, _record: &LabelRecord) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn set_sale_tracking_code(
            &self,
            _tenant_id: TenantId,
            _sale_id: SaleId,
            _tracking_code: &str,
        ) -> Result<bool, RepositoryError> {
            Ok(false)
        }

        async fn append_tracking_event(&self, _event: &TrackingEvent) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryErrorLog(Mutex<Vec<NewCarrierErrorLog>>);

    #[async_trait]
    impl ErrorLogStore for MemoryErrorLog {
        async fn log_error(&self, entry: &NewCarrierErrorLog) -> Result<(), RepositoryError> {
            self.0.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    struct NoBlobs;

    #[async_trait]
    impl BlobStore for NoBlobs {
        async fn upload(
            &self,
            _path: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<(), StorageError> {
            Ok(())
        }

        fn public_url(&self, path: &str) -> String {
            format!("memory://{path}")
        }
    }

    struct Fixture {
        service: LabelService,
        configs: Arc<MemoryConfigs>,
        error_log: Arc<MemoryErrorLog>,
    }

    fn fixture() -> Fixture {
        let configs = Arc::new(MemoryConfigs::default());
        let error_log = Arc::new(MemoryErrorLog::default());
        let correios = CorreiosClient::new(
            CorreiosEndpoints {
                production: "http://127.0.0.1:9".to_string(),
                staging: "http://127.0.0.1:9".to_string(),
            },
            Duration::from_secs(1),
        )
        .unwrap();

        let service = LabelService::new(
            configs.clone(),
            Arc::new(NoLabels),
            error_log.clone(),
            Arc::new(NoBlobs),
            correios,
            CredentialCodec::new("k3y-for-tests"),
        );

        Fixture {
            service,
            configs,
            error_log,
        }
    }

    fn address() -> Address {
        Address {
            street: "Rua XV de Novembro".to_string(),
            number: "50".to_string(),
            complement: None,
            neighborhood: "Centro".to_string(),
            city: "Curitiba".to_string(),
            state: "PR".to_string(),
            postal_code: "80020-310".to_string(),
        }
    }

    fn settings(access_code: Option<&str>) -> CarrierSettings {
        CarrierSettings {
            account_id: " loja ".to_string(),
            access_code: access_code.map(str::to_string),
            contract_number: "9912345678".to_string(),
            postage_card: "0076543210".to_string(),
            environment: CarrierEnvironment::Staging,
            sender: SenderIdentity {
                name: "Loja".to_string(),
                tax_id: "12345678000199".to_string(),
                phone: None,
                email: None,
                address: address(),
            },
            default_service_code: "03298".to_string(),
            default_package_type: PackageType::Box,
            default_dims: RequestedDims::default(),
            active: true,
        }
    }

    #[tokio::test]
    async fn test_save_config_obfuscates_access_code() {
        let fx = fixture();
        let tenant_id = TenantId::generate();

        fx.service
            .save_config(tenant_id, settings(Some("plain-code")))
            .await
            .unwrap();

        let stored = fx.configs.find(tenant_id).await.unwrap().unwrap();
        assert_eq!(stored.account_id, "loja");
        assert!(CredentialCodec::is_obfuscated(&stored.access_code));
        assert_ne!(stored.access_code, "plain-code");
        assert_eq!(fx.service.codec.reveal(&stored.access_code), "plain-code");
    }

    #[tokio::test]
    async fn test_blank_access_code_keeps_stored_one() {
        let fx = fixture();
        let tenant_id = TenantId::generate();

        fx.service
            .save_config(tenant_id, settings(Some("first-code")))
            .await
            .unwrap();
        let before = fx.configs.find(tenant_id).await.unwrap().unwrap();

        fx.service
            .save_config(tenant_id, settings(Some("   ")))
            .await
            .unwrap();
        let after = fx.configs.find(tenant_id).await.unwrap().unwrap();

        assert_eq!(before.access_code, after.access_code);
    }

    #[tokio::test]
    async fn test_first_save_requires_access_code() {
        let fx = fixture();
        let err = fx
            .service
            .save_config(TenantId::generate(), settings(None))
            .await
            .unwrap_err();

        assert!(matches!(err, LabelError::InvalidConfig(_)));
        assert_eq!(fx.error_log.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_config_rejects_bad_sender_postal_code() {
        let fx = fixture();
        let mut settings = settings(Some("code"));
        settings.sender.address.postal_code = "800".to_string();

        let err = fx
            .service
            .save_config(TenantId::generate(), settings)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("postal code"));
    }

    #[tokio::test]
    async fn test_generate_without_config_is_logged() {
        let fx = fixture();
        let tenant_id = TenantId::generate();
        let request = LabelRequest {
            tenant_id,
            sale_id: None,
            recipient: correio_labels_core::Recipient {
                name: "Ana".to_string(),
                address: address(),
                ..Default::default()
            },
            package: None,
            service_code: None,
            invoice_number: None,
            invoice_key: None,
        };

        let err = fx.service.generate_label(request).await.unwrap_err();
        assert!(matches!(err, LabelError::NotConfigured));

        let log = fx.error_log.0.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action, "generate_label");
        assert_eq!(log[0].tenant_id, tenant_id);
    }

    #[tokio::test]
    async fn test_inactive_config_refuses_labels() {
        let fx = fixture();
        let tenant_id = TenantId::generate();
        let mut settings = settings(Some("code"));
        settings.active = false;
        fx.service.save_config(tenant_id, settings).await.unwrap();

        let request = LabelRequest {
            tenant_id,
            sale_id: None,
            recipient: correio_labels_core::Recipient {
                name: "Ana".to_string(),
                address: address(),
                ..Default::default()
            },
            package: None,
            service_code: None,
            invoice_number: None,
            invoice_key: None,
        };

        let err = fx.service.generate_label(request).await.unwrap_err();
        assert!(matches!(err, LabelError::Inactive));
    }

    #[test]
    fn test_settings_debug_redacts_access_code() {
        let debug = format!("{:?}", settings(Some("super-secret-code")));
        assert!(!debug.contains("super-secret-code"));
    }

    #[test]
    fn test_get_services_lists_catalogue() {
        let fx = fixture();
        assert!(fx.service.get_services().iter().any(|s| s.code == "03220"));
    }
}
