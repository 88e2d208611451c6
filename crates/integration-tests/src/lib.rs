//! Integration test harness for the label back office.
//!
//! Runs the label service against an in-process fake of the Correios
//! pre-posting API and in-memory stores, so the whole flow can be
//! exercised without network access or a database.
//!
//! ```rust,ignore
//! let ctx = TestContext::new(Behavior::default()).await;
//! ctx.seed_config().await;
//! let label = ctx.service.generate_label(ctx.request()).await?;
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::header::{ACCEPT, AUTHORIZATION};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use correio_labels_admin::correios::{CorreiosClient, CorreiosEndpoints};
use correio_labels_admin::db::{
    CarrierConfigStore, ErrorLogStore, LabelStore, NewCarrierErrorLog, RepositoryError,
};
use correio_labels_admin::services::LabelService;
use correio_labels_admin::storage::{BlobStore, StorageError};
use correio_labels_core::credential::CredentialCodec;
use correio_labels_core::dimensions::RequestedDims;
use correio_labels_core::{
    Address, CarrierConfig, CarrierEnvironment, LabelRecord, LabelRequest, PackageType, Recipient,
    SaleId, SenderIdentity, TenantId, TrackingEvent,
};
use serde_json::{Value, json};

/// Key used to obfuscate seeded access codes.
pub const CREDENTIAL_KEY: &str = "integration-credential-key";
/// Portal account the fake accepts.
pub const ACCOUNT_ID: &str = "loja-exemplo";
/// Plaintext access code the fake accepts.
pub const ACCESS_CODE: &str = "codigo-de-acesso";
/// Token the fake issues and then requires on every other route.
pub const BEARER_TOKEN: &str = "fake-bearer-token";

/// Per-request timeout of the client under test.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(2);
/// How long a stalled submission waits before answering.
const STALL: Duration = Duration::from_secs(5);
/// Tracking code every accepted pre-posting receives.
pub const TRACKING_CODE: &str = "AB123456789BR";
/// Pre-posting id every accepted pre-posting receives.
pub const PREPOST_ID: &str = "PRE-0001";
/// A 44-digit NF-e access key.
pub const INVOICE_KEY: &str = "3526 1012 3456 7800 0199 5500 1000 0012 3410 0000 1234";

pub const LABEL_PDF: &[u8] = b"%PDF-1.4 label";
pub const DECLARATION_PDF: &[u8] = b"%PDF-1.4 declaration";

/// Body the fake answers structural rejections with.
pub const STRUCTURAL_REJECTION: &str =
    r#"{"msgs":["PPN-295: Formato do objeto informado e invalido"]}"#;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().expect("test mutex poisoned")
}

// =============================================================================
// Fake Correios
// =============================================================================

/// How the fake carrier answers.
#[derive(Debug, Clone)]
pub struct Behavior {
    pub auth_status: u16,
    /// Consumed in order, one per submission; accepted once empty.
    pub submit_rejections: VecDeque<(u16, String)>,
    /// Zero-based submission that outlives the client timeout.
    pub stall_submission: Option<usize>,
    pub label_status: u16,
    pub declaration_status: u16,
    pub legacy_declaration_status: u16,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            auth_status: 200,
            submit_rejections: VecDeque::new(),
            stall_submission: None,
            label_status: 200,
            declaration_status: 200,
            legacy_declaration_status: 200,
        }
    }
}

#[derive(Default)]
struct FakeState {
    behavior: Mutex<Behavior>,
    submissions: Mutex<Vec<Value>>,
    requests: Mutex<Vec<String>>,
}

/// In-process Correios API listening on an ephemeral port.
#[derive(Clone)]
pub struct FakeCorreios {
    pub base_url: String,
    state: Arc<FakeState>,
}

impl FakeCorreios {
    /// Start the fake.
    pub async fn start(behavior: Behavior) -> Self {
        let state = Arc::new(FakeState {
            behavior: Mutex::new(behavior),
            ..FakeState::default()
        });

        let app = Router::new()
            .route("/token/v1/autentica/cartaopostagem", post(fake_auth))
            .route("/prepostagem/v1/prepostagens", post(fake_submit))
            .route("/prepostagem/v1/prepostagens/{id}/rotulo", get(fake_label))
            .route(
                "/prepostagem/v1/prepostagens/{id}/declaracaoConteudo",
                get(fake_declaration),
            )
            .route(
                "/prepostagem/v1/prepostagens/declaracaoconteudo/{id}",
                get(fake_legacy_declaration),
            )
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake carrier");
        let addr = listener.local_addr().expect("fake carrier address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake carrier");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Bodies of every pre-posting attempt, in order.
    pub fn submissions(&self) -> Vec<Value> {
        lock(&self.state.submissions).clone()
    }

    /// `METHOD path` of every request received, in order.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state.requests).clone()
    }

    fn record(state: &FakeState, line: String) {
        lock(&state.requests).push(line);
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// `user:password` from a Basic `Authorization` header.
fn basic_credentials(headers: &HeaderMap) -> Option<String> {
    let encoded = headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded).ok()?;
    String::from_utf8(decoded).ok()
}

fn has_bearer(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        == Some(BEARER_TOKEN)
}

fn accepts_pdf(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/pdf"))
}

fn refused(code: StatusCode, message: &str) -> Response {
    (code, Json(json!({"msgs": [message]}))).into_response()
}

async fn fake_auth(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    FakeCorreios::record(&state, "POST /token".to_string());
    let code = lock(&state.behavior).auth_status;
    let expected = format!("{ACCOUNT_ID}:{ACCESS_CODE}");
    let credentials_ok = basic_credentials(&headers).as_deref() == Some(expected.as_str());

    if !credentials_ok {
        return refused(StatusCode::UNAUTHORIZED, "Credenciais de acesso invalidas");
    }

    if code == 200 && body.get("numero").is_some() {
        Json(json!({
            "token": BEARER_TOKEN,
            "expiraEm": "2026-10-18T23:59:59",
            "ambiente": "HOMOLOGACAO"
        }))
        .into_response()
    } else {
        (
            status(code),
            Json(json!({"msgs": ["Credenciais de acesso invalidas"]})),
        )
            .into_response()
    }
}

async fn fake_submit(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    FakeCorreios::record(&state, "POST /prepostagens".to_string());
    if !has_bearer(&headers) {
        return refused(StatusCode::UNAUTHORIZED, "Token ausente ou invalido");
    }

    let attempt = {
        let mut submissions = lock(&state.submissions);
        submissions.push(body);
        submissions.len() - 1
    };
    let stall = lock(&state.behavior).stall_submission == Some(attempt);
    if stall {
        tokio::time::sleep(STALL).await;
    }

    let rejection = lock(&state.behavior).submit_rejections.pop_front();
    match rejection {
        Some((code, body)) => (status(code), body).into_response(),
        None => Json(json!({
            "id": PREPOST_ID,
            "codigoRastreio": TRACKING_CODE,
            "valorServico": 21.9,
            "valorTotal": "23,50"
        }))
        .into_response(),
    }
}

fn pdf_or_error(headers: &HeaderMap, code: u16, pdf: &'static [u8]) -> Response {
    if !has_bearer(headers) {
        return refused(StatusCode::UNAUTHORIZED, "Token ausente ou invalido");
    }
    if !accepts_pdf(headers) {
        return refused(StatusCode::NOT_ACCEPTABLE, "Somente application/pdf");
    }
    if code == 200 {
        ([("content-type", "application/pdf")], pdf).into_response()
    } else {
        (status(code), r#"{"msgs":["Documento indisponivel"]}"#).into_response()
    }
}

async fn fake_label(
    State(state): State<Arc<FakeState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    FakeCorreios::record(&state, format!("GET rotulo {id}"));
    let code = lock(&state.behavior).label_status;
    pdf_or_error(&headers, code, LABEL_PDF)
}

async fn fake_declaration(
    State(state): State<Arc<FakeState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    FakeCorreios::record(&state, format!("GET declaracao {id}"));
    let code = lock(&state.behavior).declaration_status;
    pdf_or_error(&headers, code, DECLARATION_PDF)
}

async fn fake_legacy_declaration(
    State(state): State<Arc<FakeState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    FakeCorreios::record(&state, format!("GET declaracao legacy {id}"));
    let code = lock(&state.behavior).legacy_declaration_status;
    pdf_or_error(&headers, code, DECLARATION_PDF)
}

// =============================================================================
// In-memory stores
// =============================================================================

#[derive(Default)]
pub struct MemoryConfigs {
    configs: Mutex<HashMap<TenantId, CarrierConfig>>,
}

impl MemoryConfigs {
    pub fn get(&self, tenant_id: TenantId) -> Option<CarrierConfig> {
        lock(&self.configs).get(&tenant_id).cloned()
    }
}

#[async_trait]
impl CarrierConfigStore for MemoryConfigs {
    async fn find(&self, tenant_id: TenantId) -> Result<Option<CarrierConfig>, RepositoryError> {
        Ok(self.get(tenant_id))
    }

    async fn upsert(&self, config: &CarrierConfig) -> Result<(), RepositoryError> {
        lock(&self.configs).insert(config.tenant_id, config.clone());
        Ok(())
    }
}

/// Labels, sales and tracking history.
#[derive(Default)]
pub struct MemoryLabels {
    labels: Mutex<Vec<LabelRecord>>,
    sales: Mutex<HashMap<SaleId, Option<String>>>,
    events: Mutex<Vec<TrackingEvent>>,
}

impl MemoryLabels {
    /// Register a sale without a tracking code.
    pub fn add_sale(&self, sale_id: SaleId) {
        lock(&self.sales).insert(sale_id, None);
    }

    pub fn labels(&self) -> Vec<LabelRecord> {
        lock(&self.labels).clone()
    }

    pub fn sale_tracking_code(&self, sale_id: SaleId) -> Option<String> {
        lock(&self.sales).get(&sale_id).cloned().flatten()
    }

    pub fn events(&self) -> Vec<TrackingEvent> {
        lock(&self.events).clone()
    }
}

#[async_trait]
impl LabelStore for MemoryLabels {
    async fn insert_label(&self, record: &LabelRecord) -> Result<(), RepositoryError> {
        let mut labels = lock(&self.labels);
        if labels
            .iter()
            .any(|label| label.tracking_code == record.tracking_code)
        {
            return Err(RepositoryError::Conflict(format!(
                "tracking code {} already stored",
                record.tracking_code
            )));
        }
        labels.push(record.clone());
        Ok(())
    }

    async fn set_sale_tracking_code(
        &self,
        _tenant_id: TenantId,
        sale_id: SaleId,
        tracking_code: &str,
    ) -> Result<bool, RepositoryError> {
        let mut sales = lock(&self.sales);
        let Some(current) = sales.get_mut(&sale_id) else {
            return Ok(false);
        };
        if current.as_deref() == Some(tracking_code) {
            return Ok(false);
        }
        *current = Some(tracking_code.to_string());
        Ok(true)
    }

    async fn append_tracking_event(&self, event: &TrackingEvent) -> Result<(), RepositoryError> {
        lock(&self.events).push(event.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryErrorLog {
    entries: Mutex<Vec<NewCarrierErrorLog>>,
}

impl MemoryErrorLog {
    pub fn entries(&self) -> Vec<NewCarrierErrorLog> {
        lock(&self.entries).clone()
    }
}

#[async_trait]
impl ErrorLogStore for MemoryErrorLog {
    async fn log_error(&self, entry: &NewCarrierErrorLog) -> Result<(), RepositoryError> {
        lock(&self.entries).push(entry.clone());
        Ok(())
    }
}

/// Blob store that can be told to refuse uploads.
#[derive(Default)]
pub struct MemoryBlobs {
    fail_uploads: bool,
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobs {
    /// A store that refuses every upload.
    pub fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        lock(&self.objects).get(path).cloned()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        if self.fail_uploads {
            return Err(StorageError::Rejected {
                status: 503,
                body: "storage unavailable".to_string(),
            });
        }
        lock(&self.objects).insert(path.to_string(), bytes);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://blobs.test/{path}")
    }
}

// =============================================================================
// Test context
// =============================================================================

/// Everything a test needs, wired together.
pub struct TestContext {
    pub fake: FakeCorreios,
    pub configs: Arc<MemoryConfigs>,
    pub labels: Arc<MemoryLabels>,
    pub errors: Arc<MemoryErrorLog>,
    pub blobs: Arc<MemoryBlobs>,
    pub codec: CredentialCodec,
    pub service: LabelService,
    pub tenant_id: TenantId,
}

impl TestContext {
    pub async fn new(behavior: Behavior) -> Self {
        Self::with_blobs(behavior, MemoryBlobs::default()).await
    }

    pub async fn with_blobs(behavior: Behavior, blobs: MemoryBlobs) -> Self {
        let fake = FakeCorreios::start(behavior).await;
        let endpoints = CorreiosEndpoints {
            production: fake.base_url.clone(),
            staging: fake.base_url.clone(),
        };
        let client =
            CorreiosClient::new(endpoints, CLIENT_TIMEOUT).expect("carrier client");

        let configs = Arc::new(MemoryConfigs::default());
        let labels = Arc::new(MemoryLabels::default());
        let errors = Arc::new(MemoryErrorLog::default());
        let blobs = Arc::new(blobs);
        let codec = CredentialCodec::new(CREDENTIAL_KEY);

        let service = LabelService::new(
            Arc::clone(&configs) as Arc<dyn CarrierConfigStore>,
            Arc::clone(&labels) as Arc<dyn LabelStore>,
            Arc::clone(&errors) as Arc<dyn ErrorLogStore>,
            Arc::clone(&blobs) as Arc<dyn BlobStore>,
            client,
            codec.clone(),
        );

        Self {
            fake,
            configs,
            labels,
            errors,
            blobs,
            codec,
            service,
            tenant_id: TenantId::generate(),
        }
    }

    /// Store an active staging configuration for the tenant.
    pub async fn seed_config(&self) {
        let config = CarrierConfig {
            tenant_id: self.tenant_id,
            account_id: ACCOUNT_ID.to_string(),
            access_code: self.codec.obfuscate(ACCESS_CODE),
            contract_number: "9912345678".to_string(),
            postage_card: "0076543210".to_string(),
            environment: CarrierEnvironment::Staging,
            sender: SenderIdentity {
                name: "Loja Exemplo LTDA".to_string(),
                tax_id: "12.345.678/0001-99".to_string(),
                phone: Some("(11) 3456-7890".to_string()),
                email: Some("envios@loja.example".to_string()),
                address: address("01310-100", "SP", "Sao Paulo"),
            },
            default_service_code: "03298".to_string(),
            default_package_type: PackageType::Box,
            default_dims: RequestedDims {
                weight: Some(300.0),
                height: Some(10.0),
                width: Some(15.0),
                length: Some(20.0),
            },
            active: true,
        };
        self.configs
            .upsert(&config)
            .await
            .expect("seed carrier config");
    }

    /// A valid request without an invoice key.
    pub fn request(&self) -> LabelRequest {
        LabelRequest {
            tenant_id: self.tenant_id,
            sale_id: None,
            recipient: Recipient {
                name: "Ana Souza".to_string(),
                tax_id: Some("123.456.789-09".to_string()),
                phone: Some("(81) 98765-4321".to_string()),
                email: None,
                address: address("50030-230", "PE", "Recife"),
            },
            package: None,
            service_code: None,
            invoice_number: None,
            invoice_key: None,
        }
    }
}

fn address(postal_code: &str, state: &str, city: &str) -> Address {
    Address {
        street: "Avenida Central".to_string(),
        number: "100".to_string(),
        complement: Some("Sala 2".to_string()),
        neighborhood: "Centro".to_string(),
        city: city.to_string(),
        state: state.to_string(),
        postal_code: postal_code.to_string(),
    }
}
