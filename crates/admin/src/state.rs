//! Application state shared across handlers.

use std::sync::Arc;

use correio_labels_core::credential::CredentialCodec;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;

use crate::config::AdminConfig;
use crate::correios::{CorreiosClient, CorreiosError};
use crate::db::{CarrierConfigRepository, ErrorLogRepository, LabelRepository};
use crate::services::LabelService;
use crate::storage::{HttpBlobStore, StorageError};

/// Errors that can occur while wiring the application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Correios client: {0}")]
    Correios(#[from] CorreiosError),
    #[error("storage client: {0}")]
    Storage(#[from] StorageError),
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    labels: LabelService,
    pool: Option<PgPool>,
}

impl AppState {
    /// Wire the production collaborators from configuration.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if an HTTP client cannot be built.
    pub fn from_config(config: &AdminConfig, pool: PgPool) -> Result<Self, StateError> {
        let correios = CorreiosClient::new(
            config.correios.endpoints.clone(),
            config.correios.timeout,
        )?;
        let blobs = HttpBlobStore::new(
            &config.storage.url,
            config.storage.bucket.clone(),
            config.storage.service_key.clone(),
            config.correios.timeout,
        )?;
        let codec = CredentialCodec::new(config.credential_key.expose_secret());

        let labels = LabelService::new(
            Arc::new(CarrierConfigRepository::new(pool.clone())),
            Arc::new(LabelRepository::new(pool.clone())),
            Arc::new(ErrorLogRepository::new(pool.clone())),
            Arc::new(blobs),
            correios,
            codec,
        );

        Ok(Self::new(labels, Some(pool)))
    }

    /// Build state around an already wired service.
    ///
    /// Without a pool, readiness always reports ready.
    #[must_use]
    pub fn new(labels: LabelService, pool: Option<PgPool>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { labels, pool }),
        }
    }

    #[must_use]
    pub fn labels(&self) -> &LabelService {
        &self.inner.labels
    }

    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
