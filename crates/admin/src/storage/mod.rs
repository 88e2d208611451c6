//! Label PDF storage.
//!
//! Labels live in an object-storage bucket under
//! `{tenant_id}/{tracking_code}/`. [`HttpBlobStore`] talks to a
//! Supabase-compatible storage API; tests use an in-memory [`BlobStore`].

use std::time::Duration;

use async_trait::async_trait;
use correio_labels_core::TenantId;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::instrument;

/// Content type of every document we store.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Errors that can occur when storing a blob.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage refused the upload.
    #[error("upload rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Opaque blob store with URL retrieval.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `path`, replacing any existing object.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Durable URL for an object.
    fn public_url(&self, path: &str) -> String;
}

/// Path of a label PDF.
#[must_use]
pub fn label_path(tenant_id: TenantId, tracking_code: &str) -> String {
    format!("{tenant_id}/{tracking_code}/label.pdf")
}

/// Path of a content declaration PDF.
#[must_use]
pub fn declaration_path(tenant_id: TenantId, tracking_code: &str) -> String {
    format!("{tenant_id}/{tracking_code}/content-declaration.pdf")
}

/// Blob store backed by a Supabase-style storage HTTP API.
#[derive(Clone)]
pub struct HttpBlobStore {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
    service_key: SecretString,
}

impl std::fmt::Debug for HttpBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBlobStore")
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .field("service_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl HttpBlobStore {
    /// Create a store for `bucket`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Http` if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        bucket: impl Into<String>,
        service_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            service_key,
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{path}", self.base_url, self.bucket)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let response = self
            .http
            .post(self.object_url(path))
            .bearer_auth(self.service_key.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(StorageError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{path}",
            self.base_url, self.bucket
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store() -> HttpBlobStore {
        HttpBlobStore::new(
            "https://storage.example.com/",
            "shipping-labels",
            SecretString::from("service-key"),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_paths_are_scoped_by_tenant_and_tracking_code() {
        let tenant_id: TenantId = "7f1c1f5e-2f3b-4c47-9d61-0a4b8f1e2d3c".parse().unwrap();
        assert_eq!(
            label_path(tenant_id, "AB123456789BR"),
            "7f1c1f5e-2f3b-4c47-9d61-0a4b8f1e2d3c/AB123456789BR/label.pdf"
        );
        assert_eq!(
            declaration_path(tenant_id, "AB123456789BR"),
            "7f1c1f5e-2f3b-4c47-9d61-0a4b8f1e2d3c/AB123456789BR/content-declaration.pdf"
        );
    }

    #[test]
    fn test_urls() {
        let store = store();
        assert_eq!(
            store.object_url("t/AB1BR/label.pdf"),
            "https://storage.example.com/storage/v1/object/shipping-labels/t/AB1BR/label.pdf"
        );
        assert_eq!(
            store.public_url("t/AB1BR/label.pdf"),
            "https://storage.example.com/storage/v1/object/public/shipping-labels/t/AB1BR/label.pdf"
        );
    }

    #[test]
    fn test_debug_redacts_service_key() {
        let debug = format!("{:?}", store());
        assert!(!debug.contains("service-key"));
        assert!(debug.contains("[REDACTED]"));
    }
}
