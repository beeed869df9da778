//! Document service behind the KYC document endpoint.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::domain::{
    AppError, DocumentStore, HealthResponse, HealthStatus, KycDocument, KycDocumentMetadata,
    NewKycDocument, SubjectId, ValidationError,
};

/// Default upload size limit (10 MiB)
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// Application service containing document logic
pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    max_document_bytes: usize,
}

impl DocumentService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_limit(store, DEFAULT_MAX_DOCUMENT_BYTES)
    }

    #[must_use]
    pub fn with_limit(store: Arc<dyn DocumentStore>, max_document_bytes: usize) -> Self {
        Self {
            store,
            max_document_bytes,
        }
    }

    pub fn max_document_bytes(&self) -> usize {
        self.max_document_bytes
    }

    /// Fetch a document with its body
    #[instrument(skip(self), fields(subject = %subject))]
    pub async fn get_document(&self, subject: &SubjectId) -> Result<KycDocument, AppError> {
        self.store
            .get_document(subject)
            .await?
            .ok_or_else(|| not_found(subject))
    }

    /// Fetch only the headers-worth of a document
    #[instrument(skip(self), fields(subject = %subject))]
    pub async fn get_metadata(&self, subject: &SubjectId) -> Result<KycDocumentMetadata, AppError> {
        self.store
            .get_metadata(subject)
            .await?
            .ok_or_else(|| not_found(subject))
    }

    /// Validate and store a document, replacing any previous one
    #[instrument(skip(self, document), fields(subject = %document.subject_id, size = document.content.len()))]
    pub async fn upload_document(
        &self,
        document: &NewKycDocument,
    ) -> Result<KycDocumentMetadata, AppError> {
        document.validate().map_err(|e| {
            warn!(error = %e, "Document validation failed");
            AppError::Validation(ValidationError::Multiple(e.to_string()))
        })?;

        if document.content.len() > self.max_document_bytes {
            return Err(AppError::Validation(ValidationError::PayloadTooLarge {
                size: document.content.len(),
                limit: self.max_document_bytes,
            }));
        }

        let checksum = sha256_hex(&document.content);
        let metadata = self.store.put_document(document, &checksum).await?;
        info!(
            content_type = %metadata.content_type,
            sha256 = %metadata.sha256,
            "KYC document stored"
        );
        Ok(metadata)
    }

    /// Delete a subject's document
    #[instrument(skip(self), fields(subject = %subject))]
    pub async fn delete_document(&self, subject: &SubjectId) -> Result<(), AppError> {
        if self.store.delete_document(subject).await? {
            info!("KYC document deleted");
            Ok(())
        } else {
            Err(not_found(subject))
        }
    }

    /// Health check covering the document store
    pub async fn health_check(&self) -> HealthResponse {
        let storage = match self.store.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                warn!(error = %e, "Document store health check failed");
                HealthStatus::Unhealthy
            }
        };
        HealthResponse::new(storage)
    }
}

fn not_found(subject: &SubjectId) -> AppError {
    AppError::NotFound(format!("no KYC document for subject {}", subject))
}

/// Hex-encoded SHA-256 digest
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
