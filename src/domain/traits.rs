//! Domain traits defining contracts for external systems.

use async_trait::async_trait;

use super::error::AppError;
use super::types::{
    KycDocument, KycDocumentMetadata, NewKycDocument, ProbeOutcome, ResourceLocator, SubjectId,
};

/// Metadata-only lookup of a stored document's media type
#[async_trait]
pub trait DocumentProbe: Send + Sync {
    /// Locator the preview renders and downloads for a subject
    fn locator_for(&self, subject: &SubjectId) -> ResourceLocator {
        ResourceLocator::for_subject(subject)
    }

    /// Learn the document's declared type without transferring its body
    async fn probe(&self, locator: &ResourceLocator) -> Result<ProbeOutcome, AppError>;
}

/// Hands a download-flagged href to whatever performs the navigation.
///
/// Fire and forget: failures belong to the launcher.
pub trait DownloadLauncher: Send + Sync {
    fn launch(&self, href: &str);
}

/// Storage backing the document endpoint
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Check storage connectivity
    async fn health_check(&self) -> Result<(), AppError>;

    /// Fetch a document including its body
    async fn get_document(&self, subject: &SubjectId) -> Result<Option<KycDocument>, AppError>;

    /// Fetch only the metadata of a document
    async fn get_metadata(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<KycDocumentMetadata>, AppError> {
        Ok(self.get_document(subject).await?.map(|doc| doc.metadata))
    }

    /// Insert or replace the document of a subject
    async fn put_document(
        &self,
        document: &NewKycDocument,
        sha256: &str,
    ) -> Result<KycDocumentMetadata, AppError>;

    /// Delete the document of a subject, returning whether one existed
    async fn delete_document(&self, subject: &SubjectId) -> Result<bool, AppError>;
}
