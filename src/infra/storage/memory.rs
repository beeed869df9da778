//! In-memory document store.
//!
//! Used when no database is configured and by tests. Contents are lost on
//! restart.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::domain::{
    AppError, DocumentStore, KycDocument, KycDocumentMetadata, NewKycDocument, SubjectId,
};

/// Thread-safe document store keyed by subject
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: DashMap<SubjectId, KycDocument>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn get_document(&self, subject: &SubjectId) -> Result<Option<KycDocument>, AppError> {
        Ok(self.documents.get(subject).map(|entry| entry.value().clone()))
    }

    async fn get_metadata(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<KycDocumentMetadata>, AppError> {
        Ok(self
            .documents
            .get(subject)
            .map(|entry| entry.value().metadata.clone()))
    }

    async fn put_document(
        &self,
        document: &NewKycDocument,
        sha256: &str,
    ) -> Result<KycDocumentMetadata, AppError> {
        let metadata = KycDocumentMetadata {
            subject_id: document.subject_id.clone(),
            content_type: document.content_type.clone(),
            file_name: document.resolved_file_name(),
            size_bytes: document.content.len() as i64,
            sha256: sha256.to_string(),
            uploaded_at: Utc::now(),
        };
        self.documents.insert(
            document.subject_id.clone(),
            KycDocument {
                metadata: metadata.clone(),
                content: document.content.clone(),
            },
        );
        Ok(metadata)
    }

    async fn delete_document(&self, subject: &SubjectId) -> Result<bool, AppError> {
        Ok(self.documents.remove(subject).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_replaces_previous_document() {
        let store = MemoryDocumentStore::new();
        let subject = SubjectId::from(1);

        store
            .put_document(
                &NewKycDocument::new(subject.clone(), "image/png", vec![1]),
                "a",
            )
            .await
            .unwrap();
        store
            .put_document(
                &NewKycDocument::new(subject.clone(), "application/pdf", vec![2, 3])
                    .with_file_name("id.pdf"),
                "b",
            )
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        let doc = store.get_document(&subject).await.unwrap().unwrap();
        assert_eq!(doc.metadata.content_type, "application/pdf");
        assert_eq!(doc.metadata.file_name, "id.pdf");
        assert_eq!(doc.content, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryDocumentStore::new();
        let subject = SubjectId::from(2);
        assert!(!store.delete_document(&subject).await.unwrap());

        store
            .put_document(&NewKycDocument::new(subject.clone(), "image/png", vec![1]), "a")
            .await
            .unwrap();
        assert!(store.delete_document(&subject).await.unwrap());
        assert!(store.is_empty());
        assert!(store.get_metadata(&subject).await.unwrap().is_none());
    }
}
