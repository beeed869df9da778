//! Mock implementations for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;

use crate::domain::{
    AppError, DatabaseError, DocumentProbe, DocumentStore, DownloadLauncher,
    ExternalServiceError, KycDocument, KycDocumentMetadata, NewKycDocument, ProbeOutcome,
    ResourceLocator, SubjectId,
};
use crate::infra::MemoryDocumentStore;

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub should_fail: bool,
    pub error_message: Option<String>,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }

    fn error_message(&self) -> String {
        self.error_message
            .clone()
            .unwrap_or_else(|| "Mock error".to_string())
    }
}

/// Mock probe answering with a fixed content type, optionally per locator.
///
/// A gated probe blocks every call until [`MockDocumentProbe::release`] is
/// called, which lets tests interleave session changes with in-flight probes.
pub struct MockDocumentProbe {
    content_type: Option<String>,
    overrides: Mutex<HashMap<String, Option<String>>>,
    config: MockConfig,
    gate: Option<watch::Sender<bool>>,
    calls: Mutex<Vec<ResourceLocator>>,
    completed: AtomicUsize,
}

impl MockDocumentProbe {
    /// Probe reporting `content_type` for every locator
    #[must_use]
    pub fn new(content_type: impl Into<String>) -> Self {
        Self::build(Some(content_type.into()), MockConfig::success(), None)
    }

    /// Probe whose responses carry no `Content-Type`
    #[must_use]
    pub fn without_content_type() -> Self {
        Self::build(None, MockConfig::success(), None)
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::build(None, MockConfig::failure(message), None)
    }

    /// Probe that holds every call until released
    #[must_use]
    pub fn gated(content_type: impl Into<String>) -> Self {
        let (gate, _) = watch::channel(false);
        Self::build(Some(content_type.into()), MockConfig::success(), Some(gate))
    }

    fn build(
        content_type: Option<String>,
        config: MockConfig,
        gate: Option<watch::Sender<bool>>,
    ) -> Self {
        Self {
            content_type,
            overrides: Mutex::new(HashMap::new()),
            config,
            gate,
            calls: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
        }
    }

    /// Answer `content_type` for one locator only
    #[must_use]
    pub fn with_override(self, locator: &str, content_type: Option<&str>) -> Self {
        self.overrides
            .lock()
            .unwrap()
            .insert(locator.to_string(), content_type.map(str::to_string));
        self
    }

    /// Let gated calls proceed
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.send_replace(true);
        }
    }

    /// Locators probed so far, in call order
    pub fn calls(&self) -> Vec<ResourceLocator> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of probes that returned (successfully or not)
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentProbe for MockDocumentProbe {
    async fn probe(&self, locator: &ResourceLocator) -> Result<ProbeOutcome, AppError> {
        self.calls.lock().unwrap().push(locator.clone());

        if let Some(gate) = &self.gate {
            let mut rx = gate.subscribe();
            let _ = rx.wait_for(|open| *open).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        if self.config.should_fail {
            return Err(AppError::ExternalService(ExternalServiceError::Network(
                self.config.error_message(),
            )));
        }

        let content_type = match self.overrides.lock().unwrap().get(locator.as_str()) {
            Some(overridden) => overridden.clone(),
            None => self.content_type.clone(),
        };
        Ok(ProbeOutcome {
            content_type,
            content_length: None,
        })
    }
}

/// Launcher that records every href instead of navigating
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    launched: Mutex<Vec<String>>,
}

impl RecordingLauncher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn launched(&self) -> Vec<String> {
        self.launched.lock().unwrap().clone()
    }
}

impl DownloadLauncher for RecordingLauncher {
    fn launch(&self, href: &str) {
        self.launched.lock().unwrap().push(href.to_string());
    }
}

/// Mock document store with switchable health and failure mode
pub struct MockDocumentStore {
    inner: MemoryDocumentStore,
    config: MockConfig,
    is_healthy: AtomicBool,
}

impl MockDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            inner: MemoryDocumentStore::new(),
            config,
            is_healthy: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Number of stored documents (for testing)
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        if self.config.should_fail {
            return Err(AppError::Database(DatabaseError::Query(
                self.config.error_message(),
            )));
        }
        Ok(())
    }
}

impl Default for MockDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn health_check(&self) -> Result<(), AppError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::Database(DatabaseError::Connection(
                "Unhealthy".to_string(),
            )));
        }
        self.check_should_fail()
    }

    async fn get_document(&self, subject: &SubjectId) -> Result<Option<KycDocument>, AppError> {
        self.check_should_fail()?;
        self.inner.get_document(subject).await
    }

    async fn get_metadata(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<KycDocumentMetadata>, AppError> {
        self.check_should_fail()?;
        self.inner.get_metadata(subject).await
    }

    async fn put_document(
        &self,
        document: &NewKycDocument,
        sha256: &str,
    ) -> Result<KycDocumentMetadata, AppError> {
        self.check_should_fail()?;
        self.inner.put_document(document, sha256).await
    }

    async fn delete_document(&self, subject: &SubjectId) -> Result<bool, AppError> {
        self.check_should_fail()?;
        self.inner.delete_document(subject).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_mock_probe_overrides() {
        let probe = MockDocumentProbe::new("image/png").with_override("/doc/1", None);

        let outcome = probe.probe(&ResourceLocator::new("/doc/1")).await.unwrap();
        assert!(outcome.content_type.is_none());

        let outcome = probe.probe(&ResourceLocator::new("/doc/2")).await.unwrap();
        assert_eq!(outcome.content_type.as_deref(), Some("image/png"));
        assert_eq!(probe.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_probe_gate() {
        let probe = Arc::new(MockDocumentProbe::gated("application/pdf"));
        let task = {
            let probe = Arc::clone(&probe);
            tokio::spawn(async move { probe.probe(&ResourceLocator::new("/doc/1")).await })
        };

        tokio::task::yield_now().await;
        assert_eq!(probe.completed_count(), 0);

        probe.release();
        let outcome = task.await.unwrap().unwrap();
        assert_eq!(outcome.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(probe.completed_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_store_failure_and_health() {
        let store = MockDocumentStore::failing("boom");
        assert!(store.get_document(&SubjectId::from(1)).await.is_err());

        let store = MockDocumentStore::new();
        assert!(store.health_check().await.is_ok());
        store.set_healthy(false);
        assert!(store.health_check().await.is_err());
    }
}
