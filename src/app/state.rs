//! Application state management.

use std::sync::Arc;

use secrecy::SecretString;

use crate::domain::DocumentStore;

use super::service::DocumentService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DocumentService>,
    pub store: Arc<dyn DocumentStore>,
    /// Bearer token guarding the admin routes (optional)
    pub admin_token: Option<SecretString>,
}

impl AppState {
    /// Create a new application state
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let service = Arc::new(DocumentService::new(Arc::clone(&store)));
        Self {
            service,
            store,
            admin_token: None,
        }
    }

    /// Require a bearer token on admin routes (builder pattern)
    #[must_use]
    pub fn with_admin_token(mut self, token: SecretString) -> Self {
        self.admin_token = Some(token);
        self
    }

    /// Override the upload size limit (builder pattern)
    /// This rebuilds the service with the new limit
    #[must_use]
    pub fn with_max_document_bytes(mut self, max_document_bytes: usize) -> Self {
        self.service = Arc::new(DocumentService::with_limit(
            Arc::clone(&self.store),
            max_document_bytes,
        ));
        self
    }
}
