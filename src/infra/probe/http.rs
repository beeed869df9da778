//! HTTP `HEAD` probe against the KYC document endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, instrument};

use crate::domain::{
    AppError, ConfigError, DocumentProbe, ExternalServiceError, ProbeOutcome, ResourceLocator,
};

/// Connect timeout of the probe client; the overall bound lives in the controller
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Probe that issues a metadata-only request per document
#[derive(Debug, Clone)]
pub struct HttpDocumentProbe {
    http_client: Client,
    base_url: String,
    api_token: Option<SecretString>,
}

impl HttpDocumentProbe {
    /// Create a new probe
    ///
    /// # Arguments
    /// * `base_url` - Scheme and host the document locators are relative to
    /// * `api_token` - Optional bearer token for the admin endpoint
    pub fn new(
        base_url: impl Into<String>,
        api_token: Option<SecretString>,
    ) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                AppError::ExternalService(ExternalServiceError::Configuration(format!(
                    "Failed to create HTTP client: {}",
                    e
                )))
            })?;
        Self::with_client(http_client, base_url, api_token)
    }

    /// Create a probe around an existing client
    pub fn with_client(
        http_client: Client,
        base_url: impl Into<String>,
        api_token: Option<SecretString>,
    ) -> Result<Self, AppError> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::Config(ConfigError::InvalidValue {
                name: "KYC_API_BASE_URL".to_string(),
                message: format!("expected an http(s) URL, got '{}'", base_url),
            }));
        }
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    /// Absolute URL of a locator
    pub fn url_for(&self, locator: &ResourceLocator) -> String {
        resolve_url(&self.base_url, locator.as_str())
    }
}

/// Join a base URL and an href; absolute hrefs pass through.
pub fn resolve_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{}{}", base, href)
    } else {
        format!("{}/{}", base, href)
    }
}

#[async_trait]
impl DocumentProbe for HttpDocumentProbe {
    #[instrument(skip(self), fields(locator = %locator))]
    async fn probe(&self, locator: &ResourceLocator) -> Result<ProbeOutcome, AppError> {
        let url = self.url_for(locator);
        debug!(url = %url, "Probing KYC document");

        let mut request = self.http_client.head(&url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "KYC document probe request failed");
            if e.is_timeout() {
                AppError::ExternalService(ExternalServiceError::Timeout(CONNECT_TIMEOUT))
            } else {
                AppError::ExternalService(ExternalServiceError::Network(e.to_string()))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "KYC document probe returned error");
            return Err(AppError::ExternalService(ExternalServiceError::ApiError {
                status_code: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            }));
        }

        let headers = response.headers();
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        debug!(
            content_type = ?content_type,
            content_length = ?content_length,
            "KYC document probe complete"
        );

        Ok(ProbeOutcome {
            content_type,
            content_length,
        })
    }
}
