//! Download launcher that saves documents to a local directory.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretString};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use super::probe::{DataUri, resolve_url};
use crate::app::PreviewConfig;
use crate::domain::types::default_extension;
use crate::domain::{AppError, DownloadLauncher, ExternalServiceError};

/// Fallback file name when neither the response nor the href names one
const FALLBACK_FILE_NAME: &str = "document";

/// Launcher that fetches the download href on a background task and writes
/// the body to `download_dir`.
#[derive(Debug, Clone)]
pub struct FileDownloadLauncher {
    http_client: Client,
    base_url: String,
    api_token: Option<SecretString>,
    download_dir: PathBuf,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl FileDownloadLauncher {
    pub fn new(config: &PreviewConfig) -> Result<Self, AppError> {
        let http_client = Client::builder().build().map_err(|e| {
            AppError::ExternalService(ExternalServiceError::Configuration(format!(
                "Failed to create HTTP client: {}",
                e
            )))
        })?;
        Ok(Self {
            http_client,
            base_url: config.api_base_url.clone(),
            api_token: config.api_token.clone(),
            download_dir: config.download_dir.clone(),
            pending: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Fetch `href` and write it into the download directory.
    #[instrument(skip(self, href))]
    pub async fn download(&self, href: &str) -> Result<PathBuf, AppError> {
        let (file_name, bytes) = match DataUri::parse(href) {
            Some(uri) => (
                format!("{}.{}", FALLBACK_FILE_NAME, default_extension(uri.media_type)),
                uri.decode()?,
            ),
            None => self.fetch(href).await?,
        };

        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create download dir: {}", e)))?;
        let path = self.download_dir.join(file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write {}: {}", path.display(), e)))?;

        info!(path = %path.display(), bytes = bytes.len(), "Document downloaded");
        Ok(path)
    }

    /// Wait for every launched download to finish
    pub async fn wait_idle(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            pending.drain(..).collect()
        };
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Download task did not complete");
            }
        }
    }

    async fn fetch(&self, href: &str) -> Result<(String, Vec<u8>), AppError> {
        let url = resolve_url(&self.base_url, href);
        let mut request = self.http_client.get(&url);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            AppError::ExternalService(ExternalServiceError::Network(e.to_string()))
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ExternalService(ExternalServiceError::ApiError {
                status_code: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }));
        }

        let file_name = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(file_name_from_disposition)
            .or_else(|| file_name_from_href(href))
            .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());

        let bytes = response.bytes().await.map_err(|e| {
            AppError::ExternalService(ExternalServiceError::InvalidResponse(e.to_string()))
        })?;
        Ok((file_name, bytes.to_vec()))
    }
}

impl DownloadLauncher for FileDownloadLauncher {
    fn launch(&self, href: &str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!("Download launched outside of a tokio runtime, ignoring");
            return;
        };

        let launcher = self.clone();
        let href = href.to_string();
        let handle = runtime.spawn(async move {
            if let Err(e) = launcher.download(&href).await {
                warn!(error = %e, "Document download failed");
            }
        });
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }
}

/// Extract `filename="…"` from a `Content-Disposition` value
pub fn file_name_from_disposition(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|part| {
        let raw = part.strip_prefix("filename=")?;
        sanitize_file_name(raw.trim_matches('"'))
    })
}

fn file_name_from_href(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next()?;
    sanitize_file_name(path.rsplit('/').next()?)
}

/// Reduce a name to a single safe path component
fn sanitize_file_name(name: &str) -> Option<String> {
    let component = Path::new(name).file_name()?.to_str()?;
    let cleaned: String = component
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();
    (!cleaned.is_empty() && cleaned != "..").then_some(cleaned)
}
