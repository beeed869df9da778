//! Preview controller: owns one preview session and drives its probes.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{info, instrument, warn};

use super::download::DownloadTrigger;
use super::render::RenderPlan;
use super::session::{PreviewSession, PreviewTarget, ProbeTicket};
use crate::domain::{
    ConfigError, DocumentProbe, DownloadLauncher, MediaKindPolicy, PreviewFailure, PreviewStatus,
    ResourceLocator, SubjectId, TransportStrategy,
};

/// Default upper bound on a probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default document endpoint host
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3000";

/// Configuration of the preview client
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Base URL the locators are resolved against
    pub api_base_url: String,
    /// Bearer token for the admin endpoint
    pub api_token: Option<SecretString>,
    /// Upper bound on a probe; `None` waits forever
    pub probe_timeout: Option<Duration>,
    /// Classification of non-PDF content types
    pub media_policy: MediaKindPolicy,
    /// How the media type is obtained
    pub transport: TransportStrategy,
    /// Where downloads are written
    pub download_dir: PathBuf,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            probe_timeout: Some(DEFAULT_PROBE_TIMEOUT),
            media_policy: MediaKindPolicy::default(),
            transport: TransportStrategy::default(),
            download_dir: PathBuf::from("downloads"),
        }
    }
}

impl PreviewConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        use std::env;

        let api_base_url = env::var("KYC_API_BASE_URL")
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let api_token = env::var("ADMIN_API_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(SecretString::from);

        let probe_timeout = match env::var("PREVIEW_PROBE_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    name: "PREVIEW_PROBE_TIMEOUT_SECS".to_string(),
                    message: format!("expected whole seconds, got '{}'", raw),
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            Err(_) => Some(DEFAULT_PROBE_TIMEOUT),
        };

        let media_policy = match env::var("PREVIEW_MEDIA_POLICY") {
            Ok(raw) => raw.parse().map_err(|message| ConfigError::InvalidValue {
                name: "PREVIEW_MEDIA_POLICY".to_string(),
                message,
            })?,
            Err(_) => MediaKindPolicy::default(),
        };

        let transport = match env::var("PREVIEW_TRANSPORT") {
            Ok(raw) => raw.parse().map_err(|message| ConfigError::InvalidValue {
                name: "PREVIEW_TRANSPORT".to_string(),
                message,
            })?,
            Err(_) => TransportStrategy::default(),
        };

        let download_dir = env::var("DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("downloads"));

        Ok(Self {
            api_base_url,
            api_token,
            probe_timeout,
            media_policy,
            transport,
            download_dir,
        })
    }
}

/// Drives a single preview modal.
///
/// Session state is published on a watch channel; probes run on spawned
/// tasks and are aborted when the session they belong to goes away.
pub struct PreviewController {
    probe: Arc<dyn DocumentProbe>,
    download: DownloadTrigger,
    probe_timeout: Option<Duration>,
    session: Arc<watch::Sender<PreviewSession>>,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl PreviewController {
    pub fn new(
        probe: Arc<dyn DocumentProbe>,
        launcher: Arc<dyn DownloadLauncher>,
        config: &PreviewConfig,
    ) -> Self {
        let (session, _) = watch::channel(PreviewSession::new(config.media_policy));
        Self {
            probe,
            download: DownloadTrigger::new(launcher),
            probe_timeout: config.probe_timeout,
            session: Arc::new(session),
            in_flight: Mutex::new(None),
        }
    }

    /// Observe session changes
    pub fn subscribe(&self) -> watch::Receiver<PreviewSession> {
        self.session.subscribe()
    }

    /// Snapshot of the current session
    pub fn session(&self) -> PreviewSession {
        self.session.borrow().clone()
    }

    pub fn render(&self) -> RenderPlan {
        RenderPlan::from_session(&self.session.borrow())
    }

    /// Open the modal for `subject`; returns the spawned probe, if any.
    #[instrument(skip_all, fields(subject = ?subject))]
    pub fn open(&self, subject: Option<SubjectId>) -> Option<JoinHandle<()>> {
        let target = self.target_for(subject);
        let mut ticket = None;
        self.session.send_modify(|s| ticket = s.open(target));
        self.start(ticket)
    }

    /// Switch the open modal to another subject.
    #[instrument(skip_all, fields(subject = ?subject))]
    pub fn change_subject(&self, subject: Option<SubjectId>) -> Option<JoinHandle<()>> {
        let target = self.target_for(subject);
        let mut ticket = None;
        let restarted = self.session.send_if_modified(|s| {
            let before = s.generation();
            ticket = s.change_subject(target);
            s.generation() != before
        });
        if restarted { self.start(ticket) } else { None }
    }

    /// Close the modal, discarding the session and any probe in flight.
    pub fn close(&self) {
        self.replace_in_flight(None);
        self.session.send_modify(PreviewSession::close);
        info!("Preview closed");
    }

    /// Media element callback: the rendered document failed to load.
    pub fn report_render_failure(&self, locator: &ResourceLocator, reason: &str) -> bool {
        let applied = self
            .session
            .send_if_modified(|s| s.report_render_failure(locator, reason));
        if applied {
            warn!(locator = %locator, reason = %reason, "Document failed to render");
        }
        applied
    }

    /// Download the current document; `false` when there is nothing to download.
    pub fn download(&self) -> bool {
        let locator = self.session.borrow().download_locator().cloned();
        self.download.trigger(locator.as_ref())
    }

    /// Wait until the session leaves `Loading`.
    ///
    /// Without a probe timeout this may never return for a stalled endpoint.
    pub async fn wait_settled(&self) -> PreviewSession {
        let mut rx = self.session.subscribe();
        match rx.wait_for(|s| s.status() != PreviewStatus::Loading).await {
            Ok(session) => session.clone(),
            Err(_) => self.session(),
        }
    }

    fn target_for(&self, subject: Option<SubjectId>) -> Option<PreviewTarget> {
        subject.map(|subject| {
            let locator = self.probe.locator_for(&subject);
            PreviewTarget::new(subject, locator)
        })
    }

    fn start(&self, ticket: Option<ProbeTicket>) -> Option<JoinHandle<()>> {
        let Some(ticket) = ticket else {
            self.replace_in_flight(None);
            return None;
        };

        info!(
            subject = %ticket.target.subject,
            generation = ticket.generation,
            "Probing KYC document"
        );
        let handle = tokio::spawn(run_probe(
            Arc::clone(&self.probe),
            Arc::clone(&self.session),
            ticket,
            self.probe_timeout,
        ));
        self.replace_in_flight(Some(handle.abort_handle()));
        Some(handle)
    }

    fn replace_in_flight(&self, next: Option<AbortHandle>) {
        let mut guard = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = guard.take() {
            previous.abort();
        }
        *guard = next;
    }
}

impl Drop for PreviewController {
    fn drop(&mut self) {
        self.replace_in_flight(None);
    }
}

async fn run_probe(
    probe: Arc<dyn DocumentProbe>,
    session: Arc<watch::Sender<PreviewSession>>,
    ticket: ProbeTicket,
    probe_timeout: Option<Duration>,
) {
    let locator = &ticket.target.locator;
    let result = match probe_timeout {
        Some(limit) => match tokio::time::timeout(limit, probe.probe(locator)).await {
            Ok(outcome) => outcome.map_err(|e| PreviewFailure::Probe(e.to_string())),
            Err(_) => Err(PreviewFailure::Timeout(limit)),
        },
        None => probe
            .probe(locator)
            .await
            .map_err(|e| PreviewFailure::Probe(e.to_string())),
    };

    if let Err(failure) = &result {
        warn!(
            subject = %ticket.target.subject,
            error = %failure,
            "KYC document probe failed"
        );
    }

    let applied = session.send_if_modified(|s| s.complete_probe(&ticket, result));
    if applied {
        let current = session.borrow();
        info!(
            subject = %ticket.target.subject,
            status = %current.status(),
            kind = ?current.media_kind(),
            "Preview settled"
        );
    }
}
