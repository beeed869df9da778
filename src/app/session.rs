//! Preview session state machine.
//!
//! A session lives for one modal lifecycle: `Idle → Loading → (Ready | Error)`.
//! Every probe invocation gets a [`ProbeTicket`] stamped with the session's
//! generation; opening, closing or switching subject bumps the generation so a
//! late result from a superseded probe is dropped instead of overwriting state.

use tracing::debug;

use crate::domain::{
    MediaKind, MediaKindPolicy, PreviewFailure, PreviewStatus, ProbeOutcome, ResourceLocator,
    SubjectId,
};

/// Subject plus the locator its document is reachable at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewTarget {
    pub subject: SubjectId,
    pub locator: ResourceLocator,
}

impl PreviewTarget {
    pub fn new(subject: SubjectId, locator: ResourceLocator) -> Self {
        Self { subject, locator }
    }
}

/// Handle identifying one probe invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTicket {
    pub generation: u64,
    pub target: PreviewTarget,
}

/// State of a preview; only `Ready` carries a media kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Loading {
        target: PreviewTarget,
    },
    Ready {
        target: PreviewTarget,
        kind: MediaKind,
    },
    Error {
        target: PreviewTarget,
        failure: PreviewFailure,
    },
}

/// Session state owned by a single preview modal
#[derive(Debug, Clone, Default)]
pub struct PreviewSession {
    open: bool,
    generation: u64,
    policy: MediaKindPolicy,
    state: SessionState,
}

impl PreviewSession {
    #[must_use]
    pub fn new(policy: MediaKindPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Open the modal. Returns the probe to run, or `None` when there is no subject.
    pub fn open(&mut self, target: Option<PreviewTarget>) -> Option<ProbeTicket> {
        self.open = true;
        self.restart(target)
    }

    /// React to a subject change while the modal is shown.
    ///
    /// A closed modal ignores the change; the same subject keeps the current session.
    pub fn change_subject(&mut self, target: Option<PreviewTarget>) -> Option<ProbeTicket> {
        if !self.open {
            return None;
        }
        if self.target().map(|t| &t.subject) == target.as_ref().map(|t| &t.subject) {
            return None;
        }
        self.restart(target)
    }

    /// Close the modal and discard the session.
    pub fn close(&mut self) {
        self.open = false;
        self.generation += 1;
        self.state = SessionState::Idle;
    }

    fn restart(&mut self, target: Option<PreviewTarget>) -> Option<ProbeTicket> {
        self.generation += 1;
        match target {
            None => {
                self.state = SessionState::Idle;
                None
            }
            Some(target) => {
                self.state = SessionState::Loading {
                    target: target.clone(),
                };
                Some(ProbeTicket {
                    generation: self.generation,
                    target,
                })
            }
        }
    }

    /// Whether a ticket still belongs to the live session
    pub fn is_live(&self, ticket: &ProbeTicket) -> bool {
        self.open
            && ticket.generation == self.generation
            && matches!(&self.state, SessionState::Loading { target } if *target == ticket.target)
    }

    /// Apply a probe result. Returns `false` when the ticket was superseded.
    pub fn complete_probe(
        &mut self,
        ticket: &ProbeTicket,
        result: Result<ProbeOutcome, PreviewFailure>,
    ) -> bool {
        if !self.is_live(ticket) {
            debug!(
                subject = %ticket.target.subject,
                generation = ticket.generation,
                current = self.generation,
                "Discarding stale probe result"
            );
            return false;
        }

        let target = ticket.target.clone();
        self.state = match result {
            Ok(outcome) => SessionState::Ready {
                kind: MediaKind::classify(outcome.content_type.as_deref(), self.policy),
                target,
            },
            Err(failure) => SessionState::Error { target, failure },
        };
        true
    }

    /// Report that the rendered media failed to load.
    ///
    /// Ignored unless the session is `Ready` and showing `locator`.
    pub fn report_render_failure(&mut self, locator: &ResourceLocator, reason: &str) -> bool {
        let target = match &self.state {
            SessionState::Ready { target, .. } if target.locator == *locator => target.clone(),
            _ => return false,
        };
        self.state = SessionState::Error {
            target,
            failure: PreviewFailure::Render(reason.to_string()),
        };
        true
    }

    pub fn status(&self) -> PreviewStatus {
        match self.state {
            SessionState::Idle => PreviewStatus::Idle,
            SessionState::Loading { .. } => PreviewStatus::Loading,
            SessionState::Ready { .. } => PreviewStatus::Ready,
            SessionState::Error { .. } => PreviewStatus::Error,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn subject(&self) -> Option<&SubjectId> {
        self.target().map(|t| &t.subject)
    }

    /// Media kind, defined only when `Ready`
    pub fn media_kind(&self) -> Option<MediaKind> {
        match self.state {
            SessionState::Ready { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Resource locator, defined only when `Ready`
    pub fn resource_locator(&self) -> Option<&ResourceLocator> {
        match &self.state {
            SessionState::Ready { target, .. } => Some(&target.locator),
            _ => None,
        }
    }

    /// Locator offered for download: `Ready` and `Error` both keep one.
    pub fn download_locator(&self) -> Option<&ResourceLocator> {
        match &self.state {
            SessionState::Ready { target, .. } | SessionState::Error { target, .. } => {
                Some(&target.locator)
            }
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&PreviewFailure> {
        match &self.state {
            SessionState::Error { failure, .. } => Some(failure),
            _ => None,
        }
    }

    fn target(&self) -> Option<&PreviewTarget> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Loading { target }
            | SessionState::Ready { target, .. }
            | SessionState::Error { target, .. } => Some(target),
        }
    }
}
