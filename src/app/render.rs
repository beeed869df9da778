//! View model produced from a preview session.

use serde::Serialize;

use super::session::{PreviewSession, SessionState};
use crate::domain::MediaKind;

pub const EMPTY_STATE_MESSAGE: &str = "No document available";
pub const PREVIEW_FAILED_MESSAGE: &str = "Unable to preview document";
pub const UNSUPPORTED_MESSAGE: &str = "Preview is not available for this document type";

/// What the preview surface should draw
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum RenderPlan {
    Empty { message: &'static str },
    Loading,
    Image { src: String, download_href: String },
    Pdf { src: String, download_href: String },
    Fallback {
        message: &'static str,
        download_href: String,
    },
}

impl RenderPlan {
    pub fn from_session(session: &PreviewSession) -> Self {
        match session.state() {
            SessionState::Idle => Self::Empty {
                message: EMPTY_STATE_MESSAGE,
            },
            SessionState::Loading { .. } => Self::Loading,
            SessionState::Ready { target, kind } => {
                let src = target.locator.as_str().to_string();
                let download_href = target.locator.download_href();
                match kind {
                    MediaKind::Image => Self::Image { src, download_href },
                    MediaKind::Pdf => Self::Pdf { src, download_href },
                    MediaKind::Unsupported => Self::Fallback {
                        message: UNSUPPORTED_MESSAGE,
                        download_href,
                    },
                }
            }
            SessionState::Error { target, .. } => Self::Fallback {
                message: PREVIEW_FAILED_MESSAGE,
                download_href: target.locator.download_href(),
            },
        }
    }

    /// Href of the download affordance, if the view shows one
    pub fn download_href(&self) -> Option<&str> {
        match self {
            Self::Image { download_href, .. }
            | Self::Pdf { download_href, .. }
            | Self::Fallback { download_href, .. } => Some(download_href),
            Self::Empty { .. } | Self::Loading => None,
        }
    }
}
