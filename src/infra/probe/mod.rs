//! Document probe implementations, one per transport strategy.

pub mod embedded;
pub mod http;

use std::sync::Arc;

pub use embedded::{DataUri, EmbeddedDocumentProbe};
pub use http::{HttpDocumentProbe, resolve_url};

use crate::app::PreviewConfig;
use crate::domain::{AppError, DocumentProbe, TransportStrategy};

/// Build the probe selected by the configured transport.
///
/// The embedded transport needs its payloads up front, so the caller passes
/// them in; they are ignored for the HEAD transport.
pub fn build_probe(
    config: &PreviewConfig,
    embedded: EmbeddedDocumentProbe,
) -> Result<Arc<dyn DocumentProbe>, AppError> {
    match config.transport {
        TransportStrategy::HeadProbe => Ok(Arc::new(HttpDocumentProbe::new(
            config.api_base_url.clone(),
            config.api_token.clone(),
        )?)),
        TransportStrategy::EmbeddedPayload => Ok(Arc::new(embedded)),
    }
}
