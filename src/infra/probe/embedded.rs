//! Probe for documents shipped inline as base64 `data:` URIs.
//!
//! The media type comes from the URI header, so probing never touches the
//! network.

use std::collections::HashMap;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};

use crate::domain::{
    AppError, DocumentProbe, ProbeOutcome, ResourceLocator, SubjectId, ValidationError,
};

/// Parsed `data:<media-type>;base64,<payload>` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub media_type: &'a str,
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    /// Parse a base64 data URI; other encodings are not accepted.
    pub fn parse(uri: &'a str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let media_type = header.strip_suffix(";base64")?;
        Some(Self {
            media_type,
            payload,
        })
    }

    /// Build a data URI from raw bytes
    pub fn encode(media_type: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", media_type, STANDARD.encode(bytes))
    }

    pub fn decode(&self) -> Result<Vec<u8>, AppError> {
        STANDARD.decode(self.payload).map_err(|e| {
            AppError::Validation(ValidationError::InvalidField {
                field: "payload".to_string(),
                message: e.to_string(),
            })
        })
    }

    /// Size of the decoded payload without decoding it
    pub fn decoded_len(&self) -> u64 {
        let padding = self.payload.bytes().rev().take_while(|b| *b == b'=').count();
        ((self.payload.len() / 4) * 3).saturating_sub(padding) as u64
    }
}

/// Probe over documents that are already embedded in the page model
#[derive(Debug, Clone, Default)]
pub struct EmbeddedDocumentProbe {
    documents: HashMap<SubjectId, ResourceLocator>,
}

impl EmbeddedDocumentProbe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subject's document as raw bytes
    #[must_use]
    pub fn with_document(mut self, subject: SubjectId, media_type: &str, bytes: &[u8]) -> Self {
        self.insert(subject, media_type, bytes);
        self
    }

    pub fn insert(&mut self, subject: SubjectId, media_type: &str, bytes: &[u8]) {
        let uri = DataUri::encode(media_type, bytes);
        self.documents.insert(subject, ResourceLocator::new(uri));
    }
}

#[async_trait]
impl DocumentProbe for EmbeddedDocumentProbe {
    fn locator_for(&self, subject: &SubjectId) -> ResourceLocator {
        self.documents
            .get(subject)
            .cloned()
            .unwrap_or_else(|| ResourceLocator::for_subject(subject))
    }

    async fn probe(&self, locator: &ResourceLocator) -> Result<ProbeOutcome, AppError> {
        let uri = DataUri::parse(locator.as_str())
            .ok_or_else(|| AppError::NotFound(format!("no embedded document at {}", locator)))?;
        Ok(ProbeOutcome {
            content_type: Some(uri.media_type.to_string()),
            content_length: Some(uri.decoded_len()),
        })
    }
}
