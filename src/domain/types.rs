//! Domain types with validation support.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::error::ValidationError;

/// Media type that selects the embedded document viewer
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Base path of the per-subject document endpoint
pub const KYC_DOCUMENT_PATH: &str = "/api/admin/kyc-document";

/// Longest subject id the `kyc_documents` table accepts
pub const MAX_SUBJECT_ID_LEN: usize = 128;

/// Query flag asking the endpoint to force a browser download
pub const DOWNLOAD_QUERY_FLAG: &str = "download=true";

/// Identifier of the user whose KYC document is being viewed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "42")]
pub struct SubjectId(String);

impl SubjectId {
    /// Create a subject id, rejecting values that cannot form a single path segment.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingField("subject_id".to_string()));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::InvalidField {
                field: "subject_id".to_string(),
                message: "only ASCII letters, digits, '-' and '_' are allowed".to_string(),
            });
        }
        if trimmed.len() > MAX_SUBJECT_ID_LEN {
            return Err(ValidationError::InvalidField {
                field: "subject_id".to_string(),
                message: format!("must be at most {} characters", MAX_SUBJECT_ID_LEN),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Parse an optional raw id; blank input means "no subject".
    pub fn parse_optional(value: Option<&str>) -> Result<Option<Self>, ValidationError> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Self::new(raw).map(Some),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SubjectId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SubjectId> for String {
    fn from(id: SubjectId) -> Self {
        id.0
    }
}

impl From<u64> for SubjectId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl std::str::FromStr for SubjectId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse classification of a document used to choose a rendering strategy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Rendered as an inline image
    Image,
    /// Rendered inside an embedded document viewer
    Pdf,
    /// No inline preview; textual fallback with download
    Unsupported,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Pdf => "pdf",
            Self::Unsupported => "unsupported",
        }
    }

    /// Classify a declared `Content-Type` value.
    ///
    /// Only an exact `application/pdf` selects [`MediaKind::Pdf`]. What happens
    /// to everything else depends on the policy.
    pub fn classify(content_type: Option<&str>, policy: MediaKindPolicy) -> Self {
        if content_type == Some(PDF_MEDIA_TYPE) {
            return Self::Pdf;
        }
        match policy {
            MediaKindPolicy::Lenient => Self::Image,
            MediaKindPolicy::Strict => match content_type {
                Some(ct) if ct.trim_start().to_ascii_lowercase().starts_with("image/") => {
                    Self::Image
                }
                _ => Self::Unsupported,
            },
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How content types other than PDF are classified
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaKindPolicy {
    /// Everything that is not a PDF is treated as an image
    #[default]
    Lenient,
    /// Only `image/*` is an image; other types are unsupported
    Strict,
}

impl std::str::FromStr for MediaKindPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            _ => Err(format!("Invalid media kind policy: {}", s)),
        }
    }
}

/// How the preview obtains the document's media type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransportStrategy {
    /// Metadata-only HTTP request against the document endpoint
    #[default]
    HeadProbe,
    /// Document already present as a base64 `data:` URI
    EmbeddedPayload,
}

impl std::str::FromStr for TransportStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "head" | "head_probe" => Ok(Self::HeadProbe),
            "embedded" | "embedded_payload" => Ok(Self::EmbeddedPayload),
            _ => Err(format!("Invalid transport strategy: {}", s)),
        }
    }
}

/// Lifecycle status of a preview session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PreviewStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

impl PreviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for PreviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference used to fetch or download a document body.
///
/// Either a path relative to the API base URL or a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceLocator(String);

impl ResourceLocator {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Locator of a subject's document on the admin endpoint
    pub fn for_subject(subject: &SubjectId) -> Self {
        Self(format!("{}/{}", KYC_DOCUMENT_PATH, subject))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the locator carries the document inline
    pub fn is_inline(&self) -> bool {
        self.0.starts_with("data:")
    }

    /// Download-flagged variant of this locator
    pub fn download_href(&self) -> String {
        if self.is_inline() {
            self.0.clone()
        } else if self.0.contains('?') {
            format!("{}&{}", self.0, DOWNLOAD_QUERY_FLAG)
        } else {
            format!("{}?{}", self.0, DOWNLOAD_QUERY_FLAG)
        }
    }
}

impl std::fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Headers learned from a metadata-only probe
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Declared `Content-Type`, if any
    pub content_type: Option<String>,
    /// Declared `Content-Length`, if any
    pub content_length: Option<u64>,
}

impl ProbeOutcome {
    pub fn with_content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            content_length: None,
        }
    }
}

/// Stored document metadata (everything but the body)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct KycDocumentMetadata {
    /// Owner of the document
    pub subject_id: SubjectId,
    /// Declared media type
    #[schema(example = "application/pdf")]
    pub content_type: String,
    /// File name offered on download
    #[schema(example = "passport.pdf")]
    pub file_name: String,
    /// Body size in bytes
    pub size_bytes: i64,
    /// Hex-encoded SHA-256 of the body
    pub sha256: String,
    /// Upload timestamp
    pub uploaded_at: DateTime<Utc>,
}

/// A stored KYC document
#[derive(Debug, Clone, PartialEq)]
pub struct KycDocument {
    pub metadata: KycDocumentMetadata,
    pub content: Vec<u8>,
}

/// Document upload accepted by the document service
#[derive(Debug, Clone, Validate)]
pub struct NewKycDocument {
    pub subject_id: SubjectId,
    #[validate(length(min = 1, max = 255, message = "Content type is required"))]
    pub content_type: String,
    #[validate(length(min = 1, max = 255, message = "File name must be 1-255 characters"))]
    pub file_name: Option<String>,
    #[validate(length(min = 1, message = "Document body must not be empty"))]
    pub content: Vec<u8>,
}

impl NewKycDocument {
    #[must_use]
    pub fn new(subject_id: SubjectId, content_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            subject_id,
            content_type: content_type.into(),
            file_name: None,
            content,
        }
    }

    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// File name to store, falling back to `<subject>.<ext>`
    pub fn resolved_file_name(&self) -> String {
        match &self.file_name {
            Some(name) => name.clone(),
            None => format!(
                "{}.{}",
                self.subject_id,
                default_extension(&self.content_type)
            ),
        }
    }
}

/// File extension for common KYC media types
pub fn default_extension(content_type: &str) -> &'static str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        PDF_MEDIA_TYPE => "pdf",
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/heic" => "heic",
        "image/tiff" => "tiff",
        _ => "bin",
    }
}

/// Query parameters of the document endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DocumentQuery {
    /// Force `Content-Disposition: attachment`
    #[serde(default)]
    pub download: bool,
}

/// Query parameters of the upload endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UploadQuery {
    /// File name offered on download
    pub file_name: Option<String>,
}

/// Health status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Critical systems unavailable
    Unhealthy,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall system status
    pub status: HealthStatus,
    /// Document store health status
    pub storage: HealthStatus,
    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
    /// Application version
    #[schema(example = "0.1.0")]
    pub version: String,
}

impl HealthResponse {
    #[must_use]
    pub fn new(storage: HealthStatus) -> Self {
        Self {
            status: storage,
            storage,
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Error type identifier
    #[schema(example = "not_found")]
    pub r#type: String,
    /// Human-readable error message
    #[schema(example = "Not found: no KYC document for subject 42")]
    pub message: String,
}

/// Rate limit exceeded response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RateLimitResponse {
    /// Error details
    pub error: ErrorDetail,
    /// Seconds until rate limit resets
    #[schema(example = 1)]
    pub retry_after: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_subject_id_validation() {
        assert_eq!(SubjectId::new("42").unwrap().as_str(), "42");
        assert_eq!(SubjectId::new("  user_7-a ").unwrap().as_str(), "user_7-a");
        assert!(matches!(
            SubjectId::new("   "),
            Err(ValidationError::MissingField(_))
        ));
        assert!(SubjectId::new("../etc/passwd").is_err());
        assert!(SubjectId::new("42?download=true").is_err());
    }

    #[test]
    fn test_subject_id_length_limit() {
        let longest = "a".repeat(MAX_SUBJECT_ID_LEN);
        assert_eq!(SubjectId::new(longest.clone()).unwrap().as_str(), longest);

        let too_long = "a".repeat(MAX_SUBJECT_ID_LEN + 1);
        assert!(matches!(
            SubjectId::new(too_long),
            Err(ValidationError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_subject_id_parse_optional() {
        assert_eq!(SubjectId::parse_optional(None).unwrap(), None);
        assert_eq!(SubjectId::parse_optional(Some("  ")).unwrap(), None);
        assert_eq!(
            SubjectId::parse_optional(Some("42")).unwrap(),
            Some(SubjectId::from(42))
        );
    }

    #[test]
    fn test_subject_id_serde_rejects_invalid() {
        let id: SubjectId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(id, SubjectId::from(42));
        assert!(serde_json::from_str::<SubjectId>("\"a/b\"").is_err());
    }

    #[test]
    fn test_classify_lenient_matches_observed_behavior() {
        let policy = MediaKindPolicy::Lenient;
        assert_eq!(MediaKind::classify(Some("application/pdf"), policy), MediaKind::Pdf);
        assert_eq!(MediaKind::classify(Some("image/png"), policy), MediaKind::Image);
        assert_eq!(MediaKind::classify(Some("text/plain"), policy), MediaKind::Image);
        assert_eq!(MediaKind::classify(None, policy), MediaKind::Image);
        // Exact match only.
        assert_eq!(
            MediaKind::classify(Some("application/pdf; charset=binary"), policy),
            MediaKind::Image
        );
    }

    #[test]
    fn test_classify_strict() {
        let policy = MediaKindPolicy::Strict;
        assert_eq!(MediaKind::classify(Some("application/pdf"), policy), MediaKind::Pdf);
        assert_eq!(MediaKind::classify(Some("image/jpeg"), policy), MediaKind::Image);
        assert_eq!(MediaKind::classify(Some("IMAGE/PNG"), policy), MediaKind::Image);
        assert_eq!(
            MediaKind::classify(Some("application/zip"), policy),
            MediaKind::Unsupported
        );
        assert_eq!(MediaKind::classify(None, policy), MediaKind::Unsupported);
    }

    #[test]
    fn test_policy_and_transport_parsing() {
        assert_eq!(MediaKindPolicy::from_str("STRICT").unwrap(), MediaKindPolicy::Strict);
        assert_eq!(MediaKindPolicy::from_str("lenient").unwrap(), MediaKindPolicy::Lenient);
        assert!(MediaKindPolicy::from_str("loose").is_err());

        assert_eq!(
            TransportStrategy::from_str("head").unwrap(),
            TransportStrategy::HeadProbe
        );
        assert_eq!(
            TransportStrategy::from_str("embedded_payload").unwrap(),
            TransportStrategy::EmbeddedPayload
        );
        assert!(TransportStrategy::from_str("carrier_pigeon").is_err());
    }

    #[test]
    fn test_resource_locator_for_subject_and_download() {
        let locator = ResourceLocator::for_subject(&SubjectId::from(42));
        assert_eq!(locator.as_str(), "/api/admin/kyc-document/42");
        assert_eq!(
            locator.download_href(),
            "/api/admin/kyc-document/42?download=true"
        );

        let with_query = ResourceLocator::new("/files/7?v=2");
        assert_eq!(with_query.download_href(), "/files/7?v=2&download=true");

        let inline = ResourceLocator::new("data:image/png;base64,AAAA");
        assert!(inline.is_inline());
        assert_eq!(inline.download_href(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_new_document_validation() {
        let doc = NewKycDocument::new(SubjectId::from(1), "application/pdf", vec![1, 2, 3]);
        assert!(doc.validate().is_ok());
        assert_eq!(doc.resolved_file_name(), "1.pdf");

        let doc = NewKycDocument::new(SubjectId::from(1), "", vec![1]);
        assert!(doc.validate().is_err());

        let doc = NewKycDocument::new(SubjectId::from(1), "image/png", vec![]);
        assert!(doc.validate().is_err());

        let doc = NewKycDocument::new(SubjectId::from(1), "image/png", vec![1])
            .with_file_name("");
        assert!(doc.validate().is_err());
    }

    #[test]
    fn test_default_extension() {
        assert_eq!(default_extension("application/pdf"), "pdf");
        assert_eq!(default_extension("image/jpeg"), "jpg");
        assert_eq!(default_extension("Image/PNG; q=1"), "png");
        assert_eq!(default_extension("application/x-unknown"), "bin");
    }

    #[test]
    fn test_health_response_mirrors_storage() {
        let health = HealthResponse::new(HealthStatus::Unhealthy);
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }
}
