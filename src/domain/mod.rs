//! Domain layer containing core business types, traits, and error definitions.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    AppError, ConfigError, DatabaseError, ExternalServiceError, PreviewFailure, ValidationError,
};
pub use traits::{DocumentProbe, DocumentStore, DownloadLauncher};
pub use types::{
    DocumentQuery, ErrorDetail, ErrorResponse, HealthResponse, HealthStatus, KYC_DOCUMENT_PATH,
    KycDocument, KycDocumentMetadata, MediaKind, MediaKindPolicy, NewKycDocument, PDF_MEDIA_TYPE,
    PreviewStatus, ProbeOutcome, RateLimitResponse, ResourceLocator, SubjectId, TransportStrategy,
    UploadQuery,
};
