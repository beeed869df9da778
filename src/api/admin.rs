//! Admin API handlers for KYC documents.
//!
//! `GET` returns the body, `HEAD` only the headers the preview probe needs,
//! and `?download=true` switches the disposition to `attachment`.

use std::sync::Arc;

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Path, Query, State, rejection::BytesRejection},
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::app::AppState;
use crate::domain::{
    AppError, DocumentQuery, KycDocumentMetadata, NewKycDocument, SubjectId, UploadQuery,
    ValidationError,
};

/// Fetch (or probe with `HEAD`) a subject's KYC document
///
/// GET|HEAD /api/admin/kyc-document/{subject_id}
#[utoipa::path(
    get,
    path = "/api/admin/kyc-document/{subject_id}",
    tag = "kyc",
    params(
        ("subject_id" = String, Path, description = "Subject whose document is requested"),
        ("download" = Option<bool>, Query, description = "Force a download instead of inline display")
    ),
    responses(
        (status = 200, description = "Document body (empty for HEAD)", content_type = "application/octet-stream"),
        (status = 400, description = "Invalid subject id", body = crate::domain::ErrorResponse),
        (status = 401, description = "Missing or invalid admin token", body = crate::domain::ErrorResponse),
        (status = 404, description = "No document for subject", body = crate::domain::ErrorResponse),
    )
)]
pub async fn get_document_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    Path(subject_id): Path<String>,
    Query(query): Query<DocumentQuery>,
) -> Result<Response, AppError> {
    let subject = SubjectId::new(subject_id)?;

    if method == Method::HEAD {
        let metadata = state.service.get_metadata(&subject).await?;
        debug!(subject = %subject, content_type = %metadata.content_type, "KYC document probed");
        return Ok(document_response(&metadata, query.download, Body::empty()));
    }

    let document = state.service.get_document(&subject).await?;
    debug!(subject = %subject, download = query.download, "KYC document served");
    Ok(document_response(
        &document.metadata,
        query.download,
        Body::from(document.content),
    ))
}

/// Upload or replace a subject's KYC document
///
/// PUT /api/admin/kyc-document/{subject_id}
#[utoipa::path(
    put,
    path = "/api/admin/kyc-document/{subject_id}",
    tag = "kyc",
    params(
        ("subject_id" = String, Path, description = "Subject the document belongs to"),
        ("file_name" = Option<String>, Query, description = "File name offered on download")
    ),
    request_body(content = Vec<u8>, description = "Raw document body", content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Document stored", body = KycDocumentMetadata),
        (status = 400, description = "Invalid request", body = crate::domain::ErrorResponse),
        (status = 401, description = "Missing or invalid admin token", body = crate::domain::ErrorResponse),
        (status = 413, description = "Document too large", body = crate::domain::ErrorResponse),
    )
)]
pub async fn upload_document_handler(
    State(state): State<Arc<AppState>>,
    Path(subject_id): Path<String>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<KycDocumentMetadata>, AppError> {
    let subject = SubjectId::new(subject_id)?;
    let body = body.map_err(|rejection| {
        body_rejection_error(&rejection, &headers, state.service.max_document_bytes())
    })?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            AppError::Validation(ValidationError::MissingField("Content-Type".into()))
        })?;

    let mut document = NewKycDocument::new(subject, content_type, body.to_vec());
    if let Some(file_name) = query.file_name {
        document = document.with_file_name(file_name);
    }

    let metadata = state.service.upload_document(&document).await?;

    warn!(
        subject = %metadata.subject_id,
        content_type = %metadata.content_type,
        size_bytes = metadata.size_bytes,
        "Admin uploaded KYC document"
    );

    Ok(Json(metadata))
}

/// Delete a subject's KYC document
///
/// DELETE /api/admin/kyc-document/{subject_id}
#[utoipa::path(
    delete,
    path = "/api/admin/kyc-document/{subject_id}",
    tag = "kyc",
    params(
        ("subject_id" = String, Path, description = "Subject whose document is removed")
    ),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 401, description = "Missing or invalid admin token", body = crate::domain::ErrorResponse),
        (status = 404, description = "No document for subject", body = crate::domain::ErrorResponse),
    )
)]
pub async fn delete_document_handler(
    State(state): State<Arc<AppState>>,
    Path(subject_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let subject = SubjectId::new(subject_id)?;
    state.service.delete_document(&subject).await?;

    warn!(subject = %subject, "Admin deleted KYC document");

    Ok(StatusCode::NO_CONTENT)
}

/// Map a body extraction failure onto the JSON error taxonomy.
///
/// A streamed body has no declared size, so the limit plus one is reported.
fn body_rejection_error(
    rejection: &BytesRejection,
    headers: &HeaderMap,
    limit: usize,
) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let size = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or_else(|| limit.saturating_add(1));
        return AppError::Validation(ValidationError::PayloadTooLarge { size, limit });
    }
    AppError::Validation(ValidationError::InvalidField {
        field: "body".to_string(),
        message: rejection.body_text(),
    })
}

fn document_response(metadata: &KycDocumentMetadata, download: bool, body: Body) -> Response {
    let disposition = if download { "attachment" } else { "inline" };
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, metadata.content_type.clone()),
            (header::CONTENT_LENGTH, metadata.size_bytes.to_string()),
            (header::ETAG, format!("\"{}\"", metadata.sha256)),
            (
                header::CONTENT_DISPOSITION,
                format!(
                    "{}; filename=\"{}\"",
                    disposition,
                    header_safe_file_name(&metadata.file_name)
                ),
            ),
            (header::CACHE_CONTROL, "private, no-store".to_string()),
        ],
        body,
    )
        .into_response()
}

/// Replace characters that cannot appear inside a quoted header parameter
fn header_safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_safe_file_name() {
        assert_eq!(header_safe_file_name("passport scan.pdf"), "passport scan.pdf");
        assert_eq!(header_safe_file_name("pass\"port.pdf"), "pass_port.pdf");
        assert_eq!(header_safe_file_name("paß.png"), "pa_.png");
    }
}
