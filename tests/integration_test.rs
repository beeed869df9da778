//! Integration tests for the document API.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use secrecy::SecretString;
use tower::ServiceExt;

use kyc_document_preview::api::create_router;
use kyc_document_preview::app::AppState;
use kyc_document_preview::domain::{
    ErrorResponse, HealthResponse, HealthStatus, KycDocumentMetadata,
};
use kyc_document_preview::test_utils::MockDocumentStore;

const PDF_BYTES: &[u8] = b"%PDF-1.7\n%test document";

fn create_test_state() -> Arc<AppState> {
    Arc::new(AppState::new(Arc::new(MockDocumentStore::new())))
}

fn upload_request(subject: &str, content_type: &str, body: &'static [u8]) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(format!("/api/admin/kyc-document/{}?file_name=passport.pdf", subject))
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

async fn seed(state: &Arc<AppState>, subject: &str) {
    let response = create_router(Arc::clone(state))
        .oneshot(upload_request(subject, "application/pdf", PDF_BYTES))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_document() {
    let state = create_test_state();
    let router = create_router(state);

    let response = router
        .oneshot(upload_request("42", "application/pdf", PDF_BYTES))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let metadata: KycDocumentMetadata = serde_json::from_slice(&body).unwrap();
    assert_eq!(metadata.subject_id.as_str(), "42");
    assert_eq!(metadata.content_type, "application/pdf");
    assert_eq!(metadata.file_name, "passport.pdf");
    assert_eq!(metadata.size_bytes, PDF_BYTES.len() as i64);
    assert_eq!(metadata.sha256.len(), 64);
}

#[tokio::test]
async fn test_upload_requires_content_type() {
    let router = create_router(create_test_state());

    let request = Request::builder()
        .method("PUT")
        .uri("/api/admin/kyc-document/42")
        .body(Body::from(PDF_BYTES))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_empty_body_rejected() {
    let router = create_router(create_test_state());

    let response = router
        .oneshot(upload_request("42", "application/pdf", b""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_too_large() {
    let state = Arc::new(
        AppState::new(Arc::new(MockDocumentStore::new())).with_max_document_bytes(8),
    );
    let router = create_router(state);

    let response = router
        .oneshot(upload_request("42", "application/pdf", PDF_BYTES))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error.r#type, "payload_too_large");
    assert!(error.error.message.contains("limit of 8 bytes"));
}

#[tokio::test]
async fn test_upload_too_large_with_declared_length() {
    let state = Arc::new(
        AppState::new(Arc::new(MockDocumentStore::new())).with_max_document_bytes(8),
    );
    let router = create_router(state);

    let request = Request::builder()
        .method("PUT")
        .uri("/api/admin/kyc-document/42")
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_LENGTH, PDF_BYTES.len())
        .body(Body::from(PDF_BYTES))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error.r#type, "payload_too_large");
}

#[tokio::test]
async fn test_upload_subject_id_too_long() {
    let router = create_router(create_test_state());
    let subject = "a".repeat(129);

    let response = router
        .oneshot(upload_request(&subject, "application/pdf", PDF_BYTES))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error.r#type, "validation_error");
}

#[tokio::test]
async fn test_get_document_inline() {
    let state = create_test_state();
    seed(&state, "42").await;

    let request = Request::builder()
        .uri("/api/admin/kyc-document/42")
        .body(Body::empty())
        .unwrap();
    let response = create_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "inline; filename=\"passport.pdf\""
    );
    assert!(headers.contains_key(header::ETAG));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], PDF_BYTES);
}

#[tokio::test]
async fn test_get_document_download_flag() {
    let state = create_test_state();
    seed(&state, "42").await;

    let request = Request::builder()
        .uri("/api/admin/kyc-document/42?download=true")
        .body(Body::empty())
        .unwrap();
    let response = create_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"passport.pdf\""
    );
}

#[tokio::test]
async fn test_head_returns_headers_only() {
    let state = create_test_state();
    seed(&state, "42").await;

    let request = Request::builder()
        .method("HEAD")
        .uri("/api/admin/kyc-document/42")
        .body(Body::empty())
        .unwrap();
    let response = create_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_get_missing_document() {
    let router = create_router(create_test_state());

    let request = Request::builder()
        .uri("/api/admin/kyc-document/404")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error.r#type, "not_found");
}

#[tokio::test]
async fn test_invalid_subject_id() {
    let router = create_router(create_test_state());

    let request = Request::builder()
        .uri("/api/admin/kyc-document/a.b")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_document() {
    let state = create_test_state();
    seed(&state, "42").await;

    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri("/api/admin/kyc-document/42")
            .body(Body::empty())
            .unwrap()
    };

    let response = create_router(Arc::clone(&state))
        .oneshot(delete())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = create_router(state).oneshot(delete()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_token_required() {
    let state = Arc::new(
        AppState::new(Arc::new(MockDocumentStore::new()))
            .with_admin_token(SecretString::from("s3cret".to_string())),
    );

    let request = Request::builder()
        .uri("/api/admin/kyc-document/42")
        .body(Body::empty())
        .unwrap();
    let response = create_router(Arc::clone(&state))
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/admin/kyc-document/42")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let response = create_router(Arc::clone(&state))
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/admin/kyc-document/42")
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let response = create_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_failure_maps_to_server_error() {
    let state = Arc::new(AppState::new(Arc::new(MockDocumentStore::failing("db down"))));

    let request = Request::builder()
        .uri("/api/admin/kyc-document/42")
        .body(Body::empty())
        .unwrap();
    let response = create_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_health_check() {
    let router = create_router(create_test_state());

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let health: HealthResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.storage, HealthStatus::Healthy);
}

#[tokio::test]
async fn test_readiness_reflects_store_health() {
    let store = Arc::new(MockDocumentStore::new());
    store.set_healthy(false);
    let state = Arc::new(AppState::new(store));

    let request = Request::builder()
        .uri("/health/ready")
        .body(Body::empty())
        .unwrap();
    let response = create_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let request = Request::builder()
        .uri("/health/live")
        .body(Body::empty())
        .unwrap();
    let response = create_router(create_test_state())
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let router = create_router(create_test_state());

    let request = Request::builder()
        .uri("/api-docs/openapi.json")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(doc["paths"]["/api/admin/kyc-document/{subject_id}"].is_object());
}
