//! HTTP-based integration tests for the document probe and file downloads.
//!
//! Uses `wiremock` to stand in for the KYC document endpoint.

use secrecy::SecretString;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

use kyc_document_preview::domain::{
    AppError, DocumentProbe, ExternalServiceError, ResourceLocator, SubjectId,
};
use kyc_document_preview::infra::HttpDocumentProbe;

fn locator(subject: u64) -> ResourceLocator {
    ResourceLocator::for_subject(&SubjectId::from(subject))
}

// ============================================================================
// HEAD PROBE TESTS
// ============================================================================

mod head_probe_tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_reports_pdf_content_type() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/api/admin/kyc-document/42"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "application/pdf")
                    .insert_header("Content-Length", "2048"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let probe = HttpDocumentProbe::new(mock_server.uri(), None).unwrap();
        let outcome = probe.probe(&locator(42)).await.unwrap();

        assert_eq!(outcome.content_type.as_deref(), Some("application/pdf"));
    }

    #[tokio::test]
    async fn test_probe_reports_image_content_type() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/api/admin/kyc-document/7"))
            .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", "image/png"))
            .mount(&mock_server)
            .await;

        let probe = HttpDocumentProbe::new(mock_server.uri(), None).unwrap();
        let outcome = probe.probe(&locator(7)).await.unwrap();

        assert_eq!(outcome.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_probe_sends_bearer_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(header("Authorization", "Bearer admin-token"))
            .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", "image/jpeg"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let probe = HttpDocumentProbe::new(
            mock_server.uri(),
            Some(SecretString::from("admin-token".to_string())),
        )
        .unwrap();
        let outcome = probe.probe(&locator(1)).await.unwrap();

        assert_eq!(outcome.content_type.as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn test_probe_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let probe = HttpDocumentProbe::new(mock_server.uri(), None).unwrap();
        let err = probe.probe(&locator(42)).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::ExternalService(ExternalServiceError::ApiError {
                status_code: 500,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_probe_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let probe = HttpDocumentProbe::new(mock_server.uri(), None).unwrap();
        let err = probe.probe(&locator(42)).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::ExternalService(ExternalServiceError::ApiError {
                status_code: 404,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_probe_unreachable_host() {
        // Nothing listens on the discard port
        let probe = HttpDocumentProbe::new("http://127.0.0.1:9", None).unwrap();
        let err = probe.probe(&locator(42)).await.unwrap_err();

        assert!(matches!(err, AppError::ExternalService(_)));
    }
}

// ============================================================================
// FILE DOWNLOAD TESTS
// ============================================================================

mod file_download_tests {
    use super::*;
    use kyc_document_preview::app::PreviewConfig;
    use kyc_document_preview::infra::FileDownloadLauncher;

    #[tokio::test]
    async fn test_download_uses_content_disposition_name() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/admin/kyc-document/42"))
            .and(query_param("download", "true"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "application/pdf")
                    .insert_header("Content-Disposition", "attachment; filename=\"passport.pdf\"")
                    .set_body_bytes(b"%PDF-1.7".to_vec()),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = PreviewConfig {
            api_base_url: mock_server.uri(),
            download_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let launcher = FileDownloadLauncher::new(&config).unwrap();

        let written = launcher
            .download("/api/admin/kyc-document/42?download=true")
            .await
            .unwrap();

        assert_eq!(written, dir.path().join("passport.pdf"));
        assert_eq!(std::fs::read(written).unwrap(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_download_failure_writes_nothing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let config = PreviewConfig {
            api_base_url: mock_server.uri(),
            download_dir: dir.path().join("out"),
            ..Default::default()
        };
        let launcher = FileDownloadLauncher::new(&config).unwrap();

        let result = launcher
            .download("/api/admin/kyc-document/42?download=true")
            .await;

        assert!(result.is_err());
        assert!(!dir.path().join("out").exists());
    }
}
