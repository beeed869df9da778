//! KYC document retrieval and in-app preview.
//!
//! The server side stores each subject's document and serves it from
//! `/api/admin/kyc-document/{subject_id}`. The client side probes that
//! endpoint with `HEAD`, classifies the media type and drives the preview
//! session through `Idle`, `Loading`, `Ready` and `Error`.

pub mod api;
pub mod app;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
