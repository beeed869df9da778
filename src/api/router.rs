//! Router configuration with middleware.

use std::env;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use governor::{
    DefaultDirectRateLimiter, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
};
use secrecy::ExposeSecret;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::admin::{delete_document_handler, get_document_handler, upload_document_handler};
use super::handlers::{ApiDoc, health_check_handler, liveness_handler, readiness_handler};
use crate::app::AppState;
use crate::domain::{AppError, ErrorDetail, RateLimitResponse};

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Requests allowed in a single burst
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_size: 20,
        }
    }
}

impl RateLimitConfig {
    /// Read `RATE_LIMIT_RPS` and `RATE_LIMIT_BURST`, falling back to defaults
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let requests_per_second = env::var("RATE_LIMIT_RPS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.requests_per_second);
        let burst_size = env::var("RATE_LIMIT_BURST")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.burst_size);
        Self {
            requests_per_second,
            burst_size,
        }
    }

    fn quota(&self) -> Quota {
        let rps = NonZeroU32::new(self.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.burst_size).unwrap_or(rps);
        Quota::per_second(rps).allow_burst(burst)
    }
}

/// Create the router without rate limiting
pub fn create_router(state: Arc<AppState>) -> Router {
    build_router(state, None)
}

/// Create the router with a global rate limit
pub fn create_router_with_rate_limit(state: Arc<AppState>, config: RateLimitConfig) -> Router {
    info!(
        requests_per_second = config.requests_per_second,
        burst_size = config.burst_size,
        "Rate limiting configured"
    );
    let limiter = Arc::new(RateLimiter::direct(config.quota()));
    build_router(state, Some(limiter))
}

fn build_router(state: Arc<AppState>, limiter: Option<Arc<DefaultDirectRateLimiter>>) -> Router {
    let max_body = state.service.max_document_bytes();

    let admin_routes = Router::new()
        .route(
            "/api/admin/kyc-document/{subject_id}",
            get(get_document_handler)
                .put(upload_document_handler)
                .delete(delete_document_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_admin_token,
        ))
        .layer(DefaultBodyLimit::max(max_body));

    let health_routes = Router::new()
        .route("/health", get(health_check_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler));

    let mut router = Router::new()
        .merge(admin_routes)
        .merge(health_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    if let Some(limiter) = limiter {
        router = router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
    }

    router.layer(cors_layer()).layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::CONTENT_DISPOSITION,
            header::ETAG,
        ])
}

/// Reject admin requests without the configured bearer token.
/// No configured token leaves the routes open.
async fn require_admin_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = &state.admin_token else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == expected.expose_secret() => Ok(next.run(request).await),
        Some(_) => {
            warn!(path = %request.uri().path(), "Rejected admin request with invalid token");
            Err(AppError::Authentication("Invalid admin token".to_string()))
        }
        None => Err(AppError::Authentication(
            "Missing bearer token".to_string(),
        )),
    }
}

async fn rate_limit_middleware(
    State(limiter): State<Arc<DefaultDirectRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    match limiter.check() {
        Ok(()) => next.run(request).await,
        Err(not_until) => {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            let retry_after = wait.as_secs().max(1);
            warn!(retry_after, "Rate limit exceeded");

            let body = Json(RateLimitResponse {
                error: ErrorDetail {
                    r#type: "rate_limited".to_string(),
                    message: "Rate limit exceeded".to_string(),
                },
                retry_after,
            });
            let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}
