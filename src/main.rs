//! Document server entry point.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::SecretString;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use kyc_document_preview::api::{RateLimitConfig, create_router, create_router_with_rate_limit};
use kyc_document_preview::app::AppState;
use kyc_document_preview::app::service::DEFAULT_MAX_DOCUMENT_BYTES;
use kyc_document_preview::domain::DocumentStore;
use kyc_document_preview::infra::{MemoryDocumentStore, PostgresConfig, PostgresDocumentStore};

/// Application configuration
struct Config {
    /// PostgreSQL connection string (optional - in-memory store if not set)
    database_url: Option<String>,
    host: String,
    port: u16,
    /// Bearer token required on admin routes (optional - routes open if not set)
    admin_token: Option<SecretString>,
    max_document_bytes: usize,
    enable_rate_limiting: bool,
    rate_limit_config: RateLimitConfig,
}

impl Config {
    fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").ok().filter(|u| !u.is_empty());
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{}'", raw))?,
            Err(_) => 3000,
        };
        let admin_token = env::var("ADMIN_API_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(SecretString::from);
        let max_document_bytes = env::var("MAX_DOCUMENT_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_MAX_DOCUMENT_BYTES);
        let enable_rate_limiting = env::var("ENABLE_RATE_LIMITING")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let rate_limit_config = RateLimitConfig::from_env();

        Ok(Self {
            database_url,
            host,
            port,
            admin_token,
            max_document_bytes,
            enable_rate_limiting,
            rate_limit_config,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

async fn build_store(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    match &config.database_url {
        Some(url) => {
            let store = PostgresDocumentStore::new(url, PostgresConfig::default()).await?;
            store.run_migrations().await?;
            info!("   ✓ Database connected and migrations applied");
            Ok(Arc::new(store))
        }
        None => {
            warn!("   ⚠ DATABASE_URL not set, documents are kept in memory");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    info!("🪪  KYC Document Service v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    info!("📦 Initializing infrastructure...");
    let store = build_store(&config).await?;

    let mut app_state = AppState::new(store).with_max_document_bytes(config.max_document_bytes);
    if let Some(token) = config.admin_token.clone() {
        app_state = app_state.with_admin_token(token);
        info!("   ✓ Admin token configured");
    } else {
        warn!("   ⚠ ADMIN_API_TOKEN not set, admin routes are unauthenticated");
    }
    info!("   ✓ Upload limit: {} bytes", config.max_document_bytes);
    let app_state = Arc::new(app_state);

    let router = if config.enable_rate_limiting {
        info!("   ✓ Rate limiting enabled");
        create_router_with_rate_limit(app_state, config.rate_limit_config)
    } else {
        info!("   ○ Rate limiting disabled");
        create_router(app_state)
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🚀 Server starting on http://{}", addr);
    info!("📖 Swagger UI available at http://{}/swagger-ui", addr);
    info!("📄 OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
