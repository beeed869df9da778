//! The API layer, containing web handlers and routing.

pub mod admin;
pub mod handlers;
pub mod router;

pub use admin::{delete_document_handler, get_document_handler, upload_document_handler};
pub use handlers::ApiDoc;
pub use router::{RateLimitConfig, create_router, create_router_with_rate_limit};
