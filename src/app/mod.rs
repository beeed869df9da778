//! Application layer containing the preview flow, business logic and shared state.

pub mod controller;
pub mod download;
pub mod render;
pub mod service;
pub mod session;
pub mod state;

pub use controller::{PreviewConfig, PreviewController};
pub use download::DownloadTrigger;
pub use render::RenderPlan;
pub use service::DocumentService;
pub use session::{PreviewSession, PreviewTarget, ProbeTicket, SessionState};
pub use state::AppState;
