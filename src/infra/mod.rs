//! Infrastructure layer implementations.

pub mod download;
pub mod probe;
pub mod storage;

pub use download::FileDownloadLauncher;
pub use probe::{EmbeddedDocumentProbe, HttpDocumentProbe, build_probe};
pub use storage::{MemoryDocumentStore, PostgresConfig, PostgresDocumentStore};
