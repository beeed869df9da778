//! Document store implementations.

pub mod memory;
pub mod postgres;

pub use memory::MemoryDocumentStore;
pub use postgres::{PostgresConfig, PostgresDocumentStore};
