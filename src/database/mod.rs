pub mod document;
pub mod duplicate;
pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod query_builder;
pub mod repository;
pub mod sequence;
pub mod store;

use thiserror::Error;

pub use document::{Collection, Document};
pub use duplicate::DuplicateCheck;
pub use manager::DatabaseManager;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::Repository;
pub use sequence::Sequence;
pub use store::DocumentStore;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
