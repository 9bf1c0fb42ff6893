//! Session Store: durable sink for concluded screening records.
//!
//! The state machine only sees the `SessionStore` trait. `JsonFileStore` writes one
//! file per record; `PgSessionStore` keeps them in Postgres when `DATABASE_URL` is set.

use async_trait::async_trait;
use thiserror::Error;

use crate::interview::models::SessionRecord;

pub mod file;
pub mod postgres;

pub use file::JsonFileStore;
pub use postgres::PgSessionStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists one record and returns where it was written.
    async fn save(&self, record: &SessionRecord) -> Result<String, StorageError>;

    /// Every persisted record, oldest first.
    async fn list(&self) -> Result<Vec<SessionRecord>, StorageError>;
}
