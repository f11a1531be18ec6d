//! Storage Layer
//!
//! Provides SQLite persistence with repository pattern, plus an in-process
//! change feed of inserted readings and alert logs.

mod repository;
mod schema;

pub use repository::{
    AlertLogRecord, AlertRecord, ChangeEvent, NewUser, Repository, SensorRecord, UserRecord,
};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
}

/// Current wall-clock time in Unix milliseconds
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
