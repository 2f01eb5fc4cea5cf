//! # Host Error Type
//!
//! Startup and channel failures. Command failures never surface here; they
//! travel back over the channel as outcomes.

use posbridge_engine::EngineError;
use posbridge_store::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Configuration error: {0}")]
    Config(#[from] EngineError),

    #[error("Inventory store error: {0}")]
    Store(#[from] DbError),

    #[error("No data directory available; set POSBRIDGE_DB_PATH")]
    NoDataDirectory,

    #[error("Invalid command line: {0}")]
    Usage(String),

    #[error("Channel I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HostResult<T> = Result<T, HostError>;
