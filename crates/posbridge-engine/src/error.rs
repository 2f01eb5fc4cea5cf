//! # Engine Error Types
//!
//! Failures of the engine itself: configuration and wiring. Command
//! failures never show up here; they are
//! [`CommandError`](posbridge_core::CommandError) outcomes.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Engine Error Categories                           │
//! │                                                                         │
//! │  ┌───────────────────────────────┐  ┌───────────────────────────────┐   │
//! │  │  Configuration                │  │  Wiring                       │   │
//! │  │                               │  │                               │   │
//! │  │  InvalidConfig                │  │  MissingComponent             │   │
//! │  │  MissingDeviceId              │  │  NoRuntime                    │   │
//! │  │  ConfigLoadFailed, Io         │  │                               │   │
//! │  └───────────────────────────────┘  └───────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid bridge configuration: {0}")]
    InvalidConfig(String),

    #[error("Device ID not configured")]
    MissingDeviceId,

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // =========================================================================
    // Wiring Errors
    // =========================================================================
    /// A required collaborator was not supplied to the builder.
    #[error("Bridge is missing a {0}")]
    MissingComponent(&'static str),

    /// The bridge was built outside a Tokio runtime and no handle was given.
    #[error("No Tokio runtime available for the worker pool")]
    NoRuntime,
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}
