//! # Error Types
//!
//! Error taxonomy for the POS bridge.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  posbridge-core errors (this file)                                      │
//! │  ├── ValidationError  - Missing/malformed command arguments             │
//! │  ├── SdkError         - Failures raised by the POS SDK collaborators    │
//! │  └── CommandError     - What the command channel sees (serialized)      │
//! │                                                                         │
//! │  posbridge-store errors (separate crate)                                │
//! │  └── DbError          - Inventory database failures                     │
//! │                                                                         │
//! │  Flow: ValidationError ─┐                                               │
//! │        SdkError ────────┼──► CommandError { kind, message } ──► Channel │
//! │        DbError ─► SdkError                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. The original message is always preserved when mapping to a kind
//! 3. Every failure reaching the channel carries exactly one [`ErrorKind`]

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Validation Error
// =============================================================================

/// Command argument validation errors.
///
/// Raised synchronously on the calling context, before any worker runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required argument is absent (or explicitly null).
    #[error("{field} is missing")]
    Missing { field: String },

    /// Argument present but of the wrong JSON type.
    #[error("{field} must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
}

// =============================================================================
// SDK Error
// =============================================================================

/// Failures reported by the POS SDK collaborators (account resolver,
/// connector, inventory store, payment authorizer).
///
/// ## Categories
/// - `Binding`: the connector could not bind to the backend service
/// - `Client`: the request was rejected locally (bad input, bad state)
/// - `Service`: the backend failed while handling the request
/// - `Unavailable`: the connector is closed or the store is unreachable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkError {
    #[error("Binding failed: {0}")]
    Binding(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Connector unavailable: {0}")]
    Unavailable(String),
}

impl SdkError {
    /// The backend connection is gone; the session holding it is stale.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, SdkError::Unavailable(_))
    }
}

// =============================================================================
// Error Kind
// =============================================================================

/// Machine-readable error kinds delivered through the command channel.
///
/// ## Usage in the UI shell
/// ```typescript
/// switch (response.errorKind) {
///   case 'NOT_INITIALIZED':
///     await bridge.invoke('initialize');
///     break;
///   case 'PAYMENT_FAILED':
///     showRetry(response.message);
///     break;
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorKind {
    /// No bound account found - unrecoverable without external setup.
    NoAccount,

    /// Account or connector setup failed.
    InitError,

    /// Operation attempted before a successful initialize.
    NotInitialized,

    /// Missing or malformed required argument.
    InvalidArgument,

    /// Payment declined. Safe to retry.
    PaymentFailed,

    /// Connector teardown failed.
    DisconnectError,

    /// Inventory listing failed.
    InventoryError,

    /// Single item lookup failed.
    ItemError,

    /// Valid lookup, no matching record.
    ItemNotFound,
}

impl ErrorKind {
    /// Returns the wire code (e.g. `"NOT_INITIALIZED"`).
    pub const fn code(&self) -> &'static str {
        match self {
            ErrorKind::NoAccount => "NO_ACCOUNT",
            ErrorKind::InitError => "INIT_ERROR",
            ErrorKind::NotInitialized => "NOT_INITIALIZED",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::PaymentFailed => "PAYMENT_FAILED",
            ErrorKind::DisconnectError => "DISCONNECT_ERROR",
            ErrorKind::InventoryError => "INVENTORY_ERROR",
            ErrorKind::ItemError => "ITEM_ERROR",
            ErrorKind::ItemNotFound => "ITEM_NOT_FOUND",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Command Error
// =============================================================================

/// Error outcome of a command.
///
/// ## Serialization
/// ```json
/// {
///   "kind": "ITEM_NOT_FOUND",
///   "message": "Item not found: 8XK2J"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CommandError {
    /// Machine-readable error kind
    pub kind: ErrorKind,

    /// Human-readable message, preserving the underlying cause
    pub message: String,
}

impl CommandError {
    /// Creates a new command error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        CommandError {
            kind,
            message: message.into(),
        }
    }

    pub fn no_account() -> Self {
        CommandError::new(ErrorKind::NoAccount, "No POS account found")
    }

    pub fn not_initialized() -> Self {
        CommandError::new(ErrorKind::NotInitialized, "POS connector not initialized")
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CommandError::new(ErrorKind::InvalidArgument, message)
    }

    pub fn payment_declined(reason: impl Into<String>) -> Self {
        CommandError::new(ErrorKind::PaymentFailed, reason)
    }

    pub fn item_not_found(id: &str) -> Self {
        CommandError::new(ErrorKind::ItemNotFound, format!("Item not found: {}", id))
    }

    /// Maps an SDK failure to the given kind, keeping its message.
    pub fn from_sdk(kind: ErrorKind, err: &SdkError) -> Self {
        CommandError::new(kind, err.to_string())
    }
}

/// Validation failures always surface as `INVALID_ARGUMENT`.
impl From<ValidationError> for CommandError {
    fn from(err: ValidationError) -> Self {
        CommandError::invalid_argument(err.to_string())
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for CommandError {}

/// Convenience type alias for command results.
pub type CommandResult<T> = Result<T, CommandError>;

// =============================================================================
// Unit Tests
// =============================================================================
