//! # Validation Module
//!
//! Argument extraction for incoming commands.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command channel (JSON decode)                                 │
//! │  └── Malformed request line → INVALID_ARGUMENT                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE, on the calling context                           │
//! │  ├── Presence: "amount" / "itemId" must exist and be non-null           │
//! │  └── Type: integer amount, string item id                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Worker (handler body)                                         │
//! │  └── Session precondition (NOT_INITIALIZED), SDK failures               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here touches the session: a command that fails validation never
//! reaches a worker.

use serde_json::Value;

use crate::command::CommandArgs;
use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Extracts a required integer argument.
///
/// ```rust
/// use posbridge_core::command::CommandArgs;
/// use posbridge_core::validation::require_integer;
/// use serde_json::json;
///
/// let mut args = CommandArgs::new();
/// args.insert("amount".into(), json!(1250));
/// assert_eq!(require_integer(&args, "amount").unwrap(), 1250);
///
/// args.insert("amount".into(), json!(12.5));
/// assert!(require_integer(&args, "amount").is_err());
/// ```
pub fn require_integer(args: &CommandArgs, field: &str) -> ValidationResult<i64> {
    match args.get(field) {
        None | Some(Value::Null) => Err(ValidationError::Missing {
            field: field.to_string(),
        }),
        Some(value) => value.as_i64().ok_or_else(|| ValidationError::WrongType {
            field: field.to_string(),
            expected: "an integer",
        }),
    }
}

/// Extracts a required string argument.
pub fn require_string(args: &CommandArgs, field: &str) -> ValidationResult<String> {
    match args.get(field) {
        None | Some(Value::Null) => Err(ValidationError::Missing {
            field: field.to_string(),
        }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::WrongType {
            field: field.to_string(),
            expected: "a string",
        }),
    }
}
