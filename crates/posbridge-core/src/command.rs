//! # Commands & Outcomes
//!
//! The request/response vocabulary of the command channel.
//!
//! ## Command Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  name               required args     needs session   delegate          │
//! │  ─────────────────  ────────────────  ─────────────   ────────────────  │
//! │  initialize         -                 no              lifecycle         │
//! │  makePayment        amount: integer   yes             payment processor │
//! │  disconnect         -                 no              lifecycle         │
//! │  getInventoryItems  -                 yes             inventory service │
//! │  getItemDetails     itemId: string    yes             inventory service │
//! │  (anything else)    -                 -               NotImplemented    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Shapes
//! ```json
//! { "name": "makePayment", "args": { "amount": 1250 } }
//!
//! { "success": "CLV-1718000000000-000001" }
//! { "errorKind": "PAYMENT_FAILED", "message": "Payment declined" }
//! { "notImplemented": "refund" }
//! ```

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CommandError, ErrorKind, ValidationError};
use crate::money::Money;
use crate::types::Item;
use crate::validation::{require_integer, require_string};

/// Argument mapping of a command (string keys to JSON values).
pub type CommandArgs = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// Request
// =============================================================================

/// A raw request as received from the command channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub name: String,

    #[serde(default)]
    pub args: CommandArgs,
}

impl CommandRequest {
    pub fn new(name: impl Into<String>) -> Self {
        CommandRequest {
            name: name.into(),
            args: CommandArgs::new(),
        }
    }

    /// Adds an argument (builder style).
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Command Name
// =============================================================================

/// The recognized command names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    Initialize,
    MakePayment,
    Disconnect,
    GetInventoryItems,
    GetItemDetails,
}

impl CommandName {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CommandName::Initialize => "initialize",
            CommandName::MakePayment => "makePayment",
            CommandName::Disconnect => "disconnect",
            CommandName::GetInventoryItems => "getInventoryItems",
            CommandName::GetItemDetails => "getItemDetails",
        }
    }

    /// Error kind reported when the handler for this command fails in a
    /// way that has no more specific kind (including a panic).
    pub const fn failure_kind(&self) -> ErrorKind {
        match self {
            CommandName::Initialize => ErrorKind::InitError,
            CommandName::MakePayment => ErrorKind::PaymentFailed,
            CommandName::Disconnect => ErrorKind::DisconnectError,
            CommandName::GetInventoryItems => ErrorKind::InventoryError,
            CommandName::GetItemDetails => ErrorKind::ItemError,
        }
    }

    /// Whether the command requires an initialized connector.
    pub const fn requires_session(&self) -> bool {
        matches!(
            self,
            CommandName::MakePayment | CommandName::GetInventoryItems | CommandName::GetItemDetails
        )
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown command name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl FromStr for CommandName {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initialize" => Ok(CommandName::Initialize),
            "makePayment" => Ok(CommandName::MakePayment),
            "disconnect" => Ok(CommandName::Disconnect),
            "getInventoryItems" => Ok(CommandName::GetInventoryItems),
            "getItemDetails" => Ok(CommandName::GetItemDetails),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

// =============================================================================
// Command
// =============================================================================

/// A validated command, ready to run on a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Initialize,
    MakePayment { amount: Money },
    Disconnect,
    GetInventoryItems,
    GetItemDetails { item_id: String },
}

impl Command {
    /// Validates the arguments of a known command.
    pub fn from_parts(name: CommandName, args: &CommandArgs) -> Result<Command, ValidationError> {
        let command = match name {
            CommandName::Initialize => Command::Initialize,
            CommandName::Disconnect => Command::Disconnect,
            CommandName::GetInventoryItems => Command::GetInventoryItems,
            CommandName::MakePayment => {
                let amount = require_integer(args, "amount")?;
                Command::MakePayment {
                    amount: Money::from_cents(amount),
                }
            }
            CommandName::GetItemDetails => {
                let item_id = require_string(args, "itemId")?;
                Command::GetItemDetails { item_id }
            }
        };
        Ok(command)
    }

    pub fn name(&self) -> CommandName {
        match self {
            Command::Initialize => CommandName::Initialize,
            Command::MakePayment { .. } => CommandName::MakePayment,
            Command::Disconnect => CommandName::Disconnect,
            Command::GetInventoryItems => CommandName::GetInventoryItems,
            Command::GetItemDetails { .. } => CommandName::GetItemDetails,
        }
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// Success payload of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum Payload {
    /// initialize / disconnect
    Flag(bool),

    /// makePayment (transaction id)
    Text(String),

    /// getItemDetails
    Item(Item),

    /// getInventoryItems
    Items(Vec<Item>),
}

/// The single outcome of one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Payload),
    Error(CommandError),

    /// The command name is not recognized. Not an error.
    NotImplemented(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Outcome::Success(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Error(err) => Some(err.kind),
            _ => None,
        }
    }
}

impl From<Result<Payload, CommandError>> for Outcome {
    fn from(result: Result<Payload, CommandError>) -> Self {
        match result {
            Ok(payload) => Outcome::Success(payload),
            Err(err) => Outcome::Error(err),
        }
    }
}

/// Serializes to the channel response shape.
impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Outcome::Success(payload) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("success", payload)?;
                map.end()
            }
            Outcome::Error(err) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("errorKind", &err.kind)?;
                map.serialize_entry("message", &err.message)?;
                map.end()
            }
            Outcome::NotImplemented(name) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("notImplemented", name)?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_round_trip_and_unknown() {
        for name in [
            CommandName::Initialize,
            CommandName::MakePayment,
            CommandName::Disconnect,
            CommandName::GetInventoryItems,
            CommandName::GetItemDetails,
        ] {
            assert_eq!(name.as_str().parse::<CommandName>(), Ok(name));
        }
        assert_eq!(
            "refund".parse::<CommandName>(),
            Err(UnknownCommand("refund".into()))
        );
        // Names are case sensitive, as on the channel.
        assert!("MakePayment".parse::<CommandName>().is_err());
    }

    #[test]
    fn test_make_payment_requires_amount() {
        let req = CommandRequest::new("makePayment");
        let err = Command::from_parts(CommandName::MakePayment, &req.args).unwrap_err();
        assert!(matches!(err, ValidationError::Missing { .. }));

        let req = CommandRequest::new("makePayment").arg("amount", 1250);
        let cmd = Command::from_parts(CommandName::MakePayment, &req.args).unwrap();
        assert_eq!(
            cmd,
            Command::MakePayment {
                amount: Money::from_cents(1250)
            }
        );
    }

    #[test]
    fn test_amount_and_item_id_take_any_value_of_their_type() {
        let req = CommandRequest::new("makePayment").arg("amount", 0);
        assert_eq!(
            Command::from_parts(CommandName::MakePayment, &req.args),
            Ok(Command::MakePayment {
                amount: Money::from_cents(0)
            })
        );

        let req = CommandRequest::new("makePayment").arg("amount", -5);
        assert!(Command::from_parts(CommandName::MakePayment, &req.args).is_ok());

        let req = CommandRequest::new("getItemDetails").arg("itemId", "");
        assert_eq!(
            Command::from_parts(CommandName::GetItemDetails, &req.args),
            Ok(Command::GetItemDetails {
                item_id: String::new()
            })
        );
    }

    #[test]
    fn test_item_details_requires_item_id() {
        let req = CommandRequest::new("getItemDetails").arg("itemId", 7);
        assert!(Command::from_parts(CommandName::GetItemDetails, &req.args).is_err());

        let req = CommandRequest::new("getItemDetails").arg("itemId", "A1");
        let cmd = Command::from_parts(CommandName::GetItemDetails, &req.args).unwrap();
        assert_eq!(cmd.name(), CommandName::GetItemDetails);
    }

    #[test]
    fn test_session_requirements() {
        assert!(!CommandName::Initialize.requires_session());
        assert!(!CommandName::Disconnect.requires_session());
        assert!(CommandName::MakePayment.requires_session());
        assert!(CommandName::GetInventoryItems.requires_session());
        assert!(CommandName::GetItemDetails.requires_session());
    }

    #[test]
    fn test_outcome_wire_shapes() {
        let ok = Outcome::Success(Payload::Flag(true));
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({ "success": true }));

        let err = Outcome::Error(CommandError::not_initialized());
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "errorKind": "NOT_INITIALIZED",
                "message": "POS connector not initialized"
            })
        );

        let ni = Outcome::NotImplemented("refund".into());
        assert_eq!(
            serde_json::to_value(&ni).unwrap(),
            json!({ "notImplemented": "refund" })
        );
    }

    #[test]
    fn test_request_args_default_to_empty() {
        let req: CommandRequest = serde_json::from_str(r#"{"name":"initialize"}"#).unwrap();
        assert_eq!(req.name, "initialize");
        assert!(req.args.is_empty());
    }
}
