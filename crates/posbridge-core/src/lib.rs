//! # posbridge-core: Pure Types for the POS Bridge
//!
//! Everything the bridge says and hears, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        posbridge Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    UI Shell (out of scope)                      │    │
//! │  │    invoke('makePayment', { amount }) ──► { success: "CLV-…" }   │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │ command channel                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                    posbridge-engine                             │    │
//! │  │    Dispatcher ─► Lifecycle ─► Payments / Inventory              │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ posbridge-core (THIS CRATE) ★                   │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐    │    │
//! │  │   │  command  │  │   types   │  │   money   │  │   ports   │    │    │
//! │  │   │  Command  │  │   Item    │  │   Money   │  │ Connector │    │    │
//! │  │   │  Outcome  │  │  Account  │  │           │  │ Resolver  │    │    │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘    │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO TASKS                  │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`command`] - Command names, validated commands, outcomes
//! - [`types`] - Account, device context, items, transaction ids
//! - [`money`] - Integer minor-unit amounts
//! - [`error`] - Error taxonomy
//! - [`validation`] - Argument extraction rules
//! - [`ports`] - Traits for the SDK collaborators and notification sink

pub mod command;
pub mod error;
pub mod money;
pub mod ports;
pub mod types;
pub mod validation;

pub use command::{Command, CommandArgs, CommandName, CommandRequest, Outcome, Payload};
pub use error::{CommandError, CommandResult, ErrorKind, SdkError, ValidationError};
pub use money::Money;
pub use types::*;

/// Prefix of simulated transaction ids.
pub const DEFAULT_TRANSACTION_PREFIX: &str = "CLV";
