//! # posbridge-engine: Command Engine for the POS Bridge
//!
//! Accepts `{name, args}` requests from a host, runs them against the POS
//! connector on a bounded worker pool, and answers each with exactly one
//! outcome.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Engine Architecture                            │
//! │                                                                         │
//! │   host channel ──► Bridge::dispatch(name, args) ──► Ticket / callback   │
//! │                              │                                          │
//! │                              ▼                                          │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │                  Dispatcher (bounded worker pool)                │   │
//! │  │                                                                  │   │
//! │  │  Validates on the caller, runs on workers, catches panics        │   │
//! │  └────────────────────────────┬─────────────────────────────────────┘   │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                   │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐     │
//! │  │ Connector      │  │ Payment        │  │ Inventory              │     │
//! │  │ Lifecycle      │  │ Processor      │  │ Service                │     │
//! │  │                │  │                │  │                        │     │
//! │  │ One connector, │  │ Simulated      │  │ Store listing,         │     │
//! │  │ RwLock'd       │  │ authorizer,    │  │ connector lookups      │     │
//! │  │ session        │  │ notifications  │  │                        │     │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`bridge`] - `Bridge` and `BridgeBuilder`, the assembled engine
//! - [`dispatcher`] - Worker pool, tickets, panic containment
//! - [`lifecycle`] - Connector session and state machine
//! - [`payment`] - Simulated authorizer and transaction ids
//! - [`inventory`] - Item listing and details
//! - [`account`] - Config-backed account resolution
//! - [`notify`] - Notification sinks
//! - [`config`] - TOML configuration with environment overrides
//! - [`error`] - Engine setup errors
//!
//! ## Usage
//!
//! ```rust,ignore
//! use posbridge_engine::{BridgeBuilder, BridgeConfig};
//!
//! let config = BridgeConfig::load_or_default(None);
//! let bridge = BridgeBuilder::from_config(&config)
//!     .connector_factory(factory)
//!     .inventory_store(store)
//!     .build()?;
//!
//! let outcome = bridge.call("initialize", &CommandArgs::new()).await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod account;
pub mod bridge;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod inventory;
pub mod lifecycle;
pub mod notify;
pub mod payment;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use account::ConfigAccountResolver;
pub use bridge::{Bridge, BridgeBuilder};
pub use config::{BridgeConfig, DeviceConfig, PaymentSettings, StoreSettings, WorkerSettings};
pub use dispatcher::{CommandHandler, Dispatcher, Ticket};
pub use error::{EngineError, EngineResult};
pub use inventory::InventoryService;
pub use lifecycle::{ConnectionState, ConnectorLifecycle, SessionLease, SessionSnapshot};
pub use notify::{NoOpNotifier, RecordingNotifier, TracingNotifier};
pub use payment::{PaymentProcessor, SimulatedAuthorizer, TransactionIdGenerator};
