//! # posbridge-store: SQLite Inventory Store
//!
//! Local inventory for the bridge, using SQLite through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        posbridge Data Flow                              │
//! │                                                                         │
//! │  Bridge worker (getInventoryItems / getItemDetails)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                  posbridge-store (THIS CRATE)                   │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │    │
//! │  │   │   Database    │    │ ItemRepository│    │  Migrations  │    │    │
//! │  │   │   (pool.rs)   │◄───│ InventoryStore│    │  (embedded)  │    │    │
//! │  │   └───────▲───────┘    └───────────────┘    └──────────────┘    │    │
//! │  │           │            ┌───────────────┐                        │    │
//! │  │           └────────────│SqliteConnector│ ◄── ConnectorFactory   │    │
//! │  │                        └───────────────┘                        │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │   SQLite Database  (<data dir>/inventory.db)                    │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use posbridge_store::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("inventory.db")).await?;
//! let rows = db.items().list_by_name(SortOrder::Ascending).await?;
//! ```

pub mod connector;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use connector::{SqliteConnector, SqliteConnectorFactory};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::item::ItemRepository;
