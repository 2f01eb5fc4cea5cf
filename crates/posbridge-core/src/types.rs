//! # Domain Types
//!
//! Types exchanged between the bridge and its SDK collaborators.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    Account      │   │      Item       │   │    ItemRow      │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  name           │   │  id             │   │  id?            │        │
//! │  │  account_type   │   │  name           │   │  name?          │        │
//! │  └─────────────────┘   │  price (cents)  │   │  price?         │        │
//! │                        │  code           │   │  code?          │        │
//! │  ┌─────────────────┐   │  alternate_name?│   │  alternate_name?│        │
//! │  │ DeviceContext   │   └─────────────────┘   └─────────────────┘        │
//! │  │  device_id      │            ▲                     │                 │
//! │  │  app_name       │            └──── into_item() ────┘                 │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Account & Device Context
// =============================================================================

/// Identity bound to this device by the POS platform.
///
/// Obtained once per connection session and held by the lifecycle manager
/// until the next disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account name (e.g. merchant login).
    pub name: String,

    /// Platform account type.
    pub account_type: String,
}

impl Account {
    pub fn new(name: impl Into<String>, account_type: impl Into<String>) -> Self {
        Account {
            name: name.into(),
            account_type: account_type.into(),
        }
    }
}

/// The process-level context connectors and resolvers are bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceContext {
    /// Stable identifier of this device.
    pub device_id: String,

    /// Name of the host application.
    pub app_name: String,
}

impl DeviceContext {
    pub fn new(device_id: impl Into<String>, app_name: impl Into<String>) -> Self {
        DeviceContext {
            device_id: device_id.into(),
            app_name: app_name.into(),
        }
    }
}

// =============================================================================
// Item
// =============================================================================

/// An inventory item as returned to the command channel.
///
/// Read-only from the bridge's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Item {
    pub id: String,
    pub name: String,

    /// Price in minor currency units.
    pub price: i64,

    pub code: String,

    /// Only populated by single-item lookups.
    pub alternate_name: Option<String>,
}

/// A raw row from the backing inventory store. Every column is nullable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemRow {
    pub id: Option<String>,
    pub name: Option<String>,
    pub price: Option<i64>,
    pub code: Option<String>,
    pub alternate_name: Option<String>,
}

impl ItemRow {
    /// Converts the row into an [`Item`].
    ///
    /// Returns `None` when the id column is null. Null name and code become
    /// empty strings and a null price becomes 0.
    pub fn into_item(self) -> Option<Item> {
        let id = self.id?;
        Some(Item {
            id,
            name: self.name.unwrap_or_default(),
            price: self.price.unwrap_or(0),
            code: self.code.unwrap_or_default(),
            alternate_name: self.alternate_name,
        })
    }
}

// =============================================================================
// Inventory Query
// =============================================================================

/// Sort direction on the name column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// SQL keyword for this order.
    pub const fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// Query against the backing inventory store.
///
/// The projection is fixed (id, name, price, code); only the order on the
/// name column varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemQuery {
    pub order: SortOrder,
}

impl ItemQuery {
    /// All items, ordered by name ascending.
    pub const fn by_name() -> Self {
        ItemQuery {
            order: SortOrder::Ascending,
        }
    }
}

// =============================================================================
// Payments
// =============================================================================

/// Identifier of an approved transaction, e.g. `CLV-1718000000000-000042`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        TransactionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a payment authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Approved(TransactionId),
    Declined { reason: String },
}

impl Authorization {
    pub fn is_approved(&self) -> bool {
        matches!(self, Authorization::Approved(_))
    }
}
