//! # Collaborator Ports
//!
//! Traits for everything the bridge consumes from the POS platform and
//! everything it reports back out to the UI shell.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bridge Boundaries                                │
//! │                                                                         │
//! │   consumed ◄──────────────────────────┐                                 │
//! │   ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │   │ AccountResolver  │  │ ConnectorFactory │  │ InventoryStore       │  │
//! │   │ resolve(ctx)     │  │ create(acct,ctx) │  │ query_items(query)   │  │
//! │   └──────────────────┘  │   └► Connector   │  └──────────────────────┘  │
//! │                         │      connect()   │  ┌──────────────────────┐  │
//! │                         │      disconnect()│  │ PaymentAuthorizer    │  │
//! │                         │      get_item()  │  │ authorize(amount)    │  │
//! │                         └──────────────────┘  └──────────────────────┘  │
//! │                                                                         │
//! │   exposed ──────────────────────────────►                               │
//! │   ┌──────────────────┐                                                  │
//! │   │ NotificationSink │  fire-and-forget user notices                    │
//! │   └──────────────────┘                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;

use crate::error::SdkError;
use crate::money::Money;
use crate::types::{Account, Authorization, DeviceContext, Item, ItemQuery, ItemRow};

/// Resolves the account bound to this device.
#[async_trait]
pub trait AccountResolver: Send + Sync {
    /// Returns `Ok(None)` when the device has no bound account.
    async fn resolve(&self, context: &DeviceContext) -> Result<Option<Account>, SdkError>;
}

/// Live session with the POS backend.
///
/// At most one instance exists at a time; the lifecycle manager owns it.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens the connection.
    async fn connect(&mut self) -> Result<(), SdkError>;

    /// Closes the connection.
    async fn disconnect(&mut self) -> Result<(), SdkError>;

    /// Fetches one item, including its alternate name.
    async fn get_item(&self, id: &str) -> Result<Option<Item>, SdkError>;
}

/// Builds connectors bound to an account and device context.
pub trait ConnectorFactory: Send + Sync {
    fn create(&self, account: &Account, context: &DeviceContext) -> Box<dyn Connector>;
}

/// Backing inventory store.
///
/// Implementations must return every matching row (fully drained), in the
/// requested order.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn query_items(&self, query: ItemQuery) -> Result<Vec<ItemRow>, SdkError>;
}

/// Authorization step of a payment.
///
/// A declined payment is `Ok(Authorization::Declined { .. })`; `Err` is
/// reserved for the gateway itself failing.
#[async_trait]
pub trait PaymentAuthorizer: Send + Sync {
    async fn authorize(&self, amount: Money) -> Result<Authorization, SdkError>;
}

/// User-visible notifications (toasts in the UI shell).
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str);
}
