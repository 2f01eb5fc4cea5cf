//! # SQLite Connector
//!
//! A [`Connector`] backed by the local inventory database, for running the
//! bridge without a POS platform SDK.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SqliteConnector states                                                 │
//! │                                                                         │
//! │   created ──connect()──► open ──disconnect()──► closed                  │
//! │      │       (ping)        │                       │                    │
//! │      │                     │ get_item ✓            │ get_item ✗         │
//! │      └── get_item ✗ ───────┘                       │  Unavailable       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Closing the connector does not close the shared pool; the inventory
//! store keeps working for the next session.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::pool::Database;
use posbridge_core::ports::{Connector, ConnectorFactory};
use posbridge_core::{Account, DeviceContext, Item, SdkError};

/// Connector reading items from the local database.
#[derive(Debug)]
pub struct SqliteConnector {
    db: Database,
    account: Account,
    device_id: String,
    open: bool,
}

impl SqliteConnector {
    pub fn new(db: Database, account: Account, context: &DeviceContext) -> Self {
        SqliteConnector {
            db,
            account,
            device_id: context.device_id.clone(),
            open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn ensure_open(&self) -> Result<(), SdkError> {
        if self.open {
            Ok(())
        } else {
            Err(SdkError::Unavailable("connector is not connected".to_string()))
        }
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    async fn connect(&mut self) -> Result<(), SdkError> {
        self.db.ping().await?;
        self.open = true;

        info!(
            account = %self.account.name,
            device_id = %self.device_id,
            "SQLite connector connected"
        );
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), SdkError> {
        self.ensure_open()?;
        self.open = false;

        info!(account = %self.account.name, "SQLite connector disconnected");
        Ok(())
    }

    async fn get_item(&self, id: &str) -> Result<Option<Item>, SdkError> {
        self.ensure_open()?;

        debug!(item_id = %id, "Fetching item");
        Ok(self.db.items().get_by_id(id).await?)
    }
}

/// Builds [`SqliteConnector`]s sharing one database handle.
#[derive(Debug, Clone)]
pub struct SqliteConnectorFactory {
    db: Database,
}

impl SqliteConnectorFactory {
    pub fn new(db: Database) -> Self {
        SqliteConnectorFactory { db }
    }
}

impl ConnectorFactory for SqliteConnectorFactory {
    fn create(&self, account: &Account, context: &DeviceContext) -> Box<dyn Connector> {
        Box::new(SqliteConnector::new(
            self.db.clone(),
            account.clone(),
            context,
        ))
    }
}
