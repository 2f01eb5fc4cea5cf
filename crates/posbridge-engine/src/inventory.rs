//! # Inventory Queries
//!
//! Read-only: listing comes from the inventory store, single-item details
//! come through the live connector. A lookup that finds the connection gone
//! invalidates the session.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::lifecycle::{ConnectorLifecycle, SessionLease};
use posbridge_core::ports::InventoryStore;
use posbridge_core::{CommandError, CommandResult, ErrorKind, Item, ItemQuery};

pub struct InventoryService {
    store: Arc<dyn InventoryStore>,
}

impl InventoryService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        InventoryService { store }
    }

    /// Every item, ordered by name ascending.
    ///
    /// Rows without an id are skipped.
    pub async fn list_items(&self) -> CommandResult<Vec<Item>> {
        let rows = self
            .store
            .query_items(ItemQuery::by_name())
            .await
            .map_err(|e| CommandError::from_sdk(ErrorKind::InventoryError, &e))?;

        let total = rows.len();
        let items: Vec<Item> = rows
            .into_iter()
            .filter_map(|row| {
                let name = row.name.clone();
                let item = row.into_item();
                if item.is_none() {
                    warn!(name = ?name, "Skipping inventory row with null id");
                }
                item
            })
            .collect();

        debug!(count = items.len(), skipped = total - items.len(), "Listed items");
        Ok(items)
    }

    /// One item, including its alternate name.
    ///
    /// The lease is released before a lost connection invalidates
    /// `lifecycle`.
    pub async fn item_details(
        &self,
        lifecycle: &ConnectorLifecycle,
        lease: SessionLease<'_>,
        item_id: &str,
    ) -> CommandResult<Item> {
        debug!(item_id = %item_id, "Fetching item details");

        let generation = lease.generation();
        let result = lease.connector().get_item(item_id).await;
        drop(lease);

        match result {
            Ok(Some(item)) => Ok(item),
            Ok(None) => Err(CommandError::item_not_found(item_id)),
            Err(e) => {
                if e.is_connection_lost() {
                    lifecycle.invalidate(generation).await;
                }
                Err(CommandError::from_sdk(ErrorKind::ItemError, &e))
            }
        }
    }
}
