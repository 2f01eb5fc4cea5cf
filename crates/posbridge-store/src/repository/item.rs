//! # Item Repository
//!
//! Read-mostly access to the `items` table.
//!
//! ## Projections
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  list_by_name   id, name, price, code            (all rows, by name)    │
//! │  get_by_id      id, name, price, code, alternate_name   (one row)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Listing leaves `alternate_name` out; only single-item lookups carry it.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use posbridge_core::ports::InventoryStore;
use posbridge_core::{Item, ItemQuery, ItemRow, SdkError, SortOrder};

/// Raw `items` row. Every column but the key may be null.
#[derive(Debug, sqlx::FromRow)]
struct ItemRecord {
    id: Option<String>,
    name: Option<String>,
    price: Option<i64>,
    code: Option<String>,
    alternate_name: Option<String>,
}

impl From<ItemRecord> for ItemRow {
    fn from(record: ItemRecord) -> Self {
        ItemRow {
            id: record.id,
            name: record.name,
            price: record.price,
            code: record.code,
            alternate_name: record.alternate_name,
        }
    }
}

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Lists every item ordered by name.
    ///
    /// Rows are returned raw; callers decide what to do with null columns.
    /// Ties on name are broken by id so repeated listings are identical.
    pub async fn list_by_name(&self, order: SortOrder) -> DbResult<Vec<ItemRow>> {
        debug!(order = order.as_sql(), "Listing items");

        let sql = format!(
            "SELECT id, name, price, code, NULL AS alternate_name \
             FROM items ORDER BY name {}, id {}",
            order.as_sql(),
            order.as_sql()
        );

        let records = sqlx::query_as::<_, ItemRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = records.len(), "Listed items");
        Ok(records.into_iter().map(ItemRow::from).collect())
    }

    /// Gets an item by id, including its alternate name.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let record = sqlx::query_as::<_, ItemRecord>(
            r#"
            SELECT id, name, price, code, alternate_name
            FROM items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.and_then(|r| ItemRow::from(r).into_item()))
    }

    /// Inserts an item, replacing every column of an existing row with the
    /// same id.
    pub async fn upsert(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, "Upserting item");

        sqlx::query(
            r#"
            INSERT INTO items (id, name, price, code, alternate_name)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                price = excluded.price,
                code = excluded.code,
                alternate_name = excluded.alternate_name
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.price)
        .bind(&item.code)
        .bind(&item.alternate_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts items (for diagnostics and seeding).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl InventoryStore for ItemRepository {
    async fn query_items(&self, query: ItemQuery) -> Result<Vec<ItemRow>, SdkError> {
        Ok(self.list_by_name(query.order).await?)
    }
}
