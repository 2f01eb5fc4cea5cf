//! # Repository Module
//!
//! SQL lives here and nowhere else.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Inventory service / connector                                          │
//! │       │                                                                 │
//! │       │  db.items().list_by_name(SortOrder::Ascending)                  │
//! │       ▼                                                                 │
//! │  ItemRepository                                                         │
//! │  ├── list_by_name(&self, order)                                         │
//! │  ├── get_by_id(&self, id)                                               │
//! │  ├── upsert(&self, item)                                                │
//! │  └── count(&self)                                                       │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod item;
