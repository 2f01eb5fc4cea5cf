//! In-memory collaborators for engine tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use posbridge_core::ports::{
    AccountResolver, Connector, ConnectorFactory, InventoryStore, PaymentAuthorizer,
};
use posbridge_core::{
    Account, Authorization, DeviceContext, Item, ItemQuery, ItemRow, Money, SdkError, SortOrder,
    TransactionId,
};

pub fn item(id: &str, name: &str, price: i64) -> Item {
    Item {
        id: id.into(),
        name: name.into(),
        price,
        code: format!("C-{}", id),
        alternate_name: Some(format!("{} (alt)", name)),
    }
}

pub fn catalog() -> Vec<Item> {
    vec![
        item("3", "Muffin", 325),
        item("1", "Espresso", 250),
        item("2", "Latte", 450),
    ]
}

// =============================================================================
// Resolver
// =============================================================================

pub struct FailingResolver;

#[async_trait]
impl AccountResolver for FailingResolver {
    async fn resolve(&self, _context: &DeviceContext) -> Result<Option<Account>, SdkError> {
        Err(SdkError::Service("account service down".into()))
    }
}

// =============================================================================
// Connector
// =============================================================================

#[derive(Debug, Default)]
pub struct ConnectorStats {
    created: AtomicUsize,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    live: AtomicIsize,
}

impl ConnectorStats {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    /// Connectors created and not yet dropped.
    pub fn live(&self) -> isize {
        self.live.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Behavior {
    fail_connect: bool,
    connect_limit: Option<usize>,
    fail_disconnect: bool,
    fail_get: bool,
    lose_connection_on_get: bool,
    panic_on_get: bool,
}

pub struct FakeConnector {
    items: Arc<HashMap<String, Item>>,
    behavior: Behavior,
    stats: Arc<ConnectorStats>,
}

impl Drop for FakeConnector {
    fn drop(&mut self) {
        self.stats.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&mut self) -> Result<(), SdkError> {
        let exhausted = self
            .behavior
            .connect_limit
            .is_some_and(|limit| self.stats.connects() >= limit);
        if self.behavior.fail_connect || exhausted {
            return Err(SdkError::Binding("service not bound".into()));
        }
        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), SdkError> {
        self.stats.disconnects.fetch_add(1, Ordering::SeqCst);
        if self.behavior.fail_disconnect {
            return Err(SdkError::Client("unbind failed".into()));
        }
        Ok(())
    }

    async fn get_item(&self, id: &str) -> Result<Option<Item>, SdkError> {
        if self.behavior.panic_on_get {
            panic!("connector exploded");
        }
        if self.behavior.fail_get {
            return Err(SdkError::Service("inventory service timeout".into()));
        }
        if self.behavior.lose_connection_on_get {
            return Err(SdkError::Unavailable("service connection dropped".into()));
        }
        Ok(self.items.get(id).cloned())
    }
}

pub struct FakeFactory {
    items: Arc<HashMap<String, Item>>,
    behavior: Behavior,
    stats: Arc<ConnectorStats>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::with_items(catalog())
    }

    pub fn with_items(items: Vec<Item>) -> Self {
        FakeFactory {
            items: Arc::new(items.into_iter().map(|i| (i.id.clone(), i)).collect()),
            behavior: Behavior::default(),
            stats: Arc::new(ConnectorStats::default()),
        }
    }

    pub fn failing_connect(mut self) -> Self {
        self.behavior.fail_connect = true;
        self
    }

    /// Connects succeed `limit` times, then fail.
    pub fn failing_connect_after(mut self, limit: usize) -> Self {
        self.behavior.connect_limit = Some(limit);
        self
    }

    pub fn failing_disconnect(mut self) -> Self {
        self.behavior.fail_disconnect = true;
        self
    }

    pub fn failing_get(mut self) -> Self {
        self.behavior.fail_get = true;
        self
    }

    pub fn unavailable_get(mut self) -> Self {
        self.behavior.lose_connection_on_get = true;
        self
    }

    pub fn panicking_get(mut self) -> Self {
        self.behavior.panic_on_get = true;
        self
    }

    pub fn stats(&self) -> Arc<ConnectorStats> {
        Arc::clone(&self.stats)
    }
}

impl ConnectorFactory for FakeFactory {
    fn create(&self, _account: &Account, _context: &DeviceContext) -> Box<dyn Connector> {
        self.stats.created.fetch_add(1, Ordering::SeqCst);
        self.stats.live.fetch_add(1, Ordering::SeqCst);
        Box::new(FakeConnector {
            items: Arc::clone(&self.items),
            behavior: self.behavior,
            stats: Arc::clone(&self.stats),
        })
    }
}

// =============================================================================
// Inventory Store
// =============================================================================

pub struct FakeStore {
    rows: Vec<ItemRow>,
    fail: bool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::with_rows(
            catalog()
                .into_iter()
                .map(|i| ItemRow {
                    id: Some(i.id),
                    name: Some(i.name),
                    price: Some(i.price),
                    code: Some(i.code),
                    alternate_name: None,
                })
                .collect(),
        )
    }

    pub fn with_rows(rows: Vec<ItemRow>) -> Self {
        FakeStore { rows, fail: false }
    }

    pub fn failing() -> Self {
        FakeStore {
            rows: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl InventoryStore for FakeStore {
    async fn query_items(&self, query: ItemQuery) -> Result<Vec<ItemRow>, SdkError> {
        if self.fail {
            return Err(SdkError::Service("database is locked".into()));
        }
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            let a = a.name.as_deref().unwrap_or("");
            let b = b.name.as_deref().unwrap_or("");
            match query.order {
                SortOrder::Ascending => a.cmp(b),
                SortOrder::Descending => b.cmp(a),
            }
        });
        Ok(rows)
    }
}

// =============================================================================
// Authorizers
// =============================================================================

pub struct PanickingAuthorizer;

#[async_trait]
impl PaymentAuthorizer for PanickingAuthorizer {
    async fn authorize(&self, _amount: Money) -> Result<Authorization, SdkError> {
        panic!("gateway exploded");
    }
}

/// Approves after `delay`, recording the peak number of concurrent calls.
#[derive(Default)]
pub struct CountingAuthorizer {
    delay: Duration,
    active: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl CountingAuthorizer {
    pub fn new(delay: Duration) -> Self {
        CountingAuthorizer {
            delay,
            ..Default::default()
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentAuthorizer for CountingAuthorizer {
    async fn authorize(&self, _amount: Money) -> Result<Authorization, SdkError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(Authorization::Approved(TransactionId::new(format!(
            "CNT-{:06}",
            n
        ))))
    }
}
