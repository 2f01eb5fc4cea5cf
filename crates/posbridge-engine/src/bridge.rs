//! # Bridge
//!
//! The assembled engine: dispatcher in front, services behind.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Bridge                                     │
//! │                                                                         │
//! │   dispatch(name, args) ──► Dispatcher ──► BridgeHandler::handle(cmd)    │
//! │                                              │                          │
//! │        ┌─────────────────────────────────────┼──────────────────────┐   │
//! │        ▼                     ▼               ▼                      ▼   │
//! │   initialize /          makePayment    getInventoryItems    getItemDetails
//! │   disconnect                 │               │                      │   │
//! │        │               session read     session read          session read
//! │        ▼                     ▼               ▼                      ▼   │
//! │   ConnectorLifecycle   PaymentProcessor  InventoryService   InventoryService
//! │   (write lock)                           (store)            (connector) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let bridge = BridgeBuilder::from_config(&config)
//!     .connector_factory(Arc::new(SqliteConnectorFactory::new(db.clone())))
//!     .inventory_store(Arc::new(db.items()))
//!     .build()?;
//!
//! let outcome = bridge.call("initialize", &CommandArgs::new()).await;
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::account::ConfigAccountResolver;
use crate::config::BridgeConfig;
use crate::dispatcher::{CommandHandler, Dispatcher, Ticket};
use crate::error::{EngineError, EngineResult};
use crate::inventory::InventoryService;
use crate::lifecycle::{ConnectionState, ConnectorLifecycle, SessionSnapshot};
use crate::notify::TracingNotifier;
use crate::payment::{PaymentProcessor, SimulatedAuthorizer};
use posbridge_core::ports::{
    AccountResolver, ConnectorFactory, InventoryStore, NotificationSink, PaymentAuthorizer,
};
use posbridge_core::{
    Command, CommandArgs, CommandError, CommandRequest, CommandResult, DeviceContext, Outcome,
    Payload,
};

// =============================================================================
// Handler
// =============================================================================

struct BridgeHandler {
    lifecycle: Arc<ConnectorLifecycle>,
    payments: PaymentProcessor,
    inventory: InventoryService,
}

#[async_trait]
impl CommandHandler for BridgeHandler {
    async fn handle(&self, command: Command) -> CommandResult<Payload> {
        // One lease per command; it is held until the command completes.
        let lease = if command.name().requires_session() {
            Some(self.lifecycle.lease().await?)
        } else {
            None
        };

        match (command, lease) {
            (Command::Initialize, _) => self.lifecycle.initialize().await.map(Payload::Flag),
            (Command::Disconnect, _) => self.lifecycle.disconnect().await.map(Payload::Flag),
            (Command::MakePayment { amount }, Some(_lease)) => {
                debug!(amount = amount.cents(), "Processing payment");
                let id = self.payments.process(amount).await?;
                Ok(Payload::Text(id.into_inner()))
            }
            (Command::GetInventoryItems, Some(_lease)) => {
                self.inventory.list_items().await.map(Payload::Items)
            }
            (Command::GetItemDetails { item_id }, Some(lease)) => self
                .inventory
                .item_details(&self.lifecycle, lease, &item_id)
                .await
                .map(Payload::Item),
            (_, None) => Err(CommandError::not_initialized()),
        }
    }
}

// =============================================================================
// Bridge
// =============================================================================

/// Entry point for the command channel.
///
/// Cheap to clone; clones share the session and the worker pool.
#[derive(Debug, Clone)]
pub struct Bridge {
    dispatcher: Dispatcher,
    lifecycle: Arc<ConnectorLifecycle>,
}

impl Bridge {
    pub fn builder(context: DeviceContext) -> BridgeBuilder {
        BridgeBuilder::new(context)
    }

    /// Dispatches a command without blocking the caller.
    pub fn dispatch(&self, name: &str, args: &CommandArgs) -> Ticket {
        self.dispatcher.dispatch(name, args)
    }

    pub fn dispatch_request(&self, request: &CommandRequest) -> Ticket {
        self.dispatch(&request.name, &request.args)
    }

    /// Dispatches a command and hands the outcome to `callback`.
    pub fn dispatch_with<F>(&self, name: &str, args: &CommandArgs, callback: F)
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        self.dispatcher.dispatch_with(name, args, callback)
    }

    /// Dispatches and waits for the outcome.
    pub async fn call(&self, name: &str, args: &CommandArgs) -> Outcome {
        self.dispatch(name, args).outcome().await
    }

    pub async fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized().await
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.lifecycle.state().await
    }

    pub async fn session(&self) -> SessionSnapshot {
        self.lifecycle.snapshot().await
    }

    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    /// Waits for in-flight commands, then closes the connector.
    ///
    /// Returns whether a connector was closed.
    pub async fn shutdown(&self) -> CommandResult<bool> {
        info!(in_flight = self.in_flight(), "Shutting down bridge");
        self.dispatcher.wait_idle().await;
        self.lifecycle.disconnect().await
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Assembles a [`Bridge`] from its collaborators.
///
/// The account resolver defaults to "no account", the authorizer to a
/// [`SimulatedAuthorizer`] with default settings, and the notifier to
/// [`TracingNotifier`]. The connector factory and inventory store are
/// required.
pub struct BridgeBuilder {
    context: DeviceContext,
    resolver: Option<Arc<dyn AccountResolver>>,
    factory: Option<Arc<dyn ConnectorFactory>>,
    store: Option<Arc<dyn InventoryStore>>,
    authorizer: Option<Arc<dyn PaymentAuthorizer>>,
    notifier: Option<Arc<dyn NotificationSink>>,
    currency_symbol: String,
    max_concurrent: usize,
    runtime: Option<Handle>,
}

impl BridgeBuilder {
    pub fn new(context: DeviceContext) -> Self {
        let defaults = BridgeConfig::default();
        BridgeBuilder {
            context,
            resolver: None,
            factory: None,
            store: None,
            authorizer: None,
            notifier: None,
            currency_symbol: defaults.payment.currency_symbol,
            max_concurrent: defaults.workers.max_concurrent,
            runtime: None,
        }
    }

    /// Starts from configuration: device context, configured account,
    /// simulated authorizer, worker count.
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.device_context())
            .account_resolver(Arc::new(ConfigAccountResolver::from_config(config)))
            .authorizer(Arc::new(SimulatedAuthorizer::from_settings(&config.payment)))
            .currency_symbol(config.payment.currency_symbol.clone())
            .max_concurrent(config.workers.max_concurrent)
    }

    pub fn account_resolver(mut self, resolver: Arc<dyn AccountResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn connector_factory(mut self, factory: Arc<dyn ConnectorFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn inventory_store(mut self, store: Arc<dyn InventoryStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn authorizer(mut self, authorizer: Arc<dyn PaymentAuthorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    pub fn max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Runtime the workers run on. Defaults to the current runtime.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn build(self) -> EngineResult<Bridge> {
        let factory = self
            .factory
            .ok_or(EngineError::MissingComponent("connector factory"))?;
        let store = self
            .store
            .ok_or(EngineError::MissingComponent("inventory store"))?;
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| EngineError::NoRuntime)?,
        };
        if self.max_concurrent == 0 {
            return Err(EngineError::InvalidConfig(
                "max_concurrent must be greater than 0".into(),
            ));
        }

        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(ConfigAccountResolver::new(None)));
        let authorizer = self.authorizer.unwrap_or_else(|| {
            Arc::new(SimulatedAuthorizer::from_settings(
                &BridgeConfig::default().payment,
            ))
        });
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier));

        let lifecycle = Arc::new(ConnectorLifecycle::new(resolver, factory, self.context));
        let handler = BridgeHandler {
            lifecycle: Arc::clone(&lifecycle),
            payments: PaymentProcessor::new(authorizer, notifier, self.currency_symbol),
            inventory: InventoryService::new(store),
        };

        info!(
            device_id = %lifecycle.context().device_id,
            max_concurrent = self.max_concurrent,
            "Bridge ready"
        );

        Ok(Bridge {
            dispatcher: Dispatcher::new(Arc::new(handler), self.max_concurrent, runtime),
            lifecycle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::payment::TransactionIdGenerator;
    use crate::testing::{CountingAuthorizer, FakeFactory, FakeStore, PanickingAuthorizer};
    use posbridge_core::{Account, ErrorKind, Item};
    use std::time::Duration;

    fn account() -> Arc<ConfigAccountResolver> {
        Arc::new(ConfigAccountResolver::new(Some(Account::new(
            "merchant@example",
            "posbridge",
        ))))
    }

    fn builder(factory: FakeFactory) -> BridgeBuilder {
        Bridge::builder(DeviceContext::new("device-1", "posbridge-test"))
            .account_resolver(account())
            .connector_factory(Arc::new(factory))
            .inventory_store(Arc::new(FakeStore::new()))
            .authorizer(Arc::new(
                SimulatedAuthorizer::new(
                    Duration::from_secs(3),
                    1.0,
                    TransactionIdGenerator::new("CLV"),
                )
                .with_seed(1),
            ))
    }

    fn args(pairs: &[(&str, serde_json::Value)]) -> CommandArgs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn none() -> CommandArgs {
        CommandArgs::new()
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_commands_require_initialize() {
        let bridge = builder(FakeFactory::new()).build().unwrap();

        let pay = args(&[("amount", 1250.into())]);
        let item = args(&[("itemId", "1".into())]);
        for (name, a) in [
            ("makePayment", &pay),
            ("getInventoryItems", &none()),
            ("getItemDetails", &item),
        ] {
            let outcome = bridge.call(name, a).await;
            assert_eq!(outcome.error_kind(), Some(ErrorKind::NotInitialized), "{}", name);
        }

        assert_eq!(
            bridge.call("initialize", &none()).await,
            Outcome::Success(Payload::Flag(true))
        );
        assert!(bridge.call("getInventoryItems", &none()).await.is_success());
    }

    #[tokio::test]
    async fn test_disconnect_twice() {
        let bridge = builder(FakeFactory::new()).build().unwrap();
        bridge.call("initialize", &none()).await;

        assert_eq!(
            bridge.call("disconnect", &none()).await,
            Outcome::Success(Payload::Flag(true))
        );
        assert_eq!(
            bridge.call("disconnect", &none()).await,
            Outcome::Success(Payload::Flag(false))
        );
        assert!(!bridge.is_initialized().await);
        assert_eq!(bridge.connection_state().await, ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_make_payment_without_amount() {
        let bridge = builder(FakeFactory::new()).build().unwrap();
        bridge.call("initialize", &none()).await;
        let start = tokio::time::Instant::now();

        let ticket = bridge.dispatch("makePayment", &none());
        assert!(ticket.is_ready());
        assert_eq!(bridge.in_flight(), 0);
        assert_eq!(
            ticket.outcome().await.error_kind(),
            Some(ErrorKind::InvalidArgument)
        );
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_payment_approved_and_notified() {
        let notifier = Arc::new(RecordingNotifier::new());
        let bridge = builder(FakeFactory::new())
            .notifier(notifier.clone())
            .build()
            .unwrap();
        bridge.call("initialize", &none()).await;

        let start = tokio::time::Instant::now();
        let outcome = bridge.call("makePayment", &args(&[("amount", 1234.into())])).await;

        let Some(Payload::Text(id)) = outcome.payload() else {
            panic!("expected a transaction id, got {:?}", outcome);
        };
        assert!(id.starts_with("CLV-"));
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert_eq!(notifier.messages(), vec!["Payment approved: $12.34"]);
    }

    #[tokio::test]
    async fn test_item_details() {
        let bridge = builder(FakeFactory::new()).build().unwrap();
        bridge.call("initialize", &none()).await;

        let outcome = bridge
            .call("getItemDetails", &args(&[("itemId", "2".into())]))
            .await;
        let Some(Payload::Item(Item { id, .. })) = outcome.payload() else {
            panic!("expected an item, got {:?}", outcome);
        };
        assert_eq!(id, "2");

        let missing = bridge
            .call("getItemDetails", &args(&[("itemId", "404".into())]))
            .await;
        assert_eq!(missing.error_kind(), Some(ErrorKind::ItemNotFound));
    }

    #[tokio::test]
    async fn test_zero_amount_and_empty_item_id_reach_their_services() {
        let gateway = Arc::new(CountingAuthorizer::new(Duration::ZERO));
        let bridge = builder(FakeFactory::new())
            .authorizer(gateway.clone())
            .build()
            .unwrap();
        bridge.call("initialize", &none()).await;

        let pay = bridge.call("makePayment", &args(&[("amount", 0.into())])).await;
        assert!(pay.is_success(), "{:?}", pay);
        assert_eq!(gateway.calls(), 1);

        let item = bridge
            .call("getItemDetails", &args(&[("itemId", "".into())]))
            .await;
        assert_eq!(item.error_kind(), Some(ErrorKind::ItemNotFound));
        assert!(bridge.is_initialized().await);
    }

    #[tokio::test]
    async fn test_list_items_sorted_and_repeatable() {
        let bridge = builder(FakeFactory::new()).build().unwrap();
        bridge.call("initialize", &none()).await;

        let first = bridge.call("getInventoryItems", &none()).await;
        let second = bridge.call("getInventoryItems", &none()).await;
        assert_eq!(first, second);

        let Some(Payload::Items(items)) = first.payload() else {
            panic!("expected items, got {:?}", first);
        };
        assert_eq!(items.len(), 3);
        assert!(items.windows(2).all(|w| w[0].name <= w[1].name));
    }

    #[tokio::test]
    async fn test_handler_panics_become_outcomes() {
        let bridge = builder(FakeFactory::new().panicking_get())
            .authorizer(Arc::new(PanickingAuthorizer))
            .build()
            .unwrap();
        bridge.call("initialize", &none()).await;

        let pay = bridge.call("makePayment", &args(&[("amount", 100.into())])).await;
        assert_eq!(pay.error_kind(), Some(ErrorKind::PaymentFailed));

        let item = bridge
            .call("getItemDetails", &args(&[("itemId", "1".into())]))
            .await;
        assert_eq!(item.error_kind(), Some(ErrorKind::ItemError));

        // The session survives a panicking handler.
        assert!(bridge.is_initialized().await);
        assert!(bridge.call("getInventoryItems", &none()).await.is_success());
    }

    #[tokio::test]
    async fn test_no_account() {
        let bridge = builder(FakeFactory::new())
            .account_resolver(Arc::new(ConfigAccountResolver::new(None)))
            .build()
            .unwrap();

        let outcome = bridge.call("initialize", &none()).await;
        assert_eq!(outcome.error_kind(), Some(ErrorKind::NoAccount));
        assert!(!bridge.is_initialized().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_waits_for_running_payment() {
        let gateway = Arc::new(CountingAuthorizer::new(Duration::from_secs(3)));
        let bridge = builder(FakeFactory::new())
            .authorizer(gateway.clone())
            .build()
            .unwrap();
        bridge.call("initialize", &none()).await;

        let payment = bridge.dispatch("makePayment", &args(&[("amount", 100.into())]));
        while gateway.calls() == 0 {
            tokio::task::yield_now().await;
        }
        let disconnect = bridge.dispatch("disconnect", &none());

        assert!(payment.outcome().await.is_success());
        assert_eq!(
            disconnect.outcome().await,
            Outcome::Success(Payload::Flag(true))
        );
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drains_then_disconnects() {
        let gateway = Arc::new(CountingAuthorizer::new(Duration::from_secs(3)));
        let bridge = builder(FakeFactory::new())
            .authorizer(gateway.clone())
            .max_concurrent(2)
            .build()
            .unwrap();
        bridge.call("initialize", &none()).await;

        let tickets: Vec<_> = (0..4)
            .map(|_| bridge.dispatch("makePayment", &args(&[("amount", 100.into())])))
            .collect();

        assert_eq!(bridge.shutdown().await, Ok(true));
        assert_eq!(bridge.in_flight(), 0);
        assert_eq!(gateway.calls(), 4);
        assert_eq!(gateway.peak(), 2);
        assert!(!bridge.is_initialized().await);

        for ticket in tickets {
            assert!(ticket.outcome().await.is_success());
        }
    }

    #[test]
    fn test_build_requires_collaborators() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        let err = Bridge::builder(DeviceContext::new("d", "a"))
            .runtime(rt.handle().clone())
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingComponent("connector factory")));

        let err = Bridge::builder(DeviceContext::new("d", "a"))
            .connector_factory(Arc::new(FakeFactory::new()))
            .inventory_store(Arc::new(FakeStore::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::NoRuntime));
    }

    #[test]
    fn test_concurrent_initialize_and_payment_from_threads() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        let factory = FakeFactory::new();
        let stats = factory.stats();
        let bridge = Bridge::builder(DeviceContext::new("device-1", "posbridge-test"))
            .account_resolver(account())
            .connector_factory(Arc::new(factory))
            .inventory_store(Arc::new(FakeStore::new()))
            .authorizer(Arc::new(
                SimulatedAuthorizer::new(Duration::ZERO, 1.0, TransactionIdGenerator::new("CLV"))
                    .with_seed(9),
            ))
            .runtime(rt.handle().clone())
            .build()
            .unwrap();

        let lifecycle_thread = {
            let bridge = bridge.clone();
            std::thread::spawn(move || {
                for i in 0..50 {
                    let name = if i % 3 == 2 { "disconnect" } else { "initialize" };
                    let outcome = bridge.dispatch(name, &CommandArgs::new()).blocking_outcome();
                    assert!(outcome.is_success(), "{} failed: {:?}", name, outcome);
                }
            })
        };

        let payment_thread = {
            let bridge = bridge.clone();
            std::thread::spawn(move || {
                let pay: CommandArgs = [("amount".to_string(), serde_json::json!(100))]
                    .into_iter()
                    .collect();
                for _ in 0..50 {
                    let outcome = bridge.dispatch("makePayment", &pay).blocking_outcome();
                    match outcome.error_kind() {
                        None | Some(ErrorKind::NotInitialized) => {}
                        Some(kind) => panic!("unexpected payment failure: {}", kind),
                    }
                }
            })
        };

        for _ in 0..200 {
            let snapshot = rt.block_on(bridge.session());
            assert!(snapshot.is_consistent(), "{:?}", snapshot);
        }

        lifecycle_thread.join().unwrap();
        payment_thread.join().unwrap();

        let snapshot = rt.block_on(bridge.session());
        assert!(snapshot.is_consistent());
        assert!(stats.live() <= 1);
    }
}
