//! # Connector Lifecycle
//!
//! Owns the single POS connector and the `initialized` flag.
//!
//! ## Session Lock
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      RwLock<Session>                                    │
//! │                                                                         │
//! │   ┌───────────────────────────────────────────────┐                     │
//! │   │ Session                                       │                     │
//! │   │   connector:   Option<Box<dyn Connector>>     │  change together,   │
//! │   │   initialized: bool                           │  under the write    │
//! │   │   account:     Option<Account>                │  lock only          │
//! │   │   state:       ConnectionState                │                     │
//! │   └───────────────────────────────────────────────┘                     │
//! │                                                                         │
//! │   write lock  ◄── initialize(), disconnect()                            │
//! │   read lock   ◄── makePayment, getInventoryItems, getItemDetails        │
//! │                   (held for the whole operation)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Machine
//! ```text
//!   Absent ──initialize──► Connecting ──ok──► Connected
//!     ▲                        │                  │
//!     └──────── failure ───────┘                  │ disconnect
//!                                                 ▼
//!                    initialize ◄────────── Disconnected
//! ```
//!
//! Initializing while connected tears the old connector down first.

use std::fmt;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, error, info, warn};

use posbridge_core::ports::{AccountResolver, Connector, ConnectorFactory};
use posbridge_core::{Account, CommandError, CommandResult, DeviceContext, ErrorKind};

/// Connection state, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connector has been created yet.
    #[default]
    Absent,
    Connecting,
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Absent => write!(f, "absent"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Disconnected => write!(f, "disconnected"),
        }
    }
}

#[derive(Default)]
struct Session {
    connector: Option<Box<dyn Connector>>,
    initialized: bool,
    account: Option<Account>,
    state: ConnectionState,
    generation: u64,
}

impl Session {
    fn clear(&mut self) -> Option<Box<dyn Connector>> {
        self.initialized = false;
        self.account = None;
        self.connector.take()
    }
}

/// Point-in-time view of the session, read under one lock acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub initialized: bool,
    pub has_connector: bool,
    pub state: ConnectionState,
    pub account: Option<Account>,
}

impl SessionSnapshot {
    /// The flag and the connector reference agree.
    pub fn is_consistent(&self) -> bool {
        self.initialized == self.has_connector
    }
}

/// Shared hold on an initialized session.
pub struct SessionLease<'a> {
    generation: u64,
    connector: RwLockReadGuard<'a, dyn Connector>,
}

impl SessionLease<'_> {
    /// Identifies the session for a later
    /// [`invalidate`](ConnectorLifecycle::invalidate).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn connector(&self) -> &dyn Connector {
        &*self.connector
    }
}

/// Manages the connector's lifecycle.
pub struct ConnectorLifecycle {
    resolver: Arc<dyn AccountResolver>,
    factory: Arc<dyn ConnectorFactory>,
    context: DeviceContext,
    session: RwLock<Session>,
}

impl ConnectorLifecycle {
    pub fn new(
        resolver: Arc<dyn AccountResolver>,
        factory: Arc<dyn ConnectorFactory>,
        context: DeviceContext,
    ) -> Self {
        ConnectorLifecycle {
            resolver,
            factory,
            context,
            session: RwLock::new(Session::default()),
        }
    }

    pub fn context(&self) -> &DeviceContext {
        &self.context
    }

    /// Resolves the account, then creates and opens a connector.
    ///
    /// ## Returns
    /// * `Ok(true)` - connected
    /// * `Err(NO_ACCOUNT)` - no account bound to this device
    /// * `Err(INIT_ERROR)` - resolution or connect failed
    pub async fn initialize(&self) -> CommandResult<bool> {
        let mut session = self.session.write().await;

        let had_connector = if let Some(mut prior) = session.clear() {
            info!("Reinitializing: closing existing connector");
            if let Err(e) = prior.disconnect().await {
                warn!(error = %e, "Failed to close existing connector; discarding it");
            }
            true
        } else {
            false
        };

        let previous = if had_connector {
            ConnectionState::Disconnected
        } else {
            session.state
        };
        session.state = ConnectionState::Connecting;
        debug!(device_id = %self.context.device_id, "Connecting");

        match self.connect().await {
            Ok((account, connector)) => {
                info!(account = %account.name, "POS connector initialized");
                session.connector = Some(connector);
                session.account = Some(account);
                session.initialized = true;
                session.state = ConnectionState::Connected;
                session.generation += 1;
                Ok(true)
            }
            Err(err) => {
                error!(error = %err, "POS connector initialization failed");
                session.state = previous;
                Err(err)
            }
        }
    }

    async fn connect(&self) -> CommandResult<(Account, Box<dyn Connector>)> {
        let account = self
            .resolver
            .resolve(&self.context)
            .await
            .map_err(|e| CommandError::from_sdk(ErrorKind::InitError, &e))?
            .ok_or_else(CommandError::no_account)?;

        let mut connector = self.factory.create(&account, &self.context);
        connector
            .connect()
            .await
            .map_err(|e| CommandError::from_sdk(ErrorKind::InitError, &e))?;

        Ok((account, connector))
    }

    /// Closes the connector.
    ///
    /// ## Returns
    /// * `Ok(true)` - a connector was closed
    /// * `Ok(false)` - nothing to close
    /// * `Err(DISCONNECT_ERROR)` - close failed; the session is cleared anyway
    pub async fn disconnect(&self) -> CommandResult<bool> {
        let mut session = self.session.write().await;

        let Some(mut connector) = session.clear() else {
            debug!("Disconnect requested with no connector");
            return Ok(false);
        };
        session.state = ConnectionState::Disconnected;

        match connector.disconnect().await {
            Ok(()) => {
                info!("POS connector disconnected");
                Ok(true)
            }
            Err(e) => {
                error!(error = %e, "POS connector failed to disconnect");
                Err(CommandError::from_sdk(ErrorKind::DisconnectError, &e))
            }
        }
    }

    /// Read access to the live connector.
    ///
    /// The lease holds the session read lock, so the connector cannot be
    /// torn down while it is alive.
    pub async fn lease(&self) -> CommandResult<SessionLease<'_>> {
        let session = self.session.read().await;
        let generation = session.generation;
        let connector = RwLockReadGuard::try_map(session, |s| {
            if s.initialized {
                s.connector.as_deref()
            } else {
                None
            }
        })
        .map_err(|_| CommandError::not_initialized())?;
        Ok(SessionLease {
            generation,
            connector,
        })
    }

    /// Drops a connector that reported its connection lost.
    ///
    /// No-op unless `generation` is still the live session, so a session
    /// re-established in the meantime is left alone. Returns whether the
    /// session was cleared.
    pub async fn invalidate(&self, generation: u64) -> bool {
        let mut session = self.session.write().await;
        if session.generation != generation || session.connector.is_none() {
            return false;
        }

        drop(session.clear());
        session.state = ConnectionState::Disconnected;
        warn!(generation, "POS connection lost; session invalidated");
        true
    }

    pub async fn is_initialized(&self) -> bool {
        self.session.read().await.initialized
    }

    pub async fn state(&self) -> ConnectionState {
        self.session.read().await.state
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.read().await;
        SessionSnapshot {
            initialized: session.initialized,
            has_connector: session.connector.is_some(),
            state: session.state,
            account: session.account.clone(),
        }
    }
}

impl fmt::Debug for ConnectorLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorLifecycle")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::ConfigAccountResolver;
    use crate::testing::{FailingResolver, FakeFactory};

    fn lifecycle(factory: FakeFactory) -> ConnectorLifecycle {
        ConnectorLifecycle::new(
            Arc::new(ConfigAccountResolver::new(Some(Account::new(
                "merchant@example",
                "posbridge",
            )))),
            Arc::new(factory),
            DeviceContext::new("device-1", "posbridge-test"),
        )
    }

    #[tokio::test]
    async fn test_initialize_then_disconnect() {
        let factory = FakeFactory::new();
        let stats = factory.stats();
        let lc = lifecycle(factory);

        assert_eq!(lc.state().await, ConnectionState::Absent);
        assert_eq!(lc.initialize().await, Ok(true));
        assert!(lc.is_initialized().await);
        assert_eq!(lc.state().await, ConnectionState::Connected);
        assert_eq!(
            lc.snapshot().await.account.map(|a| a.name),
            Some("merchant@example".to_string())
        );

        assert_eq!(lc.disconnect().await, Ok(true));
        assert!(!lc.is_initialized().await);
        assert_eq!(lc.state().await, ConnectionState::Disconnected);
        assert_eq!(stats.connects(), 1);
        assert_eq!(stats.disconnects(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_twice() {
        let lc = lifecycle(FakeFactory::new());
        lc.initialize().await.unwrap();

        assert_eq!(lc.disconnect().await, Ok(true));
        assert_eq!(lc.disconnect().await, Ok(false));
        assert!(!lc.is_initialized().await);
    }

    #[tokio::test]
    async fn test_disconnect_without_connector_is_noop() {
        let lc = lifecycle(FakeFactory::new());
        assert_eq!(lc.disconnect().await, Ok(false));
        assert_eq!(lc.state().await, ConnectionState::Absent);
    }

    #[tokio::test]
    async fn test_no_account() {
        let lc = ConnectorLifecycle::new(
            Arc::new(ConfigAccountResolver::new(None)),
            Arc::new(FakeFactory::new()),
            DeviceContext::new("device-1", "posbridge-test"),
        );

        let err = lc.initialize().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoAccount);
        assert!(!lc.is_initialized().await);
        assert_eq!(lc.state().await, ConnectionState::Absent);
    }

    #[tokio::test]
    async fn test_resolver_failure_is_init_error() {
        let lc = ConnectorLifecycle::new(
            Arc::new(FailingResolver),
            Arc::new(FakeFactory::new()),
            DeviceContext::new("device-1", "posbridge-test"),
        );

        let err = lc.initialize().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InitError);
        assert!(err.message.contains("account service down"));
    }

    #[tokio::test]
    async fn test_connect_failure_leaves_uninitialized() {
        let lc = lifecycle(FakeFactory::new().failing_connect());

        let err = lc.initialize().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InitError);

        let snap = lc.snapshot().await;
        assert!(!snap.initialized);
        assert!(!snap.has_connector);
        assert!(lc.lease().await.is_err());
    }

    #[tokio::test]
    async fn test_reinitialize_replaces_connector() {
        let factory = FakeFactory::new();
        let stats = factory.stats();
        let lc = lifecycle(factory);

        lc.initialize().await.unwrap();
        lc.initialize().await.unwrap();

        assert_eq!(stats.created(), 2);
        assert_eq!(stats.disconnects(), 1);
        assert_eq!(stats.live(), 1);
        assert!(lc.snapshot().await.is_consistent());
    }

    #[tokio::test]
    async fn test_failed_reinitialize_leaves_no_session() {
        let factory = FakeFactory::new().failing_connect_after(1);
        let stats = factory.stats();
        let lc = lifecycle(factory);

        assert_eq!(lc.initialize().await, Ok(true));

        let err = lc.initialize().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InitError);

        let snap = lc.snapshot().await;
        assert!(!snap.initialized);
        assert!(!snap.has_connector);
        assert!(snap.account.is_none());
        assert_eq!(snap.state, ConnectionState::Disconnected);
        assert_eq!(stats.created(), 2);
        assert_eq!(stats.disconnects(), 1);
        assert_eq!(stats.live(), 0);
        assert!(lc.lease().await.is_err());
    }

    #[tokio::test]
    async fn test_reinitialize_survives_failed_teardown() {
        let factory = FakeFactory::new().failing_disconnect();
        let stats = factory.stats();
        let lc = lifecycle(factory);

        lc.initialize().await.unwrap();
        assert_eq!(lc.initialize().await, Ok(true));
        assert_eq!(stats.created(), 2);
        assert!(lc.is_initialized().await);
    }

    #[tokio::test]
    async fn test_failed_disconnect_still_clears_session() {
        let lc = lifecycle(FakeFactory::new().failing_disconnect());
        lc.initialize().await.unwrap();

        let err = lc.disconnect().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::DisconnectError);

        let snap = lc.snapshot().await;
        assert!(!snap.initialized);
        assert!(!snap.has_connector);
        assert_eq!(lc.disconnect().await, Ok(false));
    }

    #[tokio::test]
    async fn test_connector_guard_requires_session() {
        let lc = lifecycle(FakeFactory::new());
        let err = lc.lease().await.err().unwrap();
        assert_eq!(err.kind, ErrorKind::NotInitialized);

        lc.initialize().await.unwrap();
        let lease = lc.lease().await.unwrap();
        assert!(lease.connector().get_item("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_only_current_generation() {
        let factory = FakeFactory::new();
        let stats = factory.stats();
        let lc = lifecycle(factory);

        lc.initialize().await.unwrap();
        let stale = lc.lease().await.unwrap().generation();

        lc.initialize().await.unwrap();
        assert!(!lc.invalidate(stale).await);
        assert!(lc.is_initialized().await);

        let current = lc.lease().await.unwrap().generation();
        assert!(lc.invalidate(current).await);

        let snap = lc.snapshot().await;
        assert!(!snap.initialized);
        assert!(snap.is_consistent());
        assert_eq!(snap.state, ConnectionState::Disconnected);
        assert_eq!(stats.live(), 0);
        assert!(!lc.invalidate(current).await);
    }
}
