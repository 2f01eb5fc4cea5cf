//! # posbridge Host
//!
//! Runs the bridge behind a JSON-lines command channel on stdio.
//!
//! ## Module Organization
//! ```text
//! posbridge_host/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── channel.rs      ◄─── JSON-lines request/response loop
//! └── error.rs        ◄─── Startup and channel errors
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Host Startup                                   │
//! │                                                                         │
//! │  1. Initialize Logging ───────────────────────────────────────────────► │
//! │     • tracing-subscriber with env filter, written to stderr             │
//! │     • Default: INFO, can be overridden with RUST_LOG                    │
//! │                                                                         │
//! │  2. Load Configuration ───────────────────────────────────────────────► │
//! │     • posbridge.toml, then POSBRIDGE_* environment overrides            │
//! │                                                                         │
//! │  3. Open Inventory Store ─────────────────────────────────────────────► │
//! │     • SQLite with WAL mode, pending migrations applied                  │
//! │                                                                         │
//! │  4. Build Bridge ─────────────────────────────────────────────────────► │
//! │     • Config account, SQLite connector, simulated authorizer            │
//! │                                                                         │
//! │  5. Serve Channel ────────────────────────────────────────────────────► │
//! │     • stdin lines in, stdout lines out, until EOF                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod channel;
pub mod error;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use error::{HostError, HostResult};
use posbridge_engine::{Bridge, BridgeBuilder, BridgeConfig};
use posbridge_store::{Database, DbConfig, SqliteConnectorFactory};

/// Runs the host until stdin closes.
pub async fn run() -> HostResult<()> {
    init_tracing();

    info!("Starting posbridge host");

    let config_path = parse_args(std::env::args().skip(1))?;
    let config = BridgeConfig::load(config_path)?;

    let db = open_database(&config).await?;
    let bridge = build_bridge(&config, &db)?;

    let stats = channel::serve(
        &bridge,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    db.close().await;
    info!(
        requests = stats.requests,
        rejected = stats.rejected,
        "posbridge host stopped"
    );
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr; stdout carries the command channel.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=posbridge=trace` - Show trace for posbridge targets only
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,posbridge=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Accepts `--config <path>` and nothing else.
fn parse_args(mut args: impl Iterator<Item = String>) -> HostResult<Option<PathBuf>> {
    let mut config_path = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| HostError::Usage("--config requires a path".into()))?;
                config_path = Some(PathBuf::from(path));
            }
            other => return Err(HostError::Usage(format!("unexpected argument '{}'", other))),
        }
    }
    Ok(config_path)
}

async fn open_database(config: &BridgeConfig) -> HostResult<Database> {
    let path = config.database_path().ok_or(HostError::NoDataDirectory)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!(?path, "Opening inventory store");

    Ok(Database::new(DbConfig::new(path)).await?)
}

/// Wires the SQLite store into a bridge built from `config`.
pub fn build_bridge(config: &BridgeConfig, db: &Database) -> HostResult<Bridge> {
    Ok(BridgeBuilder::from_config(config)
        .connector_factory(Arc::new(SqliteConnectorFactory::new(db.clone())))
        .inventory_store(Arc::new(db.items()))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args(args(&[])).unwrap(), None);
        assert_eq!(
            parse_args(args(&["--config", "/tmp/pb.toml"])).unwrap(),
            Some(PathBuf::from("/tmp/pb.toml"))
        );
        assert!(matches!(
            parse_args(args(&["--config"])),
            Err(HostError::Usage(_))
        ));
        assert!(matches!(
            parse_args(args(&["--verbose"])),
            Err(HostError::Usage(_))
        ));
    }

    #[tokio::test]
    async fn test_build_bridge_from_config() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut config = BridgeConfig::default();
        config.device.account = Some("merchant@example".into());
        config.payment.delay_ms = 0;

        let bridge = build_bridge(&config, &db).unwrap();
        let outcome = bridge.call("initialize", &Default::default()).await;
        assert!(outcome.is_success());
        assert!(bridge.is_initialized().await);
    }
}
