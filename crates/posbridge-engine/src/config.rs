//! # Bridge Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     POSBRIDGE_ACCOUNT=merchant@example                                  │
//! │     POSBRIDGE_PAYMENT_DELAY_MS=0                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/posbridge/posbridge.toml (Linux)                          │
//! │     ~/Library/Application Support/dev.posbridge.posbridge/... (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! │     3 s payment delay, 90% approvals, 8 workers, generated device id    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [device]
//! id = "550e8400-e29b-41d4-a716-446655440000"
//! account = "merchant@example"
//!
//! [payment]
//! delay_ms = 3000
//! success_rate = 0.9
//! id_prefix = "CLV"
//! seed = 42
//! currency_symbol = "$"
//!
//! [workers]
//! max_concurrent = 8
//!
//! [store]
//! database_path = "/var/lib/posbridge/inventory.db"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use posbridge_core::{Account, DeviceContext, DEFAULT_TRANSACTION_PREFIX};

/// Application name reported to account resolvers and connectors.
pub const APP_NAME: &str = "posbridge";

// =============================================================================
// Device Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Unique device identifier. Generated (UUID v4) when absent.
    #[serde(default = "default_device_id")]
    pub id: String,

    /// Account bound to this device. `None` means initialize reports
    /// `NO_ACCOUNT`.
    #[serde(default)]
    pub account: Option<String>,

    #[serde(default = "default_account_type")]
    pub account_type: String,
}

fn default_device_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_account_type() -> String {
    "posbridge".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            id: default_device_id(),
            account: None,
            account_type: default_account_type(),
        }
    }
}

// =============================================================================
// Payment Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSettings {
    /// Simulated authorization delay (milliseconds).
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Probability that a simulated authorization is approved.
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,

    /// Prefix of generated transaction ids.
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,

    /// Fixed seed for the approval draw. Entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Symbol used in payment notifications.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_delay_ms() -> u64 {
    3000
}

fn default_success_rate() -> f64 {
    0.9
}

fn default_id_prefix() -> String {
    DEFAULT_TRANSACTION_PREFIX.to_string()
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

impl Default for PaymentSettings {
    fn default() -> Self {
        PaymentSettings {
            delay_ms: default_delay_ms(),
            success_rate: default_success_rate(),
            id_prefix: default_id_prefix(),
            seed: None,
            currency_symbol: default_currency_symbol(),
        }
    }
}

// =============================================================================
// Worker & Store Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSettings {
    /// Maximum number of commands running at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_max_concurrent() -> usize {
    8
}

impl Default for WorkerSettings {
    fn default() -> Self {
        WorkerSettings {
            max_concurrent: default_max_concurrent(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// SQLite inventory file. Defaults to the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

// =============================================================================
// Bridge Configuration
// =============================================================================

/// Complete bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub payment: PaymentSettings,

    #[serde(default)]
    pub workers: WorkerSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`posbridge.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading bridge config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load bridge config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_toml(contents: &str) -> EngineResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.device.id.trim().is_empty() {
            return Err(EngineError::MissingDeviceId);
        }

        let rate = self.payment.success_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(EngineError::InvalidConfig(format!(
                "success_rate must be within [0, 1], got {}",
                rate
            )));
        }

        if self.payment.id_prefix.is_empty() {
            return Err(EngineError::InvalidConfig(
                "id_prefix must not be empty".into(),
            ));
        }

        if self.workers.max_concurrent == 0 {
            return Err(EngineError::InvalidConfig(
                "max_concurrent must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `POSBRIDGE_*` overrides read through `var`.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(account) = var("POSBRIDGE_ACCOUNT") {
            debug!(account = %account, "Overriding account from environment");
            self.device.account = Some(account).filter(|a| !a.is_empty());
        }

        if let Some(id) = var("POSBRIDGE_DEVICE_ID") {
            debug!(device_id = %id, "Overriding device ID from environment");
            self.device.id = id;
        }

        if let Some(delay) = var("POSBRIDGE_PAYMENT_DELAY_MS") {
            match delay.parse::<u64>() {
                Ok(ms) => self.payment.delay_ms = ms,
                Err(_) => warn!(value = %delay, "Ignoring invalid POSBRIDGE_PAYMENT_DELAY_MS"),
            }
        }

        if let Some(rate) = var("POSBRIDGE_SUCCESS_RATE") {
            match rate.parse::<f64>() {
                Ok(r) => self.payment.success_rate = r,
                Err(_) => warn!(value = %rate, "Ignoring invalid POSBRIDGE_SUCCESS_RATE"),
            }
        }

        if let Some(seed) = var("POSBRIDGE_PAYMENT_SEED") {
            match seed.parse::<u64>() {
                Ok(s) => self.payment.seed = Some(s),
                Err(_) => warn!(value = %seed, "Ignoring invalid POSBRIDGE_PAYMENT_SEED"),
            }
        }

        if let Some(workers) = var("POSBRIDGE_MAX_WORKERS") {
            match workers.parse::<usize>() {
                Ok(n) => self.workers.max_concurrent = n,
                Err(_) => warn!(value = %workers, "Ignoring invalid POSBRIDGE_MAX_WORKERS"),
            }
        }

        if let Some(path) = var("POSBRIDGE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.store.database_path = Some(PathBuf::from(path));
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("dev", "posbridge", "posbridge")
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("posbridge.toml"))
    }

    /// Returns the configured database path, or the platform default.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.store.database_path.clone().or_else(|| {
            Self::project_dirs().map(|dirs| dirs.data_dir().join("inventory.db"))
        })
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn device_context(&self) -> DeviceContext {
        DeviceContext::new(self.device.id.clone(), APP_NAME)
    }

    /// The account bound to this device, if any.
    pub fn account(&self) -> Option<Account> {
        self.device
            .account
            .as_ref()
            .map(|name| Account::new(name.clone(), self.device.account_type.clone()))
    }

    pub fn payment_delay(&self) -> Duration {
        Duration::from_millis(self.payment.delay_ms)
    }
}
