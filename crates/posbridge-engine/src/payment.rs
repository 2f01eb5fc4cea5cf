//! # Payment Processing
//!
//! ## Payment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       makePayment(amount)                               │
//! │                                                                         │
//! │  PaymentProcessor::process(amount)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PaymentAuthorizer::authorize(amount)                                   │
//! │       │   SimulatedAuthorizer:                                          │
//! │       │     sleep(delay) ─► draw u ∈ [0, 1) ─► u < success_rate ?       │
//! │       │                                                                 │
//! │       ├── Approved(id) ──► notify "Payment approved: $12.34" ──► id     │
//! │       ├── Declined     ──► PAYMENT_FAILED (no side effect)              │
//! │       └── Err(sdk)     ──► PAYMENT_FAILED (message preserved)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction Ids
//! `{prefix}-{unix millis}-{sequence:06}`, e.g. `CLV-1718000000000-000042`.
//! The sequence is process-wide, so ids stay unique across generators.

use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::PaymentSettings;
use posbridge_core::ports::{NotificationSink, PaymentAuthorizer};
use posbridge_core::{
    Authorization, CommandError, CommandResult, ErrorKind, Money, SdkError, TransactionId,
};

/// Reason reported for simulated declines.
pub const DECLINED_MESSAGE: &str = "Payment declined";

// =============================================================================
// Transaction Ids
// =============================================================================

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Produces unique transaction ids.
#[derive(Debug, Clone)]
pub struct TransactionIdGenerator {
    prefix: String,
}

impl TransactionIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        TransactionIdGenerator {
            prefix: prefix.into(),
        }
    }

    pub fn next_id(&self) -> TransactionId {
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed) + 1;
        TransactionId::new(format!(
            "{}-{}-{:06}",
            self.prefix,
            Utc::now().timestamp_millis(),
            seq
        ))
    }
}

// =============================================================================
// Simulated Authorizer
// =============================================================================

/// Approves a fixed share of payments after a fixed delay.
pub struct SimulatedAuthorizer {
    delay: Duration,
    success_rate: f64,
    ids: TransactionIdGenerator,
    rng: Mutex<StdRng>,
}

impl SimulatedAuthorizer {
    pub fn new(delay: Duration, success_rate: f64, ids: TransactionIdGenerator) -> Self {
        SimulatedAuthorizer {
            delay,
            success_rate,
            ids,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Replaces the random source with a seeded one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn from_settings(settings: &PaymentSettings) -> Self {
        let authorizer = Self::new(
            Duration::from_millis(settings.delay_ms),
            settings.success_rate,
            TransactionIdGenerator::new(settings.id_prefix.clone()),
        );
        match settings.seed {
            Some(seed) => authorizer.with_seed(seed),
            None => authorizer,
        }
    }

    fn draw(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen::<f64>(),
            Err(poisoned) => poisoned.into_inner().gen::<f64>(),
        }
    }
}

#[async_trait]
impl PaymentAuthorizer for SimulatedAuthorizer {
    async fn authorize(&self, _amount: Money) -> Result<Authorization, SdkError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.draw() < self.success_rate {
            Ok(Authorization::Approved(self.ids.next_id()))
        } else {
            Ok(Authorization::Declined {
                reason: DECLINED_MESSAGE.to_string(),
            })
        }
    }
}

// =============================================================================
// Payment Processor
// =============================================================================

pub struct PaymentProcessor {
    authorizer: Arc<dyn PaymentAuthorizer>,
    notifier: Arc<dyn NotificationSink>,
    currency_symbol: String,
}

impl PaymentProcessor {
    pub fn new(
        authorizer: Arc<dyn PaymentAuthorizer>,
        notifier: Arc<dyn NotificationSink>,
        currency_symbol: impl Into<String>,
    ) -> Self {
        PaymentProcessor {
            authorizer,
            notifier,
            currency_symbol: currency_symbol.into(),
        }
    }

    /// Authorizes `amount` and notifies on approval.
    pub async fn process(&self, amount: Money) -> CommandResult<TransactionId> {
        match self.authorizer.authorize(amount).await {
            Ok(Authorization::Approved(id)) => {
                info!(amount = amount.cents(), transaction_id = %id, "Payment approved");
                self.notifier.notify(&format!(
                    "Payment approved: {}",
                    amount.format_with(&self.currency_symbol)
                ));
                Ok(id)
            }
            Ok(Authorization::Declined { reason }) => {
                warn!(amount = amount.cents(), %reason, "Payment declined");
                Err(CommandError::payment_declined(reason))
            }
            Err(e) => Err(CommandError::from_sdk(ErrorKind::PaymentFailed, &e)),
        }
    }
}
