//! Account resolution from configuration.

use async_trait::async_trait;
use tracing::debug;

use crate::config::BridgeConfig;
use posbridge_core::ports::AccountResolver;
use posbridge_core::{Account, DeviceContext, SdkError};

/// Resolves the account configured for this device.
///
/// Stands in for the platform's account manager when running without a
/// POS SDK.
#[derive(Debug, Clone, Default)]
pub struct ConfigAccountResolver {
    account: Option<Account>,
}

impl ConfigAccountResolver {
    pub fn new(account: Option<Account>) -> Self {
        ConfigAccountResolver { account }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.account())
    }
}

#[async_trait]
impl AccountResolver for ConfigAccountResolver {
    async fn resolve(&self, context: &DeviceContext) -> Result<Option<Account>, SdkError> {
        debug!(
            device_id = %context.device_id,
            found = self.account.is_some(),
            "Resolving account"
        );
        Ok(self.account.clone())
    }
}
