//! Vault configuration: target chain, address display format, receipt polling.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::address::AddressFormat;
use crate::chain::ChainDescriptor;
use crate::error::{Result, VaultError};
use crate::units::MAX_DECIMALS;

const DEFAULT_RECEIPT_POLL_MS: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VaultConfig {
    pub chain: ChainDescriptor,
    pub address_format: AddressFormat,
    pub receipt_poll_interval_ms: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            chain: ChainDescriptor::injective_evm_testnet(),
            address_format: AddressFormat::Hex,
            receipt_poll_interval_ms: DEFAULT_RECEIPT_POLL_MS,
        }
    }
}

/// Reject non-HTTPS endpoints; the extension refuses them for added chains.
fn validate_url(kind: &str, raw: &str) -> Result<()> {
    let url = Url::parse(raw).map_err(|e| VaultError::Config(format!("{kind} URL '{raw}': {e}")))?;
    if url.scheme() != "https" {
        return Err(VaultError::Config(format!(
            "{kind} URL '{raw}' must use https"
        )));
    }
    Ok(())
}

impl VaultConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| VaultError::Config(format!("Failed to parse vault config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read vault config {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid vault config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.chain.chain_name.trim().is_empty() {
            return Err(VaultError::Config("chain name cannot be empty".into()));
        }
        if self.chain.rpc_urls.is_empty() {
            return Err(VaultError::Config("at least one RPC URL is required".into()));
        }
        for url in &self.chain.rpc_urls {
            validate_url("RPC", url)?;
        }
        for url in &self.chain.block_explorer_urls {
            validate_url("Explorer", url)?;
        }
        if self.chain.native_currency.decimals > MAX_DECIMALS {
            return Err(VaultError::Config(format!(
                "currency decimals must be at most {MAX_DECIMALS}"
            )));
        }
        if self.receipt_poll_interval_ms == 0 {
            return Err(VaultError::Config(
                "receipt poll interval must be positive".into(),
            ));
        }
        self.address_format
            .codec()
            .map_err(|e| VaultError::Config(e.to_string()))?;
        Ok(())
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}
