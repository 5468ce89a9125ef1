//! Target network configuration and negotiation with the extension.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, VaultError};
use crate::extension::ExtensionClient;
use crate::provider::ProviderError;

pub const INJECTIVE_EVM_TESTNET_CHAIN_ID: u64 = 0x59f;

/// Native currency metadata, as expected by `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Static description of the network the vault runs on. Serializes to the
/// exact parameter object of `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    #[serde(with = "hex_chain_id")]
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
    #[serde(default)]
    pub block_explorer_urls: Vec<String>,
}

impl ChainDescriptor {
    pub fn injective_evm_testnet() -> Self {
        Self {
            chain_id: INJECTIVE_EVM_TESTNET_CHAIN_ID,
            chain_name: "Injective EVM".into(),
            rpc_urls: vec!["https://k8s.testnet.json-rpc.injective.network/".into()],
            native_currency: NativeCurrency {
                name: "Injective".into(),
                symbol: "INJ".into(),
                decimals: 18,
            },
            block_explorer_urls: vec!["https://testnet.blockscout.injective.network".into()],
        }
    }

    /// `0x`-prefixed chain id, the form the extension exchanges.
    pub fn hex_chain_id(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    pub fn decimals(&self) -> u8 {
        self.native_currency.decimals
    }

    pub fn symbol(&self) -> &str {
        &self.native_currency.symbol
    }

    /// Transaction detail page on the first configured explorer.
    pub fn transaction_url(&self, hash: &str) -> Option<String> {
        let base = self.block_explorer_urls.first()?;
        Some(format!("{}/tx/{hash}", base.trim_end_matches('/')))
    }
}

impl Default for ChainDescriptor {
    fn default() -> Self {
        Self::injective_evm_testnet()
    }
}

mod hex_chain_id {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("{id:#x}"))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Text(String),
    }

    /// Accepts `"0x59f"`, `"1439"` or `1439`.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        match Repr::deserialize(d)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(s) => crate::extension::parse_quantity(&s)
                .or_else(|| s.parse().ok())
                .ok_or_else(|| de::Error::custom(format!("invalid chain id '{s}'"))),
        }
    }
}

/// How the extension ended up on the target network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkSwitch {
    /// Already on the target; nothing was requested.
    AlreadyActive,
    Switched,
    /// The extension did not know the network and added it.
    Added,
}

/// Guarantees the extension's active network is the configured chain.
#[derive(Debug, Clone)]
pub struct ChainNegotiator {
    chain: ChainDescriptor,
}

impl ChainNegotiator {
    pub fn new(chain: ChainDescriptor) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &ChainDescriptor {
        &self.chain
    }

    /// Switch (or add) the target network unless it is already active.
    /// Suspends while the user answers the extension's prompt.
    pub async fn ensure(&self, client: &ExtensionClient) -> Result<NetworkSwitch> {
        let current = client.chain_id().await?;
        if current == self.chain.chain_id {
            debug!(chain_id = current, "extension already on target network");
            return Ok(NetworkSwitch::AlreadyActive);
        }

        info!(
            from = current,
            to = self.chain.chain_id,
            "requesting network switch"
        );
        match client.switch_chain(self.chain.chain_id).await {
            Ok(()) => Ok(NetworkSwitch::Switched),
            Err(e) if e.is_unrecognized_chain() => {
                info!(
                    chain_id = self.chain.chain_id,
                    chain_name = %self.chain.chain_name,
                    "network unknown to extension, adding it"
                );
                client
                    .add_chain(&self.chain)
                    .await
                    .map_err(negotiation_error)?;
                Ok(NetworkSwitch::Added)
            }
            Err(e) => Err(negotiation_error(e)),
        }
    }
}

fn negotiation_error(err: ProviderError) -> VaultError {
    if err.is_user_rejection() {
        VaultError::UserRejected(err.message)
    } else {
        VaultError::ChainSwitchFailed(err.to_string())
    }
}
