//! Account access, network negotiation and balance lookup.

use std::sync::Arc;

use alloy_primitives::Address;
use tracing::{debug, info};

use crate::address::AddressCodec;
use crate::chain::{ChainDescriptor, ChainNegotiator};
use crate::error::{Result, VaultError};
use crate::extension::ExtensionClient;
use crate::provider::ProviderError;
use crate::units::Balance;

/// A connected account. Address and balance are only ever produced together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Signer address used for RPC calls.
    pub address: Address,
    /// Address as shown to the user, after the configured encoding.
    pub display_address: String,
    pub balance: Balance,
}

pub struct WalletConnector {
    client: Option<ExtensionClient>,
    negotiator: ChainNegotiator,
    codec: Arc<dyn AddressCodec>,
}

fn account_error(err: ProviderError) -> VaultError {
    if err.is_user_rejection() {
        VaultError::UserRejected(err.message)
    } else {
        VaultError::Provider(err)
    }
}

impl WalletConnector {
    pub fn new(
        client: Option<ExtensionClient>,
        chain: ChainDescriptor,
        codec: Arc<dyn AddressCodec>,
    ) -> Self {
        Self {
            client,
            negotiator: ChainNegotiator::new(chain),
            codec,
        }
    }

    pub fn chain(&self) -> &ChainDescriptor {
        self.negotiator.chain()
    }

    pub fn codec(&self) -> &dyn AddressCodec {
        self.codec.as_ref()
    }

    pub fn client(&self) -> Result<&ExtensionClient> {
        self.client.as_ref().ok_or(VaultError::ExtensionMissing)
    }

    /// Request access, move the extension to the target chain, then resolve
    /// the signer and its balance. Fails as a whole; nothing partial escapes.
    pub async fn connect(&self) -> Result<Account> {
        let client = self.client()?;

        debug!("requesting account access");
        let authorized = client.request_accounts().await.map_err(account_error)?;
        if authorized.is_empty() {
            return Err(VaultError::UserRejected(
                "no account was authorized".into(),
            ));
        }

        self.negotiator.ensure(client).await?;

        let address = self.signer_address(client).await?;
        let display_address = self
            .codec
            .encode(&address)
            .map_err(|e| VaultError::Config(e.to_string()))?;
        let balance = self.fetch_balance(address).await?;

        info!(address = %display_address, %balance, "wallet connected");
        Ok(Account {
            address,
            display_address,
            balance,
        })
    }

    async fn signer_address(&self, client: &ExtensionClient) -> Result<Address> {
        let accounts = client.accounts().await.map_err(account_error)?;
        accounts.first().copied().ok_or_else(|| {
            VaultError::UserRejected("extension exposed no signer account".into())
        })
    }

    /// Current native balance of `address`, converted with the chain's
    /// currency exponent.
    pub async fn fetch_balance(&self, address: Address) -> Result<Balance> {
        let client = self.client()?;
        let raw = client.balance(address).await?;
        debug!(%address, %raw, "balance fetched");
        Ok(Balance::new(raw, self.chain().decimals()))
    }
}
