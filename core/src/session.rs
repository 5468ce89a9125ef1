use std::sync::Arc;

use tracing::warn;

use crate::chain::ChainDescriptor;
use crate::config::VaultConfig;
use crate::connector::{Account, WalletConnector};
use crate::display::truncate_address;
use crate::error::{Result, VaultError};
use crate::extension::ExtensionClient;
use crate::provider::Eip1193Provider;
use crate::units::Balance;

/// Whether a wallet is connected. The address is non-empty exactly when
/// connected, since it only exists inside `Connected`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected(Account),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    pub fn account(&self) -> Option<&Account> {
        match self {
            Self::Connected(account) => Some(account),
            Self::Disconnected => None,
        }
    }

    /// Display address, empty while disconnected.
    pub fn address(&self) -> &str {
        self.account()
            .map(|a| a.display_address.as_str())
            .unwrap_or("")
    }

    pub fn truncated_address(&self) -> String {
        truncate_address(self.address())
    }

    pub fn balance(&self) -> Option<Balance> {
        self.account().map(|a| a.balance)
    }
}

/// Top-level controller owned by the presentation layer.
pub struct SessionController {
    connector: WalletConnector,
    config: VaultConfig,
    state: ConnectionState,
}

impl SessionController {
    /// `provider` is `None` when no extension was injected; `connect` then
    /// reports `ExtensionMissing`.
    pub fn new(provider: Option<Arc<dyn Eip1193Provider>>, config: VaultConfig) -> Result<Self> {
        config.validate()?;
        let codec = config
            .address_format
            .codec()
            .map_err(|e| VaultError::Config(e.to_string()))?;
        let connector = WalletConnector::new(
            provider.map(ExtensionClient::new),
            config.chain.clone(),
            codec,
        );
        Ok(Self {
            connector,
            config,
            state: ConnectionState::Disconnected,
        })
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn chain(&self) -> &ChainDescriptor {
        self.connector.chain()
    }

    pub(crate) fn connector(&self) -> &WalletConnector {
        &self.connector
    }

    /// Connect, replacing the state only on success.
    pub async fn connect(&mut self) -> Result<Account> {
        let account = self
            .connector
            .connect()
            .await
            .inspect_err(|e| warn!(error = %e, "wallet connection failed"))?;
        self.state = ConnectionState::Connected(account.clone());
        Ok(account)
    }

    /// Forget the account locally. The extension keeps its permission grant;
    /// there is no revoke call to make.
    pub fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Re-query the connected account's balance.
    pub async fn refresh_balance(&mut self) -> Result<Balance> {
        let address = self
            .state
            .account()
            .map(|a| a.address)
            .ok_or(VaultError::NotConnected)?;
        let balance = self.connector.fetch_balance(address).await?;
        if let ConnectionState::Connected(account) = &mut self.state {
            account.balance = balance;
        }
        Ok(balance)
    }
}
