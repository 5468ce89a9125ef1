/// Typed wrapper over the extension's EIP-1193 `request` surface.
mod types;

pub use types::*;
pub(crate) use types::parse_quantity;

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::chain::ChainDescriptor;
use crate::provider::{methods, Eip1193Provider, ProviderError, RequestArguments};

#[derive(Clone)]
pub struct ExtensionClient {
    provider: Arc<dyn Eip1193Provider>,
}

impl ExtensionClient {
    pub fn new(provider: Arc<dyn Eip1193Provider>) -> Self {
        Self { provider }
    }

    async fn raw(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.provider
            .request(RequestArguments::new(method, params))
            .await
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ProviderError> {
        let value = self.raw(method, params).await?;
        serde_json::from_value(value).map_err(|e| ProviderError::malformed(method, e))
    }

    /// Ask the user to expose their accounts. May prompt.
    pub async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.call(methods::REQUEST_ACCOUNTS, Value::Null).await
    }

    /// Accounts already exposed to this origin; the first one is the signer.
    pub async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.call(methods::ACCOUNTS, Value::Null).await
    }

    /// Active chain of the extension.
    pub async fn chain_id(&self) -> Result<u64, ProviderError> {
        let hex: String = self.call(methods::CHAIN_ID, Value::Null).await?;
        types::parse_quantity(&hex)
            .ok_or_else(|| ProviderError::malformed(methods::CHAIN_ID, format!("'{hex}'")))
    }

    pub async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        self.raw(
            methods::SWITCH_CHAIN,
            json!([{ "chainId": format!("{chain_id:#x}") }]),
        )
        .await?;
        Ok(())
    }

    /// Register the chain with the extension. Extensions switch to it once
    /// the user approves.
    pub async fn add_chain(&self, chain: &ChainDescriptor) -> Result<(), ProviderError> {
        let params = serde_json::to_value(chain)
            .map_err(|e| ProviderError::malformed(methods::ADD_CHAIN, e))?;
        self.raw(methods::ADD_CHAIN, Value::Array(vec![params])).await?;
        Ok(())
    }

    /// Latest native balance in smallest units.
    pub async fn balance(&self, address: Address) -> Result<U256, ProviderError> {
        self.call(methods::GET_BALANCE, json!([address, "latest"])).await
    }

    /// Hand the transaction to the extension for signing and broadcast.
    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, ProviderError> {
        self.call(methods::SEND_TRANSACTION, json!([tx])).await
    }

    /// `None` while the transaction is not yet included.
    pub async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, ProviderError> {
        self.call(methods::GET_TRANSACTION_RECEIPT, json!([hash])).await
    }
}

impl std::fmt::Debug for ExtensionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionClient").finish_non_exhaustive()
    }
}
