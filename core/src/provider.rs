/// Capability interface of the injected wallet extension.
///
/// The extension is reached only through EIP-1193 `request` calls. Keeping the
/// surface this narrow lets tests and alternate providers stand in for the
/// browser object without touching the controller logic.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The user rejected the request.
pub const USER_REJECTED_REQUEST: i64 = 4001;
/// The requested method or account has not been authorized.
pub const UNAUTHORIZED: i64 = 4100;
/// The provider does not support the requested method.
pub const UNSUPPORTED_METHOD: i64 = 4200;
/// The requested chain has not been added to the extension.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;
/// JSON-RPC internal error. Some mobile extensions wrap 4902 inside it.
pub const INTERNAL_ERROR: i64 = -32603;

/// RPC method names consumed by the vault.
pub mod methods {
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const CHAIN_ID: &str = "eth_chainId";
    pub const SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
    pub const ADD_CHAIN: &str = "wallet_addEthereumChain";
    pub const GET_BALANCE: &str = "eth_getBalance";
    pub const SEND_TRANSACTION: &str = "eth_sendTransaction";
    pub const GET_TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";
}

/// Arguments of a single `request` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestArguments {
    pub method: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl RequestArguments {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    pub fn without_params(method: impl Into<String>) -> Self {
        Self::new(method, Value::Null)
    }
}

/// Error object returned by the provider (EIP-1193 `ProviderRpcError`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Response did not have the shape the method promises.
    pub fn malformed(method: &str, detail: impl std::fmt::Display) -> Self {
        Self::new(
            INTERNAL_ERROR,
            format!("Malformed response to {method}: {detail}"),
        )
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED_REQUEST
    }

    /// True for 4902, including the wrapped form
    /// `{code: -32603, data: {originalError: {code: 4902}}}`.
    pub fn is_unrecognized_chain(&self) -> bool {
        if self.code == UNRECOGNIZED_CHAIN {
            return true;
        }
        self.data
            .as_ref()
            .and_then(|d| d.pointer("/originalError/code"))
            .and_then(Value::as_i64)
            == Some(UNRECOGNIZED_CHAIN)
    }
}

/// An injected wallet provider.
#[async_trait]
pub trait Eip1193Provider: Send + Sync {
    /// Issue one JSON-RPC request. May suspend indefinitely while the user
    /// answers a prompt in the extension.
    async fn request(&self, args: RequestArguments) -> Result<Value, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_plain_unrecognized_chain() {
        let err = ProviderError::new(UNRECOGNIZED_CHAIN, "Unrecognized chain ID");
        assert!(err.is_unrecognized_chain());
        assert!(!err.is_user_rejection());
    }

    #[test]
    fn detects_wrapped_unrecognized_chain() {
        let err = ProviderError::new(INTERNAL_ERROR, "Internal error")
            .with_data(json!({ "originalError": { "code": 4902 } }));
        assert!(err.is_unrecognized_chain());
    }

    #[test]
    fn internal_error_without_wrapped_code_is_not_unrecognized() {
        let err = ProviderError::new(INTERNAL_ERROR, "Internal error")
            .with_data(json!({ "originalError": { "code": 4001 } }));
        assert!(!err.is_unrecognized_chain());
    }

    #[test]
    fn request_arguments_omit_null_params() {
        let args = RequestArguments::without_params(methods::CHAIN_ID);
        let v = serde_json::to_value(&args).unwrap();
        assert_eq!(v, json!({ "method": "eth_chainId" }));
    }

    #[test]
    fn provider_error_deserializes_from_rpc_shape() {
        let err: ProviderError =
            serde_json::from_value(json!({ "code": 4001, "message": "User rejected the request." }))
                .unwrap();
        assert!(err.is_user_rejection());
        assert!(err.data.is_none());
    }
}
