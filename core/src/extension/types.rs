use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Parse a JSON-RPC quantity (`"0x59f"`) into a `u64`.
pub(crate) fn parse_quantity(s: &str) -> Option<u64> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Native transfer handed to `eth_sendTransaction`. Gas and nonce are left to
/// the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

/// The subset of a transaction receipt the vault reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<String>,
    /// `"0x1"` on success, `"0x0"` when reverted. Absent on pre-Byzantium
    /// receipts, which carry a state root instead.
    #[serde(default)]
    pub status: Option<String>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        match self.status.as_deref() {
            Some(s) => parse_quantity(s) == Some(1),
            None => true,
        }
    }

    pub fn block_number(&self) -> Option<u64> {
        self.block_number.as_deref().and_then(parse_quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_quantities() {
        assert_eq!(parse_quantity("0x59f"), Some(1439));
        assert_eq!(parse_quantity("0X1"), Some(1));
        assert_eq!(parse_quantity("0x"), None);
        assert_eq!(parse_quantity("59f"), None);
        assert_eq!(parse_quantity("0xzz"), None);
    }

    #[test]
    fn transaction_request_serializes_hex_value() {
        let tx = TransactionRequest {
            from: Address::ZERO,
            to: Address::with_last_byte(1),
            value: U256::from(255u64),
        };
        let v = serde_json::to_value(&tx).unwrap();
        assert_eq!(v["value"], "0xff");
        assert_eq!(v["to"], "0x0000000000000000000000000000000000000001");
    }

    #[test]
    fn receipt_status() {
        let hash = B256::with_last_byte(7);
        let ok: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": hash,
            "blockNumber": "0x10",
            "status": "0x1",
        }))
        .unwrap();
        assert!(ok.succeeded());
        assert_eq!(ok.block_number(), Some(16));

        let reverted: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": hash,
            "status": "0x0",
        }))
        .unwrap();
        assert!(!reverted.succeeded());
        assert_eq!(reverted.block_number(), None);
    }
}
