/// Presentation helpers: address truncation, balances and status banners.
use serde::Serialize;

use crate::chain::ChainDescriptor;
use crate::transfer::TransactionStatus;
use crate::units::Balance;

const HEAD_CHARS: usize = 6;
const TAIL_CHARS: usize = 5;

/// First 6 characters, "...", last 5 characters. Empty stays empty.
/// Inputs shorter than either window reuse what is there, so "0xab" becomes
/// "0xab...0xab".
#[must_use]
pub fn truncate_address(address: &str) -> String {
    if address.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = address.chars().collect();
    let head: String = chars.iter().take(HEAD_CHARS).collect();
    let tail: String = chars[chars.len().saturating_sub(TAIL_CHARS)..].iter().collect();
    format!("{head}...{tail}")
}

/// Format a balance with its currency symbol, e.g. "2.5 INJ".
#[must_use]
pub fn format_balance(balance: &Balance, symbol: &str) -> String {
    format!("{balance} {symbol}")
}

/// Format balance as JSON.
#[must_use]
pub fn format_balance_json(balance: &Balance, symbol: &str) -> String {
    serde_json::json!({
        "balance_raw": balance.raw().to_string(),
        "balance": balance.to_string(),
        "symbol": symbol,
    })
    .to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    None,
    Pending,
    Success,
    Error,
}

/// What the UI needs to render a status banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub kind: StatusKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

impl StatusView {
    pub fn new(status: &TransactionStatus, chain: &ChainDescriptor) -> Self {
        match status {
            TransactionStatus::None => Self {
                kind: StatusKind::None,
                message: String::new(),
                transaction_hash: None,
                explorer_url: None,
            },
            TransactionStatus::Pending(None) => Self {
                kind: StatusKind::Pending,
                message: "Confirm the transaction in your wallet...".into(),
                transaction_hash: None,
                explorer_url: None,
            },
            TransactionStatus::Pending(Some(hash)) => Self {
                kind: StatusKind::Pending,
                message: "Waiting for confirmation...".into(),
                transaction_hash: Some(hash.to_string()),
                explorer_url: None,
            },
            TransactionStatus::Success(hash) => {
                let hash = hash.to_string();
                Self {
                    kind: StatusKind::Success,
                    message: "Transfer confirmed.".into(),
                    explorer_url: chain.transaction_url(&hash),
                    transaction_hash: Some(hash),
                }
            }
            TransactionStatus::Error(message) => Self {
                kind: StatusKind::Error,
                message: message.clone(),
                transaction_hash: None,
                explorer_url: None,
            },
        }
    }
}
