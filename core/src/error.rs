//! Domain error type for connection and transfer operations.

use thiserror::Error;

use crate::provider::ProviderError;
use crate::units::AmountError;

/// Typed error enum for vault operations, allowing the presentation layer to
/// match on specific failure modes instead of inspecting message strings.
///
/// Every variant renders a user-facing message through `Display`.
#[derive(Debug, Error)]
pub enum VaultError {
    /// No injected wallet provider is available.
    #[error("No wallet extension found. Install a browser wallet to continue.")]
    ExtensionMissing,

    /// The user declined an account or network-change prompt.
    #[error("Request rejected in wallet: {0}")]
    UserRejected(String),

    /// The network switch or add request failed for a reason other than an
    /// unknown network.
    #[error("Failed to switch network: {0}")]
    ChainSwitchFailed(String),

    /// A transfer was attempted without a connected wallet.
    #[error("Connect a wallet before sending.")]
    NotConnected,

    /// Recipient or amount left blank.
    #[error("Recipient and amount are both required.")]
    MissingFields,

    /// Amount is not a positive decimal within the currency's precision.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Amount exceeds the last known balance.
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// Recipient is not a recognised address.
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// The extension or network rejected or failed to relay the transaction.
    #[error("Transaction submission failed: {0}")]
    SubmissionFailed(String),

    /// The transaction was submitted but never confirmed, or reverted.
    #[error("Transaction confirmation failed: {0}")]
    ConfirmationFailed(String),

    /// A previous `submit` from the same submitter has not finished yet.
    #[error("A transfer is already in progress.")]
    SubmissionInProgress,

    /// Invalid configuration (chain descriptor, address format).
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// RPC failure outside the categories above.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl VaultError {
    /// Whether the failure came from local validation, meaning no network
    /// call was issued.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::MissingFields
                | Self::InvalidAmount(_)
                | Self::InsufficientBalance(_)
                | Self::InvalidRecipient(_)
        )
    }
}

impl From<AmountError> for VaultError {
    fn from(err: AmountError) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}

/// Alias for `std::result::Result<T, VaultError>`.
pub type Result<T> = std::result::Result<T, VaultError>;
