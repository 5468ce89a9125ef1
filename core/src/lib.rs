//! Wallet connection and transfer lifecycle for the vault front-end.
//!
//! The presentation layer owns a [`SessionController`] and a
//! [`TransactionSubmitter`], calls their operations and renders the state
//! they expose. The injected extension is reached only through
//! [`Eip1193Provider`].

pub mod address;
pub mod chain;
pub mod config;
pub mod connector;
pub mod display;
pub mod error;
pub mod extension;
pub mod provider;
pub mod session;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod transfer;
pub mod units;

pub use address::{AddressCodec, AddressFormat, Bech32Codec, HexCodec};
pub use chain::{ChainDescriptor, ChainNegotiator, NativeCurrency, NetworkSwitch};
pub use config::VaultConfig;
pub use connector::{Account, WalletConnector};
pub use display::{truncate_address, StatusKind, StatusView};
pub use error::VaultError;
pub use extension::ExtensionClient;
pub use provider::{Eip1193Provider, ProviderError, RequestArguments};
pub use session::{ConnectionState, SessionController};
pub use transfer::{InFlight, TransactionStatus, TransactionSubmitter, TransferForm, TransferReceipt};
pub use units::Balance;

pub use alloy_primitives::{Address, B256, U256};
