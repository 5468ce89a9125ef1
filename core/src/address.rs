/// Address encodings shown to the user and accepted as transfer recipients.
///
/// The extension always speaks 0x hex. Chains such as Injective also give the
/// same key a bech32 form (`inj1...`); when configured, the connector shows
/// that form and recipients may be entered in it.
use std::fmt;
use std::sync::Arc;

use alloy_primitives::Address;
use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ADDRESS_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid address '{input}': {reason}")]
    Invalid { input: String, reason: String },
    #[error("address prefix '{found}' does not match expected '{expected}'")]
    WrongPrefix { expected: String, found: String },
    #[error("invalid bech32 prefix '{0}'")]
    BadPrefix(String),
}

/// Strategy converting between the EVM address and its display encoding.
pub trait AddressCodec: Send + Sync + fmt::Debug {
    fn encode(&self, address: &Address) -> Result<String, AddressError>;

    fn decode(&self, input: &str) -> Result<Address, AddressError>;
}

/// EIP-55 checksummed hex, unchanged from what the extension reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexCodec;

impl AddressCodec for HexCodec {
    fn encode(&self, address: &Address) -> Result<String, AddressError> {
        Ok(address.to_checksum(None))
    }

    fn decode(&self, input: &str) -> Result<Address, AddressError> {
        parse_hex(input)
    }
}

/// Bech32 form of the 20 address bytes under a human-readable prefix.
#[derive(Debug, Clone, Copy)]
pub struct Bech32Codec {
    hrp: Hrp,
}

impl Bech32Codec {
    pub fn new(prefix: &str) -> Result<Self, AddressError> {
        let hrp = Hrp::parse(prefix).map_err(|_| AddressError::BadPrefix(prefix.to_string()))?;
        Ok(Self { hrp })
    }
}

impl AddressCodec for Bech32Codec {
    fn encode(&self, address: &Address) -> Result<String, AddressError> {
        bech32::encode::<Bech32>(self.hrp, address.as_slice()).map_err(|e| AddressError::Invalid {
            input: address.to_string(),
            reason: e.to_string(),
        })
    }

    fn decode(&self, input: &str) -> Result<Address, AddressError> {
        let (hrp, data) = bech32::decode(input).map_err(|e| AddressError::Invalid {
            input: input.to_string(),
            reason: e.to_string(),
        })?;
        if hrp != self.hrp {
            return Err(AddressError::WrongPrefix {
                expected: self.hrp.to_string(),
                found: hrp.to_string(),
            });
        }
        if data.len() != ADDRESS_LEN {
            return Err(AddressError::Invalid {
                input: input.to_string(),
                reason: format!("expected 20 bytes, got {}", data.len()),
            });
        }
        Ok(Address::from_slice(&data))
    }
}

fn parse_hex(input: &str) -> Result<Address, AddressError> {
    if !(input.starts_with("0x") || input.starts_with("0X")) {
        return Err(AddressError::Invalid {
            input: input.to_string(),
            reason: "expected a 0x address".into(),
        });
    }
    input.parse::<Address>().map_err(|e| AddressError::Invalid {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

/// Configured display encoding.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AddressFormat {
    #[default]
    Hex,
    Bech32 { prefix: String },
}

impl AddressFormat {
    pub fn codec(&self) -> Result<Arc<dyn AddressCodec>, AddressError> {
        Ok(match self {
            Self::Hex => Arc::new(HexCodec),
            Self::Bech32 { prefix } => Arc::new(Bech32Codec::new(prefix)?),
        })
    }
}

/// Parse user input as a transfer recipient. 0x hex is always accepted;
/// anything else goes through the configured codec.
pub fn parse_recipient(input: &str, codec: &dyn AddressCodec) -> Result<Address, AddressError> {
    let input = input.trim();
    if input.starts_with("0x") || input.starts_with("0X") {
        return parse_hex(input);
    }
    codec.decode(input)
}
