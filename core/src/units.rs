/// Fixed-point denomination conversion for the native currency.
///
/// Balances and transfer values travel over RPC as integers of the smallest
/// unit (wei for an 18-decimal currency). The presentation layer works in
/// whole units, so every conversion goes through these helpers.
use std::fmt;

use alloy_primitives::U256;
use thiserror::Error;

/// Largest exponent whose power of ten still fits in a `U256`.
pub const MAX_DECIMALS: u8 = 77;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount cannot be empty")]
    Empty,
    #[error("amount must be positive")]
    NotPositive,
    #[error("'{0}' is not a decimal number")]
    Malformed(String),
    #[error("too many decimal places, at most {0} are supported")]
    TooPrecise(u8),
    #[error("amount too large")]
    Overflow,
}

fn scale(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

/// Convert smallest units to a decimal string in whole units.
/// Trailing fractional zeros are trimmed but one digit is always kept:
/// 2_500_000_000_000_000_000 wei -> "2.5", 0 -> "0.0".
#[must_use]
pub fn format_units(value: U256, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let unit = scale(decimals);
    let whole = value / unit;
    let frac = value % unit;
    let frac = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{frac}")
    }
}

/// Parse a whole-unit decimal string into smallest units.
/// Accepts "1", "1.5", "1.", ".5". Zero is accepted here; callers that need a
/// strictly positive amount check `is_zero` themselves.
#[must_use = "parsing result should be checked"]
pub fn parse_units(input: &str, decimals: u8) -> Result<U256, AmountError> {
    let input = input.trim();

    if input.is_empty() {
        return Err(AmountError::Empty);
    }
    if input.starts_with('-') {
        return Err(AmountError::NotPositive);
    }

    let (whole, frac) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(AmountError::Malformed(input.to_string()));
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) {
        return Err(AmountError::Malformed(input.to_string()));
    }
    if frac.len() > decimals as usize {
        return Err(AmountError::TooPrecise(decimals));
    }

    let whole = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10).map_err(|_| AmountError::Overflow)?
    };
    let frac = if frac.is_empty() {
        U256::ZERO
    } else {
        // Right-pad to the full exponent: "5" with 18 decimals is 5 * 10^17.
        let padded = format!("{frac:0<width$}", width = decimals as usize);
        U256::from_str_radix(&padded, 10).map_err(|_| AmountError::Overflow)?
    };

    whole
        .checked_mul(scale(decimals))
        .and_then(|w| w.checked_add(frac))
        .ok_or(AmountError::Overflow)
}

/// Native balance of an account, stale between refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    raw: U256,
    decimals: u8,
}

impl Balance {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    pub fn zero(decimals: u8) -> Self {
        Self::new(U256::ZERO, decimals)
    }

    /// Amount in smallest units.
    pub fn raw(&self) -> U256 {
        self.raw
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Whether `amount` (smallest units) fits within this balance.
    pub fn covers(&self, amount: U256) -> bool {
        amount <= self.raw
    }

    /// Numeric view for display. Precision beyond `f64` is lost.
    pub fn as_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::MAX)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_units(self.raw, self.decimals))
    }
}
