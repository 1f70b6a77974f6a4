//! Token amounts and base-unit ↔ token-unit conversion.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Decimals of the game token.
pub const TOKEN_DECIMALS: u32 = 18;

/// Largest decimals value whose scale fits in a `u128`.
pub const MAX_DECIMALS: u32 = 38;

/// An integer token amount in base units (like wei for ether).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenAmount(pub u128);

impl TokenAmount {
    /// `whole` tokens expressed in base units. Saturates on overflow.
    pub fn from_tokens(whole: u128, decimals: u32) -> Self {
        Self(whole.saturating_mul(scale(decimals)))
    }

    /// Formats the amount in token units.
    ///
    /// Always has a fractional part and never a trailing zero after the
    /// first decimal: `1.0`, `1.5`, `0.000000000000000001`.
    pub fn format_units(self, decimals: u32) -> String {
        let decimals = decimals.min(MAX_DECIMALS);
        let scale = scale(decimals);
        let whole = self.0 / scale;
        let frac = self.0 % scale;
        if frac == 0 {
            return format!("{whole}.0");
        }
        let digits = format!("{frac:0width$}", width = decimals as usize);
        format!("{whole}.{}", digits.trim_end_matches('0'))
    }

    /// The amount in token units as a float, for payloads that expect a
    /// JSON number.
    pub fn to_units_f64(self, decimals: u32) -> f64 {
        let scale = scale(decimals.min(MAX_DECIMALS));
        (self.0 / scale) as f64 + (self.0 % scale) as f64 / scale as f64
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_units(TOKEN_DECIMALS))
    }
}

fn scale(decimals: u32) -> u128 {
    10u128.pow(decimals.min(MAX_DECIMALS))
}
