//! QTUM amounts as whole satoshis.
//!
//! The node takes amounts as decimal strings with up to eight fractional
//! digits. Keeping the value as an integer satoshi count means arithmetic on
//! raised/loaded funds never touches floating point.

use std::fmt;
use std::str::FromStr;

use crate::errors::OpsError;

pub const SATS_PER_QTUM: u64 = 100_000_000;

/// A non-negative QTUM amount, stored as satoshis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Amount(u64);

impl Amount {
    pub fn from_sats(sats: u64) -> Amount {
        Amount(sats)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_sub(&self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Full eight-decimal rendering, the form the node RPC expects.
    pub fn to_qtum_string(&self) -> String {
        format!(
            "{}.{:08}",
            self.0 / SATS_PER_QTUM,
            self.0 % SATS_PER_QTUM
        )
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SATS_PER_QTUM;
        let frac = self.0 % SATS_PER_QTUM;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:08}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for Amount {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Amount, OpsError> {
        let bad = || OpsError::Amount(s.to_string());
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        if frac.len() > 8 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        let whole: u64 = whole.parse().map_err(|_| bad())?;
        let mut frac_sats: u64 = 0;
        if !frac.is_empty() {
            let scale = 10u64.pow(8 - frac.len() as u32);
            frac_sats = frac.parse::<u64>().map_err(|_| bad())? * scale;
        }
        whole
            .checked_mul(SATS_PER_QTUM)
            .and_then(|w| w.checked_add(frac_sats))
            .map(Amount)
            .ok_or_else(bad)
    }
}
