use crate::candid::{CandidType, Nat};
use derive_more::{Add, AddAssign, Display, Sub, SubAssign};
use num_traits::cast::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display as FmtDisplay},
    str::FromStr,
};

///
/// Constants
///

/// Number of e8s in one whole token.
pub const E8S_PER_TOKEN: u64 = 100_000_000;

/// Fractional digits carried by an e8s amount.
pub const TOKEN_DECIMALS: usize = 8;

///
/// Tokens
/// Governance-token amount measured in e8s (10^-8 of a token).
///

#[derive(
    Add,
    AddAssign,
    CandidType,
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    Sub,
    SubAssign,
)]
pub struct Tokens(u64);

impl Tokens {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn from_e8s(e8s: u64) -> Self {
        Self(e8s)
    }

    #[must_use]
    pub const fn e8s(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Lossy conversion from a ledger `Nat`; values above `u64::MAX` saturate.
    #[must_use]
    pub fn from_nat_saturating(n: &Nat) -> Self {
        Self(n.0.to_u64().unwrap_or(u64::MAX))
    }

    #[must_use]
    pub fn to_nat(self) -> Nat {
        Nat::from(self.0)
    }
}

impl FmtDisplay for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / E8S_PER_TOKEN;
        let frac = self.0 % E8S_PER_TOKEN;

        if frac == 0 {
            return write!(f, "{whole}");
        }

        let frac = format!("{frac:0TOKEN_DECIMALS$}");
        write!(f, "{whole}.{}", frac.trim_end_matches('0'))
    }
}

impl From<u64> for Tokens {
    fn from(e8s: u64) -> Self {
        Self(e8s)
    }
}

impl From<Tokens> for Nat {
    fn from(t: Tokens) -> Self {
        t.to_nat()
    }
}

///
/// TokensParseError
///

#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum TokensParseError {
    #[display("amount is empty")]
    Empty,

    #[display("amount '{_0}' is not a decimal number")]
    NotANumber(String),

    #[display("amount '{_0}' has more than 8 fractional digits")]
    TooPrecise(String),

    #[display("amount '{_0}' overflows u64 e8s")]
    Overflow(String),
}

impl std::error::Error for TokensParseError {}

impl FromStr for Tokens {
    type Err = TokensParseError;

    /// Parses a whole-token decimal such as `"12"`, `"0.5"` or `"1_000.25"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let clean: String = s.trim().chars().filter(|c| *c != '_').collect();
        if clean.is_empty() {
            return Err(TokensParseError::Empty);
        }

        let (whole, frac) = clean.split_once('.').unwrap_or((clean.as_str(), ""));
        let is_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());

        if (whole.is_empty() && frac.is_empty()) || !is_digits(whole) || !is_digits(frac) {
            return Err(TokensParseError::NotANumber(s.to_string()));
        }
        if frac.len() > TOKEN_DECIMALS {
            return Err(TokensParseError::TooPrecise(s.to_string()));
        }

        let overflow = || TokensParseError::Overflow(s.to_string());
        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let frac_e8s: u64 = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<TOKEN_DECIMALS$}")
                .parse()
                .map_err(|_| overflow())?
        };

        whole
            .checked_mul(E8S_PER_TOKEN)
            .and_then(|v| v.checked_add(frac_e8s))
            .map(Self)
            .ok_or_else(overflow)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!("12".parse::<Tokens>().unwrap().e8s(), 1_200_000_000);
        assert_eq!("0.5".parse::<Tokens>().unwrap().e8s(), 50_000_000);
        assert_eq!(".00000001".parse::<Tokens>().unwrap().e8s(), 1);
        assert_eq!("1_000.25".parse::<Tokens>().unwrap().e8s(), 100_025_000_000);
    }

    #[test]
    fn rejects_malformed_amounts() {
        assert_eq!("".parse::<Tokens>(), Err(TokensParseError::Empty));
        assert!(matches!(
            "1.2.3".parse::<Tokens>(),
            Err(TokensParseError::NotANumber(_))
        ));
        assert!(matches!(
            "-4".parse::<Tokens>(),
            Err(TokensParseError::NotANumber(_))
        ));
        assert!(matches!(
            "0.000000001".parse::<Tokens>(),
            Err(TokensParseError::TooPrecise(_))
        ));
        assert!(matches!(
            "999999999999999".parse::<Tokens>(),
            Err(TokensParseError::Overflow(_))
        ));
    }

    #[test]
    fn display_trims_trailing_zeroes() {
        assert_eq!(Tokens::from_e8s(150_000_000).to_string(), "1.5");
        assert_eq!(Tokens::from_e8s(200_000_000).to_string(), "2");
        assert_eq!(Tokens::from_e8s(1).to_string(), "0.00000001");
    }

    #[test]
    fn nat_conversion_saturates() {
        let big = Nat::from(u128::from(u64::MAX) + 1);
        assert_eq!(Tokens::from_nat_saturating(&big).e8s(), u64::MAX);
        assert_eq!(Tokens::from_e8s(7).to_nat(), Nat::from(7u64));
    }
}
