//! # Units Module
//!
//! Provides the `TokenAmount` type for prices, caps, supplies and payments.
//!
//! ## Why Integer Base Units?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  The sale contract takes every amount as an 18-decimal integer:         │
//! │    "1.5" USDT  ──►  1_500_000_000_000_000_000                          │
//! │                                                                         │
//! │  OUR SOLUTION: parse the decimal STRING straight into base units        │
//! │    No float ever touches a price, cap, supply or payment               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ico_core::units::{parse_units, TokenAmount};
//!
//! let price = parse_units("0.25").unwrap();
//! assert_eq!(price.base_units(), 250_000_000_000_000_000);
//! assert_eq!(price.to_string(), "0.25");
//!
//! let supply = TokenAmount::from_whole(1_000_000);
//! assert!(supply.is_positive());
//! ```

use std::fmt;
use std::str::FromStr;

use ethnum::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AmountError;
use crate::TOKEN_DECIMALS;

/// 10^18: one whole token in base units.
pub const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

// =============================================================================
// Token Amount
// =============================================================================

/// A non-negative amount in 18-decimal base units.
///
/// ## Design Decisions
/// - **u128 (unsigned)**: Sale amounts are never negative; refunds do not exist
/// - **Single field tuple struct**: Zero-cost abstraction over u128
/// - **Serialized as an integer string**: JSON numbers lose precision past 2^53
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(u128);

impl TokenAmount {
    /// Creates an amount from raw base units.
    #[inline]
    pub const fn from_base_units(units: u128) -> Self {
        TokenAmount(units)
    }

    /// Creates an amount from a whole number of tokens.
    ///
    /// ## Example
    /// ```rust
    /// use ico_core::units::TokenAmount;
    ///
    /// assert_eq!(TokenAmount::from_whole(2).to_string(), "2");
    /// ```
    #[inline]
    pub const fn from_whole(whole: u64) -> Self {
        TokenAmount(whole as u128 * ONE_TOKEN)
    }

    /// Returns the raw base units.
    #[inline]
    pub const fn base_units(&self) -> u128 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TokenAmount(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Adds two amounts, failing on overflow.
    pub fn checked_add(self, other: Self) -> Result<Self, AmountError> {
        self.0
            .checked_add(other.0)
            .map(TokenAmount)
            .ok_or(AmountError::Overflow)
    }

    /// Subtracts, stopping at zero.
    #[inline]
    pub const fn saturating_sub(self, other: Self) -> Self {
        TokenAmount(self.0.saturating_sub(other.0))
    }

    /// How many tokens `self` buys at `unit_price` (both in base units).
    ///
    /// ## Example
    /// ```rust
    /// use ico_core::units::parse_units;
    ///
    /// let paid = parse_units("100").unwrap();
    /// let price = parse_units("0.5").unwrap();
    /// assert_eq!(paid.tokens_at(price).unwrap().to_string(), "200");
    /// ```
    pub fn tokens_at(self, unit_price: TokenAmount) -> Result<TokenAmount, AmountError> {
        mul_div(self.0, ONE_TOKEN, unit_price.0).map(TokenAmount)
    }

    /// Returns `bps / 10_000` of this amount, rounded down.
    pub fn portion_bps(self, bps: u32) -> Result<TokenAmount, AmountError> {
        mul_div(self.0, bps as u128, 10_000).map(TokenAmount)
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a decimal string into base units.
///
/// ## Rules
/// - Optional leading `+`, then digits with at most one `.`
/// - At most 18 fractional digits
/// - Leading `-` is rejected as [`AmountError::Negative`]
/// - Surrounding whitespace is ignored
///
/// ## Example
/// ```rust
/// use ico_core::units::parse_units;
/// use ico_core::AmountError;
///
/// assert_eq!(parse_units("1").unwrap().base_units(), 1_000_000_000_000_000_000);
/// assert_eq!(parse_units(".5").unwrap().to_string(), "0.5");
/// assert_eq!(parse_units("-1"), Err(AmountError::Negative));
/// assert_eq!(parse_units("1e3"), Err(AmountError::InvalidDigit));
/// ```
pub fn parse_units(input: &str) -> Result<TokenAmount, AmountError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }
    if s.starts_with('-') {
        return Err(AmountError::Negative);
    }
    let s = s.strip_prefix('+').unwrap_or(s);

    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(AmountError::InvalidDigit);
    }
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) {
        return Err(AmountError::InvalidDigit);
    }
    if frac.len() > TOKEN_DECIMALS as usize {
        return Err(AmountError::TooManyDecimals {
            max: TOKEN_DECIMALS,
        });
    }

    let whole_units: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| AmountError::Overflow)?
    };
    let frac_units: u128 = if frac.is_empty() {
        0
    } else {
        // At most 18 digits, always fits.
        let digits: u128 = frac.parse().map_err(|_| AmountError::InvalidDigit)?;
        digits * 10u128.pow(TOKEN_DECIMALS - frac.len() as u32)
    };

    whole_units
        .checked_mul(ONE_TOKEN)
        .and_then(|units| units.checked_add(frac_units))
        .map(TokenAmount)
        .ok_or(AmountError::Overflow)
}

impl FromStr for TokenAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_units(s)
    }
}

// =============================================================================
// Math
// =============================================================================

/// Computes `x * y / denominator` rounded down, with a 256-bit intermediate.
///
/// ## Why 256 bits?
/// `1_000_000 USDT * 10^18` already needs ~140 bits; the product only
/// shrinks back into u128 after the division.
pub fn mul_div(x: u128, y: u128, denominator: u128) -> Result<u128, AmountError> {
    if denominator == 0 {
        return Err(AmountError::DivisionByZero);
    }
    if x == 0 || y == 0 {
        return Ok(0);
    }

    // u128 * u128 always fits in 256 bits.
    let product = U256::new(x) * U256::new(y);
    let quotient = product / U256::new(denominator);
    u128::try_from(quotient).map_err(|_| AmountError::Overflow)
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders the amount as a trimmed decimal: `1.5`, `0.000001`, `42`.
impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / ONE_TOKEN;
        let frac = self.0 % ONE_TOKEN;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:018}", frac);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim()
            .parse::<u128>()
            .map(TokenAmount)
            .map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
