//! # Value Objects
//!
//! Immutable domain primitives for batch distribution.
//! These types represent concepts that are defined by their value, not identity.

use super::errors::AmountError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// Re-export U256 from primitive-types for base-unit arithmetic
pub use primitive_types::{U256, U512};

/// Prefix every account identifier carries.
pub const ADDRESS_PREFIX: &str = "0x";

/// Number of hexadecimal characters after the prefix.
pub const ADDRESS_HEX_LEN: usize = 40;

/// Largest fractional scale a `DecimalAmount` accepts.
///
/// `10^77` is the largest power of ten that fits in a `U256`.
pub const MAX_SCALE: u32 = 77;

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte account identifier (`0x` + 40 hex characters).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address (0x0000...0000).
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parses the textual form. Letter case is accepted as-is.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let hex_part = text.strip_prefix(ADDRESS_PREFIX)?;
        if hex_part.len() != ADDRESS_HEX_LEN {
            return None;
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex_part, &mut bytes).ok()?;
        Some(Self(bytes))
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ADDRESS_PREFIX}{}", hex::encode(self.0))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Address {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid address: {s}"))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).ok_or_else(|| serde::de::Error::custom(format!("invalid address: {text}")))
    }
}

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Stable identity of a recipient row, assigned once at creation.
///
/// Used for UI identity only; no correctness logic depends on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipientId(pub Uuid);

impl RecipientId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one execution attempt, carried by its completion record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub Uuid);

impl BatchId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// DECIMAL AMOUNT
// =============================================================================

/// Exact non-negative decimal number: `mantissa / 10^scale`.
///
/// Always kept normalised (no trailing fractional zeros), so derived
/// equality and hashing agree with numeric equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DecimalAmount {
    mantissa: U256,
    scale: u32,
}

/// `10^exp` as a `U256`, or `None` when it does not fit.
#[must_use]
pub fn pow10(exp: u32) -> Option<U256> {
    let ten = U256::from(10u8);
    let mut value = U256::one();
    for _ in 0..exp {
        value = value.checked_mul(ten)?;
    }
    Some(value)
}

impl DecimalAmount {
    /// Zero.
    pub const ZERO: Self = Self {
        mantissa: U256::zero(),
        scale: 0,
    };

    /// Builds an amount from raw parts, normalising trailing zeros.
    #[must_use]
    pub fn from_parts(mantissa: U256, scale: u32) -> Self {
        Self { mantissa, scale }.normalized()
    }

    /// Interprets integer base units at the given token precision.
    #[must_use]
    pub fn from_base_units(units: U256, decimals: u8) -> Self {
        Self::from_parts(units, u32::from(decimals))
    }

    /// Unscaled integer digits.
    #[must_use]
    pub fn mantissa(&self) -> U256 {
        self.mantissa
    }

    /// Number of fractional digits.
    #[must_use]
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        !self.is_zero()
    }

    fn normalized(mut self) -> Self {
        let ten = U256::from(10u8);
        if self.mantissa.is_zero() {
            self.scale = 0;
            return self;
        }
        while self.scale > 0 && (self.mantissa % ten).is_zero() {
            self.mantissa /= ten;
            self.scale -= 1;
        }
        self
    }

    /// Mantissa rescaled to `scale` (must be >= `self.scale`).
    fn rescaled(&self, scale: u32) -> Option<U256> {
        self.mantissa.checked_mul(pow10(scale - self.scale)?)
    }

    /// Exact addition. `None` on overflow.
    #[must_use]
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        let scale = self.scale.max(other.scale);
        let sum = self.rescaled(scale)?.checked_add(other.rescaled(scale)?)?;
        Some(Self::from_parts(sum, scale))
    }

    /// Exact subtraction. `None` if `other > self` or on overflow.
    #[must_use]
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        let scale = self.scale.max(other.scale);
        let diff = self.rescaled(scale)?.checked_sub(other.rescaled(scale)?)?;
        Some(Self::from_parts(diff, scale))
    }

    /// Converts to integer base units at `decimals` precision.
    ///
    /// Digits below the token's precision are truncated only when they are
    /// zero; a non-zero sub-unit remainder is rejected.
    pub fn to_base_units(&self, decimals: u8) -> Result<U256, AmountError> {
        let decimals = u32::from(decimals);
        if self.scale > decimals {
            return Err(AmountError::PrecisionOverflow {
                scale: self.scale,
                decimals,
            });
        }
        self.rescaled(decimals).ok_or(AmountError::Overflow)
    }
}

impl FromStr for DecimalAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(AmountError::Empty);
        }

        let (int_part, frac_part) = match text.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (text, None),
        };

        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || frac_part.is_some_and(|frac| !all_digits(frac)) {
            return Err(AmountError::Malformed(text.to_string()));
        }

        let frac_part = frac_part.unwrap_or("");
        let scale = u32::try_from(frac_part.len()).map_err(|_| AmountError::Overflow)?;
        if scale > MAX_SCALE {
            return Err(AmountError::Overflow);
        }

        let ten = U256::from(10u8);
        let mut mantissa = U256::zero();
        for digit in int_part.bytes().chain(frac_part.bytes()) {
            mantissa = mantissa
                .checked_mul(ten)
                .and_then(|m| m.checked_add(U256::from(digit - b'0')))
                .ok_or(AmountError::Overflow)?;
        }

        Ok(Self::from_parts(mantissa, scale))
    }
}

impl PartialOrd for DecimalAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DecimalAmount {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.scale == other.scale {
            return self.mantissa.cmp(&other.mantissa);
        }
        let (coarse, fine) = if self.scale < other.scale {
            (self, other)
        } else {
            (other, self)
        };
        // Align the coarser amount in U512. A gap past 10^77 outweighs any
        // U256 mantissa, so only a zero coarse side can lose.
        let ordering = match pow10(fine.scale - coarse.scale) {
            Some(factor) => coarse.mantissa.full_mul(factor).cmp(&U512::from(fine.mantissa)),
            None if coarse.mantissa.is_zero() => U256::zero().cmp(&fine.mantissa),
            None => Ordering::Greater,
        };
        if self.scale < other.scale {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

impl fmt::Display for DecimalAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.to_string();
        let scale = self.scale as usize;
        if scale == 0 {
            return f.write_str(&digits);
        }
        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{int_part}.{frac_part}")
    }
}

impl fmt::Debug for DecimalAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DecimalAmount({self})")
    }
}

impl Serialize for DecimalAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DecimalAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// LIFECYCLE STATE
// =============================================================================

/// Lifecycle of one execution attempt as observed by the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// No attempt in progress.
    #[default]
    Idle,
    /// Send requested; preconditions being checked.
    Preparing,
    /// Dispatched to the settlement boundary.
    Pending,
    /// Completion record received.
    Success,
    /// Attempt failed with a classified error.
    Error,
}

impl LifecycleState {
    /// Check if transition to next state is valid.
    #[must_use]
    pub fn can_transition_to(&self, next: LifecycleState) -> bool {
        match (self, next) {
            (Self::Idle | Self::Success | Self::Error, Self::Preparing) => true,
            (Self::Preparing, Self::Pending) => true,
            (Self::Preparing, Self::Error) => true,
            (Self::Preparing, Self::Idle) => true, // Abandoned before dispatch
            (Self::Pending, Self::Success) => true,
            (Self::Pending, Self::Error) => true,
            (Self::Success | Self::Error, Self::Idle) => true, // Reset
            _ => false,
        }
    }

    /// Check if this is a terminal state for the attempt.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    /// Check if an attempt is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Preparing | Self::Pending)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(text: &str) -> DecimalAmount {
        text.parse().unwrap()
    }

    #[test]
    fn test_address_parse_mixed_case() {
        let addr = Address::parse("0xabcdefABCDEFabcdefABCDEFabcdefABCDEFabcd").unwrap();
        assert_eq!(addr.to_string(), "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd");
    }

    #[test]
    fn test_address_parse_rejects_bad_shape() {
        assert!(Address::parse("0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb").is_none());
        assert!(Address::parse("742d35Cc6634C0532925a3b844Bc9e7595f0bEb0").is_none());
        assert!(Address::parse("0xZZZZ35Cc6634C0532925a3b844Bc9e7595f0bEb0").is_none());
        assert!(Address::parse("").is_none());
    }

    #[test]
    fn test_decimal_parse_and_display() {
        assert_eq!(amount("1.5").to_string(), "1.5");
        assert_eq!(amount("2.0").to_string(), "2");
        assert_eq!(amount("0.000001").to_string(), "0.000001");
        assert_eq!(amount("  42 ").to_string(), "42");
        assert_eq!(amount("007.10").to_string(), "7.1");
    }

    #[test]
    fn test_decimal_parse_rejects_non_plain_forms() {
        for text in ["", "  ", "-1", "+1", "1e5", "1,000", "abc", "1.", ".5", "1.2.3"] {
            assert!(text.parse::<DecimalAmount>().is_err(), "accepted {text:?}");
        }
    }

    #[test]
    fn test_decimal_add_is_exact() {
        let sum = amount("0.1").checked_add(&amount("0.2")).unwrap();
        assert_eq!(sum, amount("0.3"));
        assert_eq!(amount("1.5").checked_add(&amount("2.0")).unwrap().to_string(), "3.5");
    }

    #[test]
    fn test_decimal_sub() {
        assert_eq!(amount("10").checked_sub(&amount("9.25")).unwrap(), amount("0.75"));
        assert!(amount("1").checked_sub(&amount("2")).is_none());
    }

    #[test]
    fn test_decimal_ordering() {
        assert!(amount("9.0") < amount("10"));
        assert!(amount("0.10") == amount("0.1"));
        assert!(amount("1.000001") > amount("1"));
    }

    #[test]
    fn test_decimal_ordering_past_u256_scale() {
        let tiny = DecimalAmount::from_base_units(U256::one(), 200);
        let one = DecimalAmount::from_base_units(U256::one(), 0);
        assert!(tiny < one);
        assert!(one > tiny);
        assert!(tiny > DecimalAmount::ZERO);
        assert!(DecimalAmount::ZERO < tiny);

        let max_fine = DecimalAmount::from_base_units(U256::MAX, 120);
        assert!(max_fine < one);
        assert!(DecimalAmount::from_base_units(U256::one(), 79)
            < DecimalAmount::from_base_units(U256::one(), 78));
    }

    #[test]
    fn test_to_base_units() {
        assert_eq!(
            amount("1.5").to_base_units(18).unwrap(),
            U256::from(1_500_000_000_000_000_000u128)
        );
        assert_eq!(amount("1.50").to_base_units(1).unwrap(), U256::from(15u8));
        assert_eq!(amount("3").to_base_units(0).unwrap(), U256::from(3u8));
    }

    #[test]
    fn test_to_base_units_rejects_sub_unit_remainder() {
        let err = amount("1.0000001").to_base_units(6).unwrap_err();
        assert!(matches!(err, AmountError::PrecisionOverflow { scale: 7, decimals: 6 }));
    }

    #[test]
    fn test_from_base_units() {
        let value = DecimalAmount::from_base_units(U256::from(1_250_000u64), 6);
        assert_eq!(value.to_string(), "1.25");
    }

    #[test]
    fn test_lifecycle_transitions() {
        assert!(LifecycleState::Idle.can_transition_to(LifecycleState::Preparing));
        assert!(LifecycleState::Preparing.can_transition_to(LifecycleState::Pending));
        assert!(LifecycleState::Pending.can_transition_to(LifecycleState::Success));
        assert!(LifecycleState::Preparing.can_transition_to(LifecycleState::Error));
        assert!(LifecycleState::Error.can_transition_to(LifecycleState::Preparing));
    }

    #[test]
    fn test_lifecycle_no_skipping() {
        assert!(!LifecycleState::Idle.can_transition_to(LifecycleState::Pending));
        assert!(!LifecycleState::Preparing.can_transition_to(LifecycleState::Success));
        assert!(!LifecycleState::Pending.can_transition_to(LifecycleState::Idle));
        assert!(!LifecycleState::Pending.can_transition_to(LifecycleState::Preparing));
    }
}
