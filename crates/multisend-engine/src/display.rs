//! # Display Formatting
//!
//! Renders addresses and amounts for a summary panel. Amounts are formatted
//! from their exact decimal form: fractions are truncated, never rounded up.

use crate::domain::{DecimalAmount, U256};

/// Default characters kept on each side of a shortened address.
pub const DEFAULT_ADDRESS_CHARS: usize = 6;

/// Default fractional digits shown for amounts.
pub const DEFAULT_FRACTION_DIGITS: usize = 4;

/// Text shown for positive amounts below `0.0001`.
pub const DUST_LABEL: &str = "< 0.0001";

/// Shortens `0x742d35Cc...f0bEb0` style, keeping `chars` hex digits on each
/// side. Short or non-ASCII input is returned unchanged.
#[must_use]
pub fn format_address(address: &str, chars: usize) -> String {
    if !address.is_ascii() || address.len() <= chars * 2 + 2 {
        return address.to_string();
    }
    let head = &address[..chars + 2];
    let tail = &address[address.len() - chars..];
    format!("{head}...{tail}")
}

/// Thousands separators, at most `max_fraction_digits` fractional digits.
#[must_use]
pub fn format_amount(amount: &DecimalAmount, max_fraction_digits: usize) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }
    if *amount < DecimalAmount::from_parts(U256::one(), 4) {
        return DUST_LABEL.to_string();
    }

    let text = amount.to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let shown: String = frac_part.chars().take(max_fraction_digits).collect();
    let shown = shown.trim_end_matches('0');

    let grouped = group_thousands(int_part);
    if shown.is_empty() {
        grouped
    } else {
        format!("{grouped}.{shown}")
    }
}

/// Like [`format_amount`] for text input; unparsable input renders as `"0"`.
#[must_use]
pub fn format_number(text: &str, max_fraction_digits: usize) -> String {
    text.parse::<DecimalAmount>()
        .map(|amount| format_amount(&amount, max_fraction_digits))
        .unwrap_or_else(|_| "0".to_string())
}

/// `"1,234.5678 ETH"`.
#[must_use]
pub fn format_balance(balance: &str, symbol: &str, max_fraction_digits: usize) -> String {
    format!("{} {symbol}", format_number(balance, max_fraction_digits))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(text: &str) -> DecimalAmount {
        text.parse().unwrap()
    }

    #[test]
    fn test_format_address() {
        let address = "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0";
        assert_eq!(format_address(address, DEFAULT_ADDRESS_CHARS), "0x742d35...f0bEb0");
        assert_eq!(format_address(address, 4), "0x742d...bEb0");
        assert_eq!(format_address("0x1234", DEFAULT_ADDRESS_CHARS), "0x1234");
        assert_eq!(format_address("", DEFAULT_ADDRESS_CHARS), "");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(&amount("1234.5678"), 4), "1,234.5678");
        assert_eq!(format_amount(&amount("1000"), 4), "1,000");
        assert_eq!(format_amount(&amount("0.5"), 4), "0.5");
        assert_eq!(format_amount(&amount("1234567.1"), 4), "1,234,567.1");
        assert_eq!(format_amount(&amount("100"), 4), "100");
    }

    #[test]
    fn test_format_amount_truncates() {
        assert_eq!(format_amount(&amount("1.123456"), 2), "1.12");
        assert_eq!(format_amount(&amount("1.129"), 2), "1.12");
        assert_eq!(format_amount(&amount("1.123456"), 6), "1.123456");
        assert_eq!(format_amount(&amount("2.0001"), 2), "2");
    }

    #[test]
    fn test_dust_and_zero() {
        assert_eq!(format_amount(&amount("0.00001"), 4), DUST_LABEL);
        assert_eq!(format_amount(&amount("0.000001"), 4), DUST_LABEL);
        assert_eq!(format_amount(&amount("0.0001"), 4), "0.0001");
        assert_eq!(format_amount(&DecimalAmount::ZERO, 4), "0");
        assert_eq!(format_number("0", 4), "0");
        assert_eq!(format_number("invalid", 4), "0");
    }

    #[test]
    fn test_format_balance() {
        assert_eq!(format_balance("1234.5678", "ETH", 4), "1,234.5678 ETH");
        assert_eq!(format_balance("0.5", "BTC", 8), "0.5 BTC");
    }
}
