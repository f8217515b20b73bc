//! Block explorer links.
//!
//! Both helpers return an empty string when no explorer is configured, so
//! callers can render "no link" without a branch.

fn join(base: Option<&str>, kind: &str, tail: &str) -> String {
    match base.map(|b| b.trim().trim_end_matches('/')) {
        Some(base) if !base.is_empty() => format!("{base}/{kind}/{tail}"),
        _ => String::new(),
    }
}

/// `{base}/tx/{reference}`.
#[must_use]
pub fn tx_url(reference: &str, base: Option<&str>) -> String {
    join(base, "tx", reference)
}

/// `{base}/address/{address}`.
#[must_use]
pub fn address_url(address: &str, base: Option<&str>) -> String {
    join(base, "address", address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_url() {
        assert_eq!(
            tx_url("0x1234567890abcdef", Some("https://etherscan.io")),
            "https://etherscan.io/tx/0x1234567890abcdef"
        );
        assert_eq!(
            tx_url("0xab", Some("https://etherscan.io/")),
            "https://etherscan.io/tx/0xab"
        );
    }

    #[test]
    fn test_address_url() {
        let address = "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0";
        assert_eq!(
            address_url(address, Some("https://etherscan.io")),
            format!("https://etherscan.io/address/{address}")
        );
    }

    #[test]
    fn test_no_explorer() {
        assert_eq!(tx_url("0x123", None), "");
        assert_eq!(address_url("0x123", Some("")), "");
    }
}
