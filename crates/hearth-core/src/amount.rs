//! Decimal amounts
//!
//! Balances are arbitrary-precision decimals. The log carries them as
//! strings; [`parse_amount`] is the single place that decides what counts as
//! a valid amount.

use std::str::FromStr;

pub use bigdecimal::BigDecimal;

/// Parse a decimal amount from the log.
///
/// Returns `None` for empty strings and anything `BigDecimal` rejects.
/// Signs are accepted as-is; whether a negative amount is allowed is an
/// upstream authorization question.
pub fn parse_amount(raw: &str) -> Option<BigDecimal> {
    if raw.is_empty() {
        return None;
    }
    BigDecimal::from_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_amounts() {
        assert_eq!(parse_amount("10"), Some(BigDecimal::from(10)));
        assert_eq!(
            parse_amount("0.15"),
            Some(BigDecimal::from_str("0.15").unwrap())
        );
        assert_eq!(parse_amount("5.00"), Some(BigDecimal::from(5)));
    }

    #[test]
    fn test_parse_invalid_amounts() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("ten"), None);
        assert_eq!(parse_amount("1.2.3"), None);
    }

    #[test]
    fn test_arbitrary_precision() {
        let a = parse_amount("0.1").unwrap();
        let b = parse_amount("0.2").unwrap();
        assert_eq!(a + b, parse_amount("0.3").unwrap());
    }
}
