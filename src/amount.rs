//! Exact money and share-quantity values.
//!
//! Amounts are `rust_decimal::Decimal`s so no float ever touches the books.
//! The sqlite schema stores each value as a (numerator, denominator) integer
//! pair, so conversions in both directions live here.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{BooksError, Result};

/// Parse a user-entered amount. Thousands separators are allowed; fractions
/// of cents are not.
pub fn parse_amount(value: &str) -> Result<Decimal> {
    let cleaned = value.replace(',', "");
    let amount = Decimal::from_str(&cleaned)
        .map_err(|_| BooksError::InvalidAmount(format!("invalid value \"{value}\"")))?;
    let amount = amount.normalize();
    if amount.scale() > 2 {
        return Err(BooksError::InvalidAmount(format!(
            "no fractions of cents allowed: {value}"
        )));
    }
    Ok(amount)
}

/// Parse a share quantity: any exact decimal value.
pub fn parse_quantity(value: &str) -> Result<Decimal> {
    let cleaned = value.replace(',', "");
    Decimal::from_str(&cleaned)
        .map_err(|_| BooksError::InvalidQuantity(format!("invalid value \"{value}\"")))
        .map(|q| q.normalize())
}

/// Decompose a decimal into the integer pair stored in sqlite. The
/// denominator is always a power of ten.
pub fn to_fraction(value: Decimal) -> Result<(i64, i64)> {
    let value = value.normalize();
    let numerator = i64::try_from(value.mantissa())
        .map_err(|_| BooksError::InvalidAmount(format!("value out of range: {value}")))?;
    let denominator = 10i64
        .checked_pow(value.scale())
        .ok_or_else(|| BooksError::InvalidAmount(format!("value out of range: {value}")))?;
    Ok((numerator, denominator))
}

/// Rebuild a decimal from a stored integer pair.
pub fn from_fraction(numerator: i64, denominator: i64) -> Result<Decimal> {
    if denominator == 0 {
        return Err(BooksError::InvalidAmount(
            "zero denominator in stored value".to_string(),
        ));
    }
    Ok((Decimal::from(numerator) / Decimal::from(denominator)).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("123").unwrap(), Decimal::from(123));
        assert_eq!(parse_amount("12.34").unwrap(), Decimal::from_str("12.34").unwrap());
        assert_eq!(parse_amount("1,234.56").unwrap(), Decimal::from_str("1234.56").unwrap());
        assert_eq!(parse_amount("10.").unwrap(), Decimal::from(10));
        assert_eq!(parse_amount("-45").unwrap(), Decimal::from(-45));
    }

    #[test]
    fn test_parse_amount_trailing_zeros_ok() {
        // 10.500 normalizes to scale 1
        assert_eq!(parse_amount("10.500").unwrap(), Decimal::from_str("10.5").unwrap());
    }

    #[test]
    fn test_parse_amount_rejects_sub_cent() {
        assert!(parse_amount("123.456").is_err());
        assert!(parse_amount("0.001").is_err());
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(parse_amount("ten dollars").is_err());
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn test_parse_quantity_allows_any_scale() {
        assert_eq!(
            parse_quantity("1.2345").unwrap(),
            Decimal::from_str("1.2345").unwrap()
        );
    }

    #[test]
    fn test_fraction_round_trip() {
        for s in ["0", "1", "-1", "12.34", "-12.34", "100000.05", "3.7"] {
            let d = Decimal::from_str(s).unwrap();
            let (num, den) = to_fraction(d).unwrap();
            assert_eq!(from_fraction(num, den).unwrap(), d.normalize(), "{s}");
        }
    }

    #[test]
    fn test_to_fraction_values() {
        assert_eq!(to_fraction(Decimal::from_str("12.34").unwrap()).unwrap(), (1234, 100));
        assert_eq!(to_fraction(Decimal::from(5)).unwrap(), (5, 1));
        assert_eq!(to_fraction(Decimal::from_str("-0.5").unwrap()).unwrap(), (-5, 10));
    }

    #[test]
    fn test_from_fraction_non_decimal_denominator() {
        // 1/2 is representable even though we never write it ourselves
        assert_eq!(from_fraction(1, 2).unwrap(), Decimal::from_str("0.5").unwrap());
        assert!(from_fraction(1, 0).is_err());
    }
}
