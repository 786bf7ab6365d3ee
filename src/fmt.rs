use rust_decimal::Decimal;

/// Format an amount with thousands separators and two decimal places: 1,234.56
pub fn amount_display(val: Decimal) -> String {
    let negative = val.is_sign_negative() && !val.is_zero();
    let abs = val.abs();
    let cents = format!("{:.2}", abs);
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((&cents, "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-{with_commas}.{dec_part}")
    } else {
        format!("{with_commas}.{dec_part}")
    }
}

/// Share quantities display with their natural precision.
pub fn quantity_display(val: Decimal) -> String {
    val.normalize().to_string()
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_amount_display() {
        assert_eq!(amount_display(Decimal::from_str("1234.56").unwrap()), "1,234.56");
        assert_eq!(amount_display(Decimal::from_str("-500").unwrap()), "-500.00");
        assert_eq!(amount_display(Decimal::ZERO), "0.00");
        assert_eq!(amount_display(Decimal::from_str("1000000.99").unwrap()), "1,000,000.99");
        assert_eq!(amount_display(Decimal::from_str("42.1").unwrap()), "42.10");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_quantity_display() {
        assert_eq!(quantity_display(Decimal::from_str("1.2345").unwrap()), "1.2345");
        assert_eq!(quantity_display(Decimal::from_str("10.500").unwrap()), "10.5");
        assert_eq!(quantity_display(Decimal::from(7)), "7");
    }
}
