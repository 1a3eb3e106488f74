//! Formatting helpers for elapsed time and money.

/// `HH:MM:SS`, truncating fractional seconds. Hours are not wrapped.
pub fn format_hms(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Symbol-prefixed amount with thousands separators, e.g. `$1,234.50`.
pub fn format_currency(amount: f64, symbol: &str, decimals: u32) -> String {
    let decimals = decimals.min(8) as usize;
    let fixed = format!("{:.*}", decimals, amount.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}{symbol}{grouped}.{frac}"),
        None => format!("{sign}{symbol}{grouped}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hms_formats_and_truncates() {
        assert_eq!(format_hms(0.0), "00:00:00");
        assert_eq!(format_hms(59.9), "00:00:59");
        assert_eq!(format_hms(3723.0), "01:02:03");
        assert_eq!(format_hms(100.0 * 3600.0), "100:00:00");
        assert_eq!(format_hms(-5.0), "00:00:00");
    }

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(0.0, "$", 2), "$0.00");
        assert_eq!(format_currency(10.0, "$", 2), "$10.00");
        assert_eq!(format_currency(1234.5, "$", 2), "$1,234.50");
        assert_eq!(format_currency(1_234_567.891, "€", 2), "€1,234,567.89");
        assert_eq!(format_currency(999.0, "$", 0), "$999");
        assert_eq!(format_currency(-12.3, "$", 2), "-$12.30");
    }
}
