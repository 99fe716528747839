//! Formatting utilities for CLI output.

/// Format an integer count with comma grouping.
///
/// # Examples
///
/// ```
/// use cs_cli_common::format_number;
///
/// assert_eq!(format_number(0), "0");
/// assert_eq!(format_number(1234), "1,234");
/// assert_eq!(format_number(1234567), "1,234,567");
/// ```
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }

    out
}

/// Format a monthly USD cost with a dollar sign, comma grouping and two
/// decimal places.
///
/// # Examples
///
/// ```
/// use cs_cli_common::format_cost;
///
/// assert_eq!(format_cost(0.0), "$0.00");
/// assert_eq!(format_cost(8.5), "$8.50");
/// assert_eq!(format_cost(1234.567), "$1,234.57");
/// ```
pub fn format_cost(cost: f64) -> String {
    let rounded = (cost * 100.0).round() / 100.0;
    let whole = rounded.trunc() as u64;
    let cents = ((rounded - rounded.trunc()) * 100.0).round() as u64;
    format!("${}.{:02}", format_number(whole), cents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1), "1");
        assert_eq!(format_number(123), "123");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(12345), "12,345");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(1234567890), "1,234,567,890");
    }

    #[test]
    fn test_format_cost() {
        assert_eq!(format_cost(0.0), "$0.00");
        assert_eq!(format_cost(3.6), "$3.60");
        assert_eq!(format_cost(45.0), "$45.00");
        assert_eq!(format_cost(1234.567), "$1,234.57");
        assert_eq!(format_cost(1_000_000.0), "$1,000,000.00");
    }

    #[test]
    fn test_format_cost_rounds_cents_up_to_next_dollar() {
        assert_eq!(format_cost(9.999), "$10.00");
    }
}
