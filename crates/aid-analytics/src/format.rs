//! Display formatting and derived KPI metrics.

const BILLION: f64 = 1_000_000_000.0;
const MILLION: f64 = 1_000_000.0;

/// Shown when a ratio has no defined value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Compact dollar figure: `$2.50B`, `$1.20M`, otherwise `$750,000.00`.
#[must_use]
pub fn format_large_number(value: f64) -> String {
    if value >= BILLION {
        format!("${:.2}B", value / BILLION)
    } else if value >= MILLION {
        format!("${:.2}M", value / MILLION)
    } else {
        format_currency(value)
    }
}

/// Dollar amount with thousands separators and two decimals.
#[must_use]
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("${sign}{}.{cents}", group_thousands(whole))
}

/// Whole count with thousands separators. Fractions are rounded.
#[must_use]
pub fn format_count(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}{}", group_thousands(&digits))
}

/// `subgroup / total`, or `None` when the total is zero.
#[must_use]
pub fn percentage_of_total(subgroup: f64, total: f64) -> Option<f64> {
    if total == 0.0 {
        None
    } else {
        Some(subgroup / total)
    }
}

/// Ratio as a percentage with two decimals (`0.25` -> `25.00%`).
#[must_use]
pub fn format_percent(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| NOT_AVAILABLE.to_string(), |r| format!("{:.2}%", r * 100.0))
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

    #[test]
    fn test_large_number_suffixes() {
        assert_eq!(format_large_number(2_500_000_000.0), "$2.50B");
        assert_eq!(format_large_number(1_000_000_000.0), "$1.00B");
        assert_eq!(format_large_number(3_750_000.0), "$3.75M");
        assert_eq!(format_large_number(750_000.0), "$750,000.00");
        assert_eq!(format_large_number(0.0), "$0.00");
    }

    #[test]
    fn test_currency_grouping() {
        assert_eq!(format_currency(999.5), "$999.50");
        assert_eq!(format_currency(1_234.567), "$1,234.57");
        assert_eq!(format_currency(-1_234.5), "$-1,234.50");
        assert_eq!(format_currency(123_456.0), "$123,456.00");
    }

    #[test]
    fn test_count_grouping() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(12_345.0), "12,345");
        assert_eq!(format_count(1_000_000.0), "1,000,000");
        assert_eq!(format_count(-4_200.0), "-4,200");
    }

    #[test]
    fn test_percentage_of_total() {
        assert_eq!(percentage_of_total(50.0, 200.0), Some(0.25));
        assert_eq!(format_percent(percentage_of_total(50.0, 200.0)), "25.00%");
        assert_eq!(percentage_of_total(5.0, 0.0), None);
        assert_eq!(format_percent(None), NOT_AVAILABLE);
    }
}
