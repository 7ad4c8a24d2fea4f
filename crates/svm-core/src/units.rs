//! Component values with SI prefixes.
//!
//! Netlist values read and printed here use the same prefix set, so a value
//! printed by [`format_value`] is accepted again by [`parse_value`]. Prefixes
//! are case-insensitive on input, which makes `M` milli and `MEG` mega.

/// Input prefixes. `MEG` comes before `G` so the longer match wins.
const PREFIXES: &[(&str, f64)] = &[
    ("MEG", 1e6),
    ("T", 1e12),
    ("G", 1e9),
    ("K", 1e3),
    ("M", 1e-3),
    ("U", 1e-6),
    ("N", 1e-9),
    ("P", 1e-12),
    ("F", 1e-15),
];

/// Output scales, largest first.
const SCALES: &[(f64, &str)] = &[
    (1e12, "T"),
    (1e9, "G"),
    (1e6, "MEG"),
    (1e3, "k"),
    (1.0, ""),
    (1e-3, "m"),
    (1e-6, "u"),
    (1e-9, "n"),
    (1e-12, "p"),
    (1e-15, "f"),
];

/// Parse a value such as `10`, `4,7k`, `10e-6` or `2.2MEG`.
///
/// A comma is read as the decimal point. Returns `None` for anything that is
/// not a number followed by at most one known prefix.
pub fn parse_value(text: &str) -> Option<f64> {
    let text = text.trim().replace(',', ".").to_ascii_uppercase();
    if text.is_empty() {
        return None;
    }
    if let Ok(v) = text.parse::<f64>() {
        return Some(v);
    }

    PREFIXES.iter().find_map(|&(prefix, scale)| {
        let mantissa = text.strip_suffix(prefix)?;
        mantissa.parse::<f64>().ok().map(|v| v * scale)
    })
}

/// Four decimals and the largest prefix not exceeding `value`.
pub fn format_value(value: f64) -> String {
    let magnitude = value.abs();
    match SCALES.iter().find(|&&(scale, _)| magnitude >= scale) {
        Some(&(scale, prefix)) if value.is_finite() => format!("{:.4}{prefix}", value / scale),
        _ => format!("{value:.4e}"),
    }
}

/// Scientific notation with `decimals` mantissa digits and a signed exponent,
/// e.g. `1.0E+5` or `-2.5E-3`.
pub fn format_exponent(value: f64, decimals: usize) -> String {
    let formatted = format!("{value:.decimals$e}");
    match formatted.split_once('e') {
        Some((mantissa, exp)) if exp.starts_with('-') => format!("{mantissa}E{exp}"),
        Some((mantissa, exp)) => format!("{mantissa}E+{exp}"),
        None => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: Option<f64>, expected: f64) -> bool {
        actual.is_some_and(|v| (v - expected).abs() <= expected.abs() * 1e-12)
    }

    #[test]
    fn test_netlist_values() {
        assert_eq!(parse_value("10"), Some(10.0));
        assert_eq!(parse_value(" -0.5 "), Some(-0.5));
        assert_eq!(parse_value("10e-6"), Some(10e-6));
        assert_eq!(parse_value("0,001"), Some(0.001));
        assert!(close(parse_value("4,7k"), 4700.0));
        assert!(close(parse_value("5p"), 5e-12));
        assert!(close(parse_value("1m"), 1e-3));
        assert!(close(parse_value("2.2MEG"), 2.2e6));
        assert!(close(parse_value("1meg"), 1e6));
    }

    #[test]
    fn test_rejects_unknown_suffix() {
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("k"), None);
        assert_eq!(parse_value("1MIL"), None);
        assert_eq!(parse_value("10uF"), None);
        assert_eq!(parse_value("abc"), None);
    }

    #[test]
    fn test_printed_values_parse_back() {
        let values = [
            0.0, 5.0, -12.0, 1e3, 2e6, 3.3e9, 4e12, 1e-3, 47e-6, 1e-9, 5e-12, 2e-15, 1e-18,
        ];
        for value in values {
            let text = format_value(value);
            let back = parse_value(&text).unwrap_or_else(|| panic!("{text} did not parse"));
            assert!(
                (back - value).abs() <= value.abs() * 1e-4,
                "{value} printed as {text}, read back as {back}"
            );
        }
    }

    #[test]
    fn test_mega_is_not_milli() {
        assert_eq!(format_value(2e6), "2.0000MEG");
        assert_eq!(format_value(2e-3), "2.0000m");
        assert_eq!(format_value(470.0), "470.0000");
    }

    #[test]
    fn test_format_exponent() {
        assert_eq!(format_exponent(1e5, 1), "1.0E+5");
        assert_eq!(format_exponent(-2.5e-3, 1), "-2.5E-3");
        assert_eq!(format_exponent(0.0, 2), "0.00E+0");
    }
}
