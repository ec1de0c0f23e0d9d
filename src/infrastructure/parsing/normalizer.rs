//! Record normalization rules
//!
//! Price text in catalog feeds mixes locales ("1.299,90 TL", "$1,299.90",
//! "899"), so the separator roles are inferred per value.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::domain::product::ProductStatus;

static NUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d[\d.,]*").expect("number pattern is a valid regex"));

static INTEGER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+").expect("integer pattern is a valid regex"));

/// Amount and unit read from a price string
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPrice {
    pub amount: f64,
    /// Currency text found next to the number, as written
    pub unit: Option<String>,
}

/// Parse a price such as `1.299,90 TL`, `₺899`, `1,299.90 USD` or `45`.
///
/// Returns `None` when the text holds no number.
pub fn parse_price(text: &str) -> Option<ParsedPrice> {
    let number = NUMBER_PATTERN.find(text)?;
    let magnitude = parse_decimal(number.as_str().trim_end_matches(['.', ',']))?;

    let prefix = &text[..number.start()];
    let amount = if has_minus_sign(prefix) { -magnitude } else { magnitude };

    let rest = format!("{} {}", prefix, &text[number.end()..]);
    let unit = rest
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c == '+')
        .trim()
        .to_string();

    Some(ParsedPrice {
        amount,
        unit: (!unit.is_empty()).then_some(unit),
    })
}

/// `-5`, `- 5`, `-₺5` and `₺-5` are negative. A dash after words
/// (`Sale - 40`) is a separator, not a sign.
fn has_minus_sign(prefix: &str) -> bool {
    prefix.contains('-') && !prefix.chars().any(char::is_alphanumeric)
}

/// Interpret a digit run with `.`/`,` separators as a decimal number.
///
/// - both separators present: the later one is the decimal separator
/// - one kind present more than once: grouping separator
/// - one kind present once: grouping separator when followed by exactly
///   three digits and the integer part is non-zero, decimal otherwise
fn parse_decimal(raw: &str) -> Option<f64> {
    let last_dot = raw.rfind('.');
    let last_comma = raw.rfind(',');

    let decimal_separator = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
        (Some(_), None) => single_separator_role(raw, '.'),
        (None, Some(_)) => single_separator_role(raw, ','),
        (None, None) => None,
    };

    let normalized: String = raw
        .chars()
        .filter_map(|c| match c {
            '0'..='9' => Some(c),
            c if Some(c) == decimal_separator => Some('.'),
            _ => None,
        })
        .collect();

    normalized.parse::<f64>().ok()
}

/// `Some(sep)` when the lone separator kind acts as the decimal point
fn single_separator_role(raw: &str, sep: char) -> Option<char> {
    let occurrences = raw.matches(sep).count();
    if occurrences > 1 {
        return None;
    }

    let (int_part, frac_part) = raw.split_once(sep)?;
    let int_is_zero = int_part.chars().all(|c| c == '0');
    if frac_part.len() == 3 && !int_is_zero {
        None
    } else {
        Some(sep)
    }
}

/// Map currency symbols and local aliases onto ISO 4217 codes
pub fn normalize_currency(unit: &str) -> String {
    let trimmed = unit.trim();
    match trimmed.to_uppercase().as_str() {
        "TL" | "₺" | "TRL" | "YTL" => "TRY".to_string(),
        "$" | "US$" | "USD$" => "USD".to_string(),
        "€" | "EURO" => "EUR".to_string(),
        "£" => "GBP".to_string(),
        upper => upper.to_string(),
    }
}

/// Stock count from text like `12`, `12.0` or `7 adet`; anything else is 0.
/// Counts outside the `i64` range saturate.
pub fn parse_quantity(text: &str) -> i64 {
    let Some(m) = INTEGER_PATTERN.find(text) else {
        return 0;
    };
    let digits = m.as_str();

    digits.parse().unwrap_or_else(|_| {
        let saturated = if digits.starts_with('-') { i64::MIN } else { i64::MAX };
        warn!("Quantity {:?} is out of range; using {}", digits, saturated);
        saturated
    })
}

pub fn derive_status(quantity: i64) -> ProductStatus {
    ProductStatus::from_quantity(quantity)
}

/// First character upper-case, the rest lower-case
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Capitalize every word and collapse whitespace
pub fn title_case(text: &str) -> String {
    text.split_whitespace().map(capitalize).collect::<Vec<_>>().join(" ")
}

/// Split a multi-value field such as `Black, White / Navy`
pub fn split_list(text: &str) -> Vec<String> {
    text.split([',', '/', ';', '|'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Treat blank strings as absent
pub fn non_empty(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("899", 899.0)]
    #[case("899.90", 899.9)]
    #[case("899,90", 899.9)]
    #[case("1.299,90", 1299.9)]
    #[case("1,299.90", 1299.9)]
    #[case("1.299", 1299.0)]
    #[case("1,299", 1299.0)]
    #[case("0.125", 0.125)]
    #[case("1.234.567", 1_234_567.0)]
    #[case("12.5", 12.5)]
    #[case("100.", 100.0)]
    fn test_parse_price_amount(#[case] input: &str, #[case] expected: f64) {
        let parsed = parse_price(input).unwrap();
        assert!((parsed.amount - expected).abs() < 1e-9, "{input} -> {}", parsed.amount);
        assert_eq!(parsed.unit, None);
    }

    #[rstest]
    #[case("1.299,90 TL", 1299.9, "TL")]
    #[case("₺899", 899.0, "₺")]
    #[case("$ 45.50", 45.5, "$")]
    #[case("120 USD", 120.0, "USD")]
    fn test_parse_price_with_unit(#[case] input: &str, #[case] amount: f64, #[case] unit: &str) {
        let parsed = parse_price(input).unwrap();
        assert!((parsed.amount - amount).abs() < 1e-9);
        assert_eq!(parsed.unit.as_deref(), Some(unit));
    }

    #[rstest]
    #[case("-5", -5.0)]
    #[case("- 12,50 TL", -12.5)]
    #[case("-₺899", -899.0)]
    #[case("₺-899", -899.0)]
    #[case("Sale - 40", 40.0)]
    fn test_parse_price_sign(#[case] input: &str, #[case] expected: f64) {
        let parsed = parse_price(input).unwrap();
        assert!((parsed.amount - expected).abs() < 1e-9, "{input} -> {}", parsed.amount);
    }

    #[test]
    fn test_parse_price_without_number() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("call us"), None);
    }

    #[test]
    fn test_normalize_currency() {
        assert_eq!(normalize_currency("TL"), "TRY");
        assert_eq!(normalize_currency(" ₺ "), "TRY");
        assert_eq!(normalize_currency("$"), "USD");
        assert_eq!(normalize_currency("€"), "EUR");
        assert_eq!(normalize_currency("chf"), "CHF");
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("12"), 12);
        assert_eq!(parse_quantity(" 7 adet"), 7);
        assert_eq!(parse_quantity("3.0"), 3);
        assert_eq!(parse_quantity("-2"), -2);
        assert_eq!(parse_quantity(""), 0);
        assert_eq!(parse_quantity("out of stock"), 0);
        assert_eq!(parse_quantity("99999999999999999999"), i64::MAX);
        assert_eq!(parse_quantity("-99999999999999999999"), i64::MIN);
    }

    #[test]
    fn test_capitalization() {
        assert_eq!(capitalize("bLACK"), "Black");
        assert_eq!(capitalize("ürün"), "Ürün");
        assert_eq!(capitalize(""), "");
        assert_eq!(title_case("  basic   COTTON t-shirt "), "Basic Cotton T-shirt");
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("Black, White / Navy;; "), vec!["Black", "White", "Navy"]);
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn test_status_follows_quantity() {
        assert_eq!(derive_status(1), ProductStatus::Active);
        assert_eq!(derive_status(0), ProductStatus::Inactive);
    }

    proptest! {
        #[test]
        fn title_case_is_idempotent(text in "[a-zA-Z ]{0,40}") {
            let once = title_case(&text);
            prop_assert_eq!(title_case(&once), once);
        }

        #[test]
        fn whole_numbers_parse_exactly(n in 0u32..1_000_000) {
            let parsed = parse_price(&n.to_string()).unwrap();
            prop_assert_eq!(parsed.amount, f64::from(n));
        }

        #[test]
        fn two_decimal_prices_parse_in_both_locales(whole in 1u32..100_000, cents in 0u32..100) {
            let expected = f64::from(whole) + f64::from(cents) / 100.0;
            let dot = parse_price(&format!("{whole}.{cents:02}")).unwrap();
            let comma = parse_price(&format!("{whole},{cents:02}")).unwrap();
            prop_assert!((dot.amount - expected).abs() < 1e-6);
            prop_assert!((comma.amount - expected).abs() < 1e-6);
        }
    }
}
