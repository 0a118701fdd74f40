//! Money amount parsing and formatting.

use rust_decimal::Decimal;
use std::str::FromStr;

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '₹'];

/// Parse a bare amount such as `1,234.56`, `$500` or `-20.00`.
///
/// Thousands separators (commas) are stripped. Anything else that is not a
/// digit, a single decimal point or a leading sign makes the value malformed.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let cleaned = unsigned
        .trim_start_matches(CURRENCY_SYMBOLS)
        .replace(',', "");

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }

    let value = Decimal::from_str(&cleaned).ok()?;
    Some(if negative { -value } else { value })
}

/// Format an amount with comma thousands separators and two decimals.
pub fn format_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.abs());
    let (integer_part, decimal_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(*c);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    format!("{}{}.{}", sign, formatted, decimal_part)
}
