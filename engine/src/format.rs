//! Money formatting.
//!
//! Amounts render in whole units with ru-RU digit grouping and a `BYN`
//! suffix. Prices are free text ("negotiable", "on request"), so any value
//! that does not start with a number is shown exactly as entered.

const CURRENCY: &str = "BYN";
const GROUP_SEPARATOR: char = '\u{a0}';

/// Parse the longest numeric prefix of `s` (sign, digits, optional fraction).
fn leading_number(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    s[..end].parse().ok()
}

fn group_digits(integer: u64) -> String {
    let digits = integer.to_string();
    // ru-RU leaves four-digit numbers ungrouped.
    if digits.len() < 5 {
        return digits;
    }
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(ch);
    }
    out
}

/// Format a numeric amount.
pub fn format_amount(amount: f64, show_currency: bool) -> String {
    let rounded = amount.round();
    let mut body = group_digits(rounded.abs() as u64);
    if rounded < 0.0 {
        body.insert(0, '-');
    }
    if show_currency {
        format!("{body} {CURRENCY}")
    } else {
        body
    }
}

/// Format a money value given as text.
///
/// Whitespace is ignored and `,` is accepted as the decimal separator. Text
/// that does not parse as a number is returned verbatim (trimmed); empty
/// input formats as zero.
pub fn format_currency(raw: &str, show_currency: bool) -> String {
    let text = raw.trim();
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    match leading_number(&compact.replacen(',', ".", 1)) {
        Some(value) => format_amount(value, show_currency),
        None if !text.is_empty() => text.to_string(),
        None => format_amount(0.0, show_currency),
    }
}

/// Extract a whole amount from free-form input, `0` when there is none.
pub fn parse_currency(raw: &str) -> i64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    leading_number(&cleaned.replacen(',', ".", 1))
        .map(|v| v.round() as i64)
        .unwrap_or(0)
}
