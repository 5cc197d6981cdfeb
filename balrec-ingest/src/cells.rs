//! Permissive cell parsers. Both return `None` for anything they cannot read;
//! callers decide what to do with such rows.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use rust_decimal::Decimal;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

fn iso_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})(?:[T ].*)?$").expect("iso date regex")
    })
}

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})([-/.])(\d{1,2})([-/.])(\d{4}|\d{2})(?:[T ].*)?$")
            .expect("numeric date regex")
    })
}

fn day_month_name_re() -> &'static Regex {
    // 03 Apr 2024, 3-Apr-2024, 3 April, 2024
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})[\s-]+([A-Za-z]{3,9})\.?[\s,-]+(\d{4}|\d{2})$")
            .expect("day-month-name regex")
    })
}

fn month_name_day_re() -> &'static Regex {
    // Apr 3, 2024 / April 3 2024
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z]{3,9})\.?[\s-]+(\d{1,2})(?:st|nd|rd|th)?[\s,-]+(\d{4})$")
            .expect("month-name-day regex")
    })
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+\.?\d*|\.\d+)$").expect("number regex"))
}

fn currency_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{3}\s*").expect("currency code regex"))
}

fn month_from_name(name: &str) -> Option<u32> {
    let name = name.to_ascii_lowercase();
    if name.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|full| *full == name || full.starts_with(name.as_str()))
        .map(|i| i as u32 + 1)
}

/// Two-digit years land within 50 years of `this_year`, the window
/// dateutil applies.
fn window_year(yy: i32, this_year: i32) -> i32 {
    let year = this_year - this_year.rem_euclid(100) + yy;
    if year >= this_year + 50 {
        year - 100
    } else if year < this_year - 50 {
        year + 100
    } else {
        year
    }
}

fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    Some(match raw.len() {
        2 => window_year(year, Utc::now().year()),
        _ => year,
    })
}

/// Parse a statement date.
///
/// Year-first forms (`2024-04-03`) are unambiguous. For `03/04/2024`-style
/// text, `dayfirst` picks DD/MM as the first reading; the other order is only
/// used when the first is not a real date (e.g. `04/25/2024`). Trailing time
/// components are ignored.
pub fn parse_date(raw: &str, dayfirst: bool) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = iso_re().captures(s) {
        let y: i32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let d: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    if let Some(caps) = numeric_re().captures(s) {
        // 01/02-2024 is not a date
        if caps[2] != caps[4] {
            return None;
        }
        let a: u32 = caps[1].parse().ok()?;
        let b: u32 = caps[3].parse().ok()?;
        let y = expand_year(&caps[5])?;
        let (first, second) = if dayfirst { ((b, a), (a, b)) } else { ((a, b), (b, a)) };
        return NaiveDate::from_ymd_opt(y, first.0, first.1)
            .or_else(|| NaiveDate::from_ymd_opt(y, second.0, second.1));
    }

    if let Some(caps) = day_month_name_re().captures(s) {
        let d: u32 = caps[1].parse().ok()?;
        let m = month_from_name(&caps[2])?;
        let y = expand_year(&caps[3])?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    if let Some(caps) = month_name_day_re().captures(s) {
        let m = month_from_name(&caps[1])?;
        let d: u32 = caps[2].parse().ok()?;
        let y: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    None
}

/// Case-insensitive suffix strip, e.g. the `Cr` in `1,500.00 Cr`
fn strip_marker<'a>(s: &'a str, marker: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(marker.len())?;
    if !s.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = s.split_at(split);
    tail.eq_ignore_ascii_case(marker).then(|| head.trim_end())
}

/// Parse a closing balance as printed on a statement.
///
/// Accepts thousands separators, a leading currency symbol or ISO code,
/// `+`/`-` signs, accounting parentheses for negatives and a trailing
/// `CR`/`DR` marker (`DR` is negative).
pub fn parse_balance(raw: &str) -> Option<Decimal> {
    let mut s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let mut negative = false;

    if let Some(head) = strip_marker(s, "DR") {
        negative = !negative;
        s = head;
    } else if let Some(head) = strip_marker(s, "CR") {
        s = head;
    }

    if let Some(inner) = s.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        negative = !negative;
        s = inner.trim();
    }

    // Sign and currency may come in either order: -$12.00, $-12.00, USD -12
    loop {
        if let Some(rest) = s.strip_prefix('-') {
            negative = !negative;
            s = rest.trim_start();
        } else if let Some(rest) = s.strip_prefix('+') {
            s = rest.trim_start();
        } else if let Some(rest) = s.strip_prefix(['$', '€', '£', '₹', '¥']) {
            s = rest.trim_start();
        } else if let Some(m) = currency_code_re().find(s) {
            s = &s[m.end()..];
        } else {
            break;
        }
    }

    let mut digits: String = s.chars().filter(|c| *c != ',').collect();
    if !number_re().is_match(&digits) {
        return None;
    }
    if digits.starts_with('.') {
        digits.insert(0, '0');
    }

    let value = Decimal::from_str(&digits).ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_ambiguous_date_is_day_first() {
        assert_eq!(parse_date("03/04/2024", true), Some(d(2024, 4, 3)));
        assert_eq!(parse_date("03/04/2024", false), Some(d(2024, 3, 4)));
    }

    #[test]
    fn test_falls_back_when_day_first_is_impossible() {
        assert_eq!(parse_date("04/25/2024", true), Some(d(2024, 4, 25)));
        assert_eq!(parse_date("25/04/2024", false), Some(d(2024, 4, 25)));
    }

    #[test]
    fn test_iso_and_separators() {
        assert_eq!(parse_date("2024-04-03", true), Some(d(2024, 4, 3)));
        assert_eq!(parse_date("2024/4/3", true), Some(d(2024, 4, 3)));
        assert_eq!(parse_date("2024-04-03 00:00:00", true), Some(d(2024, 4, 3)));
        assert_eq!(parse_date("2024-04-03T10:15:00Z", true), Some(d(2024, 4, 3)));
        assert_eq!(parse_date("03-04-2024", true), Some(d(2024, 4, 3)));
        assert_eq!(parse_date("03.04.2024", true), Some(d(2024, 4, 3)));
        assert_eq!(parse_date(" 03/04/24 ", true), Some(d(2024, 4, 3)));
        assert_eq!(parse_date("01/02/99", true), Some(d(1999, 2, 1)));
    }

    #[test]
    fn test_two_digit_year_window() {
        assert_eq!(window_year(69, 2026), 2069);
        assert_eq!(window_year(75, 2026), 2075);
        assert_eq!(window_year(76, 2026), 1976);
        assert_eq!(window_year(99, 2026), 1999);
        assert_eq!(window_year(0, 2026), 2000);
        assert_eq!(window_year(10, 2075), 2110);
        assert_eq!(window_year(25, 2075), 2025);
        assert_eq!(window_year(24, 2075), 2124);
    }

    #[test]
    fn test_month_names() {
        assert_eq!(parse_date("03 Apr 2024", true), Some(d(2024, 4, 3)));
        assert_eq!(parse_date("3-Apr-2024", true), Some(d(2024, 4, 3)));
        assert_eq!(parse_date("3 April, 2024", true), Some(d(2024, 4, 3)));
        assert_eq!(parse_date("03-Sept-24", true), Some(d(2024, 9, 3)));
        assert_eq!(parse_date("Apr 3, 2024", true), Some(d(2024, 4, 3)));
        assert_eq!(parse_date("April 3rd 2024", true), Some(d(2024, 4, 3)));
    }

    #[test]
    fn test_invalid_dates() {
        for raw in ["", "   ", "Opening Balance", "31/02/2024", "13/13/2024", "01/02-2024", "2024-13-01", "Total"] {
            assert_eq!(parse_date(raw, true), None, "{raw:?} should not parse");
        }
    }

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_balance("100"), Some(Decimal::from(100)));
        assert_eq!(parse_balance(" 1234.50 "), Some(Decimal::new(123450, 2)));
        assert_eq!(parse_balance("-7.25"), Some(Decimal::new(-725, 2)));
        assert_eq!(parse_balance(".5"), Some(Decimal::new(5, 1)));
    }

    #[test]
    fn test_formatted_numbers() {
        assert_eq!(parse_balance("1,234,567.89"), Some(Decimal::new(123456789, 2)));
        assert_eq!(parse_balance("$1,000.00"), Some(Decimal::from(1000)));
        assert_eq!(parse_balance("-$12.00"), Some(Decimal::from(-12)));
        assert_eq!(parse_balance("₹ 5,00,000"), Some(Decimal::from(500000)));
        assert_eq!(parse_balance("USD 42"), Some(Decimal::from(42)));
        assert_eq!(parse_balance("(250.00)"), Some(Decimal::from(-250)));
        assert_eq!(parse_balance("1,500.00 Cr"), Some(Decimal::from(1500)));
        assert_eq!(parse_balance("1,500.00 DR"), Some(Decimal::from(-1500)));
    }

    #[test]
    fn test_non_numeric_balances() {
        for raw in ["", "NaN", "-", "n/a", "Closing", "12abc", "1.2.3", "$", "()"] {
            assert_eq!(parse_balance(raw), None, "{raw:?} should not parse");
        }
    }
}
