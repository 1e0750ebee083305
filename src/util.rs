// Utility helpers for parsing and number formatting.
//
// This module centralizes all the "dirty" cell handling so the rest of the
// code can assume clean, typed values.
use crate::types::Cell;
use chrono::{Datelike, NaiveDate};
use num_format::{Locale, ToFormattedString};
use once_cell::sync::Lazy;
use regex::Regex;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\D)(\d{4})(?:\D|$)").unwrap());
static GROUPED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").unwrap());

/// Parse a cell into `f64` while being forgiving about formatting issues
/// that are common in spreadsheet exports (commas, spaces, text).
///
/// - Numeric cells pass through.
/// - Text is trimmed, and rejected if it contains alphabetic characters.
/// - Commas are accepted only as thousands separators (`12,345.6`);
///   decimal commas like `1,5` or `1.234,56` are `None`.
/// - Anything else is `None`.
pub fn parse_f64_safe(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if s.chars().any(|c| c.is_alphabetic()) {
                return None;
            }
            if s.contains(',') && !GROUPED_RE.is_match(s) {
                return None;
            }
            let s = s.replace(',', "");
            s.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

/// Activation year from a cell.
///
/// Integral numbers are taken as-is. Dates give their calendar year. Text
/// that is a plain number follows the numeric rule; other text yields its
/// first standalone run of four digits, which recovers values like
/// `"Año 2019"`.
pub fn parse_year(cell: &Cell) -> Option<i32> {
    match cell {
        Cell::Number(n) => integral_year(*n),
        Cell::Date(d) => Some(d.year()),
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(n) = s.parse::<f64>() {
                return integral_year(n);
            }
            YEAR_RE
                .captures(s)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<i32>().ok())
        }
        Cell::Empty => None,
    }
}

fn integral_year(n: f64) -> Option<i32> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= i32::MAX as f64 {
        Some(n as i32)
    } else {
        None
    }
}

/// Spreadsheet serial day number to a calendar date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial.trunc() as i64))
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let mut res = group_digits(int_part);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    // Avoid "-0.00" for values that round to zero.
    let rounds_to_zero = s.chars().all(|c| c == '0' || c == '.');
    if n.is_sign_negative() && !rounds_to_zero {
        format!("-{}", res)
    } else {
        res
    }
}

/// Insert `,` every three digits from the right of a run of ASCII digits.
fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
