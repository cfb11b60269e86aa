// Utility helpers for parsing and number formatting.
//
// This module centralizes the forgiving CSV/number/date handling so the
// rest of the code can assume clean, typed values.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters (this also rejects
///   `NaN`, which pandas writes for missing numbers in some exports).
/// - Strips thousands separators like `","` before parsing.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok()
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Purchase timestamps come as `YYYY-MM-DD HH:MM:SS`, occasionally with a
/// `T` separator, or as a bare date (read as midnight).
pub fn parse_timestamp_safe(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| parse_date_safe(Some(s)).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimal places plus `en` thousands separators (`1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

pub fn format_currency(n: f64) -> String {
    format!("US ${}", format_number(n, 2))
}

/// Whole days, truncated, or the no-data marker.
pub fn format_days(days: Option<f64>) -> String {
    match days {
        Some(d) => format!("{} days", d.trunc() as i64),
        None => "No data available".to_string(),
    }
}
