//! Total, side-effect free field coercions.
//!
//! Every function here maps bad input to `None`; nothing in this module can
//! fail or panic. `None` is stored as SQL `NULL` downstream.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

pub fn coerce_int(v: Option<&Value>) -> Option<i64> {
    match v? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate_f64)),
        Value::String(s) => parse_int_str(s),
        _ => None,
    }
}

pub fn coerce_float(v: Option<&Value>) -> Option<f64> {
    match v? {
        Value::Number(n) => n.as_f64().filter(|f| !f.is_nan()),
        Value::String(s) => parse_float_str(s),
        _ => None,
    }
}

pub fn coerce_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Normalizes `1984-12-30T00:00:00` style timestamps to `1984-12-30`.
/// Anything else that is non-empty text is passed through untouched.
pub fn coerce_date(v: Option<&Value>) -> Option<String> {
    let raw = coerce_text(v)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date().format("%Y-%m-%d").to_string());
    }
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(d.format("%Y-%m-%d").to_string());
    }
    Some(raw)
}

/// `"6-7"` -> `79`.
pub fn parse_height(raw: &str) -> Option<i64> {
    let (feet, inches) = raw.trim().split_once('-')?;
    if inches.contains('-') {
        return None;
    }
    let feet = feet.trim().parse::<i64>().ok().filter(|f| *f >= 0)?;
    let inches = inches.trim().parse::<i64>().ok().filter(|i| *i >= 0)?;
    feet.checked_mul(12)?.checked_add(inches)
}

pub fn coerce_height(v: Option<&Value>) -> Option<i64> {
    v?.as_str().and_then(parse_height)
}

fn parse_int_str(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }
    parse_float_str(trimmed).and_then(truncate_f64)
}

fn parse_float_str(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|f| !f.is_nan())
}

fn truncate_f64(f: f64) -> Option<i64> {
    if !f.is_finite() || f < i64::MIN as f64 || f > i64::MAX as f64 {
        return None;
    }
    Some(f.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn int_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_int(Some(&json!(42))), Some(42));
        assert_eq!(coerce_int(Some(&json!("42"))), Some(42));
        assert_eq!(coerce_int(Some(&json!(" 7 "))), Some(7));
        assert_eq!(coerce_int(Some(&json!(12.9))), Some(12));
        assert_eq!(coerce_int(Some(&json!("3.5"))), Some(3));
    }

    #[test]
    fn int_rejects_garbage() {
        assert_eq!(coerce_int(None), None);
        assert_eq!(coerce_int(Some(&Value::Null)), None);
        assert_eq!(coerce_int(Some(&json!(""))), None);
        assert_eq!(coerce_int(Some(&json!("abc"))), None);
        assert_eq!(coerce_int(Some(&json!("NaN"))), None);
        assert_eq!(coerce_int(Some(&json!("inf"))), None);
        assert_eq!(coerce_int(Some(&json!([1]))), None);
    }

    #[test]
    fn float_handles_nan_and_strings() {
        assert_eq!(coerce_float(Some(&json!("3.5"))), Some(3.5));
        assert_eq!(coerce_float(Some(&json!(0.512))), Some(0.512));
        assert_eq!(coerce_float(Some(&json!("NaN"))), None);
        assert_eq!(coerce_float(Some(&json!("nan"))), None);
        assert_eq!(coerce_float(Some(&json!(""))), None);
        assert_eq!(coerce_float(None), None);
    }

    #[test]
    fn height_parses_feet_dash_inches() {
        assert_eq!(parse_height("6-7"), Some(79));
        assert_eq!(parse_height("7-0"), Some(84));
        assert_eq!(parse_height(""), None);
        assert_eq!(parse_height("tall"), None);
        assert_eq!(parse_height("6-"), None);
        assert_eq!(parse_height("6-7-1"), None);
        assert_eq!(parse_height("999999999999999999-0"), None);
        assert_eq!(parse_height("6-9223372036854775807"), None);
        assert_eq!(coerce_height(Some(&json!(79))), None);
    }

    #[test]
    fn date_strips_midnight_time() {
        assert_eq!(
            coerce_date(Some(&json!("1984-12-30T00:00:00"))).as_deref(),
            Some("1984-12-30")
        );
        assert_eq!(coerce_date(Some(&json!("1984-12-30"))).as_deref(), Some("1984-12-30"));
        assert_eq!(coerce_date(Some(&json!("Dec 30"))).as_deref(), Some("Dec 30"));
        assert_eq!(coerce_date(Some(&json!("  "))), None);
    }
}
