use crate::table::Value;

/// Parses a finite number; anything else (including empty, `NaN`, `inf`) is `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numeric reading of a cell.
pub fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Text(s) => parse_number(s),
        Value::Integer(i) => Some(*i as f64),
        Value::Real(f) if f.is_finite() => Some(*f),
        _ => None,
    }
}

/// Whole number that fits in an `i64`.
pub fn as_whole(v: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

/// Barcode as a non-negative integer, 0 when missing or invalid.
pub fn barcode_of(value: &Value) -> i64 {
    let parsed = match value {
        Value::Text(s) => s
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| parse_number(s).and_then(as_whole)),
        Value::Integer(i) => Some(*i),
        Value::Real(f) => as_whole(*f),
        _ => None,
    };
    parsed.filter(|b| *b >= 0).unwrap_or(0)
}
