// src/coerce/number.rs

use once_cell::sync::Lazy;
use regex::Regex;

/// Plain decimal notation: optional sign, digits with an optional fraction, optional exponent.
static DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("decimal pattern compiles")
});

/// Parse a trimmed cell as `f64`. `None` for anything that is not standard decimal
/// notation, including `inf`/`NaN` spellings that `str::parse` would accept.
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if !DECIMAL.is_match(s) {
        return None;
    }
    s.parse::<f64>().ok()
}
