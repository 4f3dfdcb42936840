//! Lenient score handling.
//!
//! Evaluators are backed by language models and do not always emit a clean
//! number: scores show up as numbers, numeric strings, or ranges such as
//! `"90-100"`. Everything is normalized into `[0, 100]` here so that callers
//! only ever see an `f64` in range.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Parses a textual score. For a range like `"90-100"` the upper bound wins.
/// A `-` only separates a range when both sides are numbers, so exponents
/// such as `"1e-5"` and negative values parse as plain numbers.
pub fn parse_score_text(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let range_upper = raw.split_once('-').and_then(|(low, high)| {
        let low = parse_finite(low)?;
        let high = parse_finite(high)?;
        Some(low.max(high))
    });
    range_upper.or_else(|| parse_finite(raw))
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Clamps a score into `[0, 100]`. Non-finite input becomes `0`.
pub fn clamp_score(value: f64) -> f64 {
    if !value.is_finite() {
        warn!(value, "non-finite score replaced with 0");
        return MIN_SCORE;
    }
    if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
        warn!(value, "score outside 0..=100 clamped");
    }
    value.clamp(MIN_SCORE, MAX_SCORE)
}

pub fn score_from_value(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_score_text(text),
        _ => None,
    };
    match parsed {
        Some(score) => clamp_score(score),
        None => {
            warn!(raw = %value, "unparseable score replaced with 0");
            MIN_SCORE
        }
    }
}

/// `deserialize_with` adapter accepting any JSON value for a score field.
pub fn deserialize_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(score_from_value(&value))
}

pub fn deserialize_optional_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(value) => Some(score_from_value(&value)),
    })
}

#[cfg(test)]
#[path = "tests/score_tests.rs"]
mod tests;
