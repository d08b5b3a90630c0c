//! Numeric input coercion
//!
//! Every value typed by a user or read from a fixture passes through here
//! before it reaches a store. The lenient form never fails and maps anything
//! unusable to the supplied default; the strict form tells empty input apart
//! from text that is not a number.

use serde::{Deserialize, Deserializer};

use crate::error::{AnalysisError, Result};

/// Parse a user-entered amount, falling back to `default` when the input is
/// empty, not a number, or not finite.
///
/// Thousands separators, a leading `$` and surrounding whitespace are
/// accepted, so `"$1,250.50"` parses as `1250.5`.
pub fn parse_number_or_default(input: &str, default: f64) -> f64 {
    parse_number_strict(input).unwrap_or(default)
}

/// Parse a user-entered amount, reporting why it could not be used.
pub fn parse_number_strict(input: &str) -> Result<f64> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '$')
        .collect();

    if cleaned.is_empty() {
        return Err(AnalysisError::EmptyNumber);
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(AnalysisError::InvalidNumber(input.to_string())),
    }
}

/// Replace NaN and infinities with zero so they never reach a derivation.
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Coerce a JSON value into a number (numbers pass through, strings are
/// parsed leniently, everything else becomes zero).
pub fn number_from_json(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => sanitize(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => parse_number_or_default(s, 0.0),
        _ => 0.0,
    }
}

/// `deserialize_with` helper for numeric fixture fields that may arrive as
/// numbers or strings
pub fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(number_from_json(&value))
}
