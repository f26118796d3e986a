//! Field-level validation primitives.
//!
//! Request bodies are inspected field by field so that a single response can
//! list every violated constraint instead of stopping at the first one.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// One violated constraint on one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Name of the offending field (`"body"` when the payload itself is malformed)
    pub field: String,
    /// Human-readable description of the violation
    pub message: String,
}

/// Input rejected before any derived value was computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Build an error from a single violation.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    /// All violations, in field declaration order.
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Names of the offending fields.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.field.as_str()).collect()
    }

    /// Whether `field` is among the offending fields.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid input")?;
        for (i, v) in self.violations.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{} {}", v.field, v.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Accumulates violations while a payload is being checked.
#[derive(Debug, Default)]
pub(crate) struct Violations(Vec<FieldViolation>);

impl Violations {
    pub(crate) fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldViolation {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Record the outcome of a field check, returning the value when it passed.
    pub(crate) fn check<T>(&mut self, field: &str, outcome: Result<T, String>) -> Option<T> {
        match outcome {
            Ok(v) => Some(v),
            Err(msg) => {
                self.push(field, msg);
                None
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn into_error(self) -> ValidationError {
        ValidationError { violations: self.0 }
    }
}

/// Interpret a payload as a JSON object.
pub(crate) fn as_object(value: &Value) -> Result<&Map<String, Value>, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::single("body", "expected a JSON object"))
}

/// Fetch a required field, recording a violation if it is absent or null.
pub(crate) fn required<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
    violations: &mut Violations,
) -> Option<&'a Value> {
    match obj.get(field) {
        None | Some(Value::Null) => {
            violations.push(field, "field required");
            None
        }
        Some(v) => Some(v),
    }
}

/// Fetch an optional field; explicit null counts as absent.
pub(crate) fn optional<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    obj.get(field).filter(|v| !v.is_null())
}

/// Integer from a JSON integer, an integral float or a numeric string.
pub(crate) fn parse_int(value: &Value) -> Result<i64, String> {
    const MSG: &str = "must be a valid integer";
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(f as i64)
                }
                _ => Err(MSG.to_string()),
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| MSG.to_string()),
        _ => Err(MSG.to_string()),
    }
}

/// Finite float from a JSON number or a numeric string.
pub(crate) fn parse_float(value: &Value) -> Result<f64, String> {
    const MSG: &str = "must be a valid number";
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) if f.is_finite() => Ok(f),
        _ => Err(MSG.to_string()),
    }
}

/// Tokens accepted as boolean input, compared case-insensitively after trimming.
pub const TRUE_TOKENS: [&str; 6] = ["true", "yes", "on", "y", "t", "1"];
pub const FALSE_TOKENS: [&str; 6] = ["false", "no", "off", "n", "f", "0"];

/// Boolean from a JSON bool, the integers 0/1, or one of the accepted tokens.
pub(crate) fn parse_bool(value: &Value) -> Result<bool, String> {
    const MSG: &str = "must be a boolean (true/false, yes/no, on/off, y/n, t/f, 1/0)";
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err(MSG.to_string()),
        },
        Value::String(s) => {
            let token = s.trim().to_ascii_lowercase();
            if TRUE_TOKENS.contains(&token.as_str()) {
                Ok(true)
            } else if FALSE_TOKENS.contains(&token.as_str()) {
                Ok(false)
            } else {
                Err(MSG.to_string())
            }
        }
        _ => Err(MSG.to_string()),
    }
}

/// String field; no coercion from other JSON types.
pub(crate) fn parse_string(value: &Value) -> Result<String, String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| "must be a string".to_string())
}

/// Age in whole years, exclusive of 0 and 120.
pub(crate) fn check_age(age: i64) -> Result<u32, String> {
    if age > 0 && age < 120 {
        Ok(age as u32)
    } else {
        Err("must be greater than 0 and less than 120".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_int_coercions() {
        assert_eq!(parse_int(&json!(29)), Ok(29));
        assert_eq!(parse_int(&json!(29.0)), Ok(29));
        assert_eq!(parse_int(&json!(" 29 ")), Ok(29));
        assert!(parse_int(&json!(29.5)).is_err());
        assert!(parse_int(&json!("twenty")).is_err());
        assert!(parse_int(&json!(true)).is_err());
    }

    #[test]
    fn test_parse_float_rejects_non_numeric() {
        assert_eq!(parse_float(&json!(1.72)), Ok(1.72));
        assert_eq!(parse_float(&json!("83")), Ok(83.0));
        assert!(parse_float(&json!("NaN")).is_err());
        assert!(parse_float(&json!([1.0])).is_err());
    }

    #[test]
    fn test_parse_bool_token_set() {
        for t in ["true", "YES", " on ", "y", "T", "1"] {
            assert_eq!(parse_bool(&json!(t)), Ok(true), "token {t:?}");
        }
        for t in ["false", "No", "OFF", "n", "f", "0"] {
            assert_eq!(parse_bool(&json!(t)), Ok(false), "token {t:?}");
        }
        assert_eq!(parse_bool(&json!(1)), Ok(true));
        assert_eq!(parse_bool(&json!(0)), Ok(false));
        assert!(parse_bool(&json!(2)).is_err());
        assert!(parse_bool(&json!("maybe")).is_err());
        assert!(parse_bool(&json!(0.5)).is_err());
    }

    #[test]
    fn test_check_age_bounds() {
        assert_eq!(check_age(1), Ok(1));
        assert_eq!(check_age(119), Ok(119));
        assert!(check_age(0).is_err());
        assert!(check_age(120).is_err());
        assert!(check_age(-4).is_err());
    }

    #[test]
    fn test_display_lists_every_violation() {
        let mut v = Violations::default();
        v.push("age", "must be > 0");
        v.push("city", "must not be empty");
        let err = v.into_error();
        assert_eq!(err.fields(), vec!["age", "city"]);
        assert_eq!(
            err.to_string(),
            "invalid input: age must be > 0; city must not be empty"
        );
    }
}
