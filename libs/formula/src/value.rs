//! Runtime values produced and consumed by the evaluator

use crate::error::{Error, Result};
use crate::schema::FieldType;
use crate::types::ValueType;
use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use std::fmt;

/// A formula value. Dates are calendar days.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
    Null,
}

impl Value {
    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Number(_) => ValueType::Number,
            Value::Text(_) => ValueType::Text,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Date(_) => ValueType::Date,
            Value::Null => ValueType::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Zero value for a field type, used to synthesize sample records.
    pub fn zero_for(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Numeric => Value::Number(0.0),
            FieldType::Text => Value::Text(String::new()),
            FieldType::Boolean => Value::Boolean(false),
            FieldType::Date => Value::Date(NaiveDate::default()),
        }
    }

    /// Convert a JSON value into the declared field type.
    ///
    /// JSON `null` becomes `Value::Null` for every type.
    pub fn from_json(json: &serde_json::Value, field_type: FieldType) -> Result<Self> {
        use serde_json::Value as Json;

        let mismatch = || {
            Error::Schema(format!(
                "expected {} value, got {}",
                field_type.name(),
                json
            ))
        };

        match (field_type, json) {
            (_, Json::Null) => Ok(Value::Null),
            (FieldType::Numeric, Json::Number(n)) => n.as_f64().map(Value::Number).ok_or_else(mismatch),
            (FieldType::Numeric, Json::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Value::Number)
                .map_err(|_| mismatch()),
            (FieldType::Text, Json::String(s)) => Ok(Value::Text(s.clone())),
            (FieldType::Text, Json::Number(n)) => Ok(Value::Text(n.to_string())),
            (FieldType::Boolean, Json::Bool(b)) => Ok(Value::Boolean(*b)),
            (FieldType::Date, Json::String(s)) => parse_date(s).map(Value::Date).ok_or_else(mismatch),
            _ => Err(mismatch()),
        }
    }
}

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp into a calendar day.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "\"{}\"", s),
            Value::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Null => f.write_str("NULL"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_follows_field_type() {
        assert_eq!(
            Value::from_json(&json!(12.5), FieldType::Numeric).unwrap(),
            Value::Number(12.5)
        );
        assert_eq!(
            Value::from_json(&json!("7"), FieldType::Numeric).unwrap(),
            Value::Number(7.0)
        );
        assert_eq!(
            Value::from_json(&json!("2024-03-31"), FieldType::Date).unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap())
        );
        assert_eq!(
            Value::from_json(&json!("2024-03-31T10:00:00Z"), FieldType::Date).unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap())
        );
        assert_eq!(
            Value::from_json(&json!(null), FieldType::Boolean).unwrap(),
            Value::Null
        );
        assert!(Value::from_json(&json!("yes"), FieldType::Boolean).is_err());
    }

    #[test]
    fn test_serializes_untagged() {
        let values = vec![
            Value::Number(1.5),
            Value::text("a"),
            Value::Boolean(true),
            Value::Date(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()),
            Value::Null,
        ];
        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(json, json!([1.5, "a", true, "2023-01-02", null]));
    }
}
