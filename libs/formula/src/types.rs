//! Static types for formula expressions
//!
//! `ValueType` is shared by runtime values (via `Value::value_type`) and by the
//! validator, which infers a type for every AST node without evaluating it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of a value or an expression.
///
/// Note: `Unknown` means "not statically known" (unknown field, polymorphic
/// function result, or an operand that already produced an error), not `Null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Unknown,
    Null,
    Number,
    Text,
    Boolean,
    Date,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Unknown => "unknown",
            ValueType::Null => "null",
            ValueType::Number => "number",
            ValueType::Text => "text",
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
        }
    }

    pub fn is_known(self) -> bool {
        self != ValueType::Unknown
    }

    /// Two types agree when they are equal or either one is not statically known.
    pub fn agrees_with(self, other: ValueType) -> bool {
        !self.is_known() || !other.is_known() || self == other
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
