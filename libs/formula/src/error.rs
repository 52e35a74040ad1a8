//! Error types for the formula engine

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Formula engine errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Lex error at position {position}: {message}")]
    Lex { position: usize, message: String },

    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Error {
    pub fn lex(position: usize, message: impl Into<String>) -> Self {
        Error::Lex {
            position,
            message: message.into(),
        }
    }

    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            position,
            message: message.into(),
        }
    }

    /// Runtime failure carried by this error, if any
    pub fn as_runtime(&self) -> Option<&RuntimeError> {
        match self {
            Error::Runtime(err) => Some(err),
            _ => None,
        }
    }
}

/// Category of a failure raised while evaluating an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuntimeErrorKind {
    DivisionByZero,
    TypeMismatch,
    UnknownField,
    UnknownFunction,
    InvalidArgument,
    NoCaseMatched,
    MissingValue,
    EmptyRecordSet,
    RecordLimitExceeded,
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuntimeErrorKind::DivisionByZero => "Division by zero",
            RuntimeErrorKind::TypeMismatch => "Type mismatch",
            RuntimeErrorKind::UnknownField => "Unknown field",
            RuntimeErrorKind::UnknownFunction => "Unknown function",
            RuntimeErrorKind::InvalidArgument => "Invalid argument",
            RuntimeErrorKind::NoCaseMatched => "No case matched",
            RuntimeErrorKind::MissingValue => "Missing value",
            RuntimeErrorKind::EmptyRecordSet => "Empty record set",
            RuntimeErrorKind::RecordLimitExceeded => "Record limit exceeded",
        };
        f.write_str(name)
    }
}

/// Tagged evaluation failure: `{kind, message}`
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{kind}: {message}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn division_by_zero(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::DivisionByZero, message)
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::TypeMismatch, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::InvalidArgument, message)
    }
}

/// Result alias used inside the evaluator and function bodies
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_error_display_includes_kind() {
        let err = RuntimeError::division_by_zero("RATIO denominator is 0");
        assert_eq!(err.to_string(), "Division by zero: RATIO denominator is 0");

        let wrapped: Error = err.clone().into();
        assert_eq!(wrapped.as_runtime(), Some(&err));
    }

    #[test]
    fn positioned_errors_render_position() {
        let err = Error::lex(4, "Unexpected character: '$'");
        assert_eq!(err.to_string(), "Lex error at position 4: Unexpected character: '$'");
    }
}
