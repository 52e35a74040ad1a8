//! Formula Expression Engine
//!
//! Parses, validates and evaluates small spreadsheet-style formulas over
//! tabular records, e.g. `RATIO(SUM(income), SUM(balance)) * 100`.
//!
//! # Pipeline
//!
//! ```text
//! Expression String
//!      |
//!   Lexer -> Tokens
//!      |
//!   Parser -> AST
//!      |
//!      +-- Validator -> ValidationReport (types, names, arity)
//!      |
//!      +-- Evaluator (records + schema) -> Evaluation
//! ```
//!
//! # Example
//!
//! ```rust
//! use tally_formula::{Engine, FieldDefinition, FieldSchema, FieldType, Record, Value};
//!
//! let schema = FieldSchema::new(vec![FieldDefinition::new("amount", FieldType::Numeric)]).unwrap();
//! let records = vec![
//!     Record::new().with("amount", 10.0),
//!     Record::new().with("amount", 30.0),
//! ];
//!
//! let engine = Engine::new();
//! assert!(engine.validate("AVG(amount)", &schema).valid);
//! let result = engine.evaluate("AVG(amount)", &records, &schema).unwrap();
//! assert_eq!(result.value, Value::Number(20.0));
//! ```

pub mod ast;
mod builtins;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod schema;
pub mod token;
pub mod types;
pub mod validator;
pub mod value;

// Re-export main types
pub use ast::{AstNode, BinaryOperator};
pub use engine::{CaseFallback, Engine, EngineOptions};
pub use error::{Error, Result, RuntimeError, RuntimeErrorKind};
pub use evaluator::{Evaluation, Invocation};
pub use functions::{
    ArgKind, ArgLayout, FunctionCategory, FunctionRegistry, FunctionSignature, RegistryBuilder,
    ReturnType,
};
pub use lexer::tokenize;
pub use token::{Token, TokenType};
pub use parser::{parse, MAX_TREE_DEPTH};
pub use schema::{records_from_json, FieldDefinition, FieldSchema, FieldType, Record};
pub use types::ValueType;
pub use validator::ValidationReport;
pub use value::Value;
