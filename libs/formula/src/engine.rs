//! Formula engine facade
//!
//! Ties the pipeline together: text → tokens → AST → validation / evaluation.
//! Parsed expressions are kept in an LRU cache keyed by the expression text.

use crate::ast::AstNode;
use crate::error::{Error, Result};
use crate::evaluator::{Evaluation, Evaluator};
use crate::functions::{FunctionRegistry, FunctionSignature};
use crate::parser;
use crate::schema::{FieldSchema, Record};
use crate::validator::{self, ValidationReport};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// What CASE returns when no condition matched and no default was given
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseFallback {
    #[default]
    Error,
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// AST depth above which validation warns
    pub max_nesting_depth: usize,
    /// Parsed-expression cache size; 0 disables caching
    pub cache_capacity: usize,
    /// Upper bound on records per evaluation
    pub max_records: Option<usize>,
    pub case_fallback: CaseFallback,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: 10,
            cache_capacity: 256,
            max_records: None,
            case_fallback: CaseFallback::Error,
        }
    }
}

/// Formula engine
///
/// Holds no per-evaluation state; a single engine can be shared between
/// threads behind an `Arc`.
pub struct Engine {
    function_registry: Arc<FunctionRegistry>,
    options: EngineOptions,
    cache: Option<Mutex<LruCache<String, Arc<AstNode>>>>,
}

impl Engine {
    /// Engine with default options and the global function registry
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self::with_registry(FunctionRegistry::global(), options)
    }

    /// Engine over a specific registry, e.g. one with custom functions
    pub fn with_registry(function_registry: Arc<FunctionRegistry>, options: EngineOptions) -> Self {
        let cache = NonZeroUsize::new(options.cache_capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        Self {
            function_registry,
            options,
            cache,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.function_registry
    }

    /// Parse an expression, reusing a cached AST when available
    pub fn parse(&self, expression: &str) -> Result<Arc<AstNode>> {
        if let Some(cache) = &self.cache {
            let mut cache = cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(ast) = cache.get(expression) {
                tracing::trace!(expression, "parse cache hit");
                return Ok(Arc::clone(ast));
            }
        }

        let ast = Arc::new(parser::parse(expression)?);
        tracing::debug!(expression, depth = ast.depth(), "parsed expression");

        if let Some(cache) = &self.cache {
            let mut cache = cache.lock().unwrap_or_else(|e| e.into_inner());
            cache.put(expression.to_string(), Arc::clone(&ast));
        }
        Ok(ast)
    }

    /// Check an expression against a schema without evaluating it.
    ///
    /// Never fails: lex and parse errors come back as an invalid report with
    /// a single error.
    pub fn validate(&self, expression: &str, schema: &FieldSchema) -> ValidationReport {
        match self.parse(expression) {
            Ok(ast) => validator::validate(
                &ast,
                schema,
                &self.function_registry,
                self.options.max_nesting_depth,
            ),
            Err(err) => {
                tracing::debug!(expression, error = %err, "expression does not parse");
                ValidationReport::from_error(&err)
            }
        }
    }

    /// Evaluate an expression over a record set
    pub fn evaluate(&self, expression: &str, records: &[Record], schema: &FieldSchema) -> Result<Evaluation> {
        let ast = self.parse(expression)?;
        let evaluation = Evaluator::new(&self.function_registry, schema, records, &self.options)
            .evaluate(&ast)
            .map_err(|err| {
                tracing::debug!(expression, error = %err, "evaluation failed");
                Error::from(err)
            })?;

        for warning in &evaluation.warnings {
            tracing::warn!(expression, "{}", warning);
        }
        Ok(evaluation)
    }

    /// Dry run: evaluate against `sample`, or against a single record of zero
    /// values built from the schema when the sample is missing or empty.
    pub fn test(&self, expression: &str, sample: Option<&[Record]>, schema: &FieldSchema) -> Result<Evaluation> {
        match sample {
            Some(records) if !records.is_empty() => self.evaluate(expression, records, schema),
            _ => {
                let zeroed = [Record::zeroed(schema)];
                self.evaluate(expression, &zeroed, schema)
            }
        }
    }

    /// All registered functions, sorted by name
    pub fn list_functions(&self) -> Vec<FunctionSignature> {
        self.function_registry.list()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDefinition, FieldType};
    use crate::value::Value;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_engine_is_send_and_sync() {
        assert_send_sync::<Engine>();
    }

    #[test]
    fn test_parse_cache_returns_same_ast() {
        let engine = Engine::new();
        let a = engine.parse("1 + 2").unwrap();
        let b = engine.parse("1 + 2").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_cache_disabled_with_zero_capacity() {
        let engine = Engine::with_options(EngineOptions {
            cache_capacity: 0,
            ..EngineOptions::default()
        });
        let a = engine.parse("1 + 2").unwrap();
        let b = engine.parse("1 + 2").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_dry_run_uses_zero_values() {
        let schema = FieldSchema::new(vec![FieldDefinition::new("amount", FieldType::Numeric)]).unwrap();
        let result = Engine::new().test("amount + 1", None, &schema).unwrap();
        assert_eq!(result.value, Value::Number(1.0));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: EngineOptions = serde_json::from_str(r#"{"case_fallback": "null"}"#).unwrap();
        assert_eq!(options.case_fallback, CaseFallback::Null);
        assert_eq!(options.max_nesting_depth, 10);
        assert_eq!(options.cache_capacity, 256);
    }
}
