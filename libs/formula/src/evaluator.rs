//! Tree-walking evaluator
//!
//! Scalar field references read the first record of the set. Aggregate and
//! statistical functions read the whole set through [`Invocation`].
//! Function arguments are evaluated on demand, which gives IF, CASE, AND and
//! OR their short-circuit behaviour.

use crate::ast::{AstNode, BinaryOperator};
use crate::engine::EngineOptions;
use crate::error::{RuntimeError, RuntimeErrorKind, RuntimeResult};
use crate::functions::FunctionRegistry;
use crate::parser::MAX_TREE_DEPTH;
use crate::schema::{FieldDefinition, FieldSchema, FieldType, Record};
use crate::types::ValueType;
use crate::value::Value;
use chrono::NaiveDate;
use serde::Serialize;
use std::cell::RefCell;
use std::cmp::Ordering;

// Parsed trees never exceed this; the check covers hand-built ASTs
const MAX_RECURSION_DEPTH: usize = MAX_TREE_DEPTH;

/// Result of a successful evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub value: Value,
    pub value_type: ValueType,
    /// Non-fatal notes raised by functions, e.g. GROWTH_RATE on a single record
    pub warnings: Vec<String>,
}

/// Evaluates one AST against one record set
pub struct Evaluator<'a> {
    registry: &'a FunctionRegistry,
    schema: &'a FieldSchema,
    records: &'a [Record],
    options: &'a EngineOptions,
    warnings: RefCell<Vec<String>>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        registry: &'a FunctionRegistry,
        schema: &'a FieldSchema,
        records: &'a [Record],
        options: &'a EngineOptions,
    ) -> Self {
        Self {
            registry,
            schema,
            records,
            options,
            warnings: RefCell::new(Vec::new()),
        }
    }

    /// Evaluate `ast`. The record set must be non-empty and within
    /// `max_records` when that limit is set.
    pub fn evaluate(self, ast: &AstNode) -> RuntimeResult<Evaluation> {
        if self.records.is_empty() {
            return Err(RuntimeError::new(
                RuntimeErrorKind::EmptyRecordSet,
                "cannot evaluate against an empty record set",
            ));
        }
        if let Some(limit) = self.options.max_records {
            if self.records.len() > limit {
                tracing::warn!(records = self.records.len(), limit, "record limit exceeded");
                return Err(RuntimeError::new(
                    RuntimeErrorKind::RecordLimitExceeded,
                    format!(
                        "{} records exceed the configured limit of {}",
                        self.records.len(),
                        limit
                    ),
                ));
            }
        }

        let value = self.eval_node(ast, 0)?;
        Ok(Evaluation {
            value_type: value.value_type(),
            value,
            warnings: self.warnings.into_inner(),
        })
    }

    fn eval_node(&self, node: &AstNode, depth: usize) -> RuntimeResult<Value> {
        if depth > MAX_RECURSION_DEPTH {
            return Err(RuntimeError::invalid_argument(format!(
                "Expression too deeply nested (max depth: {})",
                MAX_RECURSION_DEPTH
            )));
        }

        match node {
            AstNode::Literal { value } => Ok(value.clone()),
            AstNode::FieldRef { name } => self.field_value(name),
            AstNode::Negate { operand } => match self.eval_node(operand, depth + 1)? {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(RuntimeError::type_mismatch(format!(
                    "cannot negate {}",
                    other.value_type()
                ))),
            },
            AstNode::BinaryOp { op, left, right } => {
                let left = self.eval_node(left, depth + 1)?;
                let right = self.eval_node(right, depth + 1)?;
                apply_binary(*op, left, right)
            }
            AstNode::FunctionCall { name, args } => self.call_function(name, args, depth),
            AstNode::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                let branch = match self.eval_node(condition, depth + 1)? {
                    Value::Boolean(true) => then_branch,
                    Value::Boolean(false) => else_branch,
                    other => {
                        return Err(RuntimeError::type_mismatch(format!(
                            "IF condition must be boolean, got {}",
                            other.value_type()
                        )))
                    }
                };
                self.eval_node(branch, depth + 1)
            }
        }
    }

    fn field_definition(&self, name: &str) -> RuntimeResult<&'a FieldDefinition> {
        self.schema.get(name).ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorKind::UnknownField,
                format!("Unknown field: {}", name),
            )
        })
    }

    /// Scalar read from the first record
    fn field_value(&self, name: &str) -> RuntimeResult<Value> {
        let field = self.field_definition(name)?;
        match self.records.first().and_then(|r| r.get(name)) {
            Some(value) => Ok(value.clone()),
            None if field.required => Err(RuntimeError::new(
                RuntimeErrorKind::MissingValue,
                format!("required field '{}' has no value", name),
            )),
            None => Ok(Value::Null),
        }
    }

    fn call_function(&self, name: &str, args: &[AstNode], depth: usize) -> RuntimeResult<Value> {
        let signature = self.registry.lookup(name).ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorKind::UnknownFunction,
                format!("Unknown function: {}", name),
            )
        })?;

        if !signature.accepts_arg_count(args.len()) {
            return Err(RuntimeError::invalid_argument(
                signature.arity_message(args.len()),
            ));
        }

        tracing::trace!(function = signature.name, args = args.len(), "calling function");
        let invocation = Invocation {
            evaluator: self,
            name: signature.name,
            args,
            depth: depth + 1,
        };
        (signature.evaluate)(&invocation)
    }
}

/// Arguments and context handed to a function body
pub struct Invocation<'a> {
    evaluator: &'a Evaluator<'a>,
    name: &'static str,
    args: &'a [AstNode],
    depth: usize,
}

impl<'a> Invocation<'a> {
    /// Canonical (upper-case) name of the function being called
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    pub fn records(&self) -> &'a [Record] {
        self.evaluator.records
    }

    pub fn options(&self) -> &'a EngineOptions {
        self.evaluator.options
    }

    /// Record a non-fatal warning on the evaluation result
    pub fn warn(&self, message: impl Into<String>) {
        self.evaluator.warnings.borrow_mut().push(message.into());
    }

    fn node(&self, index: usize) -> RuntimeResult<&'a AstNode> {
        self.args.get(index).ok_or_else(|| {
            RuntimeError::invalid_argument(format!(
                "{} has no argument {}",
                self.name,
                index + 1
            ))
        })
    }

    /// Evaluate argument `index` in scalar context
    pub fn arg(&self, index: usize) -> RuntimeResult<Value> {
        let node = self.node(index)?;
        self.evaluator.eval_node(node, self.depth)
    }

    fn mismatch(&self, index: usize, expected: ValueType, got: &Value) -> RuntimeError {
        RuntimeError::type_mismatch(format!(
            "{} argument {} must be {}, got {}",
            self.name,
            index + 1,
            expected,
            got.value_type()
        ))
    }

    pub fn number_arg(&self, index: usize) -> RuntimeResult<f64> {
        match self.arg(index)? {
            Value::Number(n) => Ok(n),
            other => Err(self.mismatch(index, ValueType::Number, &other)),
        }
    }

    pub fn bool_arg(&self, index: usize) -> RuntimeResult<bool> {
        match self.arg(index)? {
            Value::Boolean(b) => Ok(b),
            other => Err(self.mismatch(index, ValueType::Boolean, &other)),
        }
    }

    pub fn text_arg(&self, index: usize) -> RuntimeResult<String> {
        match self.arg(index)? {
            Value::Text(s) => Ok(s),
            other => Err(self.mismatch(index, ValueType::Text, &other)),
        }
    }

    pub fn date_arg(&self, index: usize) -> RuntimeResult<NaiveDate> {
        match self.arg(index)? {
            Value::Date(d) => Ok(d),
            other => Err(self.mismatch(index, ValueType::Date, &other)),
        }
    }

    /// Argument `index` as a bare reference to a declared field
    pub fn field_arg(&self, index: usize) -> RuntimeResult<&'a FieldDefinition> {
        match self.node(index)? {
            AstNode::FieldRef { name } => self.evaluator.field_definition(name),
            other => Err(RuntimeError::invalid_argument(format!(
                "{} only operates on a raw field, got {}",
                self.name, other
            ))),
        }
    }

    /// Values of numeric field argument `index` across all records, in
    /// record order. Missing values read as 0.
    pub fn numeric_column(&self, index: usize) -> RuntimeResult<Vec<f64>> {
        let field = self.field_arg(index)?;
        if field.field_type != FieldType::Numeric {
            return Err(RuntimeError::type_mismatch(format!(
                "{} requires a numeric field, but '{}' is {}",
                self.name,
                field.name,
                field.field_type.name()
            )));
        }

        self.records()
            .iter()
            .map(|record| match record.get(&field.name) {
                None => Ok(0.0),
                Some(Value::Number(n)) => Ok(*n),
                Some(other) => Err(RuntimeError::type_mismatch(format!(
                    "field '{}' holds {} in a record, expected number",
                    field.name,
                    other.value_type()
                ))),
            })
            .collect()
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn apply_binary(op: BinaryOperator, left: Value, right: Value) -> RuntimeResult<Value> {
    use BinaryOperator::*;

    match (op, &left, &right) {
        (Add, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Subtract, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
        (Multiply, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
        (Divide, Value::Number(_), Value::Number(b)) if *b == 0.0 => {
            Err(RuntimeError::division_by_zero("division by zero in '/'"))
        }
        (Divide, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
        (Add, Value::Text(a), Value::Text(b)) => Ok(Value::Text(format!("{}{}", a, b))),
        (Equal, Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(a == b)),
        (op, l, r) if op.is_comparison() => match compare(l, r) {
            Some(ordering) => Ok(Value::Boolean(match op {
                Equal => ordering == Ordering::Equal,
                GreaterThan => ordering == Ordering::Greater,
                LessThan => ordering == Ordering::Less,
                GreaterThanOrEqual => ordering != Ordering::Less,
                LessThanOrEqual => ordering != Ordering::Greater,
                Add | Subtract | Multiply | Divide => false,
            })),
            // NaN compares false rather than failing
            None if l.value_type() == r.value_type() && l.value_type() == ValueType::Number => {
                Ok(Value::Boolean(false))
            }
            None => Err(operand_mismatch(op, l, r)),
        },
        (op, l, r) => Err(operand_mismatch(op, l, r)),
    }
}

fn operand_mismatch(op: BinaryOperator, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::type_mismatch(format!(
        "Operator '{}' cannot be applied to {} and {}",
        op,
        left.value_type(),
        right.value_type()
    ))
}
