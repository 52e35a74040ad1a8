//! Static validation of formula expressions
//!
//! Walks the AST once, inferring a [`ValueType`] for every node and collecting
//! every problem it finds instead of stopping at the first one. Nothing is
//! evaluated; a valid report does not guarantee that evaluation succeeds
//! (division by a field that holds zero, missing required values, ...).

use crate::ast::{AstNode, BinaryOperator};
use crate::error::Error;
use crate::functions::{ArgKind, FunctionRegistry, FunctionSignature, ReturnType};
use crate::schema::{FieldSchema, FieldType};
use crate::types::ValueType;
use serde::Serialize;

pub const DEEP_NESTING_WARNING: &str = "Expression is deeply nested and may be hard to maintain";
pub const DIVISION_BY_ZERO_WARNING: &str = "Possible division by zero";
pub const EMPTY_SCHEMA_WARNING: &str = "Schema has no fields";

/// Outcome of validating one expression
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Statically inferred result type, when it can be determined
    pub return_type: Option<ValueType>,
}

impl ValidationReport {
    /// Report for an expression that failed to lex or parse
    pub fn from_error(error: &Error) -> Self {
        Self {
            valid: false,
            errors: vec![error.to_string()],
            warnings: Vec::new(),
            return_type: None,
        }
    }
}

/// Validate a parsed expression against a schema
pub fn validate(
    ast: &AstNode,
    schema: &FieldSchema,
    registry: &FunctionRegistry,
    max_nesting_depth: usize,
) -> ValidationReport {
    let mut run = ValidationRun {
        schema,
        registry,
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    run.check_schema_names();
    if schema.is_empty() && !ast.field_refs().is_empty() {
        run.warnings.push(EMPTY_SCHEMA_WARNING.to_string());
    }
    let inferred = run.infer(ast);

    let depth = ast.depth();
    if depth > max_nesting_depth {
        run.warnings.push(DEEP_NESTING_WARNING.to_string());
    }

    let valid = run.errors.is_empty();
    tracing::debug!(
        valid,
        errors = run.errors.len(),
        warnings = run.warnings.len(),
        depth,
        "validated expression"
    );

    ValidationReport {
        valid,
        errors: run.errors,
        warnings: run.warnings,
        return_type: (valid && inferred.is_known()).then_some(inferred),
    }
}

struct ValidationRun<'a> {
    schema: &'a FieldSchema,
    registry: &'a FunctionRegistry,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationRun<'_> {
    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warn_once(&mut self, message: &str) {
        if !self.warnings.iter().any(|w| w == message) {
            self.warnings.push(message.to_string());
        }
    }

    /// A field named like a function cannot be told apart from it in `NAME(...)`
    fn check_schema_names(&mut self) {
        for field in self.schema.iter() {
            if let Some(sig) = self.registry.lookup(&field.name) {
                let message = format!(
                    "Field name '{}' collides with function {}",
                    field.name, sig.name
                );
                self.error(message);
            }
        }
    }

    fn infer(&mut self, node: &AstNode) -> ValueType {
        match node {
            AstNode::Literal { value } => value.value_type(),
            AstNode::FieldRef { name } => match self.schema.get(name) {
                Some(field) => field.field_type.value_type(),
                None => {
                    self.error(format!("Unknown field: {}", name));
                    ValueType::Unknown
                }
            },
            AstNode::Negate { operand } => {
                let ty = self.infer(operand);
                if ty.is_known() && ty != ValueType::Number {
                    self.error(format!("Cannot negate {}", ty));
                }
                ValueType::Number
            }
            AstNode::BinaryOp { op, left, right } => {
                let left_type = self.infer(left);
                let right_type = self.infer(right);
                if *op == BinaryOperator::Divide && right.is_literal_zero() {
                    self.warn_once(DIVISION_BY_ZERO_WARNING);
                }
                self.binary_type(*op, left_type, right_type)
            }
            AstNode::FunctionCall { name, args } => self.call_type(name, args),
            AstNode::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition_type = self.infer(condition);
                if condition_type.is_known() && condition_type != ValueType::Boolean {
                    self.error(format!("IF condition must be boolean, got {}", condition_type));
                }
                let then_type = self.infer(then_branch);
                let else_type = self.infer(else_branch);
                self.unify_branches("IF", &[then_type, else_type])
            }
        }
    }

    fn binary_type(&mut self, op: BinaryOperator, left: ValueType, right: ValueType) -> ValueType {
        use ValueType::*;

        let unknown = !left.is_known() || !right.is_known();
        if op.is_comparison() {
            let comparable = match (left, right) {
                (Number, Number) | (Text, Text) | (Date, Date) => true,
                (Boolean, Boolean) => op == BinaryOperator::Equal,
                _ => unknown,
            };
            if !comparable {
                self.operand_error(op, left, right);
            }
            return Boolean;
        }

        match (op, left, right) {
            (_, Number, Number) => Number,
            (BinaryOperator::Add, Text, Text) => Text,
            // Text + <unknown> can still be a concatenation
            (BinaryOperator::Add, Text, Unknown) | (BinaryOperator::Add, Unknown, Text) => Text,
            (BinaryOperator::Add, Unknown, Unknown) => Unknown,
            (_, Number, Unknown) | (_, Unknown, Number) | (_, Unknown, Unknown) => Number,
            _ => {
                self.operand_error(op, left, right);
                Unknown
            }
        }
    }

    fn operand_error(&mut self, op: BinaryOperator, left: ValueType, right: ValueType) {
        self.error(format!(
            "Operator '{}' cannot be applied to {} and {}",
            op, left, right
        ));
    }

    fn call_type(&mut self, name: &str, args: &[AstNode]) -> ValueType {
        let signature = match self.registry.lookup(name) {
            Some(sig) => *sig,
            None => {
                self.error(format!("Unknown function: {}", name));
                for arg in args {
                    self.infer(arg);
                }
                return ValueType::Unknown;
            }
        };

        if !signature.accepts_arg_count(args.len()) {
            self.error(signature.arity_message(args.len()));
        }

        if let Some(index) = signature.denominator {
            if args.get(index).is_some_and(AstNode::is_literal_zero) {
                self.warn_once(DIVISION_BY_ZERO_WARNING);
            }
        }

        let mut branch_types = Vec::new();
        for (i, arg) in args.iter().enumerate() {
            let kind = signature.arg_kind(i, args.len());
            let ty = self.check_arg(&signature, i, kind, arg);
            if kind == ArgKind::Any {
                branch_types.push(ty);
            }
        }

        match signature.return_type {
            ReturnType::Fixed(ty) => ty,
            ReturnType::Branches => self.unify_branches(signature.name, &branch_types),
        }
    }

    fn check_arg(
        &mut self,
        signature: &FunctionSignature,
        index: usize,
        kind: ArgKind,
        arg: &AstNode,
    ) -> ValueType {
        if kind.is_field() {
            let AstNode::FieldRef { name } = arg else {
                self.error(format!(
                    "{} only operates on a raw field, got expression {}",
                    signature.name, arg
                ));
                return self.infer(arg);
            };

            let Some(field) = self.schema.get(name) else {
                self.error(format!("Unknown field: {}", name));
                return ValueType::Unknown;
            };
            if kind == ArgKind::NumericField && field.field_type != FieldType::Numeric {
                self.error(format!(
                    "{} requires a numeric field, but '{}' is {}",
                    signature.name,
                    name,
                    field.field_type.name()
                ));
            }
            return field.field_type.value_type();
        }

        let ty = self.infer(arg);
        if let Some(expected) = kind.expected_type() {
            if !ty.agrees_with(expected) {
                self.error(format!(
                    "{} argument {} must be {}, got {}",
                    signature.name,
                    index + 1,
                    expected,
                    ty
                ));
            }
        }
        ty
    }

    /// Common type of conditional branches; unknown branches are ignored
    fn unify_branches(&mut self, name: &str, types: &[ValueType]) -> ValueType {
        let mut known = types.iter().copied().filter(|t| t.is_known());
        let Some(first) = known.next() else {
            return ValueType::Unknown;
        };
        if let Some(other) = known.find(|t| *t != first) {
            self.error(format!(
                "{} branches must have the same type, got {} and {}",
                name, first, other
            ));
            return ValueType::Unknown;
        }
        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::schema::FieldDefinition;

    fn check(expr: &str) -> ValidationReport {
        let schema = FieldSchema::new(vec![
            FieldDefinition::new("amount", FieldType::Numeric),
            FieldDefinition::new("label", FieldType::Text),
        ])
        .unwrap();
        validate(
            &parse(expr).unwrap(),
            &schema,
            &FunctionRegistry::with_builtins(),
            10,
        )
    }

    #[test]
    fn test_collects_all_errors() {
        let report = check("SUM(nope) + FOO(amount) + missing");
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec![
                "Unknown field: nope".to_string(),
                "Unknown function: FOO".to_string(),
                "Unknown field: missing".to_string(),
            ]
        );
        assert_eq!(report.return_type, None);
    }

    #[test]
    fn test_infers_return_type() {
        assert_eq!(check("amount > 1").return_type, Some(ValueType::Boolean));
        assert_eq!(check("label + \"x\"").return_type, Some(ValueType::Text));
        assert_eq!(check("IF(amount > 1, 1, 2)").return_type, Some(ValueType::Number));
    }

    #[test]
    fn test_aggregate_requires_raw_field() {
        let report = check("SUM(amount * 2)");
        assert_eq!(
            report.errors,
            vec!["SUM only operates on a raw field, got expression (amount * 2)".to_string()]
        );
    }

    #[test]
    fn test_literal_zero_denominator_warns() {
        let report = check("amount / 0 + RATIO(amount, 0)");
        assert!(report.valid);
        assert_eq!(report.warnings, vec![DIVISION_BY_ZERO_WARNING.to_string()]);
    }
}
