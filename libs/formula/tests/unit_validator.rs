//! Unit tests for static validation

use tally_formula::validator::{DEEP_NESTING_WARNING, DIVISION_BY_ZERO_WARNING, EMPTY_SCHEMA_WARNING};
use tally_formula::{Engine, EngineOptions, FieldDefinition, FieldSchema, FieldType, ValidationReport, ValueType};

mod test_support;

fn validate(expr: &str) -> ValidationReport {
    test_support::engine().validate(expr, &test_support::schema())
}

fn assert_valid(expr: &str) {
    let report = validate(expr);
    assert!(report.valid, "{:?} should be valid: {:?}", expr, report.errors);
}

fn assert_error(expr: &str, expected: &str) {
    let report = validate(expr);
    assert!(!report.valid, "{:?} should be invalid", expr);
    assert!(
        report.errors.iter().any(|e| e.contains(expected)),
        "{:?}: expected an error containing {:?}, got {:?}",
        expr,
        expected,
        report.errors
    );
}

#[test]
fn test_valid_expressions() {
    assert_valid("1 + 2 * 3");
    assert_valid("RATIO(SUM(income), SUM(balance)) * 100");
    assert_valid("IF(amount > 100, \"large\", \"small\")");
    assert_valid("CASE(amount > 100, 3, amount > 10, 2, 1)");
    assert_valid("AND(active, amount > 0, NOT(label = \"closed\"))");
    assert_valid("DAYS_BETWEEN(opened, DATE(\"2024-12-31\")) > 30");
    assert_valid("MOVING_AVG(amount, 3) - AVG(amount)");
    assert_valid("COUNT(label)");
    assert_valid("label + \" \" + account_id");
}

#[test]
fn test_unknown_field() {
    assert_error("SUM(nonexistent_field)", "nonexistent_field");
    assert_error("nope * 2", "Unknown field: nope");
}

#[test]
fn test_unknown_function() {
    assert_error("UNKNOWNFUNC(x)", "Unknown function: UNKNOWNFUNC");
}

#[test]
fn test_arity() {
    assert_error("RATIO(a)", "RATIO expects 2 arguments, got 1");
    assert_error("ROUND(a, 1, 2)", "ROUND expects 1–2 arguments, got 3");
    assert_error("IF(a > 1, 2)", "IF expects 3 arguments, got 2");
    assert_error("CASE(TRUE)", "CASE expects at least 2 arguments, got 1");
}

#[test]
fn test_aggregate_needs_bare_field() {
    assert_error("SUM(amount + 1)", "SUM only operates on a raw field");
    assert_error("AVG(3)", "AVG only operates on a raw field");
}

#[test]
fn test_aggregate_needs_numeric_field() {
    assert_error("SUM(label)", "SUM requires a numeric field, but 'label' is text");
    assert_valid("COUNT(opened)");
}

#[test]
fn test_operand_types() {
    assert_error("label + active", "Operator '+' cannot be applied to text and boolean");
    assert_error("amount * label", "Operator '*' cannot be applied to number and text");
    assert_error("active > TRUE", "Operator '>' cannot be applied to boolean and boolean");
    assert_error("opened = 1", "Operator '=' cannot be applied to date and number");
    assert_error("-label", "Cannot negate text");
    assert_valid("active = TRUE");
}

#[test]
fn test_argument_kinds() {
    assert_error("RATIO(label, 2)", "RATIO argument 1 must be number, got text");
    assert_error("NOT(amount)", "NOT argument 1 must be boolean, got number");
    assert_error("YEAR(\"2024-01-01\")", "YEAR argument 1 must be date, got text");
    assert_error("CASE(amount, 1, 2)", "CASE argument 1 must be boolean, got number");
}

#[test]
fn test_conditional_types() {
    assert_error("IF(amount, 1, 2)", "IF condition must be boolean, got number");
    assert_error("IF(active, 1, \"x\")", "IF branches must have the same type, got number and text");
    assert_error("CASE(active, 1, TRUE, \"x\")", "CASE branches must have the same type");
}

#[test]
fn test_errors_are_collected_exhaustively() {
    let report = validate("SUM(foo) + BAR(1) + RATIO(label) + baz");
    assert_eq!(report.errors.len(), 5, "{:?}", report.errors);
}

#[test]
fn test_division_by_zero_warning() {
    for expr in ["amount / 0", "RATIO(amount, 0)", "PERCENTAGE(amount, -0)"] {
        let report = validate(expr);
        assert!(report.valid);
        assert_eq!(report.warnings, vec![DIVISION_BY_ZERO_WARNING.to_string()], "{}", expr);
    }
    assert!(validate("amount / 0.5").warnings.is_empty());
}

#[test]
fn test_deep_nesting_warning() {
    let expr = format!("{}amount{}", "ABS(".repeat(12), ")".repeat(12));
    let report = validate(&expr);
    assert!(report.valid);
    assert_eq!(report.warnings, vec![DEEP_NESTING_WARNING.to_string()]);

    let shallow = Engine::with_options(EngineOptions {
        max_nesting_depth: 20,
        ..EngineOptions::default()
    });
    assert!(shallow
        .validate(&expr, &test_support::schema())
        .warnings
        .is_empty());
}

#[test]
fn test_field_colliding_with_function_name() {
    let schema = FieldSchema::new(vec![
        FieldDefinition::new("sum", FieldType::Numeric),
        FieldDefinition::new("amount", FieldType::Numeric),
    ])
    .unwrap();
    let report = test_support::engine().validate("amount", &schema);
    assert!(!report.valid);
    assert_eq!(report.errors, vec!["Field name 'sum' collides with function SUM".to_string()]);
}

#[test]
fn test_empty_schema_warning() {
    let report = test_support::engine().validate("amount", &FieldSchema::empty());
    assert!(!report.valid);
    assert_eq!(report.warnings, vec![EMPTY_SCHEMA_WARNING.to_string()]);

    let report = test_support::engine().validate("1 + 1", &FieldSchema::empty());
    assert!(report.valid);
    assert!(report.warnings.is_empty());
}

#[test]
fn test_syntax_errors_become_a_single_error() {
    let report = validate("(1 + 2");
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("Parse error at position 0"));

    let report = validate("1 $ 2");
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("Lex error at position 2"));
}

#[test]
fn test_return_type() {
    assert_eq!(validate("SUM(amount)").return_type, Some(ValueType::Number));
    assert_eq!(validate("amount > 1").return_type, Some(ValueType::Boolean));
    assert_eq!(validate("DATE(\"2024-01-01\")").return_type, Some(ValueType::Date));
    assert_eq!(validate("CASE(active, \"a\", \"b\")").return_type, Some(ValueType::Text));
    assert_eq!(validate("nope").return_type, None);
}

#[test]
fn test_report_serializes() {
    let json = serde_json::to_value(validate("SUM(amount)")).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "valid": true,
            "errors": [],
            "warnings": [],
            "return_type": "number"
        })
    );
}
