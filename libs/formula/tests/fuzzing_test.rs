//! Fuzzing tests to ensure the parser, validator and evaluator handle
//! malformed input gracefully

use tally_formula::{Error, Record};

mod test_support;

use test_support::{engine, schema, single};

/// Test that malformed expressions don't panic
#[test]
fn test_malformed_expressions_no_panic() {
    let schema = schema();
    let records = single(Record::new().with("amount", 1.0));

    let malformed = vec![
        "",              // Empty
        "(",             // Unclosed paren
        ")",             // Unmatched closing paren
        "\"",            // Unterminated string
        "1 +",           // Incomplete expression
        "+",             // Just operator
        "1 2",           // Missing operator
        "1 + + 2",       // Double operator
        "1 ** 2",        // Invalid operator
        "1 @ 2",         // Invalid character
        "SUM(",          // Unclosed call
        "SUM(amount,)",  // Trailing comma
        "SUM()",         // Missing argument
        "IF()",          // Empty conditional
        "IF(,,)",        // Empty arguments
        "CASE(TRUE)",    // Odd arity
        "1..2",          // Double dot
        "amount.field",  // Member access
        "f()()",         // Double call
        "=",             // Lone comparison
        "1 = = 1",       // Doubled comparison
        "1 <> 2",        // Unsupported operator
    ];

    for expr in malformed {
        // Should return an error or report, not panic
        let report = engine().validate(expr, &schema);
        assert!(!report.valid, "Expression '{}' should be invalid", expr);
        let result = engine().evaluate(expr, &records, &schema);
        assert!(result.is_err(), "Expression '{}' should not evaluate", expr);
    }
}

/// Test that very long expressions are handled
#[test]
fn test_very_long_expressions() {
    let schema = schema();
    let records = single(Record::new().with("amount", 1.0));

    let long_sum = vec!["amount"; 500].join(" + ");
    let result = engine().evaluate(&long_sum, &records, &schema).unwrap();
    assert_eq!(result.value, tally_formula::Value::Number(500.0));

    let long_string = format!("\"{}\"", "x".repeat(100_000));
    assert!(engine().evaluate(&long_string, &records, &schema).is_ok());
}

/// Operator chains past the tree depth limit are parse errors, never a stack overflow
#[test]
fn test_huge_operator_chains() {
    let schema = schema();
    let records = single(Record::new().with("amount", 1.0));

    for terms in [1_500, 20_000, 100_000] {
        for op in [" + ", " * ", " - ", " / ", " > "] {
            let chain = vec!["amount"; terms].join(op);

            let report = engine().validate(&chain, &schema);
            assert!(!report.valid, "{} terms joined by {:?}", terms, op);
            assert!(report.errors[0].contains("too deeply nested"), "{:?}", report.errors);

            let err = engine().evaluate(&chain, &records, &schema).unwrap_err();
            assert!(matches!(err, Error::Parse { .. }), "{:?}", err);

            let err = engine().test(&chain, None, &schema).unwrap_err();
            assert!(matches!(err, Error::Parse { .. }), "{:?}", err);
        }
    }

    // The largest accepted chain can still be walked and dropped
    let widest = vec!["amount"; 500].join(" - ");
    let ast = tally_formula::parse(&widest).unwrap();
    assert_eq!(ast.depth(), 500);
    assert!(engine().validate(&widest, &schema).valid);
    drop(ast);
}

/// Test that deeply nested expressions fail cleanly instead of overflowing
#[test]
fn test_deeply_nested_expressions() {
    let schema = schema();
    let records = single(Record::new());

    for depth in [100, 250, 1000] {
        let parens = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        let _ = engine().evaluate(&parens, &records, &schema);

        let calls = format!("{}1{}", "ABS(".repeat(depth), ")".repeat(depth));
        let _ = engine().validate(&calls, &schema);

        let negations = format!("{}amount", "-".repeat(depth));
        let _ = engine().validate(&negations, &schema);
    }
}

/// Test non-ASCII input
#[test]
fn test_unicode_input() {
    let schema = schema();
    let records = single(Record::new());

    // Inside strings it is fine
    let result = engine().evaluate("\"héllo wörld ✓\"", &records, &schema).unwrap();
    assert_eq!(result.value, tally_formula::Value::text("héllo wörld ✓"));

    // Identifiers are ASCII only
    for expr in ["montánt", "ß + 1", "１"] {
        assert!(!engine().validate(expr, &schema).valid, "{}", expr);
    }
}

/// Arbitrary byte soup never panics
#[test]
fn test_random_symbol_soup() {
    let schema = schema();
    let records = single(Record::new().with("amount", 2.0));
    let alphabet: Vec<char> = "()+-*/=<>,\"  0123456789.amountSUMIF".chars().collect();

    // Deterministic LCG so failures are reproducible
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    for _ in 0..500 {
        let len = (state % 24) as usize;
        let expr: String = (0..len)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                alphabet[(state >> 33) as usize % alphabet.len()]
            })
            .collect();
        let _ = engine().validate(&expr, &schema);
        let _ = engine().evaluate(&expr, &records, &schema);
    }
}
