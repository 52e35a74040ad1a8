//! Conditional and boolean functions.
//!
//! Arguments are pulled lazily, so branches that are not selected are never
//! evaluated and cannot fail.

use crate::engine::CaseFallback;
use crate::error::{RuntimeError, RuntimeErrorKind, RuntimeResult};
use crate::evaluator::Invocation;
use crate::value::Value;

/// `IF(cond, then, else)` when called through the registry. The parser
/// normally turns three-argument IF calls into a conditional node.
pub fn if_then_else(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    if inv.bool_arg(0)? {
        inv.arg(1)
    } else {
        inv.arg(2)
    }
}

/// `CASE(c1, v1, c2, v2, ..., [default])`: value of the first true condition
pub fn case(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    let count = inv.arg_count();
    for pair in 0..count / 2 {
        if inv.bool_arg(pair * 2)? {
            return inv.arg(pair * 2 + 1);
        }
    }

    if count % 2 == 1 {
        return inv.arg(count - 1);
    }

    match inv.options().case_fallback {
        CaseFallback::Null => Ok(Value::Null),
        CaseFallback::Error => Err(RuntimeError::new(
            RuntimeErrorKind::NoCaseMatched,
            "no CASE condition matched and no default was given",
        )),
    }
}

/// Stops at the first false argument
pub fn and(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    for i in 0..inv.arg_count() {
        if !inv.bool_arg(i)? {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

/// Stops at the first true argument
pub fn or(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    for i in 0..inv.arg_count() {
        if inv.bool_arg(i)? {
            return Ok(Value::Boolean(true));
        }
    }
    Ok(Value::Boolean(false))
}

pub fn not(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    Ok(Value::Boolean(!inv.bool_arg(0)?))
}
