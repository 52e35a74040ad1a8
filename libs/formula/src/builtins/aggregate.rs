//! Aggregate functions over the whole record set.
//!
//! Each takes a bare field reference. Records with no value for the field
//! contribute 0.

use crate::error::RuntimeResult;
use crate::evaluator::Invocation;
use crate::value::Value;

pub fn sum(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    let column = inv.numeric_column(0)?;
    Ok(Value::Number(column.iter().sum()))
}

pub fn avg(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    let column = inv.numeric_column(0)?;
    // The evaluator refuses empty record sets, so the column is never empty
    Ok(Value::Number(column.iter().sum::<f64>() / column.len() as f64))
}

/// Number of records; the field only has to exist in the schema.
pub fn count(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    inv.field_arg(0)?;
    Ok(Value::Number(inv.records().len() as f64))
}

pub fn min(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    let column = inv.numeric_column(0)?;
    Ok(Value::Number(column.into_iter().fold(f64::INFINITY, f64::min)))
}

pub fn max(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    let column = inv.numeric_column(0)?;
    Ok(Value::Number(
        column.into_iter().fold(f64::NEG_INFINITY, f64::max),
    ))
}
