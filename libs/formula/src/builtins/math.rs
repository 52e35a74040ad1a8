//! Arithmetic helper functions.

use crate::error::{RuntimeError, RuntimeResult};
use crate::evaluator::Invocation;
use crate::value::Value;

/// `RATIO(numerator, denominator)`
pub fn ratio(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    let numerator = inv.number_arg(0)?;
    let denominator = inv.number_arg(1)?;
    if denominator == 0.0 {
        return Err(RuntimeError::division_by_zero("RATIO denominator is zero"));
    }
    Ok(Value::Number(numerator / denominator))
}

/// `PERCENTAGE(part, whole)` = part / whole * 100
pub fn percentage(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    let part = inv.number_arg(0)?;
    let whole = inv.number_arg(1)?;
    if whole == 0.0 {
        return Err(RuntimeError::division_by_zero("PERCENTAGE whole is zero"));
    }
    Ok(Value::Number(part / whole * 100.0))
}

pub fn abs(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    Ok(Value::Number(inv.number_arg(0)?.abs()))
}

/// `ROUND(x, [digits])`, half away from zero. Negative digits round to tens,
/// hundreds, ...
pub fn round(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    let x = inv.number_arg(0)?;
    let digits = if inv.arg_count() > 1 {
        let d = inv.number_arg(1)?;
        if d.fract() != 0.0 || d.abs() > 15.0 {
            return Err(RuntimeError::invalid_argument(format!(
                "ROUND digits must be an integer between -15 and 15, got {}",
                d
            )));
        }
        d as i32
    } else {
        0
    };

    // Divide by an exact power of ten for negative digits; 10^-n is inexact
    let rounded = if digits >= 0 {
        let factor = 10f64.powi(digits);
        (x * factor).round() / factor
    } else {
        let factor = 10f64.powi(-digits);
        (x / factor).round() * factor
    };
    Ok(Value::Number(rounded))
}
