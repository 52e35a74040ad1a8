//! Statistical functions over a numeric field.
//!
//! Records are taken in the order supplied; missing values count as 0 just
//! like in the plain aggregates.

use crate::error::{RuntimeError, RuntimeResult};
use crate::evaluator::Invocation;
use crate::value::Value;

/// `MOVING_AVG(field, window)`: mean of the last `window` records
pub fn moving_avg(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    let column = inv.numeric_column(0)?;
    let window = inv.number_arg(1)?;
    if !window.is_finite() || window < 1.0 || window.fract() != 0.0 {
        return Err(RuntimeError::invalid_argument(format!(
            "MOVING_AVG window must be a positive integer, got {}",
            window
        )));
    }

    let take = (window as usize).min(column.len());
    let tail = &column[column.len() - take..];
    Ok(Value::Number(tail.iter().sum::<f64>() / take as f64))
}

/// `GROWTH_RATE(field)`: percent change from the first to the last record
pub fn growth_rate(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    let column = inv.numeric_column(0)?;
    let (first, last) = match (column.first(), column.last()) {
        (Some(first), Some(last)) if column.len() >= 2 => (*first, *last),
        _ => {
            inv.warn(format!(
                "GROWTH_RATE needs at least 2 records, got {}",
                column.len()
            ));
            return Ok(Value::Null);
        }
    };

    if first == 0.0 {
        return Err(RuntimeError::division_by_zero(
            "GROWTH_RATE starting value is zero",
        ));
    }
    Ok(Value::Number((last - first) / first.abs() * 100.0))
}

pub fn median(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    let mut column = inv.numeric_column(0)?;
    column.sort_by(f64::total_cmp);

    let mid = column.len() / 2;
    let value = if column.len() % 2 == 0 {
        (column[mid - 1] + column[mid]) / 2.0
    } else {
        column[mid]
    };
    Ok(Value::Number(value))
}

/// Population standard deviation
pub fn stddev(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    let column = inv.numeric_column(0)?;
    let n = column.len() as f64;
    let mean = column.iter().sum::<f64>() / n;
    let variance = column.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    Ok(Value::Number(variance.sqrt()))
}
