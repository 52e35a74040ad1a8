//! Date construction and date parts.

use crate::error::{RuntimeError, RuntimeResult};
use crate::evaluator::Invocation;
use crate::value::Value;
use chrono::{Datelike, NaiveDate};

/// `DATE("YYYY-MM-DD")`
pub fn date(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    let text = inv.text_arg(0)?;
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map(Value::Date)
        .map_err(|_| {
            RuntimeError::invalid_argument(format!("DATE expects YYYY-MM-DD, got \"{}\"", text))
        })
}

pub fn year(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    Ok(Value::Number(inv.date_arg(0)?.year() as f64))
}

pub fn month(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    Ok(Value::Number(inv.date_arg(0)?.month() as f64))
}

pub fn day(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    Ok(Value::Number(inv.date_arg(0)?.day() as f64))
}

/// `DAYS_BETWEEN(start, end)`; negative when `end` is earlier
pub fn days_between(inv: &Invocation<'_>) -> RuntimeResult<Value> {
    let start = inv.date_arg(0)?;
    let end = inv.date_arg(1)?;
    Ok(Value::Number((end - start).num_days() as f64))
}
