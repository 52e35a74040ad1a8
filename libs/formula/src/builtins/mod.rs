//! Built-in function catalog
//!
//! Uses a compile-time perfect hash map (phf) keyed by the upper-case
//! function name. The registry copies these entries at build time.

mod aggregate;
mod conditional;
mod math;
mod statistical;
mod temporal;

use crate::functions::{ArgKind, ArgLayout, FunctionCategory, FunctionSignature, ReturnType};
use crate::types::ValueType;
use phf::phf_map;

use ArgKind::*;

const NUMBER: ReturnType = ReturnType::Fixed(ValueType::Number);
const BOOLEAN: ReturnType = ReturnType::Fixed(ValueType::Boolean);

pub(crate) static BUILTINS: phf::Map<&'static str, FunctionSignature> = phf_map! {
    // Aggregate functions
    "SUM" => FunctionSignature {
        name: "SUM", category: FunctionCategory::Aggregate, min_args: 1, max_args: Some(1),
        arg_kinds: &[NumericField], layout: ArgLayout::Positional, return_type: NUMBER, denominator: None,
        description: "Sum of a numeric field across all records",
        evaluate: aggregate::sum,
    },
    "AVG" => FunctionSignature {
        name: "AVG", category: FunctionCategory::Aggregate, min_args: 1, max_args: Some(1),
        arg_kinds: &[NumericField], layout: ArgLayout::Positional, return_type: NUMBER, denominator: None,
        description: "Arithmetic mean of a numeric field across all records",
        evaluate: aggregate::avg,
    },
    "COUNT" => FunctionSignature {
        name: "COUNT", category: FunctionCategory::Aggregate, min_args: 1, max_args: Some(1),
        arg_kinds: &[Field], layout: ArgLayout::Positional, return_type: NUMBER, denominator: None,
        description: "Number of records",
        evaluate: aggregate::count,
    },
    "MIN" => FunctionSignature {
        name: "MIN", category: FunctionCategory::Aggregate, min_args: 1, max_args: Some(1),
        arg_kinds: &[NumericField], layout: ArgLayout::Positional, return_type: NUMBER, denominator: None,
        description: "Smallest value of a numeric field",
        evaluate: aggregate::min,
    },
    "MAX" => FunctionSignature {
        name: "MAX", category: FunctionCategory::Aggregate, min_args: 1, max_args: Some(1),
        arg_kinds: &[NumericField], layout: ArgLayout::Positional, return_type: NUMBER, denominator: None,
        description: "Largest value of a numeric field",
        evaluate: aggregate::max,
    },

    // Conditional functions
    "IF" => FunctionSignature {
        name: "IF", category: FunctionCategory::Conditional, min_args: 3, max_args: Some(3),
        arg_kinds: &[Boolean, Any, Any], layout: ArgLayout::Positional, return_type: ReturnType::Branches, denominator: None,
        description: "Value of the second argument when the condition holds, otherwise the third",
        evaluate: conditional::if_then_else,
    },
    "CASE" => FunctionSignature {
        name: "CASE", category: FunctionCategory::Conditional, min_args: 2, max_args: None,
        arg_kinds: &[Boolean, Any], layout: ArgLayout::ConditionValuePairs, return_type: ReturnType::Branches, denominator: None,
        description: "Value paired with the first true condition, or the trailing default",
        evaluate: conditional::case,
    },
    "AND" => FunctionSignature {
        name: "AND", category: FunctionCategory::Conditional, min_args: 1, max_args: None,
        arg_kinds: &[Boolean], layout: ArgLayout::Positional, return_type: BOOLEAN, denominator: None,
        description: "True when every argument is true",
        evaluate: conditional::and,
    },
    "OR" => FunctionSignature {
        name: "OR", category: FunctionCategory::Conditional, min_args: 1, max_args: None,
        arg_kinds: &[Boolean], layout: ArgLayout::Positional, return_type: BOOLEAN, denominator: None,
        description: "True when any argument is true",
        evaluate: conditional::or,
    },
    "NOT" => FunctionSignature {
        name: "NOT", category: FunctionCategory::Conditional, min_args: 1, max_args: Some(1),
        arg_kinds: &[Boolean], layout: ArgLayout::Positional, return_type: BOOLEAN, denominator: None,
        description: "Logical negation",
        evaluate: conditional::not,
    },

    // Math functions
    "RATIO" => FunctionSignature {
        name: "RATIO", category: FunctionCategory::Math, min_args: 2, max_args: Some(2),
        arg_kinds: &[Number, Number], layout: ArgLayout::Positional, return_type: NUMBER, denominator: Some(1),
        description: "Numerator divided by denominator",
        evaluate: math::ratio,
    },
    "PERCENTAGE" => FunctionSignature {
        name: "PERCENTAGE", category: FunctionCategory::Math, min_args: 2, max_args: Some(2),
        arg_kinds: &[Number, Number], layout: ArgLayout::Positional, return_type: NUMBER, denominator: Some(1),
        description: "Part as a percentage of the whole",
        evaluate: math::percentage,
    },
    "ABS" => FunctionSignature {
        name: "ABS", category: FunctionCategory::Math, min_args: 1, max_args: Some(1),
        arg_kinds: &[Number], layout: ArgLayout::Positional, return_type: NUMBER, denominator: None,
        description: "Absolute value",
        evaluate: math::abs,
    },
    "ROUND" => FunctionSignature {
        name: "ROUND", category: FunctionCategory::Math, min_args: 1, max_args: Some(2),
        arg_kinds: &[Number, Number], layout: ArgLayout::Positional, return_type: NUMBER, denominator: None,
        description: "Round half away from zero to the given number of digits (default 0)",
        evaluate: math::round,
    },

    // Statistical functions
    "MOVING_AVG" => FunctionSignature {
        name: "MOVING_AVG", category: FunctionCategory::Statistical, min_args: 2, max_args: Some(2),
        arg_kinds: &[NumericField, Number], layout: ArgLayout::Positional, return_type: NUMBER, denominator: None,
        description: "Mean of a numeric field over the last N records",
        evaluate: statistical::moving_avg,
    },
    "GROWTH_RATE" => FunctionSignature {
        name: "GROWTH_RATE", category: FunctionCategory::Statistical, min_args: 1, max_args: Some(1),
        arg_kinds: &[NumericField], layout: ArgLayout::Positional, return_type: NUMBER, denominator: None,
        description: "Percent change from the first to the last record",
        evaluate: statistical::growth_rate,
    },
    "MEDIAN" => FunctionSignature {
        name: "MEDIAN", category: FunctionCategory::Statistical, min_args: 1, max_args: Some(1),
        arg_kinds: &[NumericField], layout: ArgLayout::Positional, return_type: NUMBER, denominator: None,
        description: "Median of a numeric field",
        evaluate: statistical::median,
    },
    "STDDEV" => FunctionSignature {
        name: "STDDEV", category: FunctionCategory::Statistical, min_args: 1, max_args: Some(1),
        arg_kinds: &[NumericField], layout: ArgLayout::Positional, return_type: NUMBER, denominator: None,
        description: "Population standard deviation of a numeric field",
        evaluate: statistical::stddev,
    },

    // Date functions
    "DATE" => FunctionSignature {
        name: "DATE", category: FunctionCategory::Date, min_args: 1, max_args: Some(1),
        arg_kinds: &[Text], layout: ArgLayout::Positional, return_type: ReturnType::Fixed(ValueType::Date), denominator: None,
        description: "Date from a YYYY-MM-DD string",
        evaluate: temporal::date,
    },
    "YEAR" => FunctionSignature {
        name: "YEAR", category: FunctionCategory::Date, min_args: 1, max_args: Some(1),
        arg_kinds: &[Date], layout: ArgLayout::Positional, return_type: NUMBER, denominator: None,
        description: "Calendar year of a date",
        evaluate: temporal::year,
    },
    "MONTH" => FunctionSignature {
        name: "MONTH", category: FunctionCategory::Date, min_args: 1, max_args: Some(1),
        arg_kinds: &[Date], layout: ArgLayout::Positional, return_type: NUMBER, denominator: None,
        description: "Month of a date (1-12)",
        evaluate: temporal::month,
    },
    "DAY" => FunctionSignature {
        name: "DAY", category: FunctionCategory::Date, min_args: 1, max_args: Some(1),
        arg_kinds: &[Date], layout: ArgLayout::Positional, return_type: NUMBER, denominator: None,
        description: "Day of the month of a date",
        evaluate: temporal::day,
    },
    "DAYS_BETWEEN" => FunctionSignature {
        name: "DAYS_BETWEEN", category: FunctionCategory::Date, min_args: 2, max_args: Some(2),
        arg_kinds: &[Date, Date], layout: ArgLayout::Positional, return_type: NUMBER, denominator: None,
        description: "Whole days from the first date to the second",
        evaluate: temporal::days_between,
    },
};
