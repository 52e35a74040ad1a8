//! Function registry for formula functions
//!
//! Maps case-insensitive function names to their signatures. A registry is
//! assembled once through [`RegistryBuilder`] and is immutable afterwards, so
//! it can be shared between threads without locking.

use crate::builtins::BUILTINS;
use crate::error::{Error, Result, RuntimeResult};
use crate::evaluator::Invocation;
use crate::types::ValueType;
use crate::value::Value;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Function body. Arguments are evaluated on demand through the invocation,
/// which lets conditionals skip the branches they do not select.
pub type EvalFn = fn(&Invocation<'_>) -> RuntimeResult<Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FunctionCategory {
    Aggregate,
    Conditional,
    Statistical,
    Date,
    Math,
}

/// Expected shape of one argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArgKind {
    /// Bare field reference of any type
    Field,
    /// Bare reference to a numeric field
    NumericField,
    Number,
    Boolean,
    Date,
    Text,
    Any,
}

impl ArgKind {
    pub fn is_field(self) -> bool {
        matches!(self, ArgKind::Field | ArgKind::NumericField)
    }

    /// Value type expected for non-field kinds
    pub fn expected_type(self) -> Option<ValueType> {
        match self {
            ArgKind::Number => Some(ValueType::Number),
            ArgKind::Boolean => Some(ValueType::Boolean),
            ArgKind::Date => Some(ValueType::Date),
            ArgKind::Text => Some(ValueType::Text),
            ArgKind::Field | ArgKind::NumericField | ArgKind::Any => None,
        }
    }
}

/// How `arg_kinds` maps onto the actual arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArgLayout {
    /// Kinds apply by position; the last kind repeats for extra arguments
    Positional,
    /// `cond, value, cond, value, ..., [default]`
    ConditionValuePairs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReturnType {
    Fixed(ValueType),
    /// Type of the value branches (the `Any` arguments), which must agree
    Branches,
}

/// Function signature and implementation
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FunctionSignature {
    pub name: &'static str,
    pub category: FunctionCategory,
    pub min_args: usize,
    pub max_args: Option<usize>, // None = unbounded
    pub arg_kinds: &'static [ArgKind],
    pub layout: ArgLayout,
    pub return_type: ReturnType,
    /// Index of a denominator argument, checked for literal zero
    pub denominator: Option<usize>,
    pub description: &'static str,
    #[serde(skip)]
    pub evaluate: EvalFn,
}

impl FunctionSignature {
    /// Expected kind of argument `index` in a call with `arg_count` arguments
    pub fn arg_kind(&self, index: usize, arg_count: usize) -> ArgKind {
        match self.layout {
            ArgLayout::Positional => self
                .arg_kinds
                .get(index)
                .or(self.arg_kinds.last())
                .copied()
                .unwrap_or(ArgKind::Any),
            ArgLayout::ConditionValuePairs => {
                let is_default = arg_count % 2 == 1 && index + 1 == arg_count;
                if index % 2 == 0 && !is_default {
                    ArgKind::Boolean
                } else {
                    ArgKind::Any
                }
            }
        }
    }

    /// Functions whose first argument is a field reduce over the whole record set
    pub fn is_aggregate(&self) -> bool {
        self.arg_kinds.first().is_some_and(|k| k.is_field())
    }

    pub fn accepts_arg_count(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }

    /// Arity mismatch message: "{name} expects N–M arguments, got K"
    pub fn arity_message(&self, got: usize) -> String {
        let expected = match self.max_args {
            Some(max) if max == self.min_args => format!(
                "{} argument{}",
                max,
                if max == 1 { "" } else { "s" }
            ),
            Some(max) => format!("{}–{} arguments", self.min_args, max),
            None => format!("at least {} arguments", self.min_args),
        };
        format!("{} expects {}, got {}", self.name, expected, got)
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        let shown = self.max_args.unwrap_or(self.arg_kinds.len().max(self.min_args));
        for i in 0..shown {
            if i > 0 {
                f.write_str(", ")?;
            }
            let kind = self.arg_kind(i, shown);
            if i >= self.min_args {
                write!(f, "[{:?}]", kind)?;
            } else {
                write!(f, "{:?}", kind)?;
            }
        }
        if self.max_args.is_none() {
            f.write_str(", ...")?;
        }
        f.write_str(")")
    }
}

/// Immutable function registry
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionSignature>,
}

static GLOBAL_REGISTRY: OnceLock<Arc<FunctionRegistry>> = OnceLock::new();

impl FunctionRegistry {
    /// Registry holding only the built-in catalog
    pub fn with_builtins() -> Self {
        Self::builder().build()
    }

    /// Builder preloaded with the built-in catalog
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            functions: BUILTINS
                .values()
                .map(|sig| (sig.name.to_ascii_uppercase(), *sig))
                .collect(),
        }
    }

    /// Install the process-wide registry. Must happen before the first call
    /// to [`FunctionRegistry::global`].
    pub fn install_global(registry: FunctionRegistry) -> Result<()> {
        GLOBAL_REGISTRY
            .set(Arc::new(registry))
            .map_err(|_| Error::Registry("global function registry is already initialized".into()))
    }

    /// Process-wide registry; defaults to the built-in catalog
    pub fn global() -> Arc<FunctionRegistry> {
        Arc::clone(GLOBAL_REGISTRY.get_or_init(|| Arc::new(FunctionRegistry::with_builtins())))
    }

    /// Case-insensitive lookup
    pub fn lookup(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(&name.to_ascii_uppercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// All signatures sorted by name
    pub fn list(&self) -> Vec<FunctionSignature> {
        let mut all: Vec<FunctionSignature> = self.functions.values().copied().collect();
        all.sort_by(|a, b| a.name.cmp(b.name));
        all
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Collects signatures before the registry is frozen
#[derive(Debug)]
pub struct RegistryBuilder {
    functions: HashMap<String, FunctionSignature>,
}

impl RegistryBuilder {
    /// Add a function; names are unique case-insensitively
    pub fn register(mut self, signature: FunctionSignature) -> Result<Self> {
        if signature.name.is_empty()
            || !signature
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            || signature.name.starts_with(|c: char| c.is_ascii_digit())
        {
            return Err(Error::Registry(format!(
                "invalid function name: '{}'",
                signature.name
            )));
        }
        if let Some(max) = signature.max_args {
            if max < signature.min_args {
                return Err(Error::Registry(format!(
                    "{}: max_args ({}) is smaller than min_args ({})",
                    signature.name, max, signature.min_args
                )));
            }
        }

        let key = signature.name.to_ascii_uppercase();
        if self.functions.contains_key(&key) {
            return Err(Error::Registry(format!(
                "function already registered: {}",
                key
            )));
        }
        self.functions.insert(key, signature);
        Ok(self)
    }

    pub fn build(self) -> FunctionRegistry {
        FunctionRegistry {
            functions: self.functions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double(inv: &Invocation<'_>) -> RuntimeResult<Value> {
        Ok(Value::Number(inv.number_arg(0)? * 2.0))
    }

    const DOUBLE: FunctionSignature = FunctionSignature {
        name: "DOUBLE",
        category: FunctionCategory::Math,
        min_args: 1,
        max_args: Some(1),
        arg_kinds: &[ArgKind::Number],
        layout: ArgLayout::Positional,
        return_type: ReturnType::Fixed(ValueType::Number),
        denominator: None,
        description: "Twice the argument",
        evaluate: double,
    };

    #[test]
    fn test_all_builtins_registered() {
        let registry = FunctionRegistry::with_builtins();

        let functions = vec![
            // Aggregate
            "SUM", "AVG", "COUNT", "MIN", "MAX",
            // Conditional
            "IF", "CASE", "AND", "OR", "NOT",
            // Math
            "RATIO", "PERCENTAGE", "ABS", "ROUND",
            // Statistical
            "MOVING_AVG", "GROWTH_RATE", "MEDIAN", "STDDEV",
            // Date
            "DATE", "YEAR", "MONTH", "DAY", "DAYS_BETWEEN",
        ];

        for func_name in functions {
            assert!(
                registry.lookup(func_name).is_some(),
                "Function '{}' is not registered",
                func_name
            );
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = FunctionRegistry::with_builtins();
        assert_eq!(registry.lookup("sum").unwrap().name, "SUM");
        assert_eq!(registry.lookup("Moving_Avg").unwrap().name, "MOVING_AVG");
        assert!(registry.lookup("unknownfunc").is_none());
    }

    #[test]
    fn test_function_argument_counts() {
        let registry = FunctionRegistry::with_builtins();

        let if_sig = registry.lookup("IF").unwrap();
        assert!(!if_sig.accepts_arg_count(2));
        assert!(if_sig.accepts_arg_count(3));
        assert!(!if_sig.accepts_arg_count(4));
        assert_eq!(if_sig.arity_message(2), "IF expects 3 arguments, got 2");

        let round = registry.lookup("ROUND").unwrap();
        assert_eq!(round.arity_message(3), "ROUND expects 1–2 arguments, got 3");

        let case = registry.lookup("CASE").unwrap();
        assert!(case.accepts_arg_count(7));
        assert_eq!(case.arity_message(1), "CASE expects at least 2 arguments, got 1");
    }

    #[test]
    fn test_case_layout_marks_conditions_and_default() {
        let registry = FunctionRegistry::with_builtins();
        let case = registry.lookup("CASE").unwrap();
        // CASE(c1, v1, c2, v2, default)
        let kinds: Vec<ArgKind> = (0..5).map(|i| case.arg_kind(i, 5)).collect();
        assert_eq!(
            kinds,
            vec![
                ArgKind::Boolean,
                ArgKind::Any,
                ArgKind::Boolean,
                ArgKind::Any,
                ArgKind::Any
            ]
        );
    }

    #[test]
    fn test_register_custom_function() {
        let registry = FunctionRegistry::builder().register(DOUBLE).unwrap().build();
        assert!(registry.contains("double"));
        assert_eq!(registry.len(), FunctionRegistry::with_builtins().len() + 1);

        let duplicate = FunctionRegistry::builder()
            .register(DOUBLE)
            .unwrap()
            .register(DOUBLE);
        assert!(matches!(duplicate, Err(Error::Registry(_))));
    }

    #[test]
    fn test_list_is_sorted() {
        let names: Vec<&str> = FunctionRegistry::with_builtins()
            .list()
            .iter()
            .map(|s| s.name)
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_aggregate_classification() {
        let registry = FunctionRegistry::with_builtins();
        assert!(registry.lookup("SUM").unwrap().is_aggregate());
        assert!(registry.lookup("COUNT").unwrap().is_aggregate());
        assert!(registry.lookup("GROWTH_RATE").unwrap().is_aggregate());
        assert!(!registry.lookup("RATIO").unwrap().is_aggregate());
    }
}
