#![allow(dead_code)]

use std::sync::OnceLock;
use tally_formula::{Engine, FieldDefinition, FieldSchema, FieldType, Record};

static ENGINE: OnceLock<Engine> = OnceLock::new();

/// Shared engine with default options
pub fn engine() -> &'static Engine {
    ENGINE.get_or_init(Engine::new)
}

/// Portfolio-style schema used across the integration tests
pub fn schema() -> FieldSchema {
    FieldSchema::new(vec![
        FieldDefinition::new("amount", FieldType::Numeric),
        FieldDefinition::new("balance", FieldType::Numeric),
        FieldDefinition::new("income", FieldType::Numeric),
        FieldDefinition::new("a", FieldType::Numeric),
        FieldDefinition::new("b", FieldType::Numeric),
        FieldDefinition::new("x", FieldType::Numeric),
        FieldDefinition::new("label", FieldType::Text),
        FieldDefinition::new("active", FieldType::Boolean),
        FieldDefinition::new("opened", FieldType::Date),
        FieldDefinition::new("account_id", FieldType::Text).required(),
    ])
    .expect("test schema is valid")
}

/// One record per amount, in order
pub fn amounts(values: &[f64]) -> Vec<Record> {
    values
        .iter()
        .map(|v| Record::new().with("amount", *v).with("account_id", "acc-1"))
        .collect()
}

pub fn single(record: Record) -> Vec<Record> {
    vec![record.with("account_id", "acc-1")]
}
