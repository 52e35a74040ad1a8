//! Field schemas and record sets supplied by the surrounding application

use crate::error::{Error, Result};
use crate::types::ValueType;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Declared type of a product field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Numeric,
    Text,
    Boolean,
    Date,
}

impl FieldType {
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Numeric => "numeric",
            FieldType::Text => "text",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
        }
    }

    pub fn value_type(self) -> ValueType {
        match self {
            FieldType::Numeric => ValueType::Number,
            FieldType::Text => ValueType::Text,
            FieldType::Boolean => ValueType::Boolean,
            FieldType::Date => ValueType::Date,
        }
    }
}

/// A named, typed field of a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Ordered list of field definitions with unique names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSchema {
    fields: Vec<FieldDefinition>,
    index: HashMap<String, usize>,
}

impl FieldSchema {
    /// Build a schema, rejecting duplicate field names.
    pub fn new(fields: Vec<FieldDefinition>) -> Result<Self> {
        let mut index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if index.insert(field.name.clone(), i).is_some() {
                return Err(Error::Schema(format!(
                    "Duplicate field in schema: {}",
                    field.name
                )));
            }
        }
        Ok(Self { fields, index })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One row of data: field name → value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(HashMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Value for `name`; explicit nulls are reported as absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A record holding the zero value of every schema field.
    pub fn zeroed(schema: &FieldSchema) -> Self {
        schema
            .iter()
            .map(|f| (f.name.clone(), Value::zero_for(f.field_type)))
            .collect()
    }

    /// Convert a JSON object using the declared schema types.
    ///
    /// Keys that the schema does not declare are skipped.
    pub fn from_json(json: &serde_json::Value, schema: &FieldSchema) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| Error::Schema(format!("record must be a JSON object, got {}", json)))?;

        let mut record = Record::new();
        for (key, raw) in object {
            match schema.get(key) {
                Some(field) => {
                    let value = Value::from_json(raw, field.field_type).map_err(|e| match e {
                        Error::Schema(msg) => Error::Schema(format!("field '{}': {}", key, msg)),
                        other => other,
                    })?;
                    record.insert(key.clone(), value);
                }
                None => tracing::debug!(field = %key, "skipping undeclared record field"),
            }
        }
        Ok(record)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record(iter.into_iter().collect())
    }
}

/// Convert a JSON array of objects into records.
pub fn records_from_json(json: &serde_json::Value, schema: &FieldSchema) -> Result<Vec<Record>> {
    let items = json
        .as_array()
        .ok_or_else(|| Error::Schema("record set must be a JSON array".into()))?;
    items.iter().map(|item| Record::from_json(item, schema)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_duplicate_field_names_rejected() {
        let err = FieldSchema::new(vec![
            FieldDefinition::new("amount", FieldType::Numeric),
            FieldDefinition::new("amount", FieldType::Text),
        ])
        .unwrap_err();
        assert_eq!(err, Error::Schema("Duplicate field in schema: amount".into()));
    }

    #[test]
    fn test_schema_deserializes_from_json() {
        let fields: Vec<FieldDefinition> = serde_json::from_value(json!([
            {"name": "amount", "type": "numeric", "required": true},
            {"name": "opened", "type": "date"}
        ]))
        .unwrap();
        let schema = FieldSchema::new(fields).unwrap();
        assert_eq!(schema.len(), 2);
        assert!(schema.get("amount").unwrap().required);
        assert!(!schema.get("opened").unwrap().required);
    }

    #[test]
    fn test_record_from_json_skips_undeclared_keys() {
        let schema = FieldSchema::new(vec![FieldDefinition::new("amount", FieldType::Numeric)]).unwrap();
        let record = Record::from_json(&json!({"amount": 5, "note": "x"}), &schema).unwrap();
        assert_eq!(record.get("amount"), Some(&Value::Number(5.0)));
        assert!(record.get("note").is_none());
    }

    #[test]
    fn test_zeroed_record() {
        let schema = FieldSchema::new(vec![
            FieldDefinition::new("amount", FieldType::Numeric),
            FieldDefinition::new("label", FieldType::Text),
        ])
        .unwrap();
        let record = Record::zeroed(&schema);
        assert_eq!(record.get("amount"), Some(&Value::Number(0.0)));
        assert_eq!(record.get("label"), Some(&Value::text("")));
    }
}
