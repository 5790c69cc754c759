//! Canonical record set produced by the loader.
//!
//! Records are stored positionally against a [`FieldSchema`] whose key order
//! is the order of the configured header list, so serializing a record set
//! always yields the same field order.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::value::Value;

static MISSING: Value = Value::Missing;

/// Ordered canonical field keys.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldSchema {
    keys: Vec<String>,
}

impl FieldSchema {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// One case entry: the raw cells and the fixed values, both aligned with the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    raw: Vec<Value>,
    values: Vec<Value>,
}

impl Record {
    pub fn new(raw: Vec<Value>, values: Vec<Value>) -> Self {
        Self { raw, values }
    }

    /// Normalized value at a schema position.
    pub fn value(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&MISSING)
    }

    /// Raw source cell at a schema position.
    pub fn raw(&self, index: usize) -> &Value {
        self.raw.get(index).unwrap_or(&MISSING)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Side-channel data read from auxiliary sheet ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraValue {
    /// Paired key/value ranges.
    Map(BTreeMap<String, String>),
    /// A single item range, in cell order.
    List(Vec<String>),
}

impl ExtraValue {
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ExtraValue::List(items) => Some(items),
            ExtraValue::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ExtraValue::Map(map) => Some(map),
            ExtraValue::List(_) => None,
        }
    }
}

pub type Extras = BTreeMap<String, ExtraValue>;

/// Per-file load statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceSummary {
    pub path: PathBuf,
    pub rows_read: usize,
    pub skipped_empty: usize,
    pub filtered_out: usize,
    pub records: usize,
    /// Canonical keys for which no header matched in this file.
    pub unmatched_fields: Vec<String>,
}

/// A field value as seen by the data check.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldObservation<'a> {
    pub field: &'a str,
    pub raw: &'a Value,
    pub value: &'a Value,
    pub record_key: Vec<String>,
}

/// The canonical in-memory record set plus its extras.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordSet {
    pub schema: FieldSchema,
    pub records: Vec<Record>,
    pub extras: Extras,
    pub sources: Vec<SourceSummary>,
}

impl RecordSet {
    pub fn new(schema: FieldSchema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Normalized value of `key` in record `index`.
    pub fn value(&self, index: usize, key: &str) -> Option<&Value> {
        let field = self.schema.index_of(key)?;
        self.records.get(index).map(|record| record.value(field))
    }

    /// Fields that no loaded source could bind.
    pub fn unmatched_fields(&self) -> Vec<String> {
        if self.sources.is_empty() {
            return Vec::new();
        }
        self.schema
            .keys()
            .iter()
            .filter(|key| {
                self.sources
                    .iter()
                    .all(|source| source.unmatched_fields.contains(key))
            })
            .cloned()
            .collect()
    }

    /// Identifying tuple of a record, in the order of `key_fields`.
    pub fn record_key(&self, index: usize, key_fields: &[String]) -> Vec<String> {
        key_fields
            .iter()
            .map(|key| {
                self.value(index, key)
                    .map(ToString::to_string)
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Raw and normalized value of one field of one record.
    pub fn observe<'a>(
        &'a self,
        index: usize,
        field: &'a str,
        key_fields: &[String],
    ) -> Option<FieldObservation<'a>> {
        let position = self.schema.index_of(field)?;
        let record = self.records.get(index)?;
        Some(FieldObservation {
            field,
            raw: record.raw(position),
            value: record.value(position),
            record_key: self.record_key(index, key_fields),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RecordSet {
        let mut set = RecordSet::new(FieldSchema::new(["id", "age", "sex"]));
        set.records.push(Record::new(
            vec![Value::from("P1"), Value::from("abc"), Value::from("F")],
            vec![Value::from("P1"), Value::Number(-1.0), Value::from("F")],
        ));
        set.sources.push(SourceSummary {
            path: "a.csv".into(),
            unmatched_fields: vec!["sex".to_string()],
            ..SourceSummary::default()
        });
        set.sources.push(SourceSummary {
            path: "b.csv".into(),
            unmatched_fields: vec!["sex".to_string(), "age".to_string()],
            ..SourceSummary::default()
        });
        set
    }

    #[test]
    fn test_observe_exposes_raw_and_value() {
        let set = sample();
        let observation = set.observe(0, "age", &["id".to_string()]).unwrap();
        assert_eq!(observation.raw, &Value::from("abc"));
        assert_eq!(observation.value, &Value::Number(-1.0));
        assert_eq!(observation.record_key, vec!["P1".to_string()]);
    }

    #[test]
    fn test_unmatched_fields_require_every_source() {
        assert_eq!(sample().unmatched_fields(), vec!["sex".to_string()]);
    }

    #[test]
    fn test_out_of_range_value_is_missing() {
        let record = Record::new(vec![], vec![]);
        assert_eq!(record.value(3), &Value::Missing);
    }
}
