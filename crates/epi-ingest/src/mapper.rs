//! Row-to-record transform driven by the configured field list.

use std::path::Path;

use epi_model::{FieldSchema, FieldSpec, Record, RecordFilterSpec, SourceSummary, Value};
use regex::Regex;

use crate::error::{IngestError, Result};
use crate::fixers::apply_fixer;
use crate::header::HeaderBinding;
use crate::sheet::Sheet;

/// Row-level predicate over the raw value of one field.
#[derive(Debug, Clone)]
struct RecordFilter {
    field: usize,
    pattern: Regex,
}

/// Maps source rows onto the canonical field schema.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    fields: Vec<FieldSpec>,
    schema: FieldSchema,
    filter: Option<RecordFilter>,
}

impl FieldMapper {
    /// Build a mapper. A filter on an unconfigured field or with a bad pattern is an error.
    pub fn new(fields: &[FieldSpec], record_filter: Option<&RecordFilterSpec>) -> Result<Self> {
        let schema = FieldSchema::new(fields.iter().map(|f| f.key.clone()));
        let filter = record_filter
            .map(|spec| {
                let pattern = Regex::new(&spec.pattern).map_err(|e| IngestError::InvalidFilter {
                    pattern: spec.pattern.clone(),
                    source: e,
                })?;
                let field = schema
                    .index_of(&spec.field)
                    .ok_or_else(|| IngestError::UnknownFilterField {
                        field: spec.field.clone(),
                    })?;
                Ok(RecordFilter { field, pattern })
            })
            .transpose()?;
        Ok(Self {
            fields: fields.to_vec(),
            schema,
            filter,
        })
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Map the data rows of a sheet whose first row holds the headers.
    pub fn map_sheet(&self, sheet: &Sheet, path: &Path) -> (Vec<Record>, SourceSummary) {
        let binding = HeaderBinding::bind(sheet.header(), &self.fields);
        let unmatched_fields = binding.unmatched(&self.fields);
        if !unmatched_fields.is_empty() {
            tracing::warn!(
                path = %path.display(),
                fields = ?unmatched_fields,
                "no header matched configured fields"
            );
        }

        let mut summary = SourceSummary {
            path: path.to_path_buf(),
            unmatched_fields,
            ..SourceSummary::default()
        };
        let mut records = Vec::new();
        for row in sheet.data_rows() {
            summary.rows_read += 1;
            if !row.iter().any(Value::is_populated) {
                summary.skipped_empty += 1;
                continue;
            }
            let raw: Vec<Value> = (0..self.fields.len())
                .map(|field| match binding.column(field) {
                    Some(column) => row.get(column).cloned().unwrap_or(Value::Empty),
                    None => Value::Missing,
                })
                .collect();
            if !self.accepts(&raw) {
                summary.filtered_out += 1;
                continue;
            }
            let values = self
                .fields
                .iter()
                .zip(&raw)
                .map(|(field, value)| match field.fixer {
                    Some(kind) => apply_fixer(kind, value),
                    None => value.clone(),
                })
                .collect();
            tracing::trace!(row = summary.rows_read, ?values, "mapped record");
            records.push(Record::new(raw, values));
        }
        summary.records = records.len();
        tracing::info!(
            path = %path.display(),
            rows = summary.rows_read,
            records = summary.records,
            filtered = summary.filtered_out,
            "mapped source rows"
        );
        (records, summary)
    }

    fn accepts(&self, raw: &[Value]) -> bool {
        let Some(filter) = &self.filter else {
            return true;
        };
        let text = raw
            .get(filter.field)
            .and_then(Value::as_text)
            .unwrap_or_default();
        filter.pattern.is_match(&text)
    }
}
