//! Header matching between source files and configured canonical keys.

use epi_model::{FieldSpec, Value};

/// Normalize a header for comparison.
///
/// Parenthesized groups are dropped, whitespace runs collapse to one space,
/// and the result is trimmed and lowercased, so `"Age (years)"` and
/// `" age "` compare equal.
pub fn normalize_header(raw: &str) -> String {
    let mut stripped = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find('(') {
        let Some(close) = rest[open..].find(')') else {
            break;
        };
        stripped.push_str(&rest[..open]);
        stripped.push(' ');
        rest = &rest[open + close + 1..];
    }
    stripped.push_str(rest);

    stripped
        .trim_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Column position bound to each configured field, aligned with the field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBinding {
    columns: Vec<Option<usize>>,
}

impl HeaderBinding {
    /// Bind header cells to fields. A field keeps the first column that matches;
    /// columns matching no field are ignored.
    pub fn bind(headers: &[Value], fields: &[FieldSpec]) -> Self {
        let wanted: Vec<String> = fields.iter().map(|f| normalize_header(&f.header)).collect();
        let mut columns = vec![None; fields.len()];
        for (column, header) in headers.iter().enumerate() {
            let Some(text) = header.as_text() else {
                continue;
            };
            let normalized = normalize_header(&text);
            for (slot, target) in columns.iter_mut().zip(&wanted) {
                if slot.is_none() && *target == normalized {
                    *slot = Some(column);
                }
            }
        }
        Self { columns }
    }

    pub fn column(&self, field: usize) -> Option<usize> {
        self.columns.get(field).copied().flatten()
    }

    /// Keys of fields that found no column.
    pub fn unmatched(&self, fields: &[FieldSpec]) -> Vec<String> {
        fields
            .iter()
            .zip(&self.columns)
            .filter(|(_, column)| column.is_none())
            .map(|(field, _)| field.key.clone())
            .collect()
    }
}
