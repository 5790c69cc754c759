use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single cell or field value.
///
/// Raw spreadsheet cells and normalized record fields share this type so the
/// data check can compare them side by side.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// No source column was bound to this field.
    #[default]
    Missing,
    /// The column exists but the cell is blank.
    Empty,
    Text(String),
    Number(f64),
}

impl Value {
    /// Build a value from delimited-text cell content.
    pub fn from_cell(raw: &str) -> Self {
        let trimmed = raw.trim().trim_matches('\u{feff}');
        if trimmed.is_empty() {
            Value::Empty
        } else {
            Value::Text(trimmed.to_string())
        }
    }

    /// Returns true for cells that carry content.
    pub fn is_populated(&self) -> bool {
        matches!(self, Value::Text(_) | Value::Number(_))
    }

    /// Text form of the value; numbers are rendered without a trailing `.0`.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Text(text) => Some(Cow::Borrowed(text.as_str())),
            Value::Number(number) => Some(Cow::Owned(format_number(*number))),
            Value::Missing | Value::Empty => None,
        }
    }

    /// Numeric form of the value, parsing text when needed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(number) if number.is_finite() => Some(*number),
            Value::Text(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

/// Format a number the way spreadsheet users expect to read it back.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
