//! Data check issue types.
//!
//! Per-record issues carry the identifying tuple of the record they were
//! found in; systematic warnings describe the whole load.

use serde::{Deserialize, Serialize};

/// Issue severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Value is wrong
    Error,
    /// Value is absent
    Empty,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Empty => "Empty",
        }
    }
}

/// A problem with one field of one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Issue {
    /// Field is blank in the source.
    Empty,
    /// Not a `YYYY-WW` epidemiological week.
    NotEpiweek { value: String },
    /// Does not match the configured pattern.
    PatternMismatch { value: String, pattern: String },
    NotInteger { value: String },
    NotInList { value: String },
    /// Composite name not found at the field's geometry level.
    GeometryMismatch {
        name: String,
        suggestion: Option<String>,
    },
}

impl Issue {
    pub fn severity(&self) -> Severity {
        match self {
            Issue::Empty => Severity::Empty,
            _ => Severity::Error,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Issue::Empty => "value is empty".to_string(),
            Issue::NotEpiweek { value } => format!("'{value}' is not an epidemiological week (YYYY-WW)"),
            Issue::PatternMismatch { value, pattern } => {
                format!("'{value}' does not match '{pattern}'")
            }
            Issue::NotInteger { value } => format!("'{value}' is not an integer"),
            Issue::NotInList { value } => format!("'{value}' is not an accepted value"),
            Issue::GeometryMismatch { name, suggestion } => match suggestion {
                Some(suggestion) => format!("'{name}' not found in geometry (did you mean '{suggestion}'?)"),
                None => format!("'{name}' not found in geometry"),
            },
        }
    }
}

/// An issue located in the record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordIssue {
    pub field: String,
    pub record: usize,
    /// Values of the identifying fields of the record.
    pub record_key: Vec<String>,
    pub raw: String,
    pub value: String,
    pub issue: Issue,
}

/// A condition affecting every record, reported once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystematicWarning {
    /// No source header matched the field in any loaded file.
    UnmatchedField { field: String },
    /// No division at this level has a population figure.
    UnresolvedPopulation { level: String, divisions: usize },
    /// Geometry rule on a field whose level has no loaded geometry.
    MissingGeometryLevel { field: String },
    /// Pattern rule that does not compile.
    InvalidPattern { field: String, pattern: String },
}

impl SystematicWarning {
    pub fn message(&self) -> String {
        match self {
            SystematicWarning::UnmatchedField { field } => {
                format!("no column matched field '{field}' in any source")
            }
            SystematicWarning::UnresolvedPopulation { level, divisions } => {
                format!("no population figure for any of the {divisions} divisions of level '{level}'")
            }
            SystematicWarning::MissingGeometryLevel { field } => {
                format!("field '{field}' is checked against geometry that was not loaded")
            }
            SystematicWarning::InvalidPattern { field, pattern } => {
                format!("pattern '{pattern}' for field '{field}' is not a valid regular expression")
            }
        }
    }
}
