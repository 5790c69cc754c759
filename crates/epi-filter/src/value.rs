//! Dimension values and filter predicates.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use epi_model::{Value, format_number};
use serde::{Deserialize, Serialize};

/// A record's value on one dimension. Totally ordered: blanks, then numbers, then text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DimValue {
    Blank,
    Number(f64),
    Text(String),
}

impl DimValue {
    fn rank(&self) -> u8 {
        match self {
            DimValue::Blank => 0,
            DimValue::Number(_) => 1,
            DimValue::Text(_) => 2,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, DimValue::Blank)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DimValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DimValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl PartialEq for DimValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DimValue {}

impl PartialOrd for DimValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DimValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (DimValue::Number(a), DimValue::Number(b)) => a.total_cmp(b),
            (DimValue::Text(a), DimValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for DimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimValue::Blank => Ok(()),
            DimValue::Number(number) => f.write_str(&format_number(*number)),
            DimValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&Value> for DimValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Missing | Value::Empty => DimValue::Blank,
            Value::Number(number) => DimValue::Number(*number),
            Value::Text(text) => DimValue::Text(text.clone()),
        }
    }
}

impl From<&str> for DimValue {
    fn from(value: &str) -> Self {
        DimValue::Text(value.to_string())
    }
}

impl From<f64> for DimValue {
    fn from(value: f64) -> Self {
        DimValue::Number(value)
    }
}

/// Active filter of one dimension.
///
/// Discrete dimensions hold a set of selected values; continuous ones hold
/// one inclusive range. The two never mix within a dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterPredicate {
    Values(BTreeSet<DimValue>),
    Range { min: DimValue, max: DimValue },
}

impl FilterPredicate {
    pub fn values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<DimValue>,
    {
        FilterPredicate::Values(values.into_iter().map(Into::into).collect())
    }

    /// Inclusive range; bounds may be given in either order.
    pub fn range(a: impl Into<DimValue>, b: impl Into<DimValue>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            FilterPredicate::Range { min: a, max: b }
        } else {
            FilterPredicate::Range { min: b, max: a }
        }
    }

    pub fn matches(&self, value: &DimValue) -> bool {
        match self {
            FilterPredicate::Values(values) => values.contains(value),
            FilterPredicate::Range { min, max } => !value.is_blank() && min <= value && value <= max,
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, FilterPredicate::Range { .. })
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterPredicate::Values(values) => {
                let parts: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            FilterPredicate::Range { min, max } => write!(f, "[{min} .. {max}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        let mut values = vec![
            DimValue::from("b"),
            DimValue::Number(2.0),
            DimValue::Blank,
            DimValue::Number(-1.0),
            DimValue::from("a"),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                DimValue::Blank,
                DimValue::Number(-1.0),
                DimValue::Number(2.0),
                DimValue::from("a"),
                DimValue::from("b"),
            ]
        );
    }

    #[test]
    fn test_range_is_inclusive_and_skips_blanks() {
        let range = FilterPredicate::range("2021-03-20", "2021-03-10");
        assert!(range.matches(&DimValue::from("2021-03-10")));
        assert!(range.matches(&DimValue::from("2021-03-20")));
        assert!(!range.matches(&DimValue::from("2021-03-21")));
        assert!(!FilterPredicate::range(0.0, 5.0).matches(&DimValue::Blank));
    }

    #[test]
    fn test_display() {
        assert_eq!(FilterPredicate::values(["M", "F"]).to_string(), "{F, M}");
        assert_eq!(FilterPredicate::range(1.0, 4.0).to_string(), "[1 .. 4]");
    }
}
