//! Error types for filter coordination.

use thiserror::Error;

/// Errors that can occur while building charts or applying filters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    // === Registry Errors ===
    /// No chart with this id is registered.
    #[error("unknown chart '{id}'")]
    UnknownChart { id: String },

    /// Chart id registered twice.
    #[error("chart '{id}' is already registered")]
    DuplicateChart { id: String },

    /// Dimension refers to a field absent from the record schema.
    #[error("chart '{chart}' uses unknown field '{field}'")]
    UnknownField { chart: String, field: String },

    /// Dimension refers to a level absent from the geometry levels.
    #[error("chart '{chart}' uses unknown level '{level}'")]
    UnknownLevel { chart: String, level: String },

    /// Shared dimension chain never reaches a concrete dimension.
    #[error("chart '{chart}' shares a dimension that is not registered before it")]
    UnresolvedShare { chart: String },

    // === Predicate Errors ===
    /// Range predicate on a discrete dimension, or value set on a continuous one.
    #[error("chart '{chart}' is {expected}, predicate does not fit")]
    PredicateKind {
        chart: String,
        expected: &'static str,
    },

    /// Timeline operation without a configured timeline chart.
    #[error("no timeline chart is configured")]
    NoTimeline,
}

pub type Result<T> = std::result::Result<T, FilterError>;
