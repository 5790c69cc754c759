//! Error types for configuration validation.

use thiserror::Error;

/// Errors raised while validating a dashboard configuration.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The same canonical field key is declared twice.
    #[error("field '{key}' is declared more than once")]
    DuplicateField { key: String },

    /// A configuration section refers to a field that is not declared.
    #[error("{context} refers to unknown field '{key}'")]
    UnknownField { context: String, key: String },

    /// The same chart id is declared twice.
    #[error("chart '{id}' is declared more than once")]
    DuplicateChart { id: String },

    /// A configuration section refers to a chart that is not declared.
    #[error("{context} refers to unknown chart '{id}'")]
    UnknownChart { context: String, id: String },

    /// A configuration section refers to a geometry level that is not declared.
    #[error("{context} refers to unknown geometry level '{level}'")]
    UnknownLevel { context: String, level: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
