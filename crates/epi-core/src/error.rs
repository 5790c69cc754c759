//! Error types for the dashboard core.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // === Configuration Errors ===
    #[error("failed to read configuration {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML configuration {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] epi_model::ModelError),

    // === Source Errors ===
    #[error(transparent)]
    Ingest(#[from] epi_ingest::IngestError),

    #[error(transparent)]
    Geo(#[from] epi_geo::GeoError),

    /// Geometry-dependent source reached before any geometry was processed.
    #[error("source '{name}' needs geometry, none is loaded")]
    GeometryMissing { name: String },

    // === Session Errors ===
    #[error(transparent)]
    Filter(#[from] epi_filter::FilterError),

    /// No medical source was loaded, so there is nothing to reload.
    #[error("no medical source is loaded")]
    NoMedicalSource,
}

pub type Result<T> = std::result::Result<T, CoreError>;
