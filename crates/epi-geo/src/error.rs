//! Error types for geometry and population loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading boundary or population files.
#[derive(Debug, Error)]
pub enum GeoError {
    // === Source Errors ===
    /// The underlying file could not be read or parsed.
    #[error(transparent)]
    Source(#[from] epi_ingest::IngestError),

    // === Content Errors ===
    /// JSON is valid but not a GeoJSON feature collection.
    #[error("{path} is not a GeoJSON feature collection: {source}")]
    NotFeatureCollection {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Population file lacks the configured name column.
    #[error("population file {path} has no '{header}' column")]
    MissingPopulationHeader { path: PathBuf, header: String },

    /// Population file holds neither rows nor an array of objects.
    #[error("population file {path} has an unsupported layout")]
    UnsupportedPopulationLayout { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, GeoError>;
