//! Error types for medical data ingestion.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading sources.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// File uses an encoding other than UTF-8.
    #[error("unsupported encoding {encoding} in {path}")]
    UnsupportedEncoding {
        path: PathBuf,
        encoding: &'static str,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Parsing Errors ===
    /// Failed to parse delimited text.
    #[error("failed to parse {path}: {source}")]
    Delimited {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Failed to open or read a spreadsheet workbook.
    #[error("failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    /// Failed to parse JSON.
    #[error("failed to parse JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Named sheet is absent from a workbook.
    #[error("sheet '{sheet}' not found in {path}")]
    SheetNotFound { path: PathBuf, sheet: String },

    /// Workbook contains no sheet.
    #[error("workbook {path} has no sheets")]
    NoSheets { path: PathBuf },

    // === Configuration Errors ===
    /// Cell range is not in `A1` or `A1:B2` notation.
    #[error("invalid cell range '{range}'")]
    InvalidRange { range: String },

    /// Record filter pattern does not compile.
    #[error("invalid record filter pattern '{pattern}': {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Record filter names a field that is not configured.
    #[error("record filter field '{field}' is not a configured field")]
    UnknownFilterField { field: String },

    /// Selected file is not part of the medical folder.
    #[error("{path} is not in the medical folder")]
    NotInFolder { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, IngestError>;
