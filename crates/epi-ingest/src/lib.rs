//! Medical data ingestion for the epidemiological dashboard.
//!
//! Reads line-list or aggregated medical sources into the canonical
//! [`RecordSet`](epi_model::RecordSet).
//!
//! # Features
//!
//! - **Header Mapping**: match source headers to configured keys regardless of case, spacing or parenthesized notes
//! - **Value Fixers**: dates, ages and ICD-10 diagnosis headings, never failing
//! - **Loading**: spreadsheet workbooks and delimited text, one or more files merged in folder order
//! - **Extras**: list and key/value ranges from auxiliary sheets
//! - **Fingerprint**: SHA-256 digest to check that reloads are identical
//!
//! # Example
//!
//! ```ignore
//! use epi_ingest::{FieldMapper, MedicalSource, RecordLoader};
//!
//! let mapper = FieldMapper::new(&config.fields, config.record_filter.as_ref())?;
//! let source = MedicalSource::from_method(&spec.method).unwrap();
//! let selection = source.discover()?;
//! let loaded = RecordLoader::new(mapper, source).load_selection(&selection);
//! ```

mod discovery;
mod error;
mod extras;
mod fingerprint;
mod fixers;
mod header;
mod icd10;
mod loader;
mod mapper;
mod reader;
mod sheet;

// === Error Types ===
pub use error::{IngestError, Result};

// === Field Mapping ===
pub use fixers::{
    AGE_SENTINEL, MAX_AGE, apply_fixer, excel_serial, fix_age, fix_age_numeric, fix_date,
    fix_diagnosis,
};
pub use header::{HeaderBinding, normalize_header};
pub use icd10::{icd10_heading, icd10_heading_count};
pub use mapper::FieldMapper;

// === Reading ===
pub use extras::read_extras;
pub use reader::{
    SideLayer, format_from_extension, read_delimited, read_json, read_side_layer, read_workbook,
    validate_encoding,
};
pub use sheet::{CellRange, CellRef, Sheet, Workbook};

// === Loading ===
pub use discovery::{MedicalFormat, MedicalSelection, list_medical_files};
pub use fingerprint::fingerprint;
pub use loader::{LoadedRecords, MedicalSource, RecordLoader};
