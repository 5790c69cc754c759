//! Data model for the epidemiological dashboard.
//!
//! Holds the canonical record shape shared by every stage of the pipeline and
//! the typed configuration surface injected into each component.

pub mod config;
pub mod enums;
pub mod error;
pub mod record;
pub mod value;

// === Error Types ===
pub use error::{ModelError, Result};

// === Records ===
pub use record::{
    ExtraValue, Extras, FieldObservation, FieldSchema, Record, RecordSet, SourceSummary,
};
pub use value::{Value, format_number};

// === Enumerations ===
pub use enums::{ClassificationMethod, ColorMode, MapUnit, MedicalDataType, PaletteKey};

// === Configuration ===
pub use config::{
    BarParams, ChartKind, ChartSpec, CheckRule, ChoroplethParams, ColorScaleSpec,
    DashboardConfig, DataCheckSpec, DelimitedFormat, DimensionSpec, ExtraSpec, FieldSpec,
    FileFormat, FixerKind, GeometrySpec, GlobalFilterSpec, GroupSpec, InteractionSpec, MapSpec,
    PopulationHeaders, RecordFilterSpec, Rounding, RowParams, SourceMethod, SourceSpec,
    TableParams, Viewport,
};
