//! Closed enumerations shared across the dashboard crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Shape of the medical data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedicalDataType {
    /// Line list: one record per patient.
    #[default]
    Outbreak,
    /// Aggregated counts per division and period.
    Surveillance,
}

/// Metric shown on the choropleth maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MapUnit {
    #[default]
    Cases,
    Deaths,
    IncidenceProp,
    MortalityProp,
    Completeness,
}

impl MapUnit {
    pub const ALL: [MapUnit; 5] = [
        MapUnit::Cases,
        MapUnit::Deaths,
        MapUnit::IncidenceProp,
        MapUnit::MortalityProp,
        MapUnit::Completeness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MapUnit::Cases => "Cases",
            MapUnit::Deaths => "Deaths",
            MapUnit::IncidenceProp => "IncidenceProp",
            MapUnit::MortalityProp => "MortalityProp",
            MapUnit::Completeness => "Completeness",
        }
    }

    /// Rates get fractional nice steps; counts and percentages get integer ones.
    pub fn is_rate(&self) -> bool {
        matches!(self, MapUnit::IncidenceProp | MapUnit::MortalityProp)
    }
}

impl fmt::Display for MapUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class-break computation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClassificationMethod {
    /// Natural breaks.
    #[default]
    Jenks,
    EqInterval,
    ArithmeticProgression,
    GeometricProgression,
    Quantile,
}

impl ClassificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationMethod::Jenks => "Jenks",
            ClassificationMethod::EqInterval => "EqInterval",
            ClassificationMethod::ArithmeticProgression => "ArithmeticProgression",
            ClassificationMethod::GeometricProgression => "GeometricProgression",
            ClassificationMethod::Quantile => "Quantile",
        }
    }
}

impl fmt::Display for ClassificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When the color scale follows the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMode {
    /// Recompute on every filter change.
    #[default]
    Auto,
    /// Recompute only when explicitly requested.
    Manual,
}

impl ColorMode {
    pub fn toggled(self) -> Self {
        match self {
            ColorMode::Auto => ColorMode::Manual,
            ColorMode::Manual => ColorMode::Auto,
        }
    }
}

/// Named color palette. `Composite` uses the configured custom colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaletteKey {
    #[default]
    Classic,
    Diverging,
    Qualitative,
    ReversedDiverging,
    Composite,
}

impl PaletteKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaletteKey::Classic => "Classic",
            PaletteKey::Diverging => "Diverging",
            PaletteKey::Qualitative => "Qualitative",
            PaletteKey::ReversedDiverging => "ReversedDiverging",
            PaletteKey::Composite => "Composite",
        }
    }
}

impl fmt::Display for PaletteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
