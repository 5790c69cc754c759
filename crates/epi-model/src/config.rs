//! Plain-data configuration surface of a dashboard deployment.
//!
//! Everything a deployment customizes (header mapping, fixers, sources,
//! data-check rules, chart declarations, palettes, viewport) is described
//! here as typed data. Loading from disk lives in `epi-core`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::enums::{ClassificationMethod, ColorMode, MapUnit, MedicalDataType, PaletteKey};
use crate::error::{ModelError, Result};

/// Complete dashboard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub datatype: MedicalDataType,
    /// Canonical field keys and the source headers they map from, in order.
    pub fields: Vec<FieldSpec>,
    pub record_filter: Option<RecordFilterSpec>,
    /// Sources in load order.
    pub sources: Vec<SourceSpec>,
    pub geometry: GeometrySpec,
    pub population: PopulationHeaders,
    pub datacheck: DataCheckSpec,
    pub charts: Vec<ChartSpec>,
    pub global_filter: Option<GlobalFilterSpec>,
    pub colorscale: ColorScaleSpec,
    pub map: MapSpec,
    pub interaction: InteractionSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    pub header: String,
    #[serde(default)]
    pub fixer: Option<FixerKind>,
}

/// Per-field value normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixerKind {
    /// Numeric coercion with `[0, 120]` bounds, `-1` otherwise.
    Age,
    /// Numeric cells pass through, anything else becomes `-1`.
    AgeNumeric,
    Date,
    Diagnosis,
}

/// Row-level predicate applied to the raw value of one field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordFilterSpec {
    pub field: String,
    pub pattern: String,
}

/// One entry of the ordered load sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Data type group, e.g. `geometry`, `population`, `medical`.
    pub datatype: String,
    /// Source name; for geometry and population files this is the level key.
    pub name: String,
    #[serde(flatten)]
    pub method: SourceMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SourceMethod {
    /// Generic side layer stored by name.
    File {
        path: PathBuf,
        #[serde(default)]
        format: Option<FileFormat>,
    },
    /// GeoJSON feature collection for one administrative level.
    Geometry { path: PathBuf },
    /// Population read from a property of the already loaded geometry.
    PopulationGeometry { property: String },
    /// Population file for one level.
    PopulationFile { path: PathBuf },
    /// Folder of spreadsheet workbooks.
    MedicalXlsx {
        folder: PathBuf,
        #[serde(default)]
        sheet: Option<String>,
        #[serde(default)]
        extras: Vec<ExtraSpec>,
    },
    /// Folder of delimited text files.
    MedicalDelimited {
        folder: PathBuf,
        format: DelimitedFormat,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Json,
    Csv,
    Tsv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelimitedFormat {
    Csv,
    Tsv,
}

impl DelimitedFormat {
    pub fn delimiter(self) -> u8 {
        match self {
            DelimitedFormat::Csv => b',',
            DelimitedFormat::Tsv => b'\t',
        }
    }
}

/// Auxiliary range read from a workbook sheet.
///
/// `item_range` yields a list; `key_range` with `value_range` yields a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraSpec {
    pub name: String,
    pub sheet: String,
    #[serde(default)]
    pub item_range: Option<String>,
    #[serde(default)]
    pub key_range: Option<String>,
    #[serde(default)]
    pub value_range: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometrySpec {
    /// Level keys from root to leaf, e.g. `admN1`, `admN2`.
    pub levels: Vec<String>,
    /// Feature property holding each level's own name, aligned with `levels`.
    pub name_properties: Vec<String>,
    /// Parent level overrides for irregular trees; defaults to the previous level.
    pub parents: BTreeMap<String, String>,
}

impl GeometrySpec {
    /// Parent level of `level`, or `None` at the root.
    pub fn parent_of(&self, level: &str) -> Option<&str> {
        if let Some(parent) = self.parents.get(level) {
            return Some(parent.as_str());
        }
        let position = self.levels.iter().position(|l| l == level)?;
        position
            .checked_sub(1)
            .and_then(|p| self.levels.get(p))
            .map(String::as_str)
    }

    pub fn depth_of(&self, level: &str) -> Option<usize> {
        self.levels.iter().position(|l| l == level)
    }
}

/// Headers of population files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationHeaders {
    pub name: String,
    pub pop: String,
    /// Year columns; when non-empty each division carries one figure per year.
    pub years: Vec<String>,
}

impl Default for PopulationHeaders {
    fn default() -> Self {
        Self {
            name: "name".to_string(),
            pop: "pop".to_string(),
            years: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataCheckSpec {
    pub rules: BTreeMap<String, CheckRule>,
    /// Fields that identify a record in the error log.
    pub identifying_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "test", rename_all = "snake_case")]
pub enum CheckRule {
    None,
    /// `YYYY-WW`.
    Epiweek,
    Pattern { pattern: String },
    InGeometry,
    Integer,
    InList { values: Vec<String> },
}

/// Declaration of one chart or map layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    pub id: String,
    pub dimension: DimensionSpec,
    #[serde(default)]
    pub group: GroupSpec,
    pub kind: ChartKind,
    /// Palette indices used by this chart.
    #[serde(default)]
    pub display_colors: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "builder", rename_all = "snake_case")]
pub enum DimensionSpec {
    /// Discrete value of a field.
    Auto { column: String },
    /// ISO date of a field, filtered by range.
    Date { column: String },
    /// Number of a field, filtered by range.
    Integer { column: String },
    /// Composite administrative name down to a geometry level.
    AdminLevel { level: String },
    /// Reuse the dimension of another chart.
    Shared { with: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "builder", rename_all = "snake_case")]
pub enum GroupSpec {
    #[default]
    Count,
    Sum { field: String },
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartKind {
    Bar(BarParams),
    Row(RowParams),
    Pie,
    Choropleth(ChoroplethParams),
    Table(TableParams),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BarParams {
    pub x_label: String,
    pub y_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RowParams {
    pub y_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoroplethParams {
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableParams {
    pub columns: Vec<String>,
}

/// The "show only default categories" toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalFilterSpec {
    pub chart: String,
    #[serde(default = "default_all_values_extra")]
    pub all_values_extra: String,
    #[serde(default = "default_default_values_extra")]
    pub default_values_extra: String,
    #[serde(default)]
    pub enabled: bool,
}

fn default_all_values_extra() -> String {
    "diagnosis_all_values".to_string()
}

fn default_default_values_extra() -> String {
    "diagnosis_shown_by_default".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    /// Replace classified breaks with evenly nice-stepped ones.
    #[default]
    Nice,
    /// Keep the classified breaks.
    Raw,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScaleSpec {
    pub unit: MapUnit,
    pub units: Vec<MapUnit>,
    pub palette: PaletteKey,
    pub custom_palette: Vec<String>,
    pub method: ClassificationMethod,
    pub mode: ColorMode,
    pub rounding: Rounding,
    pub incidence_multiplier: f64,
    pub cases: GroupSpec,
    pub deaths: Option<GroupSpec>,
}

impl Default for ColorScaleSpec {
    fn default() -> Self {
        Self {
            unit: MapUnit::Cases,
            units: vec![
                MapUnit::Cases,
                MapUnit::Deaths,
                MapUnit::IncidenceProp,
                MapUnit::MortalityProp,
            ],
            palette: PaletteKey::Classic,
            custom_palette: Vec::new(),
            method: ClassificationMethod::Jenks,
            mode: ColorMode::Auto,
            rounding: Rounding::Nice,
            incidence_multiplier: 10_000.0,
            cases: GroupSpec::Count,
            deaths: None,
        }
    }
}

/// Map viewport as `[south_west, north_east]` latitude/longitude pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport(pub [[f64; 2]; 2]);

impl Default for Viewport {
    fn default() -> Self {
        Viewport([[-90.0, -180.0], [90.0, 180.0]])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSpec {
    pub default_bounds: Viewport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionSpec {
    /// Chart whose dimension drives autoplay and quick filters.
    pub timeline: Option<String>,
    /// Charts kept in step with the timeline.
    pub timeshare: Vec<String>,
    /// Chart holding the standing disease filter.
    pub disease_chart: Option<String>,
    pub autoplay_delay_ms: u64,
    pub autoplay_rewind: bool,
    pub transition_ms: u64,
    pub quick_filters: Vec<usize>,
}

impl Default for InteractionSpec {
    fn default() -> Self {
        Self {
            timeline: None,
            timeshare: Vec::new(),
            disease_chart: None,
            autoplay_delay_ms: 2000,
            autoplay_rewind: false,
            transition_ms: 200,
            quick_filters: vec![4, 8, 12],
        }
    }
}

impl DashboardConfig {
    pub fn field_keys(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.key.clone()).collect()
    }

    pub fn chart(&self, id: &str) -> Option<&ChartSpec> {
        self.charts.iter().find(|c| c.id == id)
    }

    /// Check cross references between sections.
    pub fn validate(&self) -> Result<()> {
        let mut fields = BTreeSet::new();
        for field in &self.fields {
            if !fields.insert(field.key.as_str()) {
                return Err(ModelError::DuplicateField {
                    key: field.key.clone(),
                });
            }
        }
        let require_field = |context: &str, key: &str| -> Result<()> {
            if fields.contains(key) {
                Ok(())
            } else {
                Err(ModelError::UnknownField {
                    context: context.to_string(),
                    key: key.to_string(),
                })
            }
        };
        let require_level = |context: &str, level: &str| -> Result<()> {
            if self.geometry.levels.iter().any(|l| l == level) {
                Ok(())
            } else {
                Err(ModelError::UnknownLevel {
                    context: context.to_string(),
                    level: level.to_string(),
                })
            }
        };

        if let Some(filter) = &self.record_filter {
            require_field("record_filter", &filter.field)?;
        }
        for key in self.datacheck.rules.keys() {
            require_field("datacheck.rules", key)?;
        }
        for key in &self.datacheck.identifying_fields {
            require_field("datacheck.identifying_fields", key)?;
        }

        let mut charts = BTreeSet::new();
        for chart in &self.charts {
            if !charts.insert(chart.id.as_str()) {
                return Err(ModelError::DuplicateChart {
                    id: chart.id.clone(),
                });
            }
        }
        for chart in &self.charts {
            let context = format!("chart '{}'", chart.id);
            match &chart.dimension {
                DimensionSpec::Auto { column }
                | DimensionSpec::Date { column }
                | DimensionSpec::Integer { column } => require_field(&context, column)?,
                DimensionSpec::AdminLevel { level } => require_level(&context, level)?,
                DimensionSpec::Shared { with } => {
                    if !charts.contains(with.as_str()) {
                        return Err(ModelError::UnknownChart {
                            context,
                            id: with.clone(),
                        });
                    }
                }
            }
            if let GroupSpec::Sum { field } = &chart.group {
                require_field(&context, field)?;
            }
            if let ChartKind::Choropleth(params) = &chart.kind {
                require_level(&context, &params.level)?;
            }
        }

        let require_chart = |context: &str, id: &str| -> Result<()> {
            if charts.contains(id) {
                Ok(())
            } else {
                Err(ModelError::UnknownChart {
                    context: context.to_string(),
                    id: id.to_string(),
                })
            }
        };
        if let Some(global) = &self.global_filter {
            require_chart("global_filter", &global.chart)?;
        }
        if let Some(timeline) = &self.interaction.timeline {
            require_chart("interaction.timeline", timeline)?;
        }
        for id in &self.interaction.timeshare {
            require_chart("interaction.timeshare", id)?;
        }
        if let Some(disease) = &self.interaction.disease_chart {
            require_chart("interaction.disease_chart", disease)?;
        }
        for level in self.geometry.parents.keys().chain(self.geometry.parents.values()) {
            require_level("geometry.parents", level)?;
        }
        Ok(())
    }
}
