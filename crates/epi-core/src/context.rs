//! Explicit state of one dashboard session.
//!
//! # Architecture
//!
//! The [`DashboardContext`] is built from a configuration and filled in by
//! the load sequence, one source at a time:
//!
//! - **Configuration**: the injected [`DashboardConfig`] and the directory its paths are relative to
//! - **Geometry**: feature collections per level, then the [`GeometryIndex`] once the last one is read
//! - **Population**: resolved figures per level ([`PopulationTable`])
//! - **Records**: the canonical [`RecordSet`] with the loader and file selection that produced it
//! - **Side layers**: generic files stored by source name
//! - **Notices**: sources that could not be read

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use epi_geo::{FeatureCollection, GeometryIndex, PopulationTable};
use epi_ingest::{MedicalSelection, RecordLoader, SideLayer};
use epi_model::{DashboardConfig, GeometrySpec, RecordSet, SourceMethod};

use crate::config::{load_config, resolve_path};
use crate::error::Result;
use crate::load::LoadNotice;

/// The loader of the medical source and the files currently selected.
#[derive(Debug, Clone)]
pub struct MedicalState {
    pub loader: RecordLoader,
    pub selection: MedicalSelection,
}

/// Everything a session knows, passed explicitly to each component.
#[derive(Debug)]
pub struct DashboardContext {
    /// Configuration the session was started with.
    pub config: DashboardConfig,
    /// Directory relative source paths are resolved against.
    pub base_dir: PathBuf,
    /// Raw feature collections by level key.
    pub collections: BTreeMap<String, FeatureCollection>,
    /// Built once every geometry source has been read.
    pub geometry: Option<GeometryIndex>,
    pub population: PopulationTable,
    /// Canonical records shared with the filter coordinator.
    pub records: Arc<RecordSet>,
    pub medical: Option<MedicalState>,
    /// Generic file sources by name.
    pub layers: BTreeMap<String, SideLayer>,
    /// Sources that failed or were skipped during loading.
    pub notices: Vec<LoadNotice>,
}

impl DashboardContext {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            base_dir: PathBuf::from("."),
            collections: BTreeMap::new(),
            geometry: None,
            population: PopulationTable::default(),
            records: Arc::new(RecordSet::default()),
            medical: None,
            layers: BTreeMap::new(),
            notices: Vec::new(),
        }
    }

    /// Load the configuration at `path`; relative sources resolve next to it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config = load_config(path)?;
        let base_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(Self::new(config).with_base_dir(base_dir))
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        resolve_path(&self.base_dir, path)
    }

    /// Geometry levels in effect.
    ///
    /// Without configured levels, the geometry sources' names are the levels,
    /// in load order.
    pub fn geometry_spec(&self) -> GeometrySpec {
        let mut spec = self.config.geometry.clone();
        if spec.levels.is_empty() {
            spec.levels = self
                .config
                .sources
                .iter()
                .filter(|source| matches!(source.method, SourceMethod::Geometry { .. }))
                .map(|source| source.name.clone())
                .collect();
        }
        spec
    }

    /// Build the geometry index from the collections read so far.
    pub fn process_geometry(&mut self) {
        let spec = self.geometry_spec();
        let index = GeometryIndex::build(&spec, &self.collections);
        tracing::info!(
            levels = index.level_keys().count(),
            divisions = index.all_names().len(),
            "Processed geometry"
        );
        self.geometry = Some(index);
    }

    /// Selected medical files, when a medical source was loaded.
    pub fn medical_selection(&self) -> Option<&MedicalSelection> {
        self.medical.as_ref().map(|medical| &medical.selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epi_model::SourceSpec;

    fn geometry_source(name: &str) -> SourceSpec {
        SourceSpec {
            datatype: "geometry".to_string(),
            name: name.to_string(),
            method: SourceMethod::Geometry {
                path: format!("{name}.geojson").into(),
            },
        }
    }

    #[test]
    fn test_levels_default_to_geometry_sources() {
        let config = DashboardConfig {
            sources: vec![geometry_source("admN1"), geometry_source("admN2")],
            ..DashboardConfig::default()
        };
        let context = DashboardContext::new(config);
        assert_eq!(context.geometry_spec().levels, ["admN1", "admN2"]);
    }

    #[test]
    fn test_configured_levels_win() {
        let mut config = DashboardConfig {
            sources: vec![geometry_source("admN1")],
            ..DashboardConfig::default()
        };
        config.geometry.levels = vec!["district".to_string()];
        let context = DashboardContext::new(config);
        assert_eq!(context.geometry_spec().levels, ["district"]);
    }

    #[test]
    fn test_resolve_against_base_dir() {
        let context = DashboardContext::new(DashboardConfig::default()).with_base_dir("/srv");
        assert_eq!(context.resolve(Path::new("geo.json")), PathBuf::from("/srv/geo.json"));
    }
}
