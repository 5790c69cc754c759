//! The ordered load sequence over configured sources.
//!
//! Sources load strictly in configuration order, so a source may rely on
//! every earlier one being resident (population from geometry needs the
//! geometry index). Every path through [`LoadSequence::step`] advances the
//! cursor; a source that fails becomes a [`LoadNotice`] and loading goes on.

use std::fmt;
use std::sync::Arc;

use epi_geo::{FeatureCollection, PopulationResolver, read_population_file};
use epi_ingest::{FieldMapper, MedicalSource, RecordLoader, read_side_layer};
use epi_model::{SourceMethod, SourceSpec};
use tracing::{debug, error, info, warn};

use crate::context::{DashboardContext, MedicalState};
use crate::error::{CoreError, Result};

/// Restricts a sequence to some sources, matched by name or data type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFilter {
    /// Load everything except this source.
    Skip(String),
    /// Load only this source.
    Only(String),
}

impl SourceFilter {
    pub fn admits(&self, source: &SourceSpec) -> bool {
        let matches = |key: &str| source.name == key || source.datatype == key;
        match self {
            SourceFilter::Skip(key) => !matches(key),
            SourceFilter::Only(key) => matches(key),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Next source to load.
    Loading { cursor: usize },
    /// Every source has been visited.
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// The source, or one of its files, could not be read.
    Failed,
    /// The source's method is not one this build can load.
    Unsupported,
}

/// A user-visible, non-blocking report about one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadNotice {
    pub datatype: String,
    pub name: String,
    pub kind: NoticeKind,
    pub message: String,
}

impl LoadNotice {
    fn new(source: &SourceSpec, kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            datatype: source.datatype.clone(),
            name: source.name.clone(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for LoadNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: {}", self.datatype, self.name, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOutcome {
    Loaded,
    /// Left out by the sequence's [`SourceFilter`].
    Filtered,
    Unsupported,
    Failed,
}

/// What one step of the sequence did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadStep {
    pub index: usize,
    pub name: String,
    pub outcome: SourceOutcome,
}

/// State machine with one state per source and a terminal state.
#[derive(Debug, Clone)]
pub struct LoadSequence {
    sources: Vec<SourceSpec>,
    filter: Option<SourceFilter>,
    state: LoadState,
    /// Position after which the geometry index is built.
    last_geometry: Option<usize>,
}

impl LoadSequence {
    pub fn new(sources: &[SourceSpec]) -> Self {
        let state = if sources.is_empty() {
            LoadState::Complete
        } else {
            LoadState::Loading { cursor: 0 }
        };
        Self {
            sources: sources.to_vec(),
            filter: None,
            state,
            last_geometry: sources
                .iter()
                .rposition(|source| matches!(source.method, SourceMethod::Geometry { .. })),
        }
    }

    pub fn with_filter(mut self, filter: Option<SourceFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == LoadState::Complete
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Source under the cursor.
    pub fn current(&self) -> Option<&SourceSpec> {
        match self.state {
            LoadState::Loading { cursor } => self.sources.get(cursor),
            LoadState::Complete => None,
        }
    }

    /// Load the source under the cursor and advance. `None` once complete.
    pub fn step(&mut self, context: &mut DashboardContext) -> Option<LoadStep> {
        let LoadState::Loading { cursor } = self.state else {
            return None;
        };
        let Some(source) = self.sources.get(cursor) else {
            self.state = LoadState::Complete;
            return None;
        };
        debug!(cursor, datatype = %source.datatype, source = %source.name, "Loading source");

        let admitted = self.filter.as_ref().is_none_or(|filter| filter.admits(source));
        let outcome = if !admitted {
            debug!(source = %source.name, "Source filtered out");
            SourceOutcome::Filtered
        } else {
            match load_source(context, source) {
                Ok(true) => SourceOutcome::Loaded,
                Ok(false) => {
                    warn!(source = %source.name, "No loader for this source method, skipping");
                    context.notices.push(LoadNotice::new(
                        source,
                        NoticeKind::Unsupported,
                        "source method is not supported",
                    ));
                    SourceOutcome::Unsupported
                }
                Err(e) => {
                    error!(source = %source.name, error = %e, "Failed to load source");
                    context
                        .notices
                        .push(LoadNotice::new(source, NoticeKind::Failed, e.to_string()));
                    SourceOutcome::Failed
                }
            }
        };
        let step = LoadStep {
            index: cursor,
            name: source.name.clone(),
            outcome,
        };

        if self.last_geometry == Some(cursor) {
            context.process_geometry();
        }
        self.state = if cursor + 1 < self.sources.len() {
            LoadState::Loading { cursor: cursor + 1 }
        } else {
            info!(
                sources = self.sources.len(),
                notices = context.notices.len(),
                "Last source read"
            );
            LoadState::Complete
        };
        Some(step)
    }

    /// Step until complete.
    pub fn run(mut self, context: &mut DashboardContext) -> Vec<LoadStep> {
        let mut steps = Vec::with_capacity(self.sources.len());
        while let Some(step) = self.step(context) {
            steps.push(step);
        }
        steps
    }
}

/// Load one source into the context. `Ok(false)` for an unknown method.
fn load_source(context: &mut DashboardContext, source: &SourceSpec) -> Result<bool> {
    match &source.method {
        SourceMethod::File { path, format } => {
            let path = context.resolve(path);
            let layer = read_side_layer(&path, *format)?;
            info!(source = %source.name, path = %path.display(), entries = layer.entry_count(), "Loaded side layer");
            context.layers.insert(source.name.clone(), layer);
        }
        SourceMethod::Geometry { path } => {
            let path = context.resolve(path);
            let collection = FeatureCollection::read(&path)?;
            info!(
                level = %source.name,
                path = %path.display(),
                features = collection.features.len(),
                "Loaded geometry"
            );
            context.collections.insert(source.name.clone(), collection);
        }
        SourceMethod::PopulationGeometry { property } => {
            let geometry = context.geometry.as_ref().ok_or_else(|| CoreError::GeometryMissing {
                name: source.name.clone(),
            })?;
            let table = PopulationResolver::new(geometry).from_geometry(property);
            context.population.merge(table);
        }
        SourceMethod::PopulationFile { path } => {
            let path = context.resolve(path);
            let geometry = context.geometry.as_ref().ok_or_else(|| CoreError::GeometryMissing {
                name: source.name.clone(),
            })?;
            let rows = read_population_file(&path, &context.config.population)?;
            let population = PopulationResolver::new(geometry).from_rows(&source.name, rows);
            context.population.insert(source.name.clone(), population);
        }
        SourceMethod::MedicalXlsx { .. } | SourceMethod::MedicalDelimited { .. } => {
            load_medical(context, source)?;
        }
        SourceMethod::Unknown => return Ok(false),
    }
    Ok(true)
}

fn load_medical(context: &mut DashboardContext, source: &SourceSpec) -> Result<()> {
    let Some(mut medical) = MedicalSource::from_method(&source.method) else {
        return Ok(());
    };
    medical.folder = context.resolve(&medical.folder);
    let mapper = FieldMapper::new(&context.config.fields, context.config.record_filter.as_ref())?;
    let selection = medical.discover()?;
    let loader = RecordLoader::new(mapper, medical);
    let loaded = loader.load_selection(&selection);
    for failure in &loaded.failures {
        context
            .notices
            .push(LoadNotice::new(source, NoticeKind::Failed, failure.to_string()));
    }
    info!(
        source = %source.name,
        files = selection.selected().len(),
        records = loaded.records.len(),
        "Loaded medical records"
    );
    context.records = Arc::new(loaded.records);
    context.medical = Some(MedicalState { loader, selection });
    Ok(())
}
