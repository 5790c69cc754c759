//! Chart registry: one handle per declared chart, looked up by id.

use std::fmt;

use epi_model::{ChartKind, ChartSpec, DimensionSpec, GeometrySpec, GroupSpec};
use tracing::debug;

use crate::crossfilter::{CrossFilter, DimensionId, DimensionKind, DimensionSource};
use crate::error::{FilterError, Result};
use crate::value::DimValue;
use crate::view::ChartView;

/// Handles of one chart: its declaration, bound dimension and optional view.
pub struct ChartHandle {
    pub spec: ChartSpec,
    pub dimension: DimensionId,
    pub kind: DimensionKind,
    /// Bin keys forced onto the view, in order, regardless of the data.
    pub fixed_domain: Option<Vec<DimValue>>,
    view: Option<Box<dyn ChartView>>,
}

impl fmt::Debug for ChartHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartHandle")
            .field("id", &self.spec.id)
            .field("dimension", &self.dimension)
            .field("kind", &self.kind)
            .field("has_view", &self.view.is_some())
            .finish_non_exhaustive()
    }
}

impl ChartHandle {
    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn group(&self) -> &GroupSpec {
        &self.spec.group
    }

    pub fn is_choropleth(&self) -> bool {
        matches!(self.spec.kind, ChartKind::Choropleth(_))
    }

    /// Geometry level drawn by a choropleth.
    pub fn map_level(&self) -> Option<&str> {
        match &self.spec.kind {
            ChartKind::Choropleth(params) => Some(&params.level),
            _ => None,
        }
    }

    pub fn view_mut(&mut self) -> Option<&mut (dyn ChartView + 'static)> {
        self.view.as_deref_mut()
    }

    pub fn has_view(&self) -> bool {
        self.view.is_some()
    }
}

/// Charts in declaration order.
#[derive(Debug, Default)]
pub struct ChartRegistry {
    handles: Vec<ChartHandle>,
}

impl ChartRegistry {
    /// Build every chart's dimension on `filter`.
    ///
    /// Shared dimensions must name a chart declared earlier.
    pub fn build(charts: &[ChartSpec], geometry: &GeometrySpec, filter: &mut CrossFilter) -> Result<Self> {
        let mut registry = Self::default();
        for spec in charts {
            if registry.position(&spec.id).is_some() {
                return Err(FilterError::DuplicateChart { id: spec.id.clone() });
            }
            let (dimension, kind) = match &spec.dimension {
                DimensionSpec::Shared { with } => {
                    let target = registry.get(with).map_err(|_| FilterError::UnresolvedShare {
                        chart: spec.id.clone(),
                    })?;
                    (target.dimension, target.kind)
                }
                other => {
                    let resolved = DimensionSource::resolve(other, filter.records(), geometry)
                        .map_err(|name| match other {
                            DimensionSpec::AdminLevel { .. } => FilterError::UnknownLevel {
                                chart: spec.id.clone(),
                                level: name,
                            },
                            _ => FilterError::UnknownField {
                                chart: spec.id.clone(),
                                field: name,
                            },
                        })?;
                    let Some((source, kind)) = resolved else {
                        return Err(FilterError::UnresolvedShare { chart: spec.id.clone() });
                    };
                    (filter.add_dimension(source, kind), kind)
                }
            };
            debug!(chart = %spec.id, kind = kind.label(), "Registered chart");
            registry.handles.push(ChartHandle {
                spec: spec.clone(),
                dimension,
                kind,
                fixed_domain: None,
                view: None,
            });
        }
        Ok(registry)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.handles.iter().position(|h| h.spec.id == id)
    }

    pub fn get(&self, id: &str) -> Result<&ChartHandle> {
        self.position(id)
            .map(|i| &self.handles[i])
            .ok_or_else(|| FilterError::UnknownChart { id: id.to_string() })
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut ChartHandle> {
        match self.position(id) {
            Some(i) => Ok(&mut self.handles[i]),
            None => Err(FilterError::UnknownChart { id: id.to_string() }),
        }
    }

    pub fn attach_view(&mut self, id: &str, view: Box<dyn ChartView>) -> Result<()> {
        self.get_mut(id)?.view = Some(view);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChartHandle> {
        self.handles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ChartHandle> {
        self.handles.iter_mut()
    }

    /// Declarations and attached views, in declaration order.
    pub fn views_mut(&mut self) -> impl Iterator<Item = (&ChartSpec, &mut (dyn ChartView + 'static))> {
        self.handles.iter_mut().filter_map(|handle| {
            let ChartHandle { spec, view, .. } = handle;
            view.as_deref_mut().map(|view| (&*spec, view))
        })
    }

    /// Ids of every chart bound to `dimension`.
    pub fn bound_to(&self, dimension: DimensionId) -> Vec<&str> {
        self.handles
            .iter()
            .filter(|h| h.dimension == dimension)
            .map(ChartHandle::id)
            .collect()
    }

    pub fn choropleths(&self) -> impl Iterator<Item = &ChartHandle> {
        self.handles.iter().filter(|h| h.is_choropleth())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
