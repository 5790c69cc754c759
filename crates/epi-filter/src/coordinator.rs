//! Filter coordination across every registered chart.
//!
//! Every mutation updates one dimension's predicate, pushes the predicate to
//! each view bound to that dimension, then redraws every view (or leaves that
//! to the caller, see [`FilterCoordinator::set_redraw_deferred`]). Views never
//! hold filter state of their own.

use std::collections::BTreeMap;
use std::sync::Arc;

use epi_model::{DashboardConfig, GroupSpec, RecordSet, Viewport};
use tracing::{debug, trace};

use crate::crossfilter::{CrossFilter, DimensionId, DimensionKind};
use crate::error::{FilterError, Result};
use crate::registry::{ChartHandle, ChartRegistry};
use crate::value::{DimValue, FilterPredicate};
use crate::view::{ChartSnapshot, ChartView, GroupBin};

/// A filter restored by reset-all instead of being cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingFilter {
    pub chart: String,
    pub predicate: FilterPredicate,
}

#[derive(Debug)]
pub struct FilterCoordinator {
    filter: CrossFilter,
    registry: ChartRegistry,
    default_viewport: Viewport,
    timeline: Option<String>,
    timeshare: Vec<String>,
    standing: Option<StandingFilter>,
    /// Hidden restriction dimension per chart id.
    restrictions: BTreeMap<String, DimensionId>,
    /// Mutations leave the redraw to the caller.
    redraw_deferred: bool,
}

impl FilterCoordinator {
    pub fn new(records: Arc<RecordSet>, config: &DashboardConfig) -> Result<Self> {
        let mut filter = CrossFilter::new(records);
        let registry = ChartRegistry::build(&config.charts, &config.geometry, &mut filter)?;
        for id in config.interaction.timeline.iter().chain(&config.interaction.timeshare) {
            registry.get(id)?;
        }
        debug!(charts = registry.len(), records = filter.total_count(), "Built filter coordinator");
        Ok(Self {
            filter,
            registry,
            default_viewport: config.map.default_bounds,
            timeline: config.interaction.timeline.clone(),
            timeshare: config.interaction.timeshare.clone(),
            standing: None,
            restrictions: BTreeMap::new(),
            redraw_deferred: false,
        })
    }

    pub fn records(&self) -> &Arc<RecordSet> {
        self.filter.records()
    }

    pub fn crossfilter(&self) -> &CrossFilter {
        &self.filter
    }

    pub fn registry(&self) -> &ChartRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ChartRegistry {
        &mut self.registry
    }

    pub fn chart(&self, id: &str) -> Result<&ChartHandle> {
        self.registry.get(id)
    }

    pub fn attach_view(&mut self, id: &str, view: Box<dyn ChartView>) -> Result<()> {
        self.registry.attach_view(id, view)
    }

    pub fn default_viewport(&self) -> Viewport {
        self.default_viewport
    }

    /// Records passing every active predicate.
    pub fn filtered_count(&self) -> usize {
        self.filter.filtered_count()
    }

    pub fn total_count(&self) -> usize {
        self.filter.total_count()
    }

    pub fn predicate(&self, chart: &str) -> Result<Option<&FilterPredicate>> {
        let dimension = self.registry.get(chart)?.dimension;
        Ok(self.filter.predicate(dimension))
    }

    // === Filter Mutations ===

    /// Add `value` to a discrete chart's selection, or remove it if present.
    pub fn toggle(&mut self, chart: &str, value: impl Into<DimValue>) -> Result<()> {
        let value = value.into();
        let mut selected = match self.predicate(chart)? {
            Some(FilterPredicate::Values(values)) => values.clone(),
            _ => Default::default(),
        };
        if !selected.remove(&value) {
            selected.insert(value);
        }
        let predicate = (!selected.is_empty()).then_some(FilterPredicate::Values(selected));
        self.update(chart, predicate)
    }

    /// Replace a discrete chart's selection. An empty selection clears it.
    pub fn set_values<I, V>(&mut self, chart: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<DimValue>,
    {
        let predicate = FilterPredicate::values(values);
        let predicate = match &predicate {
            FilterPredicate::Values(values) if values.is_empty() => None,
            _ => Some(predicate),
        };
        self.update(chart, predicate)
    }

    /// Replace a continuous chart's range.
    pub fn set_range(&mut self, chart: &str, min: impl Into<DimValue>, max: impl Into<DimValue>) -> Result<()> {
        self.update(chart, Some(FilterPredicate::range(min, max)))
    }

    /// Restrict a chart to exactly one value, whatever its kind.
    pub fn focus(&mut self, chart: &str, value: impl Into<DimValue>) -> Result<()> {
        let value = value.into();
        let predicate = Self::single(self.registry.get(chart)?.kind, value);
        self.update(chart, Some(predicate))
    }

    /// Clear one chart's dimension.
    pub fn clear(&mut self, chart: &str) -> Result<()> {
        self.update(chart, None)
    }

    fn single(kind: DimensionKind, value: DimValue) -> FilterPredicate {
        match kind {
            DimensionKind::Discrete => FilterPredicate::Values([value].into()),
            DimensionKind::Continuous => FilterPredicate::range(value.clone(), value),
        }
    }

    fn update(&mut self, chart: &str, predicate: Option<FilterPredicate>) -> Result<()> {
        self.assign(chart, predicate)?;
        self.redraw_unless_deferred();
        Ok(())
    }

    /// Set a predicate and push it to every view bound to the same dimension.
    fn assign(&mut self, chart: &str, predicate: Option<FilterPredicate>) -> Result<()> {
        let handle = self.registry.get(chart)?;
        let (dimension, kind) = (handle.dimension, handle.kind);
        if !self.filter.set_predicate(dimension, predicate.clone()) {
            return Err(FilterError::PredicateKind {
                chart: chart.to_string(),
                expected: kind.label(),
            });
        }
        match &predicate {
            Some(predicate) => trace!(chart, %predicate, "Filter set"),
            None => trace!(chart, "Filter cleared"),
        }
        self.sync_views(dimension);
        Ok(())
    }

    fn sync_views(&mut self, dimension: DimensionId) {
        let predicate = self.filter.predicate(dimension).cloned();
        for handle in self.registry.iter_mut().filter(|h| h.dimension == dimension) {
            if let Some(view) = handle.view_mut() {
                match &predicate {
                    Some(predicate) => view.filter(Some(predicate)),
                    None => view.filter_all(),
                }
            }
        }
    }

    // === Restrictions ===

    /// Limit the records behind a chart to `values`, or lift the limit with `None`.
    ///
    /// The limit lives on a hidden copy of the chart's dimension, so toggles,
    /// per-chart clears and reset-all on the chart leave it in place while the
    /// chart's bins are still narrowed by it. Views see it at the next redraw.
    pub fn restrict(&mut self, chart: &str, values: Option<Vec<DimValue>>) -> Result<()> {
        let dimension = match self.restrictions.get(chart) {
            Some(dimension) => *dimension,
            None => {
                let source = self.registry.get(chart)?.dimension;
                let dimension = self
                    .filter
                    .add_pinned_copy(source)
                    .ok_or_else(|| FilterError::UnknownChart { id: chart.to_string() })?;
                self.restrictions.insert(chart.to_string(), dimension);
                dimension
            }
        };
        let predicate = values.map(FilterPredicate::values);
        match &predicate {
            Some(predicate) => debug!(chart, %predicate, "Chart restricted"),
            None => debug!(chart, "Chart restriction lifted"),
        }
        self.filter.set_predicate(dimension, predicate);
        Ok(())
    }

    /// Active restriction of a chart, if any.
    pub fn restriction(&self, chart: &str) -> Option<&FilterPredicate> {
        self.restrictions
            .get(chart)
            .and_then(|dimension| self.filter.predicate(*dimension))
    }

    // === Standing Filter ===

    pub fn standing(&self) -> Option<&StandingFilter> {
        self.standing.as_ref()
    }

    /// Remember a filter to restore on reset-all.
    pub fn set_standing(&mut self, standing: Option<StandingFilter>) -> Result<()> {
        if let Some(standing) = &standing {
            let kind = self.registry.get(&standing.chart)?.kind;
            if !kind.accepts(&standing.predicate) {
                return Err(FilterError::PredicateKind {
                    chart: standing.chart.clone(),
                    expected: kind.label(),
                });
            }
        }
        self.standing = standing;
        Ok(())
    }

    /// Clear the standing filter's chart while keeping it remembered.
    pub fn lift_standing(&mut self) -> Result<()> {
        match self.standing.clone() {
            Some(standing) => self.clear(&standing.chart),
            None => Ok(()),
        }
    }

    /// Apply the remembered standing filter again.
    pub fn reapply_standing(&mut self) -> Result<()> {
        match self.standing.clone() {
            Some(standing) => self.update(&standing.chart, Some(standing.predicate)),
            None => Ok(()),
        }
    }

    /// Clear every dimension, re-zoom maps, restore the standing filter.
    ///
    /// Applying it twice leaves the same state as applying it once.
    pub fn reset_all(&mut self) {
        self.filter.clear_all();
        let viewport = self.default_viewport;
        for handle in self.registry.iter_mut() {
            let is_choropleth = handle.is_choropleth();
            if let Some(view) = handle.view_mut() {
                view.filter_all();
                if is_choropleth {
                    view.zoom_to(viewport);
                }
            }
        }
        if let Some(standing) = self.standing.clone()
            && let Err(error) = self.assign(&standing.chart, Some(standing.predicate))
        {
            debug!(%error, "Standing filter not restored");
        }
        debug!("Reset all filters");
        self.redraw_unless_deferred();
    }

    /// Swap the record set. Every predicate is cleared, then the standing filter is restored.
    pub fn replace_records(&mut self, records: Arc<RecordSet>) {
        self.filter.replace_records(records);
        debug!(records = self.filter.total_count(), "Replaced records");
        self.reset_all();
    }

    // === Rendering ===

    /// Current bins of one chart under its own group.
    pub fn snapshot(&self, chart: &str) -> Result<ChartSnapshot> {
        let handle = self.registry.get(chart)?;
        Ok(self.snapshot_of(handle))
    }

    fn snapshot_of(&self, handle: &ChartHandle) -> ChartSnapshot {
        let mut bins = self.filter.group(handle.dimension, handle.group());
        if let Some(domain) = &handle.fixed_domain {
            bins = domain
                .iter()
                .map(|key| GroupBin {
                    key: key.clone(),
                    value: bins.iter().find(|b| &b.key == key).map_or(0.0, |b| b.value),
                })
                .collect();
        }
        ChartSnapshot {
            chart: handle.id().to_string(),
            bins,
            predicate: self.filter.predicate(handle.dimension).cloned(),
            filtered_records: self.filter.filtered_count(),
            total_records: self.filter.total_count(),
        }
    }

    /// Bins of a chart's dimension under an arbitrary group.
    pub fn group(&self, chart: &str, group: &GroupSpec) -> Result<Vec<GroupBin>> {
        let dimension = self.registry.get(chart)?.dimension;
        Ok(self.filter.group(dimension, group))
    }

    /// Leave the redraw after each mutation to the caller, who then calls
    /// [`Self::redraw_all`] once per interaction.
    pub fn set_redraw_deferred(&mut self, deferred: bool) {
        self.redraw_deferred = deferred;
    }

    fn redraw_unless_deferred(&mut self) {
        if !self.redraw_deferred {
            self.redraw_all();
        }
    }

    /// Redraw every attached view.
    pub fn redraw_all(&mut self) {
        let snapshots: Vec<ChartSnapshot> = self
            .registry
            .iter()
            .filter(|h| h.has_view())
            .map(|h| self.snapshot_of(h))
            .collect();
        let mut snapshots = snapshots.into_iter();
        for handle in self.registry.iter_mut().filter(|h| h.has_view()) {
            if let (Some(view), Some(snapshot)) = (handle.view_mut(), snapshots.next()) {
                view.redraw(&snapshot);
            }
        }
        trace!(filtered = self.filter.filtered_count(), "Redrew all views");
    }

    /// Force a chart's bins to a fixed key list, or lift it.
    pub fn set_fixed_domain(&mut self, chart: &str, domain: Option<Vec<DimValue>>) -> Result<()> {
        self.registry.get_mut(chart)?.fixed_domain = domain;
        Ok(())
    }

    pub fn set_height(&mut self, chart: &str, px: u32) -> Result<()> {
        if let Some(view) = self.registry.get_mut(chart)?.view_mut() {
            view.height(px);
        }
        Ok(())
    }

    pub fn set_transition(&mut self, chart: &str, ms: u64) -> Result<()> {
        if let Some(view) = self.registry.get_mut(chart)?.view_mut() {
            view.transition_duration(ms);
        }
        Ok(())
    }

    // === Timeline ===

    pub fn timeline(&self) -> Result<&ChartHandle> {
        let id = self.timeline.as_deref().ok_or(FilterError::NoTimeline)?;
        self.registry.get(id)
    }

    /// Sorted distinct periods of the timeline chart.
    pub fn time_domain(&self) -> Result<Vec<DimValue>> {
        Ok(self.filter.domain(self.timeline()?.dimension))
    }

    /// Distinct periods among the records passing every predicate.
    pub fn filtered_period_count(&self) -> Option<usize> {
        let timeline = self.timeline().ok()?;
        Some(self.filter.filtered_distinct(timeline.dimension).len())
    }

    fn time_charts(&self) -> Result<Vec<String>> {
        let timeline = self.timeline()?.id().to_string();
        Ok(std::iter::once(timeline).chain(self.timeshare.iter().cloned()).collect())
    }

    /// Restrict the timeline and time-shared charts to the given periods.
    ///
    /// Discrete timelines select the periods; continuous ones take the range
    /// from the first to the last. An empty list clears them.
    pub fn set_periods(&mut self, periods: &[DimValue]) -> Result<()> {
        for chart in self.time_charts()? {
            let kind = self.registry.get(&chart)?.kind;
            let predicate = match (kind, periods.first(), periods.last()) {
                (_, None, _) | (_, _, None) => None,
                (DimensionKind::Discrete, _, _) => Some(FilterPredicate::values(periods.iter().cloned())),
                (DimensionKind::Continuous, Some(first), Some(last)) => {
                    Some(FilterPredicate::range(first.clone(), last.clone()))
                }
            };
            self.assign(&chart, predicate)?;
        }
        self.redraw_unless_deferred();
        Ok(())
    }

    pub fn focus_period(&mut self, period: &DimValue) -> Result<()> {
        self.set_periods(std::slice::from_ref(period))
    }

    pub fn clear_periods(&mut self) -> Result<()> {
        self.set_periods(&[])
    }
}
