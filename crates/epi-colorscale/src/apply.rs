//! The one step that pushes the color scale to every choropleth view.

use std::collections::BTreeMap;
use std::sync::Arc;

use epi_filter::{FilterCoordinator, Result};
use epi_model::{ChartKind, ColorMode, ColorScaleSpec};
use tracing::debug;

use crate::engine::ColorScaleEngine;
use crate::metrics::{DivisionValues, MetricInputs, division_values};

/// Metric values of every choropleth, keyed by chart id.
pub fn map_values(
    coordinator: &FilterCoordinator,
    engine: &ColorScaleEngine,
    spec: &ColorScaleSpec,
    inputs: MetricInputs<'_>,
) -> Result<BTreeMap<String, DivisionValues>> {
    let charts: Vec<String> = coordinator
        .registry()
        .choropleths()
        .map(|handle| handle.id().to_string())
        .collect();
    charts
        .into_iter()
        .map(|chart| {
            let values = division_values(coordinator, &chart, engine.unit(), spec, inputs)?;
            Ok((chart, values))
        })
        .collect()
}

/// Push colors, domain and accessors to every choropleth view.
pub fn apply_colors(
    engine: &ColorScaleEngine,
    coordinator: &mut FilterCoordinator,
    values: &BTreeMap<String, DivisionValues>,
) {
    for (spec, view) in coordinator.registry_mut().views_mut() {
        if !matches!(spec.kind, ChartKind::Choropleth(_)) {
            continue;
        }
        let colors = engine.colors(&spec.display_colors);
        let max_index = colors.len().saturating_sub(1);
        view.colors(&colors);
        view.color_domain([0.0, max_index as f64]);
        view.color_accessor(engine.color_accessor(max_index));
        let chart_values = Arc::new(values.get(&spec.id).cloned().unwrap_or_default());
        view.value_accessor(Arc::new(move |name: &str| chart_values.get(name).copied()));
    }
}

/// Recompute the breakpoints from the active map if `source` allows, then
/// apply them and redraw. Returns whether the breakpoints were recomputed.
///
/// Value accessors are refreshed even when the breakpoints stay frozen.
pub fn refresh_maps(
    engine: &mut ColorScaleEngine,
    coordinator: &mut FilterCoordinator,
    spec: &ColorScaleSpec,
    inputs: MetricInputs<'_>,
    active_chart: Option<&str>,
    source: ColorMode,
) -> Result<bool> {
    let values = map_values(coordinator, engine, spec, inputs)?;
    let active: Vec<f64> = active_chart
        .and_then(|chart| values.get(chart))
        .map(|v| v.values().copied().collect())
        .unwrap_or_default();
    let recomputed = engine.lock(source, &active);
    apply_colors(engine, coordinator, &values);
    coordinator.redraw_all();
    debug!(recomputed, source = ?source, "Refreshed maps");
    Ok(recomputed)
}
