//! Per-division map metrics.

use std::collections::{BTreeMap, BTreeSet};

use epi_filter::{ChartHandle, DimValue, FilterCoordinator, Result, admin_name};
use epi_geo::{GeometryIndex, PopulationTable, name_prefix};
use epi_model::{ColorScaleSpec, GroupSpec, MapUnit};
use tracing::{debug, warn};

/// Division name to metric value, for one map level.
pub type DivisionValues = BTreeMap<String, f64>;

/// Loaded data the metrics join against.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricInputs<'a> {
    pub geometry: Option<&'a GeometryIndex>,
    pub population: Option<&'a PopulationTable>,
}

/// Metric values of every division drawn by a choropleth chart.
pub fn division_values(
    coordinator: &FilterCoordinator,
    chart: &str,
    unit: MapUnit,
    spec: &ColorScaleSpec,
    inputs: MetricInputs<'_>,
) -> Result<DivisionValues> {
    let handle = coordinator.chart(chart)?;
    let Some(level) = handle.map_level() else {
        warn!(chart, "Map metrics requested for a chart that is not a choropleth");
        return Ok(DivisionValues::new());
    };
    let values = match unit {
        MapUnit::Cases => grouped(coordinator, chart, &spec.cases)?,
        MapUnit::Deaths => match &spec.deaths {
            Some(group) => grouped(coordinator, chart, group)?,
            None => DivisionValues::new(),
        },
        MapUnit::IncidenceProp => rates(coordinator, chart, level, &spec.cases, spec, inputs)?,
        MapUnit::MortalityProp => match &spec.deaths {
            Some(group) => rates(coordinator, chart, level, group, spec, inputs)?,
            None => DivisionValues::new(),
        },
        MapUnit::Completeness => completeness(coordinator, handle, level, inputs),
    };
    debug!(chart, %unit, divisions = values.len(), "Computed map metric");
    Ok(values)
}

fn grouped(coordinator: &FilterCoordinator, chart: &str, group: &GroupSpec) -> Result<DivisionValues> {
    Ok(coordinator
        .group(chart, group)?
        .into_iter()
        .filter_map(|bin| match bin.key {
            DimValue::Text(name) => Some((name, bin.value)),
            _ => None,
        })
        .collect())
}

/// Year of the most recent period in the current filter, as a `YYYY` prefix.
fn current_year(coordinator: &FilterCoordinator) -> Option<String> {
    let timeline = coordinator.timeline().ok()?;
    let periods = coordinator.crossfilter().filtered_distinct(timeline.dimension);
    let latest = periods.last()?.to_string();
    let year: String = latest.chars().take(4).collect();
    (year.len() == 4 && year.chars().all(|c| c.is_ascii_digit())).then_some(year)
}

/// `value × multiplier / (population × periods)`; divisions without population are left out.
fn rates(
    coordinator: &FilterCoordinator,
    chart: &str,
    level: &str,
    group: &GroupSpec,
    spec: &ColorScaleSpec,
    inputs: MetricInputs<'_>,
) -> Result<DivisionValues> {
    let Some(population) = inputs.population.and_then(|table| table.level(level)) else {
        warn!(level, "No population for this level, rates are unavailable");
        return Ok(DivisionValues::new());
    };
    let periods = coordinator.filtered_period_count().unwrap_or(1).max(1) as f64;
    let year = current_year(coordinator);
    let counts = grouped(coordinator, chart, group)?;
    Ok(counts
        .into_iter()
        .filter_map(|(name, value)| {
            let pop = population.get(&name)?.at(year.as_deref())?;
            (pop > 0.0).then(|| (name, value * spec.incidence_multiplier / (pop * periods)))
        })
        .collect())
}

/// Percentage of leaf divisions under each division that reported any record.
fn completeness(
    coordinator: &FilterCoordinator,
    handle: &ChartHandle,
    level: &str,
    inputs: MetricInputs<'_>,
) -> DivisionValues {
    let Some(geometry) = inputs.geometry else {
        warn!(level, "No geometry loaded, completeness is unavailable");
        return DivisionValues::new();
    };
    let Some(depth) = geometry.spec().depth_of(level) else {
        return DivisionValues::new();
    };
    let records = coordinator.records();
    let levels = &geometry.spec().levels;
    let leaf_levels: Vec<(usize, &str)> = levels
        .iter()
        .enumerate()
        .filter(|(_, key)| geometry.is_leaf_level(key) && descends_from(geometry, key, level))
        .map(|(d, key)| (d, key.as_str()))
        .collect();
    let positions: Vec<Option<usize>> = levels.iter().map(|key| records.schema.index_of(key)).collect();

    let mut reporting: BTreeSet<String> = BTreeSet::new();
    for index in coordinator.crossfilter().indices_except(Some(handle.dimension)) {
        let record = &records.records[index];
        for &(leaf_depth, leaf_level) in &leaf_levels {
            if let DimValue::Text(name) = admin_name(record, &positions[..=leaf_depth])
                && geometry.level(leaf_level).is_some_and(|l| l.contains(&name))
            {
                reporting.insert(name);
            }
        }
    }

    let mut reported: BTreeMap<String, usize> = BTreeMap::new();
    for leaf in &reporting {
        *reported.entry(name_prefix(leaf, depth)).or_default() += 1;
    }
    let Some(subnum) = geometry.subnum_level(level) else {
        return DivisionValues::new();
    };
    subnum
        .iter()
        .filter(|(_, total)| **total > 0)
        .map(|(name, total)| {
            let count = reported.get(name).copied().unwrap_or(0);
            (name.clone(), 100.0 * count as f64 / *total as f64)
        })
        .collect()
}

/// Whether `level` is `leaf` or one of its ancestors.
fn descends_from(geometry: &GeometryIndex, leaf: &str, level: &str) -> bool {
    let mut current = Some(leaf);
    let mut steps = 0;
    while let Some(key) = current {
        if key == level {
            return true;
        }
        steps += 1;
        if steps > geometry.spec().levels.len() {
            return false;
        }
        current = geometry.spec().parent_of(key);
    }
    false
}
