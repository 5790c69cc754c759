//! The "show only default categories" toggle.

use epi_model::{ExtraValue, Extras, GlobalFilterSpec};
use tracing::{debug, warn};

use crate::coordinator::FilterCoordinator;
use crate::error::Result;
use crate::value::DimValue;

/// Base height of the filtered chart, in pixels.
pub const BASE_HEIGHT: u32 = 80;
/// Height added per visible category.
pub const ROW_HEIGHT: u32 = 30;

/// Category filter bound to one chart, driven by the loader extras.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalFilter {
    chart: String,
    all_values: Vec<String>,
    default_values: Vec<String>,
    enabled: bool,
    transition_ms: u64,
}

impl GlobalFilter {
    /// Read the category lists from the extras.
    ///
    /// All values come from a list extra (or a map's keys). A value is shown
    /// by default when the default-values map holds a truthy cell for it.
    pub fn from_extras(spec: &GlobalFilterSpec, extras: &Extras, transition_ms: u64) -> Self {
        let listed: Vec<&String> = match extras.get(&spec.all_values_extra) {
            Some(ExtraValue::List(items)) => items.iter().collect(),
            Some(ExtraValue::Map(map)) => map.keys().collect(),
            None => {
                warn!(extra = %spec.all_values_extra, "Global filter values are missing from the extras");
                Vec::new()
            }
        };
        let shown = extras.get(&spec.default_values_extra);

        let mut all_values: Vec<String> = Vec::new();
        let mut default_values: Vec<String> = Vec::new();
        for value in listed {
            let value = value.trim();
            if value.is_empty() || all_values.iter().any(|v| v == value) {
                continue;
            }
            all_values.push(value.to_string());
            let is_default = match shown {
                Some(ExtraValue::Map(map)) => map.get(value).is_some_and(|cell| is_truthy(cell)),
                Some(ExtraValue::List(items)) => items.iter().any(|item| item.trim() == value),
                None => false,
            };
            if is_default {
                default_values.push(value.to_string());
            }
        }
        debug!(
            chart = %spec.chart,
            all = all_values.len(),
            default = default_values.len(),
            "Read global filter categories"
        );
        Self {
            chart: spec.chart.clone(),
            all_values,
            default_values,
            enabled: spec.enabled,
            transition_ms,
        }
    }

    pub fn chart(&self) -> &str {
        &self.chart
    }

    pub fn all_values(&self) -> &[String] {
        &self.all_values
    }

    pub fn default_values(&self) -> &[String] {
        &self.default_values
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Categories the chart currently shows.
    pub fn visible(&self) -> &[String] {
        if self.enabled {
            &self.default_values
        } else {
            &self.all_values
        }
    }

    /// Chart height for the visible category count.
    pub fn height(&self) -> u32 {
        let rows = u32::try_from(self.visible().len()).unwrap_or(u32::MAX);
        BASE_HEIGHT.saturating_add(ROW_HEIGHT.saturating_mul(rows))
    }

    pub fn set_enabled(&mut self, coordinator: &mut FilterCoordinator, enabled: bool) -> Result<()> {
        self.enabled = enabled;
        self.apply(coordinator)
    }

    /// Push the current state to the coordinator.
    ///
    /// The categories are restricted apart from the chart's own selection.
    /// The redraw runs with transitions off since rows appear and disappear.
    pub fn apply(&self, coordinator: &mut FilterCoordinator) -> Result<()> {
        let domain: Vec<DimValue> = self.visible().iter().map(|v| DimValue::from(v.as_str())).collect();
        coordinator.set_fixed_domain(&self.chart, Some(domain))?;
        coordinator.set_height(&self.chart, self.height())?;
        coordinator.set_transition(&self.chart, 0)?;
        let restriction = (self.enabled && !self.default_values.is_empty())
            .then(|| self.default_values.iter().map(|v| DimValue::from(v.as_str())).collect());
        let applied = coordinator.restrict(&self.chart, restriction);
        coordinator.redraw_all();
        coordinator.set_transition(&self.chart, self.transition_ms)?;
        applied
    }
}

/// Spreadsheet truthiness of a text cell.
fn is_truthy(cell: &str) -> bool {
    let cell = cell.trim();
    !(cell.is_empty() || cell == "0" || cell.eq_ignore_ascii_case("false"))
}
