//! The interactive dashboard session.
//!
//! A [`Dashboard`] owns the loaded [`DashboardContext`] and wires the filter
//! coordinator to the color scale: every filter change redraws every view
//! and refreshes the maps, in `Auto` mode recomputing the breakpoints too.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use epi_colorscale::{ColorScaleEngine, DivisionValues, Legend, MetricInputs, map_values, refresh_maps};
use epi_filter::{
    Autoplay, AutoplayStep, ChartView, DimValue, FilterCoordinator, FilterPredicate, GlobalFilter,
    StandingFilter, quick_filter,
};
use epi_ingest::fingerprint;
use epi_model::{ClassificationMethod, ColorMode, MapUnit, MedicalDataType, PaletteKey};
use epi_validate::{DataCheckEngine, DataCheckReport};
use tracing::{debug, info};

use crate::context::DashboardContext;
use crate::error::{CoreError, Result};
use crate::load::{LoadNotice, NoticeKind};

/// Run the configured data check over the context's records.
pub fn run_datacheck(context: &DashboardContext) -> DataCheckReport {
    DataCheckEngine::new(&context.config.datacheck)
        .with_geometry(context.geometry.as_ref())
        .with_population(Some(&context.population))
        .run(&context.records)
}

pub struct Dashboard {
    context: DashboardContext,
    coordinator: FilterCoordinator,
    engine: ColorScaleEngine,
    global: Option<GlobalFilter>,
    autoplay: Autoplay,
    report: DataCheckReport,
    /// Choropleth whose values drive the breakpoints.
    active_map: Option<String>,
}

impl Dashboard {
    /// Generate the display from a fully loaded context.
    pub fn new(context: DashboardContext) -> Result<Self> {
        let report = run_datacheck(&context);
        let mut coordinator = FilterCoordinator::new(Arc::clone(&context.records), &context.config)?;
        // Every interaction ends in `refresh`, which redraws once.
        coordinator.set_redraw_deferred(true);
        let config = &context.config;
        let engine = ColorScaleEngine::new(&config.colorscale);
        let global = config.global_filter.as_ref().map(|spec| {
            GlobalFilter::from_extras(spec, &context.records.extras, config.interaction.transition_ms)
        });
        let autoplay = Autoplay::new(&config.interaction);
        let active_map = coordinator.registry().choropleths().next().map(|h| h.id().to_string());

        let mut dashboard = Self {
            context,
            coordinator,
            engine,
            global,
            autoplay,
            report,
            active_map,
        };
        if let Some(global) = &dashboard.global {
            global.apply(&mut dashboard.coordinator)?;
        }
        dashboard.refresh(ColorMode::Manual)?;
        info!(
            records = dashboard.coordinator.total_count(),
            charts = dashboard.coordinator.registry().len(),
            errors = dashboard.report.error_count(),
            "Dashboard ready"
        );
        Ok(dashboard)
    }

    pub fn context(&self) -> &DashboardContext {
        &self.context
    }

    pub fn coordinator(&self) -> &FilterCoordinator {
        &self.coordinator
    }

    pub fn engine(&self) -> &ColorScaleEngine {
        &self.engine
    }

    pub fn report(&self) -> &DataCheckReport {
        &self.report
    }

    pub fn global_filter(&self) -> Option<&GlobalFilter> {
        self.global.as_ref()
    }

    pub fn autoplay(&self) -> &Autoplay {
        &self.autoplay
    }

    pub fn active_map(&self) -> Option<&str> {
        self.active_map.as_deref()
    }

    /// Records under every active filter, out of all records.
    pub fn counts(&self) -> (usize, usize) {
        (self.coordinator.filtered_count(), self.coordinator.total_count())
    }

    /// Bind a rendering view to a chart, then push the current colors to it.
    pub fn attach_view(&mut self, chart: &str, view: Box<dyn ChartView>) -> Result<()> {
        self.coordinator.attach_view(chart, view)?;
        self.refresh(ColorMode::Auto)?;
        Ok(())
    }

    /// Make another choropleth drive the breakpoints.
    pub fn set_active_map(&mut self, chart: &str) -> Result<()> {
        self.coordinator.chart(chart)?;
        self.active_map = Some(chart.to_string());
        self.refresh(ColorMode::Auto)?;
        Ok(())
    }

    // === Filters ===

    pub fn toggle(&mut self, chart: &str, value: impl Into<DimValue>) -> Result<()> {
        self.coordinator.toggle(chart, value)?;
        self.after_filter(chart)
    }

    pub fn set_values<I, V>(&mut self, chart: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<DimValue>,
    {
        self.coordinator.set_values(chart, values)?;
        self.after_filter(chart)
    }

    pub fn set_range(&mut self, chart: &str, min: impl Into<DimValue>, max: impl Into<DimValue>) -> Result<()> {
        self.coordinator.set_range(chart, min, max)?;
        self.after_filter(chart)
    }

    pub fn focus(&mut self, chart: &str, value: impl Into<DimValue>) -> Result<()> {
        self.coordinator.focus(chart, value)?;
        self.after_filter(chart)
    }

    /// Reset one chart.
    pub fn clear(&mut self, chart: &str) -> Result<()> {
        self.coordinator.clear(chart)?;
        self.after_filter(chart)
    }

    /// Clear every filter, re-zoom the maps and restore the standing and global filters.
    pub fn reset_all(&mut self) -> Result<()> {
        if self.autoplay.is_playing() {
            self.autoplay.pause(&mut self.coordinator)?;
        }
        self.coordinator.reset_all();
        if let Some(global) = &self.global {
            global.apply(&mut self.coordinator)?;
        }
        self.refresh(ColorMode::Auto)?;
        Ok(())
    }

    /// Turn the "default categories only" filter on or off.
    pub fn set_global_filter(&mut self, enabled: bool) -> Result<()> {
        if let Some(global) = &mut self.global {
            global.set_enabled(&mut self.coordinator, enabled)?;
            self.refresh(ColorMode::Auto)?;
        }
        Ok(())
    }

    /// In surveillance mode, remember a single selected disease as the standing filter.
    fn after_filter(&mut self, chart: &str) -> Result<()> {
        let disease_chart = self.context.config.interaction.disease_chart.as_deref();
        if self.context.config.datatype == MedicalDataType::Surveillance && disease_chart == Some(chart) {
            let standing = match self.coordinator.predicate(chart)? {
                Some(FilterPredicate::Values(values)) if values.len() == 1 => Some(StandingFilter {
                    chart: chart.to_string(),
                    predicate: FilterPredicate::Values(values.clone()),
                }),
                _ => None,
            };
            debug!(chart, remembered = standing.is_some(), "Standing disease filter updated");
            self.coordinator.set_standing(standing)?;
        }
        self.refresh(ColorMode::Auto)?;
        Ok(())
    }

    // === Timeline ===

    pub fn start_autoplay(&mut self) -> Result<AutoplayStep> {
        let step = self.autoplay.start(&mut self.coordinator)?;
        self.refresh(ColorMode::Auto)?;
        Ok(step)
    }

    /// Advance autoplay; the host calls this every [`Autoplay::delay`].
    pub fn tick_autoplay(&mut self) -> Result<AutoplayStep> {
        let step = self.autoplay.tick(&mut self.coordinator)?;
        if step != AutoplayStep::Idle {
            self.refresh(ColorMode::Auto)?;
        }
        Ok(step)
    }

    pub fn pause_autoplay(&mut self) -> Result<()> {
        self.autoplay.pause(&mut self.coordinator)?;
        self.refresh(ColorMode::Auto)?;
        Ok(())
    }

    /// Focus the last `count` complete periods.
    pub fn quick_filter(&mut self, count: usize) -> Result<Vec<DimValue>> {
        let periods = quick_filter(&mut self.coordinator, count)?;
        self.refresh(ColorMode::Auto)?;
        Ok(periods)
    }

    // === Color Scale ===

    /// Switch the map unit and recompute the scale.
    ///
    /// Completeness lifts the standing disease filter; leaving it reapplies it.
    pub fn set_unit(&mut self, unit: MapUnit) -> Result<()> {
        let previous = self.engine.unit();
        self.engine.set_unit(unit);
        match (previous == MapUnit::Completeness, unit == MapUnit::Completeness) {
            (false, true) => self.coordinator.lift_standing()?,
            (true, false) => self.coordinator.reapply_standing()?,
            _ => {}
        }
        self.refresh(ColorMode::Manual)?;
        Ok(())
    }

    pub fn set_method(&mut self, method: ClassificationMethod) -> Result<()> {
        self.engine.set_method(method);
        self.refresh(ColorMode::Manual)?;
        Ok(())
    }

    pub fn set_palette(&mut self, palette: PaletteKey) -> Result<()> {
        self.engine.set_palette(palette);
        self.refresh(ColorMode::Auto)?;
        Ok(())
    }

    /// Swap Auto and Manual; entering Auto recomputes at once.
    pub fn toggle_mode(&mut self) -> Result<ColorMode> {
        let mode = self.engine.toggle_mode();
        if mode == ColorMode::Auto {
            self.refresh(ColorMode::Auto)?;
        }
        Ok(mode)
    }

    /// Explicit recompute, honoured in either mode.
    pub fn recompute_colors(&mut self) -> Result<bool> {
        self.refresh(ColorMode::Manual)
    }

    /// Metric values of every choropleth under the current filters.
    pub fn map_values(&self) -> Result<BTreeMap<String, DivisionValues>> {
        Ok(map_values(
            &self.coordinator,
            &self.engine,
            &self.context.config.colorscale,
            self.inputs(),
        )?)
    }

    /// Legend of the active map.
    pub fn legend(&self) -> Option<Legend> {
        let chart = self.active_map.as_deref()?;
        let handle = self.coordinator.chart(chart).ok()?;
        Some(Legend::new(&self.engine, &handle.spec.display_colors))
    }

    fn inputs(&self) -> MetricInputs<'_> {
        MetricInputs {
            geometry: self.context.geometry.as_ref(),
            population: Some(&self.context.population),
        }
    }

    fn refresh(&mut self, source: ColorMode) -> Result<bool> {
        let inputs = MetricInputs {
            geometry: self.context.geometry.as_ref(),
            population: Some(&self.context.population),
        };
        Ok(refresh_maps(
            &mut self.engine,
            &mut self.coordinator,
            &self.context.config.colorscale,
            inputs,
            self.active_map.as_deref(),
            source,
        )?)
    }

    // === Medical Files ===

    /// Reload the medical source from a chosen subset of its files.
    ///
    /// Paths may be full paths or file names. Every filter is reset, the
    /// data check runs again and the global filter is rebuilt from the new
    /// extras.
    pub fn reload_medical<P: AsRef<Path>>(&mut self, subset: &[P]) -> Result<()> {
        let medical = self.context.medical.as_mut().ok_or(CoreError::NoMedicalSource)?;
        medical.selection.select(subset)?;
        let loaded = medical.loader.load_selection(&medical.selection);
        for failure in &loaded.failures {
            self.context.notices.push(LoadNotice {
                datatype: "medical".to_string(),
                name: medical.loader.source().folder.display().to_string(),
                kind: NoticeKind::Failed,
                message: failure.to_string(),
            });
        }
        self.context.records = Arc::new(loaded.records);
        self.report = run_datacheck(&self.context);
        self.coordinator.replace_records(Arc::clone(&self.context.records));

        let config = &self.context.config;
        if let Some(spec) = &config.global_filter {
            let enabled = self.global.as_ref().map_or(spec.enabled, GlobalFilter::is_enabled);
            let mut global =
                GlobalFilter::from_extras(spec, &self.context.records.extras, config.interaction.transition_ms);
            global.set_enabled(&mut self.coordinator, enabled)?;
            self.global = Some(global);
        }
        self.refresh(ColorMode::Auto)?;
        info!(records = self.coordinator.total_count(), "Reloaded medical records");
        Ok(())
    }

    /// SHA-256 fingerprint of the current records.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.context.records)
    }
}
