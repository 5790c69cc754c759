use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use epi_core::{Dashboard, DashboardContext, LoadSequence, LoadStep, NoticeKind, SourceFilter};
use epi_model::{ClassificationMethod, MapUnit};
use tracing::{info, info_span};

use crate::types::{CheckResult, LegendResult};

/// Run the load sequence of a configuration and generate the session.
fn open_dashboard(config: &Path, filter: Option<SourceFilter>) -> Result<(Dashboard, Vec<LoadStep>)> {
    let mut context = DashboardContext::from_file(config)
        .with_context(|| format!("load configuration {}", config.display()))?;
    let sources = context.config.sources.clone();
    let steps = LoadSequence::new(&sources).with_filter(filter).run(&mut context);
    let dashboard = Dashboard::new(context).context("generate dashboard")?;
    Ok((dashboard, steps))
}

/// Load every source, optionally reselect the medical files, and check the records.
pub fn run_check(config: &Path, filter: Option<SourceFilter>, files: &[PathBuf]) -> Result<CheckResult> {
    let span = info_span!("check", config = %config.display());
    let _guard = span.enter();
    let (mut dashboard, steps) = open_dashboard(config, filter)?;
    if !files.is_empty() {
        dashboard.reload_medical(files).context("reload medical files")?;
    }

    let context = dashboard.context();
    let report = dashboard.report().clone();
    let notices = context.notices.clone();
    let has_errors = report.error_count() > 0 || notices.iter().any(|n| n.kind == NoticeKind::Failed);
    info!(
        records = context.records.len(),
        errors = report.error_count(),
        notices = notices.len(),
        "Check finished"
    );
    Ok(CheckResult {
        config: config.to_path_buf(),
        steps,
        notices,
        files: context
            .medical_selection()
            .map(|selection| selection.selected().into_iter().map(Path::to_path_buf).collect())
            .unwrap_or_default(),
        records: context.records.len(),
        fingerprint: dashboard.fingerprint(),
        report,
        has_errors,
    })
}

/// Options of the `legend` command.
#[derive(Debug, Clone, Default)]
pub struct LegendOptions {
    pub unit: Option<MapUnit>,
    pub method: Option<ClassificationMethod>,
    /// Choropleth chart to classify; defaults to the first one.
    pub chart: Option<String>,
    /// `CHART=VALUE` filters applied before classifying.
    pub focus: Vec<String>,
}

/// Split a `CHART=VALUE` filter argument.
pub fn parse_focus(arg: &str) -> Result<(&str, &str)> {
    arg.split_once('=')
        .map(|(chart, value)| (chart.trim(), value.trim()))
        .filter(|(chart, _)| !chart.is_empty())
        .ok_or_else(|| anyhow!("expected CHART=VALUE, got '{arg}'"))
}

/// Classify the active map under the given filters.
pub fn run_legend(config: &Path, options: &LegendOptions) -> Result<LegendResult> {
    let (mut dashboard, _) = open_dashboard(config, None)?;
    if let Some(chart) = &options.chart {
        dashboard
            .set_active_map(chart)
            .with_context(|| format!("select map {chart}"))?;
    }
    for arg in &options.focus {
        let (chart, value) = parse_focus(arg)?;
        dashboard
            .focus(chart, value)
            .with_context(|| format!("filter {chart} on {value}"))?;
    }
    if let Some(method) = options.method {
        dashboard.set_method(method).context("set classification method")?;
    }
    if let Some(unit) = options.unit {
        dashboard.set_unit(unit).context("set map unit")?;
    }

    let chart = dashboard.active_map().map(str::to_string);
    let mut values = dashboard.map_values().context("compute map values")?;
    let (filtered, total) = dashboard.counts();
    Ok(LegendResult {
        values: chart
            .as_ref()
            .and_then(|chart| values.remove(chart))
            .unwrap_or_default(),
        chart,
        filtered,
        total,
        legend: dashboard.legend(),
    })
}
