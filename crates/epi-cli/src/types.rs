use std::collections::BTreeMap;
use std::path::PathBuf;

use epi_colorscale::Legend;
use epi_core::{LoadNotice, LoadStep};
use epi_validate::DataCheckReport;

#[derive(Debug)]
pub struct CheckResult {
    pub config: PathBuf,
    pub steps: Vec<LoadStep>,
    pub notices: Vec<LoadNotice>,
    /// Medical files the records were read from.
    pub files: Vec<PathBuf>,
    pub records: usize,
    pub fingerprint: String,
    pub report: DataCheckReport,
    pub has_errors: bool,
}

#[derive(Debug)]
pub struct LegendResult {
    pub chart: Option<String>,
    pub filtered: usize,
    pub total: usize,
    pub legend: Option<Legend>,
    /// Metric value per division of the active map.
    pub values: BTreeMap<String, f64>,
}
