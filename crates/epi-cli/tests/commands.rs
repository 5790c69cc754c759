//! `check` and `legend` commands against a deployment folder.

use std::fs;
use std::path::{Path, PathBuf};

use epi_cli::commands::{LegendOptions, run_check, run_legend};
use epi_core::{SourceFilter, SourceOutcome};
use epi_model::MapUnit;
use tempfile::TempDir;

const CONFIG: &str = r#"
datatype = "surveillance"

[[fields]]
key = "epiwk"
header = "Epi Week"

[[fields]]
key = "admN1"
header = "District"

[[sources]]
datatype = "geometry"
name = "admN1"
method = "geometry"
path = "geo/districts.geojson"

[[sources]]
datatype = "population"
name = "admN1"
method = "population_geometry"
property = "pop"

[[sources]]
datatype = "medical"
name = "cases"
method = "medical_delimited"
folder = "medical"
format = "csv"

[geometry]
levels = ["admN1"]
name_properties = ["adm1"]

[datacheck]
identifying_fields = ["epiwk", "admN1"]

[datacheck.rules]
epiwk = { test = "epiweek" }
admN1 = { test = "in_geometry" }

[[charts]]
id = "epiwk"
dimension = { builder = "auto", column = "epiwk" }
kind = { type = "bar" }

[[charts]]
id = "map"
dimension = { builder = "admin_level", level = "admN1" }
kind = { type = "choropleth", level = "admN1" }
display_colors = [0, 1, 2, 3, 4, 5]

[interaction]
timeline = "epiwk"
"#;

const GEOMETRY: &str = r#"{"type":"FeatureCollection","features":[
{"type":"Feature","properties":{"adm1":"Bo","pop":1000},"geometry":null},
{"type":"Feature","properties":{"adm1":"Kenema","pop":2000},"geometry":null}]}"#;

fn write(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn deployment() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "dashboard.toml", CONFIG);
    write(dir.path(), "geo/districts.geojson", GEOMETRY);
    write(
        dir.path(),
        "medical/a.csv",
        "Epi Week,District\n2021-01,Bo\n2021-01,Bo\n2021-02,Bo\n2021-02,Kenema\n",
    );
    write(dir.path(), "medical/b.csv", "Epi Week,District\n2021-03,Makeni\nweek 4,Bo\n");
    let config = dir.path().join("dashboard.toml");
    (dir, config)
}

#[test]
fn test_check_clean_deployment() {
    let (_dir, config) = deployment();
    let result = run_check(&config, None, &[]).unwrap();

    let outcomes: Vec<SourceOutcome> = result.steps.iter().map(|step| step.outcome).collect();
    assert_eq!(outcomes, [SourceOutcome::Loaded; 3]);
    assert_eq!(result.records, 4);
    assert_eq!(result.files.len(), 1);
    assert!(result.files[0].ends_with("a.csv"));
    assert!(result.notices.is_empty());
    assert!(!result.has_errors);
    assert_eq!(result.report.summaries["epiwk"].checked, 4);
}

#[test]
fn test_check_reports_bad_records() {
    let (_dir, config) = deployment();
    let result = run_check(&config, None, &[PathBuf::from("b.csv")]).unwrap();

    assert_eq!(result.records, 2);
    assert!(result.has_errors);
    assert_eq!(result.report.error_count(), 2);
    assert_eq!(result.report.summaries["epiwk"].errors, 1);
    assert_eq!(result.report.summaries["admN1"].errors, 1);
}

#[test]
fn test_check_skips_filtered_sources() {
    let (_dir, config) = deployment();
    let filter = SourceFilter::Skip("population".to_string());
    let result = run_check(&config, Some(filter), &[]).unwrap();

    assert_eq!(result.steps[1].outcome, SourceOutcome::Filtered);
    assert_eq!(result.steps[2].outcome, SourceOutcome::Loaded);
}

#[test]
fn test_check_missing_config_fails() {
    let dir = TempDir::new().unwrap();
    let error = run_check(&dir.path().join("nope.toml"), None, &[]).unwrap_err();
    assert!(error.to_string().contains("load configuration"));
}

#[test]
fn test_legend_for_case_counts() {
    let (_dir, config) = deployment();
    let result = run_legend(&config, &LegendOptions::default()).unwrap();

    assert_eq!(result.chart.as_deref(), Some("map"));
    assert_eq!((result.filtered, result.total), (4, 4));
    assert_eq!(result.values["Bo"], 3.0);
    assert_eq!(result.values["Kenema"], 1.0);
    insta::assert_snapshot!(
        result.legend.unwrap().to_string(),
        @"Cases: [#DDDDDD NA] [#fcbba1 0 - 2] [#fc9272 2 - 4] [#fb6a4a > 4]"
    );
}

#[test]
fn test_legend_with_focus_and_unit() {
    let (_dir, config) = deployment();
    let options = LegendOptions {
        focus: vec!["epiwk=2021-01".to_string()],
        ..LegendOptions::default()
    };
    let result = run_legend(&config, &options).unwrap();
    assert_eq!((result.filtered, result.total), (2, 4));
    assert_eq!(result.values["Bo"], 2.0);

    let options = LegendOptions {
        unit: Some(MapUnit::Completeness),
        ..LegendOptions::default()
    };
    let result = run_legend(&config, &options).unwrap();
    assert_eq!(result.values["Bo"], 100.0);
    assert_eq!(result.values["Kenema"], 100.0);
}

#[test]
fn test_legend_rejects_unknown_chart() {
    let (_dir, config) = deployment();
    let options = LegendOptions {
        chart: Some("nowhere".to_string()),
        ..LegendOptions::default()
    };
    assert!(run_legend(&config, &options).is_err());
}
