//! Map metrics and color application over a two-level hierarchy.

use std::collections::BTreeMap;
use std::sync::Arc;

use epi_colorscale::{
    Breakpoint, ColorScaleEngine, Legend, MetricInputs, breakpoints, division_values,
    refresh_maps,
};
use epi_filter::{FilterCoordinator, HeadlessView};
use epi_geo::{
    Feature, FeatureCollection, GeometryIndex, PopulationTable, PopulationValue, backfill,
};
use epi_model::{
    BarParams, ChartKind, ChartSpec, ChoroplethParams, ClassificationMethod, ColorMode,
    ColorScaleSpec, DashboardConfig, DimensionSpec, FieldSchema, GeometrySpec, GroupSpec,
    InteractionSpec, MapUnit, Record, RecordSet, Rounding, Value,
};
use proptest::prelude::*;
use serde_json::json;

fn geometry_spec() -> GeometrySpec {
    GeometrySpec {
        levels: vec!["admN1".to_string(), "admN2".to_string()],
        name_properties: vec!["adm1".to_string(), "adm2".to_string()],
        ..GeometrySpec::default()
    }
}

fn feature(parts: &[&str]) -> Feature {
    let keys = ["adm1", "adm2"];
    Feature {
        properties: parts
            .iter()
            .zip(keys)
            .map(|(part, key)| (key.to_string(), json!(part)))
            .collect(),
        geometry: serde_json::Value::Null,
    }
}

fn geometry() -> GeometryIndex {
    let mut collections = BTreeMap::new();
    collections.insert(
        "admN1".to_string(),
        FeatureCollection {
            features: vec![feature(&["Bo"]), feature(&["Kenema"])],
        },
    );
    collections.insert(
        "admN2".to_string(),
        FeatureCollection {
            features: vec![
                feature(&["Bo", "Badjia"]),
                feature(&["Bo", "Bagbo"]),
                feature(&["Kenema", "Nongowa"]),
            ],
        },
    );
    GeometryIndex::build(&geometry_spec(), &collections)
}

fn population() -> PopulationTable {
    let mut table = PopulationTable::default();
    table.insert(
        "admN1",
        backfill(BTreeMap::from([
            ("Bo".to_string(), Some(PopulationValue::Scalar(1000.0))),
            ("Kenema".to_string(), Some(PopulationValue::Scalar(2000.0))),
        ])),
    );
    table
}

fn records() -> Arc<RecordSet> {
    let mut set = RecordSet::new(FieldSchema::new(["epiwk", "admN1", "admN2"]));
    let rows = [
        ("2021-01", "Bo", "Badjia"),
        ("2021-01", "Bo", "Badjia"),
        ("2021-01", "Bo", "Badjia"),
        ("2021-02", "Bo", "Badjia"),
        ("2021-02", "Kenema", "Nongowa"),
        ("2021-02", "Kenema", "Nongowa"),
    ];
    for (week, district, chiefdom) in rows {
        let values = vec![Value::from(week), Value::from(district), Value::from(chiefdom)];
        set.records.push(Record::new(values.clone(), values));
    }
    Arc::new(set)
}

fn map_chart(id: &str, level: &str) -> ChartSpec {
    ChartSpec {
        id: id.to_string(),
        dimension: DimensionSpec::AdminLevel {
            level: level.to_string(),
        },
        group: GroupSpec::Count,
        kind: ChartKind::Choropleth(ChoroplethParams {
            level: level.to_string(),
        }),
        display_colors: vec![0, 1, 2, 3, 4, 5],
    }
}

fn config() -> DashboardConfig {
    DashboardConfig {
        geometry: geometry_spec(),
        charts: vec![
            ChartSpec {
                id: "epiwk".to_string(),
                dimension: DimensionSpec::Auto {
                    column: "epiwk".to_string(),
                },
                group: GroupSpec::Count,
                kind: ChartKind::Bar(BarParams::default()),
                display_colors: Vec::new(),
            },
            map_chart("map1", "admN1"),
            map_chart("map2", "admN2"),
        ],
        interaction: InteractionSpec {
            timeline: Some("epiwk".to_string()),
            ..InteractionSpec::default()
        },
        ..DashboardConfig::default()
    }
}

struct Fixture {
    coordinator: FilterCoordinator,
    geometry: GeometryIndex,
    population: PopulationTable,
    map: HeadlessView,
}

impl Fixture {
    fn new() -> Self {
        let mut coordinator = FilterCoordinator::new(records(), &config()).unwrap();
        let map = HeadlessView::new();
        coordinator.attach_view("map1", Box::new(map.clone())).unwrap();
        Self {
            coordinator,
            geometry: geometry(),
            population: population(),
            map,
        }
    }

    fn inputs(&self) -> MetricInputs<'_> {
        MetricInputs {
            geometry: Some(&self.geometry),
            population: Some(&self.population),
        }
    }

    fn values(&self, unit: MapUnit) -> BTreeMap<String, f64> {
        division_values(&self.coordinator, "map1", unit, &ColorScaleSpec::default(), self.inputs())
            .unwrap()
    }
}

#[test]
fn test_case_counts_per_district() {
    let fixture = Fixture::new();
    let cases = fixture.values(MapUnit::Cases);
    assert_eq!(cases, BTreeMap::from([("Bo".to_string(), 4.0), ("Kenema".to_string(), 2.0)]));
    assert!(fixture.values(MapUnit::Deaths).is_empty());
}

#[test]
fn test_incidence_divides_by_population_and_periods() {
    let fixture = Fixture::new();
    let incidence = fixture.values(MapUnit::IncidenceProp);
    assert_eq!(incidence["Bo"], 20.0);
    assert_eq!(incidence["Kenema"], 5.0);
}

#[test]
fn test_completeness_counts_reporting_leaves() {
    let mut fixture = Fixture::new();
    let completeness = fixture.values(MapUnit::Completeness);
    assert_eq!(completeness["Bo"], 50.0);
    assert_eq!(completeness["Kenema"], 100.0);

    fixture.coordinator.focus("epiwk", "2021-01").unwrap();
    let completeness = fixture.values(MapUnit::Completeness);
    assert_eq!(completeness["Kenema"], 0.0);
}

#[test]
fn test_refresh_pushes_colors_and_accessors() {
    let mut fixture = Fixture::new();
    let spec = ColorScaleSpec::default();
    let mut engine = ColorScaleEngine::new(&spec);
    let inputs = MetricInputs {
        geometry: Some(&fixture.geometry),
        population: Some(&fixture.population),
    };
    let recomputed = refresh_maps(
        &mut engine,
        &mut fixture.coordinator,
        &spec,
        inputs,
        Some("map1"),
        ColorMode::Auto,
    )
    .unwrap();

    assert!(recomputed);
    assert_eq!(
        engine.breakpoints(),
        [
            Breakpoint::NoData,
            Breakpoint::Value(0.0),
            Breakpoint::Value(3.0),
            Breakpoint::Value(5.0)
        ]
    );
    assert_eq!(fixture.map.with_state(|s| s.color_domain), Some([0.0, 5.0]));
    assert_eq!(fixture.map.with_state(|s| s.colors.len()), 6);
    assert_eq!(fixture.map.color_index("Bo"), Some(2));
    assert_eq!(fixture.map.color_index("Kenema"), Some(1));
    assert_eq!(fixture.map.color_index("Nowhere"), Some(0));
    assert_eq!(fixture.map.redraws(), 1);

    insta::assert_snapshot!(
        Legend::new(&engine, &[0, 1, 2, 3, 4, 5]).to_string(),
        @"Cases: [#DDDDDD NA] [#fcbba1 0 - 3] [#fc9272 3 - 5] [#fb6a4a > 5]"
    );
}

#[test]
fn test_manual_mode_freezes_breakpoints_but_not_values() {
    let mut fixture = Fixture::new();
    let spec = ColorScaleSpec::default();
    let mut engine = ColorScaleEngine::new(&spec);
    let inputs = MetricInputs {
        geometry: Some(&fixture.geometry),
        population: Some(&fixture.population),
    };
    refresh_maps(&mut engine, &mut fixture.coordinator, &spec, inputs, Some("map1"), ColorMode::Manual)
        .unwrap();
    let frozen = engine.breakpoints().to_vec();

    engine.toggle_mode();
    assert_eq!(engine.mode(), ColorMode::Manual);
    fixture.coordinator.focus("epiwk", "2021-01").unwrap();
    let recomputed = refresh_maps(
        &mut engine,
        &mut fixture.coordinator,
        &spec,
        inputs,
        Some("map1"),
        ColorMode::Auto,
    )
    .unwrap();

    assert!(!recomputed);
    assert_eq!(engine.breakpoints(), frozen.as_slice());
    assert_eq!(fixture.map.color_index("Bo"), Some(1));
    assert_eq!(fixture.map.color_index("Kenema"), Some(0));
}

proptest! {
    #[test]
    fn prop_breakpoints_are_ascending_after_sentinel(
        values in proptest::collection::vec(0u32..5000, 0..40),
        method in proptest::sample::select(vec![
            ClassificationMethod::Jenks,
            ClassificationMethod::EqInterval,
            ClassificationMethod::ArithmeticProgression,
            ClassificationMethod::GeometricProgression,
            ClassificationMethod::Quantile,
        ]),
        raw in any::<bool>(),
    ) {
        let values: Vec<f64> = values.into_iter().map(f64::from).collect();
        let rounding = if raw { Rounding::Raw } else { Rounding::Nice };
        let scale = breakpoints(&values, method, MapUnit::Cases, rounding);
        prop_assert_eq!(scale[0], Breakpoint::NoData);
        let numbers: Vec<f64> = scale[1..].iter().filter_map(Breakpoint::value).collect();
        prop_assert_eq!(numbers.len(), scale.len() - 1);
        prop_assert!(numbers.len() >= 2);
        prop_assert!(numbers.windows(2).all(|w| w[0] < w[1]));
    }
}
