//! Geometry index and population join over small hierarchies.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use epi_geo::{
    Feature, FeatureCollection, GeometryIndex, PopulationResolver, PopulationValue,
    read_population_file,
};
use epi_model::{GeometrySpec, PopulationHeaders};
use proptest::prelude::*;
use serde_json::json;
use tempfile::NamedTempFile;

const PROPERTIES: [&str; 3] = ["adm1", "adm2", "adm3"];

fn spec(depth: usize) -> GeometrySpec {
    GeometrySpec {
        levels: (1..=depth).map(|i| format!("admN{i}")).collect(),
        name_properties: PROPERTIES[..depth].iter().map(ToString::to_string).collect(),
        ..GeometrySpec::default()
    }
}

/// Collections for a uniform tree given as leaf paths.
fn collections(depth: usize, leaves: &[Vec<String>]) -> BTreeMap<String, FeatureCollection> {
    let mut by_level: BTreeMap<String, FeatureCollection> = BTreeMap::new();
    for level in 0..depth {
        let mut seen = BTreeSet::new();
        let features = by_level.entry(format!("admN{}", level + 1)).or_default();
        for leaf in leaves {
            let path = &leaf[..=level];
            if level + 1 < depth && !seen.insert(path.to_vec()) {
                continue;
            }
            let properties: serde_json::Map<String, serde_json::Value> = path
                .iter()
                .enumerate()
                .map(|(i, part)| (PROPERTIES[i].to_string(), json!(part)))
                .collect();
            features.features.push(Feature {
                properties,
                geometry: serde_json::Value::Null,
            });
        }
    }
    by_level
}

/// Leaf counts by walking every leaf up a fixed number of levels.
fn fixed_depth_subnum(depth: usize, index: &GeometryIndex) -> BTreeMap<String, usize> {
    let leaf_level = format!("admN{depth}");
    let mut subnum = BTreeMap::new();
    for level in 1..depth {
        for name in index.level(&format!("admN{level}")).unwrap().names() {
            subnum.insert(name.to_string(), 0);
        }
    }
    let leaves: BTreeSet<&str> = index.level(&leaf_level).unwrap().names().collect();
    for leaf in leaves {
        subnum.insert(leaf.to_string(), 1);
        let parts: Vec<&str> = leaf.split(", ").collect();
        for i in 0..depth - 1 {
            *subnum.entry(parts[..=i].join(", ")).or_insert(0) += 1;
        }
    }
    subnum
}

fn leaf_paths(depth: usize) -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec(0u8..3, depth), 1..20).prop_map(|paths| {
        paths
            .into_iter()
            .map(|path| {
                path.into_iter()
                    .enumerate()
                    .map(|(level, n)| format!("L{level}-{n}"))
                    .collect()
            })
            .collect()
    })
}

fn path(parts: &[&str]) -> Vec<String> {
    parts.iter().map(ToString::to_string).collect()
}

#[test]
fn test_subnum_counts_leaves() {
    let leaves = vec![
        path(&["D1", "C1", "S1"]),
        path(&["D1", "C1", "S2"]),
        path(&["D1", "C2", "S1"]),
        path(&["D2", "C1", "S1"]),
    ];
    let index = GeometryIndex::build(&spec(3), &collections(3, &leaves));
    assert_eq!(index.subnum("admN1", "D1"), Some(3));
    assert_eq!(index.subnum("admN1", "D2"), Some(1));
    assert_eq!(index.subnum("admN2", "D1, C1"), Some(2));
    assert_eq!(index.subnum("admN3", "D1, C2, S1"), Some(1));
    assert_eq!(index.all_names().len(), 2 + 3 + 4);
}

#[test]
fn test_duplicate_leaves_across_branches() {
    // Same leaf label under two districts: distinct composite names, both counted.
    // An exact repeat of one composite leaf name counts once.
    let leaves = vec![
        path(&["D1", "X"]),
        path(&["D2", "X"]),
        path(&["D2", "X"]),
    ];
    let index = GeometryIndex::build(&spec(2), &collections(2, &leaves));
    assert_eq!(index.level("admN2").unwrap().len(), 2);
    assert_eq!(index.subnum("admN1", "D1"), Some(1));
    assert_eq!(index.subnum("admN1", "D2"), Some(1));
    assert_eq!(index.subnum("admN2", "D2, X"), Some(1));
}

#[test]
fn test_irregular_tree_with_parent_override() {
    let mut spec = GeometrySpec {
        levels: vec!["admN1".into(), "admN2".into(), "camps".into()],
        name_properties: vec!["adm1".into(), "adm2".into(), "camp".into()],
        ..GeometrySpec::default()
    };
    spec.parents.insert("camps".into(), "admN1".into());
    let feature = |properties: serde_json::Value| -> Feature {
        serde_json::from_value(json!({ "properties": properties })).unwrap()
    };
    let mut collections = BTreeMap::new();
    collections.insert(
        "admN1".to_string(),
        FeatureCollection {
            features: vec![feature(json!({"adm1": "D1"}))],
        },
    );
    collections.insert(
        "admN2".to_string(),
        FeatureCollection {
            features: vec![
                feature(json!({"adm1": "D1", "adm2": "C1"})),
                feature(json!({"adm1": "D1", "adm2": "C2"})),
            ],
        },
    );
    collections.insert(
        "camps".to_string(),
        FeatureCollection {
            features: vec![feature(json!({"adm1": "D1", "adm2": "", "camp": "K1"}))],
        },
    );
    let index = GeometryIndex::build(&spec, &collections);
    assert!(index.is_leaf_level("admN2"));
    assert!(index.is_leaf_level("camps"));
    assert_eq!(index.subnum("admN1", "D1"), Some(3));
    assert_eq!(index.subnum("camps", "D1, , K1"), Some(1));
}

#[test]
fn test_population_from_geometry_backfills() {
    let feature = |name: &str, pop: serde_json::Value| -> Feature {
        serde_json::from_value(json!({ "properties": {"adm1": name, "pop": pop} })).unwrap()
    };
    let mut collections = BTreeMap::new();
    collections.insert(
        "admN1".to_string(),
        FeatureCollection {
            features: vec![
                feature("A", json!(10)),
                feature("B", json!(null)),
                feature("C", json!(30)),
            ],
        },
    );
    let index = GeometryIndex::build(&spec(1), &collections);
    let table = PopulationResolver::new(&index).from_geometry("pop");
    let figures: Vec<Option<f64>> = ["A", "B", "C"]
        .iter()
        .map(|name| table.get("admN1", name).and_then(|v| v.at(None)))
        .collect();
    assert_eq!(figures, vec![Some(10.0), Some(20.0), Some(30.0)]);
    assert!(table.unresolved_levels().is_empty());
}

#[test]
fn test_population_file_join() {
    let leaves = vec![path(&["Bo"]), path(&["Kenema"]), path(&["Kono"])];
    let index = GeometryIndex::build(&spec(1), &collections(1, &leaves));

    let mut file = NamedTempFile::with_suffix(".csv").unwrap();
    write!(file, "name,pop,2020,2021\nBo,100,100,120\nKenema,,300,\nAtlantis,5,5,5\n").unwrap();

    let scalar = read_population_file(file.path(), &PopulationHeaders::default()).unwrap();
    let population = PopulationResolver::new(&index).from_rows("admN1", scalar);
    assert_eq!(population.get("Bo"), Some(&PopulationValue::Scalar(100.0)));
    assert_eq!(population.get("Kenema"), Some(&PopulationValue::Scalar(100.0)));
    assert_eq!(population.unmatched, vec!["Atlantis".to_string()]);

    let headers = PopulationHeaders {
        years: vec!["2020".to_string(), "2021".to_string()],
        ..PopulationHeaders::default()
    };
    let yearly = read_population_file(file.path(), &headers).unwrap();
    let population = PopulationResolver::new(&index).from_rows("admN1", yearly);
    let kenema = population.get("Kenema").unwrap();
    assert_eq!(kenema.at(Some("2020")), Some(300.0));
    assert_eq!(kenema.at(Some("2021")), Some(120.0));
    assert_eq!(population.backfilled, vec!["Kono".to_string()]);
}

proptest! {
    #[test]
    fn prop_subnum_matches_fixed_depth_walk(depth in 1usize..=3, leaves in leaf_paths(3)) {
        let leaves: Vec<Vec<String>> = leaves.into_iter().map(|l| l[..depth].to_vec()).collect();
        let index = GeometryIndex::build(&spec(depth), &collections(depth, &leaves));
        let mut walked = BTreeMap::new();
        for level in index.level_keys() {
            walked.extend(index.subnum_level(level).unwrap().clone());
        }
        prop_assert_eq!(walked, fixed_depth_subnum(depth, &index));
    }

    #[test]
    fn prop_subnum_is_sum_of_children(leaves in leaf_paths(3)) {
        let index = GeometryIndex::build(&spec(3), &collections(3, &leaves));
        let distinct_leaves = index.level("admN3").unwrap().len();
        let roots: usize = index.subnum_level("admN1").unwrap().values().sum();
        prop_assert_eq!(roots, distinct_leaves);
        for (level, child) in [("admN1", "admN2"), ("admN2", "admN3")] {
            for (name, count) in index.subnum_level(level).unwrap() {
                let children: usize = index
                    .subnum_level(child)
                    .unwrap()
                    .iter()
                    .filter(|(child_name, _)| {
                        child_name.rsplit_once(", ").map(|(parent, _)| parent) == Some(name.as_str())
                    })
                    .map(|(_, n)| n)
                    .sum();
                prop_assert_eq!(*count, children);
            }
        }
    }
}
