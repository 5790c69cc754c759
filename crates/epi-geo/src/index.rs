//! Hierarchical index of administrative divisions.

use std::collections::{BTreeMap, BTreeSet};

use epi_model::{GeometrySpec, Viewport};

use crate::feature::{Feature, FeatureCollection};

/// Separator between the components of a composite division name.
pub const NAME_SEPARATOR: &str = ", ";

/// One administrative division with its composite name.
#[derive(Debug, Clone, PartialEq)]
pub struct Division {
    pub name: String,
    /// Depth of the level, 0 at the root.
    pub level: usize,
    pub feature: Feature,
}

/// Divisions of one level in feature order, with name lookup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LevelIndex {
    divisions: Vec<Division>,
    by_name: BTreeMap<String, usize>,
}

impl LevelIndex {
    pub fn get(&self, name: &str) -> Option<&Division> {
        self.by_name.get(name).map(|&i| &self.divisions[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn divisions(&self) -> &[Division] {
        &self.divisions
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.divisions.iter().map(|d| d.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.divisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.divisions.is_empty()
    }
}

/// Composite name of a feature at `depth`.
///
/// Joins the trimmed `name_properties[0..=depth]`; without name properties the
/// feature's own `name` property is used.
pub fn composite_name(feature: &Feature, name_properties: &[String], depth: usize) -> String {
    if name_properties.is_empty() {
        return feature.property_text("name");
    }
    name_properties
        .iter()
        .take(depth + 1)
        .map(|key| feature.property_text(key))
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR)
}

/// First `depth + 1` components of a composite name.
pub fn name_prefix(name: &str, depth: usize) -> String {
    name.split(NAME_SEPARATOR)
        .take(depth + 1)
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR)
}

/// Divisions of every level, indexed by composite name, with leaf counts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometryIndex {
    spec: GeometrySpec,
    levels: BTreeMap<String, LevelIndex>,
    all_names: Vec<String>,
    subnum: BTreeMap<String, BTreeMap<String, usize>>,
}

impl GeometryIndex {
    /// Build the index from one feature collection per level.
    ///
    /// Levels without a collection are left out. A name repeated within a
    /// level keeps its first feature.
    pub fn build(spec: &GeometrySpec, collections: &BTreeMap<String, FeatureCollection>) -> Self {
        let mut index = Self {
            spec: spec.clone(),
            ..Self::default()
        };
        for (depth, level) in spec.levels.iter().enumerate() {
            let Some(collection) = collections.get(level) else {
                tracing::warn!(level = %level, "no geometry loaded for level");
                continue;
            };
            let mut level_index = LevelIndex::default();
            for feature in &collection.features {
                let name = composite_name(feature, &spec.name_properties, depth);
                if level_index.by_name.contains_key(&name) {
                    tracing::warn!(level = %level, name = %name, "duplicate division name, keeping first");
                    continue;
                }
                level_index
                    .by_name
                    .insert(name.clone(), level_index.divisions.len());
                index.all_names.push(name.clone());
                level_index.divisions.push(Division {
                    name,
                    level: depth,
                    feature: feature.clone(),
                });
            }
            tracing::debug!(level = %level, divisions = level_index.len(), "indexed geometry level");
            index.levels.insert(level.clone(), level_index);
        }
        index.subnum = compute_subnum(&index.spec, &index.levels);
        index
    }

    pub fn spec(&self) -> &GeometrySpec {
        &self.spec
    }

    /// Level keys present in the index, root first.
    pub fn level_keys(&self) -> impl Iterator<Item = &str> {
        self.spec
            .levels
            .iter()
            .filter(|level| self.levels.contains_key(*level))
            .map(String::as_str)
    }

    pub fn level(&self, level: &str) -> Option<&LevelIndex> {
        self.levels.get(level)
    }

    pub fn feature(&self, level: &str, name: &str) -> Option<&Division> {
        self.levels.get(level)?.get(name)
    }

    /// Every division name of every level, in load order.
    pub fn all_names(&self) -> &[String] {
        &self.all_names
    }

    /// Number of leaf divisions under `name` at `level`; leaves count 1.
    pub fn subnum(&self, level: &str, name: &str) -> Option<usize> {
        self.subnum.get(level)?.get(name).copied()
    }

    pub fn subnum_level(&self, level: &str) -> Option<&BTreeMap<String, usize>> {
        self.subnum.get(level)
    }

    /// True when no loaded level names `level` as its parent.
    pub fn is_leaf_level(&self, level: &str) -> bool {
        is_leaf_level(&self.spec, &self.levels, level)
    }

    /// Bounding box of a level, or of one division when `name` is given.
    pub fn bounds(&self, level: &str, name: Option<&str>) -> Option<Viewport> {
        let level = self.levels.get(level)?;
        match name {
            Some(name) => FeatureCollection::bounds([&level.get(name)?.feature]),
            None => FeatureCollection::bounds(level.divisions.iter().map(|d| &d.feature)),
        }
    }
}

fn is_leaf_level(spec: &GeometrySpec, loaded: &BTreeMap<String, LevelIndex>, level: &str) -> bool {
    !loaded
        .keys()
        .any(|other| spec.parent_of(other) == Some(level))
}

/// Leaf counts by parent-pointer walk.
///
/// Each distinct leaf name counts 1 for itself and for every ancestor reached
/// through `parent_of`; the ancestor is named by the leaf's name prefix at the
/// ancestor's depth. Non-leaf divisions start at 0.
fn compute_subnum(
    spec: &GeometrySpec,
    levels: &BTreeMap<String, LevelIndex>,
) -> BTreeMap<String, BTreeMap<String, usize>> {
    let mut subnum: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for (level, index) in levels {
        if !is_leaf_level(spec, levels, level) {
            let counts = subnum.entry(level.clone()).or_default();
            for name in index.names() {
                counts.entry(name.to_string()).or_insert(0);
            }
        }
    }
    for (level, index) in levels {
        if !is_leaf_level(spec, levels, level) {
            continue;
        }
        let leaves: BTreeSet<&str> = index.names().collect();
        for leaf in leaves {
            subnum
                .entry(level.clone())
                .or_default()
                .insert(leaf.to_string(), 1);
            let mut visited = BTreeSet::from([level.as_str()]);
            let mut parent = spec.parent_of(level);
            while let Some(ancestor) = parent {
                if !visited.insert(ancestor) {
                    tracing::warn!(level = %ancestor, "cycle in geometry parents");
                    break;
                }
                let Some(depth) = spec.depth_of(ancestor) else {
                    break;
                };
                *subnum
                    .entry(ancestor.to_string())
                    .or_default()
                    .entry(name_prefix(leaf, depth))
                    .or_insert(0) += 1;
                parent = spec.parent_of(ancestor);
            }
        }
    }
    subnum
}
