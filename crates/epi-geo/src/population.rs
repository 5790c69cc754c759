//! Population join onto geometry divisions.
//!
//! Figures come either from a property of the boundary features or from one
//! population file per level. Divisions without a figure get the mean of the
//! known figures of their level; a level with no figure at all stays
//! unresolved and is reported, never defaulted to zero.

use std::collections::BTreeMap;
use std::path::Path;

use epi_ingest::{SideLayer, read_side_layer};
use epi_model::{PopulationHeaders, Value};
use serde::{Deserialize, Serialize};

use crate::error::{GeoError, Result};
use crate::index::GeometryIndex;

/// Population of one division: a single figure or one figure per year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PopulationValue {
    Scalar(f64),
    Yearly(BTreeMap<String, f64>),
}

impl PopulationValue {
    /// Figure for `year`; yearly values fall back to the latest year.
    pub fn at(&self, year: Option<&str>) -> Option<f64> {
        match self {
            PopulationValue::Scalar(value) => Some(*value),
            PopulationValue::Yearly(values) => year
                .and_then(|year| values.get(year))
                .or_else(|| values.values().next_back())
                .copied(),
        }
    }
}

/// Population figures of one level.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LevelPopulation {
    values: BTreeMap<String, PopulationValue>,
    /// Divisions that received the level mean.
    pub backfilled: Vec<String>,
    /// Divisions left without a figure because the level has none.
    pub unresolved: Vec<String>,
    /// Names from the population source that match no division.
    pub unmatched: Vec<String>,
}

impl LevelPopulation {
    pub fn get(&self, name: &str) -> Option<&PopulationValue> {
        self.values.get(name)
    }

    pub fn values(&self) -> &BTreeMap<String, PopulationValue> {
        &self.values
    }

    pub fn is_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Population of every resolved level.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PopulationTable {
    levels: BTreeMap<String, LevelPopulation>,
}

impl PopulationTable {
    pub fn level(&self, level: &str) -> Option<&LevelPopulation> {
        self.levels.get(level)
    }

    pub fn get(&self, level: &str, name: &str) -> Option<&PopulationValue> {
        self.levels.get(level)?.get(name)
    }

    pub fn insert(&mut self, level: impl Into<String>, population: LevelPopulation) {
        self.levels.insert(level.into(), population);
    }

    /// Take every level of `other`, replacing levels already present.
    pub fn merge(&mut self, other: PopulationTable) {
        self.levels.extend(other.levels);
    }

    pub fn levels(&self) -> impl Iterator<Item = (&str, &LevelPopulation)> {
        self.levels.iter().map(|(level, pop)| (level.as_str(), pop))
    }

    /// Levels where at least one division has no figure.
    pub fn unresolved_levels(&self) -> Vec<&str> {
        self.levels
            .iter()
            .filter(|(_, pop)| !pop.is_resolved())
            .map(|(level, _)| level.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// One row of a population file.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationRow {
    pub name: String,
    pub value: Option<PopulationValue>,
}

/// Zero and non-finite figures count as missing.
fn known(value: f64) -> Option<f64> {
    (value.is_finite() && value != 0.0).then_some(value)
}

fn parse_integer(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => Some(number.trunc()),
        Value::Text(text) => {
            let digits: String = text
                .trim()
                .chars()
                .enumerate()
                .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
                .map(|(_, c)| c)
                .collect();
            digits.parse::<i64>().ok().map(|n| n as f64)
        }
        Value::Missing | Value::Empty => None,
    }?;
    known(number)
}

/// Fill missing figures of one level with the mean of the known ones.
pub fn backfill(raw: BTreeMap<String, Option<PopulationValue>>) -> LevelPopulation {
    let mut scalar_total = 0.0;
    let mut scalar_count = 0usize;
    let mut yearly_totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for value in raw.values().flatten() {
        match value {
            PopulationValue::Scalar(figure) => {
                scalar_total += figure;
                scalar_count += 1;
            }
            PopulationValue::Yearly(years) => {
                for (year, figure) in years {
                    let entry = yearly_totals.entry(year.clone()).or_insert((0.0, 0));
                    entry.0 += figure;
                    entry.1 += 1;
                }
            }
        }
    }
    let yearly_means: BTreeMap<String, f64> = yearly_totals
        .into_iter()
        .map(|(year, (total, count))| (year, total / count as f64))
        .collect();
    let scalar_mean = (scalar_count > 0).then(|| scalar_total / scalar_count as f64);

    let mut population = LevelPopulation::default();
    for (name, value) in raw {
        let filled = match value {
            Some(PopulationValue::Yearly(mut years)) => {
                for (year, mean) in &yearly_means {
                    if !years.contains_key(year) {
                        years.insert(year.clone(), *mean);
                    }
                }
                Some(PopulationValue::Yearly(years))
            }
            Some(scalar) => Some(scalar),
            None => {
                let mean = if yearly_means.is_empty() {
                    scalar_mean.map(PopulationValue::Scalar)
                } else {
                    Some(PopulationValue::Yearly(yearly_means.clone()))
                };
                match &mean {
                    Some(_) => population.backfilled.push(name.clone()),
                    None => population.unresolved.push(name.clone()),
                }
                mean
            }
        };
        if let Some(value) = filled {
            population.values.insert(name, value);
        }
    }
    population
}

/// Resolves population figures against a geometry index.
#[derive(Debug, Clone, Copy)]
pub struct PopulationResolver<'a> {
    index: &'a GeometryIndex,
}

impl<'a> PopulationResolver<'a> {
    pub fn new(index: &'a GeometryIndex) -> Self {
        Self { index }
    }

    /// Read figures from a numeric feature property, for every level.
    pub fn from_geometry(&self, property: &str) -> PopulationTable {
        let mut table = PopulationTable::default();
        for level in self.index.level_keys() {
            let Some(divisions) = self.index.level(level) else {
                continue;
            };
            let raw = divisions
                .divisions()
                .iter()
                .map(|division| {
                    let value = division
                        .feature
                        .property_number(property)
                        .and_then(known)
                        .map(PopulationValue::Scalar);
                    (division.name.clone(), value)
                })
                .collect();
            let population = backfill(raw);
            log_level(level, &population);
            table.insert(level, population);
        }
        table
    }

    /// Join population rows onto the divisions of one level by name.
    pub fn from_rows(&self, level: &str, rows: Vec<PopulationRow>) -> LevelPopulation {
        let divisions = self.index.level(level);
        let mut raw: BTreeMap<String, Option<PopulationValue>> = divisions
            .map(|d| d.names().map(|name| (name.to_string(), None)).collect())
            .unwrap_or_default();
        let mut unmatched = Vec::new();
        for row in rows {
            match raw.get_mut(&row.name) {
                Some(slot) => *slot = row.value,
                None => unmatched.push(row.name),
            }
        }
        let mut population = backfill(raw);
        if !unmatched.is_empty() {
            tracing::warn!(
                level = %level,
                names = ?unmatched,
                "population names match no division"
            );
        }
        population.unmatched = unmatched;
        log_level(level, &population);
        population
    }
}

fn log_level(level: &str, population: &LevelPopulation) {
    if population.is_resolved() {
        tracing::debug!(
            level = %level,
            divisions = population.values.len(),
            backfilled = population.backfilled.len(),
            "resolved population"
        );
    } else {
        tracing::warn!(
            level = %level,
            unresolved = population.unresolved.len(),
            "no population figure at this level"
        );
    }
}

/// Read a population file: delimited rows or a JSON array of objects.
///
/// Divisions are keyed by the `name` header; figures parse as integers from
/// the `pop` column, or from each `years` column when years are configured.
pub fn read_population_file(path: &Path, headers: &PopulationHeaders) -> Result<Vec<PopulationRow>> {
    let table: Vec<BTreeMap<String, Value>> = match read_side_layer(path, None)? {
        SideLayer::Table(sheet) => {
            let header: Vec<String> = sheet.header().iter().map(ToString::to_string).collect();
            sheet
                .data_rows()
                .iter()
                .map(|row| {
                    header
                        .iter()
                        .cloned()
                        .zip(row.iter().cloned().chain(std::iter::repeat(Value::Empty)))
                        .collect()
                })
                .collect()
        }
        SideLayer::Json(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(serde_json::Value::as_object)
            .map(|object| {
                object
                    .iter()
                    .map(|(key, value)| (key.clone(), json_cell(value)))
                    .collect()
            })
            .collect(),
        SideLayer::Json(_) => {
            return Err(GeoError::UnsupportedPopulationLayout {
                path: path.to_path_buf(),
            });
        }
    };

    if let Some(first) = table.first() {
        if !first.contains_key(headers.name.trim()) {
            return Err(GeoError::MissingPopulationHeader {
                path: path.to_path_buf(),
                header: headers.name.clone(),
            });
        }
    }

    let rows = table
        .into_iter()
        .filter_map(|row| {
            let name = row.get(headers.name.trim())?.to_string().trim().to_string();
            if name.is_empty() {
                return None;
            }
            let value = if headers.years.is_empty() {
                row.get(&headers.pop)
                    .and_then(parse_integer)
                    .map(PopulationValue::Scalar)
            } else {
                let years: BTreeMap<String, f64> = headers
                    .years
                    .iter()
                    .filter_map(|year| Some((year.clone(), parse_integer(row.get(year)?)?)))
                    .collect();
                (!years.is_empty()).then_some(PopulationValue::Yearly(years))
            };
            Some(PopulationRow { name, value })
        })
        .collect::<Vec<_>>();
    tracing::debug!(path = %path.display(), rows = rows.len(), "read population file");
    Ok(rows)
}

fn json_cell(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Number(number) => number.as_f64().map_or(Value::Empty, Value::Number),
        serde_json::Value::String(text) => Value::from_cell(text),
        serde_json::Value::Null => Value::Empty,
        other => Value::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(values: &[(&str, Option<f64>)]) -> BTreeMap<String, Option<PopulationValue>> {
        values
            .iter()
            .map(|(name, value)| (name.to_string(), value.map(PopulationValue::Scalar)))
            .collect()
    }

    #[test]
    fn test_backfill_uses_level_mean() {
        let population = backfill(level(&[("a", Some(10.0)), ("b", None), ("c", Some(30.0))]));
        assert_eq!(population.get("b"), Some(&PopulationValue::Scalar(20.0)));
        assert_eq!(population.backfilled, vec!["b".to_string()]);
        assert!(population.is_resolved());
    }

    #[test]
    fn test_all_missing_stays_unresolved() {
        let population = backfill(level(&[("a", None), ("b", None)]));
        assert!(population.get("a").is_none());
        assert_eq!(population.unresolved.len(), 2);
        assert!(!population.is_resolved());
    }

    #[test]
    fn test_yearly_backfill_per_year() {
        let mut raw = BTreeMap::new();
        raw.insert(
            "a".to_string(),
            Some(PopulationValue::Yearly(BTreeMap::from([
                ("2020".to_string(), 100.0),
                ("2021".to_string(), 110.0),
            ]))),
        );
        raw.insert(
            "b".to_string(),
            Some(PopulationValue::Yearly(BTreeMap::from([("2020".to_string(), 300.0)]))),
        );
        raw.insert("c".to_string(), None);
        let population = backfill(raw);
        let b = population.get("b").unwrap();
        assert_eq!(b.at(Some("2021")), Some(110.0));
        let c = population.get("c").unwrap();
        assert_eq!(c.at(Some("2020")), Some(200.0));
        assert_eq!(c.at(Some("1999")), Some(110.0));
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer(&Value::from("1500")), Some(1500.0));
        assert_eq!(parse_integer(&Value::from("1500.7")), Some(1500.0));
        assert_eq!(parse_integer(&Value::from("abc")), None);
        assert_eq!(parse_integer(&Value::from("0")), None);
        assert_eq!(parse_integer(&Value::Number(12.9)), Some(12.0));
    }
}
