//! Multi-dimensional cross-filtering over an immutable record set.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use epi_model::{DimensionSpec, GeometrySpec, GroupSpec, Record, RecordSet};

use crate::value::{DimValue, FilterPredicate};
use crate::view::GroupBin;

/// Handle to a dimension of a [`CrossFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DimensionId(usize);

/// Whether a dimension filters by value set or by range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionKind {
    Discrete,
    Continuous,
}

impl DimensionKind {
    pub fn label(&self) -> &'static str {
        match self {
            DimensionKind::Discrete => "discrete",
            DimensionKind::Continuous => "continuous",
        }
    }

    pub fn accepts(&self, predicate: &FilterPredicate) -> bool {
        match self {
            DimensionKind::Discrete => !predicate.is_range(),
            DimensionKind::Continuous => predicate.is_range(),
        }
    }
}

/// How a dimension reads its value from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionSource {
    /// Discrete value of the field at this schema position.
    Field(usize),
    /// Numeric value of the field at this position.
    Number(usize),
    /// Date text of the field at this position.
    Date(usize),
    /// Composite administrative name over these positions, root first.
    AdminName(Vec<Option<usize>>),
}

impl DimensionSource {
    /// Resolve a non-shared dimension spec against a record schema.
    ///
    /// Returns `Err` with the name of the first unknown field or level.
    pub fn resolve(
        spec: &DimensionSpec,
        records: &RecordSet,
        geometry: &GeometrySpec,
    ) -> std::result::Result<Option<(Self, DimensionKind)>, String> {
        let position = |column: &str| records.schema.index_of(column).ok_or_else(|| column.to_string());
        let resolved = match spec {
            DimensionSpec::Auto { column } => (DimensionSource::Field(position(column)?), DimensionKind::Discrete),
            DimensionSpec::Integer { column } => {
                (DimensionSource::Number(position(column)?), DimensionKind::Continuous)
            }
            DimensionSpec::Date { column } => (DimensionSource::Date(position(column)?), DimensionKind::Continuous),
            DimensionSpec::AdminLevel { level } => {
                let depth = geometry.depth_of(level).ok_or_else(|| level.clone())?;
                let positions = geometry.levels[..=depth]
                    .iter()
                    .map(|level| records.schema.index_of(level))
                    .collect();
                (DimensionSource::AdminName(positions), DimensionKind::Discrete)
            }
            DimensionSpec::Shared { .. } => return Ok(None),
        };
        Ok(Some(resolved))
    }

    pub fn value_of(&self, record: &Record) -> DimValue {
        match self {
            DimensionSource::Field(position) => DimValue::from(record.value(*position)),
            DimensionSource::Number(position) => record
                .value(*position)
                .as_f64()
                .map_or(DimValue::Blank, DimValue::Number),
            DimensionSource::Date(position) => match record.value(*position).as_text() {
                Some(text) if !text.trim().is_empty() => DimValue::Text(text.trim().to_string()),
                _ => DimValue::Blank,
            },
            DimensionSource::AdminName(positions) => admin_name(record, positions),
        }
    }
}

/// Composite administrative name of a record, or blank when every part is empty.
pub fn admin_name(record: &Record, positions: &[Option<usize>]) -> DimValue {
    let parts: Vec<String> = positions
        .iter()
        .map(|position| {
            position
                .map(|p| record.value(p).to_string().trim().to_string())
                .unwrap_or_default()
        })
        .collect();
    if parts.iter().all(String::is_empty) {
        DimValue::Blank
    } else {
        DimValue::Text(parts.join(", "))
    }
}

#[derive(Debug, Clone)]
struct Dimension {
    source: DimensionSource,
    kind: DimensionKind,
    values: Vec<DimValue>,
    predicate: Option<FilterPredicate>,
    /// Bound to no chart; survives `clear_all`.
    pinned: bool,
}

/// Record set with per-dimension predicates.
#[derive(Debug, Clone)]
pub struct CrossFilter {
    records: Arc<RecordSet>,
    dimensions: Vec<Dimension>,
}

impl CrossFilter {
    pub fn new(records: Arc<RecordSet>) -> Self {
        Self {
            records,
            dimensions: Vec::new(),
        }
    }

    pub fn records(&self) -> &Arc<RecordSet> {
        &self.records
    }

    pub fn add_dimension(&mut self, source: DimensionSource, kind: DimensionKind) -> DimensionId {
        let values = self.records.records.iter().map(|r| source.value_of(r)).collect();
        self.dimensions.push(Dimension {
            source,
            kind,
            values,
            predicate: None,
            pinned: false,
        });
        DimensionId(self.dimensions.len() - 1)
    }

    /// A pinned discrete copy of another dimension, reading the same values.
    ///
    /// Its predicate narrows every group, including the copied dimension's
    /// own, and is left alone by `clear_all`.
    pub fn add_pinned_copy(&mut self, of: DimensionId) -> Option<DimensionId> {
        let original = self.dimensions.get(of.0)?;
        let copy = Dimension {
            source: original.source.clone(),
            kind: DimensionKind::Discrete,
            values: original.values.clone(),
            predicate: None,
            pinned: true,
        };
        self.dimensions.push(copy);
        Some(DimensionId(self.dimensions.len() - 1))
    }

    /// Swap the record set, recomputing every dimension.
    ///
    /// Predicates of chart dimensions are cleared; pinned ones are kept.
    pub fn replace_records(&mut self, records: Arc<RecordSet>) {
        self.records = records;
        for dimension in &mut self.dimensions {
            dimension.values = self
                .records
                .records
                .iter()
                .map(|r| dimension.source.value_of(r))
                .collect();
            if !dimension.pinned {
                dimension.predicate = None;
            }
        }
    }

    pub fn kind(&self, id: DimensionId) -> Option<DimensionKind> {
        self.dimensions.get(id.0).map(|d| d.kind)
    }

    pub fn predicate(&self, id: DimensionId) -> Option<&FilterPredicate> {
        self.dimensions.get(id.0)?.predicate.as_ref()
    }

    /// Set or clear a predicate. Returns false if the predicate kind does not fit.
    pub fn set_predicate(&mut self, id: DimensionId, predicate: Option<FilterPredicate>) -> bool {
        let Some(dimension) = self.dimensions.get_mut(id.0) else {
            return false;
        };
        if let Some(predicate) = &predicate
            && !dimension.kind.accepts(predicate)
        {
            return false;
        }
        dimension.predicate = predicate;
        true
    }

    /// Clear every predicate except those of pinned dimensions.
    pub fn clear_all(&mut self) {
        for dimension in self.dimensions.iter_mut().filter(|d| !d.pinned) {
            dimension.predicate = None;
        }
    }

    pub fn active_predicates(&self) -> usize {
        self.dimensions.iter().filter(|d| d.predicate.is_some()).count()
    }

    /// Whether record `index` passes every predicate except `except`'s.
    pub fn passes(&self, index: usize, except: Option<DimensionId>) -> bool {
        self.dimensions.iter().enumerate().all(|(i, dimension)| {
            Some(DimensionId(i)) == except
                || dimension
                    .predicate
                    .as_ref()
                    .is_none_or(|p| p.matches(&dimension.values[index]))
        })
    }

    /// Indices of records passing every active predicate.
    pub fn filtered_indices(&self) -> Vec<usize> {
        self.indices_except(None)
    }

    /// Indices of records passing every predicate other than `except`'s.
    pub fn indices_except(&self, except: Option<DimensionId>) -> Vec<usize> {
        (0..self.records.len()).filter(|&i| self.passes(i, except)).collect()
    }

    pub fn filtered_count(&self) -> usize {
        (0..self.records.len()).filter(|&i| self.passes(i, None)).count()
    }

    pub fn total_count(&self) -> usize {
        self.records.len()
    }

    /// Value of a record on a dimension.
    pub fn value(&self, id: DimensionId, index: usize) -> Option<&DimValue> {
        self.dimensions.get(id.0)?.values.get(index)
    }

    /// Distinct non-blank values over all records, sorted.
    pub fn domain(&self, id: DimensionId) -> Vec<DimValue> {
        let Some(dimension) = self.dimensions.get(id.0) else {
            return Vec::new();
        };
        let distinct: BTreeSet<&DimValue> = dimension.values.iter().filter(|v| !v.is_blank()).collect();
        distinct.into_iter().cloned().collect()
    }

    /// Distinct non-blank values among records passing every predicate.
    pub fn filtered_distinct(&self, id: DimensionId) -> BTreeSet<DimValue> {
        let Some(dimension) = self.dimensions.get(id.0) else {
            return BTreeSet::new();
        };
        (0..self.records.len())
            .filter(|&i| self.passes(i, None))
            .map(|i| &dimension.values[i])
            .filter(|v| !v.is_blank())
            .cloned()
            .collect()
    }

    /// Grouped values of a dimension, filtered by every other dimension.
    ///
    /// Blank keys are left out. `GroupSpec::None` yields no bins.
    pub fn group(&self, id: DimensionId, group: &GroupSpec) -> Vec<GroupBin> {
        let Some(dimension) = self.dimensions.get(id.0) else {
            return Vec::new();
        };
        let sum_field = match group {
            GroupSpec::None => return Vec::new(),
            GroupSpec::Count => None,
            GroupSpec::Sum { field } => match self.records.schema.index_of(field) {
                Some(position) => Some(position),
                None => return Vec::new(),
            },
        };
        let mut totals: BTreeMap<&DimValue, f64> = BTreeMap::new();
        for (index, key) in dimension.values.iter().enumerate() {
            if key.is_blank() {
                continue;
            }
            let entry = totals.entry(key).or_insert(0.0);
            if !self.passes(index, Some(id)) {
                continue;
            }
            *entry += match sum_field {
                None => 1.0,
                Some(position) => self.records.records[index].value(position).as_f64().unwrap_or(0.0),
            };
        }
        totals
            .into_iter()
            .map(|(key, value)| GroupBin {
                key: key.clone(),
                value,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epi_model::{FieldSchema, Value};

    fn records() -> Arc<RecordSet> {
        let mut set = RecordSet::new(FieldSchema::new(["sex", "age", "admN1", "admN2"]));
        for (sex, age, district, chiefdom) in [
            ("F", 30.0, "Bo", "Badjia"),
            ("M", 5.0, "Bo", "Bagbo"),
            ("F", 70.0, "Kenema", ""),
            ("F", -1.0, "", ""),
        ] {
            let values = vec![
                Value::from(sex),
                Value::Number(age),
                Value::from(district),
                Value::from(chiefdom),
            ];
            set.records.push(Record::new(values.clone(), values));
        }
        Arc::new(set)
    }

    #[test]
    fn test_group_excludes_own_dimension() {
        let mut cf = CrossFilter::new(records());
        let sex = cf.add_dimension(DimensionSource::Field(0), DimensionKind::Discrete);
        let age = cf.add_dimension(DimensionSource::Number(1), DimensionKind::Continuous);

        assert!(cf.set_predicate(sex, Some(FilterPredicate::values(["F"]))));
        assert!(cf.set_predicate(age, Some(FilterPredicate::range(0.0, 50.0))));
        assert_eq!(cf.filtered_count(), 1);

        let by_sex = cf.group(sex, &GroupSpec::Count);
        assert_eq!(by_sex.len(), 2);
        assert_eq!(by_sex[0].key, DimValue::from("F"));
        assert_eq!(by_sex[0].value, 1.0);
        assert_eq!(by_sex[1].value, 1.0);

        let by_age = cf.group(age, &GroupSpec::Count);
        assert_eq!(by_age.iter().map(|b| b.value).sum::<f64>(), 3.0);
    }

    #[test]
    fn test_pinned_copy_survives_clear_all() {
        let mut cf = CrossFilter::new(records());
        let sex = cf.add_dimension(DimensionSource::Field(0), DimensionKind::Discrete);
        let pinned = cf.add_pinned_copy(sex).unwrap();

        assert!(cf.set_predicate(pinned, Some(FilterPredicate::values(["F"]))));
        assert!(cf.set_predicate(sex, Some(FilterPredicate::values(["M"]))));
        assert_eq!(cf.filtered_count(), 0);

        let by_sex = cf.group(sex, &GroupSpec::Count);
        assert_eq!(by_sex[0].value, 3.0);
        assert_eq!(by_sex[1].value, 0.0);

        cf.clear_all();
        assert!(cf.predicate(sex).is_none());
        assert_eq!(cf.filtered_count(), 3);

        cf.replace_records(records());
        assert_eq!(cf.filtered_count(), 3);
    }

    #[test]
    fn test_predicate_kind_is_enforced() {
        let mut cf = CrossFilter::new(records());
        let sex = cf.add_dimension(DimensionSource::Field(0), DimensionKind::Discrete);
        assert!(!cf.set_predicate(sex, Some(FilterPredicate::range("A", "Z"))));
        assert!(cf.predicate(sex).is_none());
    }

    #[test]
    fn test_admin_names() {
        let mut cf = CrossFilter::new(records());
        let admin = cf.add_dimension(
            DimensionSource::AdminName(vec![Some(2), Some(3)]),
            DimensionKind::Discrete,
        );
        assert_eq!(
            cf.domain(admin),
            vec![
                DimValue::from("Bo, Badjia"),
                DimValue::from("Bo, Bagbo"),
                DimValue::from("Kenema, "),
            ]
        );
    }

    #[test]
    fn test_sum_group() {
        let mut cf = CrossFilter::new(records());
        let sex = cf.add_dimension(DimensionSource::Field(0), DimensionKind::Discrete);
        let sums = cf.group(
            sex,
            &GroupSpec::Sum {
                field: "age".to_string(),
            },
        );
        assert_eq!(sums[0].value, 99.0);
        assert_eq!(sums[1].value, 5.0);
    }
}
