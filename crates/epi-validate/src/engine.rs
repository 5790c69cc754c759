//! The data check over a loaded record set.

use std::collections::BTreeMap;

use epi_geo::{GeometryIndex, NAME_SEPARATOR, PopulationTable};
use epi_model::{CheckRule, DataCheckSpec, RecordSet, Value};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::checks::{check_epiweek, check_in_list, check_integer, check_pattern, closest_name};
use crate::issue::{Issue, RecordIssue, Severity, SystematicWarning};

/// Error and empty counts of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldSummary {
    pub checked: usize,
    pub errors: usize,
    pub empty: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataCheckReport {
    /// Per field, in field name order.
    pub summaries: BTreeMap<String, FieldSummary>,
    /// Per-record issues in record order, then field order.
    pub issues: Vec<RecordIssue>,
    pub systematic: Vec<SystematicWarning>,
}

impl DataCheckReport {
    pub fn error_count(&self) -> usize {
        self.summaries.values().map(|s| s.errors).sum()
    }

    pub fn empty_count(&self) -> usize {
        self.summaries.values().map(|s| s.empty).sum()
    }

    /// Issues of the given severity.
    pub fn issues_of(&self, severity: Severity) -> impl Iterator<Item = &RecordIssue> {
        self.issues
            .iter()
            .filter(move |issue| issue.issue.severity() == severity)
    }
}

/// Compiled form of one field rule.
enum CompiledRule<'a> {
    Skip,
    Epiweek,
    Pattern(Regex),
    InGeometry { depth: usize },
    Integer,
    InList(&'a [String]),
}

/// Checks every record against the configured field rules.
pub struct DataCheckEngine<'a> {
    spec: &'a DataCheckSpec,
    geometry: Option<&'a GeometryIndex>,
    population: Option<&'a PopulationTable>,
}

impl<'a> DataCheckEngine<'a> {
    pub fn new(spec: &'a DataCheckSpec) -> Self {
        Self {
            spec,
            geometry: None,
            population: None,
        }
    }

    pub fn with_geometry(mut self, geometry: Option<&'a GeometryIndex>) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_population(mut self, population: Option<&'a PopulationTable>) -> Self {
        self.population = population;
        self
    }

    pub fn run(&self, records: &RecordSet) -> DataCheckReport {
        let mut report = DataCheckReport::default();

        let unmatched = records.unmatched_fields();
        for field in &unmatched {
            report.systematic.push(SystematicWarning::UnmatchedField {
                field: field.clone(),
            });
        }
        if let Some(population) = self.population {
            for (level, pop) in population.levels() {
                if !pop.is_resolved() {
                    report.systematic.push(SystematicWarning::UnresolvedPopulation {
                        level: level.to_string(),
                        divisions: pop.unresolved.len(),
                    });
                }
            }
        }

        let mut rules: Vec<(&str, CompiledRule<'_>)> = Vec::new();
        for (field, rule) in &self.spec.rules {
            if unmatched.contains(field) || records.schema.index_of(field).is_none() {
                continue;
            }
            let compiled = self.compile(field, rule, &mut report.systematic);
            if !matches!(compiled, CompiledRule::Skip) {
                report.summaries.insert(field.clone(), FieldSummary::default());
                rules.push((field.as_str(), compiled));
            }
        }

        for index in 0..records.len() {
            for (field, rule) in &rules {
                let Some(observation) =
                    records.observe(index, field, &self.spec.identifying_fields)
                else {
                    continue;
                };
                let summary = report.summaries.entry(field.to_string()).or_default();
                summary.checked += 1;
                let issue = match observation.raw {
                    Value::Missing => None,
                    Value::Empty => Some(Issue::Empty),
                    raw => self.check(records, index, raw, rule),
                };
                let Some(issue) = issue else {
                    continue;
                };
                match issue.severity() {
                    Severity::Empty => summary.empty += 1,
                    Severity::Error => summary.errors += 1,
                }
                tracing::trace!(record = index, field = %field, issue = %issue.message(), "data check issue");
                report.issues.push(RecordIssue {
                    field: field.to_string(),
                    record: index,
                    record_key: observation.record_key,
                    raw: observation.raw.to_string(),
                    value: observation.value.to_string(),
                    issue,
                });
            }
        }

        tracing::info!(
            records = records.len(),
            errors = report.error_count(),
            empty = report.empty_count(),
            systematic = report.systematic.len(),
            "data check complete"
        );
        report
    }

    fn compile<'r>(
        &self,
        field: &str,
        rule: &'r CheckRule,
        systematic: &mut Vec<SystematicWarning>,
    ) -> CompiledRule<'r> {
        match rule {
            CheckRule::None => CompiledRule::Skip,
            CheckRule::Epiweek => CompiledRule::Epiweek,
            CheckRule::Integer => CompiledRule::Integer,
            CheckRule::InList { values } => CompiledRule::InList(values),
            CheckRule::Pattern { pattern } => match Regex::new(pattern) {
                Ok(regex) => CompiledRule::Pattern(regex),
                Err(_) => {
                    systematic.push(SystematicWarning::InvalidPattern {
                        field: field.to_string(),
                        pattern: pattern.clone(),
                    });
                    CompiledRule::Skip
                }
            },
            CheckRule::InGeometry => {
                let depth = self.geometry.and_then(|geometry| {
                    geometry.level(field)?;
                    geometry.spec().depth_of(field)
                });
                match depth {
                    Some(depth) => CompiledRule::InGeometry { depth },
                    None => {
                        systematic.push(SystematicWarning::MissingGeometryLevel {
                            field: field.to_string(),
                        });
                        CompiledRule::Skip
                    }
                }
            }
        }
    }

    fn check(&self, records: &RecordSet, index: usize, raw: &Value, rule: &CompiledRule<'_>) -> Option<Issue> {
        let text = raw.as_text().unwrap_or_default();
        let text = text.trim();
        match rule {
            CompiledRule::Skip => None,
            CompiledRule::Epiweek => check_epiweek(text),
            CompiledRule::Pattern(regex) => check_pattern(text, regex),
            CompiledRule::Integer => check_integer(raw),
            CompiledRule::InList(values) => check_in_list(text, values),
            CompiledRule::InGeometry { depth } => self.check_geometry(records, index, *depth),
        }
    }

    /// Compose the record's names from the root level to `depth` and look the
    /// result up at that level.
    fn check_geometry(&self, records: &RecordSet, index: usize, depth: usize) -> Option<Issue> {
        let geometry = self.geometry?;
        let levels = &geometry.spec().levels;
        let level = levels.get(depth)?;
        let name = levels[..=depth]
            .iter()
            .map(|level| {
                records
                    .records
                    .get(index)
                    .zip(records.schema.index_of(level))
                    .map(|(record, position)| record.raw(position).to_string().trim().to_string())
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join(NAME_SEPARATOR);
        let divisions = geometry.level(level)?;
        if divisions.contains(&name) {
            return None;
        }
        let suggestion = closest_name(&name, divisions.names()).map(ToString::to_string);
        Some(Issue::GeometryMismatch { name, suggestion })
    }
}
