//! Legend of the current color scale.

use std::fmt;

use epi_model::MapUnit;
use serde::Serialize;

use crate::classify::Breakpoint;
use crate::engine::ColorScaleEngine;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Legend {
    pub unit: MapUnit,
    pub entries: Vec<LegendEntry>,
}

impl Legend {
    /// One entry per color class of the engine's current breakpoints.
    pub fn new(engine: &ColorScaleEngine, display_colors: &[usize]) -> Self {
        let colors = engine.colors(display_colors);
        let entries = class_labels(engine.breakpoints())
            .into_iter()
            .enumerate()
            .map(|(class, label)| LegendEntry {
                label,
                color: colors
                    .get(class)
                    .or_else(|| colors.last())
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();
        Self {
            unit: engine.unit(),
            entries,
        }
    }
}

/// Labels of each class: "NA", then "a - b" ranges, then "> max".
pub fn class_labels(breakpoints: &[Breakpoint]) -> Vec<String> {
    let last = breakpoints.len().saturating_sub(1);
    breakpoints
        .iter()
        .enumerate()
        .map(|(class, point)| match (point, breakpoints.get(class + 1)) {
            (Breakpoint::NoData, _) => "NA".to_string(),
            (lower, Some(upper)) if class < last => format!("{lower} - {upper}"),
            (lower, _) => format!("> {lower}"),
        })
        .collect()
}

impl fmt::Display for Legend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.unit)?;
        for entry in &self.entries {
            write!(f, " [{} {}]", entry.color, entry.label)?;
        }
        Ok(())
    }
}
