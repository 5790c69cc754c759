//! Class-break computation.
//!
//! [`compute_breaks`] turns the current per-division values into the
//! ascending thresholds of the color scale. Small inputs use fixed fallback
//! rules; six or more distinct values go through the selected
//! [`ClassificationMethod`] and, by default, the nice rounding pass.

use std::fmt;

use epi_model::{ClassificationMethod, MapUnit, Rounding, format_number};
use serde::Serialize;
use tracing::warn;

/// Number of classes requested from a classification method.
pub const CLASS_COUNT: usize = 5;

/// Fixed thresholds of the completeness unit.
pub const COMPLETENESS_BREAKS: [f64; 6] = [0.0, 20.0, 40.0, 60.0, 80.0, 100.0];

/// One entry of the color scale. The scale always starts with [`Breakpoint::NoData`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Breakpoint {
    NoData,
    Value(f64),
}

impl Breakpoint {
    pub fn value(&self) -> Option<f64> {
        match self {
            Breakpoint::NoData => None,
            Breakpoint::Value(value) => Some(*value),
        }
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Breakpoint::NoData => f.write_str("NA"),
            Breakpoint::Value(value) => f.write_str(&format_number(*value)),
        }
    }
}

/// Sorted distinct finite values.
pub fn distinct_sorted(values: &[f64]) -> Vec<f64> {
    let mut distinct: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();
    distinct
}

/// Ascending numeric thresholds for `values`.
pub fn compute_breaks(
    values: &[f64],
    method: ClassificationMethod,
    unit: MapUnit,
    rounding: Rounding,
) -> Vec<f64> {
    if unit == MapUnit::Completeness {
        return COMPLETENESS_BREAKS.to_vec();
    }
    let distinct = distinct_sorted(values);
    let breaks = match distinct.as_slice() {
        [] => vec![0.0, 1.0],
        [only] => vec![0.0, only + 1.0],
        [first, last] if *first == 0.0 => vec![0.0, last + 1.0],
        [first, last] => vec![0.0, first + 1.0, last + 1.0],
        few if few.len() <= CLASS_COUNT => few.to_vec(),
        _ => match rounding {
            Rounding::Nice if unit.is_rate() => float_scale(&distinct),
            Rounding::Nice => int_scale(&distinct),
            Rounding::Raw => {
                let mut series: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
                series.sort_by(f64::total_cmp);
                classify(&series, method, CLASS_COUNT)
            }
        },
    };
    let mut ascending = breaks;
    ascending.sort_by(f64::total_cmp);
    ascending.dedup();
    ascending
}

/// The complete scale: the no-data sentinel followed by the thresholds.
pub fn breakpoints(
    values: &[f64],
    method: ClassificationMethod,
    unit: MapUnit,
    rounding: Rounding,
) -> Vec<Breakpoint> {
    std::iter::once(Breakpoint::NoData)
        .chain(compute_breaks(values, method, unit, rounding).into_iter().map(Breakpoint::Value))
        .collect()
}

// === Classification Methods ===

/// `classes + 1` bounds from the minimum to the maximum of a sorted series.
///
/// A duplicated first bound is dropped.
pub fn classify(sorted: &[f64], method: ClassificationMethod, classes: usize) -> Vec<f64> {
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };
    if classes == 0 {
        return vec![min, max];
    }
    let mut bounds = match method {
        ClassificationMethod::Jenks => jenks(sorted, classes),
        ClassificationMethod::EqInterval => equal_interval(min, max, classes),
        ClassificationMethod::ArithmeticProgression => arithmetic_progression(min, max, classes),
        ClassificationMethod::GeometricProgression => {
            if min <= 0.0 {
                warn!(min, "Geometric progression needs positive values, using equal intervals");
                equal_interval(min, max, classes)
            } else {
                geometric_progression(min, max, classes)
            }
        }
        ClassificationMethod::Quantile => quantile(sorted, classes),
    };
    if bounds.len() > 1 && bounds[0] == bounds[1] {
        bounds.remove(0);
    }
    bounds
}

fn equal_interval(min: f64, max: f64, classes: usize) -> Vec<f64> {
    let step = (max - min) / classes as f64;
    (0..=classes)
        .map(|i| if i == classes { max } else { min + step * i as f64 })
        .collect()
}

fn arithmetic_progression(min: f64, max: f64, classes: usize) -> Vec<f64> {
    let denominator: usize = (1..=classes).sum();
    let interval = (max - min) / denominator as f64;
    let mut bounds = vec![min];
    for i in 1..=classes {
        let previous = bounds[i - 1];
        bounds.push(previous + i as f64 * interval);
    }
    bounds
}

fn geometric_progression(min: f64, max: f64, classes: usize) -> Vec<f64> {
    let (log_min, log_max) = (min.log10(), max.log10());
    let interval = (log_max - log_min) / classes as f64;
    (0..=classes)
        .map(|i| {
            if i == 0 {
                min
            } else {
                10f64.powf(log_min + i as f64 * interval)
            }
        })
        .collect()
}

fn quantile(sorted: &[f64], classes: usize) -> Vec<f64> {
    let last = sorted.len() - 1;
    let class_size = (sorted.len() as f64 / classes as f64).round() as usize;
    let mut bounds = vec![sorted[0]];
    let mut step = class_size;
    for _ in 1..classes {
        bounds.push(sorted[step.min(last)]);
        step += class_size;
    }
    bounds.push(sorted[last]);
    bounds
}

/// Natural breaks minimizing within-class variance.
fn jenks(sorted: &[f64], classes: usize) -> Vec<f64> {
    let len = sorted.len();
    if classes >= len {
        let mut bounds = sorted.to_vec();
        bounds.dedup();
        return bounds;
    }
    let mut lower = vec![vec![0usize; classes + 1]; len + 1];
    let mut variance = vec![vec![0.0f64; classes + 1]; len + 1];
    for class in 1..=classes {
        lower[1][class] = 1;
        for row in variance.iter_mut().skip(2) {
            row[class] = f64::INFINITY;
        }
    }
    for l in 2..=len {
        let (mut sum, mut sum_squares, mut weight) = (0.0, 0.0, 0.0);
        let mut within = 0.0;
        for m in 1..=l {
            let start = l - m + 1;
            let value = sorted[start - 1];
            sum += value;
            sum_squares += value * value;
            weight += 1.0;
            within = sum_squares - sum * sum / weight;
            let before = start - 1;
            if before != 0 {
                for class in 2..=classes {
                    let candidate = within + variance[before][class - 1];
                    if variance[l][class] >= candidate {
                        lower[l][class] = start;
                        variance[l][class] = candidate;
                    }
                }
            }
        }
        lower[l][1] = 1;
        variance[l][1] = within;
    }

    let mut bounds = vec![0.0; classes + 1];
    bounds[0] = sorted[0];
    bounds[classes] = sorted[len - 1];
    let mut k = len;
    for class in (2..=classes).rev() {
        let start = lower[k][class].max(2);
        bounds[class - 1] = sorted[start - 2];
        k = start - 1;
    }
    bounds
}

// === Nice Rounding ===

/// Round a step in `(0, 1]` up to the next nice fraction.
pub fn nice_ceiling(step: f64) -> f64 {
    const TABLE: [(f64, f64); 9] = [
        (0.8, 1.0),
        (0.6, 0.8),
        (0.5, 0.6),
        (0.4, 0.5),
        (0.3, 0.4),
        (0.25, 0.3),
        (0.2, 0.25),
        (0.15, 0.2),
        (0.12, 0.15),
    ];
    TABLE
        .iter()
        .find(|(above, _)| step > *above)
        .map_or(0.12, |(_, nice)| *nice)
}

/// Five evenly nice-stepped integer thresholds from 0 up to cover the maximum.
pub fn int_scale(values: &[f64]) -> Vec<f64> {
    let Some(max) = values.iter().copied().reduce(f64::max) else {
        return vec![0.0, 1.0];
    };
    if max < 5.0 {
        let top = max.max(0.0).floor() as usize;
        return (0..=top.min(4)).map(|v| v as f64).collect();
    }
    let mut step = (max / 4.0).ceil();
    let mut shift = 1.0;
    while step >= 1.0 {
        shift *= 10.0;
        step /= 10.0;
    }
    let step = (nice_ceiling(step) * shift).round();
    (0..5).map(|i| step * i as f64).collect()
}

/// Five evenly nice-stepped fractional thresholds from 0 up to cover the maximum.
pub fn float_scale(values: &[f64]) -> Vec<f64> {
    let Some(max) = values.iter().copied().reduce(f64::max) else {
        return vec![0.0, 1.0];
    };
    if max <= 0.0 {
        return vec![0.0, 1.0];
    }
    let mut step = max / 4.0;
    let mut shift = 1.0;
    while step >= 1.0 {
        shift *= 10.0;
        step /= 10.0;
    }
    while step < 0.1 {
        shift /= 10.0;
        step *= 10.0;
    }
    let step = nice_ceiling(step) * shift;
    (0..5).map(|i| round_to_precision(step * i as f64)).collect()
}

/// Strip binary noise such as `0.30000000000000004`.
fn round_to_precision(value: f64) -> f64 {
    (value * 1e10).round() / 1e10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaks(values: &[f64]) -> Vec<f64> {
        compute_breaks(values, ClassificationMethod::Jenks, MapUnit::Cases, Rounding::Nice)
    }

    #[test]
    fn test_small_inputs() {
        assert_eq!(breaks(&[]), vec![0.0, 1.0]);
        assert_eq!(breaks(&[7.0]), vec![0.0, 8.0]);
        assert_eq!(breaks(&[5.0, 5.0, 5.0]), vec![0.0, 6.0]);
        assert_eq!(breaks(&[0.0, 4.0]), vec![0.0, 5.0]);
        assert_eq!(breaks(&[2.0, 4.0]), vec![0.0, 3.0, 5.0]);
        assert_eq!(breaks(&[1.0, 3.0, 9.0, 9.0]), vec![1.0, 3.0, 9.0]);
    }

    #[test]
    fn test_completeness_is_fixed() {
        let fixed = compute_breaks(
            &[3.0, 99.0],
            ClassificationMethod::Quantile,
            MapUnit::Completeness,
            Rounding::Nice,
        );
        assert_eq!(fixed, COMPLETENESS_BREAKS.to_vec());
    }

    #[test]
    fn test_nice_integer_scale() {
        assert_eq!(int_scale(&[3.0]), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(int_scale(&[1.0, 37.0]), vec![0.0, 12.0, 24.0, 36.0, 48.0]);
        assert_eq!(int_scale(&[100.0]), vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_eq!(
            breaks(&[1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0]),
            vec![0.0, 6.0, 12.0, 18.0, 24.0]
        );
    }

    #[test]
    fn test_nice_float_scale() {
        assert_eq!(float_scale(&[0.2, 1.9]), vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(float_scale(&[0.03]), vec![0.0, 0.008, 0.016, 0.024, 0.032]);
    }

    #[test]
    fn test_nice_ceiling_table() {
        assert_eq!(nice_ceiling(0.81), 1.0);
        assert_eq!(nice_ceiling(0.8), 0.8);
        assert_eq!(nice_ceiling(0.26), 0.3);
        assert_eq!(nice_ceiling(0.21), 0.25);
        assert_eq!(nice_ceiling(0.1), 0.12);
    }

    #[test]
    fn test_methods_span_min_to_max() {
        let series: Vec<f64> = [1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0].to_vec();
        for method in [
            ClassificationMethod::Jenks,
            ClassificationMethod::EqInterval,
            ClassificationMethod::ArithmeticProgression,
            ClassificationMethod::GeometricProgression,
            ClassificationMethod::Quantile,
        ] {
            let bounds = classify(&series, method, 5);
            assert_eq!(bounds.first(), Some(&1.0), "{method}");
            assert!((bounds[bounds.len() - 1] - 128.0).abs() < 1e-9, "{method}");
            assert!(bounds.windows(2).all(|w| w[0] <= w[1]), "{method}");
        }
    }

    #[test]
    fn test_arithmetic_progression_widens() {
        let bounds = arithmetic_progression(0.0, 15.0, 5);
        assert_eq!(bounds, vec![0.0, 1.0, 3.0, 6.0, 10.0, 15.0]);
    }

    #[test]
    fn test_jenks_separates_clusters() {
        let series = [1.0, 1.0, 2.0, 2.0, 10.0, 11.0, 12.0, 50.0, 51.0, 100.0];
        let bounds = jenks(&series, 3);
        assert_eq!(bounds, vec![1.0, 12.0, 51.0, 100.0]);
    }

    #[test]
    fn test_raw_rounding_keeps_method_breaks() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let raw = compute_breaks(
            &values,
            ClassificationMethod::EqInterval,
            MapUnit::Cases,
            Rounding::Raw,
        );
        assert_eq!(raw, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_breakpoints_start_with_sentinel() {
        let scale = breakpoints(&[7.0], ClassificationMethod::Jenks, MapUnit::Deaths, Rounding::Nice);
        assert_eq!(
            scale,
            vec![Breakpoint::NoData, Breakpoint::Value(0.0), Breakpoint::Value(8.0)]
        );
        assert_eq!(scale[0].to_string(), "NA");
    }
}
