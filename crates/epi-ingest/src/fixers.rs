//! Per-field value fixers.
//!
//! Fixers never fail. A value that cannot be normalized degrades to the `-1`
//! sentinel (ages) or passes through unchanged (dates).

use std::sync::LazyLock;

use chrono::{Days, NaiveDate};
use epi_model::{FixerKind, Value};
use regex::Regex;

use crate::icd10::icd10_heading;

/// Sentinel for invalid or missing ages.
pub const AGE_SENTINEL: f64 = -1.0;

/// Oldest accepted age in years.
pub const MAX_AGE: f64 = 120.0;

const ISO_FORMAT: &str = "%Y-%m-%d";

static ISO_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:\D|$)").expect("Invalid ISO prefix regex"));

/// Day zero of spreadsheet serial dates.
fn spreadsheet_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN)
}

/// Apply the configured fixer to one raw cell.
pub fn apply_fixer(kind: FixerKind, value: &Value) -> Value {
    match kind {
        FixerKind::Age => fix_age(value),
        FixerKind::AgeNumeric => fix_age_numeric(value),
        FixerKind::Date => fix_date(value),
        FixerKind::Diagnosis => fix_diagnosis(value),
    }
}

/// Coerce to a number in `[0, 120]`, else `-1`.
pub fn fix_age(value: &Value) -> Value {
    let age = value
        .as_f64()
        .filter(|age| (0.0..=MAX_AGE).contains(age))
        .unwrap_or(AGE_SENTINEL);
    Value::Number(age)
}

/// Keep numeric cells as they are; anything else is `-1`.
pub fn fix_age_numeric(value: &Value) -> Value {
    match value {
        Value::Number(age) => Value::Number(*age),
        _ => Value::Number(AGE_SENTINEL),
    }
}

/// Normalize a date to `YYYY-MM-DD`.
///
/// Accepts spreadsheet serial day counts, strings starting with an ISO date,
/// and `d/m/y` strings separated by `.`, `-` or `/` where two-digit years are
/// read as `20yy`. Anything else is returned unchanged.
pub fn fix_date(value: &Value) -> Value {
    match value {
        Value::Number(serial) => from_excel_serial(*serial)
            .map(|date| Value::Text(date.format(ISO_FORMAT).to_string()))
            .unwrap_or_else(|| value.clone()),
        Value::Text(text) => parse_date_text(text.trim())
            .map(Value::Text)
            .unwrap_or_else(|| value.clone()),
        Value::Missing | Value::Empty => value.clone(),
    }
}

fn parse_date_text(text: &str) -> Option<String> {
    if let Some(captures) = ISO_PREFIX.captures(text) {
        return captures.get(1).map(|m| m.as_str().to_string());
    }
    let parts: Vec<&str> = text.split(['.', '-', '/']).collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };
    let year = if year.len() < 3 {
        format!("20{year}")
    } else {
        (*year).to_string()
    };
    let date = NaiveDate::from_ymd_opt(
        year.trim().parse().ok()?,
        month.trim().parse().ok()?,
        day.trim().parse().ok()?,
    )?;
    Some(date.format(ISO_FORMAT).to_string())
}

fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 || serial > 2_958_465.0 {
        return None;
    }
    spreadsheet_epoch().checked_add_days(Days::new(serial.floor() as u64))
}

/// Spreadsheet serial day count of a date.
pub fn excel_serial(date: NaiveDate) -> f64 {
    (date - spreadsheet_epoch()).num_days() as f64
}

/// Resolve the primary ICD-10 code to `"<prefix>: <heading>"`, or the bare prefix.
pub fn fix_diagnosis(value: &Value) -> Value {
    let Some(text) = value.as_text() else {
        return value.clone();
    };
    let primary = text.split(',').next().unwrap_or_default();
    let code = primary.split('.').next().unwrap_or_default().trim();
    let prefix: String = code.chars().take(3).collect();
    match icd10_heading(&prefix) {
        Some(heading) => Value::Text(format!("{prefix}: {heading}")),
        None => Value::Text(prefix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn text(value: &str) -> Value {
        Value::Text(value.to_string())
    }

    #[test]
    fn test_age_boundaries() {
        assert_eq!(fix_age(&Value::Number(0.0)), Value::Number(0.0));
        assert_eq!(fix_age(&Value::Number(120.0)), Value::Number(120.0));
        assert_eq!(fix_age(&Value::Number(121.0)), Value::Number(-1.0));
        assert_eq!(fix_age(&Value::Number(-1.0)), Value::Number(-1.0));
        assert_eq!(fix_age(&text("abc")), Value::Number(-1.0));
        assert_eq!(fix_age(&text(" 34 ")), Value::Number(34.0));
        assert_eq!(fix_age(&Value::Empty), Value::Number(-1.0));
    }

    #[test]
    fn test_age_numeric_keeps_numbers_only() {
        assert_eq!(fix_age_numeric(&Value::Number(150.0)), Value::Number(150.0));
        assert_eq!(fix_age_numeric(&text("34")), Value::Number(-1.0));
    }

    #[test]
    fn test_date_formats() {
        assert_eq!(fix_date(&text("15/03/21")), text("2021-03-15"));
        assert_eq!(fix_date(&text("1.2.2019")), text("2019-02-01"));
        assert_eq!(fix_date(&text("2020-06-01T08:00:00Z")), text("2020-06-01"));
        assert_eq!(fix_date(&text("2020-06-01 08:00")), text("2020-06-01"));
        assert_eq!(fix_date(&Value::Number(44270.0)), text("2021-03-15"));
        assert_eq!(fix_date(&Value::Number(44270.75)), text("2021-03-15"));
    }

    #[test]
    fn test_unparseable_date_passes_through() {
        assert_eq!(fix_date(&text("not-a-date")), text("not-a-date"));
        assert_eq!(fix_date(&text("31/04/2021")), text("31/04/2021"));
        assert_eq!(fix_date(&text("2020-06-011")), text("2020-06-011"));
        assert_eq!(fix_date(&Value::Empty), Value::Empty);
    }

    #[test]
    fn test_diagnosis_resolution() {
        assert_eq!(fix_diagnosis(&text("A00.1,B02")), text("A00: Cholera"));
        assert_eq!(
            fix_diagnosis(&text("Z99")),
            text("Z99: Dependence on enabling machines and devices, NEC")
        );
        assert_eq!(fix_diagnosis(&text("Q9Z")), text("Q9Z"));
        assert_eq!(fix_diagnosis(&Value::Empty), Value::Empty);
    }

    proptest! {
        #[test]
        fn prop_date_round_trip(days in 0i64..80_000) {
            let date = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap() + chrono::Duration::days(days);
            let iso = date.format("%Y-%m-%d").to_string();
            prop_assert_eq!(fix_date(&Value::Number(excel_serial(date))), text(&iso));
            prop_assert_eq!(fix_date(&text(&iso)), text(&iso));
        }
    }
}
