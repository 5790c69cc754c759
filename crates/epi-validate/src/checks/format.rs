//! Format checks on raw cell values.

use std::sync::LazyLock;

use chrono::{NaiveDate, Weekday};
use epi_model::Value;
use regex::Regex;

use crate::issue::Issue;

static EPIWEEK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").expect("Invalid epiweek regex"));

/// `YYYY-WW` where the week exists in that ISO year.
pub fn check_epiweek(text: &str) -> Option<Issue> {
    let valid = EPIWEEK_REGEX.captures(text).is_some_and(|captures| {
        let year = captures[1].parse::<i32>().ok();
        let week = captures[2].parse::<u32>().ok();
        match (year, week) {
            (Some(year), Some(week)) => NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).is_some(),
            _ => false,
        }
    });
    (!valid).then(|| Issue::NotEpiweek {
        value: text.to_string(),
    })
}

pub fn check_integer(raw: &Value) -> Option<Issue> {
    let valid = match raw {
        Value::Number(number) => number.is_finite() && number.fract() == 0.0,
        Value::Text(text) => text.trim().parse::<i64>().is_ok(),
        Value::Missing | Value::Empty => true,
    };
    (!valid).then(|| Issue::NotInteger {
        value: raw.to_string(),
    })
}

pub fn check_in_list(text: &str, values: &[String]) -> Option<Issue> {
    (!values.iter().any(|v| v == text)).then(|| Issue::NotInList {
        value: text.to_string(),
    })
}

pub fn check_pattern(text: &str, regex: &Regex) -> Option<Issue> {
    (!regex.is_match(text)).then(|| Issue::PatternMismatch {
        value: text.to_string(),
        pattern: regex.as_str().to_string(),
    })
}
