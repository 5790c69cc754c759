//! Data check for the epidemiological dashboard.
//!
//! Classifies the raw value of every ruled field of every record and reports
//! failures keyed by the configured identifying fields, plus systematic
//! warnings such as fields no source provides.

mod checks;
mod engine;
mod issue;

pub use checks::{
    SUGGESTION_THRESHOLD, check_epiweek, check_in_list, check_integer, check_pattern, closest_name,
};
pub use engine::{DataCheckEngine, DataCheckReport, FieldSummary};
pub use issue::{Issue, RecordIssue, Severity, SystematicWarning};
