//! Individual value checks.

mod format;
mod geometry;

pub use format::{check_epiweek, check_in_list, check_integer, check_pattern};
pub use geometry::{SUGGESTION_THRESHOLD, closest_name};
