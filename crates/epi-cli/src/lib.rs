//! CLI library components for the epidemiological dashboard.

pub mod commands;
pub mod logging;
pub mod types;
