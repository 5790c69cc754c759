//! CLI argument definitions for the dashboard.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use epi_model::{ClassificationMethod, MapUnit};

#[derive(Parser)]
#[command(
    name = "epi-dashboard",
    version,
    about = "Epidemiological dashboard - load, check and classify surveillance data",
    long_about = "Run a dashboard deployment's load sequence from its TOML configuration.\n\n\
                  Reports the data check of the medical records and the color scale\n\
                  of the choropleth maps under chosen filters."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load every source and report the data check.
    Check(CheckArgs),

    /// Print the legend and division values of a map.
    Legend(LegendArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// Path to the dashboard configuration.
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Load only the sources with this name or data type.
    #[arg(long = "only", value_name = "SOURCE", conflicts_with = "skip")]
    pub only: Option<String>,

    /// Skip the sources with this name or data type.
    #[arg(long = "skip", value_name = "SOURCE")]
    pub skip: Option<String>,

    /// Medical files to load instead of the first one, by name or path.
    #[arg(long = "files", value_name = "FILE", num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Print the data check report as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct LegendArgs {
    /// Path to the dashboard configuration.
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Map unit to classify.
    #[arg(long = "unit", value_enum)]
    pub unit: Option<UnitArg>,

    /// Classification method.
    #[arg(long = "method", value_enum)]
    pub method: Option<MethodArg>,

    /// Choropleth chart id (default: the first map).
    #[arg(long = "chart", value_name = "ID")]
    pub chart: Option<String>,

    /// Filter a chart on one value before classifying (repeatable).
    #[arg(long = "focus", value_name = "CHART=VALUE")]
    pub focus: Vec<String>,

    /// Print the legend as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum UnitArg {
    Cases,
    Deaths,
    Incidence,
    Mortality,
    Completeness,
}

impl From<UnitArg> for MapUnit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Cases => MapUnit::Cases,
            UnitArg::Deaths => MapUnit::Deaths,
            UnitArg::Incidence => MapUnit::IncidenceProp,
            UnitArg::Mortality => MapUnit::MortalityProp,
            UnitArg::Completeness => MapUnit::Completeness,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum MethodArg {
    Jenks,
    EqualInterval,
    Arithmetic,
    Geometric,
    Quantile,
}

impl From<MethodArg> for ClassificationMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Jenks => ClassificationMethod::Jenks,
            MethodArg::EqualInterval => ClassificationMethod::EqInterval,
            MethodArg::Arithmetic => ClassificationMethod::ArithmeticProgression,
            MethodArg::Geometric => ClassificationMethod::GeometricProgression,
            MethodArg::Quantile => ClassificationMethod::Quantile,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
