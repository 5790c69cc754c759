//! Epidemiological dashboard CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use epi_cli::commands::{LegendOptions, run_check, run_legend};
use epi_cli::logging::{LogConfig, LogFormat, init_logging};
use epi_core::SourceFilter;
use tracing::level_filters::LevelFilter;

mod cli;
mod summary;

use crate::cli::{CheckArgs, Cli, Command, LegendArgs, LogFormatArg, LogLevelArg};
use crate::summary::{print_check, print_legend};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match &cli.command {
        Command::Check(args) => check(args),
        Command::Legend(args) => legend(args),
    };
    std::process::exit(exit_code);
}

fn check(args: &CheckArgs) -> i32 {
    let filter = match (&args.only, &args.skip) {
        (Some(only), _) => Some(SourceFilter::Only(only.clone())),
        (None, Some(skip)) => Some(SourceFilter::Skip(skip.clone())),
        (None, None) => None,
    };
    match run_check(&args.config, filter, &args.files) {
        Ok(result) => {
            if args.json {
                match serde_json::to_string_pretty(&result.report) {
                    Ok(json) => println!("{json}"),
                    Err(error) => {
                        eprintln!("error: {error}");
                        return 1;
                    }
                }
            } else {
                print_check(&result);
            }
            i32::from(result.has_errors)
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    }
}

fn legend(args: &LegendArgs) -> i32 {
    let options = LegendOptions {
        unit: args.unit.map(Into::into),
        method: args.method.map(Into::into),
        chart: args.chart.clone(),
        focus: args.focus.clone(),
    };
    match run_legend(&args.config, &options) {
        Ok(result) => {
            if args.json {
                match serde_json::to_string_pretty(&result.legend) {
                    Ok(json) => println!("{json}"),
                    Err(error) => {
                        eprintln!("error: {error}");
                        return 1;
                    }
                }
            } else {
                print_legend(&result);
            }
            0
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
