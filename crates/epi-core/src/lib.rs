//! Core of the epidemiological dashboard.
//!
//! Loads a deployment's configuration and sources into an explicit context,
//! then runs the interactive session over them.
//!
//! # Features
//!
//! - **Configuration**: one TOML document validated into a [`DashboardConfig`](epi_model::DashboardConfig)
//! - **Load Sequence**: sources loaded strictly in order, failures reported as notices
//! - **Context**: geometry, population, records and side layers of one session
//! - **Session**: filters, color scale, global filter, autoplay and medical file reloads
//!
//! # Example
//!
//! ```ignore
//! use epi_core::{Dashboard, DashboardContext, LoadSequence};
//!
//! let mut context = DashboardContext::from_file(Path::new("dashboard.toml"))?;
//! let sources = context.config.sources.clone();
//! LoadSequence::new(&sources).run(&mut context);
//! let mut dashboard = Dashboard::new(context)?;
//! dashboard.focus("epiwk", "2021-05")?;
//! println!("{}", dashboard.legend().unwrap());
//! ```

mod config;
mod context;
mod error;
mod load;
mod session;

// === Error Types ===
pub use error::{CoreError, Result};

// === Configuration ===
pub use config::{load_config, resolve_path};
pub use context::{DashboardContext, MedicalState};

// === Loading ===
pub use load::{LoadNotice, LoadSequence, LoadState, LoadStep, NoticeKind, SourceFilter, SourceOutcome};

// === Session ===
pub use session::{Dashboard, run_datacheck};
