//! Cross-filter coordination for the epidemiological dashboard.
//!
//! # Features
//!
//! - **Dimensions**: discrete fields, continuous dates and numbers, composite
//!   administrative names, and dimensions shared between charts
//! - **Groups**: counts or sums per dimension value, filtered by every other
//!   dimension
//! - **Coordinator**: one predicate per dimension, full redraw of every view
//!   after each change, reset-all with a standing filter
//! - **Interaction**: the default-categories toggle, autoplay over the
//!   timeline and quick period filters
//!
//! # Example
//!
//! ```ignore
//! use epi_filter::{FilterCoordinator, HeadlessView};
//!
//! let mut coordinator = FilterCoordinator::new(records, &config)?;
//! coordinator.attach_view("sex", Box::new(HeadlessView::new()))?;
//! coordinator.toggle("sex", "F")?;
//! println!("{} of {} records", coordinator.filtered_count(), coordinator.total_count());
//! ```

mod coordinator;
mod crossfilter;
mod error;
mod global;
mod interaction;
mod registry;
mod value;
mod view;

// === Error Types ===
pub use error::{FilterError, Result};

// === Cross Filter ===
pub use crossfilter::{CrossFilter, DimensionId, DimensionKind, DimensionSource, admin_name};
pub use value::{DimValue, FilterPredicate};

// === Charts ===
pub use registry::{ChartHandle, ChartRegistry};
pub use view::{
    ChartSnapshot, ChartView, ColorAccessor, GroupBin, HeadlessState, HeadlessView, ValueAccessor,
};

// === Coordination ===
pub use coordinator::{FilterCoordinator, StandingFilter};
pub use global::{BASE_HEIGHT, GlobalFilter, ROW_HEIGHT};
pub use interaction::{Autoplay, AutoplayStep, last_periods, quick_filter};
