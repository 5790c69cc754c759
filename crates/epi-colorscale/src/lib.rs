//! Color scales for the dashboard choropleths.
//!
//! # Features
//!
//! - **Classification**: natural breaks, equal interval, arithmetic and
//!   geometric progressions, quantiles, with fixed rules for small inputs
//! - **Nice rounding**: evenly stepped thresholds for counts and rates
//! - **Metrics**: cases, deaths, incidence and mortality rates, completeness
//! - **Engine**: Auto/Manual locking, palettes per map unit, legends
//!
//! # Example
//!
//! ```ignore
//! use epi_colorscale::{ColorScaleEngine, MetricInputs, refresh_maps};
//! use epi_model::ColorMode;
//!
//! let mut engine = ColorScaleEngine::new(&config.colorscale);
//! refresh_maps(&mut engine, &mut coordinator, &config.colorscale, inputs, Some("map"), ColorMode::Auto)?;
//! ```

mod apply;
mod classify;
mod engine;
mod legend;
mod metrics;
mod palette;

// === Classification ===
pub use classify::{
    Breakpoint, CLASS_COUNT, COMPLETENESS_BREAKS, breakpoints, classify, compute_breaks,
    distinct_sorted, float_scale, int_scale, nice_ceiling,
};

// === Engine ===
pub use engine::{ColorScaleEngine, color_index};
pub use legend::{Legend, LegendEntry, class_labels};
pub use palette::{
    CLASSIC, DIVERGING, QUALITATIVE, REVERSED_DIVERGING, display_colors, palette_colors,
    palette_for_unit,
};

// === Maps ===
pub use apply::{apply_colors, map_values, refresh_maps};
pub use metrics::{DivisionValues, MetricInputs, division_values};
