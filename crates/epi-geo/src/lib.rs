//! Administrative boundaries and population for the epidemiological dashboard.
//!
//! Builds the [`GeometryIndex`] of composite division names per level with
//! leaf counts, and joins population figures onto it.

mod error;
mod feature;
mod index;
mod population;

// === Error Types ===
pub use error::{GeoError, Result};

// === Geometry ===
pub use feature::{Feature, FeatureCollection};
pub use index::{Division, GeometryIndex, LevelIndex, NAME_SEPARATOR, composite_name, name_prefix};

// === Population ===
pub use population::{
    LevelPopulation, PopulationResolver, PopulationRow, PopulationTable, PopulationValue,
    backfill, read_population_file,
};
