//! Color scale state: unit, palette, method, mode and the current breakpoints.

use std::sync::Arc;

use epi_filter::ColorAccessor;
use epi_model::{ClassificationMethod, ColorMode, ColorScaleSpec, MapUnit, PaletteKey, Rounding};
use tracing::{debug, info};

use crate::classify::{Breakpoint, breakpoints};
use crate::palette::{display_colors, palette_colors, palette_for_unit};

/// Palette index of a value against a breakpoint list.
///
/// Index 0 is the no-data class. Zero counts as no data except for completeness.
pub fn color_index(breakpoints: &[Breakpoint], unit: MapUnit, value: Option<f64>) -> usize {
    let Some(value) = value else {
        return 0;
    };
    if value == 0.0 && unit != MapUnit::Completeness {
        return 0;
    }
    let mut col = breakpoints.len().saturating_sub(1);
    while col > 1 && breakpoints[col].value().is_some_and(|bound| value <= bound) {
        col -= 1;
    }
    col
}

#[derive(Debug, Clone)]
pub struct ColorScaleEngine {
    unit: MapUnit,
    units: Vec<MapUnit>,
    palette: PaletteKey,
    custom_palette: Vec<String>,
    method: ClassificationMethod,
    mode: ColorMode,
    rounding: Rounding,
    breakpoints: Vec<Breakpoint>,
}

impl ColorScaleEngine {
    pub fn new(spec: &ColorScaleSpec) -> Self {
        let mut engine = Self {
            unit: spec.unit,
            units: spec.units.clone(),
            palette: spec.palette,
            custom_palette: spec.custom_palette.clone(),
            method: spec.method,
            mode: spec.mode,
            rounding: spec.rounding,
            breakpoints: Vec::new(),
        };
        engine.breakpoints = engine.recompute(&[]);
        engine
    }

    pub fn unit(&self) -> MapUnit {
        self.unit
    }

    /// Units offered to the user.
    pub fn units(&self) -> &[MapUnit] {
        &self.units
    }

    pub fn palette(&self) -> PaletteKey {
        self.palette
    }

    pub fn method(&self) -> ClassificationMethod {
        self.method
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// Breakpoints `values` would produce under the current settings.
    pub fn recompute(&self, values: &[f64]) -> Vec<Breakpoint> {
        breakpoints(values, self.method, self.unit, self.rounding)
    }

    /// Whether a lock request from `source` recomputes the breakpoints.
    pub fn accepts(&self, source: ColorMode) -> bool {
        source == self.mode || source == ColorMode::Manual
    }

    /// Recompute the breakpoints if `source` allows it. Returns whether it did.
    pub fn lock(&mut self, source: ColorMode, values: &[f64]) -> bool {
        if !self.accepts(source) {
            return false;
        }
        self.breakpoints = self.recompute(values);
        debug!(
            unit = %self.unit,
            method = %self.method,
            values = values.len(),
            classes = self.breakpoints.len(),
            "Recomputed color scale"
        );
        true
    }

    pub fn toggle_mode(&mut self) -> ColorMode {
        self.mode = self.mode.toggled();
        info!(mode = ?self.mode, "Color scale mode changed");
        self.mode
    }

    pub fn set_mode(&mut self, mode: ColorMode) {
        self.mode = mode;
    }

    pub fn set_method(&mut self, method: ClassificationMethod) {
        self.method = method;
    }

    pub fn set_palette(&mut self, palette: PaletteKey) {
        self.palette = palette;
    }

    /// Switch the unit and its default palette. The caller then locks with `Manual`.
    pub fn set_unit(&mut self, unit: MapUnit) {
        self.unit = unit;
        self.palette = palette_for_unit(unit);
        info!(unit = %unit, palette = %self.palette, "Map unit changed");
    }

    /// All colors of the current palette.
    pub fn palette_colors(&self) -> Vec<String> {
        palette_colors(self.palette, &self.custom_palette)
    }

    /// Colors a chart draws with, chosen by its display indices.
    pub fn colors(&self, indices: &[usize]) -> Vec<String> {
        display_colors(&self.palette_colors(), indices)
    }

    pub fn color_index(&self, value: Option<f64>) -> usize {
        color_index(&self.breakpoints, self.unit, value)
    }

    /// Accessor frozen on the current breakpoints, clamped to `max_index`.
    pub fn color_accessor(&self, max_index: usize) -> ColorAccessor {
        let breakpoints = self.breakpoints.clone();
        let unit = self.unit;
        Arc::new(move |value| color_index(&breakpoints, unit, value).min(max_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale(values: &[f64]) -> Vec<Breakpoint> {
        std::iter::once(Breakpoint::NoData)
            .chain(values.iter().copied().map(Breakpoint::Value))
            .collect()
    }

    #[test]
    fn test_color_index_walks_down_the_scale() {
        let breaks = scale(&[0.0, 2.0, 4.0]);
        assert_eq!(color_index(&breaks, MapUnit::Cases, None), 0);
        assert_eq!(color_index(&breaks, MapUnit::Cases, Some(0.0)), 0);
        assert_eq!(color_index(&breaks, MapUnit::Cases, Some(1.0)), 1);
        assert_eq!(color_index(&breaks, MapUnit::Cases, Some(2.0)), 1);
        assert_eq!(color_index(&breaks, MapUnit::Cases, Some(3.0)), 2);
        assert_eq!(color_index(&breaks, MapUnit::Cases, Some(4.0)), 2);
        assert_eq!(color_index(&breaks, MapUnit::Cases, Some(9.0)), 3);
    }

    #[test]
    fn test_zero_completeness_is_colored() {
        let breaks = scale(&[0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
        assert_eq!(color_index(&breaks, MapUnit::Completeness, Some(0.0)), 1);
        assert_eq!(color_index(&breaks, MapUnit::Completeness, Some(100.0)), 5);
    }

    #[test]
    fn test_lock_respects_mode() {
        let mut engine = ColorScaleEngine::new(&ColorScaleSpec::default());
        assert_eq!(engine.breakpoints(), scale(&[0.0, 1.0]).as_slice());

        engine.set_mode(ColorMode::Manual);
        assert!(!engine.lock(ColorMode::Auto, &[7.0]));
        assert_eq!(engine.breakpoints(), scale(&[0.0, 1.0]).as_slice());
        assert!(engine.lock(ColorMode::Manual, &[7.0]));
        assert_eq!(engine.breakpoints(), scale(&[0.0, 8.0]).as_slice());

        engine.toggle_mode();
        assert!(engine.lock(ColorMode::Auto, &[]));
    }

    #[test]
    fn test_toggle_twice_restores_mode() {
        let mut engine = ColorScaleEngine::new(&ColorScaleSpec::default());
        let before = engine.mode();
        engine.toggle_mode();
        engine.toggle_mode();
        assert_eq!(engine.mode(), before);
    }

    #[test]
    fn test_unit_switch_picks_palette() {
        let mut engine = ColorScaleEngine::new(&ColorScaleSpec::default());
        engine.set_palette(PaletteKey::Qualitative);
        engine.set_unit(MapUnit::Completeness);
        assert_eq!(engine.palette(), PaletteKey::ReversedDiverging);
        engine.set_unit(MapUnit::Deaths);
        assert_eq!(engine.palette(), PaletteKey::Classic);
    }

    #[test]
    fn test_accessor_is_clamped() {
        let mut engine = ColorScaleEngine::new(&ColorScaleSpec::default());
        engine.set_unit(MapUnit::Completeness);
        engine.lock(ColorMode::Manual, &[]);
        let accessor = engine.color_accessor(3);
        assert_eq!(accessor(Some(100.0)), 3);
        assert_eq!(accessor(None), 0);
    }
}
