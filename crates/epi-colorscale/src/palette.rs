//! Named color palettes. Index 0 is the "no data" color.

use epi_model::{MapUnit, PaletteKey};

pub const CLASSIC: [&str; 7] = [
    "#DDDDDD", "#fcbba1", "#fc9272", "#fb6a4a", "#de2d26", "#a50f15", "#fee5d9",
];
pub const DIVERGING: [&str; 6] = ["#DDDDDD", "#1a9641", "#a6d96a", "#ffffbf", "#fdae61", "#d7191c"];
pub const QUALITATIVE: [&str; 6] = ["#DDDDDD", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#ffff33"];
pub const REVERSED_DIVERGING: [&str; 6] = [
    "#DDDDDD", "#d7191c", "#fdae61", "#ffffbf", "#a6d96a", "#1a9641",
];

/// Colors of a palette. `Composite` resolves to the custom colors.
pub fn palette_colors(key: PaletteKey, custom: &[String]) -> Vec<String> {
    let named: &[&str] = match key {
        PaletteKey::Classic => &CLASSIC,
        PaletteKey::Diverging => &DIVERGING,
        PaletteKey::Qualitative => &QUALITATIVE,
        PaletteKey::ReversedDiverging => &REVERSED_DIVERGING,
        PaletteKey::Composite => return custom.to_vec(),
    };
    named.iter().map(ToString::to_string).collect()
}

/// Colors picked by a chart's display indices; every color when none are given.
///
/// Indices past the end of the palette are skipped.
pub fn display_colors(palette: &[String], indices: &[usize]) -> Vec<String> {
    if indices.is_empty() {
        return palette.to_vec();
    }
    indices.iter().filter_map(|&i| palette.get(i).cloned()).collect()
}

/// Palette shown by default for a map unit.
pub fn palette_for_unit(unit: MapUnit) -> PaletteKey {
    match unit {
        MapUnit::Completeness => PaletteKey::ReversedDiverging,
        _ => PaletteKey::Classic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_colors_select_by_index() {
        let palette = palette_colors(PaletteKey::Diverging, &[]);
        assert_eq!(display_colors(&palette, &[0, 5, 9]), vec!["#DDDDDD", "#d7191c"]);
        assert_eq!(display_colors(&palette, &[]).len(), 6);
    }

    #[test]
    fn test_composite_uses_custom_colors() {
        let custom = vec!["#000000".to_string(), "#ffffff".to_string()];
        assert_eq!(palette_colors(PaletteKey::Composite, &custom), custom);
    }

    #[test]
    fn test_unit_palettes() {
        assert_eq!(palette_for_unit(MapUnit::Completeness), PaletteKey::ReversedDiverging);
        assert_eq!(palette_for_unit(MapUnit::IncidenceProp), PaletteKey::Classic);
    }
}
