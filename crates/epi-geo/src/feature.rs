//! GeoJSON feature collections.

use std::path::Path;

use epi_model::{Viewport, format_number};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{GeoError, Result};

/// One boundary feature as read from GeoJSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: Map<String, JsonValue>,
    #[serde(default)]
    pub geometry: JsonValue,
}

impl Feature {
    /// Property rendered as trimmed text; numbers lose a trailing `.0`.
    pub fn property_text(&self, key: &str) -> String {
        match self.properties.get(key) {
            Some(JsonValue::String(text)) => text.trim().to_string(),
            Some(JsonValue::Number(number)) => number
                .as_f64()
                .map(format_number)
                .unwrap_or_else(|| number.to_string()),
            Some(JsonValue::Bool(flag)) => flag.to_string(),
            _ => String::new(),
        }
    }

    /// Numeric property, parsing numeric strings.
    pub fn property_number(&self, key: &str) -> Option<f64> {
        match self.properties.get(key)? {
            JsonValue::Number(number) => number.as_f64(),
            JsonValue::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Visit every `[lon, lat]` position of the geometry.
    fn for_each_position(&self, visit: &mut impl FnMut(f64, f64)) {
        fn walk(value: &JsonValue, visit: &mut impl FnMut(f64, f64)) {
            let JsonValue::Array(items) = value else {
                return;
            };
            match (items.first(), items.get(1)) {
                (Some(JsonValue::Number(lon)), Some(JsonValue::Number(lat))) => {
                    if let (Some(lon), Some(lat)) = (lon.as_f64(), lat.as_f64()) {
                        visit(lon, lat);
                    }
                }
                _ => items.iter().for_each(|item| walk(item, visit)),
            }
        }
        if let Some(coordinates) = self.geometry.get("coordinates") {
            walk(coordinates, visit);
        }
        if let Some(JsonValue::Array(geometries)) = self.geometry.get("geometries") {
            for geometry in geometries {
                if let Some(coordinates) = geometry.get("coordinates") {
                    walk(coordinates, visit);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Read a GeoJSON feature collection from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let json = epi_ingest::read_json(path)?;
        Self::from_json(json).map_err(|e| GeoError::NotFeatureCollection {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn from_json(json: JsonValue) -> serde_json::Result<Self> {
        serde_json::from_value(json)
    }

    /// Bounding box of the given features as `[south_west, north_east]`.
    pub fn bounds<'a>(features: impl IntoIterator<Item = &'a Feature>) -> Option<Viewport> {
        let mut bounds: Option<[[f64; 2]; 2]> = None;
        for feature in features {
            feature.for_each_position(&mut |lon, lat| {
                let b = bounds.get_or_insert([[lat, lon], [lat, lon]]);
                b[0][0] = b[0][0].min(lat);
                b[0][1] = b[0][1].min(lon);
                b[1][0] = b[1][0].max(lat);
                b[1][1] = b[1][1].max(lon);
            });
        }
        bounds.map(Viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_text_and_number() {
        let feature: Feature = serde_json::from_value(json!({
            "properties": {"name": " Bo ", "code": 12.0, "pop": "1500"}
        }))
        .unwrap();
        assert_eq!(feature.property_text("name"), "Bo");
        assert_eq!(feature.property_text("code"), "12");
        assert_eq!(feature.property_text("absent"), "");
        assert_eq!(feature.property_number("pop"), Some(1500.0));
    }

    #[test]
    fn test_bounds_cover_all_rings() {
        let collection = FeatureCollection::from_json(json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-12.0, 7.0], [-11.0, 7.0], [-11.0, 8.5], [-12.0, 7.0]]]
                }},
                {"type": "Feature", "properties": {}, "geometry": {
                    "type": "Point", "coordinates": [-13.0, 9.0]
                }}
            ]
        }))
        .unwrap();
        let bounds = FeatureCollection::bounds(&collection.features).unwrap();
        assert_eq!(bounds, Viewport([[7.0, -13.0], [9.0, -11.0]]));
    }
}
