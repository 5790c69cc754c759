//! Loading a dashboard configuration from disk.

use std::path::{Path, PathBuf};

use epi_model::DashboardConfig;
use tracing::info;

use crate::error::{CoreError, Result};

/// Read, parse and validate a TOML configuration file.
pub fn load_config(path: &Path) -> Result<DashboardConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| CoreError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: DashboardConfig = toml::from_str(&contents).map_err(|e| CoreError::Toml {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.validate()?;
    info!(
        path = %path.display(),
        fields = config.fields.len(),
        sources = config.sources.len(),
        charts = config.charts.len(),
        "Loaded dashboard configuration"
    );
    Ok(config)
}

/// Resolve a configured path against the configuration directory.
pub fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epi_model::{ChartKind, MapUnit, SourceMethod};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_minimal_config_is_valid() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();
        assert!(config.sources.is_empty());
        assert_eq!(config.colorscale.unit, MapUnit::Cases);
        assert_eq!(config.interaction.autoplay_delay_ms, 2000);
    }

    #[test]
    fn test_sections_deserialize() {
        let file = write_config(
            r#"
datatype = "surveillance"

[[fields]]
key = "epiwk"
header = "Epi Week"

[[fields]]
key = "admN1"
header = "District"

[[sources]]
datatype = "geometry"
name = "admN1"
method = "geometry"
path = "geo/districts.geojson"

[[sources]]
datatype = "medical"
name = "medical"
method = "fetch_remote"

[geometry]
levels = ["admN1"]
name_properties = ["adm1"]

[[charts]]
id = "epiwk"
dimension = { builder = "auto", column = "epiwk" }
kind = { type = "bar" }

[[charts]]
id = "map"
dimension = { builder = "admin_level", level = "admN1" }
kind = { type = "choropleth", level = "admN1" }
display_colors = [0, 1, 2, 3, 4, 5]

[colorscale]
unit = "IncidenceProp"
method = "Quantile"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.fields.len(), 2);
        assert!(matches!(config.sources[0].method, SourceMethod::Geometry { .. }));
        assert!(matches!(config.sources[1].method, SourceMethod::Unknown));
        assert!(matches!(config.charts[1].kind, ChartKind::Choropleth(_)));
        assert_eq!(config.colorscale.unit, MapUnit::IncidenceProp);
    }

    #[test]
    fn test_dangling_reference_is_rejected() {
        let file = write_config(
            r#"
[[charts]]
id = "sex"
dimension = { builder = "auto", column = "sex" }
kind = { type = "pie" }
"#,
        );
        let error = load_config(file.path()).unwrap_err();
        assert!(matches!(error, CoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let file = write_config("fields = 3");
        let error = load_config(file.path()).unwrap_err();
        match error {
            CoreError::Toml { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/srv/dashboard");
        assert_eq!(resolve_path(base, Path::new("data")), PathBuf::from("/srv/dashboard/data"));
        assert_eq!(resolve_path(base, Path::new("/abs/data")), PathBuf::from("/abs/data"));
    }
}
