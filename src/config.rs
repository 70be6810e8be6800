//! Resolved run settings and terrain overrides loaded from JSON.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MapError, Result};
use crate::maps::{DemOptions, MapKind};
use crate::terrain::TerrainParams;

/// Everything the library needs for one run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Directory receiving `<stem>.pdf` / `<stem>.png` (created if missing)
    pub output_dir: PathBuf,
    /// Figures to build, in order
    pub maps: Vec<MapKind>,
    /// Raster resolution of the PNG output
    pub dpi: f32,
    pub dem: DemOptions,
    /// Where to write the territory table as GeoJSON, if anywhere
    pub geojson: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("figures/maps"),
            maps: vec![MapKind::Territories, MapKind::Geologic],
            dpi: 300.0,
            dem: DemOptions::default(),
            geojson: None,
        }
    }
}

/// Read terrain parameters from a JSON file. Missing fields keep their defaults.
pub fn load_terrain_params(path: &Path) -> Result<TerrainParams> {
    let text = fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
    let params = serde_json::from_str(&text)?;
    Ok(params)
}

/// Write the territory table as a GeoJSON FeatureCollection.
pub fn write_geojson(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| MapError::io(parent, e))?;
    }
    let text = serde_json::to_string_pretty(&crate::territory::territories_geojson())?;
    fs::write(path, text).map_err(|e| MapError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("saline-config-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_defaults_match_cli() {
        let config = RunConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("figures/maps"));
        assert_eq!(config.maps.len(), 2);
        assert_eq!(config.dpi, 300.0);
        assert_eq!((config.dem.grid_width, config.dem.grid_height), (360, 400));
    }

    #[test]
    fn test_partial_terrain_override() {
        let path = scratch("terrain.json");
        fs::write(&path, r#"{ "noise_amplitude": 0.0, "smoothing_sigma": 3.0 }"#).unwrap();

        let params = load_terrain_params(&path).unwrap();
        assert_eq!(params.noise_amplitude, 0.0);
        assert_eq!(params.smoothing_sigma, 3.0);
        assert_eq!(params.highlands.len(), TerrainParams::default().highlands.len());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_terrain_file_is_io_error() {
        let err = load_terrain_params(&scratch("absent.json")).unwrap_err();
        assert!(matches!(err, MapError::Io { .. }));
    }

    #[test]
    fn test_malformed_terrain_file_is_json_error() {
        let path = scratch("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_terrain_params(&path), Err(MapError::Json(_))));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_geojson_export() {
        let path = scratch("geojson").join("territories.geojson");
        write_geojson(&path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"].as_array().unwrap().len(), 5);

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
