use std::env;
use std::path::PathBuf;

use crate::heatmap::{self, RasterConfig};
use crate::metrics::MIN_MATCH_DURATION_S;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: Option<PathBuf>,
    pub hr_file: Option<PathBuf>,
    pub export_dir: PathBuf,
    pub min_duration_s: f64,
    pub raster: RasterConfig,
    pub demo_seed: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            hr_file: None,
            export_dir: PathBuf::from("exports"),
            min_duration_s: MIN_MATCH_DURATION_S,
            raster: RasterConfig::default(),
            demo_seed: 26,
        }
    }
}

impl AppConfig {
    /// Loads `.env.local` then `.env`, then reads `PERF_*` variables.
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_env()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let raster = RasterConfig {
            width_px: parse_env("PERF_HEATMAP_WIDTH")
                .unwrap_or(heatmap::DEFAULT_WIDTH_PX)
                .clamp(64, 4096),
            height_px: parse_env("PERF_HEATMAP_HEIGHT")
                .unwrap_or(heatmap::DEFAULT_HEIGHT_PX)
                .clamp(48, 4096),
            influence_radius_m: parse_env::<f64>("PERF_INFLUENCE_RADIUS_M")
                .filter(|r| r.is_finite())
                .unwrap_or(heatmap::DEFAULT_INFLUENCE_RADIUS_M)
                .clamp(0.1, 20.0),
            ..defaults.raster
        };
        Self {
            data_dir: opt_env("PERF_DATA_DIR").map(PathBuf::from),
            hr_file: opt_env("PERF_HR_FILE").map(PathBuf::from),
            export_dir: opt_env("PERF_EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.export_dir),
            min_duration_s: parse_env::<f64>("PERF_MIN_DURATION_SECS")
                .filter(|v| v.is_finite())
                .unwrap_or(defaults.min_duration_s)
                .max(0.0),
            raster,
            demo_seed: parse_env("PERF_DEMO_SEED").unwrap_or(defaults.demo_seed),
        }
    }
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|val| if val.trim().is_empty() { None } else { Some(val) })
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    opt_env(key).and_then(|val| val.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_regulation_grid() {
        let config = AppConfig::default();
        assert_eq!(config.raster.width_px, 945);
        assert_eq!(config.raster.height_px, 612);
        assert_eq!(config.min_duration_s, 3900.0);
        assert!(config.data_dir.is_none());
    }
}
