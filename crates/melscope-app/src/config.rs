use anyhow::{ensure, Context, Result};
use melscope_decode::TextEncoding;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Mel band centers in Hz for a 16 kHz sampling rate, matching what the
/// firmware reports per frame.
pub const DEFAULT_BANDS: [f32; 24] = [
    60.0, 100.0, 150.0, 200.0, 300.0, 400.0, 500.0, 650.0, 800.0, 1000.0, 1200.0, 1400.0, 1600.0,
    2000.0, 2400.0, 2800.0, 3200.0, 3600.0, 4000.0, 4500.0, 5000.0, 6000.0, 7000.0, 8000.0,
];

/// Everything is fixed at process start; nothing here is mutable at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub port: String,
    pub baud_rate: u32,
    pub bands: Vec<f32>,
    pub tick_ms: u64,
    pub encoding: TextEncoding,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: "/dev/cu.wchusbserial110".to_string(),
            baud_rate: 115_200,
            bands: DEFAULT_BANDS.to_vec(),
            tick_ms: 10,
            encoding: TextEncoding::Utf8,
        }
    }
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("melscope").join("config.json"))
}

/// Loads the config file, or the defaults when none exists. An explicitly
/// given path must exist and parse; a broken config is a startup error
/// rather than a silent fallback.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => default_path().filter(|p| p.exists()),
    };
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: AppConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
    ensure!(!cfg.bands.is_empty(), "config lists no frequency bands");
    ensure!(cfg.tick_ms > 0, "tick_ms must be at least 1");
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_24_bands() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.bands.len(), 24);
        assert_eq!(cfg.bands[0], 60.0);
        assert_eq!(*cfg.bands.last().unwrap(), 8000.0);
        assert_eq!(cfg.tick_ms, 10);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let cfg: AppConfig = serde_json::from_str(r#"{"port": "/dev/ttyUSB0"}"#).unwrap();
        assert_eq!(cfg.port, "/dev/ttyUSB0");
        assert_eq!(cfg.baud_rate, 115_200);
        assert_eq!(cfg.bands.len(), 24);
        assert_eq!(cfg.encoding, TextEncoding::Utf8);
    }

    #[test]
    fn encoding_names_are_lowercase() {
        let cfg: AppConfig = serde_json::from_str(r#"{"encoding": "ascii"}"#).unwrap();
        assert_eq!(cfg.encoding, TextEncoding::Ascii);
    }
}
