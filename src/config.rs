//! Configuration for the Fotobox kiosk.
//!
//! Physical constants (print size, output resolution, timings) live here as
//! plain constants. Everything an operator may want to change is in
//! [`BoothConfig`], loaded once at startup and passed down explicitly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Print width in millimetres (6 inch)
pub const PRINT_WIDTH_MM: f64 = 152.4;

/// Print height in millimetres (4 inch)
pub const PRINT_HEIGHT_MM: f64 = 101.6;

/// Target aspect ratio of every captured photo
pub const ASPECT_RATIO: f64 = PRINT_WIDTH_MM / PRINT_HEIGHT_MM;

/// Captured output width (6 inch at 300 dpi)
pub const OUTPUT_WIDTH: u32 = 1800;

/// Captured output height (4 inch at 300 dpi)
pub const OUTPUT_HEIGHT: u32 = 1200;

/// JPEG quality for captured photos
pub const JPEG_QUALITY: u8 = 95;

/// Ideal capture resolution requested from the camera (4K)
pub const REQUESTED_WIDTH: u32 = 3840;
pub const REQUESTED_HEIGHT: u32 = 2160;

/// Camera frame sizes to ask for, most preferred first: 4K width at the
/// print aspect ratio, then plain 4K.
pub fn requested_sizes() -> [(u32, u32); 2] {
    let print_shaped = (REQUESTED_WIDTH as f64 / ASPECT_RATIO).round() as u32;
    [
        (REQUESTED_WIDTH, print_shaped),
        (REQUESTED_WIDTH, REQUESTED_HEIGHT),
    ]
}

/// Sentinel device id selecting the platform default camera
pub const DEFAULT_DEVICE_ID: &str = "default_camera";

/// Brightness slider bounds, in percent
pub const BRIGHTNESS_MIN: u32 = 50;
pub const BRIGHTNESS_MAX: u32 = 150;
pub const BRIGHTNESS_STEP: u32 = 5;
pub const BRIGHTNESS_DEFAULT: u32 = 100;

/// Countdown start value in seconds
pub const COUNTDOWN_SECONDS: u32 = 5;

/// Countdown tick interval in milliseconds
pub const COUNTDOWN_TICK_MS: u64 = 1000;

/// Storage key holding the photo collection record
pub const STORAGE_KEY: &str = "savedPhotos";

/// QR code size in pixels
pub const QR_SIZE: u32 = 200;

/// Error message display duration in milliseconds
pub const ERROR_DISPLAY_DURATION_MS: u64 = 5000;

/// Environment variable pointing at an alternative config file
pub const CONFIG_ENV: &str = "FOTOBOX_CONFIG";

const APP_DIR: &str = "fotobox";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Where print jobs go
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum PrintTarget {
    /// Platform print dialog
    #[default]
    Dialog,
    /// Write standalone HTML print documents into a directory
    Spool { dir: PathBuf },
}

/// Runtime configuration, owned by the application context
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoothConfig {
    /// Directory backing the key/value store
    pub storage_dir: PathBuf,
    /// Directory saved photos are written to
    pub save_dir: PathBuf,
    /// Base of the constructed collection URL (`<base>/<id>`)
    pub collection_base_url: String,
    /// Countdown start value
    pub countdown_seconds: u32,
    /// Print destination
    pub print: PrintTarget,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            save_dir: default_save_dir(),
            collection_base_url: "https://ihre-domain.de/photos".to_string(),
            countdown_seconds: COUNTDOWN_SECONDS,
            print: PrintTarget::Dialog,
        }
    }
}

impl BoothConfig {
    /// Load the config from `$FOTOBOX_CONFIG` or the user config dir.
    ///
    /// A missing file in the user config dir yields the defaults. A file named
    /// by `$FOTOBOX_CONFIG` must exist; an unreadable or malformed file is an
    /// error either way.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(std::env::var_os(CONFIG_ENV).map(PathBuf::from))
    }

    fn load_from(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(&path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                log::info!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
}

fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

fn default_save_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_geometry() {
        assert!((ASPECT_RATIO - 1.5).abs() < 1e-9);
        assert_eq!(OUTPUT_WIDTH * 2, OUTPUT_HEIGHT * 3);
    }

    #[test]
    fn test_print_shaped_size_preferred() {
        let sizes = requested_sizes();
        assert_eq!(sizes[0], (3840, 2560));
        assert_eq!(sizes[1], (REQUESTED_WIDTH, REQUESTED_HEIGHT));
        let (w, h) = sizes[0];
        assert!((w as f64 / h as f64 - ASPECT_RATIO).abs() < 1e-9);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo.json");

        let err = BoothConfig::load_from(Some(path.clone())).unwrap_err();
        match err {
            ConfigError::Read { path: p, source } => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_explicit_config_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("booth.json");
        std::fs::write(&path, r#"{"countdown_seconds": 2}"#).unwrap();

        let config = BoothConfig::load_from(Some(path)).unwrap();
        assert_eq!(config.countdown_seconds, 2);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"countdown_seconds": 3, "print": {"target": "spool", "dir": "/tmp/spool"}}"#,
        )
        .unwrap();

        let config = BoothConfig::from_file(&path).unwrap();
        assert_eq!(config.countdown_seconds, 3);
        assert_eq!(
            config.print,
            PrintTarget::Spool {
                dir: PathBuf::from("/tmp/spool")
            }
        );
        assert_eq!(config.collection_base_url, "https://ihre-domain.de/photos");
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            BoothConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
