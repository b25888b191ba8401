//! Configuration file support for the overlay.
//!
//! Every field has a default, so partial files load and missing sections
//! fall back to the values in [`crate::constants`].

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::ConfigError;
use crate::keybindings::KeyBindings;
use crate::label::LabelOptions;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Style applied to newly drawn shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleDefaults {
    /// Stroke width in screen pixels
    pub stroke_width: f64,
    pub stroke_color: String,
    pub visible: bool,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            stroke_width: constants::DEFAULT_STROKE_WIDTH,
            stroke_color: constants::DEFAULT_STROKE_COLOR.to_string(),
            visible: true,
        }
    }
}

/// Screen-space sizes of interaction affordances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractionConfig {
    pub anchor_size: f64,
    pub anchor_stroke_width: f64,
    pub snap_distance: f64,
    pub hit_tolerance: f64,
    pub min_draw_distance: f64,
    pub arrow_marker_size: f64,
    pub ruler_cap_length: f64,
    pub flag_radius: f64,
    pub max_undo_history: usize,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            anchor_size: constants::ANCHOR_SIZE,
            anchor_stroke_width: constants::ANCHOR_STROKE_WIDTH,
            snap_distance: constants::SNAP_DISTANCE,
            hit_tolerance: constants::HIT_TOLERANCE,
            min_draw_distance: constants::MIN_DRAW_DISTANCE,
            arrow_marker_size: constants::ARROW_MARKER_SIZE,
            ruler_cap_length: constants::RULER_CAP_LENGTH,
            flag_radius: constants::FLAG_RADIUS,
            max_undo_history: constants::MAX_UNDO_HISTORY,
        }
    }
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

/// Overlay configuration that can be exported and imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayConfig {
    /// Version of the configuration file format
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub style: StyleDefaults,

    #[serde(default)]
    pub interaction: InteractionConfig,

    #[serde(default)]
    pub label: LabelOptions,

    #[serde(default)]
    pub keybindings: KeyBindings,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl OverlayConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            style: StyleDefaults::default(),
            interaction: InteractionConfig::default(),
            label: LabelOptions::default(),
            keybindings: KeyBindings::default(),
            log_level: LogLevel::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "slide-overlay.json"
    }

    /// Read and parse a config file.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Write the config, creating parent directories if needed.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get the default config file path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("slide-overlay").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("slide-overlay")
                    .join(Self::default_filename())
            })
        }
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from_path(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to_path(&path)
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trip() {
        let mut config = OverlayConfig::new();
        config.interaction.snap_distance = 25.0;
        config.label.tag_text = "ROI".into();
        config.log_level = LogLevel::Debug;

        let json = config.to_json().unwrap();
        let loaded = OverlayConfig::from_json(&json).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let loaded = OverlayConfig::from_json(r#"{"interaction": {"anchorSize": 9.0}}"#).unwrap();
        assert_eq!(loaded.version, CONFIG_VERSION);
        assert_eq!(loaded.interaction.anchor_size, 9.0);
        assert_eq!(
            loaded.interaction.snap_distance,
            constants::SNAP_DISTANCE
        );
        assert_eq!(loaded.style, StyleDefaults::default());
    }

    #[test]
    fn test_newer_version_rejected() {
        let json = format!(r#"{{"version": {}}}"#, CONFIG_VERSION + 1);
        assert!(matches!(
            OverlayConfig::from_json(&json),
            Err(ConfigError::VersionTooNew { .. })
        ));
    }

    #[test]
    fn test_log_level_parsing() {
        let loaded = OverlayConfig::from_json(r#"{"logLevel": "trace"}"#).unwrap();
        assert_eq!(loaded.log_level.to_level_filter(), log::LevelFilter::Trace);
    }

    #[test]
    fn test_save_and_load_path() {
        let path = std::env::temp_dir()
            .join(format!("slide-overlay-test-{}", std::process::id()))
            .join(OverlayConfig::default_filename());
        let config = OverlayConfig::new();
        config.save_to_path(&path).unwrap();
        assert_eq!(OverlayConfig::load_from_path(&path).unwrap(), config);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
