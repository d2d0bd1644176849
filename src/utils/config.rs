use crate::api::ApiSettings;
use crate::core::MeasurementFilter;
use crate::feeds::DepthFeedSettings;
use crate::gradient::GradientConfig;
use crate::histogram::HistogramConfig;
use crate::map::{CookieSettings, MapSettings};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Default log verbosity of the command line front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive for `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter())
    }
}

/// Complete viewer configuration. Every section falls back to its defaults
/// when missing from the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub api: ApiSettings,
    pub map: MapSettings,
    pub gradient: GradientConfig,
    pub histogram: HistogramConfig,
    pub depth_feed: DepthFeedSettings,
    pub cookie: CookieSettings,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {parameter}: {reason}")]
    InvalidParameter { parameter: String, value: String, reason: String },

    #[error("{message}")]
    IoError { message: String },

    #[error("{message}")]
    SerializationError { message: String },
}

/// Configuration validation result
#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<String>,
}

/// Loads, validates and saves the viewer configuration
pub struct ConfigurationManager {
    config: ViewerConfig,
    config_file_path: Option<String>,
    is_modified: bool,
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationManager {
    /// Create a manager holding the default configuration
    pub fn new() -> Self {
        Self {
            config: ViewerConfig::default(),
            config_file_path: None,
            is_modified: false,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Replace the configuration after validating it
    pub fn update_config(&mut self, config: ViewerConfig) -> Result<(), ConfigError> {
        Self::first_error(Self::validate(&config))?;
        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    pub fn set_initial_filter(&mut self, filter: MeasurementFilter) {
        if self.config.depth_feed.initial_filter != filter {
            self.config.depth_feed.initial_filter = filter;
            self.is_modified = true;
        }
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: ViewerConfig = serde_json::from_str(&content).map_err(|e| ConfigError::SerializationError {
            message: format!("Failed to parse config file '{}': {}", path_str, e),
        })?;

        let validation = Self::validate(&config);
        for warning in &validation.warnings {
            info!(path = %path_str, "{}", warning);
        }
        Self::first_error(validation)?;

        self.config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(&self.config).map_err(|e| ConfigError::SerializationError {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&path, content).map_err(|e| ConfigError::IoError {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })?;

        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        if let Some(path) = self.config_file_path.clone() {
            self.save_to_file(path)
        } else {
            Err(ConfigError::IoError {
                message: "No file path set for saving configuration".to_string(),
            })
        }
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    fn first_error(validation: ValidationResult) -> Result<(), ConfigError> {
        match validation.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Check every section and collect all problems at once
    pub fn validate(config: &ViewerConfig) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let mut invalid = |parameter: &str, value: String, reason: &str| {
            errors.push(ConfigError::InvalidParameter {
                parameter: parameter.to_string(),
                value,
                reason: reason.to_string(),
            });
        };

        if !(config.api.base_url.starts_with("http://") || config.api.base_url.starts_with("https://")) {
            invalid("api.base_url", config.api.base_url.clone(), "Backend URL must use http or https");
        }
        if config.api.timeout_ms == 0 {
            invalid("api.timeout_ms", "0".to_string(), "Request timeout must be positive");
        }

        let center = config.map.default_center;
        if !(-90.0..=90.0).contains(&center.lat) || !(-180.0..=180.0).contains(&center.lon) {
            invalid(
                "map.default_center",
                format!("{}, {}", center.lat, center.lon),
                "Center must be a valid latitude/longitude",
            );
        }
        if config.map.default_zoom > 22 {
            invalid("map.default_zoom", config.map.default_zoom.to_string(), "Zoom level must be 0-22");
        }
        if config.map.canvas_width_px == 0 || config.map.canvas_height_px == 0 {
            invalid(
                "map.canvas_height_px",
                format!("{}x{}", config.map.canvas_width_px, config.map.canvas_height_px),
                "Canvas must have a non-zero size",
            );
        }

        if config.gradient.split == 0 || config.gradient.split > config.gradient.max_depth {
            invalid(
                "gradient.split",
                config.gradient.split.to_string(),
                "Split depth must be between 1 and max_depth",
            );
        }

        if config.histogram.domain_max <= 0.0 {
            invalid(
                "histogram.domain_max",
                config.histogram.domain_max.to_string(),
                "Histogram domain must be positive",
            );
        }
        if config.histogram.bin_count == 0 {
            invalid("histogram.bin_count", "0".to_string(), "At least one histogram bin is required");
        }
        if config.histogram.enabled && config.histogram.domain_max < config.gradient.max_depth as f64 {
            warnings.push("Histogram domain is shallower than the gradient; deep measurements are not counted".to_string());
        }

        if config.cookie.name.is_empty() {
            invalid("cookie.name", String::new(), "Cookie name must not be empty");
        }
        if config.cookie.max_age_days == 0 {
            warnings.push("Viewport cookie expires immediately; the viewport will not be restored".to_string());
        }

        if !config.depth_feed.discard_stale_responses {
            warnings.push("Stale depth responses are applied; markers may reappear after fast panning".to_string());
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LatLng;

    #[test]
    fn test_default_config_is_valid() {
        let validation = ConfigurationManager::validate(&ViewerConfig::default());
        assert!(validation.is_valid);
        assert!(validation.warnings.is_empty());
    }

    #[test]
    fn test_configuration_manager_creation() {
        let manager = ConfigurationManager::new();
        assert_eq!(manager.config().gradient.max_depth, 40);
        assert_eq!(manager.config().depth_feed.initial_filter, MeasurementFilter::Valid);
        assert!(!manager.is_modified());
    }

    #[test]
    fn test_invalid_config_collects_all_errors() {
        let mut config = ViewerConfig::default();
        config.api.base_url = "ftp://example.org".to_string();
        config.gradient.split = 50;
        config.histogram.bin_count = 0;
        config.map.default_center = LatLng::new(95.0, 0.0);

        let validation = ConfigurationManager::validate(&config);
        assert!(!validation.is_valid);
        assert_eq!(validation.errors.len(), 4);

        let mut manager = ConfigurationManager::new();
        assert!(matches!(
            manager.update_config(config),
            Err(ConfigError::InvalidParameter { parameter, .. }) if parameter == "api.base_url"
        ));
        assert!(!manager.is_modified());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let json = r#"{"gradient": {"max_depth": 60}, "log_level": "debug"}"#;
        let config: ViewerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.gradient.max_depth, 60);
        assert_eq!(config.gradient.split, 10);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.cookie.name, "map_pos");
        assert!(config.depth_feed.discard_stale_responses);
    }

    #[test]
    fn test_config_file_round_trip() {
        let path = std::env::temp_dir().join(format!("depthmap_config_{}.json", std::process::id()));

        let mut manager = ConfigurationManager::new();
        manager.set_initial_filter(MeasurementFilter::All);
        assert!(manager.is_modified());
        manager.save_to_file(&path).unwrap();
        assert!(!manager.is_modified());

        let loaded = ConfigurationManager::from_file(&path).unwrap();
        assert_eq!(loaded.config().depth_feed.initial_filter, MeasurementFilter::All);
        assert_eq!(loaded.config(), manager.config());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigurationManager::from_file("/nonexistent/depthmap.json");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
        assert!(ConfigurationManager::new().save().is_err());
    }
}
