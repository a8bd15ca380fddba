//! Client configuration for MoodLens.
//!
//! The page can embed a JSON document to override any of these settings.
//! Every field has a default, so an empty object `{}` (or no config at all)
//! gives the stock behaviour: POST to `/predict`, 256px previews, a 0.5
//! threshold and abort-on-first-failure.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Current configuration format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Log level setting for the client.
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
    /// Convert to log crate's Level.
    pub fn to_level(&self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        self.to_level().to_level_filter()
    }
}

/// What a batch does when one of its files fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Alert once and stop; later files in the batch are never processed
    #[default]
    AbortBatch,
    /// Alert, skip the failing file and carry on with the next one
    SkipFile,
}

/// IDs of the page elements the controller attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementIds {
    /// Drop target that receives drag events and the `hover` class
    #[serde(default = "default_drop_area")]
    pub drop_area: String,
    /// `<input type="file">` used for manual selection
    #[serde(default = "default_file_input")]
    pub file_input: String,
    /// Container the result blocks are appended to
    #[serde(default = "default_preview")]
    pub preview: String,
}

fn default_drop_area() -> String {
    "drop-area".to_string()
}

fn default_file_input() -> String {
    "file-input".to_string()
}

fn default_preview() -> String {
    "preview".to_string()
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            drop_area: default_drop_area(),
            file_input: default_file_input(),
            preview: default_preview(),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Version of the configuration format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Prediction endpoint, relative to the page
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Multipart field name carrying the uploaded file
    #[serde(default = "default_form_field")]
    pub form_field: String,

    /// Edge length of the square preview surface
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,

    /// Display width of the preview image in a result block
    #[serde(default = "default_display_width")]
    pub display_width: u32,

    /// Scores strictly above this are sad
    #[serde(default = "default_sad_threshold")]
    pub sad_threshold: f64,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Alert shown when a prediction request fails
    #[serde(default = "default_alert_message")]
    pub alert_message: String,

    /// Alert shown when a file cannot be decoded as an image
    #[serde(default = "default_decode_alert_message")]
    pub decode_alert_message: String,

    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default)]
    pub elements: ElementIds,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_endpoint() -> String {
    "/predict".to_string()
}

fn default_form_field() -> String {
    "file".to_string()
}

fn default_thumbnail_size() -> u32 {
    crate::THUMBNAIL_SIZE
}

fn default_display_width() -> u32 {
    crate::DISPLAY_WIDTH
}

fn default_sad_threshold() -> f64 {
    crate::SAD_THRESHOLD
}

fn default_alert_message() -> String {
    "Prediction failed. Please try again with a different image.".to_string()
}

fn default_decode_alert_message() -> String {
    "Could not read one of the images. Please try again with a different image.".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            endpoint: default_endpoint(),
            form_field: default_form_field(),
            thumbnail_size: default_thumbnail_size(),
            display_width: default_display_width(),
            sad_threshold: default_sad_threshold(),
            failure_policy: FailurePolicy::default(),
            alert_message: default_alert_message(),
            decode_alert_message: default_decode_alert_message(),
            log_level: LogLevel::default(),
            elements: ElementIds::default(),
        }
    }
}

impl ClientConfig {
    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from optional JSON, falling back to defaults.
    ///
    /// A missing document is normal. A broken one is logged and ignored so
    /// a typo in the page never leaves the upload area dead.
    pub fn from_json_or_default(json: Option<&str>) -> Self {
        let Some(json) = json.map(str::trim).filter(|json| !json.is_empty()) else {
            log::debug!("No client config found, using defaults");
            return Self::default();
        };

        match Self::from_json(json) {
            Ok(config) => {
                log::info!("Loaded client configuration");
                config
            }
            Err(e) => {
                log::warn!("Ignoring invalid client configuration: {}", e);
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "endpoint",
                reason: "must not be empty".to_string(),
            });
        }
        if self.form_field.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "form_field",
                reason: "must not be empty".to_string(),
            });
        }
        if self.thumbnail_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "thumbnail_size",
                reason: "must be at least 1 pixel".to_string(),
            });
        }
        if !self.sad_threshold.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "sad_threshold",
                reason: format!("{} is not a finite number", self.sad_threshold),
            });
        }
        Ok(())
    }
}
