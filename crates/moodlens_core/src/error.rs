//! Error types for the upload pipeline and its configuration.

use thiserror::Error;

/// Failures talking to the prediction service.
#[derive(Error, Debug)]
pub enum PredictError {
    /// The request never produced a response (network down, CORS, aborted)
    #[error("Request to prediction service failed: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status
    #[error("Server responded with {status}{}", status_detail(.message))]
    Status {
        /// HTTP status code
        status: u16,
        /// `error` field from the JSON body, when the service sent one
        message: Option<String>,
    },

    /// The response body was not valid JSON
    #[error("Malformed response body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

fn status_detail(message: &Option<String>) -> String {
    match message {
        Some(message) => format!(": {}", message),
        None => String::new(),
    }
}

/// Failures of a single file inside a batch.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The image could not be loaded or drawn onto the preview surface
    #[error("Failed to decode '{name}': {reason}")]
    Decode {
        /// Name of the offending file
        name: String,
        /// Description of the decode failure
        reason: String,
    },

    /// The prediction request failed
    #[error("Prediction failed for '{name}': {source}")]
    Predict {
        /// Name of the offending file
        name: String,
        #[source]
        source: PredictError,
    },

    /// The result block could not be appended to the page
    #[error("Failed to render result for '{name}': {reason}")]
    Render {
        /// Name of the offending file
        name: String,
        /// Description of the render failure
        reason: String,
    },
}

impl PipelineError {
    /// Create a decode error.
    pub fn decode(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a render error.
    pub fn render(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Render {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this failure happened before the image was readable.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

/// Errors that can occur while loading client configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Config file written by a newer release
    #[error(
        "Config version {file_version} is newer than supported version {supported_version}. Please update MoodLens."
    )]
    VersionTooNew {
        /// Version found in the config
        file_version: u32,
        /// Highest version this build understands
        supported_version: u32,
    },

    /// A field holds a value the pipeline cannot work with
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Name of the field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}
