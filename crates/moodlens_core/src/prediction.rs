//! Parsing of the prediction service's JSON responses.
//!
//! Success bodies look like `{"score": 0.87}`. Failure bodies carry an
//! `error` string instead, e.g. `{"error": "No file part"}`.

use serde::Deserialize;
use serde_json::Value;

use crate::error::PredictError;

/// A parsed success response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Sadness probability. NaN when the body had no numeric `score`.
    pub score: f64,
}

impl Prediction {
    /// Whether the service actually sent a numeric score.
    pub fn has_score(&self) -> bool {
        !self.score.is_nan()
    }
}

#[derive(Deserialize)]
struct RawFailure {
    error: String,
}

/// Parse a success body.
///
/// A body that is not JSON is an error. A JSON body whose `score` is
/// missing or not a number is accepted and yields a NaN score, which then
/// renders as `NaN%` downstream.
pub fn parse_prediction(body: &str) -> Result<Prediction, PredictError> {
    let value: Value = serde_json::from_str(body)?;
    match value.get("score").and_then(Value::as_f64) {
        Some(score) => Ok(Prediction { score }),
        None => {
            log::warn!("Response has no numeric 'score' field: {}", body);
            Ok(Prediction { score: f64::NAN })
        }
    }
}

/// Extract the `error` message from a failure body, if there is one.
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<RawFailure>(body)
        .ok()
        .map(|failure| failure.error)
}
