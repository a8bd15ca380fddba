//! MoodLens core: the platform independent half of the MoodLens upload page.
//!
//! Holds the score classification, the preview formatting and the
//! sequential batch pipeline. Browser specifics (canvas, fetch, DOM) plug in
//! through the traits in [`pipeline`], so everything here runs and tests on
//! native targets as well.

pub mod config;
pub mod decode;
pub mod error;
pub mod generation;
pub mod pipeline;
pub mod prediction;
pub mod verdict;

pub use config::{ClientConfig, ElementIds, FailurePolicy, LogLevel};
pub use decode::{ImageCrateDecoder, InMemoryFile};
pub use error::{ConfigError, PipelineError, PredictError};
pub use generation::{BatchTicket, BatchTracker};
pub use pipeline::{
    BatchOutcome, BatchPipeline, BatchReport, FileOutcome, ImageDecoder, Notifier, Predictor,
    ResultSink, SelectedFile,
};
pub use prediction::{Prediction, parse_prediction};
pub use verdict::{Percentage, PreviewEntry, Verdict, classify};

/// Edge length of the square preview surface, in pixels.
pub const THUMBNAIL_SIZE: u32 = 256;

/// Width the preview thumbnail is displayed at inside a result block.
pub const DISPLAY_WIDTH: u32 = 150;

/// Scores strictly above this are classified as sad.
pub const SAD_THRESHOLD: f64 = 0.5;
