//! MoodLens - drag-and-drop mood checker for the browser.
//!
//! Drop or pick images, get a happy/sad verdict per image from a remote
//! prediction service. The pipeline itself lives in [`moodlens_core`]; this
//! crate supplies the browser side (canvas decoding, `fetch`, DOM rendering,
//! event wiring) and the WASM entry point.

mod error;

pub use error::MountError;

#[cfg(target_arch = "wasm32")]
mod browser_file;
#[cfg(target_arch = "wasm32")]
mod canvas_decoder;
#[cfg(target_arch = "wasm32")]
mod controller;
#[cfg(target_arch = "wasm32")]
mod dom_sink;
#[cfg(target_arch = "wasm32")]
mod fetch_predictor;

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use browser_file::BrowserFile;
#[cfg(target_arch = "wasm32")]
pub use canvas_decoder::CanvasDecoder;
#[cfg(target_arch = "wasm32")]
pub use controller::UploadController;
#[cfg(target_arch = "wasm32")]
pub use dom_sink::{AlertNotifier, DomResultSink};
#[cfg(target_arch = "wasm32")]
pub use fetch_predictor::FetchPredictor;
#[cfg(target_arch = "wasm32")]
pub use wasm::*;
