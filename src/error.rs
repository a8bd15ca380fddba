//! Errors raised while attaching MoodLens to the page.

use thiserror::Error;

/// Failure to find or wire up the page elements.
#[derive(Debug, Error)]
pub enum MountError {
    #[error("No window object available")]
    NoWindow,

    #[error("No document available")]
    NoDocument,

    #[error("Element '#{id}' not found")]
    MissingElement { id: String },

    #[error("Element '#{id}' is not a {expected}")]
    WrongElementType { id: String, expected: &'static str },
}
