//! Native image decoding with the `image` crate.
//!
//! Mirrors what the browser canvas does: decode, then stretch onto a square
//! surface without preserving aspect ratio. Lets the pipeline run off-browser.

use std::future::Future;

use image::RgbaImage;
use image::imageops::FilterType;

use crate::error::PipelineError;
use crate::pipeline::{ImageDecoder, SelectedFile};

/// A file held fully in memory.
#[derive(Debug, Clone)]
pub struct InMemoryFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl InMemoryFile {
    /// Create a file, guessing the MIME type from the extension.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_for_name(&name).to_string();
        Self {
            name,
            mime_type,
            bytes,
        }
    }
}

fn mime_for_name(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    match lower.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

impl SelectedFile for InMemoryFile {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn mime_type(&self) -> String {
        self.mime_type.clone()
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Decoder producing an RGBA preview of fixed size.
#[derive(Debug, Clone, Copy)]
pub struct ImageCrateDecoder {
    size: u32,
}

impl ImageCrateDecoder {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    /// Decode raw bytes and stretch them to `size` x `size`.
    pub fn decode_bytes(&self, name: &str, bytes: &[u8]) -> Result<RgbaImage, PipelineError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| PipelineError::decode(name, e.to_string()))?;
        Ok(img
            .resize_exact(self.size, self.size, FilterType::Triangle)
            .to_rgba8())
    }
}

impl Default for ImageCrateDecoder {
    fn default() -> Self {
        Self::new(crate::THUMBNAIL_SIZE)
    }
}

impl ImageDecoder<InMemoryFile> for ImageCrateDecoder {
    type Snapshot = RgbaImage;

    fn decode(
        &self,
        file: &InMemoryFile,
    ) -> impl Future<Output = Result<Self::Snapshot, PipelineError>> {
        std::future::ready(self.decode_bytes(&file.name, &file.bytes))
    }
}
