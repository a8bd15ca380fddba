//! Image decoding through `<img>` and a 2D canvas.
//!
//! The file is loaded via an object URL into an `HtmlImageElement`, then
//! drawn stretched onto a square canvas. The canvas itself is the snapshot
//! handed to the result sink.

use std::future::Future;

use js_sys::Promise;
use moodlens_core::{ImageDecoder, PipelineError, SelectedFile};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlImageElement, Url};

use crate::browser_file::BrowserFile;

/// Decodes files with the browser's own image pipeline.
pub struct CanvasDecoder {
    document: Document,
    size: u32,
}

impl CanvasDecoder {
    pub fn new(document: Document, size: u32) -> Self {
        Self { document, size }
    }

    async fn decode_file(&self, file: &BrowserFile) -> Result<HtmlCanvasElement, PipelineError> {
        let name = file.name();
        let fail = |what: &str, e: wasm_bindgen::JsValue| {
            PipelineError::decode(name.as_str(), format!("{}: {:?}", what, e))
        };

        let url =
            Url::create_object_url_with_blob(file.as_file()).map_err(|e| fail("object URL", e))?;
        let img = HtmlImageElement::new().map_err(|e| fail("create <img>", e))?;

        // Resolve on load, reject on error. Without the error path a broken
        // file would leave the batch waiting forever.
        let loaded = Promise::new(&mut |resolve, reject| {
            img.set_onload(Some(&resolve));
            img.set_onerror(Some(&reject));
        });
        img.set_src(&url);
        let result = JsFuture::from(loaded).await;

        img.set_onload(None);
        img.set_onerror(None);
        if let Err(e) = Url::revoke_object_url(&url) {
            log::warn!("Failed to revoke object URL for '{}': {:?}", name, e);
        }
        if result.is_err() {
            return Err(PipelineError::decode(
                name.as_str(),
                "browser could not load the file as an image",
            ));
        }

        let canvas: HtmlCanvasElement = self
            .document
            .create_element("canvas")
            .map_err(|e| fail("create <canvas>", e))?
            .dyn_into()
            .map_err(|_| PipelineError::decode(name.as_str(), "not a canvas element"))?;
        canvas.set_width(self.size);
        canvas.set_height(self.size);

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .map_err(|e| fail("get 2d context", e))?
            .ok_or_else(|| PipelineError::decode(name.as_str(), "2d context unavailable"))?
            .dyn_into()
            .map_err(|_| PipelineError::decode(name.as_str(), "not a 2d context"))?;

        let edge = f64::from(self.size);
        ctx.draw_image_with_html_image_element_and_dw_and_dh(&img, 0.0, 0.0, edge, edge)
            .map_err(|e| fail("draw image", e))?;

        log::debug!(
            "Drew '{}' ({}x{}) onto {}x{} canvas",
            name,
            img.natural_width(),
            img.natural_height(),
            self.size,
            self.size
        );
        Ok(canvas)
    }
}

impl ImageDecoder<BrowserFile> for CanvasDecoder {
    type Snapshot = HtmlCanvasElement;

    fn decode(
        &self,
        file: &BrowserFile,
    ) -> impl Future<Output = Result<Self::Snapshot, PipelineError>> {
        self.decode_file(file)
    }
}
