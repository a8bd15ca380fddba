//! Result block rendering and alerts.
//!
//! A result block looks like:
//!
//! ```html
//! <div class="result">
//!   <img src="data:image/png;..." width="150">
//!   <div>
//!     <div class="label">Happy (30.0%)</div>
//!     <div style="margin-top: 10px; font-weight: bold;">Confidence Score:</div>
//!     <div class="bar-container"><div class="bar" style="width: 30.0%;">30.0%</div></div>
//!   </div>
//!   <div class="emoji">:)</div>
//! </div>
//! ```

use moodlens_core::{Notifier, PreviewEntry, ResultSink};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlCanvasElement, HtmlElement, HtmlImageElement, Window};

/// Static caption above the confidence bar.
pub const SCORE_CAPTION: &str = "Confidence Score:";

/// Renders result blocks into a container element.
pub struct DomResultSink {
    document: Document,
    container: Element,
    display_width: u32,
}

impl DomResultSink {
    pub fn new(document: Document, container: Element, display_width: u32) -> Self {
        Self {
            document,
            container,
            display_width,
        }
    }

    fn div(&self, class: Option<&str>) -> Result<HtmlElement, JsValue> {
        let el: HtmlElement = self.document.create_element("div")?.unchecked_into();
        if let Some(class) = class {
            el.set_class_name(class);
        }
        Ok(el)
    }

    /// Build the block for one entry without attaching it.
    pub fn build_block(&self, entry: &PreviewEntry<HtmlCanvasElement>) -> Result<Element, JsValue> {
        let block = self.div(Some("result"))?;

        let thumb = HtmlImageElement::new()?;
        thumb.set_src(&entry.snapshot.to_data_url()?);
        thumb.set_width(self.display_width);

        let info = self.div(None)?;

        let label = self.div(Some("label"))?;
        label.set_text_content(Some(&entry.label_text()));

        let caption = self.div(None)?;
        caption.set_text_content(Some(SCORE_CAPTION));
        let style = caption.style();
        style.set_property("margin-top", "10px")?;
        style.set_property("font-weight", "bold")?;

        let bar_container = self.div(Some("bar-container"))?;
        let bar = self.div(Some("bar"))?;
        bar.style().set_property("width", entry.bar_width())?;
        bar.set_text_content(Some(entry.bar_width()));
        bar_container.append_child(&bar)?;

        info.append_child(&label)?;
        info.append_child(&caption)?;
        info.append_child(&bar_container)?;

        let emoji = self.div(Some("emoji"))?;
        emoji.set_text_content(Some(entry.emoji()));

        block.append_child(&thumb)?;
        block.append_child(&info)?;
        block.append_child(&emoji)?;
        Ok(block.into())
    }
}

impl ResultSink<HtmlCanvasElement> for DomResultSink {
    fn clear(&self) {
        self.container.set_inner_html("");
    }

    fn append(&self, entry: PreviewEntry<HtmlCanvasElement>) -> Result<(), String> {
        let block = self.build_block(&entry).map_err(|e| format!("{:?}", e))?;
        self.container
            .append_child(&block)
            .map_err(|e| format!("{:?}", e))?;
        Ok(())
    }
}

/// Shows failures with `window.alert`.
pub struct AlertNotifier {
    window: Window,
}

impl AlertNotifier {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Notifier for AlertNotifier {
    fn alert(&self, message: &str) {
        if let Err(e) = self.window.alert_with_message(message) {
            log::error!("Failed to show alert '{}': {:?}", message, e);
        }
    }
}
