//! Upload-and-preview controller.
//!
//! Wires drag/drop on the drop area and `change` on the file input to the
//! batch pipeline. The elements are handed in by the caller; nothing here
//! looks them up globally.

use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions};
use moodlens_core::BatchPipeline;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{DragEvent, Event, HtmlElement, HtmlInputElement};

use crate::browser_file::BrowserFile;
use crate::canvas_decoder::CanvasDecoder;
use crate::dom_sink::{AlertNotifier, DomResultSink};
use crate::fetch_predictor::FetchPredictor;

/// Class toggled on the drop area while something is dragged over it.
pub const HOVER_CLASS: &str = "hover";

/// The pipeline as assembled for the browser.
pub type WebPipeline = BatchPipeline<CanvasDecoder, FetchPredictor, DomResultSink, AlertNotifier>;

/// Owns the listeners; dropping the controller detaches it from the page.
pub struct UploadController {
    _listeners: Vec<EventListener>,
}

impl UploadController {
    /// Attach to `drop_area` and `file_input`.
    pub fn mount(
        drop_area: HtmlElement,
        file_input: HtmlInputElement,
        pipeline: WebPipeline,
    ) -> Self {
        let pipeline = Rc::new(pipeline);
        let mut listeners = Vec::with_capacity(5);

        // Drag listeners must not be passive or the browser opens the file
        let active = EventListenerOptions::enable_prevent_default();

        for event in ["dragenter", "dragover"] {
            let area = drop_area.clone();
            listeners.push(EventListener::new_with_options(
                &drop_area,
                event,
                active,
                move |e: &Event| {
                    e.prevent_default();
                    set_hover(&area, true);
                },
            ));
        }

        let area = drop_area.clone();
        listeners.push(EventListener::new_with_options(
            &drop_area,
            "dragleave",
            active,
            move |e: &Event| {
                e.prevent_default();
                set_hover(&area, false);
            },
        ));

        let area = drop_area.clone();
        let on_drop = Rc::clone(&pipeline);
        listeners.push(EventListener::new_with_options(
            &drop_area,
            "drop",
            active,
            move |e: &Event| {
                e.prevent_default();
                set_hover(&area, false);

                let files = e
                    .dyn_ref::<DragEvent>()
                    .and_then(DragEvent::data_transfer)
                    .and_then(|transfer| transfer.files())
                    .map(|list| BrowserFile::from_list(&list))
                    .unwrap_or_default();
                log::info!("Dropped {} file(s)", files.len());
                submit(&on_drop, files);
            },
        ));

        let input = file_input.clone();
        listeners.push(EventListener::new(&file_input, "change", move |_| {
            let files = input
                .files()
                .map(|list| BrowserFile::from_list(&list))
                .unwrap_or_default();
            log::info!("Selected {} file(s)", files.len());
            submit(&pipeline, files);
        }));

        log::info!("Upload controller attached");
        Self {
            _listeners: listeners,
        }
    }
}

fn set_hover(area: &HtmlElement, on: bool) {
    let classes = area.class_list();
    let result = if on {
        classes.add_1(HOVER_CLASS)
    } else {
        classes.remove_1(HOVER_CLASS)
    };
    if let Err(e) = result {
        log::warn!("Failed to toggle '{}' class: {:?}", HOVER_CLASS, e);
    }
}

/// Start a batch on the event loop. A newer batch supersedes it.
fn submit(pipeline: &Rc<WebPipeline>, files: Vec<BrowserFile>) {
    let pipeline = Rc::clone(pipeline);
    spawn_local(async move {
        pipeline.run(files).await;
    });
}
