use std::cell::RefCell;

use moodlens_core::{BatchPipeline, ClientConfig};
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, HtmlInputElement};

use crate::canvas_decoder::CanvasDecoder;
use crate::controller::{UploadController, WebPipeline};
use crate::dom_sink::{AlertNotifier, DomResultSink};
use crate::error::MountError;
use crate::fetch_predictor::FetchPredictor;

/// ID of the optional inline `<script type="application/json">` config.
const CONFIG_ELEMENT_ID: &str = "moodlens-config";

thread_local! {
    /// The mounted controller. Lives for the lifetime of the page.
    static CONTROLLER: RefCell<Option<UploadController>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let config = load_config();
    if let Err(e) = console_log::init_with_level(config.log_level.to_level()) {
        web_sys::console::warn_1(&format!("Logger already initialised: {}", e).into());
    }

    match mount(&config) {
        Ok(controller) => {
            CONTROLLER.with(|slot| *slot.borrow_mut() = Some(controller));
            log::info!("MoodLens ready, predictions go to {}", config.endpoint);
        }
        Err(e) => log::error!("MoodLens failed to start: {}", e),
    }
}

/// Detach from the page. Results already rendered stay in place.
#[wasm_bindgen]
pub fn unmount() {
    if CONTROLLER.with(|slot| slot.borrow_mut().take()).is_some() {
        log::info!("MoodLens detached");
    }
}

fn load_config() -> ClientConfig {
    let json = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(CONFIG_ELEMENT_ID))
        .and_then(|element| element.text_content());
    ClientConfig::from_json_or_default(json.as_deref())
}

fn mount(config: &ClientConfig) -> Result<UploadController, MountError> {
    let window = web_sys::window().ok_or(MountError::NoWindow)?;
    let document = window.document().ok_or(MountError::NoDocument)?;

    let ids = &config.elements;
    let drop_area: HtmlElement = element_by_id(&document, &ids.drop_area, "HTML element")?;
    let file_input: HtmlInputElement = element_by_id(&document, &ids.file_input, "file input")?;
    let preview = document
        .get_element_by_id(&ids.preview)
        .ok_or_else(|| MountError::MissingElement {
            id: ids.preview.clone(),
        })?;

    let pipeline: WebPipeline = BatchPipeline::new(
        CanvasDecoder::new(document.clone(), config.thumbnail_size),
        FetchPredictor::new(window.clone(), &config.endpoint, &config.form_field),
        DomResultSink::new(document, preview, config.display_width),
        AlertNotifier::new(window),
        config,
    );

    Ok(UploadController::mount(drop_area, file_input, pipeline))
}

fn element_by_id<T: JsCast>(
    document: &Document,
    id: &str,
    expected: &'static str,
) -> Result<T, MountError> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| MountError::MissingElement { id: id.to_string() })?
        .dyn_into::<T>()
        .map_err(|_| MountError::WrongElementType {
            id: id.to_string(),
            expected,
        })
}
