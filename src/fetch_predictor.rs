//! Prediction requests over `fetch`.

use std::future::Future;

use moodlens_core::prediction::{error_message, parse_prediction};
use moodlens_core::{PredictError, Prediction, Predictor, SelectedFile};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{FormData, Request, RequestInit, Response, Window};

use crate::browser_file::BrowserFile;

/// POSTs the original file as multipart form data.
pub struct FetchPredictor {
    window: Window,
    endpoint: String,
    form_field: String,
}

fn transport(e: JsValue) -> PredictError {
    PredictError::Transport(format!("{:?}", e))
}

impl FetchPredictor {
    pub fn new(window: Window, endpoint: impl Into<String>, form_field: impl Into<String>) -> Self {
        Self {
            window,
            endpoint: endpoint.into(),
            form_field: form_field.into(),
        }
    }

    async fn post(&self, file: &BrowserFile) -> Result<Prediction, PredictError> {
        let form = FormData::new().map_err(transport)?;
        form.append_with_blob_and_filename(&self.form_field, file.as_file(), &file.name())
            .map_err(transport)?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_body(&form);
        let request = Request::new_with_str_and_init(&self.endpoint, &init).map_err(transport)?;

        log::debug!("POST {} with '{}'", self.endpoint, file.name());
        let response: Response = JsFuture::from(self.window.fetch_with_request(&request))
            .await
            .map_err(transport)?
            .dyn_into()
            .map_err(transport)?;

        if !response.ok() {
            let message = read_text(&response)
                .await
                .ok()
                .and_then(|body| error_message(&body));
            return Err(PredictError::Status {
                status: response.status(),
                message,
            });
        }
        let body = read_text(&response).await?;
        parse_prediction(&body)
    }
}

async fn read_text(response: &Response) -> Result<String, PredictError> {
    let text = JsFuture::from(response.text().map_err(transport)?)
        .await
        .map_err(transport)?;
    Ok(text.as_string().unwrap_or_default())
}

impl Predictor<BrowserFile> for FetchPredictor {
    fn predict(
        &self,
        file: &BrowserFile,
    ) -> impl Future<Output = Result<Prediction, PredictError>> {
        self.post(file)
    }
}
