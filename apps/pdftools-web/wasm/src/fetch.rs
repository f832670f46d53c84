//! Multipart POST with `fetch` and an optional abort timeout

use std::time::Duration;

use pdftools_core::{FormPart, TransferOutcome, TransferRequest};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, File, FormData, Request, RequestInit, Response, Window};

/// Send the request and classify what happened. Never fails: every error
/// becomes a `TimedOut` or `NetworkFailure` outcome.
pub(crate) async fn send(
    api_base: &str,
    request: TransferRequest<File>,
    timeout: Option<Duration>,
) -> TransferOutcome {
    match AbortController::new() {
        Ok(controller) => send_with(&controller, api_base, &request, timeout).await,
        Err(e) => TransferOutcome::NetworkFailure(describe(&e)),
    }
}

async fn send_with(
    controller: &AbortController,
    api_base: &str,
    request: &TransferRequest<File>,
    timeout: Option<Duration>,
) -> TransferOutcome {
    match post(api_base, request, controller, timeout).await {
        Ok(outcome) => outcome,
        Err(_) if controller.signal().aborted() => TransferOutcome::TimedOut,
        Err(e) => TransferOutcome::NetworkFailure(describe(&e)),
    }
}

fn form_data(request: &TransferRequest<File>) -> Result<FormData, JsValue> {
    let form = FormData::new()?;
    for part in &request.parts {
        match part {
            FormPart::File { field, file } => {
                form.append_with_blob_and_filename(field, &file.handle, &file.name)?
            }
            FormPart::Text { field, value } => form.append_with_str(field, value)?,
        }
    }
    Ok(form)
}

async fn post(
    api_base: &str,
    request: &TransferRequest<File>,
    controller: &AbortController,
    timeout: Option<Duration>,
) -> Result<TransferOutcome, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;

    let opts = RequestInit::new();
    opts.set_method("POST");
    let form = form_data(request)?;
    opts.set_body(&form);
    opts.set_signal(Some(&controller.signal()));

    let url = format!("{}{}", api_base, request.path());
    let fetch_request = Request::new_with_str_and_init(&url, &opts)?;

    // The abort covers reading the body too
    let abort_timer = match timeout {
        Some(limit) => {
            let controller = controller.clone();
            let abort = Closure::once_into_js(move || controller.abort());
            Some(window.set_timeout_with_callback_and_timeout_and_arguments_0(
                abort.unchecked_ref(),
                limit.as_millis().min(i32::MAX as u128) as i32,
            )?)
        }
        None => None,
    };

    let result = read_response(&window, &fetch_request).await;

    if let Some(handle) = abort_timer {
        window.clear_timeout_with_handle(handle);
    }
    result
}

async fn read_response(window: &Window, request: &Request) -> Result<TransferOutcome, JsValue> {
    let response = JsFuture::from(window.fetch_with_request(request)).await?;
    let response: Response = response.dyn_into()?;
    let status = response.status();

    let buffer = JsFuture::from(response.array_buffer()?).await?;
    let body = js_sys::Uint8Array::new(&buffer).to_vec();

    Ok(TransferOutcome::Response { status, body })
}

fn describe(error: &JsValue) -> String {
    error
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| error.as_string())
        .unwrap_or_else(|| format!("{:?}", error))
}

#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use pdftools_core::FlowKind;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    async fn test_aborted_request_is_a_timeout() {
        let controller = AbortController::new().unwrap();
        controller.abort();
        let request = TransferRequest::new(FlowKind::Merge);

        let outcome = send_with(&controller, "http://127.0.0.1:9", &request, None).await;
        assert!(matches!(outcome, TransferOutcome::TimedOut));
    }

    #[wasm_bindgen_test]
    async fn test_unreachable_server_is_a_network_failure() {
        let controller = AbortController::new().unwrap();
        let request = TransferRequest::new(FlowKind::Merge);

        let outcome = send_with(&controller, "http://127.0.0.1:9", &request, None).await;
        assert!(matches!(outcome, TransferOutcome::NetworkFailure(_)));
    }
}
