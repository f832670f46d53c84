//! Browser session for one flow
//!
//! Owns a [`FlowController`] behind `Rc<RefCell<_>>`. Every user action or
//! async completion becomes an [`Event`]; the returned effects are carried
//! out here with the controller borrow already released, because some of
//! them (a programmatic picker click, a render callback) can re-enter the
//! session synchronously.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use pdftools_core::{
    CandidateFile, ClientConfig, Clock, Effect, Event, FlowController, FlowKind, InputShape,
    LopdfPageCounter, PageCount, PageCountError, PageCounter, SplitMode, TimerId, TimerKind,
    DRAG_ACTIVE_CLASS,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{File, FileList, HtmlElement, HtmlInputElement, Url};

use crate::dropzone::{self, ZoneBinding};
use crate::timers::{self, Timer};
use crate::{download, fetch};

pub(crate) type SharedSession = Rc<RefCell<Shared>>;

/// Epoch milliseconds from the JS clock
struct JsClock;

impl Clock for JsClock {
    fn now_ms(&self) -> i64 {
        js_sys::Date::now() as i64
    }
}

pub(crate) struct Shared {
    controller: FlowController<File>,
    api_base: String,
    timers: HashMap<TimerId, Timer>,
    render: Option<js_sys::Function>,
    preview: Option<js_sys::Function>,
    preview_url: Option<String>,
    zone: Option<ZoneBinding>,
}

/// Stateful session for one flow on the page
#[wasm_bindgen]
pub struct ToolSession {
    shared: SharedSession,
}

#[wasm_bindgen]
impl ToolSession {
    /// Create a session for `flow` ("merge", "split", "images-to-pdf" or
    /// "compress-image"). `config` may override any limit or delay.
    #[wasm_bindgen(constructor)]
    pub fn new(flow: &str, config: JsValue) -> Result<ToolSession, JsValue> {
        let flow: FlowKind = flow.parse().map_err(|e: String| JsValue::from_str(&e))?;
        let config: ClientConfig = if config.is_undefined() || config.is_null() {
            ClientConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };

        let controller = FlowController::new(flow, config).with_clock(Box::new(JsClock));
        Ok(Self {
            shared: Rc::new(RefCell::new(Shared {
                controller,
                api_base: String::new(),
                timers: HashMap::new(),
                render: None,
                preview: None,
                preview_url: None,
                zone: None,
            })),
        })
    }

    #[wasm_bindgen(getter)]
    pub fn flow(&self) -> String {
        self.shared.borrow().controller.flow().as_str().to_string()
    }

    /// Prefix for endpoint paths. Empty means same origin.
    #[wasm_bindgen(js_name = setApiBase)]
    pub fn set_api_base(&self, base: &str) {
        self.shared.borrow_mut().api_base = base.trim_end_matches('/').to_string();
    }

    /// Callback signature: (view: object) => void
    /// Called after every state change.
    #[wasm_bindgen(js_name = setRenderCallback)]
    pub fn set_render_callback(&self, callback: js_sys::Function) {
        self.shared.borrow_mut().render = Some(callback);
        render(&self.shared);
    }

    /// Callback signature: (objectUrl: string, name: string) => void
    #[wasm_bindgen(js_name = setPreviewCallback)]
    pub fn set_preview_callback(&self, callback: js_sys::Function) {
        self.shared.borrow_mut().preview = Some(callback);
    }

    /// Wire drag/drop, click-to-browse and picker changes
    #[wasm_bindgen(js_name = attachDropZone)]
    pub fn attach_drop_zone(
        &self,
        zone: HtmlElement,
        picker: HtmlInputElement,
    ) -> Result<(), JsValue> {
        let flow = self.shared.borrow().controller.flow();
        picker.set_accept(flow.picker_accept());
        picker.set_multiple(matches!(flow.shape(), InputShape::List { .. }));

        let binding = dropzone::bind(Rc::downgrade(&self.shared), zone, picker)?;
        // Replacing a binding drops the old listeners
        let previous = self.shared.borrow_mut().zone.replace(binding);
        drop(previous);
        Ok(())
    }

    /// Add files from any `FileList`, e.g. an `<input type=file>`
    #[wasm_bindgen(js_name = addFiles)]
    pub fn add_files(&self, files: &FileList) {
        dispatch(&self.shared, Event::FilesChosen(candidates(files)));
    }

    #[wasm_bindgen(js_name = removeFile)]
    pub fn remove_file(&self, index: usize) {
        dispatch(&self.shared, Event::RemoveFile(index));
    }

    /// "all", "pages" or "ranges"
    #[wasm_bindgen(js_name = setSplitMode)]
    pub fn set_split_mode(&self, mode: &str) -> Result<(), JsValue> {
        let mode: SplitMode = mode.parse().map_err(|e: String| JsValue::from_str(&e))?;
        dispatch(&self.shared, Event::SetSplitMode(mode));
        Ok(())
    }

    #[wasm_bindgen(js_name = setPages)]
    pub fn set_pages(&self, pages: &str) {
        dispatch(&self.shared, Event::SetPages(pages.to_string()));
    }

    #[wasm_bindgen(js_name = setRanges)]
    pub fn set_ranges(&self, ranges: &str) {
        dispatch(&self.shared, Event::SetRanges(ranges.to_string()));
    }

    #[wasm_bindgen(js_name = setQuality)]
    pub fn set_quality(&self, quality: u8) {
        dispatch(&self.shared, Event::SetQuality(quality));
    }

    /// Run the flow's action. Ignored while a transfer is running.
    pub fn execute(&self) {
        dispatch(&self.shared, Event::Execute);
    }

    pub fn reset(&self) {
        dispatch(&self.shared, Event::Reset);
    }

    #[wasm_bindgen(js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.shared.borrow().controller.is_busy()
    }

    /// Current view as a plain object
    pub fn view(&self) -> Result<JsValue, JsValue> {
        let view = self.shared.borrow().controller.view();
        serde_wasm_bindgen::to_value(&view)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

impl Drop for ToolSession {
    fn drop(&mut self) {
        let mut shared = self.shared.borrow_mut();
        for (_, timer) in shared.timers.drain() {
            timers::cancel(timer);
        }
        if let Some(url) = shared.preview_url.take() {
            let _ = Url::revoke_object_url(&url);
        }
        shared.zone = None;
    }
}

pub(crate) fn candidates(files: &FileList) -> Vec<CandidateFile<File>> {
    (0..files.length())
        .filter_map(|i| files.get(i))
        .map(|file| CandidateFile::new(file.name(), file.size() as u64, file.type_(), file))
        .collect()
}

/// Feed one event to the controller, run its effects, then re-render
pub(crate) fn dispatch(session: &SharedSession, event: Event<File>) {
    let effects = {
        let mut shared = session.borrow_mut();
        if let Event::TimerFired(id) = &event {
            if id.kind != TimerKind::ProgressTick {
                shared.timers.remove(id);
            }
        }
        shared.controller.handle(event)
    };

    for effect in effects {
        if let Err(e) = run_effect(session, effect) {
            web_sys::console::error_1(&e);
        }
    }

    render(session);
}

fn run_effect(session: &SharedSession, effect: Effect<File>) -> Result<(), JsValue> {
    match effect {
        Effect::Alert(message) => {
            if let Some(window) = web_sys::window() {
                window.alert_with_message(&message)?;
            }
        }
        Effect::ClearPicker => {
            let picker = session.borrow().zone.as_ref().map(|z| z.picker.clone());
            if let Some(picker) = picker {
                picker.set_value("");
            }
        }
        Effect::OpenPicker => {
            let picker = session.borrow().zone.as_ref().map(|z| z.picker.clone());
            if let Some(picker) = picker {
                picker.click();
            }
        }
        Effect::ShowPreview(file) => {
            let url = Url::create_object_url_with_blob(&file.handle)?;
            let (previous, callback) = {
                let mut shared = session.borrow_mut();
                (shared.preview_url.replace(url.clone()), shared.preview.clone())
            };
            if let Some(previous) = previous {
                Url::revoke_object_url(&previous)?;
            }
            if let Some(callback) = callback {
                callback.call2(
                    &JsValue::NULL,
                    &JsValue::from_str(&url),
                    &JsValue::from_str(&file.name),
                )?;
            }
        }
        Effect::ResolvePageCount { generation, file } => {
            let weak = Rc::downgrade(session);
            spawn_local(async move {
                let count = page_count(&file.handle).await;
                if let Some(session) = weak.upgrade() {
                    dispatch(&session, Event::PageCountResolved { generation, count });
                }
            });
        }
        Effect::StartTimer { id, after, repeat } => {
            let timer = timers::start(Rc::downgrade(session), id, after, repeat)?;
            let previous = session.borrow_mut().timers.insert(id, timer);
            if let Some(previous) = previous {
                timers::cancel(previous);
            }
        }
        Effect::CancelTimer(id) => {
            let timer = session.borrow_mut().timers.remove(&id);
            if let Some(timer) = timer {
                timers::cancel(timer);
            }
        }
        Effect::Send {
            transfer,
            request,
            timeout,
        } => {
            let api_base = session.borrow().api_base.clone();
            let weak = Rc::downgrade(session);
            spawn_local(async move {
                let outcome = fetch::send(&api_base, request, timeout).await;
                if let Some(session) = weak.upgrade() {
                    dispatch(&session, Event::TransferFinished { transfer, outcome });
                }
            });
        }
        Effect::Download { filename, bytes } => {
            download::trigger_download(&filename, &bytes)?;
        }
    }
    Ok(())
}

/// Hand the current view to the page and sync the drop-zone highlight
fn render(session: &SharedSession) {
    let (view, callback, zone) = {
        let shared = session.borrow();
        (
            shared.controller.view(),
            shared.render.clone(),
            shared.zone.as_ref().map(|z| z.zone.clone()),
        )
    };

    if let Some(zone) = zone {
        let _ = zone
            .class_list()
            .toggle_with_force(DRAG_ACTIVE_CLASS, view.drag_active);
    }

    if let Some(callback) = callback {
        match serde_wasm_bindgen::to_value(&view) {
            Ok(value) => {
                if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                    web_sys::console::error_1(&e);
                }
            }
            Err(e) => web_sys::console::error_1(&JsValue::from_str(&e.to_string())),
        }
    }
}

async fn page_count(file: &File) -> PageCount {
    let result = match JsFuture::from(file.array_buffer()).await {
        Ok(buffer) => {
            let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
            LopdfPageCounter.page_count(&bytes)
        }
        Err(e) => Err(PageCountError::ReadError(format!("{:?}", e))),
    };
    PageCount::from_result(result)
}

#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_session_creation() {
        let session = ToolSession::new("merge", JsValue::UNDEFINED).unwrap();
        assert_eq!(session.flow(), "merge");
        assert!(!session.is_busy());
    }

    #[wasm_bindgen_test]
    fn test_unknown_flow_is_rejected() {
        assert!(ToolSession::new("rotate", JsValue::UNDEFINED).is_err());
    }

    #[wasm_bindgen_test]
    fn test_execute_without_files_shows_status() {
        let session = ToolSession::new("merge", JsValue::NULL).unwrap();
        session.execute();
        assert!(!session.is_busy());

        let view = session.view().unwrap();
        let status = js_sys::Reflect::get(&view, &"status".into()).unwrap();
        let visible = js_sys::Reflect::get(&status, &"visible".into()).unwrap();
        assert_eq!(visible.as_bool(), Some(true));
    }

    #[wasm_bindgen_test]
    fn test_invalid_split_mode() {
        let session = ToolSession::new("split", JsValue::UNDEFINED).unwrap();
        assert!(session.set_split_mode("odd").is_err());
        assert!(session.set_split_mode("ranges").is_ok());
    }
}
