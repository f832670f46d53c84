//! DOM listeners for a drop zone and its hidden file input

use std::cell::RefCell;
use std::rc::Weak;

use pdftools_core::{ClickTarget, Event, ZoneEvent};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{DragEvent, Element, EventTarget, HtmlElement, HtmlInputElement};

use crate::session::{candidates, dispatch, Shared};

// `Fn` so a programmatic picker click may re-enter the zone listener
type Listener = Closure<dyn Fn(web_sys::Event)>;

/// Keeps the listeners alive and removes them when dropped
pub(crate) struct ZoneBinding {
    pub zone: HtmlElement,
    pub picker: HtmlInputElement,
    listeners: Vec<(EventTarget, &'static str, Listener)>,
}

impl Drop for ZoneBinding {
    fn drop(&mut self) {
        for (target, kind, listener) in &self.listeners {
            let _ = target
                .remove_event_listener_with_callback(kind, listener.as_ref().unchecked_ref());
        }
    }
}

pub(crate) fn bind(
    session: Weak<RefCell<Shared>>,
    zone: HtmlElement,
    picker: HtmlInputElement,
) -> Result<ZoneBinding, JsValue> {
    let mut binding = ZoneBinding {
        zone: zone.clone(),
        picker: picker.clone(),
        listeners: Vec::new(),
    };
    let zone_target: EventTarget = zone.clone().into();
    let picker_target: EventTarget = picker.clone().into();

    for kind in ["dragenter", "dragover", "dragleave", "drop"] {
        let session = session.clone();
        let listener = Listener::new(move |event: web_sys::Event| {
            event.prevent_default();
            let zone_event = match kind {
                "dragenter" => ZoneEvent::DragEnter,
                "dragover" => ZoneEvent::DragOver,
                "dragleave" => ZoneEvent::DragLeave,
                _ => ZoneEvent::Drop(dropped_files(&event)),
            };
            emit(&session, zone_event);
        });
        listen(&mut binding, &zone_target, kind, listener)?;
    }

    let click_session = session.clone();
    let click_zone = zone.clone();
    let on_click = Listener::new(move |event: web_sys::Event| {
        let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        let node: &web_sys::Node = &target;
        let is_zone = click_zone.is_same_node(Some(node));
        let classes = class_names(&target);
        let click = ClickTarget::classify(is_zone, classes.iter().map(String::as_str));
        emit(&click_session, ZoneEvent::Click(click));
    });
    listen(&mut binding, &zone_target, "click", on_click)?;

    let change_picker = picker.clone();
    let on_change = Listener::new(move |_event: web_sys::Event| {
        let files = change_picker
            .files()
            .map(|list| candidates(&list))
            .unwrap_or_default();
        emit(&session, ZoneEvent::PickerChanged(files));
    });
    listen(&mut binding, &picker_target, "change", on_change)?;

    Ok(binding)
}

fn listen(
    binding: &mut ZoneBinding,
    target: &EventTarget,
    kind: &'static str,
    listener: Listener,
) -> Result<(), JsValue> {
    target.add_event_listener_with_callback(kind, listener.as_ref().unchecked_ref())?;
    binding.listeners.push((target.clone(), kind, listener));
    Ok(())
}

fn emit(
    session: &Weak<RefCell<Shared>>,
    event: ZoneEvent<pdftools_core::CandidateFile<web_sys::File>>,
) {
    if let Some(session) = session.upgrade() {
        dispatch(&session, Event::Zone(event));
    }
}

fn dropped_files(event: &web_sys::Event) -> Vec<pdftools_core::CandidateFile<web_sys::File>> {
    event
        .dyn_ref::<DragEvent>()
        .and_then(DragEvent::data_transfer)
        .and_then(|transfer| transfer.files())
        .map(|list| candidates(&list))
        .unwrap_or_default()
}

fn class_names(element: &Element) -> Vec<String> {
    let list = element.class_list();
    (0..list.length()).filter_map(|i| list.item(i)).collect()
}
