//! `setTimeout` / `setInterval` timers reporting back as `TimerFired`

use std::cell::RefCell;
use std::rc::Weak;
use std::time::Duration;

use pdftools_core::{Event, TimerId};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::session::{dispatch, Shared};

pub(crate) enum Timer {
    /// One-shot; the callback frees itself after running
    Once { handle: i32 },
    /// Repeating; the callback must outlive the interval
    Repeating {
        handle: i32,
        callback: Closure<dyn FnMut()>,
    },
}

fn window() -> Result<web_sys::Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("No window"))
}

fn millis(after: Duration) -> i32 {
    after.as_millis().min(i32::MAX as u128) as i32
}

pub(crate) fn start(
    session: Weak<RefCell<Shared>>,
    id: TimerId,
    after: Duration,
    repeat: bool,
) -> Result<Timer, JsValue> {
    let window = window()?;

    if repeat {
        let callback = Closure::<dyn FnMut()>::new(move || {
            if let Some(session) = session.upgrade() {
                dispatch(&session, Event::TimerFired(id));
            }
        });
        let handle = window.set_interval_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            millis(after),
        )?;
        Ok(Timer::Repeating { handle, callback })
    } else {
        let callback = Closure::once_into_js(move || {
            if let Some(session) = session.upgrade() {
                dispatch(&session, Event::TimerFired(id));
            }
        });
        let handle = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            millis(after),
        )?;
        Ok(Timer::Once { handle })
    }
}

pub(crate) fn cancel(timer: Timer) {
    let Ok(window) = window() else {
        return;
    };
    match timer {
        Timer::Once { handle } => window.clear_timeout_with_handle(handle),
        Timer::Repeating { handle, callback } => {
            window.clear_interval_with_handle(handle);
            // Cancellation may happen inside this very callback, so it is
            // freed on the next microtask rather than here.
            wasm_bindgen_futures::spawn_local(async move {
                drop(callback);
            });
        }
    }
}
