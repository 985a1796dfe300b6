//! DOM event wiring.
//!
//! Every listener forwards to the matching `Surface` entry point through
//! [`dispatch`]. Only `keydown` needs an answer synchronously, so it borrows
//! directly and lets the platform act when the surface is busy.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions};
use wasm_bindgen::JsCast;
use web_sys::{
    ClipboardEvent, Element, HtmlElement, HtmlImageElement, HtmlInputElement, KeyboardEvent,
    Node, TouchEvent, WheelEvent,
};

use weft_surface_core::{ClipboardPayload, KeyInput, KeyOutcome};

use crate::BrowserSurface;
use crate::preview::PreviewOverlay;
use crate::scheduler::{SurfaceRef, dispatch};

/// Surface view of a keyboard event.
pub fn key_input(event: &KeyboardEvent) -> KeyInput {
    KeyInput {
        key: event.key().into(),
        ctrl: event.ctrl_key(),
        alt: event.alt_key(),
    }
}

/// Clipboard contents of a paste event. Empty flavours count as absent.
pub fn clipboard_payload(event: &ClipboardEvent) -> ClipboardPayload {
    let Some(data) = event.clipboard_data() else {
        return ClipboardPayload::default();
    };
    let read = |format: &str| data.get_data(format).ok().filter(|s| !s.is_empty());
    ClipboardPayload {
        html: read("text/html"),
        text: read("text/plain"),
    }
}

fn first_touch_y(event: &TouchEvent) -> Option<f64> {
    event.touches().get(0).map(|touch| touch.client_y() as f64)
}

/// Attach every listener the surface needs. Dropping the returned
/// listeners detaches them.
pub fn install(surface: &Rc<RefCell<BrowserSurface>>, root: &HtmlElement) -> Vec<EventListener> {
    let target: SurfaceRef = Rc::downgrade(surface);
    let document = gloo_utils::document();
    let mut listeners = Vec::new();

    let t = target.clone();
    listeners.push(EventListener::new(&document, "selectionchange", move |_| {
        dispatch(&t, |surface| surface.on_selection_change());
    }));

    let t = target.clone();
    listeners.push(EventListener::new_with_options(
        root,
        "keydown",
        EventListenerOptions::enable_prevent_default(),
        move |event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let Some(cell) = t.upgrade() else {
                return;
            };
            let outcome = match cell.try_borrow() {
                Ok(surface) => surface.on_key_down(&key_input(event)),
                Err(_) => KeyOutcome::Default,
            };
            if outcome == KeyOutcome::Suppress {
                event.prevent_default();
            }
        },
    ));

    let t = target.clone();
    listeners.push(EventListener::new(root, "keyup", move |event| {
        let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
            return;
        };
        let key = key_input(event);
        dispatch(&t, move |surface| surface.on_key_up(&key));
    }));

    let t = target.clone();
    listeners.push(EventListener::new(root, "input", move |_| {
        dispatch(&t, |surface| surface.on_input());
    }));

    let t = target.clone();
    listeners.push(EventListener::new(root, "cut", move |_| {
        dispatch(&t, |surface| surface.on_cut());
    }));

    let t = target.clone();
    listeners.push(EventListener::new(root, "paste", move |event| {
        let Some(event) = event.dyn_ref::<ClipboardEvent>() else {
            return;
        };
        let payload = clipboard_payload(event);
        dispatch(&t, move |surface| surface.on_paste(&payload));
    }));

    let t = target.clone();
    listeners.push(EventListener::new(root, "change", move |event| {
        let Some(input) = event
            .target()
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        else {
            return;
        };
        if input.type_() != "checkbox" {
            return;
        }
        let checked = input.checked();
        let node: Node = input.into();
        dispatch(&t, move |surface| surface.on_checkbox_toggled(&node, checked));
    }));

    let t = target.clone();
    listeners.push(EventListener::new(root, "wheel", move |event| {
        if let Some(event) = event.dyn_ref::<WheelEvent>() {
            let dy = event.delta_y();
            dispatch(&t, move |surface| surface.on_wheel(dy));
        }
    }));

    let t = target.clone();
    listeners.push(EventListener::new(root, "touchstart", move |event| {
        if let Some(y) = event.dyn_ref::<TouchEvent>().and_then(first_touch_y) {
            dispatch(&t, move |surface| surface.on_touch_start(y));
        }
    }));

    let t = target.clone();
    listeners.push(EventListener::new(root, "touchmove", move |event| {
        if let Some(y) = event.dyn_ref::<TouchEvent>().and_then(first_touch_y) {
            dispatch(&t, move |surface| surface.on_touch_move(y));
        }
    }));

    let t = target.clone();
    listeners.push(EventListener::new(&gloo_utils::window(), "resize", move |_| {
        dispatch(&t, |surface| surface.schedule_height(false));
    }));

    if let Some(preview) = PreviewOverlay::find(&document) {
        listeners.push(preview.listen_for_dismiss());
        listeners.push(EventListener::new(root, "click", move |event| {
            let image = event
                .target()
                .and_then(|el| el.dyn_into::<Element>().ok())
                .and_then(|el| el.dyn_into::<HtmlImageElement>().ok());
            if let Some(image) = image {
                preview.show(&image.src());
            }
        }));
    }

    tracing::debug!(count = listeners.len(), "surface listeners attached");
    listeners
}
