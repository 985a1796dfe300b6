//! Host transports available to a page running inside a WebView or iframe.
//!
//! Channels are looked up on every call: shells commonly inject their
//! bridge objects after the page has loaded.

use js_sys::{Function, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Window;

use weft_surface_core::{HeightChannel, HostTransport, SurfaceError};

/// Native bridge object injected by Flutter's in-app WebView.
const NATIVE_BRIDGE: &str = "flutter_inappwebview";
/// Global object registered by JavaFX-style hosts.
const STATE_CALLBACK: &str = "editorCallback";

fn transport_error(e: JsValue) -> SurfaceError {
    SurfaceError::Transport(format!("{e:?}"))
}

/// Walk a property path from `start`, stopping at `undefined` or `null`.
fn lookup(start: &JsValue, path: &[&str]) -> Option<JsValue> {
    let mut current = start.clone();
    for key in path {
        current = Reflect::get(&current, &JsValue::from_str(key)).ok()?;
        if current.is_undefined() || current.is_null() {
            return None;
        }
    }
    Some(current)
}

/// Transports reachable from the page's window.
#[derive(Debug, Clone)]
pub struct BrowserHost {
    window: Window,
}

impl Default for BrowserHost {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserHost {
    pub fn new() -> Self {
        Self {
            window: gloo_utils::window(),
        }
    }

    /// The bridge object and its `callHandler` function.
    fn native_bridge(&self) -> Option<(JsValue, Function)> {
        let bridge = lookup(&self.window, &[NATIVE_BRIDGE])?;
        let call = lookup(&bridge, &["callHandler"])?.dyn_into::<Function>().ok()?;
        Some((bridge, call))
    }

    fn call_native(&self, handler: &str, value: f64) -> Result<(), SurfaceError> {
        let (bridge, call) = self
            .native_bridge()
            .ok_or(SurfaceError::NoTransport("native bridge"))?;
        call.call2(&bridge, &JsValue::from_str(handler), &JsValue::from_f64(value))
            .map(|_| ())
            .map_err(transport_error)
    }

    /// `window.webkit.messageHandlers.contentHeight`
    fn message_handler(&self) -> Option<JsValue> {
        lookup(&self.window, &["webkit", "messageHandlers", "contentHeight"])
    }

    /// The parent window, when this page is framed.
    fn parent_window(&self) -> Option<Window> {
        let parent = self.window.parent().ok()??;
        (!Object::is(&parent, &self.window)).then_some(parent)
    }

    fn state_callback(&self) -> Option<JsValue> {
        lookup(&self.window, &[STATE_CALLBACK])
    }
}

impl HostTransport for BrowserHost {
    fn has_height_channel(&self, channel: HeightChannel) -> bool {
        match channel {
            HeightChannel::NativeBridge => self.native_bridge().is_some(),
            HeightChannel::MessageHandler => self.message_handler().is_some(),
            HeightChannel::ParentWindow => self.parent_window().is_some(),
        }
    }

    fn post_height(&mut self, channel: HeightChannel, height: f64) -> Result<(), SurfaceError> {
        tracing::trace!(target: "weft::height", ?channel, height, "posting height");
        match channel {
            HeightChannel::NativeBridge => self.call_native("contentHeight", height),
            HeightChannel::MessageHandler => {
                let handler = self
                    .message_handler()
                    .ok_or(SurfaceError::NoTransport("message handler"))?;
                let post = lookup(&handler, &["postMessage"])
                    .and_then(|f| f.dyn_into::<Function>().ok())
                    .ok_or(SurfaceError::NoTransport("message handler"))?;
                post.call1(&handler, &JsValue::from_f64(height))
                    .map(|_| ())
                    .map_err(transport_error)
            }
            HeightChannel::ParentWindow => {
                let parent = self
                    .parent_window()
                    .ok_or(SurfaceError::NoTransport("parent window"))?;
                let message = Object::new();
                Reflect::set(&message, &"type".into(), &"contentHeight".into())
                    .map_err(transport_error)?;
                Reflect::set(&message, &"height".into(), &JsValue::from_f64(height))
                    .map_err(transport_error)?;
                parent
                    .post_message(&message, "*")
                    .map_err(transport_error)
            }
        }
    }

    fn has_state_callback(&self) -> bool {
        self.state_callback().is_some()
    }

    fn notify_state_changed(&mut self, changed: bool) -> Result<(), SurfaceError> {
        let callback = self
            .state_callback()
            .ok_or(SurfaceError::NoTransport("editor state callback"))?;
        let update = lookup(&callback, &["updateEditorState"])
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or(SurfaceError::NoTransport("editor state callback"))?;
        // Delivered after the surface borrow is released, so the host may
        // call straight back into the surface from its callback.
        crate::scheduler::defer(0, move || {
            if let Err(e) = update.call1(&callback, &JsValue::from_bool(changed)) {
                tracing::warn!(target: "weft::state", error = ?e, "editor state callback threw");
            }
        });
        Ok(())
    }

    fn open_state_url(&mut self, url: &str) -> Result<(), SurfaceError> {
        self.window
            .location()
            .set_href(url)
            .map_err(transport_error)
    }

    fn forward_edge_scroll(&mut self, delta: f64) -> Result<(), SurfaceError> {
        self.call_native("edgeScroll", delta)
    }
}
