//! Frames and timers on the browser event loop.

use std::cell::RefCell;
use std::rc::Weak;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use weft_surface_core::{Scheduler, TimerToken};

use crate::BrowserSurface;

/// Weak handle callbacks use to reach their surface.
pub type SurfaceRef = Weak<RefCell<BrowserSurface>>;

/// Run `f` against the surface.
///
/// Native commands can fire DOM events synchronously while the surface is
/// already borrowed; such events are retried on a zero-delay timer. Events
/// for a surface that has been dropped are discarded.
pub fn dispatch<F>(target: &SurfaceRef, f: F)
where
    F: FnOnce(&mut BrowserSurface) + 'static,
{
    let Some(cell) = target.upgrade() else {
        return;
    };
    match cell.try_borrow_mut() {
        Ok(mut surface) => f(&mut surface),
        Err(_) => {
            tracing::trace!("surface busy, deferring event");
            let target = target.clone();
            defer(0, move || dispatch(&target, f));
        }
    }
}

/// Run `f` once after `delay_ms`.
pub fn defer<F>(delay_ms: u32, f: F)
where
    F: FnOnce() + 'static,
{
    let callback = Closure::once(f);
    let scheduled = gloo_utils::window()
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            delay_ms as i32,
        );
    match scheduled {
        Ok(_) => callback.forget(),
        Err(e) => tracing::warn!(error = ?e, "setTimeout failed"),
    }
}

/// Scheduler backed by `requestAnimationFrame` and `setTimeout`.
pub struct BrowserScheduler {
    target: SurfaceRef,
    frame_fallback_ms: u32,
}

impl BrowserScheduler {
    pub fn new(target: SurfaceRef, frame_fallback_ms: u32) -> Self {
        Self {
            target,
            frame_fallback_ms,
        }
    }
}

impl Scheduler for BrowserScheduler {
    fn request_frame(&mut self) {
        let target = self.target.clone();
        let callback = Closure::once(move || dispatch(&target, |surface| surface.on_frame()));
        let window = gloo_utils::window();
        if window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .is_ok()
        {
            callback.forget();
            return;
        }

        tracing::debug!(
            target: "weft::height",
            delay_ms = self.frame_fallback_ms,
            "requestAnimationFrame unavailable, falling back to a timer"
        );
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            self.frame_fallback_ms as i32,
        ) {
            Ok(_) => callback.forget(),
            Err(e) => tracing::warn!(error = ?e, "could not schedule a frame"),
        }
    }

    fn set_timeout(&mut self, token: TimerToken, delay_ms: u32) {
        let target = self.target.clone();
        defer(delay_ms, move || {
            dispatch(&target, move |surface| surface.on_timer(token))
        });
    }
}
