//! Browser DOM layer for the weft editing surface.
//!
//! Binds the core [`Surface`] to a live `contenteditable` element. It
//! assumes a `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `dom`: `SurfaceDocument` over `web-sys` nodes and `execCommand`
//! - `observer`: native `MutationObserver` to core mutation batches
//! - `host`: native bridge, message handler, parent window and state callback
//! - `scheduler`: `requestAnimationFrame` / `setTimeout` and event dispatch
//! - `events`: DOM listeners feeding the surface's event entry points
//! - `preview`: optional full-size image overlay
//!
//! # Re-exports
//!
//! This crate re-exports `weft-surface-core` for convenience, so consumers
//! only need to depend on `weft-surface-browser`.

use std::cell::{BorrowMutError, RefCell};
use std::rc::{Rc, Weak};

use gloo_events::EventListener;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

// Re-export core crate
pub use weft_surface_core;
pub use weft_surface_core::*;

pub mod dom;
pub mod events;
pub mod host;
pub mod observer;
pub mod preview;
pub mod scheduler;

pub use dom::DomDocument;
pub use host::BrowserHost;
pub use observer::DomObserver;
pub use scheduler::{BrowserScheduler, SurfaceRef, dispatch};

/// A surface bound to the live DOM.
pub type BrowserSurface = Surface<DomDocument, BrowserHost, BrowserScheduler>;

/// A mounted surface. Dropping it detaches every listener and the observer.
pub struct SurfaceHandle {
    surface: Rc<RefCell<BrowserSurface>>,
    _listeners: Vec<EventListener>,
}

impl SurfaceHandle {
    /// Run `f` against the surface.
    ///
    /// Fails when called re-entrantly, e.g. from a host callback that the
    /// surface itself is in the middle of invoking.
    pub fn with<R>(&self, f: impl FnOnce(&mut BrowserSurface) -> R) -> Result<R, BorrowMutError> {
        let mut surface = self.surface.try_borrow_mut()?;
        Ok(f(&mut surface))
    }

    pub fn downgrade(&self) -> SurfaceRef {
        Rc::downgrade(&self.surface)
    }
}

/// Mount a surface on `root` and run its initialization.
pub fn mount(root: HtmlElement, config: SurfaceConfig) -> Result<SurfaceHandle, JsValue> {
    let mut doc = DomDocument::new(root.clone())?;
    let frame_fallback_ms = config.frame_fallback_ms;

    let surface = Rc::new_cyclic(|weak: &Weak<RefCell<BrowserSurface>>| {
        let target = weak.clone();
        doc.set_load_sink(Rc::new(move |image| {
            dispatch(&target, move |surface| surface.on_image_loaded(&image));
        }));
        let scheduler = BrowserScheduler::new(weak.clone(), frame_fallback_ms);
        RefCell::new(Surface::new(doc, BrowserHost::new(), scheduler, config))
    });

    let target = Rc::downgrade(&surface);
    let observer = DomObserver::install(&root, move |batch| {
        dispatch(&target, move |surface| surface.process_mutations(batch));
    })?;
    surface.borrow_mut().document_mut().attach_observer(observer);

    let listeners = events::install(&surface, &root);
    surface.borrow_mut().init();
    tracing::info!(id = %root.id(), "editing surface mounted");

    Ok(SurfaceHandle {
        surface,
        _listeners: listeners,
    })
}

/// Mount on the element with the given id.
pub fn mount_by_id(id: &str, config: SurfaceConfig) -> Result<SurfaceHandle, JsValue> {
    let root = gloo_utils::document()
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("no element with id {id:?}")))?
        .dyn_into::<HtmlElement>()?;
    mount(root, config)
}
