//! Full-size image preview overlay.
//!
//! Only active when the page provides `#preview-overlay` containing
//! `#preview-image`.

use gloo_events::EventListener;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, HtmlImageElement};

pub const OVERLAY_ID: &str = "preview-overlay";
pub const IMAGE_ID: &str = "preview-image";

#[derive(Debug, Clone)]
pub struct PreviewOverlay {
    overlay: HtmlElement,
    image: HtmlImageElement,
}

impl PreviewOverlay {
    pub fn find(document: &Document) -> Option<Self> {
        let overlay = document
            .get_element_by_id(OVERLAY_ID)?
            .dyn_into::<HtmlElement>()
            .ok()?;
        let image = document
            .get_element_by_id(IMAGE_ID)?
            .dyn_into::<HtmlImageElement>()
            .ok()?;
        Some(Self { overlay, image })
    }

    pub fn show(&self, src: &str) {
        self.image.set_src(src);
        let _ = self.overlay.style().set_property("display", "flex");
    }

    pub fn hide(&self) {
        let _ = self.overlay.style().set_property("display", "none");
        self.image.set_src("");
    }

    pub fn is_visible(&self) -> bool {
        self.overlay
            .style()
            .get_property_value("display")
            .is_ok_and(|display| display == "flex")
    }

    /// Hide the overlay when it is clicked.
    pub fn listen_for_dismiss(&self) -> EventListener {
        let preview = self.clone();
        EventListener::new(&self.overlay, "click", move |_| preview.hide())
    }
}
