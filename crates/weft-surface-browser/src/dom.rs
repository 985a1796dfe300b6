//! `SurfaceDocument` over the live DOM.
//!
//! Writes skip values that are already in place so the surface's own
//! normalization does not keep feeding the mutation observer.

use std::rc::Rc;

use gloo_events::EventListener;
use smol_str::SmolStr;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CharacterData, Element, HtmlDocument, HtmlElement, HtmlImageElement, Node};

use weft_surface_core::{
    MutationBatch, NativeRange, Size, SurfaceDocument, SurfaceError, ViewportMetrics,
};

use crate::observer::{DomObserver, node_list};

/// Expando marking images that already carry a load listener.
const LOAD_LISTENER_FLAG: &str = "__weftLoadListener";

/// Receives images whose `load` event fired.
pub type LoadSink = Rc<dyn Fn(Node)>;

fn selection_error(e: JsValue) -> SurfaceError {
    SurfaceError::Selection(format!("{e:?}"))
}

/// The editable element of a page plus its owning document.
pub struct DomDocument {
    document: HtmlDocument,
    root: HtmlElement,
    observer: Option<DomObserver>,
    load_sink: Option<LoadSink>,
}

impl DomDocument {
    /// Wrap an editable element. Fails when the element is not in an HTML
    /// document.
    pub fn new(root: HtmlElement) -> Result<Self, JsValue> {
        let document = root
            .owner_document()
            .ok_or_else(|| JsValue::from_str("editable element has no owner document"))?
            .dyn_into::<HtmlDocument>()?;
        Ok(Self {
            document,
            root,
            observer: None,
            load_sink: None,
        })
    }

    pub fn element(&self) -> &HtmlElement {
        &self.root
    }

    pub fn html_document(&self) -> &HtmlDocument {
        &self.document
    }

    pub fn set_load_sink(&mut self, sink: LoadSink) {
        self.load_sink = Some(sink);
    }

    pub fn attach_observer(&mut self, observer: DomObserver) {
        self.observer = Some(observer);
    }

    fn selection(&self) -> Option<web_sys::Selection> {
        gloo_utils::window().get_selection().ok().flatten()
    }
}

impl SurfaceDocument for DomDocument {
    type Node = Node;

    fn root(&self) -> Node {
        self.root.clone().into()
    }

    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn children(&self, node: &Node) -> Vec<Node> {
        node_list(&node.child_nodes())
    }

    fn tag_name(&self, node: &Node) -> Option<SmolStr> {
        node.dyn_ref::<Element>()
            .map(|el| SmolStr::new(el.local_name().to_ascii_lowercase()))
    }

    fn node_len(&self, node: &Node) -> usize {
        match node.dyn_ref::<CharacterData>() {
            Some(data) => data.length() as usize,
            None => node.child_nodes().length() as usize,
        }
    }

    fn create_element(&mut self, tag: &str) -> Node {
        match self.document.create_element(tag) {
            Ok(el) => el.into(),
            Err(e) => {
                tracing::warn!(tag, error = ?e, "createElement failed, using an empty fragment");
                self.document.create_document_fragment().into()
            }
        }
    }

    fn insert_before(&mut self, parent: &Node, child: &Node, reference: Option<&Node>) {
        if let Err(e) = parent.insert_before(child, reference) {
            tracing::debug!(error = ?e, "insertBefore rejected");
        }
    }

    fn remove_child(&mut self, parent: &Node, child: &Node) {
        if let Err(e) = parent.remove_child(child) {
            tracing::debug!(error = ?e, "removeChild rejected");
        }
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        node.dyn_ref::<Element>()?.get_attribute(name)
    }

    fn set_attribute(&mut self, node: &Node, name: &str, value: &str) {
        let Some(el) = node.dyn_ref::<Element>() else {
            return;
        };
        if el.get_attribute(name).as_deref() == Some(value) {
            return;
        }
        if let Err(e) = el.set_attribute(name, value) {
            tracing::debug!(name, error = ?e, "setAttribute rejected");
        }
    }

    fn remove_attribute(&mut self, node: &Node, name: &str) {
        let Some(el) = node.dyn_ref::<Element>() else {
            return;
        };
        if el.has_attribute(name) {
            if let Err(e) = el.remove_attribute(name) {
                tracing::debug!(name, error = ?e, "removeAttribute rejected");
            }
        }
    }

    fn style_property(&self, node: &Node, property: &str) -> Option<String> {
        let el = node.dyn_ref::<HtmlElement>()?;
        el.style()
            .get_property_value(property)
            .ok()
            .filter(|v| !v.is_empty())
    }

    fn set_style_property(&mut self, node: &Node, property: &str, value: &str) {
        let Some(el) = node.dyn_ref::<HtmlElement>() else {
            return;
        };
        let style = el.style();
        if style.get_property_value(property).unwrap_or_default() == value {
            return;
        }
        let result = if value.is_empty() {
            style.remove_property(property).map(|_| ())
        } else {
            style.set_property(property, value)
        };
        if let Err(e) = result {
            tracing::debug!(property, error = ?e, "style update rejected");
        }
        if el
            .get_attribute("style")
            .is_some_and(|s| s.trim().is_empty())
        {
            let _ = el.remove_attribute("style");
        }
    }

    fn set_inner_html(&mut self, node: &Node, html: &str) {
        if let Some(el) = node.dyn_ref::<Element>() {
            el.set_inner_html(html);
        }
    }

    fn inner_html(&self, node: &Node) -> String {
        match node.dyn_ref::<Element>() {
            Some(el) => el.inner_html(),
            None => node.text_content().unwrap_or_default(),
        }
    }

    fn text_content(&self, node: &Node) -> String {
        node.text_content().unwrap_or_default()
    }

    fn clone_detached(&mut self, node: &Node) -> Node {
        match node.clone_node_with_deep(true) {
            Ok(copy) => copy,
            Err(e) => {
                tracing::warn!(error = ?e, "cloneNode failed, exporting an empty fragment");
                self.document.create_document_fragment().into()
            }
        }
    }

    fn metrics(&self) -> ViewportMetrics {
        let window_width = gloo_utils::window()
            .inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .unwrap_or(0.0);
        ViewportMetrics {
            scroll_top: self.root.scroll_top() as f64,
            client_width: self.root.client_width() as f64,
            client_height: self.root.client_height() as f64,
            scroll_height: self.root.scroll_height() as f64,
            offset_height: self.root.offset_height() as f64,
            window_width,
        }
    }

    fn rendered_size(&self, node: &Node) -> Size {
        node.dyn_ref::<HtmlImageElement>()
            .map(|img| Size::new(img.width() as f64, img.height() as f64))
            .unwrap_or_default()
    }

    fn natural_size(&self, node: &Node) -> Size {
        node.dyn_ref::<HtmlImageElement>()
            .map(|img| Size::new(img.natural_width() as f64, img.natural_height() as f64))
            .unwrap_or_default()
    }

    fn is_loaded(&self, node: &Node) -> bool {
        node.dyn_ref::<HtmlImageElement>()
            .is_some_and(|img| img.complete() && img.natural_width() > 0)
    }

    fn has_load_listener(&self, node: &Node) -> bool {
        js_sys::Reflect::get(node, &JsValue::from_str(LOAD_LISTENER_FLAG))
            .map(|flag| flag.is_truthy())
            .unwrap_or(false)
    }

    fn attach_load_listener(&mut self, node: &Node) {
        let Some(sink) = self.load_sink.clone() else {
            return;
        };
        if js_sys::Reflect::set(node, &JsValue::from_str(LOAD_LISTENER_FLAG), &JsValue::TRUE)
            .is_err()
        {
            return;
        }
        // The listener lives as long as the image; the image is read back
        // from the event so the closure holds no node.
        EventListener::new(node, "load", move |event| {
            if let Some(image) = event.target().and_then(|t| t.dyn_into::<Node>().ok()) {
                sink(image);
            }
        })
        .forget();
    }

    fn selection_range(&self) -> Option<NativeRange<Node>> {
        let selection = self.selection()?;
        if selection.range_count() == 0 {
            return None;
        }
        let range = selection.get_range_at(0).ok()?;
        Some(NativeRange {
            start_container: range.start_container().ok()?,
            start_offset: range.start_offset().ok()? as usize,
            end_container: range.end_container().ok()?,
            end_offset: range.end_offset().ok()? as usize,
        })
    }

    fn set_selection_range(&mut self, range: &NativeRange<Node>) -> Result<(), SurfaceError> {
        let dom_range = self.document.create_range().map_err(selection_error)?;
        dom_range
            .set_start(&range.start_container, range.start_offset as u32)
            .map_err(selection_error)?;
        dom_range
            .set_end(&range.end_container, range.end_offset as u32)
            .map_err(selection_error)?;
        let selection = self
            .selection()
            .ok_or_else(|| SurfaceError::Selection("window has no selection".into()))?;
        selection.remove_all_ranges().map_err(selection_error)?;
        selection.add_range(&dom_range).map_err(selection_error)
    }

    fn selected_text(&self) -> String {
        self.selection()
            .map(|selection| String::from(selection.to_string()))
            .unwrap_or_default()
    }

    fn surround_selection(&mut self, wrapper: &Node) -> bool {
        let Some(selection) = self.selection() else {
            return false;
        };
        if selection.range_count() == 0 {
            return false;
        }
        let Ok(range) = selection.get_range_at(0) else {
            return false;
        };
        if range.collapsed() {
            return false;
        }
        match range.surround_contents(wrapper) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = ?e, "surroundContents rejected");
                false
            }
        }
    }

    fn collapse_to_end(&mut self, node: &Node) {
        let Some(selection) = self.selection() else {
            return;
        };
        let result = selection
            .select_all_children(node)
            .and_then(|()| selection.collapse_to_end());
        if let Err(e) = result {
            tracing::debug!(error = ?e, "could not collapse selection");
        }
    }

    fn focus(&mut self) {
        if let Err(e) = self.root.focus() {
            tracing::debug!(error = ?e, "focus rejected");
        }
    }

    fn blur(&mut self) {
        if let Err(e) = self.root.blur() {
            tracing::debug!(error = ?e, "blur rejected");
        }
    }

    fn exec_command(&mut self, command: &str, value: Option<&str>) -> bool {
        tracing::trace!(command, value, "execCommand");
        let result = match value {
            Some(value) => self
                .document
                .exec_command_with_show_ui_and_value(command, false, value),
            None => self.document.exec_command(command),
        };
        result.unwrap_or_else(|e| {
            tracing::debug!(command, error = ?e, "execCommand threw");
            false
        })
    }

    fn query_command_enabled(&self, command: &str) -> bool {
        self.document.query_command_enabled(command).unwrap_or(false)
    }

    fn query_command_value(&self, command: &str) -> String {
        self.document.query_command_value(command).unwrap_or_default()
    }

    fn set_base_url(&mut self, url: &str) {
        let base = match self.document.query_selector("base") {
            Ok(Some(base)) => base,
            _ => {
                let Ok(base) = self.document.create_element("base") else {
                    return;
                };
                let Some(head) = self.document.head() else {
                    tracing::debug!("document has no head for <base>");
                    return;
                };
                if head.append_child(&base).is_err() {
                    return;
                }
                base
            }
        };
        let _ = base.set_attribute("href", url);
        let _ = base.set_attribute("target", "_blank");
    }

    fn set_page_style(&mut self, property: &str, value: &str) {
        if let Some(body) = self.document.body() {
            if let Err(e) = body.style().set_property(property, value) {
                tracing::debug!(property, error = ?e, "page style rejected");
            }
        }
    }

    fn set_editable(&mut self, editable: bool) {
        self.root
            .set_content_editable(if editable { "true" } else { "false" });
    }

    fn take_mutation_batch(&mut self) -> Option<MutationBatch<Node>> {
        self.observer.as_ref()?.take_batch()
    }
}
