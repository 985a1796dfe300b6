//! Platform abstraction for the editable document.
//!
//! `SurfaceDocument` is the seam between the synchronization engine and
//! whatever actually hosts the editable tree. The browser implementation wraps
//! the live DOM and `document.execCommand`; [`crate::memory::MemoryDocument`]
//! is a self-contained tree used for tests and headless hosts.
//!
//! Node handles are opaque and cheap to clone. Every mutating operation is a
//! no-op when handed a node that is no longer part of the tree.

use smol_str::SmolStr;

use crate::error::SurfaceError;

/// Width/height pair in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Scroll and layout extents of the editable viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportMetrics {
    /// Current vertical scroll offset.
    pub scroll_top: f64,
    /// Inner width of the editable element.
    pub client_width: f64,
    /// Inner height of the editable element.
    pub client_height: f64,
    /// Full scrollable content height.
    pub scroll_height: f64,
    /// Layout height including borders.
    pub offset_height: f64,
    /// Width of the hosting window, used when the element reports no width.
    pub window_width: f64,
}

impl ViewportMetrics {
    /// Height reported to the host: the larger of scroll and layout extent.
    pub fn content_height(&self) -> f64 {
        self.scroll_height.max(self.offset_height)
    }

    /// Whether the viewport is scrolled all the way up.
    pub fn at_top(&self) -> bool {
        self.scroll_top <= 0.0
    }

    /// Whether the viewport is scrolled all the way down.
    pub fn at_bottom(&self) -> bool {
        (self.scroll_top + self.client_height).ceil() >= self.scroll_height
    }

    /// Width available for laying out a newly inserted image.
    pub fn layout_width(&self) -> f64 {
        if self.client_width > 0.0 {
            self.client_width
        } else {
            self.window_width
        }
    }
}

/// A native selection range expressed with live node handles.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeRange<N> {
    pub start_container: N,
    pub start_offset: usize,
    pub end_container: N,
    pub end_offset: usize,
}

impl<N: Clone> NativeRange<N> {
    /// Create a collapsed range (caret).
    pub fn caret(container: N, offset: usize) -> Self {
        Self {
            start_container: container.clone(),
            start_offset: offset,
            end_container: container,
            end_offset: offset,
        }
    }
}

impl<N: PartialEq> NativeRange<N> {
    /// Check whether start and end coincide.
    pub fn is_collapsed(&self) -> bool {
        self.start_container == self.end_container && self.start_offset == self.end_offset
    }
}

/// One observed change to the editable tree.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationRecord<N> {
    /// Children were inserted into or removed from `target`.
    ChildList {
        target: N,
        added: Vec<N>,
        removed: Vec<N>,
    },
    /// Attribute `name` changed on `target`.
    Attributes { target: N, name: SmolStr },
}

impl<N> MutationRecord<N> {
    pub fn target(&self) -> &N {
        match self {
            MutationRecord::ChildList { target, .. } => target,
            MutationRecord::Attributes { target, .. } => target,
        }
    }
}

/// A batch of mutation records delivered in one turn of the event loop.
pub type MutationBatch<N> = Vec<MutationRecord<N>>;

/// The editable tree, its selection, and the native command executor.
pub trait SurfaceDocument {
    /// Handle to a node in the tree.
    type Node: Clone + PartialEq + std::fmt::Debug;

    // === Tree navigation ===

    /// The editable root element.
    fn root(&self) -> Self::Node;

    /// Parent of a node, if attached.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Child nodes in document order.
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Lowercase tag name for elements, `None` for text.
    fn tag_name(&self, node: &Self::Node) -> Option<SmolStr>;

    /// Range-offset length: UTF-16 units for text, child count for elements.
    fn node_len(&self, node: &Self::Node) -> usize;

    // === Mutation ===

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> Self::Node;

    /// Insert `child` into `parent` before `reference` (append when `None`).
    ///
    /// Moves the child if it is already attached elsewhere.
    fn insert_before(
        &mut self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: Option<&Self::Node>,
    );

    /// Detach `child` from `parent`.
    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node);

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

    fn remove_attribute(&mut self, node: &Self::Node, name: &str);

    /// Read one inline style property.
    fn style_property(&self, node: &Self::Node, property: &str) -> Option<String>;

    /// Write one inline style property. An empty value clears it.
    fn set_style_property(&mut self, node: &Self::Node, property: &str, value: &str);

    /// Replace the children of `node` by parsing `html`.
    fn set_inner_html(&mut self, node: &Self::Node, html: &str);

    // === Serialization ===

    /// Serialized markup of the children of `node`.
    fn inner_html(&self, node: &Self::Node) -> String;

    /// Rendered text content of `node`.
    fn text_content(&self, node: &Self::Node) -> String;

    /// Deep copy of `node` that is not attached anywhere.
    fn clone_detached(&mut self, node: &Self::Node) -> Self::Node;

    /// Drop a detached subtree created by [`SurfaceDocument::clone_detached`].
    fn release(&mut self, _node: Self::Node) {}

    // === Layout ===

    fn metrics(&self) -> ViewportMetrics;

    /// Rendered box size (`offsetWidth`/`offsetHeight`).
    fn rendered_size(&self, node: &Self::Node) -> Size;

    /// Intrinsic media size (`naturalWidth`/`naturalHeight`).
    fn natural_size(&self, node: &Self::Node) -> Size;

    /// Whether an image has finished loading.
    fn is_loaded(&self, node: &Self::Node) -> bool;

    // === Load listeners ===

    fn has_load_listener(&self, node: &Self::Node) -> bool;

    /// Attach the load-completion listener. Callers check
    /// [`SurfaceDocument::has_load_listener`] first.
    fn attach_load_listener(&mut self, node: &Self::Node);

    // === Selection ===

    /// First range of the native selection, if any.
    fn selection_range(&self) -> Option<NativeRange<Self::Node>>;

    /// Replace the native selection with `range`.
    fn set_selection_range(&mut self, range: &NativeRange<Self::Node>)
    -> Result<(), SurfaceError>;

    /// Text covered by the native selection.
    fn selected_text(&self) -> String;

    /// Wrap the selected content in `wrapper`. Returns false when the
    /// selection cannot be surrounded.
    fn surround_selection(&mut self, wrapper: &Self::Node) -> bool;

    /// Collapse the selection to the end of `node`'s contents.
    fn collapse_to_end(&mut self, node: &Self::Node);

    fn focus(&mut self);

    fn blur(&mut self);

    // === Native command executor ===

    fn exec_command(&mut self, command: &str, value: Option<&str>) -> bool;

    fn query_command_enabled(&self, command: &str) -> bool;

    fn query_command_value(&self, command: &str) -> String;

    // === Page ===

    /// Install or update the page base URL used for relative references.
    fn set_base_url(&mut self, url: &str);

    /// Set a style property on the page body.
    fn set_page_style(&mut self, property: &str, value: &str);

    fn set_editable(&mut self, editable: bool);

    // === Observation ===

    /// Next pending batch of mutation records inside the editable root.
    fn take_mutation_batch(&mut self) -> Option<MutationBatch<Self::Node>>;

    // === Provided helpers ===

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) {
        self.insert_before(parent, child, None);
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool {
        let mut current = Some(node.clone());
        while let Some(n) = current {
            if &n == ancestor {
                return true;
            }
            current = self.parent(&n);
        }
        false
    }

    fn is_tag(&self, node: &Self::Node, tag: &str) -> bool {
        self.tag_name(node).is_some_and(|t| t == tag)
    }

    /// All `<img>` descendants of `node` in document order (excluding `node`).
    fn images_under(&self, node: &Self::Node) -> Vec<Self::Node> {
        self.descendants(node)
            .into_iter()
            .filter(|n| self.is_tag(n, "img"))
            .collect()
    }

    /// All descendants of `node` in document order.
    fn descendants(&self, node: &Self::Node) -> Vec<Self::Node> {
        let mut out = Vec::new();
        let mut stack: Vec<Self::Node> = self.children(node).into_iter().rev().collect();
        while let Some(n) = stack.pop() {
            stack.extend(self.children(&n).into_iter().rev());
            out.push(n);
        }
        out
    }
}
