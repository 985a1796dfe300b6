//! In-memory [`SurfaceDocument`] implementation.
//!
//! An arena-backed element/text tree with a simulated selection, a
//! recording command executor, and settable layout. Used by the test suite
//! and by hosts that want to drive the engine without a browser.

mod html;

use std::collections::HashMap;

use smol_str::SmolStr;

use crate::document::{
    MutationBatch, MutationRecord, NativeRange, Size, SurfaceDocument, ViewportMetrics,
};
use crate::error::SurfaceError;

pub use html::{Fragment, parse_fragment};

/// Handle to a node in a [`MemoryDocument`].
///
/// Ids are never reused, so a handle to a released node simply stops
/// resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: SmolStr,
        attrs: Vec<(SmolStr, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Simulated layout and load state of a media element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MediaState {
    pub rendered: Size,
    pub natural: Size,
    pub loaded: bool,
}

/// One call into the native command executor.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedCommand {
    pub name: String,
    pub value: Option<String>,
}

/// Arena-backed editable document.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<Option<NodeData>>,
    root: NodeId,
    selection: Option<NativeRange<NodeId>>,
    metrics: ViewportMetrics,
    media: HashMap<NodeId, MediaState>,
    default_media: MediaState,
    load_listeners: Vec<NodeId>,
    pending: MutationBatch<NodeId>,
    executed: Vec<ExecutedCommand>,
    command_states: HashMap<String, (bool, String)>,
    base_url: Option<String>,
    page_style: Vec<(String, String)>,
    editable: bool,
    focused: bool,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Empty document whose root is `<div id="editor" contenteditable="true">`.
    pub fn new() -> Self {
        let root_data = NodeData {
            kind: NodeKind::Element {
                tag: SmolStr::new_static("div"),
                attrs: vec![
                    (SmolStr::new_static("id"), "editor".to_string()),
                    (SmolStr::new_static("contenteditable"), "true".to_string()),
                ],
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![Some(root_data)],
            root: NodeId(0),
            selection: None,
            metrics: ViewportMetrics::default(),
            media: HashMap::new(),
            default_media: MediaState::default(),
            load_listeners: Vec::new(),
            pending: Vec::new(),
            executed: Vec::new(),
            command_states: HashMap::new(),
            base_url: None,
            page_style: Vec::new(),
            editable: true,
            focused: false,
        }
    }

    /// Document whose root content is `html`, with no pending mutations.
    pub fn from_html(html: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root;
        doc.set_inner_html(&root, html);
        doc.pending.clear();
        doc
    }

    // === Test and host controls ===

    pub fn set_metrics(&mut self, metrics: ViewportMetrics) {
        self.metrics = metrics;
    }

    pub fn metrics_mut(&mut self) -> &mut ViewportMetrics {
        &mut self.metrics
    }

    /// Media state given to every image created from now on.
    pub fn set_default_media(&mut self, media: MediaState) {
        self.default_media = media;
    }

    pub fn set_media(&mut self, node: NodeId, media: MediaState) {
        self.media.insert(node, media);
    }

    pub fn set_rendered_size(&mut self, node: NodeId, size: Size) {
        self.media.entry(node).or_default().rendered = size;
    }

    pub fn set_natural_size(&mut self, node: NodeId, size: Size) {
        self.media.entry(node).or_default().natural = size;
    }

    pub fn set_loaded(&mut self, node: NodeId, loaded: bool) {
        self.media.entry(node).or_default().loaded = loaded;
    }

    /// Override what the executor reports for `command`.
    pub fn set_command_state(&mut self, command: &str, enabled: bool, value: &str) {
        self.command_states
            .insert(command.to_string(), (enabled, value.to_string()));
    }

    /// Commands executed so far, oldest first.
    pub fn executed(&self) -> &[ExecutedCommand] {
        &self.executed
    }

    pub fn clear_executed(&mut self) {
        self.executed.clear();
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn page_style(&self, property: &str) -> Option<&str> {
        self.page_style
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Whether any mutation records are waiting to be taken.
    pub fn has_pending_mutations(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    /// Replace the data of a text node.
    ///
    /// Character data changes are not observed, so nothing is recorded.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(NodeKind::Text(existing)) = self.data_mut(node).map(|d| &mut d.kind) {
            *existing = text.to_string();
        }
    }

    /// First element under the root with `tag`.
    pub fn find_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(&self.root)
            .into_iter()
            .find(|n| self.is_tag(n, tag))
    }

    /// Whether `node` still resolves to live data.
    pub fn exists(&self, node: NodeId) -> bool {
        self.data(node).is_some()
    }

    /// Whether `node` is attached under the root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == self.root {
                return true;
            }
            current = self.parent_of(n);
        }
        false
    }

    // === Arena internals ===

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let is_img = matches!(&kind, NodeKind::Element { tag, .. } if tag == "img");
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        }));
        if is_img {
            self.media.insert(id, self.default_media);
        }
        id
    }

    fn data(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node.0 as usize).and_then(Option::as_ref)
    }

    fn data_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(node.0 as usize).and_then(Option::as_mut)
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).and_then(|d| d.parent)
    }

    fn is_text(&self, node: NodeId) -> bool {
        matches!(self.data(node).map(|d| &d.kind), Some(NodeKind::Text(_)))
    }

    fn text_of(&self, node: NodeId) -> Option<&str> {
        match self.data(node).map(|d| &d.kind) {
            Some(NodeKind::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    fn attrs_mut(&mut self, node: NodeId) -> Option<&mut Vec<(SmolStr, String)>> {
        match self.data_mut(node).map(|d| &mut d.kind) {
            Some(NodeKind::Element { attrs, .. }) => Some(attrs),
            _ => None,
        }
    }

    fn record(&mut self, record: MutationRecord<NodeId>) {
        if self.is_connected(*record.target()) {
            self.pending.push(record);
        }
    }

    /// Detach `child` from its current parent without recording.
    fn unlink(&mut self, child: NodeId) -> Option<NodeId> {
        let parent = self.parent_of(child)?;
        if let Some(data) = self.data_mut(parent) {
            data.children.retain(|c| *c != child);
        }
        if let Some(data) = self.data_mut(child) {
            data.parent = None;
        }
        Some(parent)
    }

    fn build(&mut self, fragment: &Fragment) -> NodeId {
        match fragment {
            Fragment::Text(text) => self.create_text(text),
            Fragment::Element {
                tag,
                attrs,
                children,
            } => {
                let id = self.alloc(NodeKind::Element {
                    tag: tag.clone(),
                    attrs: attrs.clone(),
                });
                for child in children {
                    let child_id = self.build(child);
                    self.link(id, child_id, None);
                }
                id
            }
        }
    }

    /// Attach a detached node at `index` (append when `None`) without recording.
    fn link(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        if let Some(data) = self.data_mut(parent) {
            let at = index.unwrap_or(data.children.len()).min(data.children.len());
            data.children.insert(at, child);
        }
        if let Some(data) = self.data_mut(child) {
            data.parent = Some(parent);
        }
    }

    fn deep_copy(&mut self, node: NodeId) -> Option<NodeId> {
        let data = self.data(node)?.clone();
        let copy = self.alloc(data.kind);
        for child in data.children {
            if let Some(child_copy) = self.deep_copy(child) {
                self.link(copy, child_copy, None);
            }
        }
        Some(copy)
    }

    fn serialize_children(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.data(node) else {
            return;
        };
        let raw = matches!(&data.kind, NodeKind::Element { tag, .. } if html::is_raw_text(tag));
        for child in &data.children {
            match self.data(*child).map(|d| &d.kind) {
                Some(NodeKind::Text(text)) if raw => out.push_str(text),
                Some(NodeKind::Text(text)) => html::escape_text(text, out),
                Some(NodeKind::Element { .. }) => self.serialize_element(*child, out),
                None => {}
            }
        }
    }

    fn serialize_element(&self, node: NodeId, out: &mut String) {
        let Some(NodeKind::Element { tag, attrs }) = self.data(node).map(|d| &d.kind) else {
            return;
        };
        out.push('<');
        out.push_str(tag);
        for (name, value) in attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            html::escape_attribute(value, out);
            out.push('"');
        }
        out.push('>');
        if html::is_void(tag) {
            return;
        }
        self.serialize_children(node, out);
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match self.data(node).map(|d| &d.kind) {
            Some(NodeKind::Text(text)) => out.push_str(text),
            Some(NodeKind::Element { .. }) => {
                for child in self.children(&node) {
                    self.collect_text(child, out);
                }
            }
            None => {}
        }
    }

    fn valid_boundary(&self, node: NodeId, offset: usize) -> bool {
        self.is_connected(node) && offset <= self.node_len(&node)
    }

    /// Split a text node at a UTF-16 offset, returning the new tail node.
    fn split_text(&mut self, node: NodeId, offset: usize) -> Option<NodeId> {
        let text = self.text_of(node)?.to_string();
        let (head, tail) = split_utf16(&text, offset);
        if tail.is_empty() {
            return None;
        }
        let (head, tail) = (head.to_string(), tail.to_string());
        if let Some(NodeKind::Text(existing)) = self.data_mut(node).map(|d| &mut d.kind) {
            *existing = head;
        }
        let tail_node = self.create_text(&tail);
        let parent = self.parent_of(node)?;
        let index = self.index_in(parent, node)? + 1;
        self.link(parent, tail_node, Some(index));
        self.record(MutationRecord::ChildList {
            target: parent,
            added: vec![tail_node],
            removed: Vec::new(),
        });
        Some(tail_node)
    }

    fn index_in(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.data(parent)?.children.iter().position(|c| *c == child)
    }

    /// Resolve the selection start to an element container and child index,
    /// splitting text when the caret sits inside it.
    fn insertion_point(&mut self) -> (NodeId, usize) {
        let fallback = (self.root, self.node_len(&self.root));
        let Some(range) = self.selection.clone() else {
            return fallback;
        };
        if !self.valid_boundary(range.start_container, range.start_offset) {
            return fallback;
        }

        let container = range.start_container;
        if !self.is_text(container) {
            return (container, range.start_offset);
        }

        // Collapse a selection confined to one text node by deleting it.
        if range.end_container == container && range.end_offset > range.start_offset {
            if let Some(text) = self.text_of(container).map(str::to_string) {
                let (head, rest) = split_utf16(&text, range.start_offset);
                let (_, tail) = split_utf16(rest, range.end_offset - range.start_offset);
                let joined = format!("{head}{tail}");
                self.set_text(container, &joined);
            }
        }

        let Some(parent) = self.parent_of(container) else {
            return fallback;
        };
        let Some(index) = self.index_in(parent, container) else {
            return fallback;
        };
        if range.start_offset == 0 {
            return (parent, index);
        }
        self.split_text(container, range.start_offset);
        (parent, index + 1)
    }

    fn insert_html_at_selection(&mut self, markup: &str) -> bool {
        let fragments = parse_fragment(markup);
        if fragments.is_empty() {
            return false;
        }
        let (parent, mut index) = self.insertion_point();
        let mut added = Vec::with_capacity(fragments.len());
        for fragment in &fragments {
            let node = self.build(fragment);
            self.link(parent, node, Some(index));
            index += 1;
            added.push(node);
        }
        self.record(MutationRecord::ChildList {
            target: parent,
            added,
            removed: Vec::new(),
        });
        self.selection = Some(NativeRange::caret(parent, index));
        true
    }
}

/// Split `text` at a UTF-16 code unit offset, clamped to the string.
fn split_utf16(text: &str, offset: usize) -> (&str, &str) {
    let mut units = 0;
    for (byte, ch) in text.char_indices() {
        if units >= offset {
            return text.split_at(byte);
        }
        units += ch.len_utf16();
    }
    (text, "")
}

fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim();
            let value = value.trim();
            (!prop.is_empty()).then(|| (prop.to_ascii_lowercase(), value.to_string()))
        })
        .collect()
}

fn format_style(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(p, v)| format!("{p}: {v};"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl SurfaceDocument for MemoryDocument {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.root
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.parent_of(*node)
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.data(*node)
            .map(|d| d.children.clone())
            .unwrap_or_default()
    }

    fn tag_name(&self, node: &NodeId) -> Option<SmolStr> {
        match self.data(*node).map(|d| &d.kind) {
            Some(NodeKind::Element { tag, .. }) => Some(tag.clone()),
            _ => None,
        }
    }

    fn node_len(&self, node: &NodeId) -> usize {
        match self.data(*node) {
            Some(NodeData {
                kind: NodeKind::Text(text),
                ..
            }) => utf16_len(text),
            Some(data) => data.children.len(),
            None => 0,
        }
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: SmolStr::new(tag.to_ascii_lowercase()),
            attrs: Vec::new(),
        })
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, reference: Option<&NodeId>) {
        let (parent, child) = (*parent, *child);
        if !self.exists(parent) || !self.exists(child) || self.is_text(parent) {
            return;
        }
        // Refuse to create a cycle.
        if self.contains(&child, &parent) {
            return;
        }
        if reference.is_some_and(|r| self.parent_of(*r) != Some(parent) || *r == child) {
            return;
        }

        if let Some(old_parent) = self.unlink(child) {
            self.record(MutationRecord::ChildList {
                target: old_parent,
                added: Vec::new(),
                removed: vec![child],
            });
        }

        let index = reference.and_then(|r| self.index_in(parent, *r));
        self.link(parent, child, index);
        self.record(MutationRecord::ChildList {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) {
        if self.parent_of(*child) != Some(*parent) {
            return;
        }
        self.unlink(*child);
        self.record(MutationRecord::ChildList {
            target: *parent,
            added: Vec::new(),
            removed: vec![*child],
        });
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        match self.data(*node).map(|d| &d.kind) {
            Some(NodeKind::Element { attrs, .. }) => attrs
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        let Some(attrs) = self.attrs_mut(*node) else {
            return;
        };
        let name = SmolStr::new(name.to_ascii_lowercase());
        match attrs.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) if existing == value => return,
            Some((_, existing)) => *existing = value.to_string(),
            None => attrs.push((name.clone(), value.to_string())),
        }
        self.record(MutationRecord::Attributes {
            target: *node,
            name,
        });
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) {
        let Some(attrs) = self.attrs_mut(*node) else {
            return;
        };
        let before = attrs.len();
        attrs.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        if attrs.len() != before {
            self.record(MutationRecord::Attributes {
                target: *node,
                name: SmolStr::new(name.to_ascii_lowercase()),
            });
        }
    }

    fn style_property(&self, node: &NodeId, property: &str) -> Option<String> {
        let style = self.attribute(node, "style")?;
        parse_style(&style)
            .into_iter()
            .find(|(p, _)| p.eq_ignore_ascii_case(property))
            .map(|(_, v)| v)
            .filter(|v| !v.is_empty())
    }

    fn set_style_property(&mut self, node: &NodeId, property: &str, value: &str) {
        if self.tag_name(node).is_none() {
            return;
        }
        let mut decls = parse_style(&self.attribute(node, "style").unwrap_or_default());
        let property = property.to_ascii_lowercase();
        let position = decls.iter().position(|(p, _)| *p == property);
        match (position, value.is_empty()) {
            (Some(i), true) => {
                decls.remove(i);
            }
            (Some(i), false) => decls[i].1 = value.to_string(),
            (None, true) => return,
            (None, false) => decls.push((property, value.to_string())),
        }
        if decls.is_empty() {
            self.remove_attribute(node, "style");
        } else {
            self.set_attribute(node, "style", &format_style(&decls));
        }
    }

    fn set_inner_html(&mut self, node: &NodeId, html: &str) {
        let node = *node;
        if !self.exists(node) || self.is_text(node) {
            return;
        }
        let removed = self.children(&node);
        for child in &removed {
            self.unlink(*child);
        }
        let mut added = Vec::new();
        for fragment in parse_fragment(html) {
            let child = self.build(&fragment);
            self.link(node, child, None);
            added.push(child);
        }
        if !added.is_empty() || !removed.is_empty() {
            self.record(MutationRecord::ChildList {
                target: node,
                added,
                removed,
            });
        }
    }

    fn inner_html(&self, node: &NodeId) -> String {
        let mut out = String::new();
        self.serialize_children(*node, &mut out);
        out
    }

    fn text_content(&self, node: &NodeId) -> String {
        let mut out = String::new();
        self.collect_text(*node, &mut out);
        out
    }

    fn clone_detached(&mut self, node: &NodeId) -> NodeId {
        match self.deep_copy(*node) {
            Some(copy) => copy,
            None => self.create_element("div"),
        }
    }

    fn release(&mut self, node: NodeId) {
        if node == self.root || self.parent_of(node).is_some() {
            return;
        }
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            if let Some(data) = self.nodes.get_mut(n.0 as usize).and_then(Option::take) {
                stack.extend(data.children);
            }
            self.media.remove(&n);
            self.load_listeners.retain(|l| *l != n);
        }
    }

    fn metrics(&self) -> ViewportMetrics {
        self.metrics
    }

    fn rendered_size(&self, node: &NodeId) -> Size {
        self.media.get(node).map(|m| m.rendered).unwrap_or_default()
    }

    fn natural_size(&self, node: &NodeId) -> Size {
        self.media.get(node).map(|m| m.natural).unwrap_or_default()
    }

    fn is_loaded(&self, node: &NodeId) -> bool {
        self.media.get(node).is_some_and(|m| m.loaded)
    }

    fn has_load_listener(&self, node: &NodeId) -> bool {
        self.load_listeners.contains(node)
    }

    fn attach_load_listener(&mut self, node: &NodeId) {
        if self.exists(*node) && !self.load_listeners.contains(node) {
            self.load_listeners.push(*node);
        }
    }

    fn selection_range(&self) -> Option<NativeRange<NodeId>> {
        self.selection.clone()
    }

    fn set_selection_range(&mut self, range: &NativeRange<NodeId>) -> Result<(), SurfaceError> {
        if !self.valid_boundary(range.start_container, range.start_offset) {
            return Err(SurfaceError::Selection(format!(
                "start {:?}:{} is not a valid boundary",
                range.start_container, range.start_offset
            )));
        }
        if !self.valid_boundary(range.end_container, range.end_offset) {
            return Err(SurfaceError::Selection(format!(
                "end {:?}:{} is not a valid boundary",
                range.end_container, range.end_offset
            )));
        }
        self.selection = Some(range.clone());
        Ok(())
    }

    fn selected_text(&self) -> String {
        let Some(range) = &self.selection else {
            return String::new();
        };
        if range.is_collapsed() {
            return String::new();
        }

        if range.start_container == range.end_container {
            let container = range.start_container;
            if let Some(text) = self.text_of(container) {
                let (_, rest) = split_utf16(text, range.start_offset);
                let (selected, _) =
                    split_utf16(rest, range.end_offset.saturating_sub(range.start_offset));
                return selected.to_string();
            }
            let mut out = String::new();
            let children = self.children(&container);
            let end = range.end_offset.min(children.len());
            for child in children.get(range.start_offset.min(end)..end).unwrap_or_default() {
                self.collect_text(*child, &mut out);
            }
            return out;
        }

        // Cross-node: walk text nodes in document order between the boundaries.
        let mut out = String::new();
        let mut inside = false;
        for node in self.descendants(&self.root) {
            let Some(text) = self.text_of(node) else {
                continue;
            };
            let is_start = node == range.start_container;
            let is_end = node == range.end_container;
            if is_start {
                inside = true;
                out.push_str(split_utf16(text, range.start_offset).1);
            } else if is_end {
                out.push_str(split_utf16(text, range.end_offset).0);
                break;
            } else if inside {
                out.push_str(text);
            }
        }
        out
    }

    fn surround_selection(&mut self, wrapper: &NodeId) -> bool {
        let Some(range) = self.selection.clone() else {
            return false;
        };
        if range.is_collapsed()
            || range.start_container != range.end_container
            || !self.valid_boundary(range.start_container, range.start_offset)
            || !self.valid_boundary(range.end_container, range.end_offset)
            || range.end_offset < range.start_offset
        {
            return false;
        }
        let container = range.start_container;

        let (parent, index) = if self.is_text(container) {
            let Some(parent) = self.parent_of(container) else {
                return false;
            };
            // Split off the tail first so the start offset stays valid.
            self.split_text(container, range.end_offset);
            let middle = if range.start_offset == 0 {
                container
            } else {
                match self.split_text(container, range.start_offset) {
                    Some(node) => node,
                    None => return false,
                }
            };
            let Some(index) = self.index_in(parent, middle) else {
                return false;
            };
            self.insert_before(&parent, wrapper, Some(&middle));
            self.append_child(wrapper, &middle);
            (parent, index)
        } else {
            let moved: Vec<NodeId> = self.children(&container)
                [range.start_offset..range.end_offset]
                .to_vec();
            let reference = moved.first().copied();
            self.insert_before(&container, wrapper, reference.as_ref());
            for node in &moved {
                self.append_child(wrapper, node);
            }
            (container, range.start_offset)
        };

        self.selection = Some(NativeRange {
            start_container: parent,
            start_offset: index,
            end_container: parent,
            end_offset: index + 1,
        });
        true
    }

    fn collapse_to_end(&mut self, node: &NodeId) {
        if self.exists(*node) {
            self.selection = Some(NativeRange::caret(*node, self.node_len(node)));
        }
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn blur(&mut self) {
        self.focused = false;
    }

    fn exec_command(&mut self, command: &str, value: Option<&str>) -> bool {
        self.executed.push(ExecutedCommand {
            name: command.to_string(),
            value: value.map(str::to_string),
        });
        if !self.editable {
            return false;
        }
        match command {
            "insertHTML" => self.insert_html_at_selection(value.unwrap_or_default()),
            _ => self.query_command_enabled(command),
        }
    }

    fn query_command_enabled(&self, command: &str) -> bool {
        self.command_states
            .get(command)
            .map(|(enabled, _)| *enabled)
            .unwrap_or(true)
    }

    fn query_command_value(&self, command: &str) -> String {
        self.command_states
            .get(command)
            .map(|(_, value)| value.clone())
            .unwrap_or_default()
    }

    fn set_base_url(&mut self, url: &str) {
        self.base_url = Some(url.to_string());
    }

    fn set_page_style(&mut self, property: &str, value: &str) {
        match self.page_style.iter_mut().find(|(p, _)| p == property) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self
                .page_style
                .push((property.to_string(), value.to_string())),
        }
    }

    fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
        let root = self.root;
        self.set_attribute(&root, "contenteditable", if editable { "true" } else { "false" });
    }

    fn take_mutation_batch(&mut self) -> Option<MutationBatch<NodeId>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_serialization() {
        let html = r#"<p>a&nbsp;b <b class="x">c</b></p><p><img src="i.png" data-width="600"><br></p>"#;
        let doc = MemoryDocument::from_html(html);
        assert_eq!(doc.inner_html(&doc.root()), html);
    }

    #[test]
    fn test_from_html_has_no_pending_mutations() {
        let mut doc = MemoryDocument::from_html("<p>x</p>");
        assert!(doc.take_mutation_batch().is_none());
    }

    #[test]
    fn test_attribute_change_records_only_when_value_changes() {
        let mut doc = MemoryDocument::from_html("<p>x</p>");
        let p = doc.children(&doc.root())[0];
        doc.set_attribute(&p, "class", "a");
        doc.set_attribute(&p, "class", "a");
        let batch = doc.take_mutation_batch().unwrap();
        assert_eq!(batch.len(), 1);
        assert!(matches!(&batch[0], MutationRecord::Attributes { name, .. } if name == "class"));
    }

    #[test]
    fn test_detached_changes_are_not_recorded() {
        let mut doc = MemoryDocument::new();
        let span = doc.create_element("span");
        doc.set_attribute(&span, "class", "wrapper");
        assert!(doc.take_mutation_batch().is_none());

        let root = doc.root();
        doc.append_child(&root, &span);
        let batch = doc.take_mutation_batch().unwrap();
        assert_eq!(
            batch,
            vec![MutationRecord::ChildList {
                target: root,
                added: vec![span],
                removed: vec![]
            }]
        );
    }

    #[test]
    fn test_style_properties() {
        let mut doc = MemoryDocument::from_html(r#"<img src="a.png">"#);
        let img = doc.children(&doc.root())[0];
        doc.set_style_property(&img, "width", "600px");
        doc.set_style_property(&img, "height", "400px");
        assert_eq!(
            doc.attribute(&img, "style").as_deref(),
            Some("width: 600px; height: 400px;")
        );
        assert_eq!(doc.style_property(&img, "height").as_deref(), Some("400px"));

        doc.set_style_property(&img, "width", "");
        doc.set_style_property(&img, "height", "");
        assert_eq!(doc.attribute(&img, "style"), None);
    }

    #[test]
    fn test_insert_html_splits_text_at_caret() {
        let mut doc = MemoryDocument::from_html("<p>hello world</p>");
        let p = doc.children(&doc.root())[0];
        let text = doc.children(&p)[0];
        doc.set_selection_range(&NativeRange::caret(text, 5)).unwrap();

        assert!(doc.exec_command("insertHTML", Some("<b>!</b>")));
        assert_eq!(doc.inner_html(&doc.root()), "<p>hello<b>!</b> world</p>");
        assert_eq!(doc.selection_range(), Some(NativeRange::caret(p, 2)));
    }

    #[test]
    fn test_insert_html_without_selection_appends_to_root() {
        let mut doc = MemoryDocument::from_html("<p>a</p>");
        assert!(doc.exec_command("insertHTML", Some("<hr>")));
        assert_eq!(doc.inner_html(&doc.root()), "<p>a</p><hr>");
    }

    #[test]
    fn test_surround_text_selection() {
        let mut doc = MemoryDocument::from_html("<p>see here</p>");
        let p = doc.children(&doc.root())[0];
        let text = doc.children(&p)[0];
        doc.set_selection_range(&NativeRange {
            start_container: text,
            start_offset: 4,
            end_container: text,
            end_offset: 8,
        })
        .unwrap();
        assert_eq!(doc.selected_text(), "here");

        let link = doc.create_element("a");
        doc.set_attribute(&link, "href", "https://x.y");
        assert!(doc.surround_selection(&link));
        assert_eq!(
            doc.inner_html(&doc.root()),
            r#"<p>see <a href="https://x.y">here</a></p>"#
        );
    }

    #[test]
    fn test_invalid_selection_is_rejected() {
        let mut doc = MemoryDocument::from_html("<p>ab</p>");
        let p = doc.children(&doc.root())[0];
        let text = doc.children(&p)[0];
        assert!(doc.set_selection_range(&NativeRange::caret(text, 9)).is_err());

        let detached = doc.create_text("zz");
        assert!(
            doc.set_selection_range(&NativeRange::caret(detached, 0))
                .is_err()
        );
    }

    #[test]
    fn test_released_nodes_stop_resolving() {
        let mut doc = MemoryDocument::from_html("<p>a</p>");
        let root = doc.root();
        let copy = doc.clone_detached(&root);
        let copied_p = doc.children(&copy)[0];
        doc.release(copy);
        assert!(!doc.exists(copy));
        assert!(!doc.exists(copied_p));
        // Releasing never touches the live tree.
        assert_eq!(doc.inner_html(&root), "<p>a</p>");
    }

    #[test]
    fn test_utf16_offsets() {
        let doc = MemoryDocument::from_html("<p>😀a</p>");
        let p = doc.children(&doc.root())[0];
        let text = doc.children(&p)[0];
        assert_eq!(doc.node_len(&text), 3);
        assert_eq!(split_utf16("😀a", 2), ("😀", "a"));
    }
}
