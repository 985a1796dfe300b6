//! Selection anchor that survives loss of native focus.
//!
//! The anchor is stored as child-index paths from the editable root rather
//! than live node handles. Restoring walks the paths again and checks that
//! each boundary still lands on a node of the same kind with the offset in
//! range; anything else is reported as [`SurfaceError::StaleAnchor`].

use crate::document::{NativeRange, SurfaceDocument};
use crate::error::SurfaceError;

/// Child indices leading from the editable root to a node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// Path to `node`, or `None` when it is not inside the editable root.
    pub fn to<D: SurfaceDocument>(doc: &D, node: &D::Node) -> Option<Self> {
        let root = doc.root();
        let mut indices = Vec::new();
        let mut current = node.clone();
        while current != root {
            let parent = doc.parent(&current)?;
            let index = doc.children(&parent).iter().position(|c| *c == current)?;
            indices.push(index);
            current = parent;
        }
        indices.reverse();
        Some(Self(indices))
    }

    /// Walk the path from the root.
    pub fn resolve<D: SurfaceDocument>(&self, doc: &D) -> Option<D::Node> {
        let mut current = doc.root();
        for index in &self.0 {
            current = doc.children(&current).into_iter().nth(*index)?;
        }
        Some(current)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

/// One end of a stored range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    pub path: NodePath,
    pub offset: usize,
    /// Whether the container was a text node when captured.
    pub is_text: bool,
}

impl Boundary {
    fn capture<D: SurfaceDocument>(doc: &D, node: &D::Node, offset: usize) -> Option<Self> {
        Some(Self {
            path: NodePath::to(doc, node)?,
            offset,
            is_text: doc.tag_name(node).is_none(),
        })
    }

    fn resolve<D: SurfaceDocument>(&self, doc: &D) -> Option<D::Node> {
        let node = self.path.resolve(doc)?;
        let is_text = doc.tag_name(&node).is_none();
        (is_text == self.is_text && self.offset <= doc.node_len(&node)).then_some(node)
    }
}

/// A captured selection range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeAnchor {
    pub start: Boundary,
    pub end: Boundary,
}

/// Holds the most recent selection seen inside the editable root.
#[derive(Debug, Clone, Default)]
pub struct RangeStore {
    anchor: Option<RangeAnchor>,
}

impl RangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the native selection.
    ///
    /// Selections outside the editable root are ignored so the previous
    /// anchor stays available. Returns whether a new anchor was stored.
    pub fn capture<D: SurfaceDocument>(&mut self, doc: &D) -> bool {
        let Some(range) = doc.selection_range() else {
            return false;
        };
        let start = Boundary::capture(doc, &range.start_container, range.start_offset);
        let end = Boundary::capture(doc, &range.end_container, range.end_offset);
        match (start, end) {
            (Some(start), Some(end)) => {
                self.anchor = Some(RangeAnchor { start, end });
                true
            }
            _ => false,
        }
    }

    /// Re-apply the stored anchor as the native selection.
    pub fn restore<D: SurfaceDocument>(&self, doc: &mut D) -> Result<(), SurfaceError> {
        let anchor = self.anchor.as_ref().ok_or(SurfaceError::NoAnchor)?;
        let start = anchor.start.resolve(doc).ok_or(SurfaceError::StaleAnchor)?;
        let end = anchor.end.resolve(doc).ok_or(SurfaceError::StaleAnchor)?;
        doc.set_selection_range(&NativeRange {
            start_container: start,
            start_offset: anchor.start.offset,
            end_container: end,
            end_offset: anchor.end.offset,
        })
        .map_err(|e| {
            tracing::debug!(error = %e, "native selection rejected stored anchor");
            SurfaceError::StaleAnchor
        })
    }

    pub fn anchor(&self) -> Option<&RangeAnchor> {
        self.anchor.as_ref()
    }

    pub fn clear(&mut self) {
        self.anchor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;

    fn text_in_second_paragraph(doc: &MemoryDocument) -> crate::memory::NodeId {
        let p = doc.children(&doc.root())[1];
        doc.children(&p)[0]
    }

    #[test]
    fn test_capture_and_restore() {
        let mut doc = MemoryDocument::from_html("<p>one</p><p>two</p>");
        let text = text_in_second_paragraph(&doc);
        doc.set_selection_range(&NativeRange {
            start_container: text,
            start_offset: 1,
            end_container: text,
            end_offset: 3,
        })
        .unwrap();

        let mut store = RangeStore::new();
        assert!(store.capture(&doc));
        assert_eq!(store.anchor().unwrap().start.path.indices(), &[1, 0]);

        // Native selection moves away, then comes back through the store.
        let root = doc.root();
        doc.collapse_to_end(&root);
        store.restore(&mut doc).unwrap();
        assert_eq!(doc.selected_text(), "wo");
    }

    #[test]
    fn test_restore_without_capture() {
        let mut doc = MemoryDocument::from_html("<p>one</p>");
        let store = RangeStore::new();
        assert!(matches!(store.restore(&mut doc), Err(SurfaceError::NoAnchor)));
    }

    #[test]
    fn test_removed_anchor_is_stale() {
        let mut doc = MemoryDocument::from_html("<p>one</p><p>two</p>");
        let text = text_in_second_paragraph(&doc);
        doc.set_selection_range(&NativeRange::caret(text, 2)).unwrap();

        let mut store = RangeStore::new();
        store.capture(&doc);

        let root = doc.root();
        let second = doc.children(&root)[1];
        doc.remove_child(&root, &second);
        assert!(matches!(
            store.restore(&mut doc),
            Err(SurfaceError::StaleAnchor)
        ));
    }

    #[test]
    fn test_kind_change_is_stale() {
        let mut doc = MemoryDocument::from_html("<p>one</p><p>two</p>");
        let text = text_in_second_paragraph(&doc);
        doc.set_selection_range(&NativeRange::caret(text, 0)).unwrap();

        let mut store = RangeStore::new();
        store.capture(&doc);

        // Same path now lands on an element.
        let root = doc.root();
        let second = doc.children(&root)[1];
        doc.set_inner_html(&second, "<b>two</b>");
        assert!(matches!(
            store.restore(&mut doc),
            Err(SurfaceError::StaleAnchor)
        ));
    }

    #[test]
    fn test_missing_selection_keeps_previous_anchor() {
        let mut doc = MemoryDocument::from_html("<p>one</p>");
        let p = doc.children(&doc.root())[0];
        doc.set_selection_range(&NativeRange::caret(p, 1)).unwrap();

        let mut store = RangeStore::new();
        assert!(store.capture(&doc));
        let before = store.anchor().cloned();

        // A document with no selection leaves the anchor untouched.
        let empty = MemoryDocument::new();
        assert!(!store.capture(&empty));
        assert_eq!(store.anchor().cloned(), before);
    }
}
