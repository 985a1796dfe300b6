//! `class` attribute helpers that work on any [`SurfaceDocument`].
//!
//! Removing the last class drops the attribute entirely so exported markup
//! matches what the host originally supplied.

use crate::document::SurfaceDocument;

pub fn has_class<D: SurfaceDocument>(doc: &D, node: &D::Node, class: &str) -> bool {
    doc.attribute(node, "class")
        .is_some_and(|value| value.split_ascii_whitespace().any(|c| c == class))
}

pub fn add_class<D: SurfaceDocument>(doc: &mut D, node: &D::Node, class: &str) {
    if has_class(doc, node, class) {
        return;
    }
    let value = match doc.attribute(node, "class") {
        Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
        _ => class.to_string(),
    };
    doc.set_attribute(node, "class", &value);
}

pub fn remove_class<D: SurfaceDocument>(doc: &mut D, node: &D::Node, class: &str) {
    if !has_class(doc, node, class) {
        return;
    }
    let remaining = doc
        .attribute(node, "class")
        .unwrap_or_default()
        .split_ascii_whitespace()
        .filter(|c| *c != class)
        .collect::<Vec<_>>()
        .join(" ");

    if remaining.is_empty() {
        doc.remove_attribute(node, "class");
    } else {
        doc.set_attribute(node, "class", &remaining);
    }
}

/// First descendant of `node` carrying `class`.
pub fn find_by_class<D: SurfaceDocument>(doc: &D, node: &D::Node, class: &str) -> Option<D::Node> {
    doc.descendants(node)
        .into_iter()
        .find(|n| has_class(doc, n, class))
}

/// Every descendant of `node` carrying `class`.
pub fn find_all_by_class<D: SurfaceDocument>(doc: &D, node: &D::Node, class: &str) -> Vec<D::Node> {
    doc.descendants(node)
        .into_iter()
        .filter(|n| has_class(doc, n, class))
        .collect()
}
