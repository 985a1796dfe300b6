//! Classification of mutation batches from the editable tree.

use crate::document::{MutationBatch, MutationRecord, SurfaceDocument};

/// What a batch of mutation records asks the surface to do.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<N> {
    /// Content height may have changed.
    pub height_dirty: bool,
    /// Images that were inserted, directly or inside an inserted subtree,
    /// in first-seen order without duplicates.
    pub images: Vec<N>,
}

impl<N> Default for BatchOutcome<N> {
    fn default() -> Self {
        Self {
            height_dirty: false,
            images: Vec::new(),
        }
    }
}

/// Classify one batch.
///
/// Records whose target is outside the editable root are skipped. Inserted
/// images are only reported if they are still attached when the batch is
/// processed.
pub fn classify<D: SurfaceDocument>(
    doc: &D,
    batch: &MutationBatch<D::Node>,
) -> BatchOutcome<D::Node> {
    let root = doc.root();
    let mut outcome = BatchOutcome::default();

    for record in batch {
        if !doc.contains(&root, record.target()) {
            continue;
        }
        match record {
            MutationRecord::ChildList { added, removed, .. } => {
                if !added.is_empty() || !removed.is_empty() {
                    outcome.height_dirty = true;
                }
                for node in added {
                    if !doc.contains(&root, node) {
                        continue;
                    }
                    let found = if doc.is_tag(node, "img") {
                        vec![node.clone()]
                    } else {
                        doc.images_under(node)
                    };
                    for image in found {
                        if !outcome.images.contains(&image) {
                            outcome.images.push(image);
                        }
                    }
                }
            }
            MutationRecord::Attributes { target, .. } => {
                if doc.is_tag(target, "img") {
                    outcome.height_dirty = true;
                }
            }
        }
    }

    tracing::trace!(
        records = batch.len(),
        images = outcome.images.len(),
        height_dirty = outcome.height_dirty,
        "classified mutation batch"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;

    #[test]
    fn test_inserted_subtree_images_are_routed() {
        let mut doc = MemoryDocument::from_html("<p>a</p>");
        let root = doc.root();
        let p = doc.children(&root)[0];
        doc.set_inner_html(&p, r#"<span><img src="1.png"></span><img src="2.png">"#);

        let batch = doc.take_mutation_batch().unwrap();
        let outcome = classify(&doc, &batch);
        assert!(outcome.height_dirty);
        assert_eq!(outcome.images, doc.images_under(&root));
        assert_eq!(outcome.images.len(), 2);
    }

    #[test]
    fn test_attribute_change_on_image_marks_height() {
        let mut doc = MemoryDocument::from_html(r#"<p class="x"><img src="1.png"></p>"#);
        let root = doc.root();
        let p = doc.children(&root)[0];
        let img = doc.images_under(&root)[0];

        doc.set_attribute(&p, "class", "y");
        let batch = doc.take_mutation_batch().unwrap();
        assert_eq!(classify(&doc, &batch), BatchOutcome::default());

        doc.set_attribute(&img, "src", "2.png");
        let batch = doc.take_mutation_batch().unwrap();
        assert!(classify(&doc, &batch).height_dirty);
    }

    #[test]
    fn test_records_outside_root_are_ignored() {
        let mut doc = MemoryDocument::from_html("<p>a</p>");
        let root = doc.root();
        let p = doc.children(&root)[0];
        doc.remove_child(&root, &p);
        let _ = doc.take_mutation_batch();

        // A hand-built record targeting the detached paragraph.
        let img = doc.create_element("img");
        let batch = vec![MutationRecord::ChildList {
            target: p,
            added: vec![img],
            removed: vec![],
        }];
        assert_eq!(classify(&doc, &batch), BatchOutcome::default());
    }

    #[test]
    fn test_images_removed_before_processing_are_skipped() {
        let mut doc = MemoryDocument::from_html("<p>a</p>");
        let root = doc.root();
        let p = doc.children(&root)[0];
        let img = doc.create_element("img");
        doc.append_child(&p, &img);
        doc.remove_child(&p, &img);

        let batch = doc.take_mutation_batch().unwrap();
        let outcome = classify(&doc, &batch);
        assert!(outcome.height_dirty);
        assert!(outcome.images.is_empty());
    }
}
