//! Image geometry: wrappers, resize handles, and durable sizing.
//!
//! `data-width` / `data-height` are the durable record of an image's size.
//! Inline `width` / `height` style on the image and its wrapper is derived
//! from them and is dropped again on export.

use crate::class_list::{add_class, find_all_by_class, find_by_class, has_class, remove_class};
use crate::document::SurfaceDocument;

/// Marker class on images that accept resize gestures.
pub const RESIZABLE_CLASS: &str = "resizable";
/// Editor-only visual class, never exported.
pub const EDITOR_SMALL_CLASS: &str = "editor-small";
pub const WRAPPER_CLASS: &str = "editor-image-wrapper";
pub const HANDLE_CLASS: &str = "editor-resize-handle";
pub const HANDLE_BOTTOM_RIGHT_CLASS: &str = "editor-resize-handle--bottom-right";
pub const HANDLE_TOP_RIGHT_CLASS: &str = "editor-resize-handle--top-right";

pub const DATA_WIDTH: &str = "data-width";
pub const DATA_HEIGHT: &str = "data-height";

/// Parse the leading number of an attribute value, like `parseFloat`.
pub fn parse_dimension(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse().ok()
}

/// Format a dimension without a trailing `.0`.
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

pub fn format_px(value: f64) -> String {
    format!("{}px", value)
}

/// Positive durable dimension stored in `attr`.
fn durable<D: SurfaceDocument>(doc: &D, image: &D::Node, attr: &str) -> Option<f64> {
    doc.attribute(image, attr)
        .and_then(|raw| parse_dimension(&raw))
        .filter(|v| *v > 0.0)
}

/// The wrapper directly around `image`, if it has one.
pub fn wrapper_of<D: SurfaceDocument>(doc: &D, image: &D::Node) -> Option<D::Node> {
    doc.parent(image)
        .filter(|parent| has_class(doc, parent, WRAPPER_CLASS))
}

/// Manages resizable presentation of images in the editable tree.
#[derive(Debug, Clone)]
pub struct ImageGeometry {
    resizing_enabled: bool,
}

impl ImageGeometry {
    pub fn new(resizing_enabled: bool) -> Self {
        Self { resizing_enabled }
    }

    pub fn resizing_enabled(&self) -> bool {
        self.resizing_enabled
    }

    /// Make an image resizable. Safe to call any number of times.
    pub fn prepare<D: SurfaceDocument>(&self, doc: &mut D, image: &D::Node) {
        if !doc.is_tag(image, "img") {
            return;
        }
        add_class(doc, image, RESIZABLE_CLASS);
        if let Some(wrapper) = Self::ensure_wrapper(doc, image) {
            Self::ensure_handles(doc, &wrapper);
        }
        Self::ensure_load_listener(doc, image);

        // Legacy native size attributes become the durable record.
        for (native, data) in [("width", DATA_WIDTH), ("height", DATA_HEIGHT)] {
            if doc.attribute(image, data).is_some_and(|v| !v.is_empty()) {
                continue;
            }
            if let Some(value) = doc.attribute(image, native).filter(|v| !v.is_empty()) {
                doc.set_attribute(image, data, &value);
            }
        }

        if doc.is_loaded(image) {
            Self::resolve_geometry(doc, image);
        } else {
            doc.remove_attribute(image, "width");
            doc.remove_attribute(image, "height");
        }
    }

    /// Prepare every image under the editable root.
    pub fn prepare_all<D: SurfaceDocument>(&self, doc: &mut D) {
        let root = doc.root();
        for image in doc.images_under(&root) {
            self.prepare(doc, &image);
        }
    }

    /// Wrap `image` in a sizing container unless it already has one.
    pub fn ensure_wrapper<D: SurfaceDocument>(doc: &mut D, image: &D::Node) -> Option<D::Node> {
        let parent = doc.parent(image)?;
        if has_class(doc, &parent, WRAPPER_CLASS) {
            return Some(parent);
        }
        let wrapper = doc.create_element("span");
        doc.set_attribute(&wrapper, "class", WRAPPER_CLASS);
        doc.set_style_property(&wrapper, "display", "inline-block");
        doc.set_style_property(&wrapper, "position", "relative");
        doc.insert_before(&parent, &wrapper, Some(image));
        doc.append_child(&wrapper, image);
        Some(wrapper)
    }

    /// Add whichever resize handles the wrapper is missing.
    pub fn ensure_handles<D: SurfaceDocument>(doc: &mut D, wrapper: &D::Node) {
        for corner in [HANDLE_BOTTOM_RIGHT_CLASS, HANDLE_TOP_RIGHT_CLASS] {
            if find_by_class(doc, wrapper, corner).is_some() {
                continue;
            }
            let handle = doc.create_element("span");
            doc.set_attribute(&handle, "class", &format!("{HANDLE_CLASS} {corner}"));
            doc.append_child(wrapper, &handle);
        }
    }

    /// Attach the load listener at most once per image.
    pub fn ensure_load_listener<D: SurfaceDocument>(doc: &mut D, image: &D::Node) {
        if !doc.has_load_listener(image) {
            doc.attach_load_listener(image);
        }
    }

    /// Settle the image's explicit size and mirror it onto the wrapper.
    ///
    /// Durable attributes win; otherwise the rendered size, then the
    /// intrinsic size, is measured and persisted. Without a wrapper this
    /// does nothing.
    pub fn resolve_geometry<D: SurfaceDocument>(doc: &mut D, image: &D::Node) {
        let Some(wrapper) = wrapper_of(doc, image) else {
            return;
        };
        let rendered = doc.rendered_size(image);
        let natural = doc.natural_size(image);
        let measured_width = if rendered.width > 0.0 {
            rendered.width
        } else {
            natural.width
        };
        let measured_height = if rendered.height > 0.0 {
            rendered.height
        } else {
            natural.height
        };

        let width = Self::resolve_axis(doc, image, DATA_WIDTH, measured_width);
        let height = Self::resolve_axis(doc, image, DATA_HEIGHT, measured_height);

        for (property, value) in [("width", width), ("height", height)] {
            let css = value.map(format_px).unwrap_or_default();
            doc.set_style_property(&wrapper, property, &css);
            doc.set_style_property(image, property, &css);
        }

        if width.is_some() || height.is_some() {
            doc.remove_attribute(image, "width");
            doc.remove_attribute(image, "height");
        }
    }

    fn resolve_axis<D: SurfaceDocument>(
        doc: &mut D,
        image: &D::Node,
        attr: &str,
        measured: f64,
    ) -> Option<f64> {
        if let Some(value) = durable(doc, image, attr) {
            return Some(value);
        }
        if measured > 0.0 {
            doc.set_attribute(image, attr, &format_number(measured.round()));
            Some(measured)
        } else {
            None
        }
    }

    /// Make images resizable from now on, including those already present.
    pub fn enable<D: SurfaceDocument>(&mut self, doc: &mut D) {
        self.resizing_enabled = true;
        self.prepare_all(doc);
    }

    /// Stop making images resizable and strip the live document.
    pub fn disable<D: SurfaceDocument>(&mut self, doc: &mut D) {
        self.resizing_enabled = false;
        let root = doc.root();
        strip_for_export(doc, &root);
    }
}

/// Remove every editing artifact from images under `root`.
pub fn strip_for_export<D: SurfaceDocument>(doc: &mut D, root: &D::Node) {
    for image in doc.images_under(root) {
        remove_class(doc, &image, RESIZABLE_CLASS);
        remove_class(doc, &image, EDITOR_SMALL_CLASS);

        let Some(wrapper) = wrapper_of(doc, &image) else {
            continue;
        };
        for handle in find_all_by_class(doc, &wrapper, HANDLE_CLASS) {
            if let Some(parent) = doc.parent(&handle) {
                doc.remove_child(&parent, &handle);
            }
        }
        if let Some(outer) = doc.parent(&wrapper) {
            doc.insert_before(&outer, &image, Some(&wrapper));
            doc.remove_child(&outer, &wrapper);
        }
    }
}

/// Record measured sizes on exported image copies.
///
/// `originals` and `copies` correspond by index. The rendered (or
/// intrinsic) size becomes the copy's inline `width` / `height` so the
/// export displays as it did live, and fills in missing durable geometry.
/// Native `width` / `height` attributes never survive the export.
pub fn apply_export_sizing<D: SurfaceDocument>(
    doc: &mut D,
    originals: &[D::Node],
    copies: &[D::Node],
) {
    for (index, copy) in copies.iter().enumerate() {
        if let Some(original) = originals.get(index) {
            let rendered = doc.rendered_size(original);
            let natural = doc.natural_size(original);
            let width = if rendered.width > 0.0 {
                rendered.width
            } else {
                natural.width
            };
            let height = if rendered.height > 0.0 {
                rendered.height
            } else {
                natural.height
            };
            if width > 0.0 {
                doc.set_style_property(copy, "width", &format_px(width));
                doc.set_attribute(copy, "width", &format_number(width));
            }
            if height > 0.0 {
                doc.set_style_property(copy, "height", &format_px(height));
                doc.set_attribute(copy, "height", &format_number(height));
            }
        }

        for (native, data) in [("width", DATA_WIDTH), ("height", DATA_HEIGHT)] {
            let stored = doc
                .attribute(copy, data)
                .filter(|v| !v.is_empty())
                .or_else(|| doc.attribute(copy, native).filter(|v| !v.is_empty()));
            doc.remove_attribute(copy, native);
            if let Some(value) = stored {
                doc.set_attribute(copy, data, &value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Size;
    use crate::memory::{MediaState, MemoryDocument};

    fn count_class(doc: &MemoryDocument, class: &str) -> usize {
        find_all_by_class(doc, &doc.root(), class).len()
    }

    #[test]
    fn test_parse_dimension() {
        assert_eq!(parse_dimension("600"), Some(600.0));
        assert_eq!(parse_dimension(" 600.5px"), Some(600.5));
        assert_eq!(parse_dimension(".5"), Some(0.5));
        assert_eq!(parse_dimension("1e3"), Some(1000.0));
        assert_eq!(parse_dimension("-20"), Some(-20.0));
        assert_eq!(parse_dimension("auto"), None);
        assert_eq!(parse_dimension(""), None);
        assert_eq!(parse_dimension("."), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(600.0), "600");
        assert_eq!(format_number(600.5), "600.5");
        assert_eq!(format_px(50.0), "50px");
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let mut doc = MemoryDocument::from_html(r#"<p><img src="a.png"></p>"#);
        let geometry = ImageGeometry::new(true);
        let img = doc.images_under(&doc.root())[0];

        geometry.prepare(&mut doc, &img);
        let once = doc.inner_html(&doc.root());
        geometry.prepare(&mut doc, &img);
        assert_eq!(doc.inner_html(&doc.root()), once);

        assert_eq!(count_class(&doc, WRAPPER_CLASS), 1);
        assert_eq!(count_class(&doc, HANDLE_BOTTOM_RIGHT_CLASS), 1);
        assert_eq!(count_class(&doc, HANDLE_TOP_RIGHT_CLASS), 1);
        assert_eq!(count_class(&doc, HANDLE_CLASS), 2);
        assert!(doc.has_load_listener(&img));
        assert_eq!(
            once,
            concat!(
                r#"<p><span class="editor-image-wrapper" style="display: inline-block; position: relative;">"#,
                r#"<img src="a.png" class="resizable">"#,
                r#"<span class="editor-resize-handle editor-resize-handle--bottom-right"></span>"#,
                r#"<span class="editor-resize-handle editor-resize-handle--top-right"></span>"#,
                r#"</span></p>"#
            )
        );
    }

    #[test]
    fn test_prepare_migrates_native_size_and_strips_until_loaded() {
        let mut doc = MemoryDocument::from_html(r#"<img src="a.png" width="320" height="200">"#);
        let img = doc.images_under(&doc.root())[0];
        ImageGeometry::new(true).prepare(&mut doc, &img);

        assert_eq!(doc.attribute(&img, DATA_WIDTH).as_deref(), Some("320"));
        assert_eq!(doc.attribute(&img, DATA_HEIGHT).as_deref(), Some("200"));
        assert_eq!(doc.attribute(&img, "width"), None);
        assert_eq!(doc.attribute(&img, "height"), None);
        // Not loaded yet: no derived sizing.
        assert_eq!(doc.style_property(&img, "width"), None);
    }

    #[test]
    fn test_loaded_image_resolves_immediately() {
        let mut doc = MemoryDocument::from_html(r#"<img src="a.png" data-width="600">"#);
        let img = doc.images_under(&doc.root())[0];
        doc.set_media(
            img,
            MediaState {
                rendered: Size::new(0.0, 0.0),
                natural: Size::new(1200.0, 800.0),
                loaded: true,
            },
        );
        ImageGeometry::new(true).prepare(&mut doc, &img);

        let wrapper = wrapper_of(&doc, &img).unwrap();
        assert_eq!(doc.style_property(&img, "width").as_deref(), Some("600px"));
        assert_eq!(doc.style_property(&wrapper, "width").as_deref(), Some("600px"));
        // Height falls back to the intrinsic size and is persisted.
        assert_eq!(doc.attribute(&img, DATA_HEIGHT).as_deref(), Some("800"));
        assert_eq!(doc.style_property(&img, "height").as_deref(), Some("800px"));
    }

    #[test]
    fn test_resolve_prefers_rendered_size_and_rounds_durable_value() {
        let mut doc = MemoryDocument::from_html(r#"<img src="a.png">"#);
        let img = doc.images_under(&doc.root())[0];
        let geometry = ImageGeometry::new(true);
        geometry.prepare(&mut doc, &img);

        doc.set_rendered_size(img, Size::new(333.4, 0.0));
        doc.set_natural_size(img, Size::new(1000.0, 0.0));
        ImageGeometry::resolve_geometry(&mut doc, &img);

        assert_eq!(doc.attribute(&img, DATA_WIDTH).as_deref(), Some("333"));
        assert_eq!(doc.style_property(&img, "width").as_deref(), Some("333.4px"));
        // No height anywhere: explicit height stays cleared.
        assert_eq!(doc.attribute(&img, DATA_HEIGHT), None);
        assert_eq!(doc.style_property(&img, "height"), None);
    }

    #[test]
    fn test_resolve_without_wrapper_is_noop() {
        let mut doc = MemoryDocument::from_html(r#"<img src="a.png">"#);
        let img = doc.images_under(&doc.root())[0];
        doc.set_natural_size(img, Size::new(100.0, 100.0));
        ImageGeometry::resolve_geometry(&mut doc, &img);
        assert_eq!(doc.inner_html(&doc.root()), r#"<img src="a.png">"#);
    }

    #[test]
    fn test_strip_is_left_inverse_of_prepare() {
        let html = r#"<p>before<img src="a.png" data-width="600" data-height="400">after</p>"#;
        let mut doc = MemoryDocument::from_html(html);
        let geometry = ImageGeometry::new(true);
        geometry.prepare_all(&mut doc);
        assert_ne!(doc.inner_html(&doc.root()), html);

        let root = doc.root();
        strip_for_export(&mut doc, &root);
        assert_eq!(count_class(&doc, WRAPPER_CLASS), 0);
        assert_eq!(count_class(&doc, HANDLE_CLASS), 0);
        assert_eq!(count_class(&doc, RESIZABLE_CLASS), 0);

        let img = doc.images_under(&root)[0];
        assert_eq!(doc.attribute(&img, DATA_WIDTH).as_deref(), Some("600"));
        assert_eq!(doc.attribute(&img, DATA_HEIGHT).as_deref(), Some("400"));
        assert_eq!(doc.parent(&img), Some(doc.children(&root)[0]));
    }

    #[test]
    fn test_export_sizing_moves_native_size() {
        let mut doc = MemoryDocument::from_html(
            r#"<img src="a.png" width="50" style="width: 50px; transform: rotate(90deg);"><img src="b.png">"#,
        );
        let images = doc.images_under(&doc.root());
        doc.set_rendered_size(images[1], Size::new(640.0, 480.0));

        let root = doc.root();
        let copy = doc.clone_detached(&root);
        let copies = doc.images_under(&copy);
        apply_export_sizing(&mut doc, &images, &copies);

        assert_eq!(
            doc.inner_html(&copy),
            concat!(
                r#"<img src="a.png" style="width: 50px; transform: rotate(90deg);" data-width="50">"#,
                r#"<img src="b.png" style="width: 640px; height: 480px;" data-width="640" data-height="480">"#
            )
        );
    }

    #[test]
    fn test_disable_strips_live_document() {
        let mut doc = MemoryDocument::from_html(r#"<p><img class="editor-small" src="a.png"></p>"#);
        let mut geometry = ImageGeometry::new(true);
        geometry.prepare_all(&mut doc);
        geometry.disable(&mut doc);

        assert!(!geometry.resizing_enabled());
        assert_eq!(doc.inner_html(&doc.root()), r#"<p><img src="a.png"></p>"#);
    }
}
