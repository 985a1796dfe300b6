//! Resize and rotate gestures on images.
//!
//! The pointer-gesture machinery lives in the host page; it reports the new
//! rectangle or rotation delta and this module writes the geometry back.

use crate::document::SurfaceDocument;
use crate::image::{
    DATA_HEIGHT, DATA_WIDTH, ImageGeometry, format_number, format_px, parse_dimension, wrapper_of,
};

/// Degrees within which a rotation snaps to a right angle.
pub const ROTATION_SNAP_DEGREES: f64 = 10.0;

/// Smallest size a resize may produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeLimits {
    pub min_width: f64,
    pub min_height: f64,
}

/// Apply a resize gesture's rectangle to `image`.
pub fn apply_resize<D: SurfaceDocument>(
    doc: &mut D,
    image: &D::Node,
    width: f64,
    height: f64,
    limits: ResizeLimits,
) {
    if !doc.is_tag(image, "img") {
        return;
    }
    let drag_x = offset(doc, image, "data-x");
    let drag_y = offset(doc, image, "data-y");

    let width = width.max(limits.min_width);
    let height = height.max(limits.min_height);
    let (width_px, height_px) = (format_px(width), format_px(height));

    doc.set_style_property(image, "width", &width_px);
    doc.set_style_property(image, "height", &height_px);
    doc.remove_attribute(image, "width");
    doc.remove_attribute(image, "height");
    doc.set_attribute(image, DATA_WIDTH, &format_number(width.round()));
    doc.set_attribute(image, DATA_HEIGHT, &format_number(height.round()));

    if let Some(wrapper) = wrapper_of(doc, image) {
        doc.set_style_property(&wrapper, "width", &width_px);
        doc.set_style_property(&wrapper, "height", &height_px);
    }

    doc.set_attribute(image, "data-x", &format_number(drag_x));
    doc.set_attribute(image, "data-y", &format_number(drag_y));
    ImageGeometry::resolve_geometry(doc, image);
}

fn offset<D: SurfaceDocument>(doc: &D, image: &D::Node, attr: &str) -> f64 {
    doc.attribute(image, attr)
        .and_then(|raw| parse_dimension(&raw))
        .unwrap_or(0.0)
}

/// Snap an accumulated angle to 0/90/180/270 when close enough.
pub fn snap_angle(angle: f64) -> f64 {
    let wrapped = angle % 360.0;
    for right in [90.0, 180.0, 270.0] {
        if (right - wrapped).abs() < ROTATION_SNAP_DEGREES {
            return right;
        }
    }
    if wrapped.abs() < ROTATION_SNAP_DEGREES {
        return 0.0;
    }
    angle
}

/// Accumulated rotation of the active gesture.
#[derive(Debug, Clone, Default)]
pub struct RotationGesture {
    angle: f64,
}

impl RotationGesture {
    /// Add a rotation delta and return the (possibly snapped) angle.
    pub fn rotate(&mut self, delta: f64) -> f64 {
        self.angle = snap_angle(self.angle + delta);
        self.angle
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }
}

/// CSS transform for an angle in degrees.
pub fn rotation_transform(angle: f64) -> String {
    format!("rotate({}deg)", format_number(angle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;

    const LIMITS: ResizeLimits = ResizeLimits {
        min_width: 100.0,
        min_height: 50.0,
    };

    #[test]
    fn test_resize_clamps_and_persists() {
        let mut doc = MemoryDocument::from_html(r#"<p><img src="a.png" width="10"></p>"#);
        let img = doc.images_under(&doc.root())[0];
        ImageGeometry::new(true).prepare(&mut doc, &img);

        apply_resize(&mut doc, &img, 40.0, 260.6, LIMITS);

        let wrapper = wrapper_of(&doc, &img).unwrap();
        assert_eq!(doc.attribute(&img, DATA_WIDTH).as_deref(), Some("100"));
        assert_eq!(doc.attribute(&img, DATA_HEIGHT).as_deref(), Some("261"));
        assert_eq!(doc.attribute(&img, "width"), None);
        assert_eq!(doc.style_property(&img, "width").as_deref(), Some("100px"));
        assert_eq!(doc.style_property(&wrapper, "width").as_deref(), Some("100px"));
        assert_eq!(doc.attribute(&img, "data-x").as_deref(), Some("0"));
    }

    #[test]
    fn test_resize_keeps_drag_offsets() {
        let mut doc = MemoryDocument::from_html(r#"<img src="a.png" data-x="12.5" data-y="-4">"#);
        let img = doc.images_under(&doc.root())[0];
        apply_resize(&mut doc, &img, 300.0, 200.0, LIMITS);
        assert_eq!(doc.attribute(&img, "data-x").as_deref(), Some("12.5"));
        assert_eq!(doc.attribute(&img, "data-y").as_deref(), Some("-4"));
    }

    #[test]
    fn test_snap_angle() {
        assert_eq!(snap_angle(84.0), 90.0);
        assert_eq!(snap_angle(95.0), 90.0);
        assert_eq!(snap_angle(185.0), 180.0);
        assert_eq!(snap_angle(262.0), 270.0);
        assert_eq!(snap_angle(365.0), 0.0);
        assert_eq!(snap_angle(-5.0), 0.0);
        assert_eq!(snap_angle(45.0), 45.0);
    }

    #[test]
    fn test_rotation_accumulates_then_sticks() {
        let mut gesture = RotationGesture::default();
        assert_eq!(gesture.rotate(30.0), 30.0);
        assert_eq!(gesture.rotate(52.0), 90.0);
        assert_eq!(gesture.rotate(3.0), 90.0);
        assert_eq!(rotation_transform(gesture.angle()), "rotate(90deg)");
    }
}
