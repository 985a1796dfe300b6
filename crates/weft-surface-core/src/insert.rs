//! Markup for host-requested insertions.
//!
//! Payloads are trusted as given; attribute values are only quoted so the
//! result parses back into the element the host asked for.

use crate::image::{RESIZABLE_CLASS, format_number, format_px};

/// Parameters of an image insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageInsert {
    pub url: String,
    pub alt: Option<String>,
    /// Durable width, verbatim as the host sent it.
    pub width: Option<String>,
    pub height: Option<String>,
    /// Clockwise rotation in degrees; only 90, 180 and 270 have an effect.
    pub rotation: Option<u32>,
}

/// Parameters of a video insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoInsert {
    pub url: String,
    pub width: String,
    pub height: String,
    /// A local file rather than an embeddable YouTube URL.
    pub from_device: bool,
}

fn attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&html_escape::encode_double_quoted_attribute(value));
    out.push('"');
}

/// Anchor inserted when no text is selected.
pub fn link_html(url: &str, title: &str) -> String {
    let mut out = String::from("<a");
    attr(&mut out, "href", url);
    out.push('>');
    out.push_str(title);
    out.push_str("</a>");
    out
}

/// Rotation class for a rotation in degrees.
pub fn rotation_class(rotation: u32) -> Option<&'static str> {
    match rotation {
        90 => Some("rotate90deg"),
        180 => Some("rotate180deg"),
        270 => Some("rotate270deg"),
        _ => None,
    }
}

impl ImageInsert {
    /// Build the `<img>` markup.
    ///
    /// With resizing enabled the image gets the resizable marker and an
    /// explicit style width; when no width was given it defaults to
    /// `ratio` of `layout_width`, rounded, and that default is recorded as
    /// the durable width.
    pub fn to_html(&self, resizing_enabled: bool, layout_width: f64, ratio: f64) -> String {
        let width = self.width.clone().filter(|w| !w.is_empty());
        let height = self.height.clone().filter(|h| !h.is_empty());

        let mut classes = Vec::new();
        if resizing_enabled {
            classes.push(RESIZABLE_CLASS);
        }
        if let Some(class) = self.rotation.and_then(rotation_class) {
            classes.push(class);
        }

        let (data_width, style_width) = match (resizing_enabled, width) {
            (true, Some(w)) => {
                let style = format!("{w}px");
                (Some(w), Some(style))
            }
            (true, None) => {
                let target = (layout_width * ratio).round();
                (Some(format_number(target)), Some(format_px(target)))
            }
            (false, w) => (w, None),
        };

        let mut out = String::from("<img");
        attr(&mut out, "src", &self.url);
        if let Some(alt) = self.alt.as_deref().filter(|a| !a.is_empty()) {
            attr(&mut out, "alt", alt);
        }
        if let Some(w) = &data_width {
            attr(&mut out, "data-width", w);
        }
        if let Some(h) = &height {
            attr(&mut out, "data-height", h);
        }
        if !classes.is_empty() {
            attr(&mut out, "class", &classes.join(" "));
        }
        if let Some(style) = style_width {
            attr(&mut out, "style", &format!("width: {style};"));
        }
        out.push('>');
        out
    }
}

impl VideoInsert {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        if self.from_device {
            out.push_str("<video");
            attr(&mut out, "width", &self.width);
            attr(&mut out, "height", &self.height);
            out.push_str(" controls><source");
            attr(&mut out, "type", "video/mp4");
            attr(&mut out, "src", &self.url);
            out.push_str("></video>");
        } else {
            out.push_str("<iframe");
            attr(&mut out, "width", &self.width);
            attr(&mut out, "height", &self.height);
            attr(&mut out, "src", &self.url);
            attr(&mut out, "title", "YouTube video player");
            attr(&mut out, "frameborder", "0");
            attr(
                &mut out,
                "allow",
                "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture",
            );
            out.push_str("></iframe>");
        }
        out
    }
}

/// Checkbox followed by a non-breaking space so the caret can sit after it.
pub fn checkbox_html(label: &str) -> String {
    let mut out = String::from("<input");
    attr(&mut out, "type", "checkbox");
    attr(&mut out, "name", label);
    attr(&mut out, "value", label);
    out.push_str("/> &nbsp;");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_default_width_from_viewport() {
        let image = ImageInsert {
            url: "a.png".into(),
            ..ImageInsert::default()
        };
        assert_eq!(
            image.to_html(true, 800.0, 0.75),
            r#"<img src="a.png" data-width="600" class="resizable" style="width: 600px;">"#
        );
    }

    #[test]
    fn test_image_with_explicit_size_and_rotation() {
        let image = ImageInsert {
            url: "a.png".into(),
            alt: Some("cat".into()),
            width: Some("320".into()),
            height: Some("240".into()),
            rotation: Some(90),
        };
        assert_eq!(
            image.to_html(true, 800.0, 0.75),
            r#"<img src="a.png" alt="cat" data-width="320" data-height="240" class="resizable rotate90deg" style="width: 320px;">"#
        );
        assert_eq!(
            image.to_html(false, 800.0, 0.75),
            r#"<img src="a.png" alt="cat" data-width="320" data-height="240" class="rotate90deg">"#
        );
    }

    #[test]
    fn test_unknown_rotation_is_ignored() {
        assert_eq!(rotation_class(45), None);
        assert_eq!(rotation_class(0), None);
        assert_eq!(rotation_class(270), Some("rotate270deg"));
    }

    #[test]
    fn test_video_markup() {
        let video = VideoInsert {
            url: "clip.mp4".into(),
            width: "320".into(),
            height: "180".into(),
            from_device: true,
        };
        assert_eq!(
            video.to_html(),
            r#"<video width="320" height="180" controls><source type="video/mp4" src="clip.mp4"></video>"#
        );

        let video = VideoInsert {
            from_device: false,
            url: "https://www.youtube.com/embed/x".into(),
            ..video
        };
        assert!(video.to_html().starts_with(
            r#"<iframe width="320" height="180" src="https://www.youtube.com/embed/x" title="YouTube video player""#
        ));
    }

    #[test]
    fn test_link_and_checkbox() {
        assert_eq!(
            link_html("https://x.y/?a=1&b=2", "here"),
            r#"<a href="https://x.y/?a=1&amp;b=2">here</a>"#
        );
        assert_eq!(
            checkbox_html("done"),
            r#"<input type="checkbox" name="done" value="done"/> &nbsp;"#
        );
    }
}
