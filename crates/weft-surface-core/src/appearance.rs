//! Visual defaults of the editable area.

use crate::document::SurfaceDocument;

/// One presentation setting pushed by the host.
///
/// Values are CSS strings passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Appearance {
    TextColor(String),
    FontFamily(String),
    FontSize(String),
    Padding {
        left: String,
        top: String,
        right: String,
        bottom: String,
    },
    /// Page background, not the editable element.
    BackgroundColor(String),
    BackgroundImage(String),
    /// Minimum width of the editable element.
    Width(String),
    Height(String),
    TextAlign(String),
    VerticalAlign(String),
    Placeholder(String),
}

impl Appearance {
    pub fn apply<D: SurfaceDocument>(&self, doc: &mut D) {
        let root = doc.root();
        match self {
            Appearance::TextColor(v) => doc.set_style_property(&root, "color", v),
            Appearance::FontFamily(v) => doc.set_style_property(&root, "font-family", v),
            Appearance::FontSize(v) => doc.set_style_property(&root, "font-size", v),
            Appearance::Padding {
                left,
                top,
                right,
                bottom,
            } => {
                doc.set_style_property(&root, "padding-left", left);
                doc.set_style_property(&root, "padding-top", top);
                doc.set_style_property(&root, "padding-right", right);
                doc.set_style_property(&root, "padding-bottom", bottom);
            }
            Appearance::BackgroundColor(v) => doc.set_page_style("background-color", v),
            Appearance::BackgroundImage(v) => {
                doc.set_style_property(&root, "background-image", v)
            }
            Appearance::Width(v) => doc.set_style_property(&root, "min-width", v),
            Appearance::Height(v) => doc.set_style_property(&root, "height", v),
            Appearance::TextAlign(v) => doc.set_style_property(&root, "text-align", v),
            Appearance::VerticalAlign(v) => doc.set_style_property(&root, "vertical-align", v),
            Appearance::Placeholder(v) => doc.set_attribute(&root, "placeholder", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;

    #[test]
    fn test_settings_land_on_root_and_page() {
        let mut doc = MemoryDocument::new();
        Appearance::Padding {
            left: "8px".into(),
            top: "4px".into(),
            right: "8px".into(),
            bottom: "4px".into(),
        }
        .apply(&mut doc);
        Appearance::Width("320px".into()).apply(&mut doc);
        Appearance::BackgroundColor("#fafafa".into()).apply(&mut doc);
        Appearance::Placeholder("Write something".into()).apply(&mut doc);

        let root = doc.root();
        assert_eq!(doc.style_property(&root, "padding-top").as_deref(), Some("4px"));
        assert_eq!(doc.style_property(&root, "min-width").as_deref(), Some("320px"));
        assert_eq!(doc.page_style("background-color"), Some("#fafafa"));
        assert_eq!(
            doc.attribute(&root, "placeholder").as_deref(),
            Some("Write something")
        );
        // Nothing leaks into the content.
        assert_eq!(doc.inner_html(&root), "");
    }
}
