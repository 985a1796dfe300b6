//! Types exposed to JavaScript via wasm-bindgen.

use serde::Deserialize;
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

use weft_surface_browser::{Appearance, ImageInsert, VideoInsert};

/// Image insertion request.
#[derive(Debug, Clone, Deserialize, Tsify)]
#[tsify(from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsImageInsert {
    pub url: String,
    #[tsify(optional)]
    #[serde(default)]
    pub alt: Option<String>,
    /// Durable width, e.g. `"320"`.
    #[tsify(optional)]
    #[serde(default)]
    pub width: Option<String>,
    #[tsify(optional)]
    #[serde(default)]
    pub height: Option<String>,
    /// Clockwise degrees: 90, 180 or 270.
    #[tsify(optional)]
    #[serde(default)]
    pub rotation: Option<u32>,
}

impl From<JsImageInsert> for ImageInsert {
    fn from(js: JsImageInsert) -> Self {
        ImageInsert {
            url: js.url,
            alt: js.alt,
            width: js.width,
            height: js.height,
            rotation: js.rotation,
        }
    }
}

/// Video insertion request.
#[derive(Debug, Clone, Deserialize, Tsify)]
#[tsify(from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsVideoInsert {
    pub url: String,
    pub width: String,
    pub height: String,
    /// Local file rather than a YouTube link.
    #[tsify(optional)]
    #[serde(default)]
    pub from_device: bool,
}

impl From<JsVideoInsert> for VideoInsert {
    fn from(js: JsVideoInsert) -> Self {
        VideoInsert {
            url: js.url,
            width: js.width,
            height: js.height,
            from_device: js.from_device,
        }
    }
}

/// Padding of the editable area, as CSS lengths.
#[derive(Debug, Clone, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct JsPadding {
    pub left: String,
    pub top: String,
    pub right: String,
    pub bottom: String,
}

/// Several appearance settings at once. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize, Tsify)]
#[tsify(from_wasm_abi)]
#[serde(default, rename_all = "camelCase")]
pub struct JsAppearance {
    #[tsify(optional)]
    pub text_color: Option<String>,
    #[tsify(optional)]
    pub font_family: Option<String>,
    #[tsify(optional)]
    pub font_size: Option<String>,
    #[tsify(optional)]
    pub padding: Option<JsPadding>,
    #[tsify(optional)]
    pub background_color: Option<String>,
    #[tsify(optional)]
    pub background_image: Option<String>,
    #[tsify(optional)]
    pub width: Option<String>,
    #[tsify(optional)]
    pub height: Option<String>,
    #[tsify(optional)]
    pub text_align: Option<String>,
    #[tsify(optional)]
    pub vertical_align: Option<String>,
    #[tsify(optional)]
    pub placeholder: Option<String>,
}

impl JsAppearance {
    /// The settings present, in application order.
    pub fn into_settings(self) -> Vec<Appearance> {
        let padding = self.padding.map(|p| Appearance::Padding {
            left: p.left,
            top: p.top,
            right: p.right,
            bottom: p.bottom,
        });
        [
            self.text_color.map(Appearance::TextColor),
            self.font_family.map(Appearance::FontFamily),
            self.font_size.map(Appearance::FontSize),
            padding,
            self.background_color.map(Appearance::BackgroundColor),
            self.background_image.map(Appearance::BackgroundImage),
            self.width.map(Appearance::Width),
            self.height.map(Appearance::Height),
            self.text_align.map(Appearance::TextAlign),
            self.vertical_align.map(Appearance::VerticalAlign),
            self.placeholder.map(Appearance::Placeholder),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appearance_keeps_only_present_settings() {
        let appearance = JsAppearance {
            font_size: Some("16px".into()),
            placeholder: Some("Write here".into()),
            ..Default::default()
        };
        assert_eq!(
            appearance.into_settings(),
            vec![
                Appearance::FontSize("16px".into()),
                Appearance::Placeholder("Write here".into()),
            ]
        );
    }
}
