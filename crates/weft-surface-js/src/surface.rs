//! JsSurface - the editing surface exposed to JavaScript.

use wasm_bindgen::prelude::*;
use web_sys::{HtmlElement, Node};

use weft_surface_browser::{Appearance, Command, SurfaceConfig, SurfaceHandle, mount, mount_by_id};

use crate::types::{JsAppearance, JsImageInsert, JsVideoInsert};

fn parse_config(config: JsValue) -> Result<SurfaceConfig, JsError> {
    if config.is_undefined() || config.is_null() {
        return Ok(SurfaceConfig::default());
    }
    serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsError::new(&format!("Invalid surface config: {}", e)))
}

fn mount_error(e: JsValue) -> JsError {
    JsError::new(&format!("Could not mount surface: {:?}", e))
}

/// An editing surface mounted on a `contenteditable` element.
///
/// `editorCallback.updateEditorState` is delivered on a later task, so it
/// may call back into the surface. Any other re-entrant call, e.g. from a
/// native bridge handler the surface is still inside, fails with an error.
#[wasm_bindgen]
pub struct JsSurface {
    handle: SurfaceHandle,
}

impl JsSurface {
    fn run(&self, command: Command) -> Result<(), JsError> {
        Ok(self.handle.with(|surface| surface.execute(&command))?)
    }

    fn apply(&self, setting: Appearance) -> Result<(), JsError> {
        Ok(self.handle.with(|surface| surface.apply(&setting))?)
    }
}

#[wasm_bindgen]
impl JsSurface {
    /// Mount on the element with the given id.
    ///
    /// `config` is an optional partial `SurfaceConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(element_id: &str, config: JsValue) -> Result<JsSurface, JsError> {
        let config = parse_config(config)?;
        let handle = mount_by_id(element_id, config).map_err(mount_error)?;
        Ok(Self { handle })
    }

    /// Mount on an element the host already holds.
    #[wasm_bindgen(js_name = fromElement)]
    pub fn from_element(element: HtmlElement, config: JsValue) -> Result<JsSurface, JsError> {
        let config = parse_config(config)?;
        let handle = mount(element, config).map_err(mount_error)?;
        Ok(Self { handle })
    }

    // === Content ===

    /// Replace the content with percent-encoded HTML.
    #[wasm_bindgen(js_name = setHtml)]
    pub fn set_html(&self, html: &str, base_url: Option<String>) -> Result<(), JsError> {
        self.handle
            .with(|surface| surface.set_html(html, base_url.as_deref()))??;
        Ok(())
    }

    /// Exported content, percent-encoded.
    #[wasm_bindgen(js_name = getEncodedHtml)]
    pub fn get_encoded_html(&self) -> Result<String, JsError> {
        Ok(self.handle.with(|surface| surface.encoded_html())?)
    }

    /// Exported content as plain HTML.
    #[wasm_bindgen(js_name = getHtml)]
    pub fn get_html(&self) -> Result<String, JsError> {
        Ok(self.handle.with(|surface| surface.exported_html())?)
    }

    /// Current editor state snapshot as a plain object.
    #[wasm_bindgen(js_name = getEditorState)]
    pub fn get_editor_state(&self) -> Result<JsValue, JsError> {
        let state = self.handle.with(|surface| surface.editor_state())?;
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        serde::Serialize::serialize(&state, &serializer)
            .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
    }

    // === Host configuration ===

    #[wasm_bindgen(js_name = useWindowLocationForEditorStateChangedCallback)]
    pub fn use_window_location_for_state(&self) -> Result<(), JsError> {
        Ok(self.handle.with(|surface| surface.use_url_state_channel())?)
    }

    #[wasm_bindgen(js_name = enableImageResizing)]
    pub fn enable_image_resizing(&self) -> Result<(), JsError> {
        Ok(self.handle.with(|surface| surface.enable_image_resizing())?)
    }

    #[wasm_bindgen(js_name = disableImageResizing)]
    pub fn disable_image_resizing(&self) -> Result<(), JsError> {
        Ok(self.handle.with(|surface| surface.disable_image_resizing())?)
    }

    /// Toggle editability and image resizing together.
    #[wasm_bindgen(js_name = setInputEnabled)]
    pub fn set_input_enabled(&self, enabled: bool) -> Result<(), JsError> {
        Ok(self.handle.with(|surface| surface.set_input_enabled(enabled))?)
    }

    pub fn focus(&self) -> Result<(), JsError> {
        Ok(self.handle.with(|surface| surface.focus())?)
    }

    pub fn blur(&self) -> Result<(), JsError> {
        Ok(self.handle.with(|surface| surface.blur())?)
    }

    /// Report the content height even if it has not changed.
    #[wasm_bindgen(js_name = refreshHeight)]
    pub fn refresh_height(&self) -> Result<(), JsError> {
        Ok(self.handle.with(|surface| surface.refresh_height())?)
    }

    #[wasm_bindgen(js_name = updateEditorState)]
    pub fn update_editor_state(&self) -> Result<(), JsError> {
        Ok(self.handle.with(|surface| surface.update_editor_state())?)
    }

    // === Commands ===

    /// Run a formatting command by its host name, e.g. `setBold` or
    /// `setHeading` with `"2"`.
    #[wasm_bindgen(js_name = executeCommand)]
    pub fn execute_command(&self, name: &str, param: Option<String>) -> Result<(), JsError> {
        self.handle
            .with(|surface| surface.execute_named(name, param.as_deref()))??;
        Ok(())
    }

    pub fn undo(&self) -> Result<(), JsError> {
        self.run(Command::Undo)
    }

    pub fn redo(&self) -> Result<(), JsError> {
        self.run(Command::Redo)
    }

    #[wasm_bindgen(js_name = setBold)]
    pub fn set_bold(&self) -> Result<(), JsError> {
        self.run(Command::Bold)
    }

    #[wasm_bindgen(js_name = setItalic)]
    pub fn set_italic(&self) -> Result<(), JsError> {
        self.run(Command::Italic)
    }

    #[wasm_bindgen(js_name = setUnderline)]
    pub fn set_underline(&self) -> Result<(), JsError> {
        self.run(Command::Underline)
    }

    #[wasm_bindgen(js_name = setSubscript)]
    pub fn set_subscript(&self) -> Result<(), JsError> {
        self.run(Command::Subscript)
    }

    #[wasm_bindgen(js_name = setSuperscript)]
    pub fn set_superscript(&self) -> Result<(), JsError> {
        self.run(Command::Superscript)
    }

    #[wasm_bindgen(js_name = setStrikeThrough)]
    pub fn set_strike_through(&self) -> Result<(), JsError> {
        self.run(Command::StrikeThrough)
    }

    #[wasm_bindgen(js_name = setTextColor)]
    pub fn set_text_color(&self, color: String) -> Result<(), JsError> {
        self.run(Command::TextColor(color))
    }

    #[wasm_bindgen(js_name = setTextBackgroundColor)]
    pub fn set_text_background_color(&self, color: String) -> Result<(), JsError> {
        self.run(Command::TextBackgroundColor(color))
    }

    #[wasm_bindgen(js_name = setFontName)]
    pub fn set_font_name(&self, name: String) -> Result<(), JsError> {
        self.run(Command::FontName(name))
    }

    #[wasm_bindgen(js_name = setFontSize)]
    pub fn set_font_size(&self, size: String) -> Result<(), JsError> {
        self.run(Command::FontSize(size))
    }

    #[wasm_bindgen(js_name = setHeading)]
    pub fn set_heading(&self, level: u8) -> Result<(), JsError> {
        if !(1..=6).contains(&level) {
            return Err(JsError::new(&format!("Invalid heading level: {}", level)));
        }
        self.run(Command::Heading(level))
    }

    #[wasm_bindgen(js_name = setFormattingToParagraph)]
    pub fn set_formatting_to_paragraph(&self) -> Result<(), JsError> {
        self.run(Command::Paragraph)
    }

    #[wasm_bindgen(js_name = setPreformat)]
    pub fn set_preformat(&self) -> Result<(), JsError> {
        self.run(Command::Preformat)
    }

    #[wasm_bindgen(js_name = setBlockQuote)]
    pub fn set_block_quote(&self) -> Result<(), JsError> {
        self.run(Command::BlockQuote)
    }

    #[wasm_bindgen(js_name = removeFormat)]
    pub fn remove_format(&self) -> Result<(), JsError> {
        self.run(Command::RemoveFormat)
    }

    #[wasm_bindgen(js_name = setJustifyLeft)]
    pub fn set_justify_left(&self) -> Result<(), JsError> {
        self.run(Command::JustifyLeft)
    }

    #[wasm_bindgen(js_name = setJustifyCenter)]
    pub fn set_justify_center(&self) -> Result<(), JsError> {
        self.run(Command::JustifyCenter)
    }

    #[wasm_bindgen(js_name = setJustifyRight)]
    pub fn set_justify_right(&self) -> Result<(), JsError> {
        self.run(Command::JustifyRight)
    }

    #[wasm_bindgen(js_name = setJustifyFull)]
    pub fn set_justify_full(&self) -> Result<(), JsError> {
        self.run(Command::JustifyFull)
    }

    #[wasm_bindgen(js_name = setIndent)]
    pub fn set_indent(&self) -> Result<(), JsError> {
        self.run(Command::Indent)
    }

    #[wasm_bindgen(js_name = setOutdent)]
    pub fn set_outdent(&self) -> Result<(), JsError> {
        self.run(Command::Outdent)
    }

    #[wasm_bindgen(js_name = insertBulletList)]
    pub fn insert_bullet_list(&self) -> Result<(), JsError> {
        self.run(Command::BulletList)
    }

    #[wasm_bindgen(js_name = insertNumberedList)]
    pub fn insert_numbered_list(&self) -> Result<(), JsError> {
        self.run(Command::NumberedList)
    }

    #[wasm_bindgen(js_name = insertHorizontalRule)]
    pub fn insert_horizontal_rule(&self) -> Result<(), JsError> {
        self.run(Command::HorizontalRule)
    }

    // === Insertions ===

    #[wasm_bindgen(js_name = insertLink)]
    pub fn insert_link(&self, url: &str, title: &str) -> Result<(), JsError> {
        Ok(self.handle.with(|surface| surface.insert_link(url, title))?)
    }

    #[wasm_bindgen(js_name = insertImage)]
    pub fn insert_image(&self, image: JsImageInsert) -> Result<(), JsError> {
        let image = image.into();
        Ok(self.handle.with(|surface| surface.insert_image(&image))?)
    }

    #[wasm_bindgen(js_name = insertVideo)]
    pub fn insert_video(&self, video: JsVideoInsert) -> Result<(), JsError> {
        let video = video.into();
        Ok(self.handle.with(|surface| surface.insert_video(&video))?)
    }

    #[wasm_bindgen(js_name = insertCheckbox)]
    pub fn insert_checkbox(&self, label: &str) -> Result<(), JsError> {
        Ok(self.handle.with(|surface| surface.insert_checkbox(label))?)
    }

    /// Insert percent-encoded HTML at the caret.
    #[wasm_bindgen(js_name = insertHtml)]
    pub fn insert_html(&self, html: &str) -> Result<(), JsError> {
        self.handle.with(|surface| surface.insert_html(html))??;
        Ok(())
    }

    // === Appearance ===

    /// Apply several settings at once.
    #[wasm_bindgen(js_name = applyAppearance)]
    pub fn apply_appearance(&self, appearance: JsAppearance) -> Result<(), JsError> {
        let settings = appearance.into_settings();
        Ok(self.handle.with(|surface| {
            for setting in &settings {
                surface.apply(setting);
            }
        })?)
    }

    #[wasm_bindgen(js_name = setBaseTextColor)]
    pub fn set_base_text_color(&self, color: String) -> Result<(), JsError> {
        self.apply(Appearance::TextColor(color))
    }

    #[wasm_bindgen(js_name = setBaseFontFamily)]
    pub fn set_base_font_family(&self, family: String) -> Result<(), JsError> {
        self.apply(Appearance::FontFamily(family))
    }

    #[wasm_bindgen(js_name = setBaseFontSize)]
    pub fn set_base_font_size(&self, size: String) -> Result<(), JsError> {
        self.apply(Appearance::FontSize(size))
    }

    #[wasm_bindgen(js_name = setPadding)]
    pub fn set_padding(
        &self,
        left: String,
        top: String,
        right: String,
        bottom: String,
    ) -> Result<(), JsError> {
        self.apply(Appearance::Padding {
            left,
            top,
            right,
            bottom,
        })
    }

    #[wasm_bindgen(js_name = setBackgroundColor)]
    pub fn set_background_color(&self, color: String) -> Result<(), JsError> {
        self.apply(Appearance::BackgroundColor(color))
    }

    #[wasm_bindgen(js_name = setBackgroundImage)]
    pub fn set_background_image(&self, image: String) -> Result<(), JsError> {
        self.apply(Appearance::BackgroundImage(image))
    }

    #[wasm_bindgen(js_name = setWidth)]
    pub fn set_width(&self, width: String) -> Result<(), JsError> {
        self.apply(Appearance::Width(width))
    }

    #[wasm_bindgen(js_name = setHeight)]
    pub fn set_height(&self, height: String) -> Result<(), JsError> {
        self.apply(Appearance::Height(height))
    }

    #[wasm_bindgen(js_name = setTextAlign)]
    pub fn set_text_align(&self, align: String) -> Result<(), JsError> {
        self.apply(Appearance::TextAlign(align))
    }

    #[wasm_bindgen(js_name = setVerticalAlign)]
    pub fn set_vertical_align(&self, align: String) -> Result<(), JsError> {
        self.apply(Appearance::VerticalAlign(align))
    }

    #[wasm_bindgen(js_name = setPlaceholder)]
    pub fn set_placeholder(&self, placeholder: String) -> Result<(), JsError> {
        self.apply(Appearance::Placeholder(placeholder))
    }

    // === Gestures from the page's interaction library ===

    /// A resize drag moved; sizes are the proposed rendered width and height.
    #[wasm_bindgen(js_name = onResizeMove)]
    pub fn on_resize_move(&self, image: Node, width: f64, height: f64) -> Result<(), JsError> {
        Ok(self
            .handle
            .with(|surface| surface.on_resize_move(&image, width, height))?)
    }

    /// A rotate gesture turned by `delta` degrees.
    #[wasm_bindgen(js_name = onRotate)]
    pub fn on_rotate(&self, image: Node, delta: f64) -> Result<(), JsError> {
        Ok(self.handle.with(|surface| surface.on_rotate(&image, delta))?)
    }
}
