//! Formatting commands the host can apply.
//!
//! Each command maps onto one native executor command. Colour commands run
//! with `styleWithCSS` switched on so the executor emits inline styles
//! instead of `<font>` elements.

use std::borrow::Cow;

use crate::error::SurfaceError;

/// Background colour the executor cannot reset to; `inherit` is sent instead.
pub const TRANSPARENT_BACKGROUND: &str = "rgba(0, 0, 0, 0)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Undo,
    Redo,
    Bold,
    Italic,
    Underline,
    Subscript,
    Superscript,
    StrikeThrough,
    TextColor(String),
    TextBackgroundColor(String),
    FontName(String),
    FontSize(String),
    /// Heading level 1 to 6.
    Heading(u8),
    Paragraph,
    Preformat,
    BlockQuote,
    RemoveFormat,
    JustifyLeft,
    JustifyCenter,
    JustifyRight,
    JustifyFull,
    Indent,
    Outdent,
    BulletList,
    NumberedList,
    HorizontalRule,
}

impl Command {
    /// Map a host command name and optional parameter.
    ///
    /// Both the host API names (`setBold`, `insertBulletList`) and the
    /// native names (`bold`, `insertUnorderedList`) are accepted.
    pub fn parse(name: &str, param: Option<&str>) -> Result<Self, SurfaceError> {
        let command = match name {
            "undo" => Command::Undo,
            "redo" => Command::Redo,
            "setBold" | "bold" => Command::Bold,
            "setItalic" | "italic" => Command::Italic,
            "setUnderline" | "underline" => Command::Underline,
            "setSubscript" | "subscript" => Command::Subscript,
            "setSuperscript" | "superscript" => Command::Superscript,
            "setStrikeThrough" | "strikeThrough" => Command::StrikeThrough,
            "setTextColor" | "foreColor" => Command::TextColor(required("foreColor", param)?),
            "setTextBackgroundColor" | "backColor" => {
                Command::TextBackgroundColor(required("backColor", param)?)
            }
            "setFontName" | "fontName" => Command::FontName(required("fontName", param)?),
            "setFontSize" | "fontSize" => Command::FontSize(required("fontSize", param)?),
            "setHeading" => {
                let raw = required("formatBlock", param)?;
                match raw.trim().parse::<u8>() {
                    Ok(level @ 1..=6) => Command::Heading(level),
                    _ => {
                        return Err(SurfaceError::InvalidParameter {
                            command: "formatBlock",
                            reason: format!("heading level {raw:?} is not 1-6"),
                        });
                    }
                }
            }
            "setFormattingToParagraph" => Command::Paragraph,
            "setPreformat" => Command::Preformat,
            "setBlockQuote" => Command::BlockQuote,
            "removeFormat" => Command::RemoveFormat,
            "setJustifyLeft" | "justifyLeft" => Command::JustifyLeft,
            "setJustifyCenter" | "justifyCenter" => Command::JustifyCenter,
            "setJustifyRight" | "justifyRight" => Command::JustifyRight,
            "setJustifyFull" | "justifyFull" => Command::JustifyFull,
            "setIndent" | "indent" => Command::Indent,
            "setOutdent" | "outdent" => Command::Outdent,
            "insertBulletList" | "insertUnorderedList" => Command::BulletList,
            "insertNumberedList" | "insertOrderedList" => Command::NumberedList,
            "insertHorizontalRule" => Command::HorizontalRule,
            other => return Err(SurfaceError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }

    /// Native command name and value.
    pub fn native(&self) -> (&'static str, Option<Cow<'_, str>>) {
        match self {
            Command::Undo => ("undo", None),
            Command::Redo => ("redo", None),
            Command::Bold => ("bold", None),
            Command::Italic => ("italic", None),
            Command::Underline => ("underline", None),
            Command::Subscript => ("subscript", None),
            Command::Superscript => ("superscript", None),
            Command::StrikeThrough => ("strikeThrough", None),
            Command::TextColor(color) => ("foreColor", Some(Cow::Borrowed(color.as_str()))),
            Command::TextBackgroundColor(color) if color == TRANSPARENT_BACKGROUND => {
                ("backColor", Some(Cow::Borrowed("inherit")))
            }
            Command::TextBackgroundColor(color) => {
                ("backColor", Some(Cow::Borrowed(color.as_str())))
            }
            Command::FontName(name) => ("fontName", Some(Cow::Borrowed(name.as_str()))),
            Command::FontSize(size) => ("fontSize", Some(Cow::Borrowed(size.as_str()))),
            Command::Heading(level) => ("formatBlock", Some(Cow::Owned(format!("<h{level}>")))),
            Command::Paragraph => ("formatBlock", Some(Cow::Borrowed("<p>"))),
            Command::Preformat => ("formatBlock", Some(Cow::Borrowed("<pre>"))),
            Command::BlockQuote => ("formatBlock", Some(Cow::Borrowed("<blockquote>"))),
            Command::RemoveFormat => ("removeFormat", None),
            Command::JustifyLeft => ("justifyLeft", None),
            Command::JustifyCenter => ("justifyCenter", None),
            Command::JustifyRight => ("justifyRight", None),
            Command::JustifyFull => ("justifyFull", None),
            Command::Indent => ("indent", None),
            Command::Outdent => ("outdent", None),
            Command::BulletList => ("insertUnorderedList", None),
            Command::NumberedList => ("insertOrderedList", None),
            Command::HorizontalRule => ("insertHorizontalRule", None),
        }
    }

    /// Whether the command must run with `styleWithCSS` enabled.
    pub fn uses_css_styling(&self) -> bool {
        matches!(
            self,
            Command::TextColor(_) | Command::TextBackgroundColor(_)
        )
    }
}

fn required(command: &'static str, param: Option<&str>) -> Result<String, SurfaceError> {
    param
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SurfaceError::InvalidParameter {
            command,
            reason: "missing value".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_and_native_names() {
        assert_eq!(Command::parse("setBold", None).unwrap(), Command::Bold);
        assert_eq!(Command::parse("bold", None).unwrap(), Command::Bold);
        assert_eq!(
            Command::parse("insertBulletList", None).unwrap().native(),
            ("insertUnorderedList", None)
        );
    }

    #[test]
    fn test_heading_levels() {
        let cmd = Command::parse("setHeading", Some("3")).unwrap();
        assert_eq!(cmd.native(), ("formatBlock", Some(Cow::Borrowed("<h3>"))));
        assert!(matches!(
            Command::parse("setHeading", Some("7")),
            Err(SurfaceError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_transparent_background_becomes_inherit() {
        let cmd = Command::parse("setTextBackgroundColor", Some(TRANSPARENT_BACKGROUND)).unwrap();
        assert!(cmd.uses_css_styling());
        assert_eq!(cmd.native(), ("backColor", Some(Cow::Borrowed("inherit"))));

        let cmd = Command::TextBackgroundColor("#ff0000".into());
        assert_eq!(cmd.native(), ("backColor", Some(Cow::Borrowed("#ff0000"))));
    }

    #[test]
    fn test_missing_and_unknown() {
        assert!(matches!(
            Command::parse("setTextColor", None),
            Err(SurfaceError::InvalidParameter {
                command: "foreColor",
                ..
            })
        ));
        assert!(matches!(
            Command::parse("explode", None),
            Err(SurfaceError::UnknownCommand(name)) if name == "explode"
        ));
    }
}
