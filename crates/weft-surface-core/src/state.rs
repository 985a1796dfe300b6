//! Editor state snapshots reported to the host.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::codec;
use crate::document::SurfaceDocument;
use crate::error::SurfaceError;

/// Content of a freshly initialized surface: one paragraph holding a
/// zero-width space, so the caret has somewhere to sit.
pub const EMPTY_DOCUMENT_HTML: &str = "<p>\u{200B}</p>";

/// What some keyboards leave behind after deleting everything.
pub const BARE_BREAK_HTML: &str = "<p><br></p>";

pub const STATE_URL_SCHEME: &str = "editor-state-changed-callback://";

/// Native commands whose state is reported, in reporting order.
pub const REPORTED_COMMANDS: [&str; 24] = [
    "undo",
    "redo",
    "bold",
    "italic",
    "underline",
    "subscript",
    "superscript",
    "strikeThrough",
    "foreColor",
    "backColor",
    "fontName",
    "fontSize",
    "formatBlock",
    "removeFormat",
    "justifyLeft",
    "justifyCenter",
    "justifyRight",
    "justifyFull",
    "indent",
    "outdent",
    "insertUnorderedList",
    "insertOrderedList",
    "insertHorizontalRule",
    "insertHTML",
];

/// Executability and current value of one command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandState {
    pub executable: bool,
    pub value: String,
}

/// Snapshot of the editor as the host sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    #[serde(rename = "didHtmlChange")]
    pub did_content_change: bool,
    #[serde(rename = "html")]
    pub content: String,
    /// Keyed by upper-cased command name.
    pub command_states: BTreeMap<String, CommandState>,
}

impl EditorState {
    /// Build a snapshot from already-exported content.
    pub fn capture<D: SurfaceDocument>(doc: &D, content: String, baseline: Option<&str>) -> Self {
        Self {
            did_content_change: did_content_change(baseline, &content),
            content,
            command_states: command_states(doc),
        }
    }

    /// `editor-state-changed-callback://` followed by the encoded JSON.
    pub fn to_url(&self) -> Result<String, SurfaceError> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}{}", STATE_URL_SCHEME, codec::encode(&json)))
    }
}

/// Whether exported content differs from what the host last supplied, or
/// from the empty document when the host never supplied any.
pub fn did_content_change(baseline: Option<&str>, exported: &str) -> bool {
    match baseline {
        Some(set_by_host) => set_by_host != exported,
        None => exported != EMPTY_DOCUMENT_HTML,
    }
}

/// Query every reported command.
pub fn command_states<D: SurfaceDocument>(doc: &D) -> BTreeMap<String, CommandState> {
    REPORTED_COMMANDS
        .iter()
        .map(|command| {
            (
                command.to_uppercase(),
                CommandState {
                    executable: doc.query_command_enabled(command),
                    value: doc.query_command_value(command),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;

    #[test]
    fn test_baseline_rule() {
        assert!(!did_content_change(None, EMPTY_DOCUMENT_HTML));
        assert!(did_content_change(None, "<p>a</p>"));
        assert!(!did_content_change(Some("<p>a</p>"), "<p>a</p>"));
        assert!(did_content_change(Some("<p>a</p>"), EMPTY_DOCUMENT_HTML));
    }

    #[test]
    fn test_reports_every_command_uppercased() {
        let mut doc = MemoryDocument::new();
        doc.set_command_state("bold", true, "true");
        doc.set_command_state("undo", false, "");

        let states = command_states(&doc);
        assert_eq!(states.len(), REPORTED_COMMANDS.len());
        assert_eq!(
            states["BOLD"],
            CommandState {
                executable: true,
                value: "true".into()
            }
        );
        assert!(!states["UNDO"].executable);
        assert!(states.contains_key("STRIKETHROUGH"));
        assert!(states.contains_key("INSERTHTML"));
    }

    #[test]
    fn test_state_url_payload() {
        let state = EditorState {
            did_content_change: true,
            content: "<p>a b</p>".into(),
            command_states: BTreeMap::from([(
                "BOLD".to_string(),
                CommandState {
                    executable: true,
                    value: "false".into(),
                },
            )]),
        };
        insta::assert_snapshot!(
            serde_json::to_string(&state).unwrap(),
            @r#"{"didHtmlChange":true,"html":"<p>a b</p>","commandStates":{"BOLD":{"executable":true,"value":"false"}}}"#
        );

        let url = state.to_url().unwrap();
        let encoded = url.strip_prefix(STATE_URL_SCHEME).unwrap();
        assert!(!encoded.contains(' '));
        let decoded = codec::decode(encoded).unwrap();
        assert_eq!(decoded, serde_json::to_string(&state).unwrap());
    }
}
