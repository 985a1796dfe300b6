//! Paste reconciliation.
//!
//! Native paste insertion lands some time after the paste event. A paste
//! starts a bounded polling loop that compares the document against the
//! pre-paste snapshot, then repairs a known garbled placeholder that some
//! platforms insert instead of the clipboard HTML.

use web_time::Instant;

use crate::schedule::TimerToken;

/// Placeholder tokens left behind by a broken native paste path.
pub const CORRUPTED_PASTE_MARKERS: [&str; 2] = ["\u{200B}ÿþ&lt;", "ÿþ&lt;<br>"];

/// Clipboard contents captured from a paste event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipboardPayload {
    pub html: Option<String>,
    pub text: Option<String>,
}

impl ClipboardPayload {
    /// Markup to splice in if the native insertion needs repair.
    ///
    /// HTML wins; plain text has its line breaks turned into `<br />`.
    pub fn to_markup(&self) -> String {
        if let Some(html) = self.html.as_deref().filter(|h| !h.is_empty()) {
            return html.to_string();
        }
        self.text
            .as_deref()
            .map(|text| text.replace("\r\n", "<br />").replace(['\r', '\n'], "<br />"))
            .unwrap_or_default()
    }
}

/// Where the reconciler is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasteState {
    #[default]
    Idle,
    Polling { attempts_remaining: u32 },
    Reconciled,
    Exhausted,
}

impl PasteState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PasteState::Reconciled | PasteState::Exhausted)
    }
}

#[derive(Debug, Clone)]
struct PendingPaste {
    baseline: String,
    payload: String,
    attempts_remaining: u32,
    generation: u64,
    started: Instant,
}

/// Result of one poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Nothing inserted yet; poll again with this token.
    Reschedule(TimerToken),
    /// Polling is over. `repaired` holds replacement content when the
    /// garbled placeholder was found.
    Finished {
        state: PasteState,
        repaired: Option<String>,
    },
}

/// Bounded polling state machine for one paste at a time.
///
/// A new paste replaces any pending one; timers from the older paste no
/// longer match the current generation and are ignored.
#[derive(Debug, Clone, Default)]
pub struct PasteReconciler {
    pending: Option<PendingPaste>,
    state: PasteState,
    generation: u64,
}

impl PasteReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PasteState {
        self.state
    }

    /// Start polling for a paste. Returns the token for the first check.
    pub fn begin(&mut self, baseline: String, payload: String, max_attempts: u32) -> TimerToken {
        self.generation += 1;
        if self.pending.is_some() {
            tracing::debug!(target: "weft::paste", "new paste supersedes pending reconciliation");
        }
        self.pending = Some(PendingPaste {
            baseline,
            payload,
            attempts_remaining: max_attempts,
            generation: self.generation,
            started: Instant::now(),
        });
        self.state = PasteState::Polling {
            attempts_remaining: max_attempts,
        };
        TimerToken::PastePoll {
            generation: self.generation,
        }
    }

    /// Check the current content. `None` when the token is stale.
    pub fn poll(&mut self, token: TimerToken, current: &str) -> Option<PollOutcome> {
        let TimerToken::PastePoll { generation } = token;
        let pending = self.pending.as_mut().filter(|p| p.generation == generation)?;

        let inserted = current != pending.baseline;
        if !inserted && pending.attempts_remaining > 0 {
            pending.attempts_remaining -= 1;
            self.state = PasteState::Polling {
                attempts_remaining: pending.attempts_remaining,
            };
            tracing::trace!(
                target: "weft::paste",
                attempts_remaining = pending.attempts_remaining,
                "paste not inserted yet"
            );
            return Some(PollOutcome::Reschedule(token));
        }

        let pending = self.pending.take()?;
        let state = if inserted {
            PasteState::Reconciled
        } else {
            PasteState::Exhausted
        };
        self.state = state;
        let repaired = repair(current, &pending.baseline, &pending.payload);
        tracing::debug!(
            target: "weft::paste",
            ?state,
            repaired = repaired.is_some(),
            elapsed_ms = pending.started.elapsed().as_millis() as u64,
            "paste reconciliation finished"
        );
        Some(PollOutcome::Finished { state, repaired })
    }
}

/// Replace the garbled placeholder with the captured payload.
///
/// Only markers that are new since `baseline` are touched, and only their
/// first occurrence. Returns `None` when nothing needed repair.
pub fn repair(current: &str, baseline: &str, payload: &str) -> Option<String> {
    let mut repaired = current.to_string();
    let mut changed = false;
    for marker in CORRUPTED_PASTE_MARKERS {
        if repaired.contains(marker) && !baseline.contains(marker) {
            repaired = repaired.replacen(marker, payload, 1);
            changed = true;
        }
    }
    changed.then_some(repaired)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_prefers_html() {
        let payload = ClipboardPayload {
            html: Some("<b>x</b>".into()),
            text: Some("x".into()),
        };
        assert_eq!(payload.to_markup(), "<b>x</b>");

        let payload = ClipboardPayload {
            html: Some(String::new()),
            text: Some("a\r\nb\nc\rd".into()),
        };
        assert_eq!(payload.to_markup(), "a<br />b<br />c<br />d");

        assert_eq!(ClipboardPayload::default().to_markup(), "");
    }

    #[test]
    fn test_detects_insertion() {
        let mut paste = PasteReconciler::new();
        let token = paste.begin("<p>a</p>".into(), "b".into(), 10);

        assert_eq!(
            paste.poll(token, "<p>a</p>"),
            Some(PollOutcome::Reschedule(token))
        );
        assert_eq!(paste.state(), PasteState::Polling { attempts_remaining: 9 });

        assert_eq!(
            paste.poll(token, "<p>ab</p>"),
            Some(PollOutcome::Finished {
                state: PasteState::Reconciled,
                repaired: None
            })
        );
        // Finished pastes ignore late timers.
        assert_eq!(paste.poll(token, "<p>ab</p>"), None);
    }

    #[test]
    fn test_polling_terminates_within_budget() {
        for budget in 0..=12 {
            let mut paste = PasteReconciler::new();
            let token = paste.begin("<p>a</p>".into(), "b".into(), budget);
            let mut polls = 0;
            loop {
                polls += 1;
                match paste.poll(token, "<p>a</p>") {
                    Some(PollOutcome::Reschedule(_)) => continue,
                    Some(PollOutcome::Finished { state, .. }) => {
                        assert_eq!(state, PasteState::Exhausted);
                        break;
                    }
                    None => panic!("token went stale mid-paste"),
                }
            }
            assert_eq!(polls, budget + 1);
            assert!(paste.state().is_terminal());
        }
    }

    #[test]
    fn test_new_paste_supersedes_old_timer() {
        let mut paste = PasteReconciler::new();
        let first = paste.begin("<p>a</p>".into(), "x".into(), 10);
        let second = paste.begin("<p>a</p>".into(), "y".into(), 10);
        assert_ne!(first, second);
        assert_eq!(paste.poll(first, "<p>ax</p>"), None);
        assert!(matches!(
            paste.poll(second, "<p>axy</p>"),
            Some(PollOutcome::Finished { .. })
        ));
    }

    #[test]
    fn test_repair_replaces_garbled_marker() {
        let current = "<p>\u{200B}ÿþ&lt;</p>";
        assert_eq!(
            repair(current, "<p>\u{200B}</p>", "<b>x</b>").as_deref(),
            Some("<p><b>x</b></p>")
        );

        let current = "<p>ÿþ&lt;<br></p>";
        assert_eq!(
            repair(current, "<p><br></p>", "<i>y</i>").as_deref(),
            Some("<p><i>y</i></p>")
        );
    }

    #[test]
    fn test_repair_skips_markers_already_in_baseline() {
        let baseline = "<p>\u{200B}ÿþ&lt;</p>";
        assert_eq!(repair(baseline, baseline, "<b>x</b>"), None);
        assert_eq!(repair("<p>plain</p>", "<p></p>", "<b>x</b>"), None);
    }
}
