//! Ring buffer log capture for bug reports.
//!
//! The host can pull the most recent surface log lines with `recentLogs()`
//! and attach them to a report. Console output is handled by the
//! `tracing-wasm` layer next to this one.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use wasm_bindgen::prelude::*;

/// Maximum number of log entries to keep.
const MAX_ENTRIES: usize = 200;

/// Both module paths (`weft_surface_*`) and explicit `weft::` targets.
const CAPTURED_PREFIX: &str = "weft";

const BUFFER_MIN_LEVEL: Level = Level::DEBUG;

thread_local! {
    static LOG_BUFFER: RefCell<VecDeque<String>> = RefCell::new(VecDeque::with_capacity(MAX_ENTRIES));
}

/// A tracing Layer that captures surface log messages to a ring buffer.
pub struct LogCaptureLayer;

impl<S: Subscriber> Layer<S> for LogCaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = metadata.level();
        let target = metadata.target();

        if !target.starts_with(CAPTURED_PREFIX) || *level > BUFFER_MIN_LEVEL {
            return;
        }

        let mut message = String::new();
        event.record(&mut MessageVisitor(&mut message));
        let formatted = format!("[{}] {}: {}", level.as_str(), target, message);

        LOG_BUFFER.with(|buf| {
            let mut buf = buf.borrow_mut();
            if buf.len() >= MAX_ENTRIES {
                buf.pop_front();
            }
            buf.push_back(formatted);
        });
    }
}

/// Writes the message first-class and every other field as `name=value`.
struct MessageVisitor<'a>(&'a mut String);

impl MessageVisitor<'_> {
    fn separate(&mut self) {
        if !self.0.is_empty() {
            self.0.push_str(", ");
        }
    }
}

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.separate();
        if field.name() == "message" {
            let _ = write!(self.0, "{:?}", value);
        } else {
            let _ = write!(self.0, "{}={:?}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.separate();
        if field.name() == "message" {
            self.0.push_str(value);
        } else {
            let _ = write!(self.0, "{}={}", field.name(), value);
        }
    }
}

/// All captured log entries, oldest first, one per line.
#[wasm_bindgen(js_name = recentLogs)]
pub fn recent_logs() -> String {
    LOG_BUFFER.with(|buf| {
        let buf = buf.borrow();
        buf.iter().cloned().collect::<Vec<_>>().join("\n")
    })
}

#[wasm_bindgen(js_name = clearLogs)]
pub fn clear_logs() {
    LOG_BUFFER.with(|buf| buf.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    fn capture(f: impl FnOnce()) -> Vec<String> {
        clear_logs();
        let subscriber = tracing_subscriber::registry().with(LogCaptureLayer);
        tracing::subscriber::with_default(subscriber, f);
        recent_logs().lines().map(str::to_owned).collect()
    }

    #[test]
    fn test_only_surface_targets_are_captured() {
        let lines = capture(|| {
            tracing::debug!(target: "weft::paste", attempts = 3, "paste settled");
            tracing::info!(target: "other_crate", "not ours");
            tracing::trace!(target: "weft::height", "too fine");
        });
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[DEBUG] weft::paste: "), "{}", lines[0]);
        assert!(lines[0].contains("paste settled"));
        assert!(lines[0].contains("attempts=3"));
    }

    #[test]
    fn test_buffer_keeps_most_recent_entries() {
        let lines = capture(|| {
            for i in 0..MAX_ENTRIES + 5 {
                tracing::warn!(target: "weft::height", i, "tick");
            }
        });
        assert_eq!(lines.len(), MAX_ENTRIES);
        assert!(lines[0].contains("i=5"), "{}", lines[0]);
        assert!(lines[MAX_ENTRIES - 1].contains(&format!("i={}", MAX_ENTRIES + 4)));
    }
}
