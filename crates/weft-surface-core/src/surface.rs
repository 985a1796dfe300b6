//! The editing surface context.
//!
//! [`Surface`] owns the document, the host transport, the scheduler and
//! every synchronization component. Host API calls and platform events both
//! enter here; nothing is global, so several surfaces can coexist.

use smol_str::SmolStr;

use crate::appearance::Appearance;
use crate::codec;
use crate::commands::Command;
use crate::config::SurfaceConfig;
use crate::document::{MutationBatch, NativeRange, SurfaceDocument};
use crate::error::SurfaceError;
use crate::height::HeightScheduler;
use crate::host::{HeightChannel, HostTransport, StateTransport};
use crate::image::{self, ImageGeometry};
use crate::insert::{self, ImageInsert, VideoInsert};
use crate::observer;
use crate::paste::{ClipboardPayload, PasteReconciler, PasteState, PollOutcome};
use crate::range::RangeStore;
use crate::resize::{self, ResizeLimits, RotationGesture};
use crate::schedule::{Scheduler, TimerToken};
use crate::scroll::EdgeScroll;
use crate::state::{BARE_BREAK_HTML, EMPTY_DOCUMENT_HTML, EditorState};

/// Upper bound on mutation batches drained in one [`Surface::pump_mutations`].
const MAX_PUMP_ROUNDS: usize = 8;

/// A key event as seen by the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    /// DOM `key` value, e.g. `"Backspace"` or `"m"`.
    pub key: SmolStr,
    pub ctrl: bool,
    pub alt: bool,
}

impl KeyInput {
    pub fn new(key: impl Into<SmolStr>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            alt: false,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }
}

/// What the driver should do with a key event after the surface saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Let the platform handle it.
    Default,
    /// Cancel the platform default.
    Suppress,
}

/// One embedded editing surface.
pub struct Surface<D: SurfaceDocument, H: HostTransport, S: Scheduler> {
    doc: D,
    host: H,
    scheduler: S,
    config: SurfaceConfig,
    ranges: RangeStore,
    images: ImageGeometry,
    height: HeightScheduler,
    paste: PasteReconciler,
    scroll: EdgeScroll,
    rotation: RotationGesture,
    /// Content last supplied by the host, if any.
    baseline: Option<String>,
    url_state_channel: bool,
}

impl<D: SurfaceDocument, H: HostTransport, S: Scheduler> Surface<D, H, S> {
    pub fn new(doc: D, host: H, scheduler: S, config: SurfaceConfig) -> Self {
        Self {
            doc,
            host,
            scheduler,
            images: ImageGeometry::new(config.resizing_enabled),
            height: HeightScheduler::new(config.height_threshold),
            url_state_channel: config.url_state_channel,
            config,
            ranges: RangeStore::new(),
            paste: PasteReconciler::new(),
            scroll: EdgeScroll::new(),
            rotation: RotationGesture::default(),
            baseline: None,
        }
    }

    /// Install the empty document, report initial state and request a
    /// forced height notification.
    pub fn init(&mut self) {
        self.install_default_document();
        self.update_editor_state();
        self.schedule_height(true);
    }

    // === Accessors ===

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn baseline(&self) -> Option<&str> {
        self.baseline.as_deref()
    }

    pub fn paste_state(&self) -> PasteState {
        self.paste.state()
    }

    pub fn resizing_enabled(&self) -> bool {
        self.images.resizing_enabled()
    }

    pub fn last_notified_height(&self) -> f64 {
        self.height.last_notified()
    }

    pub fn ranges(&self) -> &RangeStore {
        &self.ranges
    }

    // === Inbound host API ===

    /// Replace the document with percent-encoded `encoded` content.
    ///
    /// Empty content installs the default paragraph and clears the
    /// baseline. A non-empty `base_url` updates the page base.
    pub fn set_html(&mut self, encoded: &str, base_url: Option<&str>) -> Result<(), SurfaceError> {
        if let Some(url) = base_url.filter(|u| !u.is_empty()) {
            self.doc.set_base_url(url);
        }

        if encoded.is_empty() {
            self.install_default_document();
            self.baseline = None;
        } else {
            let html = codec::decode(encoded)?;
            let root = self.doc.root();
            self.doc.set_inner_html(&root, &html);
            self.baseline = Some(html);
            if self.images.resizing_enabled() {
                self.images.prepare_all(&mut self.doc);
            }
        }

        self.schedule_height(true);
        Ok(())
    }

    /// Exported content, percent-encoded for the host.
    pub fn encoded_html(&mut self) -> String {
        codec::encode(&self.exported_html())
    }

    /// Content with every editing artifact removed.
    ///
    /// Works on a detached copy, so the live document is untouched.
    pub fn exported_html(&mut self) -> String {
        let root = self.doc.root();
        let originals = self.doc.images_under(&root);
        let copy = self.doc.clone_detached(&root);
        let copies = self.doc.images_under(&copy);
        image::apply_export_sizing(&mut self.doc, &originals, &copies);
        image::strip_for_export(&mut self.doc, &copy);
        let html = self.doc.inner_html(&copy);
        self.doc.release(copy);
        html
    }

    /// Report full snapshots over the URL channel from now on.
    pub fn use_url_state_channel(&mut self) {
        self.url_state_channel = true;
    }

    pub fn enable_image_resizing(&mut self) {
        self.images.enable(&mut self.doc);
    }

    pub fn disable_image_resizing(&mut self) {
        self.images.disable(&mut self.doc);
    }

    /// Run a formatting command and report the new state.
    pub fn execute(&mut self, command: &Command) {
        let (name, value) = command.native();
        if command.uses_css_styling() {
            self.doc.exec_command("styleWithCSS", Some("true"));
        }
        let applied = self.doc.exec_command(name, value.as_deref());
        if command.uses_css_styling() {
            self.doc.exec_command("styleWithCSS", Some("false"));
        }
        if !applied {
            tracing::debug!(command = name, "native command had no effect");
        }
        self.update_editor_state();
    }

    /// Parse a host command name and run it.
    pub fn execute_named(&mut self, name: &str, param: Option<&str>) -> Result<(), SurfaceError> {
        let command = Command::parse(name, param)?;
        self.execute(&command);
        Ok(())
    }

    /// Insert a link at the stored selection, wrapping selected text.
    pub fn insert_link(&mut self, url: &str, title: &str) {
        self.restore_anchor();
        if self.doc.selected_text().is_empty() {
            self.insert_markup(&insert::link_html(url, title));
            return;
        }

        let anchor = self.doc.create_element("a");
        self.doc.set_attribute(&anchor, "href", url);
        self.doc.set_attribute(&anchor, "title", title);
        if self.doc.surround_selection(&anchor) {
            self.update_editor_state();
        } else {
            tracing::debug!("selection cannot be wrapped, inserting link markup instead");
            self.doc.release(anchor);
            self.insert_markup(&insert::link_html(url, title));
        }
    }

    pub fn insert_image(&mut self, image: &ImageInsert) {
        let layout_width = self.doc.metrics().layout_width();
        let html = image.to_html(
            self.images.resizing_enabled(),
            layout_width,
            self.config.default_image_width_ratio,
        );
        self.insert_markup(&html);
        self.schedule_height(false);
    }

    pub fn insert_video(&mut self, video: &VideoInsert) {
        self.insert_markup(&video.to_html());
    }

    pub fn insert_checkbox(&mut self, label: &str) {
        self.insert_markup(&insert::checkbox_html(label));
    }

    /// Insert percent-encoded markup at the stored selection.
    pub fn insert_html(&mut self, encoded: &str) -> Result<(), SurfaceError> {
        let html = codec::decode(encoded)?;
        self.insert_markup(&html);
        Ok(())
    }

    pub fn apply(&mut self, appearance: &Appearance) {
        appearance.apply(&mut self.doc);
    }

    /// Toggle editability; image resizing follows.
    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.doc.set_editable(enabled);
        if enabled {
            self.enable_image_resizing();
        } else {
            self.disable_image_resizing();
        }
    }

    /// Focus with the caret at the end of the document.
    pub fn focus(&mut self) {
        let root = self.doc.root();
        self.doc.collapse_to_end(&root);
        self.doc.focus();
    }

    pub fn blur(&mut self) {
        self.doc.blur();
    }

    /// Deliver the current height now, regardless of the last value.
    pub fn refresh_height(&mut self) {
        let height = self.height.refresh(self.doc.metrics().content_height());
        self.deliver_height(height);
    }

    /// Current state snapshot.
    pub fn editor_state(&mut self) -> EditorState {
        let content = self.exported_html();
        EditorState::capture(&self.doc, content, self.baseline.as_deref())
    }

    /// Recompute state and report it over the host's state transport.
    pub fn update_editor_state(&mut self) {
        match StateTransport::select(&self.host, self.url_state_channel) {
            Some(StateTransport::Callback) => {
                let content = self.exported_html();
                let changed = crate::state::did_content_change(self.baseline.as_deref(), &content);
                if let Err(e) = self.host.notify_state_changed(changed) {
                    tracing::warn!(error = %e, "editor state callback failed");
                }
            }
            Some(StateTransport::Url) => {
                let state = self.editor_state();
                let result = state.to_url().and_then(|url| self.host.open_state_url(&url));
                if let Err(e) = result {
                    tracing::warn!(error = %e, "editor state URL delivery failed");
                }
            }
            None => {
                tracing::trace!("no editor state transport");
            }
        }
    }

    // === Platform events ===

    pub fn on_selection_change(&mut self) {
        self.ranges.capture(&self.doc);
        let root = self.doc.root();
        if self.doc.inner_html(&root) == BARE_BREAK_HTML {
            self.install_default_document();
        }
        self.update_editor_state();
    }

    pub fn on_input(&mut self) {
        self.schedule_height(false);
    }

    pub fn on_cut(&mut self) {
        self.schedule_height(false);
    }

    /// Start reconciling a paste whose native insertion is still pending.
    pub fn on_paste(&mut self, payload: &ClipboardPayload) {
        let root = self.doc.root();
        let before = self.doc.inner_html(&root);
        let token = self.paste.begin(
            before,
            payload.to_markup(),
            self.config.paste_max_attempts,
        );
        self.scheduler
            .set_timeout(token, self.config.paste_poll_delay_ms);
        self.schedule_height(false);
    }

    pub fn on_key_down(&self, key: &KeyInput) -> KeyOutcome {
        let root = self.doc.root();
        if key.key == "Backspace" {
            let text = self.doc.text_content(&root);
            if text.encode_utf16().count() == 1 {
                return KeyOutcome::Suppress;
            }
        } else if key.ctrl && key.key.eq_ignore_ascii_case("m") {
            return KeyOutcome::Suppress;
        }
        KeyOutcome::Default
    }

    /// Shortcut chords may have toggled formatting, so state is refreshed.
    pub fn on_key_up(&mut self, key: &KeyInput) {
        if key.alt || key.ctrl {
            self.update_editor_state();
        }
    }

    /// Handle one batch of mutation records.
    pub fn process_mutations(&mut self, batch: MutationBatch<D::Node>) {
        let outcome = observer::classify(&self.doc, &batch);
        for image in &outcome.images {
            if self.images.resizing_enabled() {
                self.images.prepare(&mut self.doc, image);
            } else {
                ImageGeometry::ensure_load_listener(&mut self.doc, image);
            }
        }
        if outcome.height_dirty {
            self.schedule_height(false);
        }
    }

    /// Drain pending mutation batches from the document.
    pub fn pump_mutations(&mut self) {
        for _ in 0..MAX_PUMP_ROUNDS {
            match self.doc.take_mutation_batch() {
                Some(batch) => self.process_mutations(batch),
                None => return,
            }
        }
        tracing::warn!(rounds = MAX_PUMP_ROUNDS, "mutation batches kept arriving, deferring the rest");
    }

    /// An image finished loading.
    pub fn on_image_loaded(&mut self, image: &D::Node) {
        ImageGeometry::resolve_geometry(&mut self.doc, image);
        self.schedule_height(false);
    }

    /// A resize gesture moved to a new rectangle.
    pub fn on_resize_move(&mut self, image: &D::Node, width: f64, height: f64) {
        let limits = ResizeLimits {
            min_width: self.config.image_min_width,
            min_height: self.config.image_min_height,
        };
        resize::apply_resize(&mut self.doc, image, width, height, limits);
        self.schedule_height(false);
    }

    /// A rotate gesture moved by `delta` degrees.
    pub fn on_rotate(&mut self, image: &D::Node, delta: f64) {
        let angle = self.rotation.rotate(delta);
        self.doc
            .set_style_property(image, "transform", &resize::rotation_transform(angle));
    }

    /// Mirror a checkbox's live state into its attribute.
    pub fn on_checkbox_toggled(&mut self, checkbox: &D::Node, checked: bool) {
        if checked {
            self.doc.set_attribute(checkbox, "checked", "checked");
        } else {
            self.doc.remove_attribute(checkbox, "checked");
        }
        self.update_editor_state();
    }

    pub fn on_wheel(&mut self, dy: f64) {
        let residual = self.scroll.wheel(&self.doc.metrics(), dy);
        self.forward_edge_scroll(residual);
    }

    pub fn on_touch_start(&mut self, y: f64) {
        self.scroll.touch_start(y);
    }

    pub fn on_touch_move(&mut self, y: f64) {
        let residual = self.scroll.touch_move(&self.doc.metrics(), y);
        self.forward_edge_scroll(residual);
    }

    /// Frame callback requested through the scheduler.
    pub fn on_frame(&mut self) {
        let height = self.doc.metrics().content_height();
        if let Some(height) = self.height.on_frame(height) {
            self.deliver_height(height);
        }
    }

    /// Timer callback requested through the scheduler.
    pub fn on_timer(&mut self, token: TimerToken) {
        match token {
            TimerToken::PastePoll { .. } => self.poll_paste(token),
        }
    }

    // === Internals ===

    fn poll_paste(&mut self, token: TimerToken) {
        let root = self.doc.root();
        let current = self.doc.inner_html(&root);
        match self.paste.poll(token, &current) {
            None => {
                tracing::trace!(target: "weft::paste", ?token, "ignoring stale paste poll");
            }
            Some(PollOutcome::Reschedule(next)) => {
                self.scheduler
                    .set_timeout(next, self.config.paste_poll_delay_ms);
            }
            Some(PollOutcome::Finished { repaired, .. }) => {
                if let Some(html) = repaired {
                    self.doc.set_inner_html(&root, &html);
                }
                self.update_editor_state();
                self.schedule_height(false);
            }
        }
    }

    /// Request a height notification on the next frame.
    pub fn schedule_height(&mut self, force: bool) {
        if self.height.request(force) {
            self.scheduler.request_frame();
        }
    }

    fn deliver_height(&mut self, height: f64) {
        let Some(channel) = HeightChannel::select(&self.host) else {
            tracing::debug!(target: "weft::height", height, "no height channel available");
            return;
        };
        if let Err(e) = self.host.post_height(channel, height) {
            tracing::warn!(target: "weft::height", error = %e, ?channel, "height notification failed");
        }
    }

    fn forward_edge_scroll(&mut self, residual: Option<f64>) {
        let Some(delta) = residual else {
            return;
        };
        if let Err(e) = self.host.forward_edge_scroll(delta) {
            tracing::trace!(error = %e, delta, "edge scroll not forwarded");
        }
    }

    /// Put the stored anchor back, falling back to the end of the document.
    fn restore_anchor(&mut self) {
        if let Err(e) = self.ranges.restore(&mut self.doc) {
            tracing::debug!(error = %e, "placing caret at end of document");
            let root = self.doc.root();
            self.doc.collapse_to_end(&root);
        }
    }

    /// Insert markup through the native executor at the stored anchor.
    fn insert_markup(&mut self, html: &str) {
        self.ranges.capture(&self.doc);
        self.restore_anchor();
        if !self.doc.exec_command("insertHTML", Some(html)) {
            tracing::debug!("native insertHTML was rejected");
        }
        if self.images.resizing_enabled() {
            self.images.prepare_all(&mut self.doc);
        }
        self.update_editor_state();
    }

    /// Replace content with the default paragraph and park the caret
    /// after its zero-width space.
    fn install_default_document(&mut self) {
        self.doc.exec_command("defaultParagraphSeparator", Some("p"));
        let root = self.doc.root();
        self.doc.set_inner_html(&root, EMPTY_DOCUMENT_HTML);

        let caret = self
            .doc
            .children(&root)
            .first()
            .and_then(|p| self.doc.children(p).first().cloned());
        if let Some(text) = caret {
            let len = self.doc.node_len(&text);
            if let Err(e) = self.doc.set_selection_range(&NativeRange::caret(text, len)) {
                tracing::debug!(error = %e, "could not place caret in default paragraph");
            }
        }
    }
}
