//! Outbound host boundary.
//!
//! The embedding shell exposes some subset of delivery mechanisms. The
//! surface asks which exist, picks one per notification, and logs (never
//! propagates) delivery failures.

use crate::error::SurfaceError;

/// A mechanism for delivering content-height updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeightChannel {
    /// Native bridge handler call (`contentHeight`).
    NativeBridge,
    /// Registered message handler `contentHeight.postMessage`.
    MessageHandler,
    /// `postMessage` to the parent window.
    ParentWindow,
}

impl HeightChannel {
    /// Channels in the order they are tried.
    pub const PRIORITY: [HeightChannel; 3] = [
        HeightChannel::NativeBridge,
        HeightChannel::MessageHandler,
        HeightChannel::ParentWindow,
    ];

    /// Highest-priority channel the host exposes.
    pub fn select<H: HostTransport + ?Sized>(host: &H) -> Option<HeightChannel> {
        Self::PRIORITY
            .into_iter()
            .find(|channel| host.has_height_channel(*channel))
    }
}

/// How editor-state changes reach the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTransport {
    /// Direct synchronous callback with the changed flag.
    Callback,
    /// Navigation to a pseudo-protocol URL carrying the full snapshot.
    Url,
}

impl StateTransport {
    /// The callback wins when present; the URL channel is opt-in.
    pub fn select<H: HostTransport + ?Sized>(host: &H, url_opt_in: bool) -> Option<StateTransport> {
        if host.has_state_callback() {
            Some(StateTransport::Callback)
        } else if url_opt_in {
            Some(StateTransport::Url)
        } else {
            None
        }
    }
}

/// Delivery of surface notifications to the host shell.
pub trait HostTransport {
    fn has_height_channel(&self, channel: HeightChannel) -> bool;

    fn post_height(&mut self, channel: HeightChannel, height: f64) -> Result<(), SurfaceError>;

    /// Whether the host registered a direct editor-state callback.
    fn has_state_callback(&self) -> bool;

    fn notify_state_changed(&mut self, changed: bool) -> Result<(), SurfaceError>;

    /// Hand an `editor-state-changed-callback://` URL to the host.
    fn open_state_url(&mut self, url: &str) -> Result<(), SurfaceError>;

    /// Forward residual scroll past a viewport edge.
    fn forward_edge_scroll(&mut self, delta: f64) -> Result<(), SurfaceError>;
}

/// Host that records every delivery, for tests and headless embedding.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    pub channels: Vec<HeightChannel>,
    pub state_callback: bool,
    pub edge_scroll_bridge: bool,
    /// Make every delivery fail with a transport error.
    pub failing: bool,
    pub heights: Vec<(HeightChannel, f64)>,
    pub state_flags: Vec<bool>,
    pub state_urls: Vec<String>,
    pub edge_scrolls: Vec<f64>,
}

impl RecordingHost {
    /// Host with a native bridge: height channel, edge-scroll forwarding,
    /// and no direct state callback.
    pub fn native_bridge() -> Self {
        Self {
            channels: vec![HeightChannel::NativeBridge],
            edge_scroll_bridge: true,
            ..Self::default()
        }
    }

    /// Host with only the direct state callback and a parent window.
    pub fn with_callback() -> Self {
        Self {
            channels: vec![HeightChannel::ParentWindow],
            state_callback: true,
            ..Self::default()
        }
    }

    pub fn last_height(&self) -> Option<f64> {
        self.heights.last().map(|(_, h)| *h)
    }

    fn check(&self) -> Result<(), SurfaceError> {
        if self.failing {
            Err(SurfaceError::Transport("host rejected delivery".into()))
        } else {
            Ok(())
        }
    }
}

impl HostTransport for RecordingHost {
    fn has_height_channel(&self, channel: HeightChannel) -> bool {
        self.channels.contains(&channel)
    }

    fn post_height(&mut self, channel: HeightChannel, height: f64) -> Result<(), SurfaceError> {
        self.check()?;
        self.heights.push((channel, height));
        Ok(())
    }

    fn has_state_callback(&self) -> bool {
        self.state_callback
    }

    fn notify_state_changed(&mut self, changed: bool) -> Result<(), SurfaceError> {
        self.check()?;
        self.state_flags.push(changed);
        Ok(())
    }

    fn open_state_url(&mut self, url: &str) -> Result<(), SurfaceError> {
        self.check()?;
        self.state_urls.push(url.to_string());
        Ok(())
    }

    fn forward_edge_scroll(&mut self, delta: f64) -> Result<(), SurfaceError> {
        if !self.edge_scroll_bridge {
            return Err(SurfaceError::NoTransport("edge scroll"));
        }
        self.check()?;
        self.edge_scrolls.push(delta);
        Ok(())
    }
}
