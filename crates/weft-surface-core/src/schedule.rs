//! Deferred-callback seam.
//!
//! The surface never sleeps or spawns. It asks the [`Scheduler`] for a frame
//! or a timer, and the driver later calls `Surface::on_frame` or
//! `Surface::on_timer` with the token it was given.

use std::collections::VecDeque;

/// Identifies what a timer was scheduled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerToken {
    /// Next paste-detection poll. Polls for an older generation are ignored.
    PastePoll { generation: u64 },
}

/// Frame and timer requests issued by the surface.
pub trait Scheduler {
    /// Request one callback on the next rendering frame.
    fn request_frame(&mut self);

    /// Request a callback carrying `token` after `delay_ms`.
    fn set_timeout(&mut self, token: TimerToken, delay_ms: u32);
}

/// Scheduler that queues requests for the caller to fire by hand.
///
/// Frame requests coalesce into a single flag, mirroring a real frame
/// callback that fires once regardless of how often it was asked for.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    frame_pending: bool,
    frame_requests: usize,
    timers: VecDeque<(TimerToken, u32)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the pending frame, returning whether one was requested.
    pub fn take_frame(&mut self) -> bool {
        std::mem::take(&mut self.frame_pending)
    }

    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Total `request_frame` calls seen.
    pub fn frame_requests(&self) -> usize {
        self.frame_requests
    }

    /// Pop the oldest pending timer.
    pub fn next_timer(&mut self) -> Option<(TimerToken, u32)> {
        self.timers.pop_front()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

impl Scheduler for ManualScheduler {
    fn request_frame(&mut self) {
        self.frame_pending = true;
        self.frame_requests += 1;
    }

    fn set_timeout(&mut self, token: TimerToken, delay_ms: u32) {
        self.timers.push_back((token, delay_ms));
    }
}
