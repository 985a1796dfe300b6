//! Frame-coalesced content height notifications.

/// Height notification bookkeeping.
///
/// At most one frame is pending at a time. Requests made while one is
/// pending coalesce into it, upgrading it to forced if any of them asked.
#[derive(Debug, Clone)]
pub struct HeightScheduler {
    last_notified: f64,
    scheduled: bool,
    force_next: bool,
    threshold: f64,
}

impl HeightScheduler {
    pub fn new(threshold: f64) -> Self {
        Self {
            last_notified: 0.0,
            scheduled: false,
            force_next: false,
            threshold,
        }
    }

    /// Mark a notification as wanted. Returns true when the caller must
    /// request a frame.
    pub fn request(&mut self, force: bool) -> bool {
        if force {
            self.force_next = true;
        }
        if self.scheduled {
            return false;
        }
        self.scheduled = true;
        true
    }

    /// Frame callback. Returns the height to deliver, if any.
    pub fn on_frame(&mut self, height: f64) -> Option<f64> {
        if !self.scheduled {
            return None;
        }
        self.scheduled = false;
        let force = std::mem::take(&mut self.force_next);
        self.evaluate(height, force)
    }

    /// Unconditional delivery outside the frame cycle.
    pub fn refresh(&mut self, height: f64) -> f64 {
        self.last_notified = height;
        height
    }

    fn evaluate(&mut self, height: f64, force: bool) -> Option<f64> {
        if !force && (height - self.last_notified).abs() < self.threshold {
            tracing::trace!(target: "weft::height", height, "height change below threshold");
            return None;
        }
        self.last_notified = height;
        Some(height)
    }

    pub fn last_notified(&self) -> f64 {
        self.last_notified
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }
}

impl Default for HeightScheduler {
    fn default() -> Self {
        Self::new(1.0)
    }
}
