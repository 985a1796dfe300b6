//! Edge-scroll forwarding.
//!
//! When the viewport is already at an edge, scroll input in that direction
//! is handed to the host so the surrounding container can keep moving.

use crate::document::ViewportMetrics;

/// Tracks the touch origin for drag gestures.
#[derive(Debug, Clone, Default)]
pub struct EdgeScroll {
    touch_start_y: f64,
}

impl EdgeScroll {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wheel input. Positive `dy` scrolls down.
    pub fn wheel(&self, metrics: &ViewportMetrics, dy: f64) -> Option<f64> {
        residual(metrics, dy)
    }

    pub fn touch_start(&mut self, y: f64) {
        self.touch_start_y = y;
    }

    /// Touch drag to `y`. The delta is measured from the touch origin, so
    /// dragging upwards (finger moving up) scrolls down.
    pub fn touch_move(&self, metrics: &ViewportMetrics, y: f64) -> Option<f64> {
        residual(metrics, self.touch_start_y - y)
    }
}

fn residual(metrics: &ViewportMetrics, dy: f64) -> Option<f64> {
    let up = dy < 0.0 && metrics.at_top();
    let down = dy > 0.0 && metrics.at_bottom();
    (up || down).then_some(dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(scroll_top: f64) -> ViewportMetrics {
        ViewportMetrics {
            scroll_top,
            client_height: 400.0,
            scroll_height: 1000.0,
            ..ViewportMetrics::default()
        }
    }

    #[test]
    fn test_wheel_forwards_only_past_edges() {
        let scroll = EdgeScroll::new();
        assert_eq!(scroll.wheel(&metrics(0.0), -30.0), Some(-30.0));
        assert_eq!(scroll.wheel(&metrics(0.0), 30.0), None);
        assert_eq!(scroll.wheel(&metrics(300.0), 30.0), None);
        assert_eq!(scroll.wheel(&metrics(600.0), 30.0), Some(30.0));
        // Sub-pixel scroll offsets still count as the bottom.
        assert_eq!(scroll.wheel(&metrics(599.4), 30.0), Some(30.0));
        assert_eq!(scroll.wheel(&metrics(600.0), 0.0), None);
    }

    #[test]
    fn test_touch_delta_from_origin() {
        let mut scroll = EdgeScroll::new();
        scroll.touch_start(200.0);
        // Finger moves up by 50: content scrolls down.
        assert_eq!(scroll.touch_move(&metrics(600.0), 150.0), Some(50.0));
        assert_eq!(scroll.touch_move(&metrics(0.0), 150.0), None);
        // Finger moves down: content scrolls up.
        assert_eq!(scroll.touch_move(&metrics(0.0), 260.0), Some(-60.0));
    }
}
