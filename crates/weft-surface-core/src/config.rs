//! Tunables for a surface instance.

use serde::Deserialize;

/// Configuration for one editing surface.
///
/// Deserializes from a partial object; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SurfaceConfig {
    /// Smallest width a resize gesture may produce.
    pub image_min_width: f64,
    /// Smallest height a resize gesture may produce.
    pub image_min_height: f64,
    /// Delay before the first paste check and between retries.
    pub paste_poll_delay_ms: u32,
    /// Retries before a paste is treated as final.
    pub paste_max_attempts: u32,
    /// Timer delay used when animation frames are unavailable.
    pub frame_fallback_ms: u32,
    /// Height changes smaller than this are not reported unless forced.
    pub height_threshold: f64,
    /// Fraction of the viewport width given to images inserted without a width.
    pub default_image_width_ratio: f64,
    pub resizing_enabled: bool,
    /// Report full state snapshots over the URL channel.
    pub url_state_channel: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            image_min_width: 100.0,
            image_min_height: 50.0,
            paste_poll_delay_ms: 100,
            paste_max_attempts: 10,
            frame_fallback_ms: 16,
            height_threshold: 1.0,
            default_image_width_ratio: 0.75,
            resizing_enabled: true,
            url_state_channel: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_takes_defaults() {
        let config: SurfaceConfig =
            serde_json::from_str(r#"{"pasteMaxAttempts": 3, "urlStateChannel": true}"#).unwrap();
        assert_eq!(config.paste_max_attempts, 3);
        assert!(config.url_state_channel);
        assert_eq!(config.paste_poll_delay_ms, 100);
        assert_eq!(config.image_min_width, 100.0);
    }
}
