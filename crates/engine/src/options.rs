use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_STROKES: usize = 2;
pub const DEFAULT_ASSET_BASE: &str = "static/images/stim/";
pub const DEFAULT_PLAYBACK_DELAY_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Tunables for a session. Every field has a default, so a partial
/// `[engine]` table in the config file is enough.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Minimum number of strokes a drawing needs before the trial can advance
    pub min_strokes: usize,
    /// Skip input validation entirely. Development only.
    pub debug_bypass: bool,
    /// Prefix prepended to image stimulus filenames
    pub asset_base: String,
    /// Sketchpad size when collecting drawings
    pub editor_canvas: CanvasSize,
    /// Sketchpad size when replaying drawings
    pub viewer_canvas: CanvasSize,
    /// How long navigation stays locked on passive review phases
    pub playback_delay_ms: u64,
    /// Where to send the participant after the last trial
    pub feedback_url: Option<String>,
}

impl EngineOptions {
    pub fn playback_delay(&self) -> Duration {
        Duration::from_millis(self.playback_delay_ms)
    }

    pub fn with_debug_bypass(mut self, enabled: bool) -> Self {
        self.debug_bypass = enabled;
        self
    }

    pub fn with_feedback_url(mut self, url: impl Into<String>) -> Self {
        self.feedback_url = Some(url.into());
        self
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            min_strokes: DEFAULT_MIN_STROKES,
            debug_bypass: false,
            asset_base: DEFAULT_ASSET_BASE.to_string(),
            editor_canvas: CanvasSize::new(400, 400),
            viewer_canvas: CanvasSize::new(500, 500),
            playback_delay_ms: DEFAULT_PLAYBACK_DELAY_MS,
            feedback_url: None,
        }
    }
}
