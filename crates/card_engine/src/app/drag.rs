use serde::{Deserialize, Serialize};

pub const DEFAULT_DRAG_ORIGIN_PX: f32 = 200.0;
pub const DEFAULT_DRAG_SPAN_PX: f32 = 200.0;
pub const DEFAULT_COMPLETION_THRESHOLD: f32 = 0.8;

/// Maps the vertical pointer position onto how far the card has left the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DragSettings {
    pub origin_px: f32,
    pub span_px: f32,
    pub completion_threshold: f32,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            origin_px: DEFAULT_DRAG_ORIGIN_PX,
            span_px: DEFAULT_DRAG_SPAN_PX,
            completion_threshold: DEFAULT_COMPLETION_THRESHOLD,
        }
    }
}

impl DragSettings {
    pub fn progress_for(&self, client_y: f32) -> f32 {
        drag_progress(client_y, self.origin_px, self.span_px)
    }

    /// Strictly above the threshold; exactly at the threshold still snaps back.
    pub fn is_complete(&self, progress: f32) -> bool {
        progress > self.completion_threshold
    }

    /// A coordinate that normalizes to full progress.
    pub fn full_pull_client_y(&self) -> f32 {
        self.origin_px + self.span_px
    }
}

pub fn drag_progress(client_y: f32, origin_px: f32, span_px: f32) -> f32 {
    if !client_y.is_finite() || !span_px.is_finite() || span_px <= 0.0 {
        return 0.0;
    }
    ((client_y - origin_px) / span_px).clamp(0.0, 1.0)
}
