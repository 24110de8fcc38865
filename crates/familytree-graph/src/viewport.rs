use crate::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Pan/zoom transform applied to the whole rendered tree.
///
/// `screen = tree * zoom + pan`. The tree state is never touched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub zoom: f32,
    pub pan: Vec2,
    /// Screen size in pixels.
    pub size: Vec2,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Vec2::new(1200.0, 800.0), Self::MIN_ZOOM, Self::MAX_ZOOM)
    }
}

impl Viewport {
    pub const MIN_ZOOM: f32 = 0.1;
    pub const MAX_ZOOM: f32 = 4.0;

    pub fn new(size: Vec2, min_zoom: f32, max_zoom: f32) -> Self {
        let min_zoom = if min_zoom > 0.0 { min_zoom } else { Self::MIN_ZOOM };
        let max_zoom = max_zoom.max(min_zoom);
        Self {
            zoom: 1.0_f32.clamp(min_zoom, max_zoom),
            pan: Vec2::ZERO,
            size,
            min_zoom,
            max_zoom,
        }
    }

    pub fn tree_to_screen(&self, p: Vec2) -> Vec2 {
        p * self.zoom + self.pan
    }

    pub fn screen_to_tree(&self, p: Vec2) -> Vec2 {
        (p - self.pan) * (1.0 / self.zoom)
    }

    /// Scale by `factor`, keeping the tree point under `anchor` fixed on
    /// screen. Returns whether the zoom changed.
    pub fn zoom_by(&mut self, factor: f32, anchor: Vec2) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        self.set_zoom(self.zoom * factor, anchor)
    }

    pub fn set_zoom(&mut self, zoom: f32, anchor: Vec2) -> bool {
        let new_zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() <= f32::EPSILON {
            return false;
        }
        let tree_point = self.screen_to_tree(anchor);
        self.zoom = new_zoom;
        self.pan = anchor - tree_point * self.zoom;
        true
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan = self.pan + delta;
    }

    pub fn resize(&mut self, size: Vec2) {
        self.size = size;
    }

    pub fn reset(&mut self) {
        self.zoom = 1.0_f32.clamp(self.min_zoom, self.max_zoom);
        self.pan = Vec2::ZERO;
    }

    /// Scale and centre so `bounds` plus `padding` fills the screen.
    pub fn zoom_to_fit(&mut self, bounds: Rect, padding: f32) {
        let padded = bounds.expand(padding);
        let available = Vec2::new(
            (self.size.x - 2.0 * padding).max(1.0),
            (self.size.y - 2.0 * padding).max(1.0),
        );
        let scale = (available.x / padded.width().max(1.0))
            .min(available.y / padded.height().max(1.0))
            .clamp(self.min_zoom, self.max_zoom);
        self.zoom = scale;
        self.pan = self.size * 0.5 - padded.center() * self.zoom;
    }
}
