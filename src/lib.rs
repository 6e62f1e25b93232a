//! Mole Rush - a timed tap-the-target arcade game
//!
//! Core modules:
//! - `sim`: Simulation (slots, spawning, hits, scoring, effect windows)
//! - `renderer`: Multi-buffer software compositor + GPU presenter
//! - `session`: Frame loop glue between sim, renderer and host collaborators
//! - `assets`: Sprite handles (with a procedural fallback set)
//! - `tuning`: Data-driven game balance

pub mod assets;
pub mod best;
pub mod hud;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod audio;

pub use best::{BestScore, MemoryStore, ScoreStore};
pub use session::Session;
pub use settings::{QualityTier, Settings};
pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Layout and loop constants
pub mod consts {
    /// Number of target slots on the board
    pub const SLOT_COUNT: usize = 7;

    /// Normalized slot centres, top-left to bottom-right.
    /// Declaration order is the hit-test tie-break order.
    pub const GRID: [(f32, f32); SLOT_COUNT] = [
        (0.2, 0.25),
        (0.5, 0.25),
        (0.8, 0.25),
        (0.2, 0.55),
        (0.5, 0.55),
        (0.8, 0.55),
        (0.5, 0.83),
    ];

    /// Slot art size as a fraction of the short viewport side
    pub const SLOT_SIZE_FRAC: f32 = 0.18;
    /// Hit circle is lifted above the socket by this fraction of slot size
    pub const HIT_LIFT_FRAC: f32 = 0.18;
    /// Hit circle radius as a fraction of slot size
    pub const HIT_RADIUS_FRAC: f32 = 0.56;

    /// Largest wall-clock step a single tick may integrate (ms)
    pub const MAX_TICK_MS: f64 = 50.0;

    /// Device pixel ratio bounds for buffer sizing
    pub const MIN_DPR: f32 = 1.0;
    pub const MAX_DPR: f32 = 2.0;

    /// Key under which the best score is persisted
    pub const BEST_SCORE_KEY: &str = "mole_rush_best_score_v1";
}

/// Pixel-space viewport of the rendering buffers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub dpr: f32,
}

impl Viewport {
    /// Viewport for a CSS-pixel client area at the given device pixel ratio
    pub fn from_client(client_w: f32, client_h: f32, raw_dpr: f32) -> Self {
        let dpr = raw_dpr.clamp(consts::MIN_DPR, consts::MAX_DPR);
        Self {
            width: (client_w.max(1.0) * dpr).floor(),
            height: (client_h.max(1.0) * dpr).floor(),
            dpr,
        }
    }

    /// Size of one slot's art (and basis of its hit circle)
    #[inline]
    pub fn slot_size(&self) -> f32 {
        self.width.min(self.height) * consts::SLOT_SIZE_FRAC
    }

    /// Map a normalized grid position into buffer pixels
    #[inline]
    pub fn to_pixels(&self, norm: Vec2) -> Vec2 {
        Vec2::new(norm.x * self.width, norm.y * self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 720.0,
            height: 1280.0,
            dpr: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_clamps_dpr() {
        let vp = Viewport::from_client(400.0, 800.0, 3.0);
        assert_eq!(vp.dpr, 2.0);
        assert_eq!(vp.width, 800.0);
        assert_eq!(vp.height, 1600.0);

        let vp = Viewport::from_client(400.0, 800.0, 0.5);
        assert_eq!(vp.dpr, 1.0);
        assert_eq!(vp.width, 400.0);
    }

    #[test]
    fn test_slot_size_uses_short_side() {
        let vp = Viewport {
            width: 1000.0,
            height: 500.0,
            dpr: 1.0,
        };
        assert!((vp.slot_size() - 90.0).abs() < 1e-4);
    }
}
