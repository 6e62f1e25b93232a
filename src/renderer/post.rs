//! Per-frame post-processing parameters
//!
//! Everything full-screen (ground gradient, lights, bloom, motion-blur
//! feedback, shake, chroma split, vignette, scanlines, grain and the
//! jump-scare overlays) runs on the GPU in `post.wgsl`. This module packs
//! the values those passes read into one uniform block.

use bytemuck::{Pod, Zeroable};

use super::canvas::Color;
use crate::Viewport;
use crate::assets::{Assets, SpriteKey};
use crate::settings::QualityParams;
use crate::sim::{GameState, RandomSource};

/// Chroma offsets below this are drawn as a single pass
pub const CHROMA_MIN_PX: f32 = 0.5;
/// Screen-blend opacity of the bloom buffer
pub const BLOOM_MIX: f32 = 0.90;
pub const GLITCH_STRIPS: usize = 22;
/// Moving background lights
pub const LIGHTS: usize = 3;
const STRIP_SLOTS: usize = GLITCH_STRIPS / 2;

// ============================================================================
// GPU DATA STRUCTURES (must match post.wgsl)
// ============================================================================

/// Uniform block shared by every post pass. All fields are vec4 so the
/// layout is identical under WGSL uniform rules.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PostGlobals {
    pub resolution: [f32; 4],            // offset 0   - width, height, dpr, _
    pub ground_top: [f32; 4],            // offset 16  - premultiplied
    pub ground_bottom: [f32; 4],         // offset 32
    pub lights: [[f32; 4]; LIGHTS],      // offset 48  - centre x, centre y, r0, r1
    pub light_colors: [[f32; 4]; LIGHTS], // offset 96 - premultiplied at r0
    pub frame: [f32; 4],                 // offset 144 - shake x, shake y, chroma px, feedback alpha
    pub bloom: [f32; 4],                 // offset 160 - screen alpha, blur sigma, grain alpha, scan alpha
    pub vignette: [f32; 4],              // offset 176 - centre x, centre y, r0, r1
    pub grain: [f32; 4],                 // offset 192 - tile size, offset x, offset y, has noise
    pub scare: [f32; 4],                 // offset 208 - overlay, flash, has screamer, strip count
    pub screamer: [f32; 4],              // offset 224 - centre x, centre y, size, _
    pub strips: [[f32; 4]; STRIP_SLOTS], // offset 240 - (y, height) pairs
}

/// Step of one separable blur pass, in source uv
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct BlurParams {
    pub step: [f32; 2],
    _pad: [f32; 2],
}

impl BlurParams {
    /// Taps are spaced a third of `sigma` apart along `dir`
    pub fn new(dir: [f32; 2], sigma: f32, width: f32, height: f32) -> Self {
        let spacing = sigma.max(0.0) / 3.0;
        Self {
            step: [dir[0] * spacing / width.max(1.0), dir[1] * spacing / height.max(1.0)],
            _pad: [0.0; 2],
        }
    }
}

fn rgba(c: Color) -> [f32; 4] {
    [c.r, c.g, c.b, c.a]
}

impl PostGlobals {
    /// Pack the post parameters for one frame at wall-clock `now`.
    ///
    /// `rng` supplies the shake jitter and glitch strip positions.
    pub fn build(
        state: &GameState,
        assets: &Assets,
        params: &QualityParams,
        vp: &Viewport,
        now: f64,
        rng: &mut impl RandomSource,
    ) -> Self {
        let (w, h, dpr) = (vp.width, vp.height, vp.dpr);
        let effects = &state.effects;
        let mut g = Self::zeroed();

        g.resolution = [w, h, dpr, 0.0];
        g.ground_top = rgba(Color::rgba(60, 35, 24, 0.36));
        g.ground_bottom = rgba(Color::rgba(0, 0, 0, 0.28));
        g.set_lights(vp, now);

        let shake = effects.shake.intensity(now);
        let (sx, sy) = if shake > 0.0 {
            (rng.range(-1.0, 1.0) * shake, rng.range(-1.0, 1.0) * shake)
        } else {
            (0.0, 0.0)
        };
        let c = effects.chroma.intensity(now);
        let chroma = if c > CHROMA_MIN_PX { c } else { 0.0 };
        g.frame = [sx, sy, chroma, params.motion_blur];

        g.bloom = [
            params.bloom_alpha * BLOOM_MIX,
            params.bloom_blur,
            params.grain_alpha,
            params.scan_alpha,
        ];
        g.vignette = [w * 0.5, h * 0.5, w.min(h) * 0.18, w.max(h) * 0.98];

        let s = 256.0 * dpr * params.noise_scale;
        let has_noise = assets.get(SpriteKey::Noise).is_some();
        g.grain = [
            s,
            (now * 0.07).rem_euclid(s as f64) as f32,
            (now * 0.05).rem_euclid(s as f64) as f32,
            if has_noise { 1.0 } else { 0.0 },
        ];

        let overlay = effects.scare_overlay.intensity(now);
        let flash = effects.scare_flash.intensity(now);
        let has_screamer = assets.get(SpriteKey::Screamer).is_some();
        let mut strips = 0;
        if overlay > 0.0 {
            let t = now as f32;
            let size = w.min(h) * (0.96 + 0.06 * (t * 0.09).sin());
            g.screamer = [w * 0.5, h * 0.5 - (t * 0.12).sin() * 12.0 * dpr, size, 0.0];
            for i in 0..GLITCH_STRIPS {
                let y = (rng.next_unit() * h).floor();
                let sh = (rng.next_unit() * 16.0 + 4.0) * dpr;
                let slot = &mut g.strips[i / 2];
                slot[(i % 2) * 2] = y;
                slot[(i % 2) * 2 + 1] = sh;
            }
            strips = GLITCH_STRIPS;
        }
        g.scare = [overlay, flash, if has_screamer { 1.0 } else { 0.0 }, strips as f32];
        g
    }

    /// Three slow-moving radial lights
    fn set_lights(&mut self, vp: &Viewport, now: f64) {
        let (w, h) = (vp.width, vp.height);
        let (short, long) = (w.min(h), w.max(h));
        let t = now as f32;

        self.lights[0] = [w * 0.5, h * 0.18, short * 0.08, long * 0.95];
        self.light_colors[0] = rgba(Color::rgba(255, 255, 255, 0.065));

        self.lights[1] = [
            w * (0.5 + 0.14 * (t * 0.0008).sin()),
            h * (0.58 + 0.11 * (t * 0.00065).cos()),
            short * 0.05,
            short * 0.62,
        ];
        self.light_colors[1] = rgba(Color::rgba(255, 105, 180, 0.07));

        self.lights[2] = [
            w * (0.36 + 0.10 * (t * 0.0009).cos()),
            h * (0.40 + 0.12 * (t * 0.0007).sin()),
            short * 0.04,
            short * 0.50,
        ];
        self.light_colors[2] = rgba(Color::rgba(80, 180, 255, 0.055));
    }

    pub fn shake_offset(&self) -> [f32; 2] {
        [self.frame[0], self.frame[1]]
    }

    /// Horizontal split of the extra scene draws; 0 means one plain draw
    pub fn chroma_px(&self) -> f32 {
        self.frame[2]
    }

    /// Opacity of the previous frame under this one
    pub fn feedback_alpha(&self) -> f32 {
        self.frame[3]
    }

    pub fn strip(&self, i: usize) -> Option<(f32, f32)> {
        if i >= self.scare[3] as usize {
            return None;
        }
        let slot = self.strips[i / 2];
        Some((slot[(i % 2) * 2], slot[(i % 2) * 2 + 1]))
    }
}
