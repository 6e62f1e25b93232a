//! Frame compositor
//!
//! The CPU draws one transparent foreground layer per frame (border, slots,
//! occupants, particles, labels). The GPU passes in `post.wgsl` put the
//! ground and lights under it and apply bloom, feedback and the rest of the
//! post stack, driven by the `PostGlobals` built alongside.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::canvas::{Canvas, Color, SpriteDraw};
use super::font;
use super::post::PostGlobals;
use crate::Viewport;
use crate::assets::{Assets, SpriteKey};
use crate::settings::QualityTier;
use crate::sim::{GameState, Occupant, ParticleKind, TargetSlot};

fn pink(a: f32) -> Color {
    Color::rgba(255, 105, 180, a)
}

/// One rendered frame, ready for the presenter
pub struct Frame<'a> {
    pub layer: &'a Canvas,
    pub post: PostGlobals,
}

pub struct Compositor {
    layer: Canvas,
    viewport: Viewport,
    /// Shake jitter and glitch strips only; never touches the sim's stream
    rng: Pcg32,
}

impl Compositor {
    pub fn new(viewport: Viewport, seed: u64) -> Self {
        let (w, h) = buffer_size(&viewport);
        Self {
            layer: Canvas::new(w, h),
            viewport,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        let (w, h) = buffer_size(&viewport);
        self.viewport = viewport;
        self.layer.resize(w, h);
        log::debug!("Compositor layer {}x{}", w, h);
    }

    /// Render one frame at wall-clock `now`
    pub fn render(&mut self, state: &GameState, assets: &Assets, quality: QualityTier, now: f64) -> Frame<'_> {
        let params = quality.params();
        self.draw_layer(state, assets, now);
        let post = PostGlobals::build(state, assets, &params, &self.viewport, now, &mut self.rng);
        Frame {
            layer: &self.layer,
            post,
        }
    }

    fn draw_layer(&mut self, state: &GameState, assets: &Assets, now: f64) {
        let vp = self.viewport;
        let (w, h, dpr) = (vp.width, vp.height, vp.dpr);
        let layer = &mut self.layer;
        layer.clear();

        layer.stroke_rect(
            14.0 * dpr,
            14.0 * dpr,
            w - 28.0 * dpr,
            h - 28.0 * dpr,
            22.0 * dpr,
            Color::rgba(255, 255, 255, 0.18 * 0.24),
        );

        for slot in state.slots.iter() {
            draw_slot(layer, assets, &vp, slot, now);
        }

        for p in &state.fx.particles {
            let a = 1.0 - p.progress();
            let (width, tint) = match p.kind {
                ParticleKind::Bonus => (9.0, pink(1.0)),
                ParticleKind::Hit => (7.0, Color::WHITE),
            };
            layer.stroke_line(p.prev, p.pos, width * dpr, tint.scale(a * 0.35));

            match (p.kind, assets.get(SpriteKey::Spark)) {
                (ParticleKind::Hit, Some(spark)) => {
                    let s = p.radius * 6.4;
                    layer.draw_sprite(spark, SpriteDraw::new(p.pos, Vec2::splat(s)).alpha(a * 0.92));
                }
                _ => {
                    let r = p.radius * (1.0 - p.progress() * 0.4);
                    layer.fill_circle(p.pos, r, tint.scale(a * 0.92));
                }
            }
        }

        for t in &state.fx.texts {
            let a = 1.0 - t.progress();
            let px = if t.emphasized { 30.0 } else { 24.0 } * dpr;
            let cell = px / 7.0;
            let shadow = t.pos + Vec2::splat(cell * 0.6);
            font::draw_text(layer, &t.text, shadow, cell, Color::rgba(0, 0, 0, 0.70 * a));
            font::draw_text(layer, &t.text, t.pos, cell, Color::rgba(255, 255, 255, 0.96 * a));
        }
    }
}

fn buffer_size(vp: &Viewport) -> (usize, usize) {
    (vp.width.max(1.0) as usize, vp.height.max(1.0) as usize)
}

fn draw_slot(scene: &mut Canvas, assets: &Assets, vp: &Viewport, slot: &TargetSlot, now: f64) {
    let dpr = vp.dpr;
    let centre = vp.to_pixels(slot.pos);
    let size = vp.slot_size();
    let pop_size = size * 0.92;

    // Socket shadow
    scene.fill_ellipse(
        centre + Vec2::new(0.0, 11.0 * dpr),
        Vec2::new(size * 0.52, size * 0.36),
        11.0 * dpr,
        Color::rgba(0, 0, 0, 0.60 * 0.28),
    );

    if let Some(hole) = assets.get(SpriteKey::Hole) {
        scene.draw_sprite(hole, SpriteDraw::new(centre, Vec2::splat(size)));
    }

    let ring = slot.ring.value;
    if ring > 0.02 {
        if let Some(glow) = assets.get(SpriteKey::Glow) {
            let r = size * (0.88 + ring * 0.70);
            scene.draw_sprite(glow, SpriteDraw::new(centre, Vec2::splat(r)).alpha((0.62 * ring).min(1.0)));
        }
    }

    if let Some(kind) = slot.occupant {
        let pop = slot.pop_progress();
        let bob = (slot.idle * 6.2).sin() * 4.0 * dpr * (0.15 + 0.35 * pop);
        match kind {
            Occupant::Common => {
                if let Some(item) = assets.get(SpriteKey::CommonItem) {
                    let w = pop_size * 1.15 * pop;
                    let h = pop_size * 2.08 * pop;
                    let top = centre.y - h + size * 0.28 + bob;
                    let mid = Vec2::new(centre.x, top + h * 0.5);
                    let dims = Vec2::new(w, h);

                    scene.draw_sprite(
                        item,
                        SpriteDraw::new(mid + Vec2::new(10.0, 16.0) * dpr, dims)
                            .alpha(0.35)
                            .tint(Color::BLACK),
                    );
                    scene.draw_sprite(item, SpriteDraw::new(mid, dims));
                    // Sheen
                    scene.fill_rect(
                        centre.x - w * 0.22,
                        top + h * 0.12,
                        w * 0.08,
                        h * 0.76,
                        Color::rgba(255, 255, 255, 0.10),
                    );
                }
            }
            Occupant::Bonus => {
                if let Some(item) = assets.get(SpriteKey::BonusItem) {
                    let w = pop_size * 1.42 * pop;
                    let h = pop_size * pop;
                    let top = centre.y - h + size * 0.20 + bob * 0.6;
                    let rot = (slot.idle * 5.4).sin() * 0.03 * pop;
                    // Rock around a pivot just below the sprite's middle
                    let pivot = Vec2::new(centre.x, top + h * 0.55);
                    let mid = pivot + Vec2::from_angle(rot).rotate(Vec2::new(0.0, -h * 0.05));
                    let dims = Vec2::new(w, h);

                    scene.draw_sprite(
                        item,
                        SpriteDraw::new(mid, dims * 1.18)
                            .rotation(rot)
                            .alpha(0.55)
                            .tint(Color::rgba(255, 77, 196, 0.98)),
                    );
                    scene.draw_sprite(item, SpriteDraw::new(mid, dims).rotation(rot));
                }
            }
        }
    }

    if now < slot.flash_until {
        if let Some(flash) = assets.get(SpriteKey::HitFlash) {
            let a = ((slot.flash_until - now) / 200.0).clamp(0.0, 1.0) as f32;
            scene.draw_sprite(flash, SpriteDraw::new(centre, Vec2::splat(pop_size)).alpha(a));
        }
    }
}
