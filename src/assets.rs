//! Sprite handles keyed by logical name
//!
//! A missing sprite is never an error: the renderer skips that draw.
//! `Assets::procedural` paints a placeholder set so the game is playable
//! without any image files.

use std::collections::HashMap;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use thiserror::Error;

use crate::renderer::canvas::{self, Canvas, Color};

/// Logical sprite names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteKey {
    Hole,
    CommonItem,
    BonusItem,
    HitFlash,
    Screamer,
    Spark,
    Glow,
    Noise,
}

impl SpriteKey {
    pub const ALL: [SpriteKey; 8] = [
        SpriteKey::Hole,
        SpriteKey::CommonItem,
        SpriteKey::BonusItem,
        SpriteKey::HitFlash,
        SpriteKey::Screamer,
        SpriteKey::Spark,
        SpriteKey::Glow,
        SpriteKey::Noise,
    ];

    /// File stem used by hosts that load real art
    pub fn name(self) -> &'static str {
        match self {
            SpriteKey::Hole => "hole",
            SpriteKey::CommonItem => "common_item",
            SpriteKey::BonusItem => "bonus_item",
            SpriteKey::HitFlash => "hit_flash",
            SpriteKey::Screamer => "screamer",
            SpriteKey::Spark => "spark",
            SpriteKey::Glow => "glow",
            SpriteKey::Noise => "noise",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("sprite has zero size ({width}x{height})")]
    Empty { width: usize, height: usize },
    #[error("expected {expected} bytes of RGBA data, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Premultiplied image
#[derive(Debug, Clone)]
pub struct Sprite {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl Sprite {
    /// From straight-alpha RGBA8 bytes (decoded image data)
    pub fn from_rgba8(width: usize, height: usize, bytes: &[u8]) -> Result<Self, AssetError> {
        if width == 0 || height == 0 {
            return Err(AssetError::Empty { width, height });
        }
        let expected = width * height * 4;
        if bytes.len() != expected {
            return Err(AssetError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|p| Color::rgba(p[0], p[1], p[2], p[3] as f32 / 255.0))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Snapshot of a canvas
    pub fn from_canvas(canvas: &Canvas) -> Self {
        Self {
            width: canvas.width(),
            height: canvas.height(),
            pixels: canvas.pixels().to_vec(),
        }
    }

    pub fn solid(width: usize, height: usize, color: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Premultiplied RGBA8 for GPU upload
    pub fn write_rgba8(&self, out: &mut Vec<u8>) {
        canvas::encode_rgba8(&self.pixels, out);
    }

    /// Texel with edge clamping
    #[inline]
    pub fn texel(&self, x: usize, y: usize) -> Color {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        self.pixels
            .get(y * self.width + x)
            .copied()
            .unwrap_or(Color::TRANSPARENT)
    }
}

/// Sprite registry
#[derive(Debug, Clone, Default)]
pub struct Assets {
    sprites: HashMap<SpriteKey, Sprite>,
}

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: SpriteKey) -> Option<&Sprite> {
        self.sprites.get(&key)
    }

    /// Add or replace a sprite (e.g. once real art has loaded)
    pub fn insert(&mut self, key: SpriteKey, sprite: Sprite) {
        self.sprites.insert(key, sprite);
    }

    pub fn remove(&mut self, key: SpriteKey) -> Option<Sprite> {
        self.sprites.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Placeholder art painted in code
    pub fn procedural(seed: u64) -> Self {
        let mut assets = Self::new();
        for key in SpriteKey::ALL {
            assets.insert(key, paint(key, seed));
        }
        log::debug!("Painted {} procedural sprites", assets.len());
        assets
    }
}

fn paint(key: SpriteKey, seed: u64) -> Sprite {
    let pink = Color::rgba(255, 77, 196, 1.0);
    let canvas = match key {
        SpriteKey::Hole => {
            let mut c = Canvas::new(128, 128);
            let mid = Vec2::new(64.0, 72.0);
            c.fill_ellipse(mid, Vec2::new(60.0, 34.0), 3.0, Color::rgba(58, 34, 22, 1.0));
            c.fill_ellipse(mid, Vec2::new(50.0, 26.0), 2.0, Color::rgba(12, 8, 6, 1.0));
            c.fill_ellipse(mid - Vec2::new(0.0, 14.0), Vec2::new(44.0, 8.0), 6.0, Color::rgba(0, 0, 0, 0.6));
            c
        }
        SpriteKey::CommonItem => {
            // Tall capsule device
            let mut c = Canvas::new(64, 128);
            c.stroke_line(Vec2::new(32.0, 18.0), Vec2::new(32.0, 110.0), 40.0, Color::rgba(226, 228, 236, 1.0));
            c.stroke_line(Vec2::new(32.0, 22.0), Vec2::new(32.0, 40.0), 30.0, Color::rgba(40, 44, 56, 1.0));
            c.fill_circle(Vec2::new(32.0, 78.0), 5.0, Color::rgba(80, 180, 255, 1.0));
            c
        }
        SpriteKey::BonusItem => {
            // Wide pack
            let mut c = Canvas::new(128, 90);
            c.fill_rect(10.0, 12.0, 108.0, 66.0, pink);
            c.fill_rect(10.0, 12.0, 108.0, 14.0, Color::rgba(255, 255, 255, 0.85));
            c.stroke_rect(10.0, 12.0, 108.0, 66.0, 4.0, Color::rgba(120, 20, 90, 1.0));
            c
        }
        SpriteKey::HitFlash => {
            let mut c = Canvas::new(128, 128);
            let mid = Vec2::splat(64.0);
            for i in 0..8 {
                let angle = i as f32 * std::f32::consts::TAU / 8.0;
                let tip = mid + Vec2::new(angle.cos(), angle.sin()) * 58.0;
                c.stroke_line(mid, tip, 7.0, Color::rgba(255, 240, 200, 0.9));
            }
            c.fill_ellipse(mid, Vec2::splat(22.0), 14.0, Color::WHITE);
            c
        }
        SpriteKey::Screamer => {
            let mut c = Canvas::new(256, 256);
            let mid = Vec2::splat(128.0);
            c.fill_ellipse(mid, Vec2::new(96.0, 118.0), 4.0, Color::rgba(196, 188, 176, 1.0));
            c.fill_ellipse(Vec2::new(92.0, 104.0), Vec2::new(22.0, 30.0), 3.0, Color::BLACK);
            c.fill_ellipse(Vec2::new(164.0, 104.0), Vec2::new(22.0, 30.0), 3.0, Color::BLACK);
            c.fill_ellipse(Vec2::new(128.0, 186.0), Vec2::new(30.0, 44.0), 3.0, Color::rgba(20, 0, 0, 1.0));
            c.fill_circle(Vec2::new(92.0, 108.0), 5.0, Color::rgba(255, 30, 30, 1.0));
            c.fill_circle(Vec2::new(164.0, 108.0), 5.0, Color::rgba(255, 30, 30, 1.0));
            c
        }
        SpriteKey::Spark => {
            let mut c = Canvas::new(32, 32);
            c.fill_ellipse(Vec2::splat(16.0), Vec2::splat(6.0), 10.0, Color::WHITE);
            c
        }
        SpriteKey::Glow => {
            let mut c = Canvas::new(128, 128);
            c.fill_ellipse(Vec2::splat(64.0), Vec2::splat(40.0), 24.0, pink.scale(0.8));
            c
        }
        SpriteKey::Noise => {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut c = Canvas::new(128, 128);
            for y in 0..128 {
                for x in 0..128 {
                    let v = rng.random::<u8>();
                    let a = rng.random::<f32>() * 0.8;
                    c.fill_rect(x as f32, y as f32, 1.0, 1.0, Color::rgba(v, v, v, a));
                }
            }
            c
        }
    };
    Sprite::from_canvas(&canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedural_has_every_key() {
        let assets = Assets::procedural(1);
        for key in SpriteKey::ALL {
            let sprite = assets.get(key).unwrap();
            assert!(!sprite.is_empty(), "{} is empty", key.name());
        }
    }

    #[test]
    fn test_noise_is_seeded() {
        let a = Assets::procedural(9);
        let b = Assets::procedural(9);
        let c = Assets::procedural(10);
        let texels = |x: &Assets| {
            let s = x.get(SpriteKey::Noise).unwrap();
            (0..16).map(|i| s.texel(i, 3)).collect::<Vec<_>>()
        };
        assert_eq!(texels(&a), texels(&b));
        assert_ne!(texels(&a), texels(&c));
    }

    #[test]
    fn test_from_rgba8_premultiplies() {
        let sprite = Sprite::from_rgba8(1, 1, &[255, 0, 0, 51]).unwrap();
        let t = sprite.texel(0, 0);
        assert!((t.r - 0.2).abs() < 1e-6);
        assert!((t.a - 0.2).abs() < 1e-6);

        let mut upload = Vec::new();
        sprite.write_rgba8(&mut upload);
        assert_eq!(upload, vec![51, 0, 0, 51]);
    }

    #[test]
    fn test_from_rgba8_rejects_bad_input() {
        assert_eq!(
            Sprite::from_rgba8(2, 2, &[0; 8]).unwrap_err(),
            AssetError::SizeMismatch {
                expected: 16,
                actual: 8
            }
        );
        assert!(matches!(
            Sprite::from_rgba8(0, 4, &[]),
            Err(AssetError::Empty { .. })
        ));
    }

    #[test]
    fn test_missing_sprite_is_none() {
        let mut assets = Assets::procedural(3);
        assets.remove(SpriteKey::Screamer);
        assert!(assets.get(SpriteKey::Screamer).is_none());
        assert_eq!(assets.len(), 7);
    }
}
