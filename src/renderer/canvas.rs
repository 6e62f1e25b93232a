//! Software raster buffers
//!
//! A `Canvas` is a premultiplied RGBA image in display space with a small
//! set of 2D-canvas style operations: rect fills, anti-aliased shapes and
//! sprite blits. It only holds the foreground layer; everything full-screen
//! happens on the GPU (see `post.wgsl`).

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::assets::Sprite;

/// Premultiplied RGBA
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Self = Self::premul(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::premul(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::premul(1.0, 1.0, 1.0, 1.0);

    /// Already-premultiplied components
    pub const fn premul(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Straight (CSS style) color: 0-255 channels, alpha in [0, 1]
    pub fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        let a = a.clamp(0.0, 1.0);
        Self {
            r: r as f32 / 255.0 * a,
            g: g as f32 / 255.0 * a,
            b: b as f32 / 255.0 * a,
            a,
        }
    }

    /// Multiply every component (global alpha)
    #[inline]
    pub fn scale(self, k: f32) -> Self {
        Self {
            r: self.r * k,
            g: self.g * k,
            b: self.b * k,
            a: self.a * k,
        }
    }

    /// Same coverage, colour replaced (silhouettes for shadows and glows)
    #[inline]
    pub fn tinted(self, tint: Self) -> Self {
        tint.scale(self.a)
    }
}

/// Where and how to draw a sprite
#[derive(Debug, Clone, Copy)]
pub struct SpriteDraw {
    /// Destination centre in pixels
    pub centre: Vec2,
    /// Destination size in pixels
    pub size: Vec2,
    /// Radians, around `centre`
    pub rotation: f32,
    pub alpha: f32,
    /// Draw the sprite's silhouette in this colour instead of its pixels
    pub tint: Option<Color>,
}

impl SpriteDraw {
    pub fn new(centre: Vec2, size: Vec2) -> Self {
        Self {
            centre,
            size,
            rotation: 0.0,
            alpha: 1.0,
            tint: None,
        }
    }

    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn tint(mut self, tint: Color) -> Self {
        self.tint = Some(tint);
        self
    }
}

/// Premultiplied RGBA raster
#[derive(Debug, Clone)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::TRANSPARENT; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Reallocate for a new size (contents cleared)
    pub fn resize(&mut self, width: usize, height: usize) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![Color::TRANSPARENT; width * height];
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Color::TRANSPARENT);
    }

    /// Source-over at one pixel
    #[inline]
    fn blend_at(&mut self, index: usize, src: Color) {
        let dst = &mut self.pixels[index];
        let k = 1.0 - src.a;
        *dst = Color {
            r: src.r + dst.r * k,
            g: src.g + dst.g * k,
            b: src.b + dst.b * k,
            a: src.a + dst.a * k,
        };
    }

    /// Integer pixel bounds of a float rect, clipped to the canvas
    fn clip(&self, x0: f32, y0: f32, x1: f32, y1: f32) -> Option<(usize, usize, usize, usize)> {
        let x0 = x0.floor().max(0.0);
        let y0 = y0.floor().max(0.0);
        let x1 = x1.ceil().min(self.width as f32);
        let y1 = y1.ceil().min(self.height as f32);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }

    /// Axis-aligned rectangle (edges snapped to whole pixels)
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        let Some((x0, y0, x1, y1)) = self.clip(x.round(), y.round(), (x + w).round(), (y + h).round())
        else {
            return;
        };
        for py in y0..y1 {
            let row = py * self.width;
            for px in x0..x1 {
                self.blend_at(row + px, color);
            }
        }
    }

    /// Rectangle outline of the given line width, centred on the edges
    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, line: f32, color: Color) {
        let half = line * 0.5;
        self.fill_rect(x - half, y - half, w + line, line, color);
        self.fill_rect(x - half, y + h - half, w + line, line, color);
        self.fill_rect(x - half, y + half, line, h - line, color);
        self.fill_rect(x + w - half, y + half, line, h - line, color);
    }

    /// Ellipse with an edge falloff of `feather` pixels (1 = plain AA)
    pub fn fill_ellipse(&mut self, centre: Vec2, radii: Vec2, feather: f32, color: Color) {
        if radii.x <= 0.0 || radii.y <= 0.0 {
            return;
        }
        let feather = feather.max(1.0);
        let reach = radii + Vec2::splat(feather);
        let Some((x0, y0, x1, y1)) = self.clip(
            centre.x - reach.x,
            centre.y - reach.y,
            centre.x + reach.x,
            centre.y + reach.y,
        ) else {
            return;
        };
        let min_r = radii.x.min(radii.y);
        for py in y0..y1 {
            let row = py * self.width;
            for px in x0..x1 {
                let p = (Vec2::new(px as f32 + 0.5, py as f32 + 0.5) - centre) / radii;
                // Approximate signed distance in pixels
                let d = (p.length() - 1.0) * min_r;
                let cover = (0.5 - d / feather).clamp(0.0, 1.0);
                if cover > 0.0 {
                    self.blend_at(row + px, color.scale(cover));
                }
            }
        }
    }

    pub fn fill_circle(&mut self, centre: Vec2, radius: f32, color: Color) {
        self.fill_ellipse(centre, Vec2::splat(radius), 1.0, color);
    }

    /// Round-capped line segment
    pub fn stroke_line(&mut self, a: Vec2, b: Vec2, width: f32, color: Color) {
        let half = width * 0.5;
        let lo = a.min(b) - Vec2::splat(half + 1.0);
        let hi = a.max(b) + Vec2::splat(half + 1.0);
        let Some((x0, y0, x1, y1)) = self.clip(lo.x, lo.y, hi.x, hi.y) else {
            return;
        };
        let ab = b - a;
        let len2 = ab.length_squared();
        for py in y0..y1 {
            let row = py * self.width;
            for px in x0..x1 {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let t = if len2 > 0.0 {
                    ((p - a).dot(ab) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let d = p.distance(a + ab * t) - half;
                let cover = (0.5 - d).clamp(0.0, 1.0);
                if cover > 0.0 {
                    self.blend_at(row + px, color.scale(cover));
                }
            }
        }
    }

    /// Draw a sprite scaled into `draw.size` around `draw.centre`
    pub fn draw_sprite(&mut self, sprite: &Sprite, draw: SpriteDraw) {
        if draw.size.x <= 0.0 || draw.size.y <= 0.0 || draw.alpha <= 0.0 || sprite.is_empty() {
            return;
        }
        let (sin, cos) = draw.rotation.sin_cos();
        let half = draw.size * 0.5;
        // Axis-aligned bounds of the rotated rect
        let ext = Vec2::new(
            half.x * cos.abs() + half.y * sin.abs(),
            half.x * sin.abs() + half.y * cos.abs(),
        );
        let Some((x0, y0, x1, y1)) = self.clip(
            draw.centre.x - ext.x,
            draw.centre.y - ext.y,
            draw.centre.x + ext.x,
            draw.centre.y + ext.y,
        ) else {
            return;
        };

        let sw = sprite.width() as f32;
        let sh = sprite.height() as f32;
        for py in y0..y1 {
            let row = py * self.width;
            for px in x0..x1 {
                let d = Vec2::new(px as f32 + 0.5, py as f32 + 0.5) - draw.centre;
                // Inverse-rotate into the sprite's local frame
                let local = Vec2::new(d.x * cos + d.y * sin, -d.x * sin + d.y * cos);
                let u = (local.x + half.x) / draw.size.x;
                let v = (local.y + half.y) / draw.size.y;
                if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                    continue;
                }
                let texel = sprite.texel((u * sw) as usize, (v * sh) as usize);
                let src = match draw.tint {
                    Some(tint) => texel.tinted(tint),
                    None => texel,
                };
                if src.a > 0.0 {
                    self.blend_at(row + px, src.scale(draw.alpha));
                }
            }
        }
    }

    /// Premultiplied 8-bit RGBA into `out`, ready for texture upload
    pub fn write_rgba8(&self, out: &mut Vec<u8>) {
        encode_rgba8(&self.pixels, out);
    }
}

/// Quantize premultiplied colours to RGBA8, reusing `out`'s allocation
pub fn encode_rgba8(pixels: &[Color], out: &mut Vec<u8>) {
    out.clear();
    out.reserve(pixels.len() * 4);
    let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
    for c in pixels {
        out.extend_from_slice(&[q(c.r), q(c.g), q(c.b), q(c.a)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_source_over_premultiplied() {
        let mut c = Canvas::new(1, 1);
        c.fill_rect(0.0, 0.0, 1.0, 1.0, Color::BLACK);
        c.fill_rect(0.0, 0.0, 1.0, 1.0, Color::rgba(255, 255, 255, 0.5));
        let p = c.pixel(0, 0).unwrap();
        assert!(approx(p.r, 0.5));
        assert!(approx(p.a, 1.0));
    }

    #[test]
    fn test_rect_is_clipped() {
        let mut c = Canvas::new(4, 4);
        c.fill_rect(-10.0, 2.0, 100.0, 1.0, Color::WHITE);
        assert_eq!(c.pixel(0, 2), Some(Color::WHITE));
        assert_eq!(c.pixel(3, 2), Some(Color::WHITE));
        assert_eq!(c.pixel(0, 1), Some(Color::TRANSPARENT));
        // Entirely off-canvas draws are ignored
        c.fill_rect(50.0, 50.0, 5.0, 5.0, Color::BLACK);
    }

    #[test]
    fn test_circle_coverage() {
        let mut c = Canvas::new(20, 20);
        c.fill_circle(Vec2::new(10.0, 10.0), 5.0, Color::WHITE);
        assert!(approx(c.pixel(10, 10).unwrap().a, 1.0));
        assert_eq!(c.pixel(0, 0).unwrap().a, 0.0);
        assert_eq!(c.pixel(17, 10).unwrap().a, 0.0);
    }

    #[test]
    fn test_line_covers_its_path() {
        let mut c = Canvas::new(20, 5);
        c.stroke_line(Vec2::new(2.0, 2.5), Vec2::new(18.0, 2.5), 2.0, Color::WHITE);
        assert!(c.pixel(10, 2).unwrap().a > 0.9);
        assert_eq!(c.pixel(10, 4).unwrap().a, 0.0);
    }

    #[test]
    fn test_rgba8_keeps_coverage() {
        let mut c = Canvas::new(2, 1);
        c.fill_rect(0.0, 0.0, 1.0, 1.0, Color::rgba(255, 0, 0, 0.5));
        let mut bytes = vec![9; 3];
        c.write_rgba8(&mut bytes);
        assert_eq!(bytes.len(), 8);
        // Premultiplied, and untouched pixels stay transparent for the scene pass
        assert_eq!(&bytes[..4], &[128, 0, 0, 128]);
        assert_eq!(&bytes[4..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_sprite_tint_and_rotation() {
        let sprite = Sprite::solid(4, 4, Color::WHITE);
        let mut c = Canvas::new(10, 10);
        let red = Color::rgba(255, 0, 0, 1.0);
        c.draw_sprite(
            &sprite,
            SpriteDraw::new(Vec2::new(5.5, 5.5), Vec2::new(4.0, 4.0))
                .rotation(std::f32::consts::FRAC_PI_4)
                .tint(red),
        );
        let centre = c.pixel(5, 5).unwrap();
        assert!(approx(centre.r, 1.0) && approx(centre.g, 0.0));
        // Rotated square reaches further along the axes than the unrotated one
        assert!(c.pixel(7, 5).unwrap().a > 0.0);
        assert_eq!(c.pixel(7, 7).unwrap().a, 0.0);
    }
}
