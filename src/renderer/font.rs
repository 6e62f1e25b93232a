//! Tiny 5x7 bitmap font for floating score labels

use glam::Vec2;

use super::canvas::{Canvas, Color};

const GLYPH_W: usize = 5;
const GLYPH_H: usize = 7;
/// Advance per glyph in cells (one cell of spacing)
const ADVANCE: usize = GLYPH_W + 1;

/// Rows top to bottom, bit 4 is the leftmost column
fn glyph(ch: char) -> Option<[u8; GLYPH_H]> {
    let rows = match ch {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '+' => [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00],
        'x' => [0x00, 0x00, 0x11, 0x0A, 0x04, 0x0A, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        ' ' => [0; GLYPH_H],
        _ => return None,
    };
    Some(rows)
}

/// Pixel size of `text` at the given cell size
pub fn measure(text: &str, cell: f32) -> Vec2 {
    let n = text.chars().count();
    if n == 0 {
        return Vec2::ZERO;
    }
    Vec2::new((n * ADVANCE - 1) as f32 * cell, GLYPH_H as f32 * cell)
}

/// Draw `text` centred on `centre`. Unknown characters leave a gap.
pub fn draw_text(canvas: &mut Canvas, text: &str, centre: Vec2, cell: f32, color: Color) {
    let size = measure(text, cell);
    let origin = centre - size * 0.5;
    for (i, ch) in text.chars().enumerate() {
        let Some(rows) = glyph(ch) else {
            continue;
        };
        let gx = origin.x + (i * ADVANCE) as f32 * cell;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (0x10 >> col) != 0 {
                    canvas.fill_rect(
                        gx + col as f32 * cell,
                        origin.y + row as f32 * cell,
                        cell,
                        cell,
                        color,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_renderable() {
        for text in ["+30", "+1234567890", "x2 BOOST!"] {
            assert!(text.chars().all(|c| glyph(c).is_some()), "{text}");
        }
    }

    #[test]
    fn test_measure() {
        assert_eq!(measure("", 2.0), Vec2::ZERO);
        assert_eq!(measure("+30", 2.0), Vec2::new(34.0, 14.0));
    }

    #[test]
    fn test_draws_plus_sign() {
        let mut c = Canvas::new(5, 7);
        draw_text(&mut c, "+", Vec2::new(2.5, 3.5), 1.0, Color::WHITE);
        // Centre of the plus is lit, corners are not
        assert_eq!(c.pixel(2, 3), Some(Color::WHITE));
        assert_eq!(c.pixel(0, 0), Some(Color::TRANSPARENT));
    }
}
