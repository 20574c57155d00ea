//! Built-in bitmap font.
//!
//! Spleen 12×24 is compiled into the binary, so it is always available when
//! no outline font can be loaded. Glyphs are scaled with nearest neighbour.

use spleen_font::{FONT_12X24, PSF2Font};

pub const CELL_WIDTH: usize = 12;
pub const CELL_HEIGHT: usize = 24;

/// Native cell height; the size used when no outline font is available.
pub const NATIVE_SIZE: f32 = CELL_HEIGHT as f32;

/// A 12×24 glyph, one byte per pixel (1 = ink).
pub fn glyph(ch: char) -> Vec<u8> {
    let mut cell = vec![0u8; CELL_WIDTH * CELL_HEIGHT];

    let Ok(mut spleen) = PSF2Font::new(FONT_12X24) else {
        draw_box(&mut cell);
        return cell;
    };
    let utf8 = ch.to_string();

    match spleen.glyph_for_utf8(utf8.as_bytes()) {
        Some(rows) => {
            for (row_y, row) in rows.enumerate() {
                for (col_x, on) in row.enumerate() {
                    let idx = row_y * CELL_WIDTH + col_x;
                    if col_x < CELL_WIDTH && idx < cell.len() {
                        cell[idx] = on as u8;
                    }
                }
            }
        }
        None => draw_box(&mut cell),
    }

    cell
}

/// Outline box for characters the font does not cover.
fn draw_box(cell: &mut [u8]) {
    for x in 1..CELL_WIDTH - 1 {
        cell[2 * CELL_WIDTH + x] = 1;
        cell[(CELL_HEIGHT - 3) * CELL_WIDTH + x] = 1;
    }
    for y in 2..CELL_HEIGHT - 2 {
        cell[y * CELL_WIDTH + 1] = 1;
        cell[y * CELL_WIDTH + CELL_WIDTH - 2] = 1;
    }
}

/// Advance and line height at `size`.
pub fn measure(text: &str, size: f32) -> (f32, f32) {
    let scale = size / NATIVE_SIZE;
    let chars = text.chars().count() as f32;
    (chars * CELL_WIDTH as f32 * scale, size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_glyph_has_ink() {
        let cell = glyph('A');
        assert_eq!(cell.len(), CELL_WIDTH * CELL_HEIGHT);
        assert!(cell.iter().any(|&p| p == 1));
    }

    #[test]
    fn test_space_is_blank() {
        assert!(glyph(' ').iter().all(|&p| p == 0));
    }

    #[test]
    fn test_measure_scales_linearly() {
        assert_eq!(measure("ABC", 24.0), (36.0, 24.0));
        assert_eq!(measure("ABC", 48.0), (72.0, 48.0));
    }
}
