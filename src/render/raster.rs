//! # Raster Backend
//!
//! Composites a label onto an 8-bit grayscale bitmap whose size is exactly
//! the canvas in pixels.
//!
//! ## Drawing Order
//!
//! 1. White background
//! 2. Per row: field name (bold, left aligned)
//! 3. Per row: symbol resized into its zone, then its value caption when the
//!    layout asks for one
//! 4. Per row without a symbol: placeholder or fallback text
//!
//! A symbol that cannot be read back from the store turns its row into a
//! fallback row instead of failing the label.
//!
//! Symbols are resized with nearest-neighbour sampling so bar edges stay
//! hard at any scale.

use image::imageops::{self, FilterType};
use image::{GrayImage, ImageEncoder, Luma};

use super::{Degradation, Planned, RenderError, RowPlan, note_overflow};
use crate::font::{TextMeasure, Typeface, bitmap, fit_text};
use crate::layout::{self, Align, FrameGeometry, PLACEHOLDER, Rect, TextSize, TextZone};

/// Faces for one render.
pub struct Faces {
    pub regular: Typeface,
    pub bold: Typeface,
}

impl Faces {
    fn pick(&self, bold: bool) -> &Typeface {
        if bold { &self.bold } else { &self.regular }
    }
}

/// Pixel bounds `[x0, x1) × [y0, y1)` of a device rectangle.
fn pixel_bounds(rect: &Rect) -> (i64, i64, i64, i64) {
    (
        rect.x.round() as i64,
        rect.y.round() as i64,
        rect.right().round() as i64,
        rect.bottom().round() as i64,
    )
}

pub(crate) fn draw(
    geometry: &FrameGeometry,
    plan: &mut [RowPlan<'_>],
    faces: &Faces,
    degradations: &mut Vec<Degradation>,
) -> Result<GrayImage, RenderError> {
    let width = geometry.canvas.width.round().max(1.0) as u32;
    let height = geometry.canvas.height.round().max(1.0) as u32;
    let mut img = GrayImage::from_pixel(width, height, Luma([255]));

    for row in plan.iter_mut() {
        let index = row.geometry.index;

        if let Some(zone) = &row.geometry.name {
            let overflow = draw_text(&mut img, faces.pick(zone.bold), zone, &row.field.name);
            note_overflow(degradations, index, &row.field.name, overflow);
        }

        if let Planned::Symbol(artifact) = &mut row.content {
            let drawn = match artifact.load() {
                Ok(symbol) => {
                    let placement = layout::place_symbol(
                        row.geometry.symbol,
                        (symbol.width() as f32, symbol.height() as f32),
                        geometry.fit,
                    );
                    blit(&mut img, &symbol, &placement.dest, &placement.clip);
                    Ok(())
                }
                Err(e) => Err(e.to_string()),
            };

            match drawn {
                Ok(()) => {
                    if let Some(zone) = &row.geometry.caption {
                        let caption = geometry.caption_format.apply(artifact.source());
                        let overflow = draw_text(&mut img, faces.pick(zone.bold), zone, &caption);
                        note_overflow(degradations, index, &caption, overflow);
                    }
                    if let Err(e) = artifact.release() {
                        log::warn!("{}", e);
                    }
                }
                Err(reason) => row.demote(reason, degradations),
            }
        }

        let zone = &row.geometry.placeholder;
        let message = match &row.content {
            Planned::Symbol(_) => None,
            Planned::Placeholder => Some(PLACEHOLDER),
            Planned::Fallback(fallback) => Some(fallback.as_str()),
        };
        if let Some(message) = message {
            let overflow = draw_text(&mut img, faces.pick(zone.bold), zone, message);
            note_overflow(degradations, index, message, overflow);
        }
    }

    log::debug!("raster label {}x{} composed", width, height);
    Ok(img)
}

/// Resize `symbol` to `dest` and copy the part inside `clip`.
fn blit(img: &mut GrayImage, symbol: &GrayImage, dest: &Rect, clip: &Rect) {
    let (dx0, dy0, dx1, dy1) = pixel_bounds(dest);
    let (dw, dh) = ((dx1 - dx0).max(0) as u32, (dy1 - dy0).max(0) as u32);
    if dw == 0 || dh == 0 {
        return;
    }
    let resized = if symbol.dimensions() == (dw, dh) {
        symbol.clone()
    } else {
        imageops::resize(symbol, dw, dh, FilterType::Nearest)
    };

    let (cx0, cy0, cx1, cy1) = pixel_bounds(clip);
    let x_range = cx0.max(dx0).max(0)..cx1.min(dx1).min(img.width() as i64);
    let y_range = cy0.max(dy0).max(0)..cy1.min(dy1).min(img.height() as i64);

    for y in y_range {
        for x in x_range.clone() {
            let px = resized.get_pixel((x - dx0) as u32, (y - dy0) as u32);
            img.put_pixel(x as u32, y as u32, *px);
        }
    }
}

/// Draw `content` in `zone`. Returns the size used when it overflows.
fn draw_text(img: &mut GrayImage, face: &Typeface, zone: &TextZone, content: &str) -> Option<f32> {
    let rect = &zone.rect;
    let (size, overflow) = match zone.size {
        TextSize::Fixed(size) => {
            let (w, h) = face.measure(content, size);
            (size, w > rect.width || h > rect.height)
        }
        TextSize::Fit { max, .. } if face.is_builtin() => {
            // No outline font: one default size, no search.
            let size = bitmap::NATIVE_SIZE.min(max.max(1.0));
            let (w, h) = face.measure(content, size);
            (size, w > rect.width || h > rect.height)
        }
        TextSize::Fit { min, max } => {
            let fit = fit_text(face, content, (rect.width, rect.height), (min, max), 1.0);
            (fit.size, fit.overflow)
        }
    };

    let (w, h) = face.measure(content, size);
    let x = match zone.align {
        Align::Left => rect.x,
        Align::Center => rect.x + (rect.width - w) / 2.0,
    };
    let y = rect.y + ((rect.height - h) / 2.0).max(0.0);
    face.draw(img, content, size, x, y);

    overflow.then_some(size)
}

/// PNG bytes of a finished label.
pub fn encode_png(img: &GrayImage) -> Result<Vec<u8>, RenderError> {
    let mut png = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::L8,
        )
        .map_err(|e| RenderError::Image(e.to_string()))?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Extent, LayoutMode};
    use crate::record::Field;
    use crate::render::fallback_text;
    use crate::symbol::{ArtifactStore, SymbolStyle, encode};

    #[test]
    fn test_blit_stretch_fills_dest() {
        let mut img = GrayImage::from_pixel(50, 20, Luma([255]));
        let symbol = GrayImage::from_pixel(4, 2, Luma([0]));
        let dest = Rect::new(10.0, 5.0, 20.0, 10.0);
        blit(&mut img, &symbol, &dest, &dest);
        assert_eq!(img.get_pixel(10, 5)[0], 0);
        assert_eq!(img.get_pixel(29, 14)[0], 0);
        assert_eq!(img.get_pixel(30, 14)[0], 255);
        assert_eq!(img.get_pixel(9, 5)[0], 255);
    }

    #[test]
    fn test_blit_respects_clip() {
        let mut img = GrayImage::from_pixel(50, 20, Luma([255]));
        let symbol = GrayImage::from_pixel(40, 10, Luma([0]));
        let dest = Rect::new(-10.0, 0.0, 70.0, 10.0);
        let clip = Rect::new(5.0, 0.0, 20.0, 10.0);
        blit(&mut img, &symbol, &dest, &clip);
        assert_eq!(img.get_pixel(4, 0)[0], 255);
        assert_eq!(img.get_pixel(5, 0)[0], 0);
        assert_eq!(img.get_pixel(24, 9)[0], 0);
        assert_eq!(img.get_pixel(25, 0)[0], 255);
    }

    #[test]
    fn test_fixed_text_overflow_reported() {
        let mut img = GrayImage::from_pixel(40, 20, Luma([255]));
        let zone = TextZone {
            rect: Rect::new(0.0, 0.0, 20.0, 10.0),
            size: TextSize::Fixed(24.0),
            align: Align::Left,
            bold: false,
        };
        assert_eq!(draw_text(&mut img, &Typeface::Builtin, &zone, "long"), Some(24.0));
    }

    #[test]
    fn test_builtin_skips_search() {
        let mut img = GrayImage::from_pixel(400, 100, Luma([255]));
        let zone = TextZone {
            rect: Rect::new(0.0, 0.0, 400.0, 100.0),
            size: TextSize::Fit { min: 8.0, max: 100.0 },
            align: Align::Center,
            bold: false,
        };
        assert_eq!(draw_text(&mut img, &Typeface::Builtin, &zone, "50"), None);
        // Drawn at 24 px, centered vertically: nothing in the top rows.
        assert!((0..30).all(|y| (0..400).all(|x| img.get_pixel(x, y)[0] == 255)));
    }

    #[test]
    fn test_png_signature() {
        let img = GrayImage::from_pixel(8, 8, Luma([255]));
        let png = encode_png(&img).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_unreadable_symbol_becomes_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::in_dir(dir.path());
        let geometry =
            layout::compute(&Extent::new(800.0, 600.0, 10.0), 1, &LayoutMode::default()).unwrap();
        let field = Field::new("SAP-Nr", "A012345");

        let symbol = encode("A012345", 40, &SymbolStyle::default()).unwrap();
        let artifact = store.stash(symbol).unwrap();
        std::fs::remove_file(artifact.path().unwrap()).unwrap();

        let mut plan = vec![RowPlan {
            geometry: &geometry.rows[0],
            field: &field,
            content: Planned::Symbol(artifact),
        }];
        let faces = Faces {
            regular: Typeface::Builtin,
            bold: Typeface::Builtin,
        };
        let mut degradations = Vec::new();
        let img = draw(&geometry, &mut plan, &faces, &mut degradations).unwrap();

        assert_eq!(img.dimensions(), (800, 600));
        assert!(matches!(
            &plan[0].content,
            Planned::Fallback(text) if *text == fallback_text("A012345")
        ));
        assert!(matches!(
            degradations.as_slice(),
            [Degradation::EncodeFailed { row: 0, .. }]
        ));
        assert_eq!(store.live(), 0);
    }
}
