//! # Fonts
//!
//! Text on a label is measured and drawn through a [`Typeface`]. Where the
//! outline fonts come from is decided by an injected [`FontSource`]; the
//! engine itself knows no font paths.
//!
//! ```text
//! FontSource::load(style) ──ok──► Typeface::Outline (ab_glyph)
//!          │
//!          └──err──► Typeface::Builtin (Spleen 12×24) + FontLoadFailed
//! ```
//!
//! [`Bundled`] always succeeds: it serves a DejaVu Sans Bold compiled into
//! the binary. The vector backend uses the PDF standard fonts instead, see
//! [`standard`].

pub mod bitmap;
pub mod fit;
pub mod standard;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ab_glyph::{Font, FontArc, ScaleFont};
use image::{GrayImage, Luma};
use thiserror::Error;

pub use fit::{Fit, fit_text};
pub use standard::StandardFont;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("font file {path} cannot be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("font file {0} is not a usable TrueType/OpenType font")]
    Invalid(PathBuf),

    #[error("no font available for {0:?}")]
    Unavailable(FontStyle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
}

/// Supplies outline fonts to the raster backend.
pub trait FontSource: Send + Sync {
    fn load(&self, style: FontStyle) -> Result<FontArc, FontError>;
}

fn load_file(path: &Path) -> Result<FontArc, FontError> {
    let data = std::fs::read(path).map_err(|source| FontError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    FontArc::try_from_vec(data).map_err(|_| FontError::Invalid(path.to_path_buf()))
}

/// Fonts at explicit paths. Bold falls back to the regular file.
#[derive(Debug, Clone)]
pub struct FontFiles {
    pub regular: PathBuf,
    pub bold: Option<PathBuf>,
}

impl FontFiles {
    pub fn new(regular: impl Into<PathBuf>) -> Self {
        Self {
            regular: regular.into(),
            bold: None,
        }
    }

    pub fn with_bold(mut self, bold: impl Into<PathBuf>) -> Self {
        self.bold = Some(bold.into());
        self
    }
}

impl FontSource for FontFiles {
    fn load(&self, style: FontStyle) -> Result<FontArc, FontError> {
        match (style, &self.bold) {
            (FontStyle::Bold, Some(bold)) => load_file(bold).or_else(|e| {
                log::debug!("{}; using regular face for bold", e);
                load_file(&self.regular)
            }),
            _ => load_file(&self.regular),
        }
    }
}

/// First loadable font from a list of well-known locations.
#[derive(Debug, Clone)]
pub struct SystemFonts {
    regular: Vec<PathBuf>,
    bold: Vec<PathBuf>,
}

impl Default for SystemFonts {
    fn default() -> Self {
        let dirs = [
            "/usr/share/fonts/truetype/dejavu",
            "/usr/share/fonts/dejavu",
            "/usr/share/fonts/TTF",
        ];
        let paths = |file: &str| dirs.iter().map(|d| Path::new(d).join(file)).collect();
        Self {
            regular: paths("DejaVuSans.ttf"),
            bold: paths("DejaVuSans-Bold.ttf"),
        }
    }
}

impl FontSource for SystemFonts {
    fn load(&self, style: FontStyle) -> Result<FontArc, FontError> {
        let candidates = match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
        };
        candidates
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| load_file(p).ok())
            .ok_or(FontError::Unavailable(style))
    }
}

const BUNDLED_BOLD: &[u8] = include_bytes!("fonts/DejaVuSans-Bold.ttf");

static BUNDLED: OnceLock<Option<FontArc>> = OnceLock::new();

/// DejaVu Sans Bold compiled into the binary, served for both styles.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bundled;

impl FontSource for Bundled {
    fn load(&self, _style: FontStyle) -> Result<FontArc, FontError> {
        BUNDLED
            .get_or_init(|| FontArc::try_from_slice(BUNDLED_BOLD).ok())
            .clone()
            .ok_or_else(|| FontError::Invalid(PathBuf::from("fonts/DejaVuSans-Bold.ttf")))
    }
}

/// Never yields an outline font; text always uses the built-in bitmap.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinOnly;

impl FontSource for BuiltinOnly {
    fn load(&self, style: FontStyle) -> Result<FontArc, FontError> {
        Err(FontError::Unavailable(style))
    }
}

/// Something that can report the box a string occupies at a size.
pub trait TextMeasure {
    /// `(width, height)` of `text` at `size`, non-decreasing in `size`.
    fn measure(&self, text: &str, size: f32) -> (f32, f32);
}

impl TextMeasure for StandardFont {
    fn measure(&self, text: &str, size: f32) -> (f32, f32) {
        StandardFont::measure(self, text, size)
    }
}

/// A face the raster backend can draw with.
#[derive(Clone)]
pub enum Typeface {
    Outline(FontArc),
    Builtin,
}

impl std::fmt::Debug for Typeface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outline(_) => f.write_str("Typeface::Outline"),
            Self::Builtin => f.write_str("Typeface::Builtin"),
        }
    }
}

impl Typeface {
    /// Load `style` from `source`, falling back to the built-in face.
    pub fn resolve(source: &dyn FontSource, style: FontStyle) -> (Self, Option<FontError>) {
        match source.load(style) {
            Ok(font) => (Self::Outline(font), None),
            Err(e) => (Self::Builtin, Some(e)),
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }

    /// Draw `text` with the top-left of its line box at `(x, y)`.
    ///
    /// Ink is multiplied into the existing pixels; anything past the image
    /// edge is dropped.
    pub fn draw(&self, img: &mut GrayImage, text: &str, size: f32, x: f32, y: f32) {
        match self {
            Self::Outline(font) => draw_outline(font, img, text, size, x, y),
            Self::Builtin => draw_bitmap(img, text, size, x, y),
        }
    }
}

impl TextMeasure for Typeface {
    fn measure(&self, text: &str, size: f32) -> (f32, f32) {
        match self {
            Self::Outline(font) => {
                let scaled = font.as_scaled(size);
                let mut width = 0.0f32;
                let mut prev = None;
                for ch in text.chars() {
                    let id = font.glyph_id(ch);
                    if let Some(prev) = prev {
                        width += scaled.kern(prev, id);
                    }
                    width += scaled.h_advance(id);
                    prev = Some(id);
                }
                (width, scaled.ascent() - scaled.descent())
            }
            Self::Builtin => bitmap::measure(text, size),
        }
    }
}

fn darken(img: &mut GrayImage, x: i32, y: i32, coverage: f32) {
    if x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 {
        return;
    }
    let px = img.get_pixel_mut(x as u32, y as u32);
    let ink = coverage.clamp(0.0, 1.0);
    *px = Luma([(px[0] as f32 * (1.0 - ink)).round() as u8]);
}

fn draw_outline(font: &FontArc, img: &mut GrayImage, text: &str, size: f32, x: f32, y: f32) {
    let scaled = font.as_scaled(size);
    let baseline = y + scaled.ascent();
    let mut caret = x;
    let mut prev = None;

    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = prev {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(size, ab_glyph::point(caret, baseline));
        caret += scaled.h_advance(id);
        prev = Some(id);

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                darken(
                    img,
                    px as i32 + bounds.min.x as i32,
                    py as i32 + bounds.min.y as i32,
                    coverage,
                );
            });
        }
    }
}

fn draw_bitmap(img: &mut GrayImage, text: &str, size: f32, x: f32, y: f32) {
    let scale = size / bitmap::NATIVE_SIZE;
    let cell_w = (bitmap::CELL_WIDTH as f32 * scale).round().max(1.0) as usize;
    let cell_h = (bitmap::CELL_HEIGHT as f32 * scale).round().max(1.0) as usize;

    for (i, ch) in text.chars().enumerate() {
        let glyph = bitmap::glyph(ch);
        let origin_x = x.round() as i32 + (i * cell_w) as i32;
        for dy in 0..cell_h {
            for dx in 0..cell_w {
                let sx = dx * bitmap::CELL_WIDTH / cell_w;
                let sy = dy * bitmap::CELL_HEIGHT / cell_h;
                if glyph[sy * bitmap::CELL_WIDTH + sx] == 1 {
                    darken(img, origin_x + dx as i32, y.round() as i32 + dy as i32, 1.0);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_falls_back() {
        let source = FontFiles::new("/nonexistent/font.ttf");
        let (face, err) = Typeface::resolve(&source, FontStyle::Regular);
        assert!(face.is_builtin());
        assert!(matches!(err, Some(FontError::Io { .. })));
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        let err = FontFiles::new(&path).load(FontStyle::Regular).unwrap_err();
        assert!(matches!(err, FontError::Invalid(_)));
    }

    #[test]
    fn test_missing_bold_uses_regular() {
        let dir = tempfile::tempdir().unwrap();
        let regular = dir.path().join("regular.ttf");
        std::fs::write(&regular, BUNDLED_BOLD).unwrap();
        let source = FontFiles::new(&regular).with_bold(dir.path().join("missing.ttf"));
        assert!(source.load(FontStyle::Bold).is_ok());
    }

    #[test]
    fn test_builtin_only() {
        let (face, err) = Typeface::resolve(&BuiltinOnly, FontStyle::Bold);
        assert!(face.is_builtin());
        assert!(matches!(err, Some(FontError::Unavailable(FontStyle::Bold))));
    }

    #[test]
    fn test_builtin_draws_ink() {
        let mut img = GrayImage::from_pixel(100, 40, Luma([255]));
        Typeface::Builtin.draw(&mut img, "Lot", 24.0, 2.0, 2.0);
        assert!(img.pixels().any(|p| p[0] == 0));
    }

    #[test]
    fn test_draw_clips_at_edges() {
        let mut img = GrayImage::from_pixel(10, 10, Luma([255]));
        Typeface::Builtin.draw(&mut img, "WWWW", 48.0, -5.0, -5.0);
        assert_eq!(img.dimensions(), (10, 10));
    }

    fn bundled() -> Typeface {
        let (face, err) = Typeface::resolve(&Bundled, FontStyle::Bold);
        assert!(err.is_none());
        face
    }

    #[test]
    fn test_bundled_is_outline() {
        assert!(!bundled().is_builtin());
        let (regular, err) = Typeface::resolve(&Bundled, FontStyle::Regular);
        assert!(!regular.is_builtin() && err.is_none());
    }

    #[test]
    fn test_outline_measure_non_decreasing() {
        let face = bundled();
        for text in ["A012345", "AVAWAY", "Lot Nr", "[No Barcode: x]", "."] {
            let mut prev = (0.0f32, 0.0f32);
            for step in 1..=400 {
                let size = step as f32 * 0.5;
                let (w, h) = face.measure(text, size);
                assert!(w >= prev.0 && h >= prev.1, "{:?} shrinks at {}", text, size);
                prev = (w, h);
            }
        }
    }

    #[test]
    fn test_outline_line_height_is_size() {
        let (_, h) = bundled().measure("Cantitate", 40.0);
        assert!((h - 40.0).abs() < 0.01);
    }

    #[test]
    fn test_outline_draws_ink() {
        let face = bundled();
        let mut img = GrayImage::from_pixel(200, 60, Luma([255]));
        face.draw(&mut img, "REEL-042", 32.0, 4.0, 4.0);
        assert!(img.pixels().any(|p| p[0] < 128));
        // Far right of the measured advance stays blank.
        let (w, _) = face.measure("REEL-042", 32.0);
        let right = (4.0 + w).ceil() as u32 + 16;
        assert!((right..200).all(|x| (0..60).all(|y| img.get_pixel(x, y)[0] == 255)));
    }
}
