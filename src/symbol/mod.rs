//! # Code128 Symbols
//!
//! Turns a field value into a barcode bitmap. The bitmap has bars only; the
//! human-readable caption is always drawn by the renderer, never by the
//! symbol.
//!
//! ## Geometry
//!
//! ```text
//! ├ quiet ┤├──────── modules × module_width ────────┤├ quiet ┤
//!          ▌▌ ▌▐ ▌▌▐▐ ▌ ▌▌▐ ▌▐▐ ▌▌ ▌▐ ▌▌▐▐ ▌ ▌▌▐ ▌▐
//! ```
//!
//! Values are encoded with character set B, which covers printable ASCII.
//! Anything longer than [`MAX_SYMBOL_CHARS`] is cut to the first 25
//! characters.
//!
//! ## Example
//!
//! ```
//! use eticheta::symbol::{encode, SymbolStyle};
//!
//! let symbol = encode("REEL-042", 120, &SymbolStyle::default()).unwrap();
//! assert_eq!(symbol.source(), "REEL-042");
//! assert_eq!(symbol.height(), 120);
//! ```

pub mod store;

pub use store::{Artifact, ArtifactStore, StoreError};

use barcoders::sym::code128::Code128;
use image::{GrayImage, Luma};
use thiserror::Error;

/// Longest value a label symbol carries.
pub const MAX_SYMBOL_CHARS: usize = 25;

/// Character set B selector understood by barcoders.
const CHARSET_B: char = '\u{0181}';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("nothing to encode")]
    Empty,

    #[error("character {ch:?} in {value:?} is outside Code128 set B")]
    UnsupportedChar { value: String, ch: char },

    #[error("Code128 encoding of {value:?} failed: {reason}")]
    Symbology { value: String, reason: String },
}

/// Bar sizing in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolStyle {
    /// Pixels per module.
    pub module_width: u32,
    /// Quiet zone on each side, in modules.
    pub quiet_zone: u32,
}

impl Default for SymbolStyle {
    fn default() -> Self {
        Self {
            module_width: 2,
            quiet_zone: 10,
        }
    }
}

impl SymbolStyle {
    /// Default module width in millimetres.
    pub const MODULE_MM: f32 = 0.4;
    /// Quiet zone in millimetres.
    pub const QUIET_ZONE_MM: f32 = 2.0;

    /// `module_mm` modules and a 2 mm quiet zone at the given resolution.
    pub fn for_resolution(dots_per_mm: f32, module_mm: f32) -> Self {
        let module_width = (module_mm * dots_per_mm).round().max(1.0) as u32;
        let actual_mm = module_width as f32 / dots_per_mm;
        Self {
            module_width,
            quiet_zone: (Self::QUIET_ZONE_MM / actual_mm).ceil() as u32,
        }
    }
}

/// A rendered barcode.
#[derive(Debug, Clone)]
pub struct SymbolImage {
    source: String,
    modules: Vec<bool>,
    image: GrayImage,
}

impl SymbolImage {
    /// The text actually encoded, after truncation.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Module pattern, `true` for a bar.
    pub fn modules(&self) -> &[bool] {
        &self.modules
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub(crate) fn into_parts(self) -> (String, GrayImage) {
        (self.source, self.image)
    }
}

/// First [`MAX_SYMBOL_CHARS`] characters of `value`.
pub fn truncate(value: &str) -> &str {
    match value.char_indices().nth(MAX_SYMBOL_CHARS) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

/// Encode `value` as a Code128 bitmap `height` pixels tall.
pub fn encode(value: &str, height: u32, style: &SymbolStyle) -> Result<SymbolImage, EncodeError> {
    let source = truncate(value);
    if source.is_empty() {
        return Err(EncodeError::Empty);
    }
    if let Some(ch) = source.chars().find(|c| !(' '..='~').contains(c)) {
        return Err(EncodeError::UnsupportedChar {
            value: source.to_string(),
            ch,
        });
    }

    let barcode = Code128::new(format!("{}{}", CHARSET_B, source)).map_err(|e| {
        EncodeError::Symbology {
            value: source.to_string(),
            reason: e.to_string(),
        }
    })?;
    let modules: Vec<bool> = barcode.encode().into_iter().map(|m| m == 1).collect();

    let module_width = style.module_width.max(1);
    let quiet = style.quiet_zone * module_width;
    let width = modules.len() as u32 * module_width + 2 * quiet;
    let height = height.max(1);

    let mut image = GrayImage::from_pixel(width, height, Luma([255]));
    for (i, _) in modules.iter().enumerate().filter(|(_, bar)| **bar) {
        let x0 = quiet + i as u32 * module_width;
        for x in x0..x0 + module_width {
            for y in 0..height {
                image.put_pixel(x, y, Luma([0]));
            }
        }
    }

    log::debug!(
        "encoded {:?}: {} modules, {}x{} px",
        source,
        modules.len(),
        width,
        height
    );

    Ok(SymbolImage {
        source: source.to_string(),
        modules,
        image,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_equals_short_value() {
        let symbol = encode("A012345", 40, &SymbolStyle::default()).unwrap();
        assert_eq!(symbol.source(), "A012345");
        assert!(symbol.modules().iter().any(|&m| m));
    }

    #[test]
    fn test_thirty_chars_truncated_to_twenty_five() {
        let long = "ABCDEFGHIJKLMNOPQRSTUVWXYZ1234";
        assert_eq!(long.len(), 30);
        let style = SymbolStyle::default();
        let symbol = encode(long, 40, &style).unwrap();
        assert_eq!(symbol.source(), &long[..25]);

        let prefix = encode(&long[..25], 40, &style).unwrap();
        assert_eq!(symbol.modules(), prefix.modules());
    }

    #[test]
    fn test_exactly_twenty_five_untouched() {
        let value = "X".repeat(25);
        assert_eq!(truncate(&value), value);
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let value = "é".repeat(30);
        assert_eq!(truncate(&value).chars().count(), 25);
    }

    #[test]
    fn test_unsupported_char_fails() {
        let err = encode("LOT-€", 40, &SymbolStyle::default()).unwrap_err();
        assert!(matches!(err, EncodeError::UnsupportedChar { ch: '€', .. }));
    }

    #[test]
    fn test_empty_fails() {
        assert_eq!(
            encode("", 40, &SymbolStyle::default()).unwrap_err(),
            EncodeError::Empty
        );
    }

    #[test]
    fn test_image_has_bars_only() {
        let style = SymbolStyle {
            module_width: 3,
            quiet_zone: 4,
        };
        let symbol = encode("50", 30, &style).unwrap();
        let img = symbol.image();
        assert_eq!(img.height(), 30);
        assert_eq!(
            img.width(),
            symbol.modules().len() as u32 * 3 + 2 * 4 * 3
        );
        // Every column is a solid bar or a solid space: no caption text.
        for x in 0..img.width() {
            let top = img.get_pixel(x, 0)[0];
            assert!((0..img.height()).all(|y| img.get_pixel(x, y)[0] == top));
        }
        // Quiet zones are white.
        assert!((0..12).all(|x| img.get_pixel(x, 0)[0] == 255));
    }

    #[test]
    fn test_style_for_resolution() {
        // 254 DPI = 10 dots/mm: 4 px modules, 2 mm = 5 modules
        let style = SymbolStyle::for_resolution(10.0, SymbolStyle::MODULE_MM);
        assert_eq!(style.module_width, 4);
        assert_eq!(style.quiet_zone, 5);

        // 300 DPI, 0.5 mm modules: 6 px, 2 mm ≈ 3.9 modules → 4
        let style = SymbolStyle::for_resolution(300.0 / 25.4, 0.5);
        assert_eq!(style.module_width, 6);
        assert_eq!(style.quiet_zone, 4);
    }
}
