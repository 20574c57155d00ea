//! # Canvas Specification
//!
//! The physical size of a label and the resolution used to turn it into
//! device units.
//!
//! ## Device Units
//!
//! | Backend | Device unit | Conversion |
//! |---------|-------------|------------|
//! | Raster  | pixel       | `mm / 25.4 × dpi` |
//! | Vector  | PDF point   | `mm / 25.4 × 72` |
//!
//! A canvas can be stated in millimetres, points, or dots. Dots are device
//! pixels at the canvas DPI, so an 800 × 600 dot canvas always rasterizes to
//! exactly 800 × 600 pixels:
//!
//! ```text
//! 800 dots @ 254 DPI = 80 mm = 226.77 pt
//! ```
//!
//! ## Presets
//!
//! | Preset | Size | DPI | Layout | Backend |
//! |--------|------|-----|--------|---------|
//! | `reel` | 80 × 60 mm | 254 | three rows, stretched symbols | raster |
//! | `reel-pdf` | 115 × 80 mm | 300 | three rows, 16 mm symbols | vector |
//! | `single` | 90 × 50 mm | 300 | single frame | raster |

use serde::Serialize;
use thiserror::Error;

use crate::layout::{Extent, LayoutMode, RowLayout, SingleFrameLayout, SymbolFit};

/// Millimetres per inch.
pub const MM_PER_INCH: f32 = 25.4;

/// PDF points per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

#[derive(Debug, Error, PartialEq)]
pub enum CanvasError {
    #[error("canvas dimension must be positive and finite, got {0}")]
    InvalidDimension(f32),

    #[error("resolution must be positive and finite, got {0} DPI")]
    InvalidResolution(f32),
}

/// Unit of the canvas width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Millimeters,
    Points,
    /// Device pixels at the canvas DPI.
    Dots,
}

/// Physical label size plus target resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CanvasSpec {
    width: f32,
    height: f32,
    unit: Unit,
    dpi: f32,
}

impl CanvasSpec {
    pub fn new(width: f32, height: f32, unit: Unit, dpi: f32) -> Result<Self, CanvasError> {
        for dim in [width, height] {
            if !(dim.is_finite() && dim > 0.0) {
                return Err(CanvasError::InvalidDimension(dim));
            }
        }
        if !(dpi.is_finite() && dpi > 0.0) {
            return Err(CanvasError::InvalidResolution(dpi));
        }
        Ok(Self {
            width,
            height,
            unit,
            dpi,
        })
    }

    /// Canvas in millimetres.
    pub fn mm(width: f32, height: f32, dpi: f32) -> Result<Self, CanvasError> {
        Self::new(width, height, Unit::Millimeters, dpi)
    }

    /// Canvas in device dots.
    pub fn dots(width: u32, height: u32, dpi: f32) -> Result<Self, CanvasError> {
        Self::new(width as f32, height as f32, Unit::Dots, dpi)
    }

    /// Dots per millimetre at the canvas resolution.
    #[inline]
    pub fn dots_per_mm(&self) -> f32 {
        self.dpi / MM_PER_INCH
    }

    fn to_mm(&self, value: f32) -> f32 {
        match self.unit {
            Unit::Millimeters => value,
            Unit::Points => value * MM_PER_INCH / POINTS_PER_INCH,
            Unit::Dots => value * MM_PER_INCH / self.dpi,
        }
    }

    fn to_points(&self, value: f32) -> f32 {
        match self.unit {
            Unit::Points => value,
            Unit::Millimeters => value * POINTS_PER_INCH / MM_PER_INCH,
            Unit::Dots => value * POINTS_PER_INCH / self.dpi,
        }
    }

    fn to_pixels(&self, value: f32) -> u32 {
        let px = match self.unit {
            Unit::Dots => value,
            _ => self.to_mm(value) * self.dots_per_mm(),
        };
        (px.round() as u32).max(1)
    }

    /// Physical size in millimetres.
    pub fn size_mm(&self) -> (f32, f32) {
        (self.to_mm(self.width), self.to_mm(self.height))
    }

    /// Bitmap dimensions for the raster backend.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.to_pixels(self.width), self.to_pixels(self.height))
    }

    /// Page dimensions for the vector backend.
    pub fn page_size_pt(&self) -> (f32, f32) {
        (self.to_points(self.width), self.to_points(self.height))
    }

    /// Layout extent in pixels.
    pub fn pixel_extent(&self) -> Extent {
        let (w, h) = self.pixel_size();
        Extent::new(w as f32, h as f32, self.dots_per_mm())
    }

    /// Layout extent in points.
    pub fn point_extent(&self) -> Extent {
        let (w, h) = self.page_size_pt();
        Extent::new(w, h, POINTS_PER_INCH / MM_PER_INCH)
    }
}

/// Preferred output of a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Png,
    Pdf,
}

/// Named label formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPreset {
    /// 80 × 60 mm reel label, 3 rows, bitmap.
    Reel,
    /// 115 × 80 mm reel label, 3 rows, PDF.
    ReelPdf,
    /// 90 × 50 mm single barcode with caption.
    Single,
}

impl LabelPreset {
    pub const ALL: [LabelPreset; 3] = [Self::Reel, Self::ReelPdf, Self::Single];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Reel => "reel",
            Self::ReelPdf => "reel-pdf",
            Self::Single => "single",
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    pub fn canvas(&self) -> CanvasSpec {
        match self {
            Self::Reel => CanvasSpec {
                width: 800.0,
                height: 600.0,
                unit: Unit::Dots,
                dpi: 254.0,
            },
            Self::ReelPdf => CanvasSpec {
                width: 115.0,
                height: 80.0,
                unit: Unit::Millimeters,
                dpi: 300.0,
            },
            Self::Single => CanvasSpec {
                width: 90.0,
                height: 50.0,
                unit: Unit::Millimeters,
                dpi: 300.0,
            },
        }
    }

    pub fn layout(&self) -> LayoutMode {
        match self {
            Self::Reel => LayoutMode::MultiRow(RowLayout::default()),
            Self::ReelPdf => LayoutMode::MultiRow(RowLayout::document()),
            Self::Single => LayoutMode::SingleFrame(SingleFrameLayout {
                fit: SymbolFit::Stretch,
                ..Default::default()
            }),
        }
    }

    pub fn output(&self) -> OutputKind {
        match self {
            Self::ReelPdf => OutputKind::Pdf,
            Self::Reel | Self::Single => OutputKind::Png,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dots_are_exact_pixels() {
        let canvas = CanvasSpec::dots(800, 600, 254.0).unwrap();
        assert_eq!(canvas.pixel_size(), (800, 600));
        let (w, h) = canvas.size_mm();
        assert!((w - 80.0).abs() < 1e-3);
        assert!((h - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_mm_to_pixels() {
        // 90 × 50 mm at 300 DPI
        let canvas = CanvasSpec::mm(90.0, 50.0, 300.0).unwrap();
        assert_eq!(canvas.pixel_size(), (1063, 591));
    }

    #[test]
    fn test_page_size_points() {
        let canvas = CanvasSpec::new(300.0, 200.0, Unit::Points, 300.0).unwrap();
        assert_eq!(canvas.page_size_pt(), (300.0, 200.0));

        let (w, _) = CanvasSpec::mm(25.4, 10.0, 203.0).unwrap().page_size_pt();
        assert!((w - 72.0).abs() < 1e-4);
    }

    #[test]
    fn test_rejects_non_positive() {
        assert_eq!(
            CanvasSpec::mm(0.0, 10.0, 300.0),
            Err(CanvasError::InvalidDimension(0.0))
        );
        assert_eq!(
            CanvasSpec::mm(10.0, 10.0, -1.0),
            Err(CanvasError::InvalidResolution(-1.0))
        );
        assert!(CanvasSpec::mm(10.0, f32::NAN, 300.0).is_err());
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(LabelPreset::by_name("REEL-PDF"), Some(LabelPreset::ReelPdf));
        assert_eq!(LabelPreset::by_name("nope"), None);
        assert_eq!(LabelPreset::Reel.canvas().pixel_size(), (800, 600));
    }
}
