//! # Label Layout
//!
//! Computes where every element of a label goes, in device units, before any
//! field value is looked at. The same geometry feeds the raster and the
//! vector backend; only the final drawing step differs.
//!
//! ## Modes
//!
//! **Single frame**: one barcode above one caption.
//!
//! ```text
//! ┌──────────────────────────────┐ canvas
//! │ ┌──────────────────────────┐ │ outer frame (95%)
//! │ │  ┌────────────────────┐  │ │
//! │ │  │ symbol (90% × 60%) │  │ │
//! │ │  └────────────────────┘  │ │
//! │ │  ┌────────────────────┐  │ │
//! │ │  │ caption (90% × 35%)│  │ │
//! │ │  └────────────────────┘  │ │
//! │ └──────────────────────────┘ │
//! └──────────────────────────────┘
//! ```
//!
//! **Multi row**: N equal rows, each with a name strip and a symbol body.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ SAP-Nr                       │ ← name strip
//! │ ▌▌▐▌▌▐▐▌▌▐▌▌▐▐▌▌▐▌▌▐▐▌▌▐▌▌▐  │ ← symbol zone
//! ├──────────────────────────────┤
//! │ Cantitate                    │
//! │ ▌▌▐▌▌▐▐▌▌▐▌▌▐▐▌▌▐▌▌▐▐▌▌▐▌▌▐  │
//! ├──────────────────────────────┤
//! │ Lot Nr                       │
//! │ (empty)                      │ ← placeholder
//! └──────────────────────────────┘
//! ```
//!
//! Row proportions are given in millimetres and scaled by the extent's
//! units-per-millimetre, so a mode produces matching layouts in pixels and
//! in points.

use serde::Serialize;
use thiserror::Error;

use crate::record::MAX_FIELDS;

/// Shown in place of a symbol when a field is empty.
pub const PLACEHOLDER: &str = "(empty)";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("field count must be between 1 and {MAX_FIELDS}, got {0}")]
    FieldCount(usize),
}

/// Axis-aligned rectangle, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Whether `other` lies inside this rectangle, within float tolerance.
    pub fn contains(&self, other: &Rect) -> bool {
        const EPS: f32 = 1e-3;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.right() <= self.right() + EPS
            && other.bottom() <= self.bottom() + EPS
    }

    /// Overlap of two rectangles; zero-sized when they are disjoint.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Rect::new(x, y, (right - x).max(0.0), (bottom - y).max(0.0))
    }

    /// A `fraction` sized copy centered inside this rectangle.
    fn centered(&self, fw: f32, fh: f32) -> Rect {
        let width = self.width * fw;
        let height = self.height * fh;
        Rect::new(
            self.x + (self.width - width) / 2.0,
            self.y + (self.height - height) / 2.0,
            width,
            height,
        )
    }
}

/// Canvas size in device units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub width: f32,
    pub height: f32,
    /// Device units per millimetre (pixels or points).
    pub units_per_mm: f32,
}

impl Extent {
    pub fn new(width: f32, height: f32, units_per_mm: f32) -> Self {
        Self {
            width,
            height,
            units_per_mm,
        }
    }

    #[inline]
    fn mm(&self, value: f32) -> f32 {
        value * self.units_per_mm
    }

    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// How a symbol image is fitted into its zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolFit {
    /// Resize to exactly fill the zone, ignoring aspect ratio.
    #[default]
    Stretch,
    /// Resize to the zone height, center horizontally, clip to the zone width.
    FitHeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
}

/// Font size rule for a text zone, in device units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSize {
    Fixed(f32),
    /// Largest size in range that fits the zone.
    Fit { min: f32, max: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextZone {
    pub rect: Rect,
    pub size: TextSize,
    pub align: Align,
    pub bold: bool,
}

/// How the literal value is written under the symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionFormat {
    Plain,
    /// `(value)`
    Parenthesized,
}

impl CaptionFormat {
    pub fn apply(&self, value: &str) -> String {
        match self {
            Self::Plain => value.to_string(),
            Self::Parenthesized => format!("({})", value),
        }
    }
}

/// Geometry of one field row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowGeometry {
    pub index: usize,
    pub bounds: Rect,
    /// Field name strip; absent in single-frame mode.
    pub name: Option<TextZone>,
    pub symbol: Rect,
    /// Literal value under the symbol.
    pub caption: Option<TextZone>,
    /// Where placeholder or fallback text goes when there is no symbol.
    pub placeholder: TextZone,
}

/// Complete layout for one canvas and field count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameGeometry {
    pub canvas: Rect,
    pub outer: Rect,
    pub rows: Vec<RowGeometry>,
    pub fit: SymbolFit,
    pub caption_format: CaptionFormat,
}

/// Proportions for single-frame mode, as fractions of the parent frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SingleFrameLayout {
    pub outer: f32,
    pub symbol_width: f32,
    pub symbol_height: f32,
    pub text_width: f32,
    pub text_height: f32,
    /// Gap above the symbol and between symbol and text.
    pub gap: f32,
    /// Smallest caption size, millimetres.
    pub caption_min_mm: f32,
    /// Width of one barcode module, millimetres.
    pub module_mm: f32,
    pub fit: SymbolFit,
}

impl Default for SingleFrameLayout {
    fn default() -> Self {
        Self {
            outer: 0.95,
            symbol_width: 0.9,
            symbol_height: 0.6,
            text_width: 0.9,
            text_height: 0.35,
            gap: 0.02,
            caption_min_mm: 1.0,
            module_mm: 0.4,
            fit: SymbolFit::Stretch,
        }
    }
}

/// Proportions for multi-row mode, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RowLayout {
    /// Margin around the area the rows partition.
    pub margin_mm: f32,
    pub inset_left_mm: f32,
    pub inset_right_mm: f32,
    /// Offset of the name strip from the row top.
    pub name_top_mm: f32,
    pub name_strip_mm: f32,
    pub bottom_gap_mm: f32,
    /// Pin the symbol to this height, centered in the row.
    pub symbol_height_mm: Option<f32>,
    /// Reserve a strip this tall under the symbol for the literal value.
    pub value_caption_mm: Option<f32>,
    pub name_text_mm: f32,
    pub caption_text_mm: f32,
    pub placeholder_text_mm: f32,
    /// Width of one barcode module, millimetres.
    pub module_mm: f32,
    pub fit: SymbolFit,
}

impl Default for RowLayout {
    /// Bitmap reel label: symbols fill the row body.
    fn default() -> Self {
        Self {
            margin_mm: 0.0,
            inset_left_mm: 1.5,
            inset_right_mm: 1.0,
            name_top_mm: 0.3,
            name_strip_mm: 1.7,
            bottom_gap_mm: 0.5,
            symbol_height_mm: None,
            value_caption_mm: None,
            name_text_mm: 1.6,
            caption_text_mm: 1.4,
            placeholder_text_mm: 1.4,
            module_mm: 0.4,
            fit: SymbolFit::Stretch,
        }
    }
}

impl RowLayout {
    /// Document reel label: 16 mm symbols with the value printed below.
    pub fn document() -> Self {
        Self {
            margin_mm: 3.0,
            inset_left_mm: 0.0,
            inset_right_mm: 2.0,
            name_top_mm: 0.0,
            name_strip_mm: 3.0,
            bottom_gap_mm: 0.0,
            symbol_height_mm: Some(16.0),
            value_caption_mm: Some(3.0),
            // 8 pt and 6 pt
            name_text_mm: 2.822,
            caption_text_mm: 2.117,
            placeholder_text_mm: 2.822,
            module_mm: 0.5,
            fit: SymbolFit::FitHeight,
        }
    }
}

/// Layout strategy, chosen per render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum LayoutMode {
    SingleFrame(SingleFrameLayout),
    MultiRow(RowLayout),
}

impl Default for LayoutMode {
    fn default() -> Self {
        Self::MultiRow(RowLayout::default())
    }
}

impl LayoutMode {
    /// Barcode module width the mode's symbols are drawn with.
    pub fn module_mm(&self) -> f32 {
        match self {
            Self::SingleFrame(l) => l.module_mm,
            Self::MultiRow(l) => l.module_mm,
        }
    }
}

/// Compute label geometry.
///
/// Depends only on the extent, the field count and the mode, so the result
/// can be reused for any record of the same shape.
pub fn compute(
    extent: &Extent,
    field_count: usize,
    mode: &LayoutMode,
) -> Result<FrameGeometry, LayoutError> {
    if field_count == 0 || field_count > MAX_FIELDS {
        return Err(LayoutError::FieldCount(field_count));
    }

    let geometry = match mode {
        LayoutMode::SingleFrame(layout) => single_frame(extent, layout),
        LayoutMode::MultiRow(layout) => multi_row(extent, field_count, layout),
    };

    log::debug!(
        "layout {}x{}: {} row(s), outer {:?}",
        extent.width,
        extent.height,
        geometry.rows.len(),
        geometry.outer
    );

    Ok(geometry)
}

fn single_frame(extent: &Extent, layout: &SingleFrameLayout) -> FrameGeometry {
    let canvas = extent.bounds();
    let outer = canvas.centered(layout.outer, layout.outer);
    let gap = outer.height * layout.gap;

    let symbol_w = outer.width * layout.symbol_width;
    let symbol = Rect::new(
        outer.x + (outer.width - symbol_w) / 2.0,
        outer.y + gap,
        symbol_w,
        outer.height * layout.symbol_height,
    )
    .intersect(&outer);

    let text_w = outer.width * layout.text_width;
    let text = Rect::new(
        outer.x + (outer.width - text_w) / 2.0,
        symbol.bottom() + gap,
        text_w,
        outer.height * layout.text_height,
    )
    .intersect(&outer);

    let min = extent.mm(layout.caption_min_mm).min(text.height).max(1.0);
    let caption = TextZone {
        rect: text,
        size: TextSize::Fit {
            min,
            max: text.height.max(min),
        },
        align: Align::Center,
        bold: false,
    };

    FrameGeometry {
        canvas,
        outer,
        rows: vec![RowGeometry {
            index: 0,
            bounds: outer,
            name: None,
            symbol,
            caption: Some(caption),
            placeholder: TextZone {
                rect: symbol,
                size: caption.size,
                align: Align::Center,
                bold: false,
            },
        }],
        fit: layout.fit,
        caption_format: CaptionFormat::Plain,
    }
}

fn multi_row(extent: &Extent, count: usize, layout: &RowLayout) -> FrameGeometry {
    let canvas = extent.bounds();
    let margin = extent
        .mm(layout.margin_mm)
        .min(canvas.width / 2.0)
        .min(canvas.height / 2.0);
    let outer = Rect::new(
        margin,
        margin,
        canvas.width - 2.0 * margin,
        canvas.height - 2.0 * margin,
    );

    let rows = (0..count)
        .map(|index| {
            // Edges from the same formula keep rows flush with no drift.
            let top = outer.y + outer.height * index as f32 / count as f32;
            let bottom = outer.y + outer.height * (index + 1) as f32 / count as f32;
            let bounds = Rect::new(outer.x, top, outer.width, bottom - top);
            row(extent, index, bounds, layout)
        })
        .collect();

    FrameGeometry {
        canvas,
        outer,
        rows,
        fit: layout.fit,
        caption_format: CaptionFormat::Parenthesized,
    }
}

fn row(extent: &Extent, index: usize, bounds: Rect, layout: &RowLayout) -> RowGeometry {
    let left = extent.mm(layout.inset_left_mm);
    let usable_w = (bounds.width - left - extent.mm(layout.inset_right_mm)).max(0.0);
    let x = bounds.x + left;

    let name_rect = Rect::new(
        x,
        bounds.y + extent.mm(layout.name_top_mm),
        usable_w,
        extent.mm(layout.name_strip_mm),
    )
    .intersect(&bounds);

    let body_top = name_rect.bottom();
    let body_bottom = (bounds.bottom() - extent.mm(layout.bottom_gap_mm)).max(body_top);
    let caption_h = layout
        .value_caption_mm
        .map(|mm| extent.mm(mm).min(body_bottom - body_top))
        .unwrap_or(0.0);
    let symbol_floor = body_bottom - caption_h;

    let symbol = match layout.symbol_height_mm {
        None => Rect::new(x, body_top, usable_w, symbol_floor - body_top),
        Some(mm) => {
            let height = extent.mm(mm).min(symbol_floor - body_top);
            let centered = bounds.y + (bounds.height - height) / 2.0;
            let y = centered.max(body_top).min(symbol_floor - height);
            Rect::new(x, y, usable_w, height)
        }
    };

    let caption = layout.value_caption_mm.map(|_| TextZone {
        rect: Rect::new(x, symbol.bottom(), usable_w, caption_h).intersect(&bounds),
        size: TextSize::Fixed(extent.mm(layout.caption_text_mm)),
        align: Align::Left,
        bold: false,
    });

    let body = Rect::new(x, body_top, usable_w, body_bottom - body_top);

    RowGeometry {
        index,
        bounds,
        name: Some(TextZone {
            rect: name_rect,
            size: TextSize::Fixed(extent.mm(layout.name_text_mm)),
            align: Align::Left,
            bold: true,
        }),
        symbol,
        caption,
        placeholder: TextZone {
            rect: body,
            size: TextSize::Fixed(extent.mm(layout.placeholder_text_mm)),
            align: Align::Left,
            bold: false,
        },
    }
}

/// Final position of a symbol image inside its zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    /// Where the whole image is drawn.
    pub dest: Rect,
    /// Visible part; never exceeds the zone.
    pub clip: Rect,
}

/// Place an image of intrinsic size `(width, height)` into `zone`.
pub fn place_symbol(zone: Rect, intrinsic: (f32, f32), fit: SymbolFit) -> Placement {
    let (w, h) = intrinsic;
    let dest = match fit {
        SymbolFit::Stretch => zone,
        SymbolFit::FitHeight if h > 0.0 => {
            let width = w * zone.height / h;
            Rect::new(
                zone.x + (zone.width - width) / 2.0,
                zone.y,
                width,
                zone.height,
            )
        }
        SymbolFit::FitHeight => zone,
    };
    Placement {
        dest,
        clip: dest.intersect(&zone),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reel() -> Extent {
        Extent::new(800.0, 600.0, 10.0)
    }

    #[test]
    fn test_rows_partition_canvas() {
        let geo = compute(&reel(), 3, &LayoutMode::default()).unwrap();
        assert_eq!(geo.rows.len(), 3);
        assert_eq!(geo.rows[0].bounds.y, 0.0);
        for pair in geo.rows.windows(2) {
            assert_eq!(pair[0].bounds.bottom(), pair[1].bounds.y);
        }
        assert_eq!(geo.rows[2].bounds.bottom(), 600.0);
        for row in &geo.rows {
            assert_eq!(row.bounds.height, 200.0);
        }
    }

    #[test]
    fn test_reel_row_matches_bitmap_lineage() {
        let geo = compute(&reel(), 3, &LayoutMode::default()).unwrap();
        let row = &geo.rows[1];
        assert_eq!(row.symbol, Rect::new(15.0, 220.0, 775.0, 175.0));
        assert_eq!(row.name.unwrap().size, TextSize::Fixed(16.0));
    }

    #[test]
    fn test_children_inside_parents() {
        let modes = [
            LayoutMode::default(),
            LayoutMode::MultiRow(RowLayout::document()),
            LayoutMode::SingleFrame(SingleFrameLayout::default()),
        ];
        let extents = [reel(), Extent::new(326.0, 226.8, 72.0 / 25.4), Extent::new(40.0, 12.0, 1.0)];
        for mode in &modes {
            for extent in &extents {
                for n in 1..=3 {
                    let geo = compute(extent, n, mode).unwrap();
                    assert!(geo.canvas.contains(&geo.outer));
                    for row in &geo.rows {
                        assert!(geo.outer.contains(&row.bounds));
                        assert!(row.bounds.contains(&row.symbol), "{:?} {:?}", mode, row);
                        assert!(row.bounds.contains(&row.placeholder.rect));
                        if let Some(name) = &row.name {
                            assert!(row.bounds.contains(&name.rect));
                        }
                        if let Some(caption) = &row.caption {
                            assert!(row.bounds.contains(&caption.rect));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_document_symbol_fixed_height_centered() {
        // 115 × 80 mm page in points
        let extent = Extent::new(326.0, 226.77, 72.0 / 25.4);
        let geo = compute(&extent, 3, &LayoutMode::MultiRow(RowLayout::document())).unwrap();
        let row = &geo.rows[0];
        let mm16 = 16.0 * 72.0 / 25.4;
        assert!((row.symbol.height - mm16).abs() < 1e-3);
        let row_center = row.bounds.y + row.bounds.height / 2.0;
        let symbol_center = row.symbol.y + row.symbol.height / 2.0;
        assert!((row_center - symbol_center).abs() < 1e-3);
        let caption = row.caption.unwrap();
        assert_eq!(caption.rect.y, row.symbol.bottom());
    }

    #[test]
    fn test_module_width_per_mode() {
        assert_eq!(LayoutMode::default().module_mm(), 0.4);
        assert_eq!(LayoutMode::MultiRow(RowLayout::document()).module_mm(), 0.5);
        assert_eq!(
            LayoutMode::SingleFrame(SingleFrameLayout::default()).module_mm(),
            0.4
        );
    }

    #[test]
    fn test_single_frame_proportions() {
        let extent = Extent::new(1000.0, 500.0, 10.0);
        let geo = compute(&extent, 3, &LayoutMode::SingleFrame(SingleFrameLayout::default()))
            .unwrap();
        assert_eq!(geo.rows.len(), 1);
        assert_eq!(geo.outer, Rect::new(25.0, 12.5, 950.0, 475.0));
        let row = &geo.rows[0];
        assert!((row.symbol.width - 855.0).abs() < 1e-3);
        assert!((row.symbol.height - 285.0).abs() < 1e-3);
        let caption = row.caption.unwrap();
        assert!(caption.rect.y > row.symbol.bottom());
        assert!(matches!(caption.size, TextSize::Fit { .. }));
    }

    #[test]
    fn test_geometry_is_deterministic() {
        let mode = LayoutMode::MultiRow(RowLayout::document());
        let extent = Extent::new(326.0, 226.77, 72.0 / 25.4);
        assert_eq!(
            compute(&extent, 3, &mode).unwrap(),
            compute(&extent, 3, &mode).unwrap()
        );
    }

    #[test]
    fn test_field_count_bounds() {
        assert_eq!(
            compute(&reel(), 0, &LayoutMode::default()),
            Err(LayoutError::FieldCount(0))
        );
        assert_eq!(
            compute(&reel(), 4, &LayoutMode::default()),
            Err(LayoutError::FieldCount(4))
        );
    }

    #[test]
    fn test_place_stretch_fills_zone() {
        let zone = Rect::new(10.0, 10.0, 300.0, 50.0);
        let placed = place_symbol(zone, (120.0, 40.0), SymbolFit::Stretch);
        assert_eq!(placed.dest, zone);
        assert_eq!(placed.clip, zone);
    }

    #[test]
    fn test_place_fit_height_centers_and_clips() {
        let zone = Rect::new(0.0, 0.0, 100.0, 20.0);

        let narrow = place_symbol(zone, (40.0, 40.0), SymbolFit::FitHeight);
        assert_eq!(narrow.dest, Rect::new(40.0, 0.0, 20.0, 20.0));
        assert_eq!(narrow.clip, narrow.dest);

        let wide = place_symbol(zone, (400.0, 40.0), SymbolFit::FitHeight);
        assert_eq!(wide.dest.width, 200.0);
        assert_eq!(wide.clip, zone);
    }
}
