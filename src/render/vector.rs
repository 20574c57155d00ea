//! # Vector Backend
//!
//! Writes a one-page PDF whose MediaBox is the canvas size in points.
//!
//! ## Document Structure
//!
//! ```text
//! Catalog ─► Pages ─► Page ─┬─ Contents (text + image placements)
//!                           └─ Resources ─┬─ Font: F1 Helvetica, F2 Helvetica-Bold
//!                                         └─ XObject: Im0, Im1, … (DeviceGray, Flate)
//! ```
//!
//! Layout rectangles are y-down; PDF user space is y-up, so every rectangle
//! is flipped against the page height when emitted.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::GrayImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat, dictionary};

use super::{Degradation, Planned, RenderError, RowPlan, VectorDocument, note_overflow};
use crate::font::standard::win_ansi;
use crate::font::{StandardFont, fit_text};
use crate::layout::{self, Align, FrameGeometry, PLACEHOLDER, Rect, TextSize, TextZone};

/// Collects content operations in page coordinates.
struct Page {
    height: f32,
    ops: Vec<Operation>,
}

impl Page {
    /// Bottom edge of `rect` in PDF space.
    fn flip(&self, rect: &Rect) -> f32 {
        self.height - rect.y - rect.height
    }

    fn image(&mut self, name: &str, dest: &Rect, clip: &Rect) {
        self.ops.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "re",
                vec![
                    clip.x.into(),
                    self.flip(clip).into(),
                    clip.width.into(),
                    clip.height.into(),
                ],
            ),
            Operation::new("W", vec![]),
            Operation::new("n", vec![]),
            Operation::new(
                "cm",
                vec![
                    dest.width.into(),
                    0.into(),
                    0.into(),
                    dest.height.into(),
                    dest.x.into(),
                    self.flip(dest).into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ]);
    }

    /// Draw `content` in `zone`. Returns the size used when it overflows.
    fn text(&mut self, zone: &TextZone, content: &str) -> Option<f32> {
        let font = StandardFont::new(zone.bold);
        let rect = &zone.rect;
        let (size, overflow) = match zone.size {
            TextSize::Fixed(size) => {
                let (w, h) = font.measure(content, size);
                (size, w > rect.width || h > rect.height)
            }
            TextSize::Fit { min, max } => {
                let fit = fit_text(&font, content, (rect.width, rect.height), (min, max), 1.0);
                (fit.size, fit.overflow)
            }
        };

        let (w, h) = font.measure(content, size);
        let x = match zone.align {
            Align::Left => rect.x,
            Align::Center => rect.x + (rect.width - w) / 2.0,
        };
        let top = rect.y + ((rect.height - h) / 2.0).max(0.0);
        let baseline = self.height - top - font.ascent(size);

        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(font.resource().as_bytes().to_vec()), size.into()],
            ),
            Operation::new("Td", vec![x.into(), baseline.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(win_ansi(content), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);

        overflow.then_some(size)
    }
}

/// Flate-compressed DeviceGray image XObject.
fn image_xobject(symbol: &GrayImage) -> Result<Stream, RenderError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(symbol.as_raw())
        .map_err(|e| RenderError::Document(e.to_string()))?;
    let data = encoder
        .finish()
        .map_err(|e| RenderError::Document(e.to_string()))?;

    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => symbol.width() as i64,
            "Height" => symbol.height() as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        data,
    ))
}

pub(crate) fn draw(
    geometry: &FrameGeometry,
    plan: &mut [RowPlan<'_>],
    degradations: &mut Vec<Degradation>,
) -> Result<VectorDocument, RenderError> {
    let (width, height) = (geometry.canvas.width, geometry.canvas.height);
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let mut page = Page {
        height,
        ops: Vec::new(),
    };
    let mut xobjects = Dictionary::new();

    for row in plan.iter_mut() {
        let index = row.geometry.index;

        if let Some(zone) = &row.geometry.name {
            let overflow = page.text(zone, &row.field.name);
            note_overflow(degradations, index, &row.field.name, overflow);
        }

        if let Planned::Symbol(artifact) = &mut row.content {
            let embedded = match artifact.load() {
                Ok(symbol) => Ok((
                    image_xobject(&symbol)?,
                    (symbol.width() as f32, symbol.height() as f32),
                )),
                Err(e) => Err(e.to_string()),
            };

            match embedded {
                Ok((stream, size)) => {
                    let name = format!("Im{}", index);
                    xobjects.set(name.as_str(), doc.add_object(stream));
                    let placement = layout::place_symbol(row.geometry.symbol, size, geometry.fit);
                    page.image(&name, &placement.dest, &placement.clip);

                    if let Some(zone) = &row.geometry.caption {
                        let caption = geometry.caption_format.apply(artifact.source());
                        let overflow = page.text(zone, &caption);
                        note_overflow(degradations, index, &caption, overflow);
                    }
                    if let Err(e) = artifact.release() {
                        log::warn!("{}", e);
                    }
                }
                Err(reason) => row.demote(reason, degradations),
            }
        }

        let message = match &row.content {
            Planned::Symbol(_) => None,
            Planned::Placeholder => Some(PLACEHOLDER),
            Planned::Fallback(fallback) => Some(fallback.as_str()),
        };
        if let Some(message) = message {
            let overflow = page.text(&row.geometry.placeholder, message);
            note_overflow(degradations, index, message, overflow);
        }
    }

    let fonts = [StandardFont::Helvetica, StandardFont::HelveticaBold]
        .into_iter()
        .fold(Dictionary::new(), |mut dict, font| {
            dict.set(
                font.resource(),
                dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => font.base_name(),
                    "Encoding" => "WinAnsiEncoding",
                },
            );
            dict
        });

    let content = Content {
        operations: page.ops,
    };
    let encoded = content
        .encode()
        .map_err(|e| RenderError::Document(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
        "XObject" => xobjects,
    });
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    doc.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }
        .into(),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    // The only place the document is finalized.
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| RenderError::Document(e.to_string()))?;

    log::debug!("vector label {}x{} pt, {} bytes", width, height, bytes.len());
    Ok(VectorDocument {
        bytes,
        page_size: (width, height),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Extent, LayoutMode, RowLayout};
    use crate::record::Field;
    use crate::render::fallback_text;
    use crate::symbol::{ArtifactStore, SymbolStyle, encode};

    #[test]
    fn test_flip_to_pdf_space() {
        let page = Page {
            height: 100.0,
            ops: Vec::new(),
        };
        assert_eq!(page.flip(&Rect::new(0.0, 10.0, 5.0, 20.0)), 70.0);
    }

    #[test]
    fn test_text_emits_one_run() {
        let mut page = Page {
            height: 200.0,
            ops: Vec::new(),
        };
        let zone = TextZone {
            rect: Rect::new(10.0, 10.0, 200.0, 20.0),
            size: TextSize::Fixed(8.0),
            align: Align::Left,
            bold: true,
        };
        assert_eq!(page.text(&zone, "SAP-Nr"), None);
        let operators: Vec<_> = page.ops.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(operators, ["BT", "Tf", "Td", "Tj", "ET"]);
    }

    #[test]
    fn test_image_is_clipped() {
        let mut page = Page {
            height: 50.0,
            ops: Vec::new(),
        };
        let zone = Rect::new(0.0, 0.0, 10.0, 10.0);
        page.image("Im0", &Rect::new(-5.0, 0.0, 20.0, 10.0), &zone);
        let operators: Vec<_> = page.ops.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(operators, ["q", "re", "W", "n", "cm", "Do", "Q"]);
    }

    #[test]
    fn test_xobject_is_flate_gray() {
        let symbol = GrayImage::from_pixel(3, 2, image::Luma([0]));
        let stream = image_xobject(&symbol).unwrap();
        assert!(matches!(stream.dict.get(b"ColorSpace"), Ok(Object::Name(n)) if n == b"DeviceGray"));
        assert!(matches!(stream.dict.get(b"Width"), Ok(Object::Integer(3))));
    }

    #[test]
    fn test_unreadable_symbol_becomes_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::in_dir(dir.path());
        let extent = Extent::new(326.0, 226.77, 72.0 / 25.4);
        let geometry =
            layout::compute(&extent, 1, &LayoutMode::MultiRow(RowLayout::document())).unwrap();
        let field = Field::new("SAP-Nr", "A012345");

        let symbol = encode("A012345", 40, &SymbolStyle::default()).unwrap();
        let artifact = store.stash(symbol).unwrap();
        std::fs::remove_file(artifact.path().unwrap()).unwrap();

        let mut plan = vec![RowPlan {
            geometry: &geometry.rows[0],
            field: &field,
            content: Planned::Symbol(artifact),
        }];
        let mut degradations = Vec::new();
        let doc = draw(&geometry, &mut plan, &mut degradations).unwrap();

        assert!(doc.bytes.starts_with(b"%PDF-"));
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
