//! # Label Rendering
//!
//! Entry point of the engine. A render call parses or takes a record,
//! computes the layout, encodes one symbol per non-empty field, and hands
//! everything to a backend.
//!
//! ```text
//! raw "A1|5|L7" ─► record::parse ─► LabelRecord
//!                                       │
//! CanvasSpec + LayoutMode ─► layout::compute ─► FrameGeometry
//!                                       │
//!                         plan rows: symbol::encode ─► ArtifactStore
//!                                       │
//!                    ┌──────────────────┴──────────────────┐
//!                    ▼                                     ▼
//!              raster::draw                          vector::draw
//!              (GrayImage → PNG)                     (lopdf → PDF)
//! ```
//!
//! Field-level problems (unencodable value, unreadable symbol, missing font,
//! text that does not fit) are absorbed and listed in the [`RenderReport`].
//! Only failing to write the artifact aborts a render.
//!
//! ## Example
//!
//! ```no_run
//! use eticheta::canvas::LabelPreset;
//! use eticheta::render::{Backend, LabelEngine};
//!
//! let engine = LabelEngine::default();
//! let preset = LabelPreset::Reel;
//! let rendered = engine
//!     .render_raw("A012345|50|REEL-042", &preset.canvas(), &preset.layout(), Backend::Raster)
//!     .unwrap();
//! rendered.artifact.write_to("label.png".as_ref()).unwrap();
//! ```

pub mod raster;
pub mod vector;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::GrayImage;
use serde::Serialize;
use thiserror::Error;

use crate::canvas::{CanvasSpec, OutputKind};
use crate::font::{FontError, FontSource, FontStyle, SystemFonts, Typeface};
use crate::layout::{self, FrameGeometry, LayoutError, LayoutMode, RowGeometry};
use crate::record::{self, Field, LabelRecord, ParseDegraded};
use crate::symbol::{self, Artifact, ArtifactStore, SymbolStyle};

/// Selects the compositing backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Raster,
    Vector,
}

impl Backend {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Raster => "png",
            Self::Vector => "pdf",
        }
    }
}

impl From<OutputKind> for Backend {
    fn from(kind: OutputKind) -> Self {
        match kind {
            OutputKind::Png => Self::Raster,
            OutputKind::Pdf => Self::Vector,
        }
    }
}

/// Failures that abort a render.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("cannot write label to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode label image: {0}")]
    Image(String),

    #[error("cannot build label document: {0}")]
    Document(String),
}

/// A problem absorbed during rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Degradation {
    /// Input had missing or extra segments.
    ParseDegraded(ParseDegraded),
    /// A value could not become a symbol; its text is shown instead.
    EncodeFailed { row: usize, field: String, reason: String },
    /// An outline font could not be loaded; the built-in face is used.
    FontLoadFailed { style: String, reason: String },
    /// Text is drawn at the minimum size and still overflows its zone.
    TextOverflow { row: usize, text: String, size: f32 },
}

/// What ended up in a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "content", rename_all = "kebab-case")]
pub enum RowContent {
    Symbol { source: String },
    Placeholder,
    Fallback { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowOutcome {
    pub index: usize,
    pub name: String,
    #[serde(flatten)]
    pub content: RowContent,
}

/// Everything a caller may want to know about a finished render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderReport {
    pub backend: Backend,
    pub geometry: FrameGeometry,
    pub rows: Vec<RowOutcome>,
    pub degradations: Vec<Degradation>,
}

impl RenderReport {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

/// A finished PDF.
#[derive(Debug, Clone)]
pub struct VectorDocument {
    pub bytes: Vec<u8>,
    /// Page size in points.
    pub page_size: (f32, f32),
}

/// Output of a render; the caller owns it.
#[derive(Debug, Clone)]
pub enum RenderedArtifact {
    Raster(GrayImage),
    Vector(VectorDocument),
}

impl RenderedArtifact {
    pub fn backend(&self) -> Backend {
        match self {
            Self::Raster(_) => Backend::Raster,
            Self::Vector(_) => Backend::Vector,
        }
    }

    /// Encoded file contents (PNG or PDF).
    pub fn to_bytes(&self) -> Result<Vec<u8>, RenderError> {
        match self {
            Self::Raster(img) => raster::encode_png(img),
            Self::Vector(doc) => Ok(doc.bytes.clone()),
        }
    }

    /// Write the artifact to `path`. A failed write leaves no file behind.
    pub fn write_to(&self, path: &Path) -> Result<(), RenderError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|source| {
            let _ = std::fs::remove_file(path);
            RenderError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        log::info!("wrote {}", path.display());
        Ok(())
    }
}

/// Artifact plus report.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub artifact: RenderedArtifact,
    pub report: RenderReport,
}

/// Default output file name: `label_<timestamp>_<suffix>.<ext>`.
pub fn default_file_name(backend: Backend) -> String {
    format!(
        "label_{}_{}.{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S"),
        &uuid::Uuid::new_v4().simple().to_string()[..8],
        backend.extension()
    )
}

/// What a row will show, decided before any drawing.
pub(crate) enum Planned {
    Symbol(Artifact),
    Placeholder,
    Fallback(String),
}

pub(crate) struct RowPlan<'a> {
    pub geometry: &'a RowGeometry,
    pub field: &'a Field,
    pub content: Planned,
}

impl RowPlan<'_> {
    /// Replace a symbol that cannot be drawn with its textual fallback.
    /// Dropping the artifact releases it.
    pub(crate) fn demote(&mut self, reason: String, degradations: &mut Vec<Degradation>) {
        let Planned::Symbol(artifact) = &self.content else {
            return;
        };
        let text = fallback_text(artifact.source());
        degradations.push(Degradation::EncodeFailed {
            row: self.geometry.index,
            field: self.field.name.clone(),
            reason,
        });
        self.content = Planned::Fallback(text);
    }

    fn outcome(&self) -> RowOutcome {
        let content = match &self.content {
            Planned::Symbol(artifact) => RowContent::Symbol {
                source: artifact.source().to_string(),
            },
            Planned::Placeholder => RowContent::Placeholder,
            Planned::Fallback(text) => RowContent::Fallback { text: text.clone() },
        };
        RowOutcome {
            index: self.geometry.index,
            name: self.field.name.clone(),
            content,
        }
    }
}

/// Record text drawn at minimum size that still spills out of its zone.
pub(crate) fn note_overflow(
    degradations: &mut Vec<Degradation>,
    row: usize,
    text: &str,
    overflow: Option<f32>,
) {
    if let Some(size) = overflow {
        degradations.push(Degradation::TextOverflow {
            row,
            text: text.to_string(),
            size,
        });
    }
}

/// Text shown when a value cannot be encoded.
pub fn fallback_text(value: &str) -> String {
    format!("[No Barcode: {}]", value)
}

/// The rendering engine. Holds no per-render state.
pub struct LabelEngine {
    fonts: Arc<dyn FontSource>,
    store: ArtifactStore,
}

impl Default for LabelEngine {
    fn default() -> Self {
        Self::new(Arc::new(SystemFonts::default()), ArtifactStore::in_memory())
    }
}

impl LabelEngine {
    pub fn new(fonts: Arc<dyn FontSource>, store: ArtifactStore) -> Self {
        Self { fonts, store }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Parse `raw` and render it.
    pub fn render_raw(
        &self,
        raw: &str,
        canvas: &CanvasSpec,
        mode: &LayoutMode,
        backend: Backend,
    ) -> Result<Rendered, RenderError> {
        let parsed = record::parse(raw);
        let mut rendered = self.render(&parsed.record, canvas, mode, backend)?;
        if !parsed.degraded.is_clean() {
            rendered
                .report
                .degradations
                .insert(0, Degradation::ParseDegraded(parsed.degraded));
        }
        Ok(rendered)
    }

    /// Render a record with the chosen backend.
    pub fn render(
        &self,
        record: &LabelRecord,
        canvas: &CanvasSpec,
        mode: &LayoutMode,
        backend: Backend,
    ) -> Result<Rendered, RenderError> {
        let extent = match backend {
            Backend::Raster => canvas.pixel_extent(),
            Backend::Vector => canvas.point_extent(),
        };
        let geometry = layout::compute(&extent, record.len(), mode)?;

        // Symbols are rasterized at the canvas DPI for both backends.
        let pixels_per_unit = canvas.dots_per_mm() / extent.units_per_mm;
        let style = SymbolStyle::for_resolution(canvas.dots_per_mm(), mode.module_mm());

        let mut degradations = Vec::new();
        let mut plan: Vec<RowPlan<'_>> = geometry
            .rows
            .iter()
            .zip(record.iter())
            .map(|(row, field)| RowPlan {
                geometry: row,
                field,
                content: self.plan_row(row, field, pixels_per_unit, &style, &mut degradations),
            })
            .collect();

        let artifact = match backend {
            Backend::Raster => {
                let regular = self.face(FontStyle::Regular, &mut degradations);
                let bold = self.face(FontStyle::Bold, &mut degradations);
                let faces = raster::Faces { regular, bold };
                RenderedArtifact::Raster(raster::draw(
                    &geometry,
                    &mut plan,
                    &faces,
                    &mut degradations,
                )?)
            }
            Backend::Vector => RenderedArtifact::Vector(vector::draw(
                &geometry,
                &mut plan,
                &mut degradations,
            )?),
        };

        // Rows whose symbol could not be read back are fallbacks by now.
        let rows = plan.iter().map(RowPlan::outcome).collect();

        // Backends release symbols as they embed them; this covers the rest.
        drop(plan);

        for d in &degradations {
            log::warn!("degraded render: {:?}", d);
        }

        Ok(Rendered {
            artifact,
            report: RenderReport {
                backend,
                geometry,
                rows,
                degradations,
            },
        })
    }

    /// Render and write to `path`, or to a default name in the current
    /// directory. Returns where the artifact went.
    pub fn render_to_file(
        &self,
        record: &LabelRecord,
        canvas: &CanvasSpec,
        mode: &LayoutMode,
        backend: Backend,
        path: Option<&Path>,
    ) -> Result<(PathBuf, RenderReport), RenderError> {
        let rendered = self.render(record, canvas, mode, backend)?;
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(default_file_name(backend)));
        rendered.artifact.write_to(&path)?;
        Ok((path, rendered.report))
    }

    fn plan_row(
        &self,
        row: &RowGeometry,
        field: &Field,
        pixels_per_unit: f32,
        style: &SymbolStyle,
        degradations: &mut Vec<Degradation>,
    ) -> Planned {
        if field.is_empty() {
            return Planned::Placeholder;
        }

        let height = (row.symbol.height * pixels_per_unit).round().max(1.0) as u32;
        let stashed = symbol::encode(&field.value, height, style)
            .map_err(|e| e.to_string())
            .and_then(|sym| self.store.stash(sym).map_err(|e| e.to_string()));

        match stashed {
            Ok(artifact) => Planned::Symbol(artifact),
            Err(reason) => {
                degradations.push(Degradation::EncodeFailed {
                    row: row.index,
                    field: field.name.clone(),
                    reason,
                });
                Planned::Fallback(fallback_text(symbol::truncate(&field.value)))
            }
        }
    }

    fn face(&self, style: FontStyle, degradations: &mut Vec<Degradation>) -> Typeface {
        let (face, err): (Typeface, Option<FontError>) = Typeface::resolve(&*self.fonts, style);
        if let Some(e) = err {
            degradations.push(Degradation::FontLoadFailed {
                style: format!("{:?}", style),
                reason: e.to_string(),
            });
        }
        face
    }
}
