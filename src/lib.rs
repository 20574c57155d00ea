//! # Eticheta - Barcode Label Rendering
//!
//! Eticheta turns a short delimited record such as `A012345|50|REEL-042`
//! into a print-ready label. It provides:
//!
//! - **Record parsing**: up to three named fields from one delimited string
//! - **Layout**: one geometry for both output formats, single-frame or multi-row
//! - **Symbols**: Code 128 barcodes, staged in a transient artifact store
//! - **Backends**: grayscale PNG bitmaps and one-page PDF documents
//! - **Printing**: CUPS adapters for submitting finished labels
//!
//! ## Quick Start
//!
//! ```no_run
//! use eticheta::{Backend, LabelEngine, LabelPreset};
//!
//! let engine = LabelEngine::default();
//! let preset = LabelPreset::ReelPdf;
//!
//! let rendered = engine.render_raw(
//!     "A012345|50|REEL-042",
//!     &preset.canvas(),
//!     &preset.layout(),
//!     Backend::Vector,
//! )?;
//!
//! for degradation in &rendered.report.degradations {
//!     eprintln!("{:?}", degradation);
//! }
//! rendered.artifact.write_to("label.pdf".as_ref())?;
//!
//! # Ok::<(), eticheta::EtichetaError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`record`] | Delimited input parsing |
//! | [`canvas`] | Physical label sizes and presets |
//! | [`layout`] | Zone geometry for every row |
//! | [`symbol`] | Code 128 encoding and the artifact store |
//! | [`font`] | Font sources, built-in bitmap face, size fitting |
//! | [`render`] | Engine and raster/vector backends |
//! | [`printer`] | Print submission and printer listing |
//! | [`error`] | Error types |

pub mod canvas;
pub mod error;
pub mod font;
pub mod layout;
pub mod printer;
pub mod record;
pub mod render;
pub mod symbol;

// Re-exports for convenience
pub use canvas::{CanvasSpec, LabelPreset};
pub use error::EtichetaError;
pub use layout::LayoutMode;
pub use record::LabelRecord;
pub use render::{Backend, LabelEngine, RenderReport, Rendered, RenderedArtifact};
