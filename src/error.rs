//! # Error Types
//!
//! Each module reports its own failures; [`EtichetaError`] collects them for
//! callers that just want one error type, like the CLI.

use thiserror::Error;

use crate::canvas::CanvasError;
use crate::font::FontError;
use crate::layout::LayoutError;
use crate::printer::PrintError;
use crate::record::RecordError;
use crate::render::RenderError;
use crate::symbol::{EncodeError, StoreError};

/// Main error type for eticheta operations
#[derive(Debug, Error)]
pub enum EtichetaError {
    /// Record could not be built from the given values
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// Invalid canvas dimensions or resolution
    #[error("Canvas error: {0}")]
    Canvas(#[from] CanvasError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Symbol error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Artifact store error: {0}")]
    Store(#[from] StoreError),

    #[error("Font error: {0}")]
    Font(#[from] FontError),

    /// Rendering or writing the label failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Print error: {0}")]
    Print(#[from] PrintError),

    /// Invalid command-line argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
