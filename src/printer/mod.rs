//! # Printing
//!
//! Hands a finished label file to the operating system's print system. The
//! engine never talks to printers itself; these adapters shell out to the
//! CUPS command-line tools.
//!
//! ```text
//! LabelEngine::render_to_file ─► label_….pdf ─► PrintSink::submit ─► lp -d <printer>
//! ```
//!
//! Submission happens exactly once. When it fails the label file is left
//! where it was written so it can be printed by hand.
//!
//! | Trait | CUPS adapter | Command |
//! |-------|--------------|---------|
//! | [`PrintSink`] | [`CupsPrinter`] | `lp -d <printer> -t <title> <path>` |
//! | [`PrinterDirectory`] | [`CupsDirectory`] | `lpstat -e` |

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::canvas::CanvasSpec;
use crate::layout::LayoutMode;
use crate::record::LabelRecord;
use crate::render::{Backend, LabelEngine, RenderError, RenderReport};

/// Job title used when the caller does not pick one.
pub const DEFAULT_JOB_TITLE: &str = "Label Print";

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}: {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Accepts a finished label file for printing.
pub trait PrintSink {
    fn submit(&self, path: &Path, title: &str) -> Result<(), PrintError>;
}

/// Lists printer identifiers. Identifiers are opaque.
pub trait PrinterDirectory {
    fn printers(&self) -> Result<Vec<String>, PrintError>;
}

fn run(command: &mut Command) -> Result<String, PrintError> {
    let name = format!("{:?}", command);
    let output = command.output().map_err(|source| PrintError::Spawn {
        command: name.clone(),
        source,
    })?;

    if !output.status.success() {
        return Err(PrintError::Command {
            command: name,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Submits through `lp` to one named CUPS queue.
#[derive(Debug, Clone)]
pub struct CupsPrinter {
    pub printer: String,
}

impl CupsPrinter {
    pub fn new(printer: impl Into<String>) -> Self {
        Self {
            printer: printer.into(),
        }
    }
}

impl PrintSink for CupsPrinter {
    fn submit(&self, path: &Path, title: &str) -> Result<(), PrintError> {
        let stdout = run(Command::new("lp")
            .arg("-d")
            .arg(&self.printer)
            .arg("-t")
            .arg(title)
            .arg(path))?;
        log::info!("submitted {} to {}: {}", path.display(), self.printer, stdout.trim());
        Ok(())
    }
}

/// Enumerates CUPS destinations with `lpstat -e`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CupsDirectory;

impl PrinterDirectory for CupsDirectory {
    fn printers(&self) -> Result<Vec<String>, PrintError> {
        run(Command::new("lpstat").arg("-e")).map(|stdout| parse_destinations(&stdout))
    }
}

/// One destination name per non-blank line, in listed order.
fn parse_destinations(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Result of a print request.
#[derive(Debug)]
pub struct PrintOutcome {
    /// Where the label file was written. It stays there after printing.
    pub path: PathBuf,
    pub report: RenderReport,
    /// `None` when the job was accepted.
    pub failure: Option<PrintError>,
}

impl PrintOutcome {
    pub fn submitted(&self) -> bool {
        self.failure.is_none()
    }
}

/// Render `record` to a file and submit it once to `sink`.
///
/// A render failure is returned as an error, since there is nothing to
/// print. A submission failure is reported in the outcome with the file
/// kept on disk.
pub fn print_label(
    engine: &LabelEngine,
    sink: &dyn PrintSink,
    record: &LabelRecord,
    canvas: &CanvasSpec,
    mode: &LayoutMode,
    backend: Backend,
    out: Option<&Path>,
) -> Result<PrintOutcome, PrintError> {
    let (path, report) = engine.render_to_file(record, canvas, mode, backend, out)?;

    let failure = sink.submit(&path, DEFAULT_JOB_TITLE).err();
    if let Some(e) = &failure {
        log::warn!("print failed, label kept at {}: {}", path.display(), e);
    }

    Ok(PrintOutcome {
        path,
        report,
        failure,
    })
}
