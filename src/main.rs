//! # Eticheta CLI
//!
//! Command-line interface for rendering and printing barcode labels.
//!
//! ## Usage
//!
//! ```bash
//! # Render a reel label as PNG (default preset)
//! eticheta render "A012345|50|REEL-042"
//!
//! # Use the built-in DejaVu Sans Bold instead of system fonts
//! eticheta render --bundled-font "A012345|50|REEL-042"
//!
//! # Render the PDF variant to a chosen file
//! eticheta render --preset reel-pdf --out label.pdf "A012345|50|REEL-042"
//!
//! # Render and send to a CUPS printer
//! eticheta print --printer Zebra_GK420 "A012345|50|REEL-042"
//!
//! # List printers
//! eticheta printers
//!
//! # Show computed zone geometry as JSON
//! eticheta layout --preset single --fields 1
//! ```
//!
//! Set `RUST_LOG=debug` for layout and encoding details.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use eticheta::{
    Backend, EtichetaError, LabelEngine, LabelPreset,
    canvas::OutputKind,
    font::{Bundled, FontFiles, FontSource, SystemFonts},
    layout,
    printer::{self, CupsDirectory, CupsPrinter, PrinterDirectory},
    record::{self, MAX_FIELDS},
    render::RenderReport,
    symbol::ArtifactStore,
};

/// Eticheta - Barcode label renderer
#[derive(Parser, Debug)]
#[command(name = "eticheta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a label to a PNG or PDF file
    Render {
        /// Label data, fields separated by '|'
        data: String,

        #[command(flatten)]
        options: RenderArgs,
    },

    /// Render a label and submit it to a printer
    Print {
        /// Label data, fields separated by '|'
        data: String,

        /// CUPS printer name
        #[arg(long)]
        printer: String,

        #[command(flatten)]
        options: RenderArgs,
    },

    /// List available printers
    Printers,

    /// Print the computed layout as JSON
    Layout {
        /// Label preset
        #[arg(long, default_value = "reel", value_parser = parse_preset)]
        preset: LabelPreset,

        /// Number of fields to lay out
        #[arg(long, default_value_t = MAX_FIELDS)]
        fields: usize,
    },
}

#[derive(clap::Args, Debug)]
struct RenderArgs {
    /// Label preset (reel, reel-pdf, single)
    #[arg(long, default_value = "reel", value_parser = parse_preset)]
    preset: LabelPreset,

    /// Output format (defaults to the preset's format)
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Output file (defaults to label_<timestamp>_<suffix>.<ext>)
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// TrueType font for label text (defaults to system DejaVu Sans)
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// TrueType font for names and captions (defaults to --font)
    #[arg(long, value_name = "FILE", requires = "font")]
    bold_font: Option<PathBuf>,

    /// Use the font compiled into the binary
    #[arg(long, conflicts_with = "font")]
    bundled_font: bool,

    /// Directory for transient barcode files (in memory when omitted)
    #[arg(long, value_name = "DIR")]
    store_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Png,
    Pdf,
}

fn parse_preset(name: &str) -> Result<LabelPreset, String> {
    LabelPreset::by_name(name).ok_or_else(|| {
        let known: Vec<_> = LabelPreset::ALL.iter().map(|p| p.name()).collect();
        format!("unknown preset '{}' (expected one of: {})", name, known.join(", "))
    })
}

impl RenderArgs {
    fn backend(&self) -> Backend {
        match self.format {
            Some(Format::Png) => Backend::Raster,
            Some(Format::Pdf) => Backend::Vector,
            None => Backend::from(self.preset.output()),
        }
    }

    fn engine(&self) -> LabelEngine {
        let fonts: Arc<dyn FontSource> = match (&self.font, &self.bold_font) {
            (Some(path), Some(bold)) => Arc::new(FontFiles::new(path).with_bold(bold)),
            (Some(path), None) => Arc::new(FontFiles::new(path)),
            (None, _) if self.bundled_font => Arc::new(Bundled),
            (None, _) => Arc::new(SystemFonts::default()),
        };
        let store = match &self.store_dir {
            Some(dir) => ArtifactStore::in_dir(dir),
            None => ArtifactStore::in_memory(),
        };
        LabelEngine::new(fonts, store)
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), EtichetaError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render { data, options } => {
            let parsed = record::parse(&data);
            warn_parse(&parsed.degraded);

            let preset = options.preset;
            let (path, report) = options.engine().render_to_file(
                &parsed.record,
                &preset.canvas(),
                &preset.layout(),
                options.backend(),
                options.out.as_deref(),
            )?;
            summarize(&report);
            println!("Saved to {}", path.display());
        }

        Commands::Print {
            data,
            printer: name,
            options,
        } => {
            let parsed = record::parse(&data);
            warn_parse(&parsed.degraded);

            let preset = options.preset;
            let sink = CupsPrinter::new(&name);
            let outcome = printer::print_label(
                &options.engine(),
                &sink,
                &parsed.record,
                &preset.canvas(),
                &preset.layout(),
                options.backend(),
                options.out.as_deref(),
            )?;
            summarize(&outcome.report);

            match outcome.failure {
                None => println!("Printed {} on {}", outcome.path.display(), name),
                Some(e) => {
                    println!("Label kept at {}", outcome.path.display());
                    return Err(e.into());
                }
            }
        }

        Commands::Printers => {
            let printers = CupsDirectory.printers()?;
            if printers.is_empty() {
                println!("No printers found.");
            }
            for name in printers {
                println!("  {}", name);
            }
        }

        Commands::Layout { preset, fields } => {
            let canvas = preset.canvas();
            let extent = match preset.output() {
                OutputKind::Png => canvas.pixel_extent(),
                OutputKind::Pdf => canvas.point_extent(),
            };
            let geometry = layout::compute(&extent, fields, &preset.layout())?;
            println!("{}", serde_json::to_string_pretty(&geometry)?);
        }
    }

    Ok(())
}

fn warn_parse(degraded: &record::ParseDegraded) {
    if !degraded.is_clean() {
        eprintln!(
            "Warning: missing fields {:?}, discarded segments {:?}",
            degraded.missing, degraded.discarded
        );
    }
}

fn summarize(report: &RenderReport) {
    for row in &report.rows {
        println!("  {} {:?}", row.name, row.content);
    }
    if report.is_degraded() {
        for d in &report.degradations {
            eprintln!("Warning: {:?}", d);
        }
        println!("Rendered with {} warning(s)", report.degradations.len());
    } else {
        println!("Rendered cleanly");
    }
}
