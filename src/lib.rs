//! Draw connect-the-dots edge lists and campus shortest paths onto a
//! raster canvas, and export the result as PNG, SVG or PDF.

pub mod edge_list;
pub mod export;
pub mod fetch;
pub mod geometry;
pub mod image_loader;
pub mod path;
pub mod render;
pub mod session;
pub mod style;
mod xml;

pub use edge_list::{Diagnostic, DiagnosticKind, ParseResult, parse};
pub use geometry::{Edge, GridSpec, Point, map_coordinate};
pub use path::{Markers, PathOverlay, PathStructure, Segment, convert_path};
pub use render::{CanvasRenderer, RenderState};

use std::fmt;

use log::LevelFilter;

/// Error returned from the binaries' `main`.
///
/// The runtime prints a failed `main` with `Debug`, so `Debug` shows the
/// message as-is. Multi-line notifications keep their line breaks.
pub struct CliError(String);

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.trim_end())
    }
}

impl std::error::Error for CliError {}

impl From<String> for CliError {
    fn from(message: String) -> Self {
        CliError(message)
    }
}

impl From<&str> for CliError {
    fn from(message: &str) -> Self {
        CliError(message.to_string())
    }
}

/// Initialise the `env_logger` backend. `RUST_LOG` overrides the default
/// level.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}
