use std::path::Path;

use crate::geometry::GridSpec;
use crate::render::{CanvasRenderer, RenderState};

/// Output formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Png,
    Svg,
    Pdf,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self, String> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or("Output file has no extension")?
            .to_ascii_lowercase();

        match ext.as_str() {
            "png" => Ok(Format::Png),
            "svg" => Ok(Format::Svg),
            "pdf" => Ok(Format::Pdf),
            _ => Err(format!(
                "Unsupported output format: .{} (use .svg, .png or .pdf)",
                ext
            )),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Png => "PNG",
            Format::Svg => "SVG",
            Format::Pdf => "PDF",
        }
    }
}

/// Writes the current scene to `output`. PNG uses the already rendered
/// canvas; SVG and PDF rebuild the scene as vectors.
pub fn save(
    renderer: &CanvasRenderer,
    state: &RenderState,
    grid: Option<&GridSpec>,
    output: &Path,
) -> Result<(), String> {
    let format = Format::from_path(output)?;
    let bytes = encode(renderer, state, grid, format)?;
    std::fs::write(output, bytes)
        .map_err(|e| format!("Failed to write {}: {}", format.name(), e))?;
    eprintln!("{} saved to: {}", format.name(), output.display());
    Ok(())
}

pub fn encode(
    renderer: &CanvasRenderer,
    state: &RenderState,
    grid: Option<&GridSpec>,
    format: Format,
) -> Result<Vec<u8>, String> {
    match format {
        Format::Png => renderer
            .pixmap()
            .encode_png()
            .map_err(|e| format!("Failed to encode PNG: {}", e)),
        Format::Svg => renderer.scene_svg(state, grid).map(String::into_bytes),
        Format::Pdf => svg_to_pdf(&renderer.scene_svg(state, grid)?),
    }
}

fn svg_to_pdf(svg: &str) -> Result<Vec<u8>, String> {
    let opts = svg2pdf::usvg::Options::default();
    let tree = svg2pdf::usvg::Tree::from_str(svg, &opts)
        .map_err(|e| format!("Failed to parse SVG: {}", e))?;

    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| format!("Failed to convert SVG to PDF: {}", e))
}
