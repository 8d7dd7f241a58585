use campus_canvas::export;
use campus_canvas::geometry::GridSpec;
use campus_canvas::image_loader::ImageLoader;
use campus_canvas::render::CanvasRenderer;
use campus_canvas::session::{DotsEvent, DotsState};
use campus_canvas::style::Style;
use campus_canvas::CliError;
use clap::Parser;
use std::path::PathBuf;

/// Connect the dots: draw an edge list over a dot grid
#[derive(Parser, Debug)]
#[command(name = "dots")]
#[command(version)]
#[command(about = "Draw an edge list over a dot grid and save it as PNG, SVG or PDF", long_about = None)]
struct Args {
    /// Edge list file, one "x1,y1 x2,y2 color" per line (use "-" for stdin)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file path (extension determines format: .svg, .png or .pdf)
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Number of dots along each side of the grid
    #[arg(short, long, default_value_t = 4)]
    size: u32,

    /// Style file (TOML or YAML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Background image drawn under the grid (defaults to the style's grid_background)
    #[arg(long, value_name = "IMAGE")]
    background: Option<PathBuf>,

    /// Draw without a background image
    #[arg(long, conflicts_with = "background")]
    no_background: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), CliError> {
    let args = Args::parse();
    campus_canvas::init_logging(args.verbose);

    let style = match args.config {
        Some(ref path) => Style::load(path)?,
        None => Style::default(),
    };

    // Start the decode first so it overlaps with reading and parsing input.
    let loader = if args.no_background {
        None
    } else {
        let path = args
            .background
            .clone()
            .unwrap_or_else(|| PathBuf::from(&style.grid_background));
        Some(ImageLoader::spawn(path))
    };

    let edge_text = if args.input.to_str() == Some("-") {
        let mut buffer = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        buffer
    } else {
        std::fs::read_to_string(&args.input)
            .map_err(|e| format!("Failed to read input file: {}", e))?
    };

    let grid = GridSpec::new(args.size, style.canvas_width, style.canvas_height)?;
    let mut renderer = CanvasRenderer::new(style)?;
    let mut state = DotsState::new(grid);

    let events = [DotsEvent::EdgeTextChanged(edge_text), DotsEvent::Draw];
    for event in events {
        let transition = state.apply(event);
        if let Some(message) = transition.notification {
            return Err(message.into());
        }
        state = transition.state;
    }

    if let Some(background) = loader.and_then(ImageLoader::wait) {
        state = state.apply(DotsEvent::BackgroundReady(background)).state;
    }

    let render_state = state.render_state();
    renderer.redraw(&render_state, Some(&state.grid))?;
    export::save(&renderer, &render_state, Some(&state.grid), &args.output)?;
    Ok(())
}
