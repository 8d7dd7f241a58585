use campus_canvas::export;
use campus_canvas::fetch::{self, PathClient, PendingRequest};
use campus_canvas::image_loader::ImageLoader;
use campus_canvas::render::CanvasRenderer;
use campus_canvas::session::{CampusEvent, CampusState, Command};
use campus_canvas::style::Style;
use campus_canvas::CliError;
use clap::Parser;
use std::path::PathBuf;

/// Campus paths: overlay a shortest path on the campus map
#[derive(Parser, Debug)]
#[command(name = "campus-map")]
#[command(version)]
#[command(about = "Draw the shortest path between two campus buildings", long_about = None)]
struct Args {
    /// Short name of the starting building
    #[arg(long, value_name = "BUILDING", required_unless_present_any = ["list_buildings", "path_json"])]
    src: Option<String>,

    /// Short name of the destination building
    #[arg(long, value_name = "BUILDING", required_unless_present_any = ["list_buildings", "path_json"])]
    dst: Option<String>,

    /// Output file path (extension determines format: .svg, .png or .pdf)
    #[arg(short, long, value_name = "OUTPUT", required_unless_present = "list_buildings")]
    output: Option<PathBuf>,

    /// Print the building short names offered by the server and exit
    #[arg(long)]
    list_buildings: bool,

    /// Draw a saved path response instead of asking the server
    #[arg(long, value_name = "JSON", conflicts_with_all = ["src", "dst", "list_buildings"])]
    path_json: Option<PathBuf>,

    /// Path server base URL (defaults to the style's server_url)
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Style file (TOML or YAML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Map image drawn under the path (defaults to the style's map_background)
    #[arg(long, value_name = "IMAGE")]
    background: Option<PathBuf>,

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
    let client = PathClient::new(args.server.clone().unwrap_or_else(|| style.server_url.clone()));

    if args.list_buildings {
        let buildings = client.buildings().map_err(|e| e.to_string())?;
        for name in buildings.short_names() {
            match buildings.describe(name) {
                Some(description) => println!("{}\t{}", name, description),
                None => println!("{}", name),
            }
        }
        return Ok(());
    }

    let output = args.output.clone().ok_or("An output file is required")?;
    let loader = ImageLoader::spawn(
        args.background
            .clone()
            .unwrap_or_else(|| PathBuf::from(&style.map_background)),
    );

    let mut state = CampusState::new(style.path_color.clone());

    if let Some(ref json_path) = args.path_json {
        let body = std::fs::read_to_string(json_path)
            .map_err(|e| format!("Failed to read path file: {}", e))?;
        let generation = state.latest_request();
        state = step(
            state,
            CampusEvent::PathLoaded {
                generation,
                result: fetch::decode_path(&body),
            },
        )?;
    } else {
        let source = args.src.clone().unwrap_or_default();
        let destination = args.dst.clone().unwrap_or_default();

        state = step(state, CampusEvent::BuildingsLoaded(client.buildings()))?;
        if let Some(ref buildings) = state.buildings {
            for name in [&source, &destination] {
                if !buildings.contains(name) {
                    return Err(format!("Unknown building: {}", name).into());
                }
            }
        }

        state = step(state, CampusEvent::SourceChanged(source))?;
        state = step(state, CampusEvent::DestinationChanged(destination))?;

        let transition = state.apply(CampusEvent::Go);
        state = transition.state;
        if let Some(Command::FetchPath {
            generation,
            source,
            destination,
        }) = transition.command
        {
            let worker = client.clone();
            let request = PendingRequest::spawn(generation, move || {
                worker.path(&source, &destination)
            });
            if let Some(result) = request.wait() {
                state = step(state, CampusEvent::PathLoaded { generation, result })?;
            }
        } else {
            log::info!("source and destination are the same building; nothing to draw");
        }
    }

    if let Some(background) = loader.wait() {
        state = step(state, CampusEvent::BackgroundReady(background))?;
    }

    let render_state = state.render_state();
    let mut renderer = CanvasRenderer::new(style)?;
    renderer.redraw(&render_state, None)?;
    export::save(&renderer, &render_state, None, &output)?;
    Ok(())
}

/// Applies one event, turning a user notification into the program's error.
fn step(state: CampusState, event: CampusEvent) -> Result<CampusState, String> {
    let transition = state.apply(event);
    match transition.notification {
        Some(message) => Err(message),
        None => Ok(transition.state),
    }
}
