use serde::Deserialize;

const DOT_COLOR: &str = "white";
const PATH_COLOR: &str = "blue";
const SOURCE_COLOR: &str = "LawnGreen";
const DESTINATION_COLOR: &str = "red";

const CANVAS_SIZE: u32 = 500;
const PATH_LINE_WIDTH: f32 = 7.0;
const MARKER_RADIUS: f32 = 7.0;

const GRID_BACKGROUND: &str = "./image.jpg";
const MAP_BACKGROUND: &str = "./campus_map.jpg";
const SERVER_URL: &str = "http://localhost:4567";

/// Colours, sizes and asset locations used when drawing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Style {
    #[serde(default = "default_dot_color")]
    pub dot_color: String,
    #[serde(default = "default_path_color")]
    pub path_color: String,
    #[serde(default = "default_source_color")]
    pub source_color: String,
    #[serde(default = "default_destination_color")]
    pub destination_color: String,

    #[serde(default = "default_canvas_size")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_size")]
    pub canvas_height: u32,
    #[serde(default = "default_path_line_width")]
    pub path_line_width: f32,
    #[serde(default = "default_marker_radius")]
    pub marker_radius: f32,

    #[serde(default = "default_grid_background")]
    pub grid_background: String,
    #[serde(default = "default_map_background")]
    pub map_background: String,
    #[serde(default = "default_server_url")]
    pub server_url: String,
}

fn default_dot_color() -> String {
    DOT_COLOR.to_string()
}
fn default_path_color() -> String {
    PATH_COLOR.to_string()
}
fn default_source_color() -> String {
    SOURCE_COLOR.to_string()
}
fn default_destination_color() -> String {
    DESTINATION_COLOR.to_string()
}
fn default_canvas_size() -> u32 {
    CANVAS_SIZE
}
fn default_path_line_width() -> f32 {
    PATH_LINE_WIDTH
}
fn default_marker_radius() -> f32 {
    MARKER_RADIUS
}
fn default_grid_background() -> String {
    GRID_BACKGROUND.to_string()
}
fn default_map_background() -> String {
    MAP_BACKGROUND.to_string()
}
fn default_server_url() -> String {
    SERVER_URL.to_string()
}

impl Default for Style {
    fn default() -> Self {
        Style {
            dot_color: default_dot_color(),
            path_color: default_path_color(),
            source_color: default_source_color(),
            destination_color: default_destination_color(),
            canvas_width: CANVAS_SIZE,
            canvas_height: CANVAS_SIZE,
            path_line_width: PATH_LINE_WIDTH,
            marker_radius: MARKER_RADIUS,
            grid_background: default_grid_background(),
            map_background: default_map_background(),
            server_url: default_server_url(),
        }
    }
}

impl Style {
    pub fn from_toml(content: &str) -> Result<Self, String> {
        let style: Style =
            toml::from_str(content).map_err(|e| format!("Failed to parse style TOML: {}", e))?;
        style.validated()
    }

    pub fn from_yaml(content: &str) -> Result<Self, String> {
        let style: Style = serde_yaml::from_str(content)
            .map_err(|e| format!("Failed to parse style YAML: {}", e))?;
        style.validated()
    }

    /// Reads a style file, trying TOML first and then YAML.
    pub fn load(path: &std::path::Path) -> Result<Self, String> {
        if !path.is_file() {
            return Err(format!("Style file not found: {}", path.display()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read style file: {}", e))?;

        match Self::from_toml(&content) {
            Ok(style) => Ok(style),
            Err(toml_err) => Self::from_yaml(&content).map_err(|yaml_err| {
                format!(
                    "Failed to parse style file as TOML or YAML ({}; {})",
                    toml_err, yaml_err
                )
            }),
        }
    }

    fn validated(self) -> Result<Self, String> {
        if self
            .source_color
            .eq_ignore_ascii_case(&self.destination_color)
        {
            return Err(format!(
                "Source and destination markers share the colour '{}'",
                self.source_color
            ));
        }
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(format!(
                "Invalid canvas size: {}x{}",
                self.canvas_width, self.canvas_height
            ));
        }
        if !(self.path_line_width.is_finite() && self.path_line_width > 0.0) {
            return Err(format!("Invalid path line width: {}", self.path_line_width));
        }
        if !(self.marker_radius.is_finite() && self.marker_radius > 0.0) {
            return Err(format!("Invalid marker radius: {}", self.marker_radius));
        }
        Ok(self)
    }
}
