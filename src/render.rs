use std::fmt::Write as _;

use base64::Engine as _;
use resvg::usvg;
use tiny_skia::{Color, Pixmap, PixmapPaint, Transform};

use crate::geometry::{Edge, GridSpec, Point};
use crate::image_loader::Background;
use crate::path::Markers;
use crate::style::Style;
use crate::xml::attr;

/// Everything a single redraw reads. Never modified by the renderer.
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub background: Option<Background>,
    pub edges: Vec<Edge>,
    pub markers: Option<Markers>,
}

/// Owns the canvas surface and repaints it from a `RenderState`.
///
/// With a `GridSpec` the renderer is in grid mode: edge coordinates are grid
/// units, dots are drawn, and lines scale with grid density. Without one,
/// edges are already in pixels and are drawn as a path overlay.
pub struct CanvasRenderer {
    style: Style,
    pixmap: Pixmap,
}

impl CanvasRenderer {
    pub fn new(style: Style) -> Result<Self, String> {
        let pixmap = allocate(style.canvas_width, style.canvas_height)?;
        Ok(Self { style, pixmap })
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Clears the canvas and draws background, grid dots, edges and markers,
    /// in that order.
    pub fn redraw(&mut self, state: &RenderState, grid: Option<&GridSpec>) -> Result<(), String> {
        let (width, height) = self.canvas_size(state, grid);
        if self.pixmap.width() != width || self.pixmap.height() != height {
            self.pixmap = allocate(width, height)?;
        }

        self.pixmap.fill(Color::TRANSPARENT);

        if let Some(background) = &state.background {
            let image: &Pixmap = background;
            self.pixmap.draw_pixmap(
                0,
                0,
                image.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }

        let mut body = String::new();
        self.write_overlay(&mut body, state, grid);
        let svg = wrap_svg(width, height, &body);

        let tree = usvg::Tree::from_str(&svg, &usvg::Options::default())
            .map_err(|e| format!("Failed to build canvas scene: {}", e))?;
        resvg::render(&tree, Transform::identity(), &mut self.pixmap.as_mut());

        log::debug!(
            "redrew {}x{} canvas: {} edge(s), markers: {}",
            width,
            height,
            state.edges.len(),
            state.markers.is_some()
        );
        Ok(())
    }

    /// The same scene as `redraw`, as a standalone SVG document with the
    /// background embedded.
    pub fn scene_svg(&self, state: &RenderState, grid: Option<&GridSpec>) -> Result<String, String> {
        let (width, height) = self.canvas_size(state, grid);
        let mut body = String::new();

        if let Some(background) = &state.background {
            let png = background
                .encode_png()
                .map_err(|e| format!("Failed to encode background: {}", e))?;
            let _ = write!(
                body,
                r#"<image x="0" y="0" width="{}" height="{}" xlink:href="data:image/png;base64,{}"/>"#,
                background.width(),
                background.height(),
                base64::engine::general_purpose::STANDARD.encode(png),
            );
        }

        self.write_overlay(&mut body, state, grid);
        Ok(wrap_svg(width, height, &body))
    }

    fn canvas_size(&self, state: &RenderState, grid: Option<&GridSpec>) -> (u32, u32) {
        if let Some(grid) = grid {
            return (grid.width(), grid.height());
        }
        match &state.background {
            Some(background) => (background.width(), background.height()),
            None => (self.style.canvas_width, self.style.canvas_height),
        }
    }

    fn write_overlay(&self, out: &mut String, state: &RenderState, grid: Option<&GridSpec>) {
        match grid {
            Some(grid) => {
                let radius = grid.dot_radius();
                for (x, y) in grid.points() {
                    circle(out, x, y, radius, &self.style.dot_color);
                }
                for edge in &state.edges {
                    let (x1, y1) = grid.map(edge.x1, edge.y1);
                    let (x2, y2) = grid.map(edge.x2, edge.y2);
                    line(out, (x1, y1), (x2, y2), &edge.color, radius);
                }
            }
            None => {
                let width = self.style.path_line_width;
                for edge in &state.edges {
                    line(out, pixel(edge.start()), pixel(edge.end()), &edge.color, width);
                }
                for edge in &state.edges {
                    let (x, y) = pixel(edge.start());
                    circle(out, x, y, self.style.marker_radius, &edge.color);
                }
            }
        }

        if let Some(markers) = &state.markers {
            let (x, y) = pixel(markers.source);
            circle(out, x, y, self.style.marker_radius, &self.style.source_color);
            let (x, y) = pixel(markers.destination);
            circle(
                out,
                x,
                y,
                self.style.marker_radius,
                &self.style.destination_color,
            );
        }
    }
}

fn allocate(width: u32, height: u32) -> Result<Pixmap, String> {
    Pixmap::new(width, height)
        .ok_or_else(|| format!("Unable to create canvas drawing surface ({}x{})", width, height))
}

fn pixel(point: Point) -> (f32, f32) {
    (point.x as f32, point.y as f32)
}

fn circle(out: &mut String, cx: f32, cy: f32, r: f32, fill: &str) {
    let _ = write!(
        out,
        r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}"/>"#,
        cx,
        cy,
        r,
        attr(fill)
    );
}

fn line(out: &mut String, from: (f32, f32), to: (f32, f32), stroke: &str, width: f32) {
    let _ = write!(
        out,
        r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{:.2}"/>"#,
        from.0,
        from.1,
        to.0,
        to.1,
        attr(stroke),
        width
    );
}

fn wrap_svg(width: u32, height: u32, body: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">{body}</svg>"#,
        w = width,
        h = height,
        body = body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge_list::parse;
    use crate::path::{PathStructure, convert_path};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn grid_state(text: &str) -> RenderState {
        RenderState {
            edges: parse(text).edges,
            ..RenderState::default()
        }
    }

    fn rgba(pixmap: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let p = pixmap.pixel(x, y).unwrap();
        (p.red(), p.green(), p.blue(), p.alpha())
    }

    fn sample_path() -> RenderState {
        let path = PathStructure::from_json(
            r#"{"path":[
                {"start":{"x":20,"y":20},"end":{"x":80,"y":20}},
                {"start":{"x":80,"y":20},"end":{"x":80,"y":90}}
            ]}"#,
        )
        .unwrap();
        let overlay = convert_path(&path, "blue");
        RenderState {
            background: None,
            edges: overlay.edges,
            markers: overlay.markers,
        }
    }

    #[test]
    fn grid_mode_draws_dots_at_mapped_positions() {
        let mut renderer = CanvasRenderer::new(Style::default()).unwrap();
        let grid = GridSpec::new(4, 500, 500).unwrap();
        renderer.redraw(&RenderState::default(), Some(&grid)).unwrap();

        assert_eq!(rgba(renderer.pixmap(), 100, 100), (255, 255, 255, 255));
        assert_eq!(rgba(renderer.pixmap(), 400, 300), (255, 255, 255, 255));
        assert_eq!(rgba(renderer.pixmap(), 150, 150).3, 0);
    }

    #[test]
    fn grid_edges_are_mapped_before_stroking() {
        let mut renderer = CanvasRenderer::new(Style::default()).unwrap();
        let grid = GridSpec::new(4, 500, 500).unwrap();
        renderer.redraw(&grid_state("0,0 3,0 red"), Some(&grid)).unwrap();

        let (r, g, b, a) = rgba(renderer.pixmap(), 250, 100);
        assert_eq!(a, 255);
        assert!(r > 200 && g < 50 && b < 50);
        assert_eq!(rgba(renderer.pixmap(), 250, 200).3, 0);
    }

    #[test]
    fn redraw_is_idempotent() {
        let mut renderer = CanvasRenderer::new(Style::default()).unwrap();
        let grid = GridSpec::new(5, 300, 300).unwrap();
        let state = grid_state("0,0 4,4 red\n1,3 3,1 #00aa00");

        renderer.redraw(&state, Some(&grid)).unwrap();
        let first = renderer.pixmap().clone();
        renderer.redraw(&state, Some(&grid)).unwrap();
        assert_eq!(first.data(), renderer.pixmap().data());
    }

    #[test]
    fn redraw_does_not_accumulate() {
        let grid = GridSpec::new(4, 200, 200).unwrap();

        let mut fresh = CanvasRenderer::new(Style::default()).unwrap();
        fresh.redraw(&RenderState::default(), Some(&grid)).unwrap();

        let mut reused = CanvasRenderer::new(Style::default()).unwrap();
        reused.redraw(&grid_state("0,0 3,3 red"), Some(&grid)).unwrap();
        reused.redraw(&RenderState::default(), Some(&grid)).unwrap();

        assert_eq!(fresh.pixmap().data(), reused.pixmap().data());
    }

    #[test]
    fn markers_are_drawn_over_edges() {
        let mut renderer = CanvasRenderer::new(Style::default()).unwrap();
        renderer.redraw(&sample_path(), None).unwrap();

        // LawnGreen source, red destination, blue path in between.
        assert_eq!(rgba(renderer.pixmap(), 20, 20), (124, 252, 0, 255));
        assert_eq!(rgba(renderer.pixmap(), 80, 90), (255, 0, 0, 255));
        assert_eq!(rgba(renderer.pixmap(), 50, 20), (0, 0, 255, 255));
    }

    #[test]
    fn path_mode_canvas_takes_background_size() {
        let mut background = Pixmap::new(120, 90).unwrap();
        background.fill(Color::from_rgba8(40, 40, 40, 255));

        let mut state = sample_path();
        state.background = Some(Arc::new(background));

        let mut renderer = CanvasRenderer::new(Style::default()).unwrap();
        renderer.redraw(&state, None).unwrap();
        assert_eq!((renderer.pixmap().width(), renderer.pixmap().height()), (120, 90));
        assert_eq!(rgba(renderer.pixmap(), 110, 80), (40, 40, 40, 255));

        state.background = None;
        renderer.redraw(&state, None).unwrap();
        assert_eq!((renderer.pixmap().width(), renderer.pixmap().height()), (500, 500));
    }

    #[test]
    fn scene_svg_embeds_background_and_overlay() {
        let mut background = Pixmap::new(8, 8).unwrap();
        background.fill(Color::WHITE);
        let mut state = sample_path();
        state.background = Some(Arc::new(background));

        let renderer = CanvasRenderer::new(Style::default()).unwrap();
        let svg = renderer.scene_svg(&state, None).unwrap();
        assert!(svg.contains("data:image/png;base64,"));
        assert!(svg.contains(r#"stroke="blue""#));
        assert!(svg.contains(r#"fill="LawnGreen""#));
        assert!(usvg::Tree::from_str(&svg, &usvg::Options::default()).is_ok());
    }

    #[test]
    fn hostile_colour_tokens_stay_inside_attribute() {
        let mut renderer = CanvasRenderer::new(Style::default()).unwrap();
        let grid = GridSpec::new(3, 100, 100).unwrap();
        let state = grid_state("0,0 1,1 red\"/><script>");
        assert!(renderer.redraw(&state, Some(&grid)).is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn identical_state_renders_identical_pixels(
            size in 1u32..12,
            coords in prop::collection::vec((0u32..12, 0u32..12, 0u32..12, 0u32..12), 0..6),
        ) {
            let text: Vec<String> = coords
                .iter()
                .map(|(a, b, c, d)| format!("{},{} {},{} orange", a, b, c, d))
                .collect();
            let state = grid_state(&text.join("\n"));
            let grid = GridSpec::new(size, 120, 120).unwrap();

            let mut renderer = CanvasRenderer::new(Style::default()).unwrap();
            renderer.redraw(&state, Some(&grid)).unwrap();
            let first = renderer.pixmap().clone();
            renderer.redraw(&state, Some(&grid)).unwrap();
            prop_assert_eq!(first.data(), renderer.pixmap().data());
        }
    }
}
