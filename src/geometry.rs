/// A pixel or grid location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A colored segment between two points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
    pub color: String,
}

impl Edge {
    pub fn new(start: Point, end: Point, color: impl Into<String>) -> Self {
        Self {
            x1: start.x,
            y1: start.y,
            x2: end.x,
            y2: end.y,
            color: color.into(),
        }
    }

    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }
}

/// Dot count and canvas dimensions of a connect-the-dots grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    size: u32,
    width: u32,
    height: u32,
}

impl GridSpec {
    pub fn new(size: u32, width: u32, height: u32) -> Result<Self, String> {
        if size == 0 {
            return Err("Grid size must be at least 1".to_string());
        }
        if width == 0 || height == 0 {
            return Err(format!("Invalid canvas size: {}x{}", width, height));
        }
        // Past one dot per pixel the grid is unreadable and its dot list
        // grows with size squared.
        if size > width.min(height) {
            return Err(format!(
                "Grid size {} is too large for a {}x{} canvas",
                size, width, height
            ));
        }
        Ok(Self {
            size,
            width,
            height,
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel position of the grid point `(x, y)`.
    pub fn map(&self, x: u32, y: u32) -> (f32, f32) {
        map_coordinate(x, y, self.size, self.width, self.height)
    }

    /// Every dot position, column by column.
    pub fn points(&self) -> Vec<(f32, f32)> {
        let mut points = Vec::with_capacity((self.size as usize).saturating_mul(self.size as usize));
        for x in 0..self.size {
            for y in 0..self.size {
                points.push(self.map(x, y));
            }
        }
        points
    }

    pub fn dot_radius(&self) -> f32 {
        dot_radius(self.size)
    }
}

/// Maps a grid coordinate to its pixel position, leaving one cell of margin
/// on every side of the canvas.
///
/// `size` must be non-zero; `GridSpec` guarantees this for callers going
/// through it.
pub fn map_coordinate(x: u32, y: u32, size: u32, width: u32, height: u32) -> (f32, f32) {
    let cells = size as f64 + 1.0;
    let px = width as f64 / cells * (x as f64 + 1.0);
    let py = height as f64 / cells * (y as f64 + 1.0);
    (px as f32, py as f32)
}

/// Dot radius (and grid line width): 4px, shrinking once the grid is dense
/// enough that neighbouring dots would touch.
pub fn dot_radius(size: u32) -> f32 {
    (100.0 / size.max(1) as f32).min(4.0)
}
