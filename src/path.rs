use std::collections::BTreeMap;

use serde::Deserialize;

use crate::geometry::{Edge, Point};

/// A coordinate as sent by the path server: a JSON number or a numeric
/// string. Fractional values truncate toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawCoordinate")]
struct Coordinate(u32);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCoordinate {
    Number(f64),
    Text(String),
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = String;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        let value = match raw {
            RawCoordinate::Number(n) => n,
            RawCoordinate::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("coordinate {:?} is not a number", s))?,
        };
        if !value.is_finite() {
            return Err(format!("coordinate {} is not finite", value));
        }
        let truncated = value.trunc();
        if truncated < 0.0 || truncated > u32::MAX as f64 {
            return Err(format!("coordinate {} is out of range", value));
        }
        Ok(Coordinate(truncated as u32))
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct WirePoint {
    x: Coordinate,
    y: Coordinate,
}

impl From<WirePoint> for Point {
    fn from(p: WirePoint) -> Self {
        Point::new(p.x.0, p.y.0)
    }
}

/// A directed sub-path between two pixel locations on the map.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "WireSegment")]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub cost: Option<f64>,
}

#[derive(Deserialize)]
struct WireSegment {
    start: WirePoint,
    end: WirePoint,
    #[serde(default)]
    cost: Option<f64>,
}

impl From<WireSegment> for Segment {
    fn from(s: WireSegment) -> Self {
        Segment {
            start: s.start.into(),
            end: s.end.into(),
            cost: s.cost,
        }
    }
}

/// Shortest path returned by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "WirePath")]
pub struct PathStructure {
    pub segments: Vec<Segment>,
    pub cost: Option<f64>,
    pub start: Option<Point>,
}

#[derive(Deserialize)]
struct WirePath {
    path: Vec<Segment>,
    #[serde(default)]
    cost: Option<f64>,
    #[serde(default)]
    start: Option<WirePoint>,
}

impl From<WirePath> for PathStructure {
    fn from(p: WirePath) -> Self {
        PathStructure {
            segments: p.path,
            cost: p.cost,
            start: p.start.map(Point::from),
        }
    }
}

impl PathStructure {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            cost: None,
            start: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Malformed path payload: {}", e))
    }
}

/// Building short names mapped to their (opaque) descriptions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct BuildingMap(BTreeMap<String, serde_json::Value>);

impl BuildingMap {
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Malformed buildings payload: {}", e))
    }

    /// Short names in sorted order.
    pub fn short_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn contains(&self, short_name: &str) -> bool {
        self.0.contains_key(short_name)
    }

    pub fn describe(&self, short_name: &str) -> Option<String> {
        self.0.get(short_name).map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Endpoints of a drawn path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markers {
    pub source: Point,
    pub destination: Point,
}

/// Renderable form of a path: one edge per segment plus endpoint markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathOverlay {
    pub edges: Vec<Edge>,
    pub markers: Option<Markers>,
}

/// Converts a server path into edges of the given colour. An empty path
/// yields no edges and no markers.
pub fn convert_path(path: &PathStructure, color: &str) -> PathOverlay {
    let edges: Vec<Edge> = path
        .segments
        .iter()
        .map(|segment| Edge::new(segment.start, segment.end, color))
        .collect();

    let markers = match (path.segments.first(), path.segments.last()) {
        (Some(first), Some(last)) => Some(Markers {
            source: first.start,
            destination: last.end,
        }),
        _ => None,
    };

    PathOverlay { edges, markers }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_string_coordinates() {
        let path = PathStructure::from_json(
            r#"{"path":[{"start":{"x":"10","y":"20"},"end":{"x":"30","y":"40"}}]}"#,
        )
        .unwrap();
        let overlay = convert_path(&path, "blue");
        assert_eq!(
            overlay.edges,
            vec![Edge {
                x1: 10,
                y1: 20,
                x2: 30,
                y2: 40,
                color: "blue".to_string(),
            }]
        );
        assert_eq!(
            overlay.markers,
            Some(Markers {
                source: Point::new(10, 20),
                destination: Point::new(30, 40),
            })
        );
    }

    #[test]
    fn empty_path_has_no_markers() {
        let path = PathStructure::from_json(r#"{"path": []}"#).unwrap();
        let overlay = convert_path(&path, "blue");
        assert!(overlay.edges.is_empty());
        assert_eq!(overlay.markers, None);
    }

    #[test]
    fn markers_span_first_start_to_last_end() {
        let path = PathStructure::from_json(
            r#"{
                "cost": 12.5,
                "start": {"x": 1900.7, "y": 1400.2},
                "path": [
                    {"start": {"x": 1900.7, "y": 1400.2}, "end": {"x": 1950.0, "y": 1410.9}, "cost": 5.0},
                    {"start": {"x": 1950.0, "y": 1410.9}, "end": {"x": 2000.1, "y": 1500.5}, "cost": 7.5}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(path.cost, Some(12.5));
        assert_eq!(path.start, Some(Point::new(1900, 1400)));
        assert_eq!(path.segments[0].cost, Some(5.0));

        let overlay = convert_path(&path, "blue");
        assert_eq!(overlay.edges.len(), 2);
        assert_eq!(overlay.edges[1].start(), Point::new(1950, 1410));
        let markers = overlay.markers.unwrap();
        assert_eq!(markers.source, Point::new(1900, 1400));
        assert_eq!(markers.destination, Point::new(2000, 1500));
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(PathStructure::from_json(r#"{"segments": []}"#).is_err());
        assert!(PathStructure::from_json(r#"{"path": [{"start": {"x": 1}}]}"#).is_err());
        assert!(
            PathStructure::from_json(
                r#"{"path":[{"start":{"x":"ten","y":"0"},"end":{"x":"1","y":"1"}}]}"#
            )
            .is_err()
        );
        assert!(
            PathStructure::from_json(
                r#"{"path":[{"start":{"x":-4,"y":0},"end":{"x":1,"y":1}}]}"#
            )
            .is_err()
        );
    }

    #[test]
    fn buildings_enumerate_sorted() {
        let buildings = BuildingMap::from_json(
            r#"{"MGH": "Mary Gates Hall", "CSE": "Paul G. Allen Center", "BAG": "Bagley Hall"}"#,
        )
        .unwrap();
        let names: Vec<&str> = buildings.short_names().collect();
        assert_eq!(names, vec!["BAG", "CSE", "MGH"]);
        assert!(buildings.contains("CSE"));
        assert_eq!(buildings.describe("MGH").as_deref(), Some("Mary Gates Hall"));
        assert!(BuildingMap::from_json("[1, 2]").is_err());
    }
}
