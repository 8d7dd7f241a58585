use std::fmt;

use crate::geometry::{Edge, Point};

const NOTIFICATION_HEADER: &str = "There was an error with some of your line input.\n\
For reference, the correct form for each line is: x1,y1 x2,y2 color\n\n";

/// What is wrong with a single line of edge input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    MissingPortion,
    ExtraPortion,
    FirstCoordinateArity,
    SecondCoordinateArity,
    NonInteger,
    Negative,
}

impl DiagnosticKind {
    fn message(self) -> &'static str {
        match self {
            DiagnosticKind::MissingPortion => "Missing a portion of the line, or missing a space.",
            DiagnosticKind::ExtraPortion => "Extra portion of the line, or an extra space.",
            DiagnosticKind::FirstCoordinateArity => {
                "Wrong number of inputs to the first coordinate."
            }
            DiagnosticKind::SecondCoordinateArity => {
                "Wrong number of inputs to the second coordinate."
            }
            DiagnosticKind::NonInteger => "Coordinate(s) contain non-integer value(s).",
            DiagnosticKind::Negative => "Coordinate(s) contain negative values(s).",
        }
    }
}

/// A line-numbered validation message. `line` is 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.kind.message())
    }
}

/// Outcome of parsing an edge list. At most one of the two lists is
/// non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub edges: Vec<Edge>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// All diagnostics folded into the single message shown to the user, or
    /// `None` when the input was valid.
    pub fn notification(&self) -> Option<String> {
        if self.diagnostics.is_empty() {
            return None;
        }
        let mut message = NOTIFICATION_HEADER.to_string();
        for diagnostic in &self.diagnostics {
            message.push_str(&diagnostic.to_string());
            message.push('\n');
        }
        Some(message)
    }
}

/// Parses one edge per line in the form `x1,y1 x2,y2 color`.
///
/// Every line is checked, so the diagnostics cover the whole input. Edges
/// are only returned when no line produced a diagnostic.
pub fn parse(text: &str) -> ParseResult {
    let mut edges = Vec::new();
    let mut diagnostics = Vec::new();

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = index + 1;
        let mut report = |kind| {
            diagnostics.push(Diagnostic {
                line: line_no,
                kind,
            })
        };

        if let Some(edge) = parse_line(line, &mut report) {
            edges.push(edge);
        }
    }

    if diagnostics.is_empty() {
        log::debug!("parsed {} edge(s)", edges.len());
        ParseResult {
            edges,
            diagnostics,
        }
    } else {
        log::debug!("edge list rejected with {} diagnostic(s)", diagnostics.len());
        ParseResult {
            edges: Vec::new(),
            diagnostics,
        }
    }
}

fn parse_line(line: &str, report: &mut impl FnMut(DiagnosticKind)) -> Option<Edge> {
    let fields: Vec<&str> = line.split(' ').collect();
    if fields.len() < 3 {
        report(DiagnosticKind::MissingPortion);
        return None;
    }
    if fields.len() > 3 {
        report(DiagnosticKind::ExtraPortion);
        return None;
    }

    let color = fields[2];
    if color.is_empty() {
        report(DiagnosticKind::MissingPortion);
        return None;
    }

    let Some((x1, y1)) = split_pair(fields[0]) else {
        report(DiagnosticKind::FirstCoordinateArity);
        return None;
    };
    let Some((x2, y2)) = split_pair(fields[1]) else {
        report(DiagnosticKind::SecondCoordinateArity);
        return None;
    };

    let values = [x1, y1, x2, y2].map(|v| v.parse::<i64>().ok());

    let mut valid = true;
    if values.iter().any(Option::is_none) {
        report(DiagnosticKind::NonInteger);
        valid = false;
    }
    // Fields that failed to parse take no part in the sign check.
    if values.iter().flatten().any(|v| *v < 0) {
        report(DiagnosticKind::Negative);
        valid = false;
    }
    if !valid {
        return None;
    }

    let [Some(x1), Some(y1), Some(x2), Some(y2)] =
        values.map(|v| v.and_then(|v| u32::try_from(v).ok()))
    else {
        report(DiagnosticKind::NonInteger);
        return None;
    };
    Some(Edge::new(Point::new(x1, y1), Point::new(x2, y2), color))
}

fn split_pair(field: &str) -> Option<(&str, &str)> {
    let mut parts = field.split(',');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), None) => Some((a, b)),
        _ => None,
    }
}
