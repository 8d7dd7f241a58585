//! Session state as immutable snapshots.
//!
//! Each user action or load completion is an event; applying it to a state
//! yields the next state plus anything the caller must act on: a message to
//! show the user, or a request to start.

use crate::edge_list;
use crate::fetch::{FetchError, Generation};
use crate::geometry::{Edge, GridSpec};
use crate::image_loader::Background;
use crate::path::{BuildingMap, PathOverlay, PathStructure, convert_path};
use crate::render::RenderState;

/// Result of applying one event.
#[derive(Debug, Clone)]
pub struct Transition<S> {
    pub state: S,
    /// A blocking message for the user (validation or transport failure).
    pub notification: Option<String>,
    pub command: Option<Command>,
    /// Whether the canvas must be redrawn.
    pub redraw: bool,
}

impl<S> Transition<S> {
    fn unchanged(state: S) -> Self {
        Self {
            state,
            notification: None,
            command: None,
            redraw: false,
        }
    }

    fn changed(state: S) -> Self {
        Self {
            state,
            notification: None,
            command: None,
            redraw: true,
        }
    }

    fn notify(state: S, message: String) -> Self {
        Self {
            state,
            notification: Some(message),
            command: None,
            redraw: false,
        }
    }
}

/// Work the caller must start on behalf of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchPath {
        generation: Generation,
        source: String,
        destination: String,
    },
}

#[derive(Debug, Clone)]
pub enum DotsEvent {
    GridSizeChanged(u32),
    EdgeTextChanged(String),
    Draw,
    Clear,
    BackgroundReady(Background),
}

/// Connect-the-dots session: grid, typed edge text, and the last drawn edges.
#[derive(Debug, Clone)]
pub struct DotsState {
    pub grid: GridSpec,
    pub edge_text: String,
    /// Committed edges, in grid units.
    pub edges: Vec<Edge>,
    pub background: Option<Background>,
}

impl DotsState {
    pub fn new(grid: GridSpec) -> Self {
        Self {
            grid,
            edge_text: String::new(),
            edges: Vec::new(),
            background: None,
        }
    }

    pub fn apply(self, event: DotsEvent) -> Transition<Self> {
        match event {
            DotsEvent::GridSizeChanged(size) => {
                match GridSpec::new(size, self.grid.width(), self.grid.height()) {
                    Ok(grid) if grid == self.grid => Transition::unchanged(self),
                    Ok(grid) => Transition::changed(Self { grid, ..self }),
                    Err(e) => Transition::notify(self, e),
                }
            }
            DotsEvent::EdgeTextChanged(edge_text) => {
                Transition::unchanged(Self { edge_text, ..self })
            }
            DotsEvent::Draw => {
                let result = edge_list::parse(&self.edge_text);
                match result.notification() {
                    Some(message) => {
                        log::debug!(
                            "edge list rejected: {} problem(s)",
                            result.diagnostics.len()
                        );
                        Transition::notify(self, message)
                    }
                    None => {
                        log::info!("drawing {} edge(s)", result.edges.len());
                        Transition::changed(Self {
                            edges: result.edges,
                            ..self
                        })
                    }
                }
            }
            DotsEvent::Clear => Transition::changed(Self {
                edges: Vec::new(),
                ..self
            }),
            DotsEvent::BackgroundReady(background) => Transition::changed(Self {
                background: Some(background),
                ..self
            }),
        }
    }

    pub fn render_state(&self) -> RenderState {
        RenderState {
            background: self.background.clone(),
            edges: self.edges.clone(),
            markers: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CampusEvent {
    BuildingsLoaded(Result<BuildingMap, FetchError>),
    SourceChanged(String),
    DestinationChanged(String),
    Go,
    Clear,
    PathLoaded {
        generation: Generation,
        result: Result<PathStructure, FetchError>,
    },
    BackgroundReady(Background),
}

/// Campus map session: building choices and the current path overlay.
#[derive(Debug, Clone)]
pub struct CampusState {
    pub buildings: Option<BuildingMap>,
    pub source: String,
    pub destination: String,
    pub overlay: Option<PathOverlay>,
    pub background: Option<Background>,
    path_color: String,
    latest: Generation,
}

impl CampusState {
    pub fn new(path_color: impl Into<String>) -> Self {
        Self {
            buildings: None,
            source: String::new(),
            destination: String::new(),
            overlay: None,
            background: None,
            path_color: path_color.into(),
            latest: Generation::default(),
        }
    }

    /// Generation of the most recently issued path request.
    pub fn latest_request(&self) -> Generation {
        self.latest
    }

    pub fn apply(self, event: CampusEvent) -> Transition<Self> {
        match event {
            CampusEvent::BuildingsLoaded(Ok(buildings)) => {
                log::info!("{} building(s) available", buildings.len());
                Transition::unchanged(Self {
                    buildings: Some(buildings),
                    ..self
                })
            }
            CampusEvent::BuildingsLoaded(Err(e)) => Transition::notify(self, e.to_string()),
            CampusEvent::SourceChanged(source) => Transition::unchanged(Self { source, ..self }),
            CampusEvent::DestinationChanged(destination) => {
                Transition::unchanged(Self {
                    destination,
                    ..self
                })
            }
            CampusEvent::Go => {
                if self.source == self.destination {
                    return Transition::unchanged(self);
                }
                let generation = self.latest.next();
                let command = Command::FetchPath {
                    generation,
                    source: self.source.clone(),
                    destination: self.destination.clone(),
                };
                Transition {
                    state: Self {
                        latest: generation,
                        ..self
                    },
                    notification: None,
                    command: Some(command),
                    redraw: false,
                }
            }
            // Advancing the generation drops any response still in flight.
            CampusEvent::Clear => Transition::changed(Self {
                overlay: None,
                latest: self.latest.next(),
                ..self
            }),
            CampusEvent::PathLoaded { generation, .. } if generation != self.latest => {
                log::debug!(
                    "ignoring stale path response {} (latest {})",
                    generation.value(),
                    self.latest.value()
                );
                Transition::unchanged(self)
            }
            CampusEvent::PathLoaded {
                result: Ok(path), ..
            } => {
                let overlay = convert_path(&path, &self.path_color);
                log::info!("path with {} segment(s) loaded", overlay.edges.len());
                Transition::changed(Self {
                    overlay: Some(overlay),
                    ..self
                })
            }
            CampusEvent::PathLoaded { result: Err(e), .. } => {
                log::warn!("path request failed: {}", e);
                Transition::notify(self, e.to_string())
            }
            CampusEvent::BackgroundReady(background) => Transition::changed(Self {
                background: Some(background),
                ..self
            }),
        }
    }

    pub fn render_state(&self) -> RenderState {
        let (edges, markers) = match &self.overlay {
            Some(overlay) => (overlay.edges.clone(), overlay.markers),
            None => (Vec::new(), None),
        };
        RenderState {
            background: self.background.clone(),
            edges,
            markers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::path::Segment;
    use std::sync::Arc;
    use tiny_skia::Pixmap;

    fn dots() -> DotsState {
        DotsState::new(GridSpec::new(4, 500, 500).unwrap())
    }

    fn one_segment() -> PathStructure {
        PathStructure::new(vec![Segment {
            start: Point::new(1, 2),
            end: Point::new(3, 4),
            cost: None,
        }])
    }

    fn campus_ready() -> CampusState {
        let state = CampusState::new("blue")
            .apply(CampusEvent::SourceChanged("CSE".into()))
            .state;
        state
            .apply(CampusEvent::DestinationChanged("MGH".into()))
            .state
    }

    #[test]
    fn draw_commits_valid_edges() {
        let state = dots()
            .apply(DotsEvent::EdgeTextChanged("0,0 1,1 red\n1,1 2,2 blue".into()))
            .state;
        let t = state.apply(DotsEvent::Draw);
        assert!(t.redraw);
        assert!(t.notification.is_none());
        assert_eq!(t.state.edges.len(), 2);
        assert_eq!(t.state.render_state().edges.len(), 2);
    }

    #[test]
    fn invalid_draw_keeps_previous_edges() {
        let state = dots()
            .apply(DotsEvent::EdgeTextChanged("0,0 1,1 red".into()))
            .state
            .apply(DotsEvent::Draw)
            .state
            .apply(DotsEvent::EdgeTextChanged("0,0 1,1".into()))
            .state;
        let t = state.apply(DotsEvent::Draw);
        assert!(!t.redraw);
        let message = t.notification.unwrap();
        assert!(message.contains("Line 1: Missing a portion"));
        assert_eq!(t.state.edges.len(), 1);
    }

    #[test]
    fn clear_empties_edges_and_redraws() {
        let state = dots()
            .apply(DotsEvent::EdgeTextChanged("0,0 1,1 red".into()))
            .state
            .apply(DotsEvent::Draw)
            .state;
        let t = state.apply(DotsEvent::Clear);
        assert!(t.redraw);
        assert!(t.state.edges.is_empty());
        assert_eq!(t.state.edge_text, "0,0 1,1 red");
    }

    #[test]
    fn grid_size_changes_are_validated() {
        let t = dots().apply(DotsEvent::GridSizeChanged(10));
        assert!(t.redraw);
        assert_eq!(t.state.grid.size(), 10);

        let t = t.state.apply(DotsEvent::GridSizeChanged(0));
        assert!(t.notification.is_some());
        assert_eq!(t.state.grid.size(), 10);

        let t = t.state.apply(DotsEvent::GridSizeChanged(10));
        assert!(!t.redraw);

        let t = t.state.apply(DotsEvent::GridSizeChanged(100_000));
        assert!(t.notification.is_some());
        assert_eq!(t.state.grid.size(), 10);
    }

    #[test]
    fn background_arrival_triggers_redraw() {
        let background = Arc::new(Pixmap::new(4, 4).unwrap());
        let t = dots().apply(DotsEvent::BackgroundReady(background));
        assert!(t.redraw);
        assert!(t.state.render_state().background.is_some());
    }

    #[test]
    fn go_issues_a_new_generation() {
        let state = campus_ready();
        let t = state.apply(CampusEvent::Go);
        let generation = t.state.latest_request();
        assert_eq!(
            t.command,
            Some(Command::FetchPath {
                generation,
                source: "CSE".into(),
                destination: "MGH".into(),
            })
        );
    }

    #[test]
    fn go_between_same_building_does_nothing() {
        let state = CampusState::new("blue")
            .apply(CampusEvent::SourceChanged("CSE".into()))
            .state
            .apply(CampusEvent::DestinationChanged("CSE".into()))
            .state;
        let t = state.apply(CampusEvent::Go);
        assert!(t.command.is_none());
        assert_eq!(t.state.latest_request(), Generation::default());
    }

    #[test]
    fn only_latest_response_is_applied() {
        let first = campus_ready().apply(CampusEvent::Go);
        let old = first.state.latest_request();
        let second = first.state.apply(CampusEvent::Go);
        let newest = second.state.latest_request();

        let t = second.state.apply(CampusEvent::PathLoaded {
            generation: newest,
            result: Ok(one_segment()),
        });
        assert!(t.redraw);
        let t = t.state.apply(CampusEvent::PathLoaded {
            generation: old,
            result: Ok(PathStructure::new(Vec::new())),
        });
        assert!(!t.redraw);
        let overlay = t.state.overlay.unwrap();
        assert_eq!(overlay.edges.len(), 1);
        assert_eq!(overlay.edges[0].color, "blue");
    }

    #[test]
    fn clear_discards_in_flight_response() {
        let t = campus_ready().apply(CampusEvent::Go);
        let pending = t.state.latest_request();
        let cleared = t.state.apply(CampusEvent::Clear);
        assert!(cleared.redraw);

        let t = cleared.state.apply(CampusEvent::PathLoaded {
            generation: pending,
            result: Ok(one_segment()),
        });
        assert!(t.state.overlay.is_none());
        let render = t.state.render_state();
        assert!(render.edges.is_empty());
        assert!(render.markers.is_none());
    }

    #[test]
    fn failed_fetch_keeps_previous_path() {
        let t = campus_ready().apply(CampusEvent::Go);
        let generation = t.state.latest_request();
        let loaded = t.state.apply(CampusEvent::PathLoaded {
            generation,
            result: Ok(one_segment()),
        });

        let t = loaded.state.apply(CampusEvent::Go);
        let generation = t.state.latest_request();
        let t = t.state.apply(CampusEvent::PathLoaded {
            generation,
            result: Err(FetchError::Status(500)),
        });
        assert!(t.notification.unwrap().contains("status 500"));
        assert!(t.state.overlay.is_some());
    }

    #[test]
    fn buildings_failure_is_notified() {
        let t = CampusState::new("blue").apply(CampusEvent::BuildingsLoaded(Err(
            FetchError::Transport("connection refused".into()),
        )));
        assert!(t.notification.is_some());
        assert!(t.state.buildings.is_none());
    }
}
