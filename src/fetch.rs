use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::path::{BuildingMap, PathStructure};

/// Why a request to the path server produced no usable data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request never got a response.
    Transport(String),
    /// The server answered with a non-success status.
    Status(u16),
    /// The response body was not the expected JSON shape.
    Decode(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(e) => write!(f, "The request could not be sent: {}", e),
            FetchError::Status(code) => {
                write!(f, "The request could not be processed (status {}).", code)
            }
            FetchError::Decode(e) => write!(f, "The server response was malformed: {}", e),
        }
    }
}

impl std::error::Error for FetchError {}

/// Identifies one issued request. Later requests have larger generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Blocking client for the campus path server.
#[derive(Debug, Clone)]
pub struct PathClient {
    base_url: String,
}

impl PathClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn buildings(&self) -> Result<BuildingMap, FetchError> {
        let body = self.get(&format!("{}/getBuildings", self.base_url), &[])?;
        decode_buildings(&body)
    }

    pub fn path(&self, source: &str, destination: &str) -> Result<PathStructure, FetchError> {
        let body = self.get(
            &format!("{}/getPath", self.base_url),
            &[("src", source), ("dst", destination)],
        )?;
        decode_path(&body)
    }

    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        log::info!("GET {}", url);
        let mut request = ureq::get(url);
        for (key, value) in query {
            request = request.query(*key, *value);
        }

        let mut response = request.call().map_err(|e| match e {
            ureq::Error::StatusCode(code) => FetchError::Status(code),
            other => FetchError::Transport(other.to_string()),
        })?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(FetchError::Status(status));
        }

        response
            .body_mut()
            .read_to_string()
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}

pub fn decode_buildings(body: &str) -> Result<BuildingMap, FetchError> {
    BuildingMap::from_json(body).map_err(FetchError::Decode)
}

pub fn decode_path(body: &str) -> Result<PathStructure, FetchError> {
    PathStructure::from_json(body).map_err(FetchError::Decode)
}

/// A request running on a worker thread, tagged with its generation.
///
/// Cancelling stops the result from being delivered; the underlying HTTP
/// call is left to finish on its own.
pub struct PendingRequest<T> {
    generation: Generation,
    cancelled: Arc<AtomicBool>,
    receiver: Receiver<Result<T, FetchError>>,
}

impl<T: Send + 'static> PendingRequest<T> {
    pub fn spawn<F>(generation: Generation, job: F) -> Self
    where
        F: FnOnce() -> Result<T, FetchError> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let spawned = thread::Builder::new()
            .name(format!("fetch-{}", generation.value()))
            .spawn(move || {
                let result = job();
                if flag.load(Ordering::Acquire) {
                    log::debug!("request {} cancelled, dropping result", generation.value());
                    return;
                }
                let _ = sender.send(result);
            });

        if let Err(e) = spawned {
            let (failed_sender, failed_receiver) = mpsc::channel();
            let _ = failed_sender.send(Err(FetchError::Transport(format!(
                "could not start request: {}",
                e
            ))));
            return Self {
                generation,
                cancelled,
                receiver: failed_receiver,
            };
        }

        Self {
            generation,
            cancelled,
            receiver,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// The result, if the request has finished and was not cancelled.
    pub fn try_take(&self) -> Option<Result<T, FetchError>> {
        if self.cancelled.load(Ordering::Acquire) {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Blocks for the result. `None` once cancelled.
    pub fn wait(self) -> Option<Result<T, FetchError>> {
        if self.cancelled.load(Ordering::Acquire) {
            return None;
        }
        self.receiver.recv().ok()
    }
}
