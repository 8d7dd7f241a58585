use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tiny_skia::{ColorU8, Pixmap};

/// A decoded background image, shared read-only across redraws.
pub type Background = Arc<Pixmap>;

/// Decodes a fixed image asset on a worker thread.
///
/// The decoded image is handed out exactly once. A missing or undecodable
/// file leaves the loader permanently empty; the failure is only logged.
pub struct ImageLoader {
    path: PathBuf,
    receiver: Option<Receiver<Background>>,
}

impl ImageLoader {
    pub fn spawn(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (sender, receiver) = mpsc::channel();
        let worker_path = path.clone();

        let spawned = thread::Builder::new()
            .name("background-decode".to_string())
            .spawn(move || match decode_background(&worker_path) {
                Ok(image) => {
                    log::debug!(
                        "background {} decoded ({}x{})",
                        worker_path.display(),
                        image.width(),
                        image.height()
                    );
                    let _ = sender.send(Arc::new(image));
                }
                Err(e) => log::debug!("background {} unavailable: {}", worker_path.display(), e),
            });

        let receiver = match spawned {
            Ok(_) => Some(receiver),
            Err(e) => {
                log::debug!("could not start background decode: {}", e);
                None
            }
        };

        Self { path, receiver }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the decoded image the first time it is available and `None`
    /// on every other call.
    pub fn poll(&mut self) -> Option<Background> {
        let receiver = self.receiver.as_ref()?;
        match receiver.try_recv() {
            Ok(image) => {
                self.receiver = None;
                Some(image)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.receiver = None;
                None
            }
        }
    }

    /// Blocks until the decode finishes. `None` if it failed or the image
    /// was already taken by `poll`.
    pub fn wait(mut self) -> Option<Background> {
        let receiver = self.receiver.take()?;
        receiver.recv().ok()
    }
}

/// Decodes a JPEG or PNG file into a premultiplied pixmap.
pub fn decode_background(path: &Path) -> Result<Pixmap, String> {
    let rgba = image::open(path)
        .map_err(|e| format!("Failed to decode image: {}", e))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut pixmap =
        Pixmap::new(width, height).ok_or_else(|| format!("Empty image: {}x{}", width, height))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}
