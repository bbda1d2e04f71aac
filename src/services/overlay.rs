//! Live session overlay
//!
//! Mirrors the rest countdown onto an ambient surface outside the app. The
//! publisher owns the only handle; everything else asks it to publish or
//! tear down. It has no timer of its own and only moves when the countdown
//! tick or a label change drives it.

use std::{
    fmt,
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::OverlayError;

/// What the overlay shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayContent {
    pub workout_label: String,
    pub current_exercise_label: String,
    pub rest_remaining_seconds: u32,
    pub total_elapsed_seconds: u64,
    pub is_resting: bool,
    /// Only set while resting, so the surface can count down on its own
    /// between updates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_ends_at: Option<DateTime<Utc>>,
}

/// Opaque reference to a live overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayHandle {
    id: String,
}

impl OverlayHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Platform surface that can display an overlay
pub trait OverlaySurface: Send + Sync + fmt::Debug {
    fn create(&self, content: &OverlayContent) -> Result<OverlayHandle, OverlayError>;
    fn update(&self, handle: &OverlayHandle, content: &OverlayContent) -> Result<(), OverlayError>;
    /// Close immediately. Closing an overlay that is already gone is a no-op.
    fn end(&self, handle: &OverlayHandle);
    /// Close every overlay on the surface, including ones left behind by an
    /// earlier process. Returns how many were closed.
    fn end_all(&self) -> usize;
}

/// Owns the single overlay handle
#[derive(Debug)]
pub struct OverlayPublisher {
    surface: Arc<dyn OverlaySurface>,
    handle: Mutex<Option<OverlayHandle>>,
    content_tx: watch::Sender<Option<OverlayContent>>,
}

impl OverlayPublisher {
    pub fn new(surface: Arc<dyn OverlaySurface>) -> Self {
        let (content_tx, _) = watch::channel(None);
        Self {
            surface,
            handle: Mutex::new(None),
            content_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<OverlayHandle>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create the overlay, or update it in place if one is already live
    pub fn publish(&self, content: OverlayContent) {
        let mut handle = self.lock();
        match handle.as_ref() {
            Some(existing) => {
                if let Err(e) = self.surface.update(existing, &content) {
                    warn!("Failed to update overlay: {}", e);
                }
            }
            None => match self.surface.create(&content) {
                Ok(created) => {
                    info!("Overlay started ({})", created.id());
                    *handle = Some(created);
                }
                Err(e) => {
                    warn!("Overlay unavailable: {}", e);
                    return;
                }
            },
        }
        self.content_tx.send_replace(Some(content));
    }

    /// Update only if an overlay is live
    pub fn refresh(&self, content: OverlayContent) {
        let handle = self.lock();
        if let Some(existing) = handle.as_ref() {
            if let Err(e) = self.surface.update(existing, &content) {
                warn!("Failed to refresh overlay: {}", e);
            }
            self.content_tx.send_replace(Some(content));
        }
    }

    /// Close the overlay now and forget it
    pub fn teardown(&self) {
        if let Some(handle) = self.lock().take() {
            self.surface.end(&handle);
            info!("Overlay ended ({})", handle.id());
        }
        self.content_tx.send_replace(None);
    }

    /// Close anything on the surface, trusted or not
    pub fn end_orphans(&self) -> usize {
        self.lock().take();
        self.content_tx.send_replace(None);
        let closed = self.surface.end_all();
        if closed > 0 {
            info!("Ended {} orphaned overlay(s)", closed);
        }
        closed
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    pub fn current(&self) -> Option<OverlayContent> {
        self.content_tx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Option<OverlayContent>> {
        self.content_tx.subscribe()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StatusFile {
    id: String,
    content: OverlayContent,
}

/// Overlay rendered as a JSON status file for a status bar to display.
///
/// The file outlives the process, so after a crash it is exactly the kind of
/// orphan that must be ended on the next launch.
#[derive(Debug)]
pub struct StatusFileSurface {
    path: PathBuf,
}

impl StatusFileSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, id: &str, content: &OverlayContent) -> Result<(), OverlayError> {
        let io_err = |source: std::io::Error| OverlayError::Write {
            path: self.path.clone(),
            source,
        };
        let body = serde_json::to_vec(&StatusFile {
            id: id.to_string(),
            content: content.clone(),
        })?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).map_err(io_err)?;
        file.write_all(&body).map_err(io_err)?;
        file.write_all(b"\n").map_err(io_err)?;
        drop(file);
        fs::rename(&temp_path, &self.path).map_err(io_err)
    }

    fn current_id(&self) -> Option<String> {
        let contents = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str::<StatusFile>(&contents).ok().map(|file| file.id)
    }

    fn remove(&self) -> bool {
        match fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Failed to remove overlay file {}: {}", self.path.display(), e);
                false
            }
        }
    }
}

impl OverlaySurface for StatusFileSurface {
    fn create(&self, content: &OverlayContent) -> Result<OverlayHandle, OverlayError> {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let handle = OverlayHandle::new(format!("overlay-{nanos}-{}", std::process::id()));
        self.write(handle.id(), content)?;
        Ok(handle)
    }

    fn update(&self, handle: &OverlayHandle, content: &OverlayContent) -> Result<(), OverlayError> {
        self.write(handle.id(), content)
    }

    fn end(&self, handle: &OverlayHandle) {
        match self.current_id() {
            Some(id) if id != handle.id() => {
                debug!("Overlay file belongs to {}, leaving it", id);
            }
            _ => {
                self.remove();
            }
        }
    }

    fn end_all(&self) -> usize {
        usize::from(self.remove())
    }
}
