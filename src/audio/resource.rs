//! Scoped handles to a track's bytes.
//!
//! A handle is what the engines are pointed at. It is acquired when a track
//! becomes current and released by dropping it; the shared counter lets the
//! session (and its tests) check that at most one is ever alive.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::library::TrackId;

#[derive(Debug, Clone, Default)]
pub struct HandleCounter(Arc<AtomicUsize>);

impl HandleCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, track: TrackId, path: &Path) -> ResourceHandle {
        self.0.fetch_add(1, Ordering::SeqCst);
        log::debug!("acquired resource for track {track}");
        ResourceHandle {
            track,
            path: path.to_path_buf(),
            live: self.0.clone(),
        }
    }

    /// Handles currently alive.
    pub fn live(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct ResourceHandle {
    track: TrackId,
    path: PathBuf,
    live: Arc<AtomicUsize>,
}

impl ResourceHandle {
    pub fn track(&self) -> TrackId {
        self.track
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        log::debug!("released resource for track {}", self.track);
    }
}
