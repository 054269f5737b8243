use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use uuid::Uuid;

use crate::format;

/// Opaque identifier, unique per added file.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(Uuid);

impl TrackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_simple())
    }
}

/// Tags and stream properties read from the file. Every field is optional:
/// a file may carry some tags and not others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub bitrate_kbps: Option<u32>,
    pub sample_rate_hz: Option<u32>,
    pub duration: Option<Duration>,
    pub bpm: Option<f32>,
    pub key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub path: PathBuf,
    /// File name as shown in the table.
    pub name: String,
    /// Declared MIME type, if the extension is known.
    pub mime: Option<String>,
    /// Present only once parsing succeeded.
    pub metadata: Option<TrackMetadata>,
    /// Last problem seen while loading or playing this track.
    pub error: Option<String>,
}

impl Track {
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();

        Self {
            id: TrackId::new(),
            path: path.to_path_buf(),
            name,
            mime: format::mime_for_path(path).map(str::to_string),
            metadata: None,
            error: None,
        }
    }

    /// MIME subtype for display, `-` when unknown.
    pub fn type_label(&self) -> &str {
        self.mime.as_deref().map(format::subtype).unwrap_or("-")
    }

    pub fn duration(&self) -> Option<Duration> {
        self.metadata.as_ref().and_then(|m| m.duration)
    }
}

/// Tracks in the order they were added.
#[derive(Debug, Default)]
pub struct Library {
    tracks: Vec<Track>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, track: Track) -> TrackId {
        let id = track.id;
        self.tracks.push(track);
        id
    }

    pub fn remove(&mut self, id: TrackId) -> Option<Track> {
        let pos = self.position(id)?;
        Some(self.tracks.remove(pos))
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    pub fn position(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    pub fn at(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(|t| t.id).collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
