//! Background tag parsing.
//!
//! Parsing never blocks ingestion: a request hands the path to a worker
//! thread and the outcome is collected later with `poll`.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use lofty::prelude::*;
use thiserror::Error;

use super::model::{TrackId, TrackMetadata};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("cannot read tags from {path}: {reason}")]
    Read { path: PathBuf, reason: String },
    #[error("metadata worker for {0} went away")]
    WorkerLost(PathBuf),
}

#[derive(Debug)]
pub struct MetadataOutcome {
    pub id: TrackId,
    pub result: Result<TrackMetadata, MetadataError>,
}

/// Extracts tags for a file without blocking the caller.
pub trait MetadataParser {
    /// Start parsing `path` on behalf of track `id`.
    fn request(&mut self, id: TrackId, path: &Path);
    /// Outcomes that completed since the last call.
    fn poll(&mut self) -> Vec<MetadataOutcome>;
}

/// `MetadataParser` backed by lofty, one short-lived worker per request.
pub struct LoftyParser {
    tx: Sender<MetadataOutcome>,
    rx: Receiver<MetadataOutcome>,
}

impl LoftyParser {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl Default for LoftyParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataParser for LoftyParser {
    fn request(&mut self, id: TrackId, path: &Path) {
        let tx = self.tx.clone();
        let owned = path.to_path_buf();
        let spawned = thread::Builder::new()
            .name("wavedeck-metadata".into())
            .spawn(move || {
                let result = read_metadata(&owned);
                let _ = tx.send(MetadataOutcome { id, result });
            });

        if let Err(e) = spawned {
            log::warn!("could not start metadata worker: {e}");
            let _ = self.tx.send(MetadataOutcome {
                id,
                result: Err(MetadataError::WorkerLost(path.to_path_buf())),
            });
        }
    }

    fn poll(&mut self) -> Vec<MetadataOutcome> {
        self.rx.try_iter().collect()
    }
}

/// Read stream properties and the tags the track table shows.
pub fn read_metadata(path: &Path) -> Result<TrackMetadata, MetadataError> {
    let tagged = lofty::read_from_path(path).map_err(|e| MetadataError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let props = tagged.properties();
    let duration = props.duration();
    let mut meta = TrackMetadata {
        bitrate_kbps: props.audio_bitrate().or_else(|| props.overall_bitrate()),
        sample_rate_hz: props.sample_rate(),
        duration: (!duration.is_zero()).then_some(duration),
        bpm: None,
        key: None,
    };

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        meta.bpm = tag
            .get_string(&ItemKey::Bpm)
            .or_else(|| tag.get_string(&ItemKey::IntegerBpm))
            .and_then(parse_bpm);
        if let Some(v) = tag.get_string(&ItemKey::InitialKey) {
            let v = v.trim();
            if !v.is_empty() {
                meta.key = Some(v.to_string());
            }
        }
    }

    Ok(meta)
}

/// BPM tags are free text; accept `128`, `127.5` and ` 90 `.
fn parse_bpm(raw: &str) -> Option<f32> {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|b| b.is_finite() && *b > 0.0)
}
