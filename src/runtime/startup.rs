use std::path::{Path, PathBuf};

use crate::audio::{AudioEngine, WaveformRenderer};
use crate::config::LibrarySettings;
use crate::library::{MetadataParser, collect_audio_paths};
use crate::session::PlaybackSession;

/// Expand a leading `~/` the way a shell would.
pub fn expand_home(input: &str) -> PathBuf {
    if let Some(rest) = input.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(input)
}

/// Add every audio file found under `path`. Returns how many were added.
pub fn ingest_path<A, W, M>(
    session: &mut PlaybackSession<A, W, M>,
    path: &Path,
    library: &LibrarySettings,
) -> usize
where
    A: AudioEngine,
    W: WaveformRenderer,
    M: MetadataParser,
{
    let found = collect_audio_paths(path, library);
    if found.is_empty() {
        log::warn!("no audio files at {}", path.display());
    }
    for file in &found {
        session.ingest(file);
    }
    found.len()
}
