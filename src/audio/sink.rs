//! Utilities for creating `rodio` sinks from a file on disk.
//!
//! The helper here encapsulates opening/decoding a file and preparing a
//! paused `Sink` at the requested start position.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use super::types::EngineError;

/// Open and decode `path` into a rodio source.
pub(super) fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>, EngineError> {
    let file = File::open(path).map_err(|source| EngineError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    Decoder::new(BufReader::new(file)).map_err(|e| EngineError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Create a paused `Sink` for `path` that starts playback at `start_at`.
pub(super) fn create_sink_at(
    handle: &OutputStream,
    path: &Path,
    start_at: Duration,
    volume: f32,
) -> Result<Sink, EngineError> {
    // `skip_duration` is our fallback seeking primitive; even Duration::ZERO is fine.
    let source = open_decoder(path)?.skip_duration(start_at);

    let sink = Sink::connect_new(handle.mixer());
    sink.set_volume(volume);
    sink.append(source);
    sink.pause();
    Ok(sink)
}
