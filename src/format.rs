//! Declared MIME types and the playback formats the audio engine accepts.
//!
//! A track carries the MIME type it was declared with (derived from the file
//! extension, the way a file picker would). Playback only starts when that
//! type resolves to one of the known `PlaybackFormat`s.

use std::fmt;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PlaybackFormat {
    Mp3,
    Wav,
    Ogg,
    Mp4,
    Webm,
    M4a,
}

impl PlaybackFormat {
    /// Short token handed to the audio engine.
    pub fn token(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::M4a => "m4a",
        }
    }
}

impl fmt::Display for PlaybackFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("no MIME type declared; cannot pick a playback format")]
    Missing,
    #[error("unsupported MIME type `{0}`; cannot pick a playback format")]
    Unsupported(String),
}

/// Map a declared MIME type to a playback format.
///
/// Matching is exact: `audio/MPEG` and ` audio/mpeg` are not `audio/mpeg`.
pub fn resolve(mime: Option<&str>) -> Result<PlaybackFormat, FormatError> {
    let mime = mime.filter(|m| !m.is_empty());
    let Some(mime) = mime else {
        return Err(FormatError::Missing);
    };

    match mime {
        "audio/mpeg" | "audio/mpg" => Ok(PlaybackFormat::Mp3),
        "audio/wav" => Ok(PlaybackFormat::Wav),
        "audio/ogg" => Ok(PlaybackFormat::Ogg),
        "video/mp4" => Ok(PlaybackFormat::Mp4),
        "video/webm" => Ok(PlaybackFormat::Webm),
        "audio/m4a" | "audio/x-m4a" => Ok(PlaybackFormat::M4a),
        other => Err(FormatError::Unsupported(other.to_string())),
    }
}

/// Declare a MIME type for a local file from its extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "mp3" | "mpga" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "m4a" => "audio/x-m4a",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        _ => return None,
    };
    Some(mime)
}

/// The part after the `/`, as shown in the track table's TYPE column.
pub fn subtype(mime: &str) -> &str {
    match mime.find('/') {
        Some(i) => &mime[i + 1..],
        None => mime,
    }
}
