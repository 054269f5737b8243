use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/wavedeck/config.toml` or `~/.config/wavedeck/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `WAVEDECK__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub ui: UiSettings,
    pub library: LibrarySettings,
    pub waveform: WaveformSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Delay between starting playback and ramping the volume up (milliseconds).
    pub play_fade_delay_ms: u64,
    /// Length of the volume ramp after playback starts (milliseconds).
    pub play_fade_ms: u64,
    /// Length of the fade-out before the engines are paused (milliseconds).
    pub pause_fade_ms: u64,
    /// Length of the mute / unmute ramp (milliseconds).
    pub mute_fade_ms: u64,
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            play_fade_delay_ms: 100,
            play_fade_ms: 100,
            pause_fade_ms: 100,
            mute_fade_ms: 200,
            quit_fade_out_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Swatch colour shown while no track is current.
    pub neutral_color: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ wavedeck ~ ".to_string(),
            neutral_color: "#000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions accepted when adding files (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks when a directory is added.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: ["mp3", "wav", "ogg", "oga", "mp4", "webm", "m4a", "flac", "aac"]
                .into_iter()
                .map(String::from)
                .collect(),
            follow_links: true,
            include_hidden: false,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WaveformSettings {
    /// Number of peak buckets computed per track.
    pub peaks: usize,
    /// Tracks shorter than this (seconds) are reported as short once ready.
    pub short_track_secs: f64,
}

impl Default for WaveformSettings {
    fn default() -> Self {
        Self {
            peaks: 512,
            short_track_secs: 3.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// One of: off, error, warn, info, debug, trace.
    pub level: String,
    /// Log file; defaults to the XDG state directory.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
