//! Engine-facing traits and the small types they exchange.
//!
//! `AudioEngine` and `WaveformRenderer` are the seams the playback session
//! talks through; the production implementations are `RodioEngine` and
//! `TerminalWaveform`, tests use recording fakes.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use thiserror::Error;

use super::resource::ResourceHandle;
use crate::color::ThemePair;
use crate::format::PlaybackFormat;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no audio output device: {0}")]
    NoDevice(String),
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

/// Makes sound for the current resource.
pub trait AudioEngine {
    /// Point the engine at `handle`, replacing whatever was loaded. Starts paused
    /// at full volume.
    fn load(&mut self, handle: &ResourceHandle, format: PlaybackFormat) -> Result<(), EngineError>;
    /// Drop the loaded resource and any decoder state.
    fn unload(&mut self);
    fn is_loaded(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self);
    /// Halt and rewind to the start; the resource stays loaded.
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
    fn seek(&mut self, position: Duration);
    fn position(&self) -> Duration;
    fn volume(&self) -> f32;
    /// Start a linear ramp from `from` to `to` lasting `over`. Replaces a running fade.
    fn fade(&mut self, from: f32, to: f32, over: Duration, now: Instant);
    /// Advance running fades.
    fn tick(&mut self, now: Instant);
}

/// Lifecycle and pointer events emitted by a waveform renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaveEvent {
    /// The resource is analysed and its duration known.
    Ready,
    /// The user clicked the waveform; the playhead already moved.
    Click,
    DragStart,
    /// Drag released; the playhead sits at the drop position.
    DragEnd,
    /// The playhead reached the end while playing.
    Finish,
    /// The resource could not be analysed.
    Failed(String),
}

/// Draws the waveform of the current resource and owns the visual playhead.
pub trait WaveformRenderer {
    /// Start analysing `handle`; `Ready` or `Failed` follows later.
    fn load(&mut self, handle: &ResourceHandle);
    /// Destroy the current waveform and show nothing.
    fn clear(&mut self);
    fn is_ready(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self);
    /// Halt the playhead and move it to zero.
    fn stop(&mut self);
    fn set_time(&mut self, time: Duration);
    fn current_time(&self) -> Duration;
    fn duration(&self) -> Option<Duration>;
    fn set_colors(&mut self, theme: &ThemePair);
    fn colors(&self) -> Option<&ThemePair>;
    /// Normalised peak amplitudes, once ready.
    fn peaks(&self) -> Option<&[f32]>;
    /// Pointer pressed at `fraction` (0..=1) of the waveform width.
    fn pointer_down(&mut self, fraction: f32);
    fn pointer_drag(&mut self, fraction: f32);
    fn pointer_up(&mut self, fraction: f32);
    /// Advance the playhead and collect background results.
    fn tick(&mut self, now: Instant);
    fn poll_events(&mut self) -> Vec<WaveEvent>;
}
