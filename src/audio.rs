//! Playback and waveform engines.
//!
//! The session drives two collaborators through the traits in `types`: an
//! audio engine that makes sound and a waveform renderer that owns the
//! visual playhead. The rodio/terminal implementations live alongside.

mod fade;
mod resource;
mod rodio_engine;
mod sink;
mod types;
mod waveform;

pub use fade::Fade;
pub use resource::{HandleCounter, ResourceHandle};
pub use rodio_engine::RodioEngine;
pub use types::{AudioEngine, EngineError, WaveEvent, WaveformRenderer};
pub use waveform::{TerminalWaveform, resample_peaks};
