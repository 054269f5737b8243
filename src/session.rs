//! Playback session controller.
//!
//! `PlaybackSession` owns the track library, the single current resource and
//! the transport state, and keeps the audio engine and waveform renderer in
//! step. Deferred fade follow-ups are tagged so that a newer command or a
//! track switch makes older ones inert.

mod controller;
mod state;
mod timers;

pub use controller::{PlaybackSession, SessionError};
pub use state::{FadeTiming, SessionState};

#[cfg(test)]
mod tests;
