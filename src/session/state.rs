use std::time::Duration;

use crate::config::AudioSettings;

/// Where the current track is in its lifecycle.
///
/// Mute, loop and seeking are independent flags kept next to this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No current track.
    Idle,
    /// A resource is held but the waveform is not ready yet. `auto_resume`
    /// starts playback once it is.
    Loading { auto_resume: bool },
    Ready { playing: bool },
}

impl SessionState {
    /// Playing, or about to play as soon as the resource is ready.
    pub fn wants_playback(self) -> bool {
        matches!(
            self,
            SessionState::Ready { playing: true } | SessionState::Loading { auto_resume: true }
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Loading { .. } => "loading",
            SessionState::Ready { playing: true } => "playing",
            SessionState::Ready { playing: false } => "paused",
        }
    }
}

/// Fade lengths used by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeTiming {
    /// Delay between starting the engines and ramping the volume up.
    pub play_delay: Duration,
    pub play_fade: Duration,
    pub pause_fade: Duration,
    pub mute_fade: Duration,
}

impl From<&AudioSettings> for FadeTiming {
    fn from(a: &AudioSettings) -> Self {
        Self {
            play_delay: Duration::from_millis(a.play_fade_delay_ms),
            play_fade: Duration::from_millis(a.play_fade_ms),
            pause_fade: Duration::from_millis(a.pause_fade_ms),
            mute_fade: Duration::from_millis(a.mute_fade_ms),
        }
    }
}

impl Default for FadeTiming {
    fn default() -> Self {
        Self::from(&AudioSettings::default())
    }
}
