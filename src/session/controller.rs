use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

use super::state::{FadeTiming, SessionState};
use super::timers::{Deferred, TimerQueue, Token};
use crate::audio::{AudioEngine, HandleCounter, ResourceHandle, WaveEvent, WaveformRenderer};
use crate::color::{ColorError, HexColor, ThemePair};
use crate::config::Settings;
use crate::format;
use crate::library::{Library, MetadataParser, Track, TrackId};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no track with id {0}")]
    UnknownTrack(TrackId),
    #[error("no track is loaded")]
    NoTrack,
    #[error("{name} cannot be played: {reason}")]
    Unplayable { name: String, reason: String },
    #[error(transparent)]
    Color(#[from] ColorError),
}

struct Current {
    id: TrackId,
    handle: ResourceHandle,
    /// The audio engine accepted the resource.
    audible: bool,
}

pub struct PlaybackSession<A, W, M> {
    audio: A,
    waveform: W,
    metadata: M,
    library: Library,
    current: Option<Current>,
    state: SessionState,
    muted: bool,
    looping: bool,
    seeking: bool,
    theme: Option<ThemePair>,
    neutral: HexColor,
    timers: TimerQueue,
    generation: u64,
    epoch: u64,
    handles: HandleCounter,
    timing: FadeTiming,
    rng: StdRng,
    notices: Vec<String>,
}

impl<A, W, M> PlaybackSession<A, W, M>
where
    A: AudioEngine,
    W: WaveformRenderer,
    M: MetadataParser,
{
    pub fn new(audio: A, waveform: W, metadata: M, settings: &Settings) -> Self {
        Self {
            audio,
            waveform,
            metadata,
            library: Library::new(),
            current: None,
            state: SessionState::Idle,
            muted: false,
            looping: false,
            seeking: false,
            theme: None,
            neutral: settings.neutral_color(),
            timers: TimerQueue::default(),
            generation: 0,
            epoch: 0,
            handles: HandleCounter::new(),
            timing: FadeTiming::from(&settings.audio),
            rng: StdRng::from_os_rng(),
            notices: Vec::new(),
        }
    }

    /// Use a deterministic colour generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // --- accessors ---------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.wants_playback()
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn is_seeking(&self) -> bool {
        self.seeking
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn current_id(&self) -> Option<TrackId> {
        self.current.as_ref().map(|c| c.id)
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_id().and_then(|id| self.library.get(id))
    }

    /// The session's colour pair, if one was generated yet.
    pub fn theme(&self) -> Option<&ThemePair> {
        self.theme.as_ref()
    }

    /// Colours the inputs show: the theme while a track is current, neutral otherwise.
    pub fn displayed_theme(&self) -> ThemePair {
        match (&self.current, &self.theme) {
            (Some(_), Some(theme)) => theme.clone(),
            _ => ThemePair::neutral(&self.neutral),
        }
    }

    /// Resource handles currently alive; never more than one.
    pub fn live_handles(&self) -> usize {
        self.handles.live()
    }

    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn waveform(&self) -> &W {
        &self.waveform
    }

    pub fn waveform_mut(&mut self) -> &mut W {
        &mut self.waveform
    }

    #[cfg(test)]
    pub(crate) fn metadata_mut(&mut self) -> &mut M {
        &mut self.metadata
    }

    #[cfg(test)]
    pub(crate) fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    // --- tracks ------------------------------------------------------------

    /// Add a file to the library.
    ///
    /// Metadata parsing starts in the background. The track becomes current
    /// unless something is playing.
    pub fn ingest(&mut self, path: &Path) -> TrackId {
        let track = Track::from_path(path);
        log::info!(
            "ingested {} ({})",
            track.name,
            track.mime.as_deref().unwrap_or("unknown type")
        );
        let id = self.library.push(track);
        self.metadata.request(id, path);

        if self.theme.is_none() {
            let theme = ThemePair::random(&mut self.rng);
            log::debug!("generated colours {} / {}", theme.wave, theme.progress);
            self.waveform.set_colors(&theme);
            self.theme = Some(theme);
        }

        if !self.is_playing() {
            self.make_current(id, false);
        }
        id
    }

    /// Make `id` the current track. Returns `false` when it already was.
    pub fn switch_to(&mut self, id: TrackId) -> Result<bool, SessionError> {
        if self.library.get(id).is_none() {
            return Err(SessionError::UnknownTrack(id));
        }
        if self.current_id() == Some(id) {
            return Ok(false);
        }

        let resume = self.is_playing();
        self.make_current(id, resume);
        Ok(true)
    }

    /// Remove a track. Deleting the current one tears down its resource and
    /// leaves the session idle.
    pub fn delete(&mut self, id: TrackId) -> Result<(), SessionError> {
        let track = self
            .library
            .remove(id)
            .ok_or(SessionError::UnknownTrack(id))?;
        log::info!("deleted {}", track.name);

        if self.current_id() == Some(id) {
            self.release_current();
            self.state = SessionState::Idle;
        }
        Ok(())
    }

    // --- transport ---------------------------------------------------------

    pub fn play(&mut self, now: Instant) -> Result<(), SessionError> {
        self.ensure_audible()?;
        match self.state {
            SessionState::Idle => Err(SessionError::NoTrack),
            SessionState::Loading { .. } => {
                self.state = SessionState::Loading { auto_resume: true };
                Ok(())
            }
            SessionState::Ready { playing: true } => Ok(()),
            SessionState::Ready { playing: false } => {
                self.start_playback(now);
                Ok(())
            }
        }
    }

    pub fn pause(&mut self, now: Instant) {
        match self.state {
            SessionState::Ready { playing: true } => {
                self.state = SessionState::Ready { playing: false };
                let token = self.next_token();
                self.audio
                    .fade(self.audio.volume(), 0.0, self.timing.pause_fade, now);
                self.timers
                    .schedule(now, self.timing.pause_fade, token, Deferred::PauseEngines);
            }
            SessionState::Loading { auto_resume: true } => {
                self.state = SessionState::Loading { auto_resume: false };
            }
            _ => {}
        }
    }

    pub fn toggle_play(&mut self, now: Instant) -> Result<(), SessionError> {
        if self.is_playing() {
            self.pause(now);
            Ok(())
        } else {
            self.play(now)
        }
    }

    pub fn mute(&mut self, now: Instant) {
        if self.muted {
            return;
        }
        self.muted = true;
        if self.current.is_some() {
            self.audio
                .fade(self.audio.volume(), 0.0, self.timing.mute_fade, now);
        }
    }

    pub fn unmute(&mut self, now: Instant) {
        if !self.muted {
            return;
        }
        self.muted = false;
        if self.current.is_some() {
            self.audio
                .fade(self.audio.volume(), 1.0, self.timing.mute_fade, now);
        }
    }

    pub fn toggle_mute(&mut self, now: Instant) {
        if self.muted {
            self.unmute(now);
        } else {
            self.mute(now);
        }
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn toggle_loop(&mut self) {
        self.looping = !self.looping;
    }

    // --- colours -----------------------------------------------------------

    pub fn randomize_colors(&mut self) {
        let theme = ThemePair::random(&mut self.rng);
        self.waveform.set_colors(&theme);
        self.theme = Some(theme);
    }

    pub fn set_wave_color(&mut self, input: &str) -> Result<(), SessionError> {
        let color = HexColor::parse(input)?;
        let mut theme = self.theme_or_random();
        theme.wave = color;
        self.waveform.set_colors(&theme);
        self.theme = Some(theme);
        Ok(())
    }

    pub fn set_progress_color(&mut self, input: &str) -> Result<(), SessionError> {
        let color = HexColor::parse(input)?;
        let mut theme = self.theme_or_random();
        theme.progress = color;
        self.waveform.set_colors(&theme);
        self.theme = Some(theme);
        Ok(())
    }

    // --- events ------------------------------------------------------------

    /// Drive the session: collaborator events first, then due timers, then fades.
    pub fn pump(&mut self, now: Instant) {
        self.waveform.tick(now);
        for event in self.waveform.poll_events() {
            match event {
                WaveEvent::Ready => self.on_waveform_ready(now),
                WaveEvent::Click => self.on_waveform_click(),
                WaveEvent::DragStart => self.on_drag_start(),
                WaveEvent::DragEnd => self.on_drag_end(),
                WaveEvent::Finish => self.on_finish(now),
                WaveEvent::Failed(reason) => self.on_waveform_failed(reason, now),
            }
        }

        for outcome in self.metadata.poll() {
            let Some(track) = self.library.get_mut(outcome.id) else {
                log::debug!("dropping metadata for removed track {}", outcome.id);
                continue;
            };
            match outcome.result {
                Ok(meta) => track.metadata = Some(meta),
                Err(e) => {
                    log::warn!("{e}");
                    self.notices.push(format!("no metadata for {}", track.name));
                }
            }
        }

        let token = self.token();
        for (tagged, action) in self.timers.take_due(now) {
            if tagged != token {
                log::debug!("skipping stale {action:?}");
                continue;
            }
            match action {
                Deferred::RampUp => {
                    let target = if self.muted { 0.0 } else { 1.0 };
                    self.audio
                        .fade(self.audio.volume(), target, self.timing.play_fade, now);
                }
                Deferred::PauseEngines => {
                    self.audio.pause();
                    self.waveform.pause();
                }
            }
        }

        self.audio.tick(now);
    }

    pub fn on_waveform_ready(&mut self, now: Instant) {
        let SessionState::Loading { auto_resume } = self.state else {
            return;
        };
        self.state = SessionState::Ready { playing: false };
        if let Some(track) = self.current_track() {
            log::info!("{} is ready", track.name);
        }
        if auto_resume {
            self.resume_after_load(now);
        }
    }

    pub fn on_waveform_click(&mut self) {
        if self.current.is_none() {
            return;
        }
        let at = self.waveform.current_time();
        log::debug!("seek to {:.2}s", at.as_secs_f32());
        self.audio.seek(at);
    }

    pub fn on_drag_start(&mut self) {
        if self.current.is_none() {
            return;
        }
        self.waveform.pause();
        self.seeking = true;
    }

    pub fn on_drag_end(&mut self) {
        if self.current.is_none() {
            return;
        }
        self.audio.seek(self.waveform.current_time());
        if self.state == (SessionState::Ready { playing: true }) {
            self.waveform.play();
        }
        self.seeking = false;
    }

    pub fn on_finish(&mut self, now: Instant) {
        if !matches!(self.state, SessionState::Ready { .. }) {
            return;
        }
        self.audio.stop();
        self.waveform.stop();
        self.waveform.set_time(Duration::ZERO);
        self.state = SessionState::Ready { playing: false };
        self.next_token();

        if self.looping {
            if let Err(e) = self.play(now) {
                log::warn!("loop replay failed: {e}");
            }
        }
    }

    fn on_waveform_failed(&mut self, reason: String, now: Instant) {
        let Some(id) = self.current_id() else {
            return;
        };
        log::warn!("waveform failed: {reason}");
        if let Some(track) = self.library.get_mut(id) {
            self.notices
                .push(format!("{}: {reason}", track.name));
            track.error.get_or_insert(reason);
        }
        if let SessionState::Loading { auto_resume } = self.state {
            self.state = SessionState::Ready { playing: false };
            if auto_resume {
                self.resume_after_load(now);
            }
        }
    }

    /// Fade out what is playing, blocking for at most `fade_out`, then release
    /// the current resource.
    pub fn shutdown(&mut self, fade_out: Duration) {
        let audible = self.current.as_ref().is_some_and(|c| c.audible);
        if audible && self.audio.is_playing() && !fade_out.is_zero() {
            let start = Instant::now();
            self.audio.fade(self.audio.volume(), 0.0, fade_out, start);
            while start.elapsed() < fade_out {
                self.audio.tick(Instant::now());
                thread::sleep(Duration::from_millis(10));
            }
            self.audio.tick(Instant::now());
        }
        self.release_current();
        self.state = SessionState::Idle;
    }

    // --- internals ---------------------------------------------------------

    fn token(&self) -> Token {
        Token {
            generation: self.generation,
            epoch: self.epoch,
        }
    }

    fn next_token(&mut self) -> Token {
        self.epoch += 1;
        self.token()
    }

    fn theme_or_random(&mut self) -> ThemePair {
        match &self.theme {
            Some(theme) => theme.clone(),
            None => ThemePair::random(&mut self.rng),
        }
    }

    fn ensure_audible(&self) -> Result<(), SessionError> {
        let Some(current) = &self.current else {
            return Err(SessionError::NoTrack);
        };
        if current.audible {
            return Ok(());
        }
        let (name, reason) = self
            .library
            .get(current.id)
            .map(|t| {
                (
                    t.name.clone(),
                    t.error.clone().unwrap_or_else(|| "not playable".into()),
                )
            })
            .unwrap_or_else(|| (current.id.to_string(), "not playable".into()));
        Err(SessionError::Unplayable { name, reason })
    }

    fn start_playback(&mut self, now: Instant) {
        self.state = SessionState::Ready { playing: true };
        let token = self.next_token();
        self.audio.play();
        self.waveform.play();
        self.timers
            .schedule(now, self.timing.play_delay, token, Deferred::RampUp);
    }

    fn resume_after_load(&mut self, now: Instant) {
        match self.ensure_audible() {
            Ok(()) => self.start_playback(now),
            Err(e) => {
                log::warn!("not resuming: {e}");
                self.notices.push(e.to_string());
            }
        }
    }

    /// Stop and release the current resource, then acquire one for `id`.
    fn make_current(&mut self, id: TrackId, auto_resume: bool) {
        self.release_current();

        let Some(track) = self.library.get_mut(id) else {
            return;
        };
        let handle = self.handles.acquire(id, &track.path);

        let audible = match format::resolve(track.mime.as_deref()) {
            Ok(fmt) => match self.audio.load(&handle, fmt) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("{e}");
                    self.notices.push(format!("{}: {e}", track.name));
                    track.error = Some(e.to_string());
                    false
                }
            },
            Err(e) => {
                log::warn!("{}: {e}", track.name);
                self.notices.push(format!("{}: {e}", track.name));
                track.error = Some(e.to_string());
                false
            }
        };
        log::info!("switched to {}", track.name);

        self.muted = false;
        self.waveform.load(&handle);
        if let Some(theme) = &self.theme {
            self.waveform.set_colors(theme);
        }
        self.current = Some(Current {
            id,
            handle,
            audible,
        });
        self.state = SessionState::Loading { auto_resume };
    }

    fn release_current(&mut self) {
        self.generation += 1;
        self.timers.clear();
        self.seeking = false;

        let Some(current) = self.current.take() else {
            return;
        };
        self.audio.stop();
        self.audio.unload();
        self.waveform.stop();
        self.waveform.clear();
        log::debug!(
            "releasing {} for track {}",
            current.handle.path().display(),
            current.handle.track()
        );
    }
}
