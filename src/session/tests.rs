use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::*;
use crate::audio::{AudioEngine, EngineError, Fade, ResourceHandle, WaveEvent, WaveformRenderer};
use crate::color::ThemePair;
use crate::config::Settings;
use crate::format::PlaybackFormat;
use crate::library::{
    MetadataError, MetadataOutcome, MetadataParser, TrackId, TrackMetadata,
};

#[derive(Default)]
struct FakeAudio {
    loaded: Option<PathBuf>,
    format: Option<PlaybackFormat>,
    playing: bool,
    volume: f32,
    fade: Option<Fade>,
    fades: usize,
    plays: usize,
    stops: usize,
    seeks: Vec<Duration>,
    fail_load: bool,
}

impl AudioEngine for FakeAudio {
    fn load(&mut self, handle: &ResourceHandle, format: PlaybackFormat) -> Result<(), EngineError> {
        if self.fail_load {
            return Err(EngineError::Decode {
                path: handle.path().to_path_buf(),
                reason: "corrupt".into(),
            });
        }
        self.loaded = Some(handle.path().to_path_buf());
        self.format = Some(format);
        self.volume = 1.0;
        Ok(())
    }
    fn unload(&mut self) {
        self.loaded = None;
        self.playing = false;
        self.fade = None;
    }
    fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }
    fn play(&mut self) {
        self.plays += 1;
        self.playing = true;
    }
    fn pause(&mut self) {
        self.playing = false;
    }
    fn stop(&mut self) {
        self.stops += 1;
        self.playing = false;
    }
    fn is_playing(&self) -> bool {
        self.playing
    }
    fn seek(&mut self, position: Duration) {
        self.seeks.push(position);
    }
    fn position(&self) -> Duration {
        Duration::ZERO
    }
    fn volume(&self) -> f32 {
        self.volume
    }
    fn fade(&mut self, from: f32, to: f32, over: Duration, now: Instant) {
        self.fades += 1;
        let fade = Fade::new(from, to, now, over);
        self.volume = fade.level_at(now);
        self.fade = Some(fade);
    }
    fn tick(&mut self, now: Instant) {
        if let Some(fade) = self.fade {
            self.volume = fade.level_at(now);
            if fade.is_done(now) {
                self.fade = None;
            }
        }
    }
}

#[derive(Default)]
struct FakeWave {
    loaded: Option<PathBuf>,
    ready: bool,
    playing: bool,
    time: Duration,
    colors: Option<ThemePair>,
    events: Vec<WaveEvent>,
    loads: usize,
    clears: usize,
}

impl FakeWave {
    fn emit(&mut self, event: WaveEvent) {
        if event == WaveEvent::Ready {
            self.ready = true;
        }
        self.events.push(event);
    }
}

impl WaveformRenderer for FakeWave {
    fn load(&mut self, handle: &ResourceHandle) {
        self.loads += 1;
        self.loaded = Some(handle.path().to_path_buf());
        self.ready = false;
    }
    fn clear(&mut self) {
        self.clears += 1;
        self.loaded = None;
        self.ready = false;
    }
    fn is_ready(&self) -> bool {
        self.ready
    }
    fn play(&mut self) {
        self.playing = true;
    }
    fn pause(&mut self) {
        self.playing = false;
    }
    fn stop(&mut self) {
        self.playing = false;
        self.time = Duration::ZERO;
    }
    fn set_time(&mut self, time: Duration) {
        self.time = time;
    }
    fn current_time(&self) -> Duration {
        self.time
    }
    fn duration(&self) -> Option<Duration> {
        self.ready.then_some(Duration::from_secs(60))
    }
    fn set_colors(&mut self, theme: &ThemePair) {
        self.colors = Some(theme.clone());
    }
    fn colors(&self) -> Option<&ThemePair> {
        self.colors.as_ref()
    }
    fn peaks(&self) -> Option<&[f32]> {
        None
    }
    fn pointer_down(&mut self, _fraction: f32) {}
    fn pointer_drag(&mut self, _fraction: f32) {}
    fn pointer_up(&mut self, _fraction: f32) {}
    fn tick(&mut self, _now: Instant) {}
    fn poll_events(&mut self) -> Vec<WaveEvent> {
        std::mem::take(&mut self.events)
    }
}

#[derive(Default)]
struct FakeMeta {
    requests: Vec<(TrackId, PathBuf)>,
    outcomes: Vec<MetadataOutcome>,
}

impl MetadataParser for FakeMeta {
    fn request(&mut self, id: TrackId, path: &Path) {
        self.requests.push((id, path.to_path_buf()));
    }
    fn poll(&mut self) -> Vec<MetadataOutcome> {
        std::mem::take(&mut self.outcomes)
    }
}

type Session = PlaybackSession<FakeAudio, FakeWave, FakeMeta>;

fn session() -> Session {
    PlaybackSession::new(
        FakeAudio::default(),
        FakeWave::default(),
        FakeMeta::default(),
        &Settings::default(),
    )
    .with_seed(7)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn make_ready(s: &mut Session, now: Instant) {
    s.waveform_mut().emit(WaveEvent::Ready);
    s.pump(now);
}

/// Session with one ready mp3 that has been playing long enough to be at full volume.
fn playing_session(t0: Instant) -> (Session, TrackId) {
    let mut s = session();
    let id = s.ingest(Path::new("/music/a.mp3"));
    make_ready(&mut s, t0);
    s.play(t0).unwrap();
    s.pump(t0 + ms(100));
    s.pump(t0 + ms(200));
    (s, id)
}

#[test]
fn ingest_while_idle_makes_track_current_and_loading() {
    let mut s = session();
    assert_eq!(s.state(), SessionState::Idle);
    assert_eq!(s.live_handles(), 0);

    let id = s.ingest(Path::new("/music/a.mp3"));

    assert_eq!(s.current_id(), Some(id));
    assert_eq!(s.state(), SessionState::Loading { auto_resume: false });
    assert_eq!(s.live_handles(), 1);
    assert_eq!(s.audio().loaded.as_deref(), Some(Path::new("/music/a.mp3")));
    assert_eq!(s.audio().format, Some(PlaybackFormat::Mp3));
    assert_eq!(s.waveform().loads, 1);
    assert_eq!(s.metadata_mut().requests.len(), 1);

    let theme = s.theme().cloned().unwrap();
    assert_eq!(s.waveform().colors.as_ref(), Some(&theme));
    assert_eq!(s.displayed_theme(), theme);
}

#[test]
fn waveform_ready_moves_loading_to_paused() {
    let mut s = session();
    s.ingest(Path::new("/music/a.mp3"));
    make_ready(&mut s, Instant::now());
    assert_eq!(s.state(), SessionState::Ready { playing: false });
    assert!(!s.audio().playing);
}

#[test]
fn play_twice_is_a_noop() {
    let t0 = Instant::now();
    let mut s = session();
    s.ingest(Path::new("/music/a.mp3"));
    make_ready(&mut s, t0);

    s.play(t0).unwrap();
    s.play(t0).unwrap();

    assert_eq!(s.state(), SessionState::Ready { playing: true });
    assert_eq!(s.audio().plays, 1);
    assert!(s.waveform().playing);
    assert_eq!(s.pending_timers(), 1);
}

#[test]
fn play_ramps_volume_up_after_delay() {
    let t0 = Instant::now();
    let (mut s, _) = playing_session(t0);
    let t1 = t0 + ms(1000);
    s.pause(t1);
    s.pump(t1 + ms(100));
    assert_eq!(s.audio().volume, 0.0);

    let t2 = t1 + ms(500);
    s.play(t2).unwrap();
    assert!(s.audio().playing);
    s.pump(t2 + ms(50));
    assert_eq!(s.audio().volume, 0.0);
    s.pump(t2 + ms(100));
    s.pump(t2 + ms(200));
    assert_eq!(s.audio().volume, 1.0);
}

#[test]
fn pause_fades_out_then_pauses_both_engines() {
    let t0 = Instant::now();
    let (mut s, _) = playing_session(t0);
    assert_eq!(s.audio().volume, 1.0);

    let t1 = t0 + ms(1000);
    s.pause(t1);
    assert_eq!(s.state(), SessionState::Ready { playing: false });

    s.pump(t1 + ms(50));
    assert!(s.audio().playing);
    assert!(s.audio().volume < 1.0 && s.audio().volume > 0.0);

    s.pump(t1 + ms(100));
    assert!(!s.audio().playing);
    assert!(!s.waveform().playing);
    assert_eq!(s.audio().volume, 0.0);

    s.pause(t1 + ms(200));
    assert_eq!(s.pending_timers(), 0);
}

#[test]
fn play_during_pause_fade_cancels_the_pending_pause() {
    let t0 = Instant::now();
    let (mut s, _) = playing_session(t0);

    let t1 = t0 + ms(1000);
    s.pause(t1);
    s.play(t1 + ms(50)).unwrap();
    s.pump(t1 + ms(100));
    assert!(s.audio().playing);
    assert!(s.waveform().playing);

    s.pump(t1 + ms(150));
    s.pump(t1 + ms(300));
    assert_eq!(s.state(), SessionState::Ready { playing: true });
    assert_eq!(s.audio().volume, 1.0);
}

#[test]
fn pause_before_ramp_drops_the_ramp() {
    let t0 = Instant::now();
    let mut s = session();
    s.ingest(Path::new("/music/a.mp3"));
    make_ready(&mut s, t0);
    s.play(t0).unwrap();
    s.pause(t0 + ms(20));
    let fades = s.audio().fades;

    s.pump(t0 + ms(150));
    assert_eq!(s.audio().fades, fades);
    assert!(!s.audio().playing);
}

#[test]
fn switching_to_the_current_track_is_a_noop() {
    let mut s = session();
    let id = s.ingest(Path::new("/music/a.mp3"));
    assert!(!s.switch_to(id).unwrap());
    assert_eq!(s.waveform().loads, 1);
    assert_eq!(s.waveform().clears, 0);
    assert_eq!(s.live_handles(), 1);
}

#[test]
fn switch_mid_fade_releases_old_and_auto_resumes_new() {
    let t0 = Instant::now();
    let mut s = session();
    s.ingest(Path::new("/music/a.mp3"));
    make_ready(&mut s, t0);
    s.play(t0).unwrap();

    let b = s.ingest(Path::new("/music/b.wav"));
    assert_ne!(s.current_id(), Some(b));

    assert!(s.switch_to(b).unwrap());
    assert_eq!(s.current_id(), Some(b));
    assert_eq!(s.live_handles(), 1);
    assert_eq!(s.state(), SessionState::Loading { auto_resume: true });
    assert_eq!(s.audio().loaded.as_deref(), Some(Path::new("/music/b.wav")));
    assert_eq!(s.waveform().clears, 1);
    assert_eq!(s.pending_timers(), 0);
    assert!(s.is_playing());

    let plays = s.audio().plays;
    make_ready(&mut s, t0 + ms(150));
    assert_eq!(s.state(), SessionState::Ready { playing: true });
    assert_eq!(s.audio().plays, plays + 1);
}

#[test]
fn switch_while_paused_does_not_resume() {
    let t0 = Instant::now();
    let mut s = session();
    s.ingest(Path::new("/music/a.mp3"));
    let b = s.ingest(Path::new("/music/b.mp3"));
    assert_eq!(s.current_id(), Some(b));

    let a = s.library().at(0).unwrap().id;
    s.switch_to(a).unwrap();
    make_ready(&mut s, t0);
    assert_eq!(s.state(), SessionState::Ready { playing: false });
    assert_eq!(s.audio().plays, 0);
}

#[test]
fn switch_to_unknown_track_fails() {
    let mut s = session();
    s.ingest(Path::new("/music/a.mp3"));
    assert!(matches!(
        s.switch_to(TrackId::new()),
        Err(SessionError::UnknownTrack(_))
    ));
}

#[test]
fn switching_reapplies_the_theme() {
    let mut s = session();
    s.ingest(Path::new("/music/a.mp3"));
    let b = s.ingest(Path::new("/music/b.mp3"));
    s.set_wave_color("#ABC").unwrap();
    let theme = s.theme().cloned().unwrap();

    let a = s.library().at(0).unwrap().id;
    s.switch_to(a).unwrap();
    s.switch_to(b).unwrap();
    assert_eq!(s.theme(), Some(&theme));
    assert_eq!(s.waveform().colors.as_ref(), Some(&theme));
    assert_eq!(theme.wave.as_str(), "#aabbcc");
}

#[test]
fn delete_current_returns_to_idle_and_releases() {
    let t0 = Instant::now();
    let (mut s, id) = playing_session(t0);
    s.ingest(Path::new("/music/b.mp3"));

    s.delete(id).unwrap();

    assert_eq!(s.state(), SessionState::Idle);
    assert_eq!(s.current_id(), None);
    assert_eq!(s.live_handles(), 0);
    assert!(!s.audio().is_loaded());
    assert!(s.waveform().loaded.is_none());
    assert_eq!(s.library().len(), 1);
    assert_eq!(
        s.displayed_theme(),
        ThemePair::neutral(&Settings::default().neutral_color())
    );
}

#[test]
fn delete_non_current_leaves_playback_alone() {
    let t0 = Instant::now();
    let (mut s, id) = playing_session(t0);
    let b = s.ingest(Path::new("/music/b.mp3"));

    s.delete(b).unwrap();

    assert_eq!(s.current_id(), Some(id));
    assert_eq!(s.state(), SessionState::Ready { playing: true });
    assert!(s.audio().playing);
    assert_eq!(s.live_handles(), 1);
    assert!(matches!(s.delete(b), Err(SessionError::UnknownTrack(_))));
}

#[test]
fn mute_is_idempotent_and_independent_of_pause() {
    let t0 = Instant::now();
    let (mut s, _) = playing_session(t0);
    let fades = s.audio().fades;

    let t1 = t0 + ms(1000);
    s.mute(t1);
    s.mute(t1);
    assert!(s.is_muted());
    assert_eq!(s.audio().fades, fades + 1);
    assert_eq!(s.state(), SessionState::Ready { playing: true });

    s.pump(t1 + ms(200));
    assert_eq!(s.audio().volume, 0.0);

    s.unmute(t1 + ms(300));
    s.unmute(t1 + ms(300));
    assert!(!s.is_muted());
    assert_eq!(s.audio().fades, fades + 2);
    assert!(s.is_playing());

    s.pause(t1 + ms(600));
    s.toggle_mute(t1 + ms(700));
    assert!(s.is_muted());
    assert!(!s.is_playing());
}

#[test]
fn play_while_muted_keeps_volume_down() {
    let t0 = Instant::now();
    let mut s = session();
    s.ingest(Path::new("/music/a.mp3"));
    make_ready(&mut s, t0);
    s.mute(t0);
    s.play(t0).unwrap();
    s.pump(t0 + ms(100));
    s.pump(t0 + ms(300));
    assert_eq!(s.audio().volume, 0.0);
}

#[test]
fn new_track_resets_mute() {
    let mut s = session();
    s.ingest(Path::new("/music/a.mp3"));
    s.mute(Instant::now());
    let b = s.ingest(Path::new("/music/b.mp3"));
    assert_eq!(s.current_id(), Some(b));
    assert!(!s.is_muted());
}

#[test]
fn finish_without_loop_stops_and_rewinds() {
    let t0 = Instant::now();
    let (mut s, _) = playing_session(t0);
    s.waveform_mut().set_time(Duration::from_secs(60));

    s.waveform_mut().emit(WaveEvent::Finish);
    s.pump(t0 + ms(1000));

    assert_eq!(s.state(), SessionState::Ready { playing: false });
    assert_eq!(s.audio().stops, 1);
    assert!(!s.audio().playing);
    assert_eq!(s.waveform().time, Duration::ZERO);
}

#[test]
fn loop_replays_once_per_finish() {
    let t0 = Instant::now();
    let (mut s, _) = playing_session(t0);
    s.set_loop(true);
    let plays = s.audio().plays;

    for n in 1..=3u64 {
        s.waveform_mut().emit(WaveEvent::Finish);
        s.pump(t0 + ms(1000 * n));
        assert_eq!(s.state(), SessionState::Ready { playing: true });
        assert_eq!(s.audio().plays, plays + n as usize);
    }

    s.toggle_loop();
    assert!(!s.is_looping());
}

#[test]
fn click_seeks_audio_to_waveform_position() {
    let t0 = Instant::now();
    let (mut s, _) = playing_session(t0);
    s.waveform_mut().set_time(Duration::from_secs(12));
    s.waveform_mut().emit(WaveEvent::Click);
    s.pump(t0 + ms(300));
    assert_eq!(s.audio().seeks, vec![Duration::from_secs(12)]);
}

#[test]
fn drag_pauses_visual_playhead_and_resumes_when_playing() {
    let t0 = Instant::now();
    let (mut s, _) = playing_session(t0);

    s.waveform_mut().emit(WaveEvent::DragStart);
    s.pump(t0 + ms(300));
    assert!(s.is_seeking());
    assert!(!s.waveform().playing);
    assert!(s.audio().playing);

    s.waveform_mut().set_time(Duration::from_secs(30));
    s.waveform_mut().emit(WaveEvent::DragEnd);
    s.pump(t0 + ms(400));
    assert!(!s.is_seeking());
    assert!(s.waveform().playing);
    assert_eq!(s.audio().seeks, vec![Duration::from_secs(30)]);
}

#[test]
fn drag_end_while_paused_keeps_playhead_still() {
    let t0 = Instant::now();
    let mut s = session();
    s.ingest(Path::new("/music/a.mp3"));
    make_ready(&mut s, t0);

    s.waveform_mut().emit(WaveEvent::DragStart);
    s.waveform_mut().emit(WaveEvent::DragEnd);
    s.pump(t0);
    assert!(!s.waveform().playing);
    assert_eq!(s.audio().seeks.len(), 1);
}

#[test]
fn upload_while_playing_keeps_current_track() {
    let t0 = Instant::now();
    let (mut s, id) = playing_session(t0);
    let b = s.ingest(Path::new("/music/b.mp3"));
    assert_eq!(s.current_id(), Some(id));
    assert_eq!(s.library().len(), 2);
    assert_eq!(s.library().ids(), vec![id, b]);
    assert_eq!(s.live_handles(), 1);
}

#[test]
fn play_while_loading_arms_auto_resume() {
    let t0 = Instant::now();
    let mut s = session();
    s.ingest(Path::new("/music/a.mp3"));
    s.play(t0).unwrap();
    assert_eq!(s.state(), SessionState::Loading { auto_resume: true });
    assert_eq!(s.audio().plays, 0);

    s.pause(t0);
    assert_eq!(s.state(), SessionState::Loading { auto_resume: false });

    s.toggle_play(t0).unwrap();
    make_ready(&mut s, t0 + ms(10));
    assert_eq!(s.state(), SessionState::Ready { playing: true });
}

#[test]
fn play_without_track_fails() {
    let mut s = session();
    assert!(matches!(s.play(Instant::now()), Err(SessionError::NoTrack)));
}

#[test]
fn unsupported_format_is_selectable_but_silent() {
    let t0 = Instant::now();
    let mut s = session();
    let id = s.ingest(Path::new("/music/a.flac"));

    assert_eq!(s.current_id(), Some(id));
    assert!(s.audio().loaded.is_none());
    let error = s.current_track().unwrap().error.clone().unwrap();
    assert!(error.contains("audio/flac"));
    assert!(!s.take_notices().is_empty());

    make_ready(&mut s, t0);
    assert!(matches!(
        s.play(t0),
        Err(SessionError::Unplayable { .. })
    ));
    assert_eq!(s.state(), SessionState::Ready { playing: false });
}

#[test]
fn engine_load_failure_marks_the_track() {
    let mut s = PlaybackSession::new(
        FakeAudio {
            fail_load: true,
            ..FakeAudio::default()
        },
        FakeWave::default(),
        FakeMeta::default(),
        &Settings::default(),
    );
    let id = s.ingest(Path::new("/music/a.mp3"));
    let track = s.library().get(id).unwrap();
    assert!(track.error.as_deref().unwrap().contains("corrupt"));
    assert_eq!(s.live_handles(), 1);
}

#[test]
fn waveform_failure_records_error_and_allows_transport() {
    let t0 = Instant::now();
    let mut s = session();
    let id = s.ingest(Path::new("/music/a.mp3"));
    s.waveform_mut().emit(WaveEvent::Failed("no samples".into()));
    s.pump(t0);

    assert_eq!(s.state(), SessionState::Ready { playing: false });
    assert_eq!(s.library().get(id).unwrap().error.as_deref(), Some("no samples"));
    s.play(t0).unwrap();
    assert!(s.audio().playing);
}

#[test]
fn metadata_outcomes_attach_or_leave_absent() {
    let mut s = session();
    let a = s.ingest(Path::new("/music/a.mp3"));
    let b = s.ingest(Path::new("/music/b.mp3"));
    let gone = s.ingest(Path::new("/music/c.mp3"));
    s.delete(gone).unwrap();

    let meta = TrackMetadata {
        bitrate_kbps: Some(320),
        bpm: Some(124.0),
        key: Some("Am".into()),
        ..TrackMetadata::default()
    };
    s.metadata_mut().outcomes = vec![
        MetadataOutcome {
            id: a,
            result: Ok(meta.clone()),
        },
        MetadataOutcome {
            id: b,
            result: Err(MetadataError::Read {
                path: "/music/b.mp3".into(),
                reason: "no tags".into(),
            }),
        },
        MetadataOutcome {
            id: gone,
            result: Ok(TrackMetadata::default()),
        },
    ];
    s.take_notices();
    s.pump(Instant::now());

    assert_eq!(s.library().get(a).unwrap().metadata.as_ref(), Some(&meta));
    assert!(s.library().get(b).unwrap().metadata.is_none());
    assert!(s.library().get(b).unwrap().error.is_none());
    assert_eq!(s.take_notices(), vec!["no metadata for b.mp3".to_string()]);
    assert_eq!(s.library().len(), 2);
}

#[test]
fn colours_randomise_and_validate() {
    let mut s = session();
    s.ingest(Path::new("/music/a.mp3"));
    let before = s.theme().cloned().unwrap();

    s.randomize_colors();
    let after = s.theme().cloned().unwrap();
    assert_ne!(before, after);
    assert_eq!(s.waveform().colors.as_ref(), Some(&after));

    assert!(matches!(
        s.set_progress_color("orange"),
        Err(SessionError::Color(_))
    ));
    assert_eq!(s.theme(), Some(&after));

    s.set_progress_color("#00FF00").unwrap();
    assert_eq!(s.theme().unwrap().progress.as_str(), "#00ff00");
    assert_eq!(s.theme().unwrap().wave, after.wave);
}

#[test]
fn neutral_colours_without_current_track() {
    let s = session();
    let neutral = ThemePair::neutral(&Settings::default().neutral_color());
    assert_eq!(s.displayed_theme(), neutral);
    assert_eq!(neutral.wave.as_str(), "#000000");
}

#[test]
fn shutdown_releases_everything() {
    let t0 = Instant::now();
    let (mut s, _) = playing_session(t0);
    s.shutdown(Duration::ZERO);
    assert_eq!(s.live_handles(), 0);
    assert_eq!(s.state(), SessionState::Idle);
    assert!(!s.audio().is_loaded());
}

#[test]
fn state_labels() {
    assert_eq!(SessionState::Idle.label(), "idle");
    assert_eq!(SessionState::Loading { auto_resume: true }.label(), "loading");
    assert!(SessionState::Loading { auto_resume: true }.wants_playback());
    assert!(!SessionState::Ready { playing: false }.wants_playback());
}

#[test]
fn out_of_range_fade_timings_do_not_panic() {
    let mut settings = Settings::default();
    settings.audio.play_fade_delay_ms = u64::MAX;
    settings.audio.pause_fade_ms = u64::MAX;
    let mut s = PlaybackSession::new(
        FakeAudio::default(),
        FakeWave::default(),
        FakeMeta::default(),
        &settings,
    );
    let t0 = Instant::now();
    s.ingest(Path::new("/music/a.mp3"));
    make_ready(&mut s, t0);

    s.play(t0).unwrap();
    assert_eq!(s.state(), SessionState::Ready { playing: true });
    assert_eq!(s.pending_timers(), 0);

    s.pause(t0 + ms(10));
    s.pump(t0 + ms(20));
    assert_eq!(s.state(), SessionState::Ready { playing: false });
    assert_eq!(s.pending_timers(), 0);
}
