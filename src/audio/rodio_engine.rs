use std::path::PathBuf;
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};

use super::fade::Fade;
use super::resource::ResourceHandle;
use super::sink::create_sink_at;
use super::types::{AudioEngine, EngineError};
use crate::format::PlaybackFormat;

/// `AudioEngine` on top of a rodio output stream.
///
/// Position is tracked the same way the sink is driven: time accumulated while
/// paused plus the wall clock since the last resume. Seeking rebuilds the sink
/// and skips into the file.
pub struct RodioEngine {
    stream: OutputStream,
    sink: Option<Sink>,
    loaded: Option<PathBuf>,
    volume: f32,
    fade: Option<Fade>,
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl RodioEngine {
    pub fn open() -> Result<Self, EngineError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| EngineError::NoDevice(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped, which would tear the TUI.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            sink: None,
            loaded: None,
            volume: 1.0,
            fade: None,
            started_at: None,
            accumulated: Duration::ZERO,
        })
    }

    fn rebuild_at(&mut self, at: Duration) {
        let Some(path) = self.loaded.clone() else {
            return;
        };
        let was_playing = self.is_playing();
        if let Some(old) = self.sink.take() {
            old.stop();
        }

        match create_sink_at(&self.stream, &path, at, self.volume) {
            Ok(sink) => {
                if was_playing {
                    sink.play();
                    self.started_at = Some(Instant::now());
                } else {
                    self.started_at = None;
                }
                self.sink = Some(sink);
                self.accumulated = at;
            }
            Err(e) => {
                log::warn!("rebuilding sink for {} failed: {e}", path.display());
                self.started_at = None;
                self.accumulated = Duration::ZERO;
            }
        }
    }
}

impl AudioEngine for RodioEngine {
    fn load(&mut self, handle: &ResourceHandle, format: PlaybackFormat) -> Result<(), EngineError> {
        self.unload();
        let sink = create_sink_at(&self.stream, handle.path(), Duration::ZERO, 1.0)?;
        log::info!("loaded {} as {format}", handle.path().display());
        self.sink = Some(sink);
        self.loaded = Some(handle.path().to_path_buf());
        self.volume = 1.0;
        Ok(())
    }

    fn unload(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.loaded = None;
        self.fade = None;
        self.started_at = None;
        self.accumulated = Duration::ZERO;
    }

    fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    fn play(&mut self) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        if self.started_at.is_none() {
            sink.play();
            self.started_at = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        sink.pause();
        if let Some(st) = self.started_at.take() {
            self.accumulated += st.elapsed();
        }
    }

    fn stop(&mut self) {
        self.pause();
        if self.loaded.is_some() {
            self.rebuild_at(Duration::ZERO);
        }
    }

    fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }

    fn seek(&mut self, position: Duration) {
        if self.loaded.is_some() {
            self.rebuild_at(position);
        }
    }

    fn position(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn fade(&mut self, from: f32, to: f32, over: Duration, now: Instant) {
        let fade = Fade::new(from, to, now, over);
        self.volume = fade.level_at(now);
        if let Some(sink) = self.sink.as_ref() {
            sink.set_volume(self.volume);
        }
        self.fade = Some(fade);
    }

    fn tick(&mut self, now: Instant) {
        let Some(fade) = self.fade else {
            return;
        };
        self.volume = fade.level_at(now);
        if let Some(sink) = self.sink.as_ref() {
            sink.set_volume(self.volume);
        }
        if fade.is_done(now) {
            self.fade = None;
        }
    }
}
