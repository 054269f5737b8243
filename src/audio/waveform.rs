//! Waveform analysis and the visual playhead.
//!
//! `TerminalWaveform` decodes the resource on a worker thread into block
//! maxima, which are folded into a fixed number of peak buckets for drawing.
//! The playhead is a clock advanced by `tick` while playing.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use rodio::Source;

use super::resource::ResourceHandle;
use super::sink::open_decoder;
use super::types::{WaveEvent, WaveformRenderer};
use crate::color::ThemePair;
use crate::config::WaveformSettings;

/// Samples folded into one block maximum during analysis.
const BLOCK: usize = 1024;

struct Analysis {
    generation: u64,
    result: Result<(Vec<f32>, Duration), String>,
}

#[derive(Debug, Clone, Copy)]
struct Pointer {
    dragging: bool,
}

pub struct TerminalWaveform {
    buckets: usize,
    short_track: Duration,
    generation: u64,
    tx: Sender<Analysis>,
    rx: Receiver<Analysis>,
    peaks: Option<Vec<f32>>,
    duration: Option<Duration>,
    colors: Option<ThemePair>,
    playing: bool,
    time: Duration,
    last_tick: Option<Instant>,
    pointer: Option<Pointer>,
    events: Vec<WaveEvent>,
}

impl TerminalWaveform {
    pub fn new(settings: &WaveformSettings) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            buckets: settings.peaks.max(1),
            short_track: Duration::try_from_secs_f64(settings.short_track_secs.max(0.0))
                .unwrap_or(Duration::MAX),
            generation: 0,
            tx,
            rx,
            peaks: None,
            duration: None,
            colors: None,
            playing: false,
            time: Duration::ZERO,
            last_tick: None,
            pointer: None,
            events: Vec::new(),
        }
    }

    fn time_at(&self, fraction: f32) -> Duration {
        let d = self.duration.unwrap_or_default();
        d.mul_f32(fraction.clamp(0.0, 1.0))
    }

    fn collect_analysis(&mut self) {
        let finished: Vec<Analysis> = self.rx.try_iter().collect();
        for analysis in finished {
            if analysis.generation != self.generation {
                log::debug!("dropping waveform analysis of generation {}", analysis.generation);
                continue;
            }
            match analysis.result {
                Ok((blocks, duration)) => {
                    if duration < self.short_track {
                        log::info!("short track ({:.2}s), drawing without smoothing", duration.as_secs_f32());
                    }
                    self.peaks = Some(resample_peaks(&blocks, self.buckets));
                    self.duration = Some(duration);
                    self.events.push(WaveEvent::Ready);
                }
                Err(reason) => self.events.push(WaveEvent::Failed(reason)),
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn inject_analysis(&self, result: Result<(Vec<f32>, Duration), String>) {
        let _ = self.tx.send(Analysis {
            generation: self.generation,
            result,
        });
    }
}

impl WaveformRenderer for TerminalWaveform {
    fn load(&mut self, handle: &ResourceHandle) {
        self.clear();
        let generation = self.generation;
        let tx = self.tx.clone();
        let path = handle.path().to_path_buf();

        let spawned = thread::Builder::new()
            .name("wavedeck-waveform".into())
            .spawn(move || {
                let result = analyse(&path);
                let _ = tx.send(Analysis { generation, result });
            });
        if let Err(e) = spawned {
            self.events
                .push(WaveEvent::Failed(format!("could not start waveform worker: {e}")));
        }
    }

    fn clear(&mut self) {
        self.generation += 1;
        self.peaks = None;
        self.duration = None;
        self.playing = false;
        self.time = Duration::ZERO;
        self.last_tick = None;
        self.pointer = None;
        self.events.clear();
    }

    fn is_ready(&self) -> bool {
        self.peaks.is_some()
    }

    fn play(&mut self) {
        if !self.playing {
            self.playing = true;
            self.last_tick = None;
        }
    }

    fn pause(&mut self) {
        self.playing = false;
        self.last_tick = None;
    }

    fn stop(&mut self) {
        self.pause();
        self.time = Duration::ZERO;
    }

    fn set_time(&mut self, time: Duration) {
        self.time = match self.duration {
            Some(d) => time.min(d),
            None => time,
        };
    }

    fn current_time(&self) -> Duration {
        self.time
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn set_colors(&mut self, theme: &ThemePair) {
        self.colors = Some(theme.clone());
    }

    fn colors(&self) -> Option<&ThemePair> {
        self.colors.as_ref()
    }

    fn peaks(&self) -> Option<&[f32]> {
        self.peaks.as_deref()
    }

    fn pointer_down(&mut self, fraction: f32) {
        if !self.is_ready() {
            return;
        }
        self.time = self.time_at(fraction);
        self.pointer = Some(Pointer { dragging: false });
    }

    fn pointer_drag(&mut self, fraction: f32) {
        let Some(pointer) = self.pointer.as_mut() else {
            return;
        };
        if !pointer.dragging {
            pointer.dragging = true;
            self.events.push(WaveEvent::DragStart);
        }
        self.time = self.time_at(fraction);
    }

    fn pointer_up(&mut self, fraction: f32) {
        let Some(pointer) = self.pointer.take() else {
            return;
        };
        self.time = self.time_at(fraction);
        self.events.push(if pointer.dragging {
            WaveEvent::DragEnd
        } else {
            WaveEvent::Click
        });
    }

    fn tick(&mut self, now: Instant) {
        self.collect_analysis();

        if !self.playing {
            return;
        }
        if let Some(last) = self.last_tick {
            self.time += now.saturating_duration_since(last);
        }
        self.last_tick = Some(now);

        if let Some(d) = self.duration {
            if self.time >= d {
                self.time = d;
                self.playing = false;
                self.last_tick = None;
                self.events.push(WaveEvent::Finish);
            }
        }
    }

    fn poll_events(&mut self) -> Vec<WaveEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Decode `path` and return its block maxima plus the decoded duration.
fn analyse(path: &Path) -> Result<(Vec<f32>, Duration), String> {
    let decoder = open_decoder(path).map_err(|e| e.to_string())?;
    let channels = u64::from(u16::from(decoder.channels())).max(1);
    let rate = u64::from(u32::from(decoder.sample_rate())).max(1);

    let mut blocks = Vec::new();
    let mut current = 0.0f32;
    let mut in_block = 0usize;
    let mut samples: u64 = 0;

    for sample in decoder {
        current = current.max(sample.abs());
        in_block += 1;
        samples += 1;
        if in_block == BLOCK {
            blocks.push(current);
            current = 0.0;
            in_block = 0;
        }
    }
    if in_block > 0 {
        blocks.push(current);
    }
    if samples == 0 {
        return Err(format!("{} decoded to no samples", path.display()));
    }

    let frames = samples / channels;
    let duration = Duration::from_secs_f64(frames as f64 / rate as f64);
    Ok((blocks, duration))
}

/// Fold `peaks` into `n` buckets by maximum and normalise to 0..=1.
///
/// Fewer inputs than buckets repeats inputs; an empty input gives silence.
pub fn resample_peaks(peaks: &[f32], n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    if peaks.is_empty() {
        return vec![0.0; n];
    }

    let len = peaks.len();
    let mut out: Vec<f32> = (0..n)
        .map(|i| {
            let start = (i * len / n).min(len - 1);
            let end = ((i + 1) * len / n).clamp(start + 1, len);
            peaks[start..end]
                .iter()
                .fold(0.0f32, |acc, p| acc.max(p.abs()))
        })
        .collect();

    let max = out.iter().fold(0.0f32, |acc, p| acc.max(*p));
    if max > 0.0 {
        for p in &mut out {
            *p /= max;
        }
    }
    out
}
