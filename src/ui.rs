//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph, Row, Table, TableState, Wrap},
};
use std::time::Duration;

use crate::app::{App, InputMode};
use crate::audio::{AudioEngine, WaveformRenderer, resample_peaks};
use crate::color::HexColor;
use crate::config::UiSettings;
use crate::library::{MetadataParser, Track};
use crate::session::{PlaybackSession, SessionState};

const CONTROLS: &[(&str, &str)] = &[
    ("space", "play/pause"),
    ("j/k", "up/down"),
    ("enter", "switch"),
    ("a", "add"),
    ("d", "delete"),
    ("m", "mute"),
    ("l", "loop"),
    ("c", "random colours"),
    ("w/p", "edit colours"),
    ("q", "quit"),
];

fn controls_text() -> String {
    CONTROLS
        .iter()
        .map(|(k, v)| format!("[{k}] {v}"))
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn rgb(color: &HexColor) -> Color {
    let (r, g, b) = color.rgb();
    Color::Rgb(r, g, b)
}

/// Header line: the current track, or a hint for what to do next.
fn heading<A, W, M>(session: &PlaybackSession<A, W, M>) -> String
where
    A: AudioEngine,
    W: WaveformRenderer,
    M: MetadataParser,
{
    match session.current_track() {
        Some(track) => track.name.clone(),
        None if session.library().is_empty() => "Upload a new track".to_string(),
        None => "Select a new track".to_string(),
    }
}

/// One text row per terminal line, bars centred vertically and split in
/// colour at the playhead.
fn waveform_lines(
    peaks: &[f32],
    width: u16,
    height: u16,
    progress: f32,
    wave: Color,
    played: Color,
) -> Vec<Line<'static>> {
    let width = width as usize;
    let height = height as usize;
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let columns = resample_peaks(peaks, width);
    let split = (progress.clamp(0.0, 1.0) * width as f32).round() as usize;
    let centre = (height as f32 - 1.0) / 2.0;

    (0..height)
        .map(|row| {
            let spans: Vec<Span<'static>> = columns
                .iter()
                .enumerate()
                .map(|(x, peak)| {
                    let half = (peak * height as f32 / 2.0).max(0.5);
                    let filled = (row as f32 - centre).abs() < half;
                    let color = if x < split { played } else { wave };
                    Span::styled(if filled { "█" } else { " " }, Style::default().fg(color))
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn track_row<'a>(track: &'a Track, is_current: bool, state: SessionState) -> Row<'a> {
    let meta = track.metadata.as_ref();
    let duration = track
        .duration()
        .map(format_mmss)
        .unwrap_or_else(|| "-".to_string());
    let bpm = meta
        .and_then(|m| m.bpm)
        .map(|b| format!("{b:.0}"))
        .unwrap_or_else(|| "-".to_string());
    let key = meta
        .and_then(|m| m.key.clone())
        .unwrap_or_else(|| "-".to_string());
    let status = if track.error.is_some() {
        "error"
    } else if is_current {
        state.label()
    } else {
        ""
    };

    let name = if is_current {
        format!("▶ {}", track.name)
    } else {
        format!("  {}", track.name)
    };
    let row = Row::new(vec![
        name,
        track.type_label().to_string(),
        duration,
        bpm,
        key,
        status.to_string(),
    ]);
    if track.error.is_some() {
        row.style(Style::default().fg(Color::Red))
    } else {
        row
    }
}

/// Render the entire UI. Returns the area the waveform was drawn into, which
/// the runtime uses to map mouse positions onto the playhead.
pub fn draw<A, W, M>(
    frame: &mut Frame,
    app: &App,
    session: &PlaybackSession<A, W, M>,
    ui_settings: &UiSettings,
) -> Rect
where
    A: AudioEngine,
    W: WaveformRenderer,
    M: MetadataParser,
{
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(9),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(heading(session))
        .alignment(Alignment::Center)
        .bold()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(ui_settings.header_text.as_str())
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Waveform
    let theme = session.displayed_theme();
    let wave_block = Block::default().borders(Borders::ALL).title(" waveform ");
    let wave_area = wave_block.inner(chunks[1]);
    frame.render_widget(wave_block, chunks[1]);

    let waveform = session.waveform();
    match (session.state(), waveform.peaks()) {
        (SessionState::Idle, _) => {}
        (_, Some(peaks)) => {
            let progress = match waveform.duration() {
                Some(d) if !d.is_zero() => {
                    waveform.current_time().as_secs_f32() / d.as_secs_f32()
                }
                _ => 0.0,
            };
            let lines = waveform_lines(
                peaks,
                wave_area.width,
                wave_area.height,
                progress,
                rgb(&theme.wave),
                rgb(&theme.progress),
            );
            frame.render_widget(Paragraph::new(lines), wave_area);
        }
        (SessionState::Loading { .. }, None) => {
            frame.render_widget(
                Paragraph::new("loading waveform…")
                    .alignment(Alignment::Center)
                    .italic(),
                wave_area,
            );
        }
        (SessionState::Ready { .. }, None) => {
            frame.render_widget(
                Paragraph::new("no waveform available").alignment(Alignment::Center),
                wave_area,
            );
        }
    }

    // Transport line: time, colour swatches, flags.
    let total = waveform
        .duration()
        .or_else(|| session.current_track().and_then(Track::duration));
    let time = match (session.current_id(), total) {
        (Some(_), Some(total)) => format!(
            "{} / {}",
            format_mmss(waveform.current_time()),
            format_mmss(total)
        ),
        (Some(_), None) => format!("{} / --:--", format_mmss(waveform.current_time())),
        (None, _) => "--:-- / --:--".to_string(),
    };
    let mut spans = vec![
        Span::raw(format!(" {time}  ")),
        Span::styled("■", Style::default().fg(rgb(&theme.wave))),
        Span::raw(format!(" {}  ", theme.wave)),
        Span::styled("■", Style::default().fg(rgb(&theme.progress))),
        Span::raw(format!(" {}  ", theme.progress)),
        Span::styled(
            session.state().label().to_uppercase(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    spans.push(Span::raw(format!(
        "  VOL {:>3}%",
        (session.audio().volume() * 100.0).round() as u32
    )));
    if session.is_muted() {
        spans.push(Span::raw("  MUTED"));
    }
    if session.is_looping() {
        spans.push(Span::raw("  LOOP"));
    }
    if session.is_seeking() {
        spans.push(Span::raw("  SEEKING"));
    }
    let transport = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" transport "));
    frame.render_widget(transport, chunks[2]);

    // Track table
    let current = session.current_id();
    let state = session.state();
    let rows: Vec<Row> = session
        .library()
        .iter()
        .map(|t| track_row(t, Some(t.id) == current, state))
        .collect();
    let widths = [
        Constraint::Percentage(40),
        Constraint::Length(8),
        Constraint::Length(9),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(8),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["NAME", "TYPE", "DURATION", "BPM", "KEY", "STATUS"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(" tracks "))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut table_state = TableState::default();
    if !session.library().is_empty() {
        table_state.select(Some(app.selected));
    }
    frame.render_stateful_widget(table, chunks[3], &mut table_state);

    // Footer: prompt, status message or controls.
    let (title, text) = match &app.mode {
        InputMode::Prompt { kind, buffer } => (kind.title(), format!("{buffer}▏")),
        InputMode::Normal => match app.status() {
            Some(msg) => (" status ", msg.to_string()),
            None => (" controls ", controls_text()),
        },
    };
    let footer = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);

    wave_area
}
