use std::time::{Duration, Instant};

use crossterm::event::{self, Event, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{Action, App, PromptKind, map_key};
use crate::audio::{AudioEngine, WaveformRenderer};
use crate::config;
use crate::library::MetadataParser;
use crate::runtime::startup::{expand_home, ingest_path};
use crate::session::PlaybackSession;
use crate::ui;

/// Main terminal event loop: pumps the session, draws, and handles input.
/// Returns `Ok(())` when shutdown is requested.
pub fn run<A, W, M>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    session: &mut PlaybackSession<A, W, M>,
) -> Result<(), Box<dyn std::error::Error>>
where
    A: AudioEngine,
    W: WaveformRenderer,
    M: MetadataParser,
{
    let mut wave_area = Rect::default();

    loop {
        session.pump(Instant::now());
        if let Some(notice) = session.take_notices().pop() {
            app.set_status(notice);
        }
        app.clamp_selection(session.library().len());

        terminal.draw(|f| wave_area = ui::draw(f, app, session, &settings.ui))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => {
                let Some(action) = map_key(&key, &app.mode) else {
                    continue;
                };
                if apply_action(action, settings, app, session, Instant::now()) {
                    break;
                }
            }
            Event::Mouse(mouse) => handle_mouse(mouse, wave_area, session),
            _ => {}
        }
    }

    session.shutdown(Duration::from_millis(settings.audio.quit_fade_out_ms));
    Ok(())
}

/// Horizontal position of `column` inside `area` as a 0..=1 fraction.
fn fraction_in(area: Rect, column: u16) -> f32 {
    if area.width <= 1 {
        return 0.0;
    }
    let offset = column.saturating_sub(area.x).min(area.width - 1);
    offset as f32 / (area.width - 1) as f32
}

fn handle_mouse<A, W, M>(mouse: MouseEvent, area: Rect, session: &mut PlaybackSession<A, W, M>)
where
    A: AudioEngine,
    W: WaveformRenderer,
    M: MetadataParser,
{
    let fraction = fraction_in(area, mouse.column);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let inside = mouse.column >= area.x
                && mouse.column < area.x + area.width
                && mouse.row >= area.y
                && mouse.row < area.y + area.height;
            if inside {
                session.waveform_mut().pointer_down(fraction);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => session.waveform_mut().pointer_drag(fraction),
        MouseEventKind::Up(MouseButton::Left) => session.waveform_mut().pointer_up(fraction),
        _ => {}
    }
}

/// Apply one action. Returns `true` when the app should quit.
fn apply_action<A, W, M>(
    action: Action,
    settings: &config::Settings,
    app: &mut App,
    session: &mut PlaybackSession<A, W, M>,
    now: Instant,
) -> bool
where
    A: AudioEngine,
    W: WaveformRenderer,
    M: MetadataParser,
{
    if !matches!(action, Action::PromptChar(_) | Action::PromptBackspace) {
        app.clear_status();
    }
    let selected = session.library().at(app.selected).map(|t| t.id);

    match action {
        Action::Quit => return true,
        Action::TogglePlay => {
            if let Err(e) = session.toggle_play(now) {
                app.set_status(e.to_string());
            }
        }
        Action::ToggleMute => session.toggle_mute(now),
        Action::ToggleLoop => session.toggle_loop(),
        Action::RandomizeColors => session.randomize_colors(),
        Action::EditWaveColor => {
            app.begin_prompt(PromptKind::WaveColor, session.displayed_theme().wave.to_string())
        }
        Action::EditProgressColor => app.begin_prompt(
            PromptKind::ProgressColor,
            session.displayed_theme().progress.to_string(),
        ),
        Action::AddPath => app.begin_prompt(PromptKind::AddPath, ""),
        Action::DeleteSelected => {
            if let Some(id) = selected {
                if let Err(e) = session.delete(id) {
                    app.set_status(e.to_string());
                }
                app.clamp_selection(session.library().len());
            }
        }
        Action::SwitchToSelected => {
            if let Some(id) = selected {
                if let Err(e) = session.switch_to(id) {
                    app.set_status(e.to_string());
                }
            }
        }
        Action::Next => app.next(session.library().len()),
        Action::Prev => app.prev(session.library().len()),
        Action::PromptChar(c) => app.push_char(c),
        Action::PromptBackspace => app.pop_char(),
        Action::PromptCancel => app.cancel_prompt(),
        Action::PromptSubmit => {
            if let Some((kind, text)) = app.submit_prompt() {
                submit_prompt(kind, &text, settings, app, session);
            }
        }
    }
    false
}

fn submit_prompt<A, W, M>(
    kind: PromptKind,
    text: &str,
    settings: &config::Settings,
    app: &mut App,
    session: &mut PlaybackSession<A, W, M>,
) where
    A: AudioEngine,
    W: WaveformRenderer,
    M: MetadataParser,
{
    if text.is_empty() {
        return;
    }
    let result = match kind {
        PromptKind::AddPath => {
            let added = ingest_path(session, &expand_home(text), &settings.library);
            app.set_status(match added {
                0 => format!("no audio files at {text}"),
                1 => "added 1 track".to_string(),
                n => format!("added {n} tracks"),
            });
            Ok(())
        }
        PromptKind::WaveColor => session.set_wave_color(text),
        PromptKind::ProgressColor => session.set_progress_color(text),
    };
    if let Err(e) = result {
        app.set_status(e.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_in_maps_columns_across_the_area() {
        let area = Rect::new(10, 0, 11, 5);
        assert_eq!(fraction_in(area, 10), 0.0);
        assert_eq!(fraction_in(area, 15), 0.5);
        assert_eq!(fraction_in(area, 20), 1.0);
        assert_eq!(fraction_in(area, 2), 0.0);
        assert_eq!(fraction_in(area, 99), 1.0);
        assert_eq!(fraction_in(Rect::new(0, 0, 1, 1), 0), 0.0);
    }
}
