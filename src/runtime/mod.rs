use std::env;
use std::io::{self, Stdout, Write};

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::{RodioEngine, TerminalWaveform};
use crate::library::LoftyParser;
use crate::logging;
use crate::session::PlaybackSession;

mod event_loop;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, fallback) = settings::load_settings();
    if let Some(path) = logging::init(&settings.logging) {
        log::info!("wavedeck {} logging to {}", env!("CARGO_PKG_VERSION"), path.display());
    }
    if let Some(reason) = fallback {
        log::warn!("{reason}; using defaults");
    }

    let audio = RodioEngine::open()?;
    let waveform = TerminalWaveform::new(&settings.waveform);
    let mut session = PlaybackSession::new(audio, waveform, LoftyParser::new(), &settings);

    for arg in env::args().skip(1) {
        startup::ingest_path(&mut session, &startup::expand_home(&arg), &settings.library);
    }
    let mut app = App::new();

    let mut terminal = match enter_terminal() {
        Ok(terminal) => terminal,
        Err(e) => {
            log::error!("terminal setup failed: {e}");
            session.shutdown(std::time::Duration::ZERO);
            let _ = restore_terminal(&mut io::stdout());
            return Err(e.into());
        }
    };

    let run_result = event_loop::run(&mut terminal, &settings, &mut app, &mut session);
    if let Err(e) = &run_result {
        log::error!("event loop failed: {e}");
        session.shutdown(std::time::Duration::ZERO);
    }

    restore_terminal(terminal.backend_mut())?;
    terminal.show_cursor()?;

    run_result
}

fn enter_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Leave raw mode and the alternate screen. Safe to call after a partial
/// `enter_terminal`.
fn restore_terminal<W: Write>(out: &mut W) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(out, DisableMouseCapture, LeaveAlternateScreen)
}
