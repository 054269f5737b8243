use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::model::InputMode;

/// What a key press asks the runtime to do.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    TogglePlay,
    ToggleMute,
    ToggleLoop,
    RandomizeColors,
    EditWaveColor,
    EditProgressColor,
    AddPath,
    DeleteSelected,
    SwitchToSelected,
    Next,
    Prev,
    Quit,
    PromptChar(char),
    PromptBackspace,
    PromptSubmit,
    PromptCancel,
}

/// Translate a key event for the current input mode.
///
/// Releases and repeats are ignored. In a prompt every printable key,
/// space included, goes to the buffer; in normal mode space is consumed as
/// play/pause and never reaches anything else.
pub fn map_key(key: &KeyEvent, mode: &InputMode) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }

    if let InputMode::Prompt { .. } = mode {
        return match key.code {
            KeyCode::Esc => Some(Action::PromptCancel),
            KeyCode::Enter => Some(Action::PromptSubmit),
            KeyCode::Backspace => Some(Action::PromptBackspace),
            KeyCode::Char(c) if !c.is_control() => Some(Action::PromptChar(c)),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char(' ') => Some(Action::TogglePlay),
        KeyCode::Char('m') => Some(Action::ToggleMute),
        KeyCode::Char('l') => Some(Action::ToggleLoop),
        KeyCode::Char('c') => Some(Action::RandomizeColors),
        KeyCode::Char('w') => Some(Action::EditWaveColor),
        KeyCode::Char('p') => Some(Action::EditProgressColor),
        KeyCode::Char('a') => Some(Action::AddPath),
        KeyCode::Char('d') | KeyCode::Delete => Some(Action::DeleteSelected),
        KeyCode::Enter => Some(Action::SwitchToSelected),
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Next),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Prev),
        KeyCode::Char('q') => Some(Action::Quit),
        _ => None,
    }
}
