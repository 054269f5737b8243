//! Application model types: `App`, `InputMode` and `PromptKind`.
//!
//! Playback state lives in the session; `App` only tracks what the terminal
//! front-end needs on top of it.

/// What a text prompt is collecting.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PromptKind {
    /// A file or directory to add to the library.
    AddPath,
    WaveColor,
    ProgressColor,
}

impl PromptKind {
    pub fn title(self) -> &'static str {
        match self {
            PromptKind::AddPath => " add file or directory ",
            PromptKind::WaveColor => " waveform colour ",
            PromptKind::ProgressColor => " progress colour ",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Prompt { kind: PromptKind, buffer: String },
}

/// The main application model.
#[derive(Debug, Default)]
pub struct App {
    pub selected: usize,
    pub mode: InputMode,
    status: Option<String>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move selection to the next track, wrapping to the first.
    pub fn next(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1) % len;
    }

    /// Move selection to the previous track, wrapping to the last.
    pub fn prev(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        self.selected = if self.selected == 0 {
            len - 1
        } else {
            self.selected - 1
        };
    }

    /// Keep the cursor inside a library of `len` tracks after removals.
    pub fn clamp_selection(&mut self, len: usize) {
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    pub fn is_prompting(&self) -> bool {
        matches!(self.mode, InputMode::Prompt { .. })
    }

    pub fn begin_prompt(&mut self, kind: PromptKind, initial: impl Into<String>) {
        self.mode = InputMode::Prompt {
            kind,
            buffer: initial.into(),
        };
    }

    pub fn push_char(&mut self, c: char) {
        if let InputMode::Prompt { buffer, .. } = &mut self.mode {
            buffer.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let InputMode::Prompt { buffer, .. } = &mut self.mode {
            buffer.pop();
        }
    }

    /// Leave prompt mode, returning what was typed.
    pub fn submit_prompt(&mut self) -> Option<(PromptKind, String)> {
        match std::mem::take(&mut self.mode) {
            InputMode::Prompt { kind, buffer } => Some((kind, buffer.trim().to_string())),
            InputMode::Normal => None,
        }
    }

    pub fn cancel_prompt(&mut self) {
        self.mode = InputMode::Normal;
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = Some(msg.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}
