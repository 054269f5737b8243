use std::time::{Duration, Instant};

/// Identifies the command a deferred action belongs to.
///
/// `generation` changes when the current track changes, `epoch` on every
/// transport command. An action only runs if both still match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Token {
    pub generation: u64,
    pub epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Deferred {
    /// Ramp the audio volume up after play.
    RampUp,
    /// Pause both engines once the pause fade is over.
    PauseEngines,
}

#[derive(Debug, Default)]
pub(super) struct TimerQueue {
    entries: Vec<(Instant, Token, Deferred)>,
}

impl TimerQueue {
    /// Queue `action` to run `delay` after `now`. A deadline past the end of
    /// the clock can never fire and is dropped.
    pub fn schedule(&mut self, now: Instant, delay: Duration, token: Token, action: Deferred) {
        match now.checked_add(delay) {
            Some(at) => self.entries.push((at, token, action)),
            None => log::warn!("dropping {action:?}: {delay:?} from now is out of range"),
        }
    }

    /// Remove and return every entry due at `now`, oldest deadline first.
    pub fn take_due(&mut self, now: Instant) -> Vec<(Token, Deferred)> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|(at, _, _)| *at <= now);
        self.entries = pending;
        due.sort_by_key(|(at, _, _)| *at);
        due.into_iter().map(|(_, token, action)| (token, action)).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
