use std::time::{Duration, Instant};

/// A linear volume ramp between two levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    from: f32,
    to: f32,
    start: Instant,
    length: Duration,
}

impl Fade {
    pub fn new(from: f32, to: f32, start: Instant, length: Duration) -> Self {
        Self {
            from: from.clamp(0.0, 1.0),
            to: to.clamp(0.0, 1.0),
            start,
            length,
        }
    }

    /// Volume at `now`; before `start` this is `from`, after the end `to`.
    pub fn level_at(&self, now: Instant) -> f32 {
        if self.length.is_zero() {
            return self.to;
        }
        let elapsed = now.saturating_duration_since(self.start).as_secs_f32();
        let t = (elapsed / self.length.as_secs_f32()).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }

    pub fn is_done(&self, now: Instant) -> bool {
        self.start
            .checked_add(self.length)
            .is_some_and(|end| now >= end)
    }
}
