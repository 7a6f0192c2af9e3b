use crate::input::ScrollDirection;
use std::time::{Duration, Instant};

pub const SCROLL_WINDOW: Duration = Duration::from_millis(300);

/// Consecutive wheel ticks in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollBurst {
    pub direction: ScrollDirection,
    pub count: u32,
}

impl ScrollBurst {
    /// `"down"` for a single tick, `"down x3"` for a burst.
    pub fn label(&self) -> String {
        if self.count > 1 {
            format!("{} x{}", self.direction.label(), self.count)
        } else {
            self.direction.label().to_owned()
        }
    }
}

/// Collapses same-direction wheel ticks that arrive within the window of each
/// other. A burst is reported once: when the direction changes, or when the
/// window passes without another tick.
#[derive(Debug, Clone)]
pub struct ScrollAggregator {
    window: Duration,
    pending: Option<(ScrollBurst, Instant)>,
}

impl Default for ScrollAggregator {
    fn default() -> Self {
        Self::new(SCROLL_WINDOW)
    }
}

impl ScrollAggregator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Records a tick and returns the burst it ended, if any.
    pub fn push(&mut self, direction: ScrollDirection, now: Instant) -> Option<ScrollBurst> {
        if let Some((burst, last)) = self.pending.as_mut() {
            if burst.direction == direction && now.saturating_duration_since(*last) < self.window {
                burst.count += 1;
                *last = now;
                return None;
            }
        }
        let finished = self.pending.take().map(|(burst, _)| burst);
        self.pending = Some((ScrollBurst { direction, count: 1 }, now));
        finished
    }

    pub fn poll(&mut self, now: Instant) -> Option<ScrollBurst> {
        let (_, last) = self.pending?;
        if now.saturating_duration_since(last) < self.window {
            return None;
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Option<ScrollBurst> {
        self.pending.take().map(|(burst, _)| burst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, last)| last + self.window)
    }
}
