//! Timestamp generator for log entries.

use crate::clock::{Clock, Timestamp};

/// Produces strictly increasing, non-zero timestamps from a [`Clock`].
///
/// After a restart the clock starts over; [`adjust`](LogTime::adjust) shifts
/// it so new timestamps continue after the most recent persisted one.
pub struct LogTime {
    clock: Box<dyn Clock>,
    offset: u32,
    last: Timestamp,
}

impl LogTime {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            offset: 0,
            last: 0,
        }
    }

    /// Next timestamp; always greater than the previous one and never 0.
    pub fn timestamp(&mut self) -> Timestamp {
        let candidate = self.clock.now().wrapping_add(self.offset);
        let next = candidate.max(self.last.wrapping_add(1)).max(1);
        self.last = next;
        next
    }

    /// Re-synchronize with the most recent persisted timestamp.
    pub fn adjust(&mut self, most_recent: Timestamp) {
        self.offset = most_recent.saturating_sub(self.clock.now());
        self.last = self.last.max(most_recent);
    }

    pub fn reset(&mut self) {
        self.offset = 0;
        self.last = 0;
    }

    /// The most recently issued (or adjusted-to) timestamp.
    pub fn last(&self) -> Timestamp {
        self.last
    }
}
