//! Single-cursor readers over the ring buffer.

use super::engine::Log;
use super::entry::LogEntry;
use crate::store::Store;
use serde::{Deserialize, Serialize};

/// Direction and bookkeeping of a reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogReaderKind {
    /// Newest to oldest.
    MostRecent,
    /// Oldest unnotified to newest; advances the notification cursor.
    Unnotified,
}

/// Cursor state. Only meaningful while `valid`; any change to the log
/// invalidates it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogReader {
    pub kind: LogReaderKind,
    pub valid: bool,
    /// Entries this reader returns in total.
    pub to_read: u16,
    pub read_so_far: u16,
    /// Slot of the next entry to return.
    pub next_index: u16,
}

impl LogReader {
    /// A reader that returns nothing.
    pub const fn invalid() -> Self {
        Self {
            kind: LogReaderKind::MostRecent,
            valid: false,
            to_read: 0,
            read_so_far: 0,
            next_index: 0,
        }
    }

    pub(crate) fn start(kind: LogReaderKind, to_read: u16, next_index: u16) -> Self {
        Self {
            kind,
            valid: true,
            to_read,
            read_so_far: 0,
            next_index,
        }
    }

    pub fn has_next(&self) -> bool {
        self.valid && self.read_so_far < self.to_read
    }

    /// Entries still to come.
    pub fn remaining(&self) -> u16 {
        if self.valid {
            self.to_read - self.read_so_far
        } else {
            0
        }
    }

    pub fn invalidate(&mut self) {
        self.valid = false;
    }
}

impl Default for LogReader {
    fn default() -> Self {
        Self::invalid()
    }
}

/// Iterator over the active reader of a log.
pub struct Entries<'a, S: Store> {
    log: &'a mut Log<S>,
}

impl<'a, S: Store> Entries<'a, S> {
    pub(crate) fn new(log: &'a mut Log<S>) -> Self {
        Self { log }
    }
}

impl<S: Store> Iterator for Entries<'_, S> {
    type Item = LogEntry;

    fn next(&mut self) -> Option<LogEntry> {
        self.log.next_entry()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::from(self.log.reader().remaining());
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_reader_is_exhausted() {
        let reader = LogReader::invalid();
        assert!(!reader.has_next());
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn started_reader_counts_down() {
        let mut reader = LogReader::start(LogReaderKind::Unnotified, 2, 5);
        assert!(reader.has_next());
        reader.read_so_far = 2;
        assert!(!reader.has_next());
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn invalidation_stops_reading() {
        let mut reader = LogReader::start(LogReaderKind::MostRecent, 3, 0);
        reader.invalidate();
        assert!(!reader.has_next());
    }
}
