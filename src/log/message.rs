//! Framework messages and the diagnostic interface the automaton uses.

use super::entry::{LogEntry, LOG_PAYLOAD_SIZE};
use crate::clock::Timestamp;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Entry kinds below this value are reserved for [`LogMessage`] ids.
pub const USER_KIND_BASE: u8 = 32;

/// Messages issued by the framework itself; stored as the entry kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LogMessage {
    /// The board is starting from reset or power-on.
    SystemInit = 1,
    /// Log cleared and initialized.
    LogInit = 2,
    /// Log cleared because the magic number was missing.
    LogMagicNumber = 3,
    /// Log cleared because the slot count changed from `param1` to `param2`.
    LogSizeChanged = 4,
    /// State `param1` rejected event `param2`.
    StateIllegalTransition = 5,
    /// State `param1` has not been defined.
    StateUnknownState = 6,
}

impl LogMessage {
    pub const fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::SystemInit),
            2 => Some(Self::LogInit),
            3 => Some(Self::LogMagicNumber),
            4 => Some(Self::LogSizeChanged),
            5 => Some(Self::StateIllegalTransition),
            6 => Some(Self::StateUnknownState),
            _ => None,
        }
    }
}

/// Decoded message entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub timestamp: Timestamp,
    pub id: u8,
    pub param1: i32,
    pub param2: i32,
}

impl MessageRecord {
    /// The framework message, if `id` is one.
    pub fn known(&self) -> Option<LogMessage> {
        LogMessage::from_id(self.id)
    }
}

/// Payload of a message entry: `param1` then `param2`, little-endian.
pub fn message_payload(param1: i32, param2: i32) -> [u8; LOG_PAYLOAD_SIZE] {
    let mut payload = [0u8; LOG_PAYLOAD_SIZE];
    payload[..4].copy_from_slice(&param1.to_le_bytes());
    payload[4..8].copy_from_slice(&param2.to_le_bytes());
    payload
}

impl LogEntry {
    /// Interpret the entry as a message; `None` for empty slots.
    pub fn message(&self) -> Option<MessageRecord> {
        if self.is_empty() {
            return None;
        }
        let mut param1 = [0u8; 4];
        let mut param2 = [0u8; 4];
        param1.copy_from_slice(&self.payload[..4]);
        param2.copy_from_slice(&self.payload[4..8]);
        Some(MessageRecord {
            timestamp: self.timestamp,
            id: self.kind,
            param1: i32::from_le_bytes(param1),
            param2: i32::from_le_bytes(param2),
        })
    }
}

/// What the automaton needs from a log.
pub trait DiagnosticSink {
    /// Record a message and return its timestamp.
    fn message(&mut self, id: u8, param1: i32, param2: i32) -> Timestamp;

    /// Record a message, then halt.
    fn fatal(&mut self, id: u8, param1: i32, param2: i32) -> !;
}

/// Shared handle to a sink, so the host can keep using the log it hands to
/// an automaton.
pub type SharedSink = Rc<RefCell<dyn DiagnosticSink>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for id in 1..=6 {
            let message = LogMessage::from_id(id).unwrap();
            assert_eq!(message.id(), id);
        }
        assert_eq!(LogMessage::from_id(0), None);
        assert_eq!(LogMessage::from_id(USER_KIND_BASE), None);
    }

    #[test]
    fn payload_carries_signed_params() {
        let entry = LogEntry::new(
            42,
            LogMessage::LogSizeChanged.id(),
            message_payload(-3, 70_000),
        );
        let record = entry.message().unwrap();
        assert_eq!(record.timestamp, 42);
        assert_eq!(record.known(), Some(LogMessage::LogSizeChanged));
        assert_eq!((record.param1, record.param2), (-3, 70_000));
    }

    #[test]
    fn empty_entry_is_not_a_message() {
        assert_eq!(LogEntry::EMPTY.message(), None);
    }
}
