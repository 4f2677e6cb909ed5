//! Persisted log record.

use crate::clock::Timestamp;
use serde::{Deserialize, Serialize};

/// Bytes of opaque payload per entry.
pub const LOG_PAYLOAD_SIZE: usize = 8;

/// Bytes per slot: timestamp (4) + kind (1) + payload.
pub const LOG_ENTRY_SIZE: usize = 4 + 1 + LOG_PAYLOAD_SIZE;

/// One log record: `{timestamp: u32 LE, kind: u8, payload}` on the store.
///
/// A timestamp of 0 marks an unused slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: Timestamp,
    /// Discriminator of the payload layout.
    pub kind: u8,
    pub payload: [u8; LOG_PAYLOAD_SIZE],
}

impl LogEntry {
    /// A cleared slot.
    pub const EMPTY: LogEntry = LogEntry {
        timestamp: 0,
        kind: 0,
        payload: [0; LOG_PAYLOAD_SIZE],
    };

    pub fn new(timestamp: Timestamp, kind: u8, payload: [u8; LOG_PAYLOAD_SIZE]) -> Self {
        Self {
            timestamp,
            kind,
            payload,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.timestamp == 0
    }

    pub fn encode(&self) -> [u8; LOG_ENTRY_SIZE] {
        let mut bytes = [0u8; LOG_ENTRY_SIZE];
        bytes[..4].copy_from_slice(&self.timestamp.to_le_bytes());
        bytes[4] = self.kind;
        bytes[5..].copy_from_slice(&self.payload);
        bytes
    }

    pub fn decode(bytes: &[u8; LOG_ENTRY_SIZE]) -> Self {
        let mut timestamp = [0u8; 4];
        timestamp.copy_from_slice(&bytes[..4]);
        let mut payload = [0u8; LOG_PAYLOAD_SIZE];
        payload.copy_from_slice(&bytes[5..]);
        Self {
            timestamp: u32::from_le_bytes(timestamp),
            kind: bytes[4],
            payload,
        }
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_fixed() {
        let entry = LogEntry::new(0x0102_0304, 7, [1, 2, 3, 4, 5, 6, 7, 8]);
        let bytes = entry.encode();
        assert_eq!(bytes.len(), 13);
        assert_eq!(&bytes[..5], &[0x04, 0x03, 0x02, 0x01, 7]);
        assert_eq!(&bytes[5..], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(LogEntry::decode(&bytes), entry);
    }

    #[test]
    fn zero_bytes_decode_to_empty_slot() {
        let entry = LogEntry::decode(&[0; LOG_ENTRY_SIZE]);
        assert!(entry.is_empty());
        assert_eq!(entry, LogEntry::default());
    }
}
