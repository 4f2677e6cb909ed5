//! Wear-aware circular log.
//!
//! Fixed-size entries are kept in a ring buffer on a [`Store`](crate::store::Store).
//! Every write is conditional so unchanged bytes are never rewritten, and
//! the cursors are re-derived from the persisted entries after a restart.
//!
//! Two readers are provided:
//!
//! - [`Log::most_recent`] walks newest to oldest.
//! - [`Log::unnotified`] walks oldest to newest over entries not yet
//!   delivered, advancing the notification cursor as it goes.
//!
//! Framework messages ([`LogMessage`]) use entry kinds below
//! [`USER_KIND_BASE`]; the rest are free for application payloads.

mod engine;
mod entry;
mod error;
mod message;
mod reader;
mod time;

pub use engine::{ClearCause, InitOutcome, Log, LogCursors, MAGIC_NUMBER};
pub use entry::{LogEntry, LOG_ENTRY_SIZE, LOG_PAYLOAD_SIZE};
pub use error::LogError;
pub use message::{
    message_payload, DiagnosticSink, LogMessage, MessageRecord, SharedSink, USER_KIND_BASE,
};
pub use reader::{Entries, LogReader, LogReaderKind};
pub use time::LogTime;
