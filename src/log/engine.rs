//! Circular log over a [`Store`].

use super::entry::{LogEntry, LOG_ENTRY_SIZE, LOG_PAYLOAD_SIZE};
use super::error::LogError;
use super::message::{message_payload, DiagnosticSink, LogMessage};
use super::reader::{Entries, LogReader, LogReaderKind};
use super::time::LogTime;
use crate::clock::{Clock, Timestamp};
use crate::fault::{default_handler, Fault, FaultHandler};
use crate::store::Store;
use tracing::{debug, error, trace};

/// First byte of an initialized log area. Never-written media cannot be
/// assumed to read as zero.
pub const MAGIC_NUMBER: u8 = 199;

const MAGIC_OFFSET: usize = 0;
const SLOT_COUNT_OFFSET: usize = 1;
const ENTRIES_OFFSET: usize = 3;

/// Why [`Log::init`] had to clear the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearCause {
    /// Magic number missing: media never initialized.
    Uninitialized,
    /// Slot count on the store differs from this build's.
    Resized { from: u16, to: u16 },
}

/// Result of [`Log::init`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitOutcome {
    /// Cursors re-derived from persisted entries.
    Resumed { entries: u16 },
    /// Structural mismatch; the log was cleared and the cause logged.
    Cleared(ClearCause),
}

/// In-memory cursors of a log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogCursors {
    /// Next free slot, already cleared.
    pub head: u16,
    /// Oldest occupied slot.
    pub tail: u16,
    /// Last slot delivered through the unnotified reader.
    pub last_notified: u16,
}

/// Wear-aware ring buffer of fixed-size entries.
///
/// Store layout: magic number (1 byte), slot count (`u16` LE), then
/// `slot_count` entries. The slot at `head` is always empty, so at most
/// `slot_count - 1` entries are held; when full, appending evicts the oldest.
/// Every write is conditional ("only if changed").
///
/// `append` writes the new entry before clearing the next slot. If power is
/// lost between the two writes on a full log, no slot is empty and every
/// later [`init`](Log::init) halts until the log is cleared.
///
/// # Example
///
/// ```rust
/// use statelog::clock::ManualClock;
/// use statelog::log::{InitOutcome, ClearCause, Log, USER_KIND_BASE};
/// use statelog::store::RamStore;
///
/// let mut log = Log::new(RamStore::new(256), ManualClock::new()).unwrap();
/// assert_eq!(log.init(), InitOutcome::Cleared(ClearCause::Uninitialized));
///
/// log.append(USER_KIND_BASE, [1, 0, 0, 0, 0, 0, 0, 0]);
/// let newest = log.most_recent(1).next().unwrap();
/// assert_eq!(newest.kind, USER_KIND_BASE);
/// ```
pub struct Log<S: Store> {
    store: S,
    slot_count: u16,
    head: u16,
    tail: u16,
    last_notified: u16,
    reader: LogReader,
    time: LogTime,
    fault_handler: Box<dyn FaultHandler>,
}

impl<S: Store> Log<S> {
    /// Size the log to the store. Nothing is read or written until
    /// [`init`](Self::init) or [`clear`](Self::clear).
    pub fn new<K>(store: S, clock: K) -> Result<Self, LogError>
    where
        K: Clock + 'static,
    {
        let capacity = store.capacity();
        let required = ENTRIES_OFFSET + 2 * LOG_ENTRY_SIZE;
        if capacity < required {
            return Err(LogError::StoreTooSmall { capacity, required });
        }
        let slots = (capacity - ENTRIES_OFFSET) / LOG_ENTRY_SIZE;
        let slot_count = u16::try_from(slots).unwrap_or(u16::MAX);
        Ok(Self {
            store,
            slot_count,
            head: 0,
            tail: 0,
            last_notified: slot_count - 1,
            reader: LogReader::invalid(),
            time: LogTime::new(Box::new(clock)),
            fault_handler: default_handler(),
        })
    }

    /// Replace the handler used on unrecoverable inconsistencies.
    pub fn with_fault_handler<H>(mut self, handler: H) -> Self
    where
        H: FaultHandler + 'static,
    {
        self.fault_handler = Box::new(handler);
        self
    }

    /// Total slots, including the one kept empty.
    pub fn slot_count(&self) -> u16 {
        self.slot_count
    }

    pub fn max_entries(&self) -> u16 {
        self.slot_count - 1
    }

    pub fn current_entry_count(&self) -> u16 {
        self.distance(self.tail, self.head)
    }

    pub fn cursors(&self) -> LogCursors {
        LogCursors {
            head: self.head,
            tail: self.tail,
            last_notified: self.last_notified,
        }
    }

    pub fn reader(&self) -> &LogReader {
        &self.reader
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give the store back, e.g. to re-open it after a simulated restart.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Zero every slot, reset cursors and timestamps, and write the
    /// bootstrap entry. All entries count as unnotified afterwards.
    pub fn clear(&mut self) {
        debug!(slots = self.slot_count, "clearing log");
        self.reader.invalidate();
        self.store.write_byte_if_changed(MAGIC_OFFSET, MAGIC_NUMBER);
        self.store.update_u16(SLOT_COUNT_OFFSET, self.slot_count);
        for index in 0..self.slot_count {
            self.clear_entry(index);
        }
        self.time.reset();
        self.head = 0;
        self.tail = 0;
        self.message(LogMessage::LogInit.id(), 0, 0);
        self.last_notified = self.previous(0);
    }

    /// Re-derive cursors from the store after a restart.
    ///
    /// Clears the log (and records why) if the magic number or slot count
    /// does not match. Entries already on the store count as notified.
    pub fn init(&mut self) -> InitOutcome {
        let stored_slots = self.store.read_u16(SLOT_COUNT_OFFSET);
        if self.store.read_byte(MAGIC_OFFSET) != MAGIC_NUMBER {
            self.clear();
            self.message(LogMessage::LogMagicNumber.id(), 0, 0);
            return InitOutcome::Cleared(ClearCause::Uninitialized);
        }
        if stored_slots != self.slot_count {
            self.clear();
            self.message(
                LogMessage::LogSizeChanged.id(),
                i32::from(stored_slots),
                i32::from(self.slot_count),
            );
            return InitOutcome::Cleared(ClearCause::Resized {
                from: stored_slots,
                to: self.slot_count,
            });
        }

        let Some(head) = (0..self.slot_count).find(|&index| self.read_entry(index).is_empty())
        else {
            self.inconsistent("no empty slot for the head")
        };
        let most_recent_index = self.previous(head);
        let most_recent = self.read_entry(most_recent_index);
        if most_recent.is_empty() {
            self.inconsistent("slot before the head is empty");
        }
        let Some(tail) = (1..self.slot_count)
            .map(|step| self.advance(head, step))
            .find(|&index| !self.read_entry(index).is_empty())
        else {
            self.inconsistent("no occupied slot for the tail")
        };

        self.head = head;
        self.tail = tail;
        self.last_notified = most_recent_index;
        self.time.adjust(most_recent.timestamp);
        self.reader.invalidate();

        let entries = self.current_entry_count();
        debug!(head, tail, entries, "log resumed");
        InitOutcome::Resumed { entries }
    }

    /// Write a new entry at the head, evicting the oldest if full.
    pub fn append(&mut self, kind: u8, payload: [u8; LOG_PAYLOAD_SIZE]) -> LogEntry {
        let entry = LogEntry::new(self.time.timestamp(), kind, payload);
        let offset = self.entry_offset(self.head);
        self.store.update_bytes(offset, &entry.encode());

        self.head = self.next(self.head);
        if self.head == self.tail {
            let evicted = self.tail;
            self.tail = self.next(self.tail);
            // Keep the notification cursor out of evicted history.
            if self.next(self.last_notified) == evicted {
                self.last_notified = evicted;
            }
        }
        self.clear_entry(self.head);
        self.reader.invalidate();

        trace!(
            kind,
            timestamp = entry.timestamp,
            head = self.head,
            tail = self.tail,
            "log entry added"
        );
        entry
    }

    /// Record a message entry (`kind` = message id) and return its timestamp.
    pub fn message(&mut self, id: u8, param1: i32, param2: i32) -> Timestamp {
        self.append(id, message_payload(param1, param2)).timestamp
    }

    /// Record a message, then halt through the fault handler.
    pub fn fatal(&mut self, id: u8, param1: i32, param2: i32) -> ! {
        let timestamp = self.message(id, param1, param2);
        self.fault_handler.halt(&Fault::Logged {
            id,
            param1,
            param2,
            timestamp,
        })
    }

    /// Start reading up to `limit` entries (0 = all), newest first.
    pub fn read_most_recent(&mut self, limit: u16) {
        let available = self.current_entry_count();
        let to_read = if limit == 0 {
            available
        } else {
            limit.min(available)
        };
        self.reader = LogReader::start(LogReaderKind::MostRecent, to_read, self.previous(self.head));
        trace!(to_read, next = self.reader.next_index, "reading most recent");
    }

    /// Start reading every entry not yet notified, oldest first.
    pub fn read_unnotified(&mut self) {
        let first = self.next(self.last_notified);
        // In a full, unread log the cursor rests on the empty head slot.
        let pending = self.distance(first, self.head);
        self.reader = LogReader::start(LogReaderKind::Unnotified, pending, first);
        trace!(pending, next = self.reader.next_index, "reading unnotified");
    }

    /// Step the active reader. `None` once exhausted or after the log changed.
    pub fn next_entry(&mut self) -> Option<LogEntry> {
        if !self.reader.has_next() {
            return None;
        }
        let index = self.reader.next_index;
        let entry = self.read_entry(index);
        self.reader.read_so_far += 1;
        self.reader.next_index = match self.reader.kind {
            LogReaderKind::MostRecent => self.previous(index),
            LogReaderKind::Unnotified => {
                self.last_notified = index;
                self.next(index)
            }
        };
        Some(entry)
    }

    /// [`read_most_recent`](Self::read_most_recent) as an iterator.
    pub fn most_recent(&mut self, limit: u16) -> Entries<'_, S> {
        self.read_most_recent(limit);
        Entries::new(self)
    }

    /// [`read_unnotified`](Self::read_unnotified) as an iterator.
    pub fn unnotified(&mut self) -> Entries<'_, S> {
        self.read_unnotified();
        Entries::new(self)
    }

    fn inconsistent(&mut self, reason: &'static str) -> ! {
        error!(reason, "log structure inconsistent");
        self.fault_handler.halt(&Fault::LogInconsistent { reason })
    }

    fn entry_offset(&self, index: u16) -> usize {
        ENTRIES_OFFSET + usize::from(index) * LOG_ENTRY_SIZE
    }

    fn read_entry(&self, index: u16) -> LogEntry {
        let mut bytes = [0u8; LOG_ENTRY_SIZE];
        self.store.read_bytes(self.entry_offset(index), &mut bytes);
        LogEntry::decode(&bytes)
    }

    fn clear_entry(&mut self, index: u16) {
        self.reader.invalidate();
        let offset = self.entry_offset(index);
        self.store.update_bytes(offset, &[0u8; LOG_ENTRY_SIZE]);
    }

    fn advance(&self, index: u16, steps: u16) -> u16 {
        let slots = u32::from(self.slot_count);
        ((u32::from(index) + u32::from(steps)) % slots) as u16
    }

    fn next(&self, index: u16) -> u16 {
        self.advance(index, 1)
    }

    fn previous(&self, index: u16) -> u16 {
        self.advance(index, self.slot_count - 1)
    }

    /// Forward steps from `from` to `to`.
    fn distance(&self, from: u16, to: u16) -> u16 {
        let slots = u32::from(self.slot_count);
        ((u32::from(to) + slots - u32::from(from)) % slots) as u16
    }
}

impl<S: Store> DiagnosticSink for Log<S> {
    fn message(&mut self, id: u8, param1: i32, param2: i32) -> Timestamp {
        Log::message(self, id, param1, param2)
    }

    fn fatal(&mut self, id: u8, param1: i32, param2: i32) -> ! {
        Log::fatal(self, id, param1, param2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::fault::PanicHalt;
    use crate::log::USER_KIND_BASE;
    use crate::store::RamStore;

    fn store_for(slots: usize) -> RamStore {
        RamStore::new(ENTRIES_OFFSET + slots * LOG_ENTRY_SIZE)
    }

    fn open(store: RamStore, clock: &ManualClock) -> Log<RamStore> {
        Log::new(store, clock.clone())
            .unwrap()
            .with_fault_handler(PanicHalt)
    }

    fn payload(tag: u8) -> [u8; LOG_PAYLOAD_SIZE] {
        [tag, 0, 0, 0, 0, 0, 0, 0]
    }

    fn tags(entries: impl Iterator<Item = LogEntry>) -> Vec<u8> {
        entries.map(|entry| entry.payload[0]).collect()
    }

    #[test]
    fn rejects_store_without_room_for_two_slots() {
        let result = Log::new(RamStore::new(ENTRIES_OFFSET + LOG_ENTRY_SIZE), ManualClock::new());
        assert!(matches!(
            result,
            Err(LogError::StoreTooSmall {
                capacity: 16,
                required: 29
            })
        ));
    }

    #[test]
    fn slot_count_follows_capacity() {
        let log = open(RamStore::new(ENTRIES_OFFSET + 5 * LOG_ENTRY_SIZE + 7), &ManualClock::new());
        assert_eq!(log.slot_count(), 5);
        assert_eq!(log.max_entries(), 4);
    }

    #[test]
    fn init_on_virgin_media_clears_and_explains() {
        let mut log = open(RamStore::filled(ENTRIES_OFFSET + 6 * LOG_ENTRY_SIZE, 0xFF), &ManualClock::new());
        assert_eq!(log.init(), InitOutcome::Cleared(ClearCause::Uninitialized));

        assert_eq!(log.store().read_byte(0), MAGIC_NUMBER);
        assert_eq!(log.store().read_u16(1), 6);
        let kinds: Vec<u8> = log.most_recent(0).map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![LogMessage::LogMagicNumber.id(), LogMessage::LogInit.id()]
        );
    }

    #[test]
    fn init_after_resize_records_old_and_new_size() {
        let clock = ManualClock::new();
        let mut small = open(store_for(4), &clock);
        small.init();
        let old_bytes = small.into_store().as_bytes().to_vec();

        let mut bigger = RamStore::new(ENTRIES_OFFSET + 6 * LOG_ENTRY_SIZE);
        bigger.write_bytes(0, &old_bytes);
        let mut log = open(bigger, &clock);

        assert_eq!(
            log.init(),
            InitOutcome::Cleared(ClearCause::Resized { from: 4, to: 6 })
        );
        let newest = log.most_recent(1).next().unwrap().message().unwrap();
        assert_eq!(newest.known(), Some(LogMessage::LogSizeChanged));
        assert_eq!((newest.param1, newest.param2), (4, 6));
    }

    #[test]
    fn clear_leaves_one_bootstrap_entry() {
        let mut log = open(store_for(5), &ManualClock::new());
        log.clear();
        assert_eq!(log.current_entry_count(), 1);
        assert_eq!(
            log.cursors(),
            LogCursors {
                head: 1,
                tail: 0,
                last_notified: 4
            }
        );
        let unread: Vec<u8> = log.unnotified().map(|e| e.kind).collect();
        assert_eq!(unread, vec![LogMessage::LogInit.id()]);
    }

    #[test]
    fn appending_to_full_log_evicts_oldest() {
        let mut log = open(store_for(5), &ManualClock::new());
        log.clear();
        for tag in 1..=10 {
            log.append(USER_KIND_BASE, payload(tag));
            assert!(log.current_entry_count() <= log.max_entries());
        }
        assert_eq!(log.current_entry_count(), 4);
        assert_eq!(tags(log.most_recent(0)), vec![10, 9, 8, 7]);
    }

    #[test]
    fn most_recent_honours_limit() {
        let mut log = open(store_for(8), &ManualClock::new());
        log.clear();
        for tag in 1..=3 {
            log.append(USER_KIND_BASE, payload(tag));
        }
        assert_eq!(tags(log.most_recent(2)), vec![3, 2]);
        assert_eq!(log.most_recent(50).count(), 4);
    }

    #[test]
    fn most_recent_wraps_backwards_over_slot_zero() {
        let mut log = open(store_for(4), &ManualClock::new());
        log.clear();
        for tag in 1..=5 {
            log.append(USER_KIND_BASE, payload(tag));
        }
        let timestamps: Vec<u32> = log.most_recent(0).map(|e| e.timestamp).collect();
        assert_eq!(timestamps.len(), 3);
        assert!(timestamps.windows(2).all(|pair| pair[0] > pair[1]));
    }

    #[test]
    fn append_invalidates_active_reader() {
        let mut log = open(store_for(6), &ManualClock::new());
        log.clear();
        log.append(USER_KIND_BASE, payload(1));
        log.read_most_recent(0);
        assert!(log.next_entry().is_some());
        log.append(USER_KIND_BASE, payload(2));
        assert_eq!(log.next_entry(), None);
    }

    #[test]
    fn unnotified_delivers_each_entry_once() {
        let mut log = open(store_for(8), &ManualClock::new());
        log.clear();
        log.unnotified().for_each(drop);

        log.append(USER_KIND_BASE, payload(1));
        log.append(USER_KIND_BASE, payload(2));
        log.read_unnotified();
        assert_eq!(log.next_entry().map(|e| e.payload[0]), Some(1));

        // Interrupted; resuming picks up where it stopped.
        assert_eq!(tags(log.unnotified()), vec![2]);
        assert_eq!(log.unnotified().count(), 0);
    }

    #[test]
    fn unnotified_cursor_skips_evicted_entries() {
        let mut log = open(store_for(5), &ManualClock::new());
        log.clear();
        log.unnotified().for_each(drop);
        for tag in 1..=9 {
            log.append(USER_KIND_BASE, payload(tag));
        }
        assert_eq!(tags(log.unnotified()), vec![6, 7, 8, 9]);
        assert_eq!(log.unnotified().count(), 0);
    }

    #[test]
    fn restart_reproduces_cursors() {
        let clock = ManualClock::new();
        let mut log = open(store_for(5), &clock);
        log.init();
        for tag in 1..=6 {
            clock.advance(10);
            log.append(USER_KIND_BASE, payload(tag));
        }
        let before = log.cursors();
        let count = log.current_entry_count();
        let newest = log.most_recent(1).next().unwrap();

        clock.set(0);
        let mut reopened = open(log.into_store(), &clock);
        assert_eq!(reopened.init(), InitOutcome::Resumed { entries: count });
        assert_eq!(reopened.cursors().head, before.head);
        assert_eq!(reopened.cursors().tail, before.tail);
        assert_eq!(reopened.unnotified().count(), 0);

        let next = reopened.append(USER_KIND_BASE, payload(7));
        assert!(next.timestamp > newest.timestamp);
    }

    #[test]
    fn restart_with_head_at_slot_zero_uses_last_slot() {
        let clock = ManualClock::new();
        let mut log = open(store_for(4), &clock);
        log.clear();
        log.append(USER_KIND_BASE, payload(1));
        log.append(USER_KIND_BASE, payload(2));
        assert_eq!(log.cursors().head, 3);
        clock.set(500);
        let newest = log.append(USER_KIND_BASE, payload(3));
        assert_eq!(log.cursors().head, 0);

        clock.set(0);
        let mut reopened = open(log.into_store(), &clock);
        assert_eq!(reopened.init(), InitOutcome::Resumed { entries: 3 });
        assert_eq!(reopened.cursors().tail, 1);
        assert_eq!(reopened.cursors().last_notified, 3);
        assert!(reopened.append(USER_KIND_BASE, payload(4)).timestamp > newest.timestamp);
    }

    #[test]
    fn resumed_init_writes_nothing() {
        let clock = ManualClock::new();
        let mut log = open(store_for(6), &clock);
        log.init();
        let store = log.into_store();
        let writes = store.writes();

        let mut reopened = open(store, &clock);
        reopened.init();
        assert_eq!(reopened.store().writes(), writes);
    }

    #[test]
    fn clear_on_cleared_log_only_touches_changed_bytes() {
        let mut log = open(store_for(6), &ManualClock::new());
        log.clear();
        let writes = log.store().writes();
        log.clear();
        // Bootstrap entry has two non-zero bytes: erased, then rewritten.
        assert_eq!(log.store().writes() - writes, 4);
    }

    #[test]
    #[should_panic(expected = "no empty slot for the head")]
    fn init_halts_when_no_slot_is_empty() {
        let clock = ManualClock::new();
        let mut log = open(store_for(3), &clock);
        log.clear();
        let mut store = log.into_store();
        let filler = LogEntry::new(9, USER_KIND_BASE, payload(0)).encode();
        store.write_bytes(ENTRIES_OFFSET + LOG_ENTRY_SIZE, &filler);
        store.write_bytes(ENTRIES_OFFSET + 2 * LOG_ENTRY_SIZE, &filler);

        open(store, &clock).init();
    }

    #[test]
    #[should_panic(expected = "no empty slot for the head")]
    fn interrupted_append_on_full_log_halts_every_restart() {
        let clock = ManualClock::new();
        let mut log = open(store_for(3), &clock);
        log.clear();
        log.append(USER_KIND_BASE, payload(1));
        log.append(USER_KIND_BASE, payload(2));
        let head = usize::from(log.cursors().head);
        let mut store = log.into_store();

        // Entry written at the head, power lost before the next slot is cleared.
        let torn = LogEntry::new(50, USER_KIND_BASE, payload(3)).encode();
        store.write_bytes(ENTRIES_OFFSET + head * LOG_ENTRY_SIZE, &torn);

        open(store, &clock).init();
    }

    #[test]
    #[should_panic(expected = "slot before the head is empty")]
    fn init_halts_on_empty_log_area() {
        let clock = ManualClock::new();
        let mut store = store_for(3);
        store.write_byte(0, MAGIC_NUMBER);
        store.update_u16(1, 3);
        open(store, &clock).init();
    }

    #[test]
    #[should_panic(expected = "fatal message 6 (12, 0)")]
    fn fatal_logs_then_halts() {
        let mut log = open(store_for(4), &ManualClock::new());
        log.clear();
        log.fatal(LogMessage::StateUnknownState.id(), 12, 0);
    }
}
