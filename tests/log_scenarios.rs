//! Scenario tests for the circular log over an in-memory store.

use statelog::clock::{format_timestamp, ManualClock};
use statelog::fault::PanicHalt;
use statelog::log::{
    message_payload, ClearCause, InitOutcome, Log, LogEntry, LogMessage, LOG_ENTRY_SIZE,
    LOG_PAYLOAD_SIZE, MAGIC_NUMBER, USER_KIND_BASE,
};
use statelog::store::{RamStore, Store};

const HEADER: usize = 3;

/// Kind used for sensor readings in these scenarios.
const READING: u8 = USER_KIND_BASE + 1;

fn open(store: RamStore, clock: &ManualClock) -> Log<RamStore> {
    Log::new(store, clock.clone())
        .unwrap()
        .with_fault_handler(PanicHalt)
}

fn reading(value: u8) -> [u8; LOG_PAYLOAD_SIZE] {
    let mut payload = [0u8; LOG_PAYLOAD_SIZE];
    payload[0] = value;
    payload
}

fn user_values(entries: impl Iterator<Item = LogEntry>) -> Vec<u8> {
    entries
        .filter(|entry| entry.kind == READING)
        .map(|entry| entry.payload[0])
        .collect()
}

#[test]
fn five_slot_log_keeps_four_newest() {
    let clock = ManualClock::new();
    let mut log = open(RamStore::new(HEADER + 5 * LOG_ENTRY_SIZE), &clock);
    log.clear();
    assert_eq!(log.max_entries(), 4);

    for value in [b'A', b'B', b'C', b'D', b'E'] {
        clock.advance(5);
        log.append(READING, reading(value));
    }

    assert_eq!(log.current_entry_count(), 4);
    assert_eq!(user_values(log.most_recent(0)), b"EDCB".to_vec());
}

#[test]
fn most_recent_is_strict_reverse_of_append_order() {
    let clock = ManualClock::new();
    let mut log = open(RamStore::new(HEADER + 16 * LOG_ENTRY_SIZE), &clock);
    log.clear();

    let appended: Vec<LogEntry> = (1..=10)
        .map(|value| {
            clock.advance(3);
            log.append(READING, reading(value))
        })
        .collect();

    let mut newest_first: Vec<LogEntry> = log.most_recent(0).collect();
    let bootstrap = newest_first.pop().unwrap();
    assert_eq!(bootstrap.kind, LogMessage::LogInit.id());
    newest_first.reverse();
    assert_eq!(newest_first, appended);
}

#[test]
fn unnotified_then_nothing() {
    let clock = ManualClock::new();
    let mut log = open(RamStore::new(HEADER + 8 * LOG_ENTRY_SIZE), &clock);
    log.clear();
    log.append(READING, reading(1));
    log.append(READING, reading(2));

    let first: Vec<LogEntry> = log.unnotified().collect();
    assert_eq!(first.len(), 3);
    assert!(first.windows(2).all(|pair| pair[0].timestamp < pair[1].timestamp));
    assert_eq!(log.unnotified().count(), 0);

    log.append(READING, reading(3));
    assert_eq!(user_values(log.unnotified()), vec![3]);
}

#[test]
fn restart_continues_where_it_left_off() {
    let clock = ManualClock::starting_at(10_000);
    let mut log = open(RamStore::filled(HEADER + 6 * LOG_ENTRY_SIZE, 0xA5), &clock);
    assert_eq!(log.init(), InitOutcome::Cleared(ClearCause::Uninitialized));
    for value in 1..=7 {
        clock.advance(100);
        log.append(READING, reading(value));
    }
    let cursors = log.cursors();
    let count = log.current_entry_count();
    let newest = log.most_recent(1).next().unwrap();

    // Power cycle: the millisecond counter starts over.
    let clock = ManualClock::new();
    let mut log = open(log.into_store(), &clock);
    assert_eq!(log.init(), InitOutcome::Resumed { entries: count });
    assert_eq!(log.cursors().head, cursors.head);
    assert_eq!(log.cursors().tail, cursors.tail);
    assert_eq!(log.unnotified().count(), 0);

    let system_init = log.message(LogMessage::SystemInit.id(), 0, 0);
    assert!(system_init > newest.timestamp);
    assert_eq!(user_values(log.most_recent(0)), vec![7, 6, 5, 4]);
}

#[test]
fn init_is_idempotent_across_repeated_restarts() {
    let clock = ManualClock::new();
    let mut log = open(RamStore::new(HEADER + 7 * LOG_ENTRY_SIZE), &clock);
    log.init();
    for value in 1..=3 {
        log.append(READING, reading(value));
    }
    let expected = (log.cursors().head, log.cursors().tail, log.current_entry_count());

    let mut store = log.into_store();
    for _ in 0..3 {
        let mut reopened = open(store, &clock);
        reopened.init();
        let cursors = reopened.cursors();
        assert_eq!(
            (cursors.head, cursors.tail, reopened.current_entry_count()),
            expected
        );
        store = reopened.into_store();
    }
}

#[test]
fn resized_store_is_cleared_with_a_reason() {
    let clock = ManualClock::new();
    let mut log = open(RamStore::new(HEADER + 4 * LOG_ENTRY_SIZE), &clock);
    log.init();
    log.append(READING, reading(9));
    let old = log.into_store();

    let mut grown = RamStore::new(HEADER + 10 * LOG_ENTRY_SIZE);
    grown.write_bytes(0, old.as_bytes());
    let mut log = open(grown, &clock);
    assert_eq!(
        log.init(),
        InitOutcome::Cleared(ClearCause::Resized { from: 4, to: 10 })
    );

    let records: Vec<_> = log
        .most_recent(0)
        .filter_map(|entry| entry.message())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].known(), Some(LogMessage::LogSizeChanged));
    assert_eq!((records[0].param1, records[0].param2), (4, 10));
    assert_eq!(records[1].known(), Some(LogMessage::LogInit));
}

#[test]
fn header_layout_is_stable() {
    let clock = ManualClock::new();
    let mut log = open(RamStore::new(HEADER + 300 * LOG_ENTRY_SIZE), &clock);
    log.clear();
    let store = log.store();
    assert_eq!(store.read_byte(0), MAGIC_NUMBER);
    assert_eq!([store.read_byte(1), store.read_byte(2)], [0x2C, 0x01]);
    assert_eq!(store.read_u16(1), 300);
}

#[test]
fn appending_rewrites_only_changed_bytes() {
    let clock = ManualClock::new();
    let mut log = open(RamStore::new(HEADER + 4 * LOG_ENTRY_SIZE), &clock);
    log.clear();
    let before = log.store().writes();

    // Timestamp 2 and kind 33 are the only non-zero bytes of the new
    // entry; the next slot is already clear.
    log.append(READING, [0; LOG_PAYLOAD_SIZE]);
    assert_eq!(log.store().writes() - before, 2);
}

#[test]
fn message_entries_decode_signed_parameters() {
    let clock = ManualClock::new();
    let mut log = open(RamStore::new(HEADER + 4 * LOG_ENTRY_SIZE), &clock);
    log.clear();
    clock.set(3_723_004);
    let stamped = log.message(LogMessage::StateUnknownState.id(), -7, 1 << 20);

    let record = log.most_recent(1).next().unwrap().message().unwrap();
    assert_eq!(record.timestamp, stamped);
    assert_eq!((record.param1, record.param2), (-7, 1 << 20));
    assert_eq!(format_timestamp(record.timestamp), "01:02:03.004");

    let raw = LogEntry::new(stamped, record.id, message_payload(-7, 1 << 20));
    assert_eq!(raw.message(), Some(record));
}
