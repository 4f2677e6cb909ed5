//! Millisecond time sources.

use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;
use std::rc::Rc;

/// Milliseconds on the monotonic clock.
pub type TimeMillis = u32;

/// Log timestamp in milliseconds; 0 marks an empty log slot.
pub type Timestamp = u32;

/// Monotonically non-decreasing millisecond counter.
///
/// The counter is allowed to restart from zero with the process and to wrap
/// after about seven weeks.
pub trait Clock {
    fn now(&self) -> TimeMillis;
}

/// Milliseconds elapsed since the clock was created.
#[derive(Clone, Debug)]
pub struct SystemClock {
    started_at: DateTime<Utc>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> TimeMillis {
        let elapsed = Utc::now().signed_duration_since(self.started_at);
        // Truncation is the counter's natural wrap.
        elapsed.num_milliseconds().max(0) as TimeMillis
    }
}

/// Settable clock sharing its counter between clones.
///
/// # Example
///
/// ```rust
/// use statelog::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
/// handle.advance(250);
/// assert_eq!(clock.now(), 250);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    millis: Rc<Cell<TimeMillis>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(millis: TimeMillis) -> Self {
        let clock = Self::new();
        clock.set(millis);
        clock
    }

    pub fn set(&self, millis: TimeMillis) {
        self.millis.set(millis);
    }

    pub fn advance(&self, millis: TimeMillis) {
        self.millis.set(self.millis.get().wrapping_add(millis));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimeMillis {
        self.millis.get()
    }
}

/// Render a timestamp as `[<days>d ]hh:mm:ss.mmm`.
///
/// # Example
///
/// ```rust
/// use statelog::clock::format_timestamp;
///
/// assert_eq!(format_timestamp(3_723_004), "01:02:03.004");
/// assert_eq!(format_timestamp(90_000_000), "1d 01:00:00.000");
/// ```
pub fn format_timestamp(timestamp: Timestamp) -> String {
    let elapsed = Duration::milliseconds(i64::from(timestamp));
    let days = elapsed.num_days();
    let hours = elapsed.num_hours() % 24;
    let minutes = elapsed.num_minutes() % 60;
    let seconds = elapsed.num_seconds() % 60;
    let millis = elapsed.num_milliseconds() % 1000;
    let clock = format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis);
    if days > 0 {
        format!("{}d {}", days, clock)
    } else {
        clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::starting_at(10);
        let other = clock.clone();
        other.advance(5);
        assert_eq!(clock.now(), 15);
        clock.set(3);
        assert_eq!(other.now(), 3);
    }

    #[test]
    fn manual_clock_wraps() {
        let clock = ManualClock::starting_at(TimeMillis::MAX);
        clock.advance(2);
        assert_eq!(clock.now(), 1);
    }

    #[test]
    fn system_clock_starts_near_zero() {
        let clock = SystemClock::new();
        assert!(clock.now() < 60_000);
    }

    #[test]
    fn formats_timestamps() {
        assert_eq!(format_timestamp(0), "00:00:00.000");
        assert_eq!(format_timestamp(59_999), "00:00:59.999");
        assert_eq!(format_timestamp(2 * 86_400_000 + 1), "2d 00:00:00.001");
    }
}
