//! Events and event sets.
//!
//! Event identifiers are single bits so that any combination of events can be
//! carried in one [`EventSet`] bitmask.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{BitOr, BitOrAssign};

/// Raw numeric value of an event identifier.
pub type EventIdValue = u32;

/// Immutable identifier of a transition trigger.
///
/// By convention the value is a power of two (`0x1`, `0x2`, `0x4`, ...);
/// [`Event::NONE`] (0) means "no event".
///
/// # Example
///
/// ```rust
/// use statelog::core::{Event, EventSet};
///
/// const START: Event = Event::named(0x1, "Start");
/// const STOP: Event = Event::named(0x2, "Stop");
///
/// let accepted = EventSet::from(START) | STOP;
/// assert!(accepted.contains(START));
/// assert!(accepted.contains(STOP));
/// ```
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(into = "EventIdValue")]
pub struct Event {
    id: EventIdValue,
    name: Option<&'static str>,
}

impl Event {
    /// Pseudo event: nothing to do.
    pub const NONE: Event = Event::named(0, "None");

    pub const fn new(id: EventIdValue) -> Self {
        Self { id, name: None }
    }

    pub const fn named(id: EventIdValue, name: &'static str) -> Self {
        Self {
            id,
            name: Some(name),
        }
    }

    pub const fn id(&self) -> EventIdValue {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name.unwrap_or("")
    }

    pub const fn is_none(&self) -> bool {
        self.id == 0
    }

    /// True when the identifier follows the single-bit convention.
    pub const fn is_single_bit(&self) -> bool {
        self.id.is_power_of_two()
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl From<EventIdValue> for Event {
    fn from(id: EventIdValue) -> Self {
        Self::new(id)
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        EventIdValue::deserialize(deserializer).map(Self::new)
    }
}

impl From<Event> for EventIdValue {
    fn from(event: Event) -> Self {
        event.id
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "{}(0x{:x})", name, self.id),
            None => write!(f, "0x{:x}", self.id),
        }
    }
}

/// Bitmask union of events. The empty set (value 0) means "no events".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventSet(EventIdValue);

impl EventSet {
    pub const NONE: EventSet = EventSet(0);

    /// Build a set from raw or'ed event bits.
    pub const fn from_bits(bits: EventIdValue) -> Self {
        Self(bits)
    }

    /// The member events or'ed together.
    pub const fn bits(&self) -> EventIdValue {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Membership test. [`Event::NONE`] is never a member.
    pub const fn contains(&self, event: Event) -> bool {
        self.0 & event.id() != 0
    }

    pub fn insert(&mut self, event: Event) {
        self.0 |= event.id();
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// The single-event set `{event}` if `event` is a member, else the empty set.
    pub const fn select(&self, event: Event) -> EventSet {
        if self.contains(event) {
            EventSet(event.id())
        } else {
            EventSet::NONE
        }
    }

    /// Iterate the single-bit events in the set, lowest bit first.
    pub fn iter(&self) -> impl Iterator<Item = Event> {
        let bits = self.0;
        (0..EventIdValue::BITS)
            .map(|shift| -> EventIdValue { 1 << shift })
            .filter(move |bit| bits & bit != 0)
            .map(Event::new)
    }
}

impl From<Event> for EventSet {
    fn from(event: Event) -> Self {
        Self(event.id())
    }
}

impl BitOr<Event> for EventSet {
    type Output = EventSet;

    fn bitor(self, event: Event) -> EventSet {
        EventSet(self.0 | event.id())
    }
}

impl BitOr for EventSet {
    type Output = EventSet;

    fn bitor(self, other: EventSet) -> EventSet {
        EventSet(self.0 | other.0)
    }
}

impl BitOr for Event {
    type Output = EventSet;

    fn bitor(self, other: Event) -> EventSet {
        EventSet(self.id | other.id)
    }
}

impl BitOrAssign<Event> for EventSet {
    fn bitor_assign(&mut self, event: Event) {
        self.0 |= event.id();
    }
}

impl BitOrAssign for EventSet {
    fn bitor_assign(&mut self, other: EventSet) {
        self.0 |= other.0;
    }
}

impl fmt::Display for EventSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{0x{:x}}}", self.0)
    }
}
