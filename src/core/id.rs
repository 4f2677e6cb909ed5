//! State identifiers.
//!
//! A [`StateId`] names a state independently of the object implementing it,
//! so transitions can target states by value and checkpoints can persist them.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Raw numeric value of a state identifier.
pub type StateIdValue = i16;

/// Immutable, copyable identifier of a state.
///
/// Equality and hashing use the numeric value only; the optional name is for
/// display. Negative values are reserved by the framework (see
/// [`StateId::UNDEFINED`] and [`StateId::SAME`]).
///
/// # Example
///
/// ```rust
/// use statelog::core::StateId;
///
/// const IDLE: StateId = StateId::named(1, "Idle");
///
/// assert_eq!(IDLE, StateId::new(1));
/// assert_eq!(IDLE.name(), "Idle");
/// assert!(!IDLE.is_reserved());
/// ```
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(into = "StateIdValue")]
pub struct StateId {
    value: StateIdValue,
    name: Option<&'static str>,
}

impl StateId {
    /// Pseudo state returned by `trans` when no state in the containment chain
    /// handles an event.
    pub const UNDEFINED: StateId = StateId::named(-2, "Undefined");

    /// Pseudo state for explicit self-transitions ("stay here").
    pub const SAME: StateId = StateId::named(-1, "(same)");

    /// Create an unnamed identifier.
    pub const fn new(value: StateIdValue) -> Self {
        Self { value, name: None }
    }

    /// Create an identifier with a display name.
    pub const fn named(value: StateIdValue, name: &'static str) -> Self {
        Self {
            value,
            name: Some(name),
        }
    }

    pub const fn value(&self) -> StateIdValue {
        self.value
    }

    /// Display name, or the empty string for unnamed identifiers.
    pub fn name(&self) -> &'static str {
        self.name.unwrap_or("")
    }

    /// True for framework pseudo states (negative values).
    pub const fn is_reserved(&self) -> bool {
        self.value < 0
    }

    pub fn is_undefined(&self) -> bool {
        *self == Self::UNDEFINED
    }

    pub fn is_same(&self) -> bool {
        *self == Self::SAME
    }
}

impl PartialEq for StateId {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for StateId {}

impl Hash for StateId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl From<StateIdValue> for StateId {
    fn from(value: StateIdValue) -> Self {
        Self::new(value)
    }
}

// Written by hand: a derived impl would tie `'de` to the `'static` name.
impl<'de> Deserialize<'de> for StateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        StateIdValue::deserialize(deserializer).map(Self::new)
    }
}

impl From<StateId> for StateIdValue {
    fn from(id: StateId) -> Self {
        id.value
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "{}({})", name, self.value),
            None => write!(f, "{}", self.value),
        }
    }
}
