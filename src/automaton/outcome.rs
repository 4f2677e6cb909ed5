//! Result of a single transition request.

use crate::core::StateId;
use serde::{Deserialize, Serialize};

/// What [`Automaton::transition`](super::Automaton::transition) did with an
/// event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionOutcome {
    /// No state in the containment chain handles the event.
    Rejected,

    /// Handled as a self-transition, or the event was `Event::NONE`; no
    /// actions ran.
    Unchanged,

    /// The automaton now rests in `to`, a simple state.
    Changed { from: StateId, to: StateId },
}

impl TransitionOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }

    /// Target state of a change.
    pub fn target(&self) -> Option<StateId> {
        match self {
            Self::Changed { to, .. } => Some(*to),
            _ => None,
        }
    }
}
