//! Core automaton types and logic.
//!
//! This module contains the building blocks of the hierarchical automaton:
//! - Identifier values (`StateId`, `Event`, `EventSet`)
//! - State behavior via the `State` trait
//! - The containment tree (`StatePool`) with its entry/exit/transition walks

mod event;
mod id;
mod state;
mod tree;

pub use event::{Event, EventIdValue, EventSet};
pub use id::{StateId, StateIdValue};
pub use state::{State, StateHandle, StateKind};
pub use tree::StatePool;
