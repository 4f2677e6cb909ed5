//! The state automaton.
//!
//! An [`Automaton`] owns a [`StatePool`](crate::core::StatePool), the
//! host-defined context passed to every state action, and the current
//! simple state. The host drives it in two steps:
//!
//! 1. [`Automaton::evaluate`] reports candidate events (pure).
//! 2. The host picks one by its own priority and calls
//!    [`Automaton::transition`], which runs the exit and entry chains.
//!
//! Rejected events are reported once per state to an optional
//! [`DiagnosticSink`](crate::log::DiagnosticSink), and unknown target states
//! halt through the fault path.

mod machine;
mod outcome;

pub use machine::{Automaton, StateChangedHook};
pub use outcome::TransitionOutcome;
