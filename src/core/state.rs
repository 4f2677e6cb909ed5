//! Core State trait for automaton states.
//!
//! A state's behavior is a set of callbacks with default implementations;
//! where the state sits in the containment tree (simple leaf or composite
//! parent) is decided when it is registered in a
//! [`StatePool`](crate::core::StatePool).

use super::event::{Event, EventSet};
use super::id::StateId;
use crate::clock::TimeMillis;

/// Behavior of one state, parameterized by the execution context `C` the
/// actions operate on.
///
/// States are stateless: every callback borrows the state immutably and all
/// mutable data lives in the context or in the automaton. The containment
/// chain (delegation of unhandled events and accepted events to the
/// containing state) is walked by the framework, not by implementations.
///
/// # Example
///
/// ```rust
/// use statelog::core::{Event, EventSet, State, StateId};
///
/// const IDLE: StateId = StateId::named(1, "Idle");
/// const RUNNING: StateId = StateId::named(2, "Running");
/// const START: Event = Event::named(0x1, "Start");
///
/// #[derive(Default)]
/// struct Counters {
///     starts: u32,
/// }
///
/// struct Idle;
///
/// impl State<Counters> for Idle {
///     fn id(&self) -> StateId {
///         IDLE
///     }
///
///     fn accepted_user_events(&self, _ctx: &Counters, _inherited: EventSet) -> EventSet {
///         EventSet::from(START)
///     }
///
///     fn trans_action(&self, ctx: &mut Counters, event: Event) -> StateId {
///         if event == START {
///             ctx.starts += 1;
///             return RUNNING;
///         }
///         StateId::UNDEFINED
///     }
/// }
/// ```
pub trait State<C> {
    /// Identity of the state; must not change over the state's lifetime.
    fn id(&self) -> StateId;

    /// User-triggerable events accepted right now.
    ///
    /// `inherited` is what the containing chain accepts. The default
    /// delegates upward by returning it unchanged; override to replace it or
    /// to add events (`inherited | MY_EVENT`).
    fn accepted_user_events(&self, _ctx: &C, inherited: EventSet) -> EventSet {
        inherited
    }

    /// Candidate events before a transition is committed.
    ///
    /// `requested` is the user request already matched against
    /// [`accepted_user_events`](State::accepted_user_events). Override to add
    /// automatic candidates such as timeouts. Must not change anything.
    fn eval(&self, _ctx: &C, _time_in_state: TimeMillis, requested: EventSet) -> EventSet {
        requested
    }

    /// Run the transition action for `event` and name the next state.
    ///
    /// Return [`StateId::UNDEFINED`] when this state does not handle the
    /// event (the containing state is asked next), [`StateId::SAME`] or the
    /// own id to stay.
    fn trans_action(&self, _ctx: &mut C, _event: Event) -> StateId {
        StateId::UNDEFINED
    }

    /// Performed whenever the state is entered.
    fn entry_action(&self, _ctx: &mut C) {}

    /// Performed whenever the state is truly exited.
    fn exit_action(&self, _ctx: &mut C) {}
}

/// Position of a state in the containment tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateKind {
    /// Leaf; the only kind the automaton can rest in.
    Simple,
    /// Internal node; the first substate is the initial one.
    Composite { substates: Vec<StateHandle> },
}

impl StateKind {
    pub fn is_simple(&self) -> bool {
        matches!(self, Self::Simple)
    }
}

/// Arena index of a state inside its [`StatePool`](crate::core::StatePool).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateHandle(pub(crate) usize);

impl StateHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDLE: StateId = StateId::named(1, "Idle");
    const OTHER: Event = Event::new(0x2);

    struct Idle;

    impl State<()> for Idle {
        fn id(&self) -> StateId {
            IDLE
        }
    }

    #[test]
    fn defaults_delegate_and_handle_nothing() {
        let state = Idle;
        let inherited = EventSet::from(OTHER);

        assert_eq!(state.accepted_user_events(&(), inherited), inherited);
        assert_eq!(state.eval(&(), 5_000, inherited), inherited);
        assert!(state.trans_action(&mut (), OTHER).is_undefined());
    }

    #[test]
    fn kind_reports_leaves() {
        assert!(StateKind::Simple.is_simple());
        let composite = StateKind::Composite {
            substates: vec![StateHandle(1)],
        };
        assert!(!composite.is_simple());
    }

    #[test]
    fn id_is_stable() {
        let state = Idle;
        assert_eq!(state.id(), state.id());
    }
}
