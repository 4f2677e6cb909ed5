//! Build errors for the state tree and the automaton builder.

use crate::core::StateIdValue;
use thiserror::Error;

/// Errors that can occur when wiring states and building automatons.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("No states defined. Register at least one state")]
    NoStates,

    #[error("State id {id} is reserved for UNDEFINED or SAME")]
    ReservedStateId { id: StateIdValue },

    #[error("State id {id} is already registered")]
    DuplicateStateId { id: StateIdValue },

    #[error("Handle {index} does not belong to this pool")]
    UnknownHandle { index: usize },

    #[error("State {id} is simple and cannot have substates")]
    NotComposite { id: StateIdValue },

    #[error("Substates of state {id} are already set")]
    SubstatesAlreadySet { id: StateIdValue },

    #[error("Composite state {id} needs at least one substate")]
    EmptySubstates { id: StateIdValue },

    #[error("State {id} is already contained in a composite")]
    AlreadyContained { id: StateIdValue },

    #[error("Containing state {id} would make the tree cyclic")]
    ContainmentCycle { id: StateIdValue },

    #[error("Composite state {id} has no substates. Call set_substates before building")]
    CompositeWithoutSubstates { id: StateIdValue },

    #[error("Initial state {id} is not in the pool")]
    InitialStateUnknown { id: StateIdValue },

    #[error("State pool not specified. Call .states(pool) before .build()")]
    MissingStates,
}
