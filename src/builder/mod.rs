//! Builder API for ergonomic automaton construction.
//!
//! This module provides a fluent builder and identifier macros for wiring
//! automatons with minimal boilerplate, plus the [`BuildError`] returned by
//! every wiring step.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::AutomatonBuilder;

use crate::core::{State, StateHandle, StatePool};

/// Register a composite state together with its substates in one call.
///
/// The first substate is the initial one.
///
/// # Example
///
/// ```
/// use statelog::builder::composite;
/// use statelog::core::{State, StateId, StatePool};
///
/// struct Plain(StateId);
///
/// impl State<()> for Plain {
///     fn id(&self) -> StateId {
///         self.0
///     }
/// }
///
/// let mut pool = StatePool::new();
/// let a = pool.add_simple(Plain(StateId::new(2))).unwrap();
/// let b = pool.add_simple(Plain(StateId::new(3))).unwrap();
/// let parent = composite(&mut pool, Plain(StateId::new(1)), &[a, b]).unwrap();
///
/// assert_eq!(pool.resting_state(parent), a);
/// ```
pub fn composite<C, S>(
    pool: &mut StatePool<C>,
    state: S,
    substates: &[StateHandle],
) -> Result<StateHandle, BuildError>
where
    S: State<C> + 'static,
{
    let handle = pool.add_composite(state)?;
    pool.set_substates(handle, substates)?;
    Ok(handle)
}
