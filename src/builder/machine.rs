//! Builder for constructing automatons.

use crate::automaton::{Automaton, StateChangedHook};
use crate::builder::error::BuildError;
use crate::clock::{Clock, SystemClock};
use crate::core::{Event, StateId, StatePool};
use crate::fault::FaultHandler;
use crate::log::SharedSink;

/// Builder for constructing automatons with a fluent API.
///
/// # Example
///
/// ```rust
/// use statelog::builder::AutomatonBuilder;
/// use statelog::clock::ManualClock;
/// use statelog::core::{State, StateId, StatePool};
///
/// struct Idle;
///
/// impl State<u32> for Idle {
///     fn id(&self) -> StateId {
///         StateId::named(1, "Idle")
///     }
/// }
///
/// let mut pool = StatePool::new();
/// pool.add_simple(Idle).unwrap();
///
/// let automaton = AutomatonBuilder::new(0u32)
///     .states(pool)
///     .clock(ManualClock::new())
///     .build()
///     .unwrap();
/// assert_eq!(automaton.current_state(), StateId::new(1));
/// ```
pub struct AutomatonBuilder<C> {
    context: C,
    pool: Option<StatePool<C>>,
    initial: Option<StateId>,
    log: Option<SharedSink>,
    clock: Option<Box<dyn Clock>>,
    fault_handler: Option<Box<dyn FaultHandler>>,
    on_state_changed: Option<StateChangedHook<C>>,
}

impl<C> AutomatonBuilder<C> {
    /// Create a builder around the context handed to every state action.
    pub fn new(context: C) -> Self {
        Self {
            context,
            pool: None,
            initial: None,
            log: None,
            clock: None,
            fault_handler: None,
            on_state_changed: None,
        }
    }

    /// Set the state pool (required).
    pub fn states(mut self, pool: StatePool<C>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Start in `id` instead of the first registered state.
    pub fn initial(mut self, id: StateId) -> Self {
        self.initial = Some(id);
        self
    }

    pub fn log(mut self, log: SharedSink) -> Self {
        self.log = Some(log);
        self
    }

    /// Time source for time in state. Defaults to [`SystemClock`].
    pub fn clock<K>(mut self, clock: K) -> Self
    where
        K: Clock + 'static,
    {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn fault_handler<H>(mut self, handler: H) -> Self
    where
        H: FaultHandler + 'static,
    {
        self.fault_handler = Some(Box::new(handler));
        self
    }

    pub fn on_state_changed<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut C, StateId, Event, StateId) + 'static,
    {
        self.on_state_changed = Some(Box::new(hook));
        self
    }

    /// Build the automaton.
    /// Returns an error if the pool is missing or miswired, or if the
    /// initial state is not in it.
    pub fn build(self) -> Result<Automaton<C>, BuildError> {
        let pool = self.pool.ok_or(BuildError::MissingStates)?;
        let clock: Box<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Box::new(SystemClock::new()),
        };

        let mut automaton = Automaton::assemble(self.context, pool, self.initial, clock)?;
        automaton.install(self.log, self.fault_handler, self.on_state_changed);
        Ok(automaton)
    }
}

impl<C: Default> Default for AutomatonBuilder<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}
