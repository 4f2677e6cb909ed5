//! Automaton driving transitions over a state pool.

use super::outcome::TransitionOutcome;
use crate::builder::BuildError;
use crate::checkpoint::{AutomatonCheckpoint, CheckpointError};
use crate::clock::{Clock, SystemClock, TimeMillis};
use crate::core::{Event, EventSet, StateHandle, StateId, StatePool};
use crate::fault::{default_handler, Fault, FaultHandler};
use crate::log::{LogMessage, SharedSink};
use tracing::{debug, error, trace, warn};

/// Called after every genuine state change with `(context, from, event, to)`.
pub type StateChangedHook<C> = Box<dyn FnMut(&mut C, StateId, Event, StateId)>;

/// Event-driven hierarchical state machine.
///
/// The current state is always a simple state. Composite states are only
/// passed through while entering or exiting.
///
/// # Example
///
/// ```rust
/// use statelog::automaton::{Automaton, TransitionOutcome};
/// use statelog::core::{Event, State, StateId, StatePool};
///
/// const OFF: StateId = StateId::named(1, "Off");
/// const ON: StateId = StateId::named(2, "On");
/// const TOGGLE: Event = Event::named(0x1, "Toggle");
///
/// struct Switch(StateId, StateId);
///
/// impl State<()> for Switch {
///     fn id(&self) -> StateId {
///         self.0
///     }
///
///     fn trans_action(&self, _ctx: &mut (), event: Event) -> StateId {
///         if event == TOGGLE { self.1 } else { StateId::UNDEFINED }
///     }
/// }
///
/// let mut pool = StatePool::new();
/// pool.add_simple(Switch(OFF, ON)).unwrap();
/// pool.add_simple(Switch(ON, OFF)).unwrap();
///
/// let mut automaton = Automaton::new((), pool, None).unwrap();
/// assert_eq!(automaton.current_state(), OFF);
/// assert_eq!(
///     automaton.transition(TOGGLE),
///     TransitionOutcome::Changed { from: OFF, to: ON }
/// );
/// ```
pub struct Automaton<C> {
    context: C,
    pool: StatePool<C>,
    current: StateHandle,
    entered_at: TimeMillis,
    clock: Box<dyn Clock>,
    log: Option<SharedSink>,
    fault_handler: Box<dyn FaultHandler>,
    on_state_changed: Option<StateChangedHook<C>>,
}

impl<C> Automaton<C> {
    /// Create an automaton resting in `initial`, or in the first registered
    /// state if none is given. Time is taken from a [`SystemClock`].
    pub fn new(
        context: C,
        pool: StatePool<C>,
        initial: Option<StateId>,
    ) -> Result<Self, BuildError> {
        Self::assemble(context, pool, initial, Box::new(SystemClock::new()))
    }

    pub(crate) fn assemble(
        context: C,
        pool: StatePool<C>,
        initial: Option<StateId>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, BuildError> {
        let current = resolve_initial(&pool, initial)?;
        let entered_at = clock.now();
        debug!(state = %pool.id(current), "automaton started");
        Ok(Self {
            context,
            pool,
            current,
            entered_at,
            clock,
            log: None,
            fault_handler: default_handler(),
            on_state_changed: None,
        })
    }

    /// Install a new state pool and rest in `initial` (or the first state).
    ///
    /// No entry actions run; a composite initial state resolves to the simple
    /// state reached through its initial substates.
    pub fn set_states(
        &mut self,
        pool: StatePool<C>,
        initial: Option<StateId>,
    ) -> Result<(), BuildError> {
        let current = resolve_initial(&pool, initial)?;
        self.pool = pool;
        self.current = current;
        self.entered_at = self.clock.now();
        debug!(state = %self.pool.id(current), "states installed");
        Ok(())
    }

    /// Attach (or detach) the sink for rejected events and fatal messages.
    pub fn set_log(&mut self, log: Option<SharedSink>) {
        self.log = log;
    }

    /// Replace the time source; the current state counts as entered now.
    pub fn set_clock<K>(&mut self, clock: K)
    where
        K: Clock + 'static,
    {
        self.clock = Box::new(clock);
        self.entered_at = self.clock.now();
    }

    /// Handler used for unknown states when no log is attached.
    pub fn set_fault_handler<H>(&mut self, handler: H)
    where
        H: FaultHandler + 'static,
    {
        self.fault_handler = Box::new(handler);
    }

    pub fn set_state_changed_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&mut C, StateId, Event, StateId) + 'static,
    {
        self.on_state_changed = Some(Box::new(hook));
    }

    pub(crate) fn install(
        &mut self,
        log: Option<SharedSink>,
        fault_handler: Option<Box<dyn FaultHandler>>,
        on_state_changed: Option<StateChangedHook<C>>,
    ) {
        self.log = log;
        if let Some(handler) = fault_handler {
            self.fault_handler = handler;
        }
        self.on_state_changed = on_state_changed;
    }

    pub fn current_state(&self) -> StateId {
        self.pool.id(self.current)
    }

    pub fn current_handle(&self) -> StateHandle {
        self.current
    }

    /// Registered name of `id`, if the state exists.
    pub fn state_name(&self, id: StateId) -> Option<&'static str> {
        self.pool.find(id).map(|handle| self.pool.id(handle).name())
    }

    /// Milliseconds since the current state was entered.
    pub fn time_in_state(&self) -> TimeMillis {
        self.clock.now().wrapping_sub(self.entered_at)
    }

    pub fn pool(&self) -> &StatePool<C> {
        &self.pool
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn into_context(self) -> C {
        self.context
    }

    /// User events accepted in the current state.
    pub fn accepted_user_events(&self) -> EventSet {
        self.pool.accepted_user_events(self.current, &self.context)
    }

    /// Candidate events for the current state. Nothing changes; the host
    /// picks one and passes it to [`transition`](Self::transition).
    pub fn evaluate(&self, user_request: Event) -> EventSet {
        let candidates =
            self.pool
                .eval(self.current, &self.context, self.time_in_state(), user_request);
        trace!(
            state = %self.current_state(),
            request = %user_request,
            candidates = %candidates,
            "evaluated"
        );
        candidates
    }

    /// Process `event` in the current state.
    ///
    /// A genuine change runs the exit chain, the entry chain down to a simple
    /// state, resets the time in state and calls the state-changed hook.
    pub fn transition(&mut self, event: Event) -> TransitionOutcome {
        if event.is_none() {
            return TransitionOutcome::Unchanged;
        }
        let old_id = self.current_state();
        let new_id = self.pool.trans(self.current, &mut self.context, event);

        if new_id.is_undefined() {
            self.reject(old_id, event);
            return TransitionOutcome::Rejected;
        }
        if new_id.is_same() || new_id == old_id {
            trace!(state = %old_id, event = %event, "self transition");
            return TransitionOutcome::Unchanged;
        }

        let target = self.lookup(new_id);
        let entered_id = self.pool.enter(target, &mut self.context);
        let entered = self.lookup(entered_id);
        self.current = entered;
        self.entered_at = self.clock.now();

        let new_id = self.pool.id(entered);
        debug!(from = %old_id, event = %event, to = %new_id, "state changed");
        if let Some(hook) = self.on_state_changed.as_mut() {
            hook(&mut self.context, old_id, event, new_id);
        }
        TransitionOutcome::Changed {
            from: old_id,
            to: new_id,
        }
    }

    /// Forget which rejected events were already reported.
    pub fn reset_rejection_cache(&mut self) {
        self.pool.clear_illegal_transition_logged();
    }

    /// Snapshot of the current state, its age and the rejection cache.
    pub fn checkpoint(&self) -> AutomatonCheckpoint {
        let rejected = self
            .pool
            .handles()
            .filter_map(|handle| {
                let events = self.pool.illegal_transition_logged(handle);
                (!events.is_empty()).then(|| (self.pool.id(handle), events))
            })
            .collect();
        AutomatonCheckpoint::new(self.current_state(), self.time_in_state(), rejected)
    }

    /// Rest in the checkpointed state without running any action.
    ///
    /// Nothing changes unless the whole checkpoint is valid for this pool.
    pub fn resume(&mut self, checkpoint: &AutomatonCheckpoint) -> Result<(), CheckpointError> {
        checkpoint.check_version()?;
        let current = self.find_for_resume(checkpoint.current_state)?;
        if !self.pool.is_simple(current) {
            return Err(CheckpointError::ValidationFailed(format!(
                "state {} is composite and cannot be current",
                checkpoint.current_state
            )));
        }
        let rejected = checkpoint
            .rejected
            .iter()
            .map(|&(id, events)| Ok((self.find_for_resume(id)?, events)))
            .collect::<Result<Vec<_>, CheckpointError>>()?;

        self.pool.clear_illegal_transition_logged();
        for (handle, events) in rejected {
            self.pool.set_illegal_transition_logged(handle, events);
        }
        self.current = current;
        self.entered_at = self.clock.now().wrapping_sub(checkpoint.time_in_state);
        debug!(state = %checkpoint.current_state, checkpoint = %checkpoint.id, "resumed");
        Ok(())
    }

    fn find_for_resume(&self, id: StateId) -> Result<StateHandle, CheckpointError> {
        self.pool
            .find(id)
            .ok_or(CheckpointError::UnknownState { id: id.value() })
    }

    fn reject(&mut self, state: StateId, event: Event) {
        if self
            .pool
            .illegal_transition_logged(self.current)
            .contains(event)
        {
            trace!(state = %state, event = %event, "rejected again");
            return;
        }
        warn!(state = %state, event = %event, "illegal transition");
        if let Some(log) = &self.log {
            // Event ids are bit patterns; bit 31 maps to a negative parameter.
            log.borrow_mut().message(
                LogMessage::StateIllegalTransition.id(),
                i32::from(state.value()),
                event.id() as i32,
            );
        }
        self.pool.mark_illegal_transition_logged(self.current, event);
    }

    fn lookup(&mut self, id: StateId) -> StateHandle {
        match self.pool.find(id) {
            Some(handle) => handle,
            None => self.unknown_state(id),
        }
    }

    fn unknown_state(&mut self, id: StateId) -> ! {
        error!(state = %id, "state has not been defined");
        match &self.log {
            Some(log) => log.borrow_mut().fatal(
                LogMessage::StateUnknownState.id(),
                i32::from(id.value()),
                0,
            ),
            None => self
                .fault_handler
                .halt(&Fault::UnknownState { id: id.value() }),
        }
    }
}

fn resolve_initial<C>(
    pool: &StatePool<C>,
    initial: Option<StateId>,
) -> Result<StateHandle, BuildError> {
    pool.validate()?;
    let handle = match initial {
        Some(id) => pool
            .find(id)
            .ok_or(BuildError::InitialStateUnknown { id: id.value() })?,
        None => pool.first().ok_or(BuildError::NoStates)?,
    };
    Ok(pool.resting_state(handle))
}
