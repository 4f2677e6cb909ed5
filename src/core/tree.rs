//! Arena of states forming the containment tree.
//!
//! States are registered once, wired into composites with
//! [`StatePool::set_substates`], and addressed by [`StateHandle`]
//! afterwards. Parent and child links are handles, never references.

use super::event::{Event, EventSet};
use super::id::StateId;
use super::state::{State, StateHandle, StateKind};
use crate::builder::BuildError;
use crate::clock::TimeMillis;
use tracing::trace;

struct StateNode<C> {
    behavior: Box<dyn State<C>>,
    id: StateId,
    kind: StateKind,
    containing: Option<StateHandle>,
    /// Events already reported as rejected while resting in this state.
    illegal_transition_logged: EventSet,
}

/// Flat pool of every state of an automaton, used for id lookup and for
/// walking the containment chain.
pub struct StatePool<C> {
    nodes: Vec<StateNode<C>>,
}

impl<C> Default for StatePool<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> StatePool<C> {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Register a leaf state.
    pub fn add_simple<S>(&mut self, state: S) -> Result<StateHandle, BuildError>
    where
        S: State<C> + 'static,
    {
        self.add(Box::new(state), StateKind::Simple)
    }

    /// Register a composite state. Its substates are wired separately with
    /// [`set_substates`](Self::set_substates).
    pub fn add_composite<S>(&mut self, state: S) -> Result<StateHandle, BuildError>
    where
        S: State<C> + 'static,
    {
        self.add(
            Box::new(state),
            StateKind::Composite {
                substates: Vec::new(),
            },
        )
    }

    fn add(
        &mut self,
        behavior: Box<dyn State<C>>,
        kind: StateKind,
    ) -> Result<StateHandle, BuildError> {
        let id = behavior.id();
        if id.is_reserved() {
            return Err(BuildError::ReservedStateId { id: id.value() });
        }
        if self.find(id).is_some() {
            return Err(BuildError::DuplicateStateId { id: id.value() });
        }
        self.nodes.push(StateNode {
            behavior,
            id,
            kind,
            containing: None,
            illegal_transition_logged: EventSet::NONE,
        });
        Ok(StateHandle(self.nodes.len() - 1))
    }

    /// Attach `substates` to the composite `parent`; the first one is the
    /// initial substate. Each child is back-linked to `parent`.
    pub fn set_substates(
        &mut self,
        parent: StateHandle,
        substates: &[StateHandle],
    ) -> Result<(), BuildError> {
        self.check_handle(parent)?;
        match &self.nodes[parent.0].kind {
            StateKind::Simple => {
                return Err(BuildError::NotComposite {
                    id: self.nodes[parent.0].id.value(),
                })
            }
            StateKind::Composite { substates: existing } if !existing.is_empty() => {
                return Err(BuildError::SubstatesAlreadySet {
                    id: self.nodes[parent.0].id.value(),
                })
            }
            StateKind::Composite { .. } => {}
        }
        if substates.is_empty() {
            return Err(BuildError::EmptySubstates {
                id: self.nodes[parent.0].id.value(),
            });
        }

        for (position, &child) in substates.iter().enumerate() {
            self.check_handle(child)?;
            let child_id = self.nodes[child.0].id.value();
            if substates[..position].contains(&child) || self.nodes[child.0].containing.is_some()
            {
                return Err(BuildError::AlreadyContained { id: child_id });
            }
            if child == parent || self.is_ancestor(child, parent) {
                return Err(BuildError::ContainmentCycle { id: child_id });
            }
        }

        for &child in substates {
            self.nodes[child.0].containing = Some(parent);
        }
        self.nodes[parent.0].kind = StateKind::Composite {
            substates: substates.to_vec(),
        };
        Ok(())
    }

    /// Check that every composite has been given substates.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.nodes.is_empty() {
            return Err(BuildError::NoStates);
        }
        for node in &self.nodes {
            if let StateKind::Composite { substates } = &node.kind {
                if substates.is_empty() {
                    return Err(BuildError::CompositeWithoutSubstates {
                        id: node.id.value(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_handle(&self, handle: StateHandle) -> Result<(), BuildError> {
        if handle.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(BuildError::UnknownHandle {
                index: handle.0,
            })
        }
    }

    fn is_ancestor(&self, candidate: StateHandle, of: StateHandle) -> bool {
        let mut cursor = self.nodes[of.0].containing;
        while let Some(handle) = cursor {
            if handle == candidate {
                return true;
            }
            cursor = self.nodes[handle.0].containing;
        }
        false
    }

    fn node(&self, handle: StateHandle) -> &StateNode<C> {
        &self.nodes[handle.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Handle of the first registered state.
    pub fn first(&self) -> Option<StateHandle> {
        (!self.nodes.is_empty()).then_some(StateHandle(0))
    }

    pub fn handles(&self) -> impl Iterator<Item = StateHandle> {
        (0..self.nodes.len()).map(StateHandle)
    }

    /// Map an identifier to its state.
    pub fn find(&self, id: StateId) -> Option<StateHandle> {
        self.nodes
            .iter()
            .position(|node| node.id == id)
            .map(StateHandle)
    }

    pub fn id(&self, handle: StateHandle) -> StateId {
        self.node(handle).id
    }

    pub fn kind(&self, handle: StateHandle) -> &StateKind {
        &self.node(handle).kind
    }

    pub fn is_simple(&self, handle: StateHandle) -> bool {
        self.node(handle).kind.is_simple()
    }

    pub fn containing_state(&self, handle: StateHandle) -> Option<StateHandle> {
        self.node(handle).containing
    }

    pub fn initial_substate(&self, handle: StateHandle) -> Option<StateHandle> {
        match &self.node(handle).kind {
            StateKind::Simple => None,
            StateKind::Composite { substates } => substates.first().copied(),
        }
    }

    /// The simple state reached by following initial substates, without
    /// running any action.
    pub fn resting_state(&self, handle: StateHandle) -> StateHandle {
        let mut current = handle;
        while let Some(initial) = self.initial_substate(current) {
            current = initial;
        }
        current
    }

    pub fn illegal_transition_logged(&self, handle: StateHandle) -> EventSet {
        self.node(handle).illegal_transition_logged
    }

    pub(crate) fn mark_illegal_transition_logged(&mut self, handle: StateHandle, event: Event) {
        self.nodes[handle.0].illegal_transition_logged |= event;
    }

    pub(crate) fn set_illegal_transition_logged(&mut self, handle: StateHandle, events: EventSet) {
        self.nodes[handle.0].illegal_transition_logged = events;
    }

    pub(crate) fn clear_illegal_transition_logged(&mut self) {
        for node in &mut self.nodes {
            node.illegal_transition_logged.clear();
        }
    }

    /// Events accepted from the user, combined along the containment chain.
    pub fn accepted_user_events(&self, handle: StateHandle, ctx: &C) -> EventSet {
        let node = self.node(handle);
        let inherited = match node.containing {
            Some(parent) => self.accepted_user_events(parent, ctx),
            None => EventSet::NONE,
        };
        node.behavior.accepted_user_events(ctx, inherited)
    }

    /// Candidate events for `handle`: the user request if accepted, plus
    /// whatever the state adds on its own.
    pub fn eval(
        &self,
        handle: StateHandle,
        ctx: &C,
        time_in_state: TimeMillis,
        user_request: Event,
    ) -> EventSet {
        let requested = self.accepted_user_events(handle, ctx).select(user_request);
        self.node(handle)
            .behavior
            .eval(ctx, time_in_state, requested)
    }

    /// Handle `event` here or up the containment chain and return the
    /// target. A simple state leaving for another state runs the exit chain
    /// before returning; nothing is entered yet.
    pub fn trans(&self, handle: StateHandle, ctx: &mut C, event: Event) -> StateId {
        let node = self.node(handle);
        let mut next = node.behavior.trans_action(ctx, event);
        if next.is_undefined() {
            if let Some(parent) = node.containing {
                next = self.trans(parent, ctx, event);
            }
        }
        if node.kind.is_simple() && !next.is_undefined() && !next.is_same() && next != node.id {
            self.exit(handle, ctx, event, next);
        }
        next
    }

    /// Run entry actions from `handle` down the initial substates; returns
    /// the simple state finally entered.
    pub fn enter(&self, handle: StateHandle, ctx: &mut C) -> StateId {
        let node = self.node(handle);
        trace!(state = %node.id, "entry");
        node.behavior.entry_action(ctx);
        match &node.kind {
            StateKind::Simple => node.id,
            StateKind::Composite { substates } => match substates.first() {
                Some(&initial) => self.enter(initial, ctx),
                None => node.id,
            },
        }
    }

    /// Run exit actions from `handle` up the containment chain. A composite
    /// whose immediate substate is `next` is not left, and neither are its
    /// ancestors.
    pub fn exit(&self, handle: StateHandle, ctx: &mut C, event: Event, next: StateId) {
        let node = self.node(handle);
        if let StateKind::Composite { substates } = &node.kind {
            if substates.iter().any(|&sub| self.node(sub).id == next) {
                return;
            }
        }
        trace!(state = %node.id, event = %event, next = %next, "exit");
        node.behavior.exit_action(ctx);
        if let Some(parent) = node.containing {
            self.exit(parent, ctx, event, next);
        }
    }
}
