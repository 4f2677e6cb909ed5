//! Statelog: hierarchical state machines and a wear-aware circular log
//!
//! Statelog targets long-running, single-threaded control loops such as
//! firmware. An [`Automaton`] walks a tree of simple and composite states,
//! while a [`Log`] keeps a bounded history of fixed-size entries on
//! write-limited storage and survives restarts.
//!
//! # Core Concepts
//!
//! - **State**: behavior callbacks via the [`State`] trait, arranged in a
//!   [`StatePool`] as simple leaves and composite parents
//! - **Automaton**: evaluates candidate events and commits transitions,
//!   running exit and entry actions along the containment chain
//! - **Log**: ring buffer over a [`Store`] with conditional writes, two
//!   readers and restart recovery
//! - **Fault**: the non-returning halt path for unrecoverable defects
//!
//! # Example
//!
//! ```rust
//! use statelog::clock::ManualClock;
//! use statelog::core::{Event, EventSet, State, StateId, StatePool};
//! use statelog::log::{Log, LogMessage, SharedSink};
//! use statelog::store::RamStore;
//! use statelog::AutomatonBuilder;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! const IDLE: StateId = StateId::named(1, "Idle");
//! const BUSY: StateId = StateId::named(2, "Busy");
//! const WORK: Event = Event::named(0x1, "Work");
//! const DONE: Event = Event::named(0x2, "Done");
//!
//! struct Idle;
//!
//! impl State<()> for Idle {
//!     fn id(&self) -> StateId {
//!         IDLE
//!     }
//!
//!     fn accepted_user_events(&self, _ctx: &(), _inherited: EventSet) -> EventSet {
//!         EventSet::from(WORK)
//!     }
//!
//!     fn trans_action(&self, _ctx: &mut (), event: Event) -> StateId {
//!         if event == WORK { BUSY } else { StateId::UNDEFINED }
//!     }
//! }
//!
//! struct Busy;
//!
//! impl State<()> for Busy {
//!     fn id(&self) -> StateId {
//!         BUSY
//!     }
//! }
//!
//! let clock = ManualClock::new();
//! let mut log = Log::new(RamStore::new(512), clock.clone()).unwrap();
//! log.init();
//! let log = Rc::new(RefCell::new(log));
//!
//! let mut pool = StatePool::new();
//! pool.add_simple(Idle).unwrap();
//! pool.add_simple(Busy).unwrap();
//!
//! let mut automaton = AutomatonBuilder::new(())
//!     .states(pool)
//!     .clock(clock)
//!     .log(log.clone() as SharedSink)
//!     .build()
//!     .unwrap();
//!
//! let candidates = automaton.evaluate(WORK);
//! if let Some(event) = candidates.iter().next() {
//!     automaton.transition(event);
//! }
//! assert_eq!(automaton.current_state(), BUSY);
//!
//! automaton.transition(DONE);
//! let newest = log.borrow_mut().most_recent(1).next().unwrap();
//! assert_eq!(
//!     newest.message().unwrap().known(),
//!     Some(LogMessage::StateIllegalTransition)
//! );
//! ```

pub mod automaton;
pub mod builder;
pub mod checkpoint;
pub mod clock;
pub mod core;
pub mod fault;
pub mod log;
pub mod store;

// Re-export commonly used types
pub use automaton::{Automaton, TransitionOutcome};
pub use builder::{AutomatonBuilder, BuildError};
pub use checkpoint::{AutomatonCheckpoint, CheckpointError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use core::{Event, EventSet, State, StateId, StatePool};
pub use fault::{Fault, FaultHandler};
pub use log::{Log, LogEntry, LogError};
pub use store::{RamStore, Store};
