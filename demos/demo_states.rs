//! Composite State Demo
//!
//! This example drives a five-state automaton with one composite state
//! through a simulated control loop, and keeps its diagnostics in a
//! circular log on an in-memory store.
//!
//! ```text
//!                +------------------------+
//!     +---+  ta  |      +---+      +---+  |    +---+
//! o-->| A +----->|  o-->| C +----->| D +------>| E |
//!     +---+<-----+      +-+-+<-+   +---+  |    +---+
//!              B |        +----+ timeout  |
//!                +------------------------+
//! ```
//!
//! Key concepts:
//! - Entry and exit actions along the containment chain
//! - Events inherited from a composite state (B->A from C or D)
//! - Timeout-driven candidates from `eval`
//! - Rejected events reported once to the log
//!
//! Run with: cargo run --example demo_states

use statelog::builder::{composite, AutomatonBuilder};
use statelog::clock::{format_timestamp, Clock, ManualClock};
use statelog::core::{Event, EventSet, State, StateId, StatePool};
use statelog::log::{Log, LogMessage, SharedSink, USER_KIND_BASE};
use statelog::store::RamStore;
use statelog::{events, state_ids};
use std::cell::RefCell;
use std::rc::Rc;

state_ids! {
    STATE_A = 1,
    STATE_B = 2,
    STATE_C = 3,
    STATE_D = 4,
    STATE_E = 5,
}

events! {
    EVENT_A_B = 0x1,
    EVENT_B_A = 0x2,
    EVENT_C_C = 0x4,
    EVENT_C_D = 0x8,
    EVENT_D_E = 0x10,
    // No state accepts this one.
    EVENT_UNKNOWN = 0x20,
}

const C_C_TIMEOUT: u32 = 2_000;

/// Entry kind for the demo's own "state changed" records.
const STATE_CHANGED: u8 = USER_KIND_BASE;

#[derive(Default)]
struct ExecutionContext {
    timeouts: u32,
}

impl ExecutionContext {
    fn enter(&self, id: StateId) {
        println!("  entering {}", id.name());
    }

    fn exit(&self, id: StateId) {
        println!("  exiting {}", id.name());
    }
}

struct StateA;

impl State<ExecutionContext> for StateA {
    fn id(&self) -> StateId {
        STATE_A
    }

    fn accepted_user_events(&self, _ctx: &ExecutionContext, _inherited: EventSet) -> EventSet {
        EventSet::from(EVENT_A_B)
    }

    fn trans_action(&self, _ctx: &mut ExecutionContext, event: Event) -> StateId {
        if event == EVENT_A_B {
            println!("  transAction: A->B");
            return STATE_B;
        }
        StateId::UNDEFINED
    }

    fn entry_action(&self, ctx: &mut ExecutionContext) {
        ctx.enter(STATE_A);
    }

    fn exit_action(&self, ctx: &mut ExecutionContext) {
        ctx.exit(STATE_A);
    }
}

struct StateB;

impl State<ExecutionContext> for StateB {
    fn id(&self) -> StateId {
        STATE_B
    }

    fn accepted_user_events(&self, _ctx: &ExecutionContext, _inherited: EventSet) -> EventSet {
        EventSet::from(EVENT_B_A)
    }

    fn trans_action(&self, _ctx: &mut ExecutionContext, event: Event) -> StateId {
        if event == EVENT_B_A {
            return STATE_A;
        }
        StateId::UNDEFINED
    }

    fn entry_action(&self, ctx: &mut ExecutionContext) {
        ctx.enter(STATE_B);
    }

    fn exit_action(&self, ctx: &mut ExecutionContext) {
        ctx.exit(STATE_B);
    }
}

struct StateC;

impl State<ExecutionContext> for StateC {
    fn id(&self) -> StateId {
        STATE_C
    }

    fn accepted_user_events(&self, _ctx: &ExecutionContext, inherited: EventSet) -> EventSet {
        inherited | EVENT_C_D
    }

    fn eval(&self, _ctx: &ExecutionContext, time_in_state: u32, requested: EventSet) -> EventSet {
        if time_in_state >= C_C_TIMEOUT {
            requested | EVENT_C_C
        } else {
            requested
        }
    }

    fn trans_action(&self, ctx: &mut ExecutionContext, event: Event) -> StateId {
        if event == EVENT_C_C {
            ctx.timeouts += 1;
            println!("  transAction: C->C");
            return STATE_C;
        }
        if event == EVENT_C_D {
            return STATE_D;
        }
        StateId::UNDEFINED
    }

    fn entry_action(&self, ctx: &mut ExecutionContext) {
        ctx.enter(STATE_C);
    }

    fn exit_action(&self, ctx: &mut ExecutionContext) {
        ctx.exit(STATE_C);
    }
}

struct StateD;

impl State<ExecutionContext> for StateD {
    fn id(&self) -> StateId {
        STATE_D
    }

    fn accepted_user_events(&self, _ctx: &ExecutionContext, inherited: EventSet) -> EventSet {
        inherited | EVENT_D_E
    }

    fn trans_action(&self, _ctx: &mut ExecutionContext, event: Event) -> StateId {
        if event == EVENT_D_E {
            return STATE_E;
        }
        StateId::UNDEFINED
    }

    fn entry_action(&self, ctx: &mut ExecutionContext) {
        ctx.enter(STATE_D);
    }

    fn exit_action(&self, ctx: &mut ExecutionContext) {
        ctx.exit(STATE_D);
    }
}

struct StateE;

impl State<ExecutionContext> for StateE {
    fn id(&self) -> StateId {
        STATE_E
    }

    fn accepted_user_events(&self, _ctx: &ExecutionContext, _inherited: EventSet) -> EventSet {
        EventSet::NONE
    }

    fn entry_action(&self, ctx: &mut ExecutionContext) {
        ctx.enter(STATE_E);
    }

    fn exit_action(&self, ctx: &mut ExecutionContext) {
        ctx.exit(STATE_E);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Composite State Demo ===\n");

    let clock = ManualClock::new();
    let mut log = Log::new(RamStore::filled(3 + 16 * 13, 0xFF), clock.clone())?;
    println!("Log init: {:?}", log.init());
    log.message(LogMessage::SystemInit.id(), 0, 0);
    let log = Rc::new(RefCell::new(log));

    let mut pool = StatePool::new();
    pool.add_simple(StateA)?;
    let c = pool.add_simple(StateC)?;
    let d = pool.add_simple(StateD)?;
    composite(&mut pool, StateB, &[c, d])?;
    pool.add_simple(StateE)?;

    let changes = Rc::clone(&log);
    let mut automaton = AutomatonBuilder::new(ExecutionContext::default())
        .states(pool)
        .clock(clock.clone())
        .log(log.clone() as SharedSink)
        .on_state_changed(move |_ctx: &mut ExecutionContext, from, _event, to| {
            let payload = [from.value() as u8, to.value() as u8, 0, 0, 0, 0, 0, 0];
            changes.borrow_mut().append(STATE_CHANGED, payload);
        })
        .build()?;

    // (elapsed ms, user request) pairs fed to the control loop.
    let script = [
        (100, EVENT_A_B),
        (300, EVENT_UNKNOWN),
        (300, EVENT_UNKNOWN),
        (500, Event::NONE),
        (2_000, Event::NONE),
        (200, EVENT_C_D),
        (400, EVENT_B_A),
        (100, EVENT_A_B),
        (100, EVENT_C_D),
        (100, EVENT_D_E),
    ];

    for (elapsed, request) in script {
        clock.advance(elapsed);
        let candidates = automaton.evaluate(request);
        // Accepted user requests win, then the lowest automatic event. An
        // unaccepted request is still sent so its rejection gets logged.
        let event = if candidates.contains(request) {
            request
        } else {
            candidates.iter().next().unwrap_or(request)
        };
        if event.is_none() {
            println!(
                "{} in {}: nothing to do",
                format_timestamp(clock.now()),
                automaton.current_state()
            );
            continue;
        }
        println!(
            "{} in {}: {}",
            format_timestamp(clock.now()),
            automaton.current_state(),
            event
        );
        let outcome = automaton.transition(event);
        println!("  -> {:?}", outcome);
    }

    println!("\nTimeouts handled: {}", automaton.context().timeouts);
    println!("\nLog, newest first:");
    for entry in log.borrow_mut().most_recent(0) {
        let description = match entry.message().and_then(|record| record.known()) {
            Some(message) => format!("{:?}", message),
            None if entry.kind == STATE_CHANGED => {
                format!("state {} -> {}", entry.payload[0], entry.payload[1])
            }
            None => format!("kind {}", entry.kind),
        };
        println!("  {}  {}", format_timestamp(entry.timestamp), description);
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
