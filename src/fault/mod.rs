//! Fatal-halt path for unrecoverable defects.
//!
//! Both engines escalate here when their in-memory structures can no longer
//! be trusted: an unknown state id, a log whose head or tail cannot be
//! located, or a failed internal assertion. A [`FaultHandler`] never
//! returns; on a device it blinks S-O-S forever.

use crate::clock::Timestamp;
use crate::core::StateIdValue;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, trace};

/// Unrecoverable defect reported to a [`FaultHandler`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("state {id} has not been defined")]
    UnknownState { id: StateIdValue },

    #[error("log structure is inconsistent: {reason}")]
    LogInconsistent { reason: &'static str },

    #[error("assertion failed: {message} (line {line})")]
    Assertion { message: &'static str, line: u32 },

    #[error("fatal message {id} ({param1}, {param2}) logged at {timestamp}")]
    Logged {
        id: u8,
        param1: i32,
        param2: i32,
        timestamp: Timestamp,
    },
}

/// Terminal handler: implementations must never return.
pub trait FaultHandler {
    fn halt(&mut self, fault: &Fault) -> !;
}

impl<H: FaultHandler + ?Sized> FaultHandler for Box<H> {
    fn halt(&mut self, fault: &Fault) -> ! {
        (**self).halt(fault)
    }
}

/// Visual output used to signal a halted device.
pub trait Indicator {
    fn set(&mut self, on: bool);
    fn pause(&mut self, millis: u32);
}

pub const SHORT_PULSE_MS: u32 = 200;
pub const LONG_PULSE_MS: u32 = 600;

/// Pulse lengths of one S-O-S: three short, three long, three short.
pub const SOS_PATTERN: [u32; 9] = [
    SHORT_PULSE_MS,
    SHORT_PULSE_MS,
    SHORT_PULSE_MS,
    LONG_PULSE_MS,
    LONG_PULSE_MS,
    LONG_PULSE_MS,
    SHORT_PULSE_MS,
    SHORT_PULSE_MS,
    SHORT_PULSE_MS,
];

/// Emit one S-O-S followed by an inter-word gap.
pub fn signal_sos<I: Indicator + ?Sized>(indicator: &mut I) {
    for pulse in SOS_PATTERN {
        indicator.set(true);
        indicator.pause(pulse);
        indicator.set(false);
        indicator.pause(pulse);
    }
    indicator.pause(LONG_PULSE_MS);
}

/// Halts by repeating the S-O-S pattern on an indicator forever.
pub struct SosHalt<I> {
    indicator: I,
}

impl<I: Indicator> SosHalt<I> {
    pub fn new(indicator: I) -> Self {
        Self { indicator }
    }
}

impl<I: Indicator> FaultHandler for SosHalt<I> {
    fn halt(&mut self, fault: &Fault) -> ! {
        error!(%fault, "fatal fault, halting");
        loop {
            signal_sos(&mut self.indicator);
        }
    }
}

/// Hosted stand-in for an LED: traces each level change and sleeps.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingIndicator;

impl Indicator for TracingIndicator {
    fn set(&mut self, on: bool) {
        trace!(on, "indicator");
    }

    fn pause(&mut self, millis: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(millis)));
    }
}

/// Halts by panicking with the fault description. Meant for hosted runs and
/// tests, where unwinding to a test harness is the observable "stop".
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicHalt;

impl FaultHandler for PanicHalt {
    fn halt(&mut self, fault: &Fault) -> ! {
        error!(%fault, "fatal fault");
        panic!("fatal fault: {}", fault)
    }
}

/// Handler installed when none is configured.
pub fn default_handler() -> Box<dyn FaultHandler> {
    Box::new(SosHalt::new(TracingIndicator))
}

/// Halt through `handler` unless `cond` holds.
///
/// # Example
///
/// ```rust,should_panic
/// use statelog::fault::PanicHalt;
/// use statelog::halt_unless;
///
/// let mut handler = PanicHalt;
/// let slots = 0;
/// halt_unless!(&mut handler, slots > 1, "log needs two slots");
/// ```
#[macro_export]
macro_rules! halt_unless {
    ($handler:expr, $cond:expr, $msg:literal) => {
        if !$cond {
            $crate::fault::FaultHandler::halt(
                $handler,
                &$crate::fault::Fault::Assertion {
                    message: $msg,
                    line: line!(),
                },
            )
        }
    };
}
