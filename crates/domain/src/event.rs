//! Machine events — an immutable record of something the state machine did
//! or declined to do.
//!
//! Events are diagnostics: nothing in the core depends on them being
//! delivered, and publishing never fails when nobody listens.

use serde::Serialize;

use crate::live::{Timestamp, now};

/// A setting handed to the control output driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlCommand {
    pub control: String,
    /// Requested value in display units (may be outside the display range).
    pub display: f64,
    /// Device value, clamped into the raw range.
    pub raw: i64,
}

/// Why a transition request left the machine untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// The caller's source state is no longer the current state.
    StaleSource,
    /// The target is not a declared state.
    UnknownTarget,
    /// The believed state offers no action at that index.
    UnknownAction,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// The machine entered `to`. `cascade` is the number of hops since the
    /// externally requested transition (0 for the requested one itself).
    Transitioned {
        from: Option<String>,
        to: String,
        cascade: usize,
    },
    /// A transition request was a no-op.
    TransitionIgnored {
        source: Option<String>,
        target: String,
        current: Option<String>,
        reason: IgnoreReason,
    },
    /// A control setting was applied and sent to the output driver.
    ControlApplied(ControlCommand),
    /// A sensor reading was recorded.
    SensorUpdated { sensor: String, raw: i64 },
    /// A cascade was cut short to stop a trigger cycle.
    CascadeLimitReached { state: String, depth: usize },
    /// A timed transition was scheduled.
    TimerArmed {
        source: String,
        target: String,
        after_secs: f64,
    },
}

/// A timestamped [`EventKind`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineEvent {
    pub at: Timestamp,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl MachineEvent {
    /// Stamp `kind` with the current time.
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self { at: now(), kind }
    }
}

impl From<EventKind> for MachineEvent {
    fn from(kind: EventKind) -> Self {
        Self::new(kind)
    }
}
