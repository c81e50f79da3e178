//! Configuration-time error types.
//!
//! Every variant here is fatal at startup: the state machine never runs
//! with a configuration that produced one of them. Problems that only
//! affect a single declaration (a malformed trigger, a reference to an
//! undeclared sensor) are reported as [`ConfigWarning`]s instead.

use crate::format::FormatError;
use crate::scale::ScaleError;

/// Which kind of scaled channel a configuration problem refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Sensor,
    Control,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sensor => f.write_str("sensor"),
            Self::Control => f.write_str("control"),
        }
    }
}

/// A configuration that cannot be turned into a running machine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The mandatory upper raw bound was not declared.
    #[error("{kind} `{name}` does not declare `raw_high`")]
    MissingRawHigh { kind: ChannelKind, name: String },

    /// The raw or display range cannot be mapped linearly.
    #[error("{kind} `{name}` has an invalid scale")]
    Scale {
        kind: ChannelKind,
        name: String,
        #[source]
        source: ScaleError,
    },

    /// The display template could not be parsed.
    #[error("{kind} `{name}` has an invalid format template")]
    Format {
        kind: ChannelKind,
        name: String,
        #[source]
        source: FormatError,
    },

    /// The declared initial state is not in the state table.
    #[error("initial state `{0}` is not declared")]
    UnknownInitialState(String),

    /// No initial state was declared at all.
    #[error("no initial state declared")]
    MissingInitialState,

    /// A state applies a setting to a control that was never declared.
    #[error("state `{state}` sets undeclared control `{control}`")]
    UnknownControl { state: String, control: String },

    /// A timed transition duration is negative, NaN or infinite.
    #[error("state `{state}` declares an invalid timed-transition duration ({seconds}s)")]
    InvalidDuration { state: String, seconds: f64 },
}

/// A non-fatal configuration finding, reported once at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    /// A trigger watches a sensor that is not declared; it can never match.
    UnknownTriggerSensor { state: String, sensor: String },
    /// A trigger, timed transition or action leads to an undeclared state;
    /// firing it will be ignored.
    UnknownTargetState { state: String, target: String },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTriggerSensor { state, sensor } => {
                write!(f, "state `{state}` has a trigger on undeclared sensor `{sensor}`")
            }
            Self::UnknownTargetState { state, target } => {
                write!(f, "state `{state}` leads to undeclared state `{target}`")
            }
        }
    }
}
