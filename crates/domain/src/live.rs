//! Live values: the last known reading of each sensor and the last
//! requested setting of each control.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// UTC timestamp used for readings, control outputs and transitions.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Last raw reading received for a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorReading {
    pub raw: i64,
    pub at: Timestamp,
}

/// Last display value requested for a control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlReading {
    pub display: f64,
    pub at: Timestamp,
}

/// Result of querying one sensor on a running machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorValue {
    /// No sensor with that name is declared.
    Unknown,
    /// Declared, but nothing has been received yet.
    NotYetAvailable,
    /// Latest reading, with its clamped display value.
    Reading { raw: i64, display: f64, at: Timestamp },
}

impl SensorValue {
    /// Display value, if a reading exists.
    #[must_use]
    pub fn display(&self) -> Option<f64> {
        match self {
            Self::Reading { display, .. } => Some(*display),
            Self::Unknown | Self::NotYetAvailable => None,
        }
    }
}
