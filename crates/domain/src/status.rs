//! Status snapshot — a consistent, render-ready view of a running machine.

use serde::Serialize;

use crate::live::{ControlReading, SensorReading, Timestamp};
use crate::scale::{ControlSpec, SensorSpec};
use crate::state::ManualAction;

/// Rendering used for a value that has never been set.
pub const UNSET_VALUE: &str = "?";

/// One sensor row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorStatus {
    pub name: String,
    pub raw: Option<i64>,
    /// Clamped display value.
    pub display: Option<f64>,
    /// Display text, with `<`/`>` markers when out of range.
    pub rendered: String,
    pub as_of: Option<Timestamp>,
}

impl SensorStatus {
    #[must_use]
    pub fn new(spec: &SensorSpec, reading: Option<SensorReading>) -> Self {
        Self {
            name: spec.name.clone(),
            raw: reading.map(|r| r.raw),
            display: reading.map(|r| spec.display_value(r.raw)),
            rendered: reading.map_or_else(|| UNSET_VALUE.to_string(), |r| spec.render(r.raw)),
            as_of: reading.map(|r| r.at),
        }
    }

    /// Timestamp text, or `"no reading yet"`.
    #[must_use]
    pub fn as_of_text(&self) -> String {
        self.as_of
            .map_or_else(|| "no reading yet".to_string(), |at| at.to_rfc3339())
    }
}

/// One control row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlStatus {
    pub name: String,
    /// Requested display value.
    pub display: Option<f64>,
    /// Display text, annotated when the request was clipped.
    pub rendered: String,
    pub as_of: Option<Timestamp>,
}

impl ControlStatus {
    #[must_use]
    pub fn new(spec: &ControlSpec, reading: Option<ControlReading>) -> Self {
        Self {
            name: spec.name.clone(),
            display: reading.map(|r| r.display),
            rendered: reading.map_or_else(|| UNSET_VALUE.to_string(), |r| spec.render(r.display)),
            as_of: reading.map(|r| r.at),
        }
    }

    /// Timestamp text, or `"not yet set"`.
    #[must_use]
    pub fn as_of_text(&self) -> String {
        self.as_of
            .map_or_else(|| "not yet set".to_string(), |at| at.to_rfc3339())
    }
}

/// Everything the status surface shows, captured under a single lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// Current state; `None` only before the machine is seeded.
    pub state: Option<String>,
    pub since: Option<Timestamp>,
    pub sensors: Vec<SensorStatus>,
    pub controls: Vec<ControlStatus>,
    /// Manual actions offered by the current state.
    pub actions: Vec<ManualAction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::now;

    #[test]
    fn should_render_unset_sensor() {
        let spec = SensorSpec::new("temp", (0, 100), (0.0, 100.0), None).unwrap();
        let status = SensorStatus::new(&spec, None);
        assert_eq!(status.rendered, "?");
        assert_eq!(status.display, None);
        assert_eq!(status.as_of_text(), "no reading yet");
    }

    #[test]
    fn should_render_sensor_reading() {
        let spec = SensorSpec::new("temp", (0, 100), (0.0, 100.0), None).unwrap();
        let status = SensorStatus::new(&spec, Some(SensorReading { raw: 40, at: now() }));
        assert_eq!(status.rendered, "40%");
        assert_eq!(status.raw, Some(40));
        assert!(status.as_of.is_some());
    }

    #[test]
    fn should_render_unset_control() {
        let spec = ControlSpec::new("heater", (0, 255), (0.0, 100.0), None).unwrap();
        let status = ControlStatus::new(&spec, None);
        assert_eq!(status.rendered, "?");
        assert_eq!(status.as_of_text(), "not yet set");
    }

    #[test]
    fn should_render_clipped_control() {
        let spec = ControlSpec::new("heater", (0, 255), (0.0, 100.0), None).unwrap();
        let reading = ControlReading {
            display: 120.0,
            at: now(),
        };
        let status = ControlStatus::new(&spec, Some(reading));
        assert_eq!(status.rendered, "100% (clipped from 120%)");
    }
}
