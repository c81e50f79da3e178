//! Control input port — periodic producers of control settings.
//!
//! This is the extension point for closed-loop process control: a source
//! looks at the latest sensor values and proposes control settings, which
//! the machine applies through the same path as state-entry settings.

use std::time::Duration;

use icemelt_domain::state::ControlSetting;
use icemelt_domain::status::SensorStatus;

/// A periodic source of control settings.
pub trait ControlInputSource {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// How often [`compute`](Self::compute) is called.
    fn period(&self) -> Duration;

    /// Propose control settings from the current sensor values.
    fn compute(&mut self, sensors: &[SensorStatus]) -> Vec<ControlSetting>;
}
