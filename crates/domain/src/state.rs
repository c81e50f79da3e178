//! State definitions: what happens on entry to a state, and how it is left.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::trigger::Trigger;

/// A control value applied when a state is entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSetting {
    pub control: String,
    /// Requested value in display units.
    pub value: f64,
}

impl ControlSetting {
    #[must_use]
    pub fn new(control: impl Into<String>, value: f64) -> Self {
        Self {
            control: control.into(),
            value,
        }
    }
}

/// Leave the state automatically once `after` has elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedTransition {
    pub after: Duration,
    pub target: String,
}

impl TimedTransition {
    /// Build a timed transition from a duration in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDuration`] when `seconds` is negative,
    /// NaN, or too large to represent.
    pub fn from_secs(
        state: &str,
        seconds: f64,
        target: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let after =
            Duration::try_from_secs_f64(seconds).map_err(|_| ConfigError::InvalidDuration {
                state: state.to_string(),
                seconds,
            })?;
        Ok(Self {
            after,
            target: target.into(),
        })
    }
}

/// An operator-initiated transition offered while in a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualAction {
    pub label: String,
    pub target: String,
}

impl ManualAction {
    #[must_use]
    pub fn new(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: target.into(),
        }
    }
}

/// Immutable declaration of one operating state.
///
/// All lists keep declaration order: controls are applied in order,
/// the first matching trigger wins, and actions are listed as declared.
#[derive(Debug, Clone, PartialEq)]
pub struct StateDefinition {
    pub name: String,
    pub controls: Vec<ControlSetting>,
    pub triggers: Vec<Trigger>,
    pub timed: Option<TimedTransition>,
    pub actions: Vec<ManualAction>,
}

impl StateDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            controls: Vec::new(),
            triggers: Vec::new(),
            timed: None,
            actions: Vec::new(),
        }
    }

    #[must_use]
    pub fn control(mut self, control: impl Into<String>, value: f64) -> Self {
        self.controls.push(ControlSetting::new(control, value));
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    #[must_use]
    pub fn timed(mut self, timed: TimedTransition) -> Self {
        self.timed = Some(timed);
        self
    }

    #[must_use]
    pub fn action(mut self, label: impl Into<String>, target: impl Into<String>) -> Self {
        self.actions.push(ManualAction::new(label, target));
        self
    }

    /// Target of the first trigger on `sensor` that `value` fires.
    #[must_use]
    pub fn trigger_for(&self, sensor: &str, value: f64) -> Option<&str> {
        self.triggers
            .iter()
            .find(|t| t.fires_on(sensor, value))
            .map(|t| t.target.as_str())
    }

    /// Every state name this state can lead to, with repetitions.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.triggers
            .iter()
            .map(|t| t.target.as_str())
            .chain(self.timed.iter().map(|t| t.target.as_str()))
            .chain(self.actions.iter().map(|a| a.target.as_str()))
    }
}
