//! Machine configuration — the immutable, validated model the state machine
//! runs on.
//!
//! Built once at startup through [`MachineConfig::builder`]; never mutated
//! afterwards. Construction fails fast on anything that would make the
//! machine misbehave at runtime (see [`ConfigError`]); problems confined to
//! a single declaration are reported by [`MachineConfig::warnings`].

use std::collections::BTreeMap;

use crate::error::{ConfigError, ConfigWarning};
use crate::scale::{ControlSpec, SensorSpec};
use crate::state::StateDefinition;

/// Cascade hops allowed after the requested transition before the machine
/// stops following triggers.
pub const DEFAULT_MAX_CASCADE_DEPTH: usize = 16;

/// Where the status surface listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenAddress {
    pub host: String,
    pub port: u16,
}

impl Default for ListenAddress {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 80,
        }
    }
}

impl std::fmt::Display for ListenAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Declaration of a closed-loop process controller.
///
/// Reserved for a future control-input source; the machine itself never
/// runs a control loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessControlSpec {
    pub name: String,
    /// Sensor the loop would measure.
    pub sensor: String,
    pub proportional_gain: f64,
    pub integral_gain: f64,
    pub derivative_gain: f64,
    pub proportional_on_measurement: bool,
    /// Control calculations per second.
    pub rate_hz: f64,
}

impl ProcessControlSpec {
    /// Declare a controller with the stock gains.
    #[must_use]
    pub fn new(name: impl Into<String>, sensor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sensor: sensor.into(),
            proportional_gain: 1.0,
            integral_gain: 0.1,
            derivative_gain: 0.05,
            proportional_on_measurement: false,
            rate_hz: 0.1,
        }
    }
}

/// Validated sensor, control and state declarations plus server settings.
#[derive(Debug, Clone)]
pub struct MachineConfig {
    sensors: BTreeMap<String, SensorSpec>,
    controls: BTreeMap<String, ControlSpec>,
    states: BTreeMap<String, StateDefinition>,
    initial_state: String,
    listen: ListenAddress,
    max_cascade_depth: usize,
    process_controllers: Vec<ProcessControlSpec>,
}

impl MachineConfig {
    /// Create a builder for constructing a [`MachineConfig`].
    #[must_use]
    pub fn builder() -> MachineConfigBuilder {
        MachineConfigBuilder::default()
    }

    #[must_use]
    pub fn sensors(&self) -> &BTreeMap<String, SensorSpec> {
        &self.sensors
    }

    #[must_use]
    pub fn controls(&self) -> &BTreeMap<String, ControlSpec> {
        &self.controls
    }

    #[must_use]
    pub fn states(&self) -> &BTreeMap<String, StateDefinition> {
        &self.states
    }

    #[must_use]
    pub fn sensor(&self, name: &str) -> Option<&SensorSpec> {
        self.sensors.get(name)
    }

    #[must_use]
    pub fn control(&self, name: &str) -> Option<&ControlSpec> {
        self.controls.get(name)
    }

    #[must_use]
    pub fn state(&self, name: &str) -> Option<&StateDefinition> {
        self.states.get(name)
    }

    #[must_use]
    pub fn initial_state(&self) -> &str {
        &self.initial_state
    }

    #[must_use]
    pub fn listen(&self) -> &ListenAddress {
        &self.listen
    }

    #[must_use]
    pub fn max_cascade_depth(&self) -> usize {
        self.max_cascade_depth
    }

    #[must_use]
    pub fn process_controllers(&self) -> &[ProcessControlSpec] {
        &self.process_controllers
    }

    /// Non-fatal findings: triggers on undeclared sensors and transitions
    /// to undeclared states.
    #[must_use]
    pub fn warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        for state in self.states.values() {
            for trigger in &state.triggers {
                if !self.sensors.contains_key(&trigger.sensor) {
                    warnings.push(ConfigWarning::UnknownTriggerSensor {
                        state: state.name.clone(),
                        sensor: trigger.sensor.clone(),
                    });
                }
            }
            for target in state.targets() {
                if !self.states.contains_key(target) {
                    warnings.push(ConfigWarning::UnknownTargetState {
                        state: state.name.clone(),
                        target: target.to_string(),
                    });
                }
            }
        }
        warnings
    }
}

/// Step-by-step builder for [`MachineConfig`].
#[derive(Debug, Default)]
pub struct MachineConfigBuilder {
    sensors: BTreeMap<String, SensorSpec>,
    controls: BTreeMap<String, ControlSpec>,
    states: BTreeMap<String, StateDefinition>,
    initial_state: Option<String>,
    listen: Option<ListenAddress>,
    max_cascade_depth: Option<usize>,
    process_controllers: Vec<ProcessControlSpec>,
}

impl MachineConfigBuilder {
    #[must_use]
    pub fn sensor(mut self, spec: SensorSpec) -> Self {
        self.sensors.insert(spec.name.clone(), spec);
        self
    }

    #[must_use]
    pub fn control(mut self, spec: ControlSpec) -> Self {
        self.controls.insert(spec.name.clone(), spec);
        self
    }

    #[must_use]
    pub fn state(mut self, state: StateDefinition) -> Self {
        self.states.insert(state.name.clone(), state);
        self
    }

    #[must_use]
    pub fn initial_state(mut self, name: impl Into<String>) -> Self {
        self.initial_state = Some(name.into());
        self
    }

    #[must_use]
    pub fn listen(mut self, host: impl Into<String>, port: u16) -> Self {
        self.listen = Some(ListenAddress {
            host: host.into(),
            port,
        });
        self
    }

    #[must_use]
    pub fn max_cascade_depth(mut self, depth: usize) -> Self {
        self.max_cascade_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn process_controller(mut self, spec: ProcessControlSpec) -> Self {
        self.process_controllers.push(spec);
        self
    }

    /// Consume the builder, validate, and return a [`MachineConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingInitialState`] or
    /// [`ConfigError::UnknownInitialState`] when the initial state is absent
    /// or undeclared, and [`ConfigError::UnknownControl`] when a state sets
    /// an undeclared control.
    pub fn build(self) -> Result<MachineConfig, ConfigError> {
        let initial_state = self.initial_state.ok_or(ConfigError::MissingInitialState)?;
        if !self.states.contains_key(&initial_state) {
            return Err(ConfigError::UnknownInitialState(initial_state));
        }
        for state in self.states.values() {
            if let Some(setting) = state
                .controls
                .iter()
                .find(|setting| !self.controls.contains_key(&setting.control))
            {
                return Err(ConfigError::UnknownControl {
                    state: state.name.clone(),
                    control: setting.control.clone(),
                });
            }
        }

        Ok(MachineConfig {
            sensors: self.sensors,
            controls: self.controls,
            states: self.states,
            initial_state,
            listen: self.listen.unwrap_or_default(),
            max_cascade_depth: self.max_cascade_depth.unwrap_or(DEFAULT_MAX_CASCADE_DEPTH),
            process_controllers: self.process_controllers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::{Direction, Trigger};

    fn temp() -> SensorSpec {
        SensorSpec::new("temp", (0, 100), (0.0, 100.0), None).unwrap()
    }

    fn heater() -> ControlSpec {
        ControlSpec::new("heater", (0, 255), (0.0, 100.0), None).unwrap()
    }

    #[test]
    fn should_build_minimal_config_with_defaults() {
        let config = MachineConfig::builder()
            .state(StateDefinition::new("idle"))
            .initial_state("idle")
            .build()
            .unwrap();
        assert_eq!(config.initial_state(), "idle");
        assert_eq!(config.listen().to_string(), "localhost:80");
        assert_eq!(config.max_cascade_depth(), DEFAULT_MAX_CASCADE_DEPTH);
    }

    #[test]
    fn should_fail_without_initial_state() {
        let err = MachineConfig::builder()
            .state(StateDefinition::new("idle"))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingInitialState);
    }

    #[test]
    fn should_fail_on_undeclared_initial_state() {
        let err = MachineConfig::builder()
            .state(StateDefinition::new("idle"))
            .initial_state("melting")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownInitialState("melting".to_string()));
    }

    #[test]
    fn should_fail_on_undeclared_control_setting() {
        let err = MachineConfig::builder()
            .control(heater())
            .state(StateDefinition::new("idle").control("fan", 10.0))
            .initial_state("idle")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownControl {
                state: "idle".to_string(),
                control: "fan".to_string()
            }
        );
    }

    #[test]
    fn should_warn_about_dangling_references() {
        let config = MachineConfig::builder()
            .sensor(temp())
            .control(heater())
            .state(
                StateDefinition::new("idle")
                    .control("heater", 0.0)
                    .trigger(Trigger::new("temp", Direction::Above, 32.0, "melting"))
                    .trigger(Trigger::new("humidity", Direction::Below, 5.0, "idle"))
                    .action("Stop", "off"),
            )
            .state(StateDefinition::new("melting"))
            .initial_state("idle")
            .build()
            .unwrap();

        let warnings = config.warnings();
        assert_eq!(
            warnings,
            vec![
                ConfigWarning::UnknownTriggerSensor {
                    state: "idle".to_string(),
                    sensor: "humidity".to_string()
                },
                ConfigWarning::UnknownTargetState {
                    state: "idle".to_string(),
                    target: "off".to_string()
                },
            ]
        );
    }

    #[test]
    fn should_use_stock_gains_for_process_controllers() {
        let pid = ProcessControlSpec::new("melt", "temp");
        assert!((pid.proportional_gain - 1.0).abs() < f64::EPSILON);
        assert!((pid.integral_gain - 0.1).abs() < f64::EPSILON);
        assert!((pid.derivative_gain - 0.05).abs() < f64::EPSILON);
        assert!(!pid.proportional_on_measurement);
        assert!((pid.rate_hz - 0.1).abs() < f64::EPSILON);
    }
}
