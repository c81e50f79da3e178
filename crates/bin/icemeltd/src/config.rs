//! Configuration loading — TOML file with environment variable overrides.
//!
//! Reads `icemelt.toml` from the working directory unless a path is given as
//! the first command-line argument or through `ICEMELT_CONFIG`. Server and
//! logging settings have defaults; sensors, controls and states describe the
//! apparatus and are turned into the immutable [`MachineConfig`] by
//! [`Config::machine_config`]. Environment variables take precedence over
//! file values.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use icemelt_domain::config::{MachineConfig, ProcessControlSpec};
use icemelt_domain::error::{ChannelKind, ConfigError};
use icemelt_domain::scale::{ControlSpec, SensorSpec};
use icemelt_domain::state::{StateDefinition, TimedTransition};
use icemelt_domain::trigger::Trigger;

/// Config file used when no path is given.
pub const DEFAULT_PATH: &str = "icemelt.toml";

/// Top-level configuration, shaped like the file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server and machine settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    pub sensors: BTreeMap<String, ChannelConfig>,
    pub controls: BTreeMap<String, ChannelConfig>,
    pub states: BTreeMap<String, StateConfig>,
    /// Declared process controllers. Parsed and reported, never run.
    pub pid: BTreeMap<String, PidConfig>,
}

/// HTTP listener and machine settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// State entered at startup.
    pub initial_state: Option<String>,
    pub max_cascade_depth: usize,
    /// Directory served under `/assets`; its `htmx.js` is also served at `/htmx.js`.
    pub assets_dir: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// A `[sensors.*]` or `[controls.*]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub raw_low: i64,
    /// Required.
    pub raw_high: Option<i64>,
    pub display_low: f64,
    pub display_high: f64,
    /// Display template, e.g. `"{:.1f}°C"`.
    pub format: Option<String>,
}

/// A `[states.*]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub controls: Vec<ControlSettingConfig>,
    pub triggers: Vec<TriggerConfig>,
    pub timed: Option<TimedConfig>,
    pub actions: Vec<ActionConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ControlSettingConfig {
    pub control: String,
    pub value: f64,
}

#[derive(Debug, Deserialize)]
pub struct TriggerConfig {
    /// `"sensor <name> above|below <threshold>"`.
    pub when: String,
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct TimedConfig {
    /// Seconds.
    pub duration: f64,
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct ActionConfig {
    pub label: String,
    pub target: String,
}

/// A `[pid.*]` section.
#[derive(Debug, Deserialize)]
pub struct PidConfig {
    pub sensor: String,
    pub proportional_gain: Option<f64>,
    pub integral_gain: Option<f64>,
    pub derivative_gain: Option<f64>,
    pub proportional_on_measurement: Option<bool>,
    /// Control calculations per second.
    pub rate_hz: Option<f64>,
}

impl Config {
    /// Load configuration from `path` then apply environment-variable
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed, or if
    /// the port is zero.
    pub fn load(path: &Path) -> Result<Self, FileConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Config path from the first CLI argument, `ICEMELT_CONFIG`, or
    /// [`DEFAULT_PATH`].
    #[must_use]
    pub fn path_from_env() -> PathBuf {
        std::env::args_os()
            .nth(1)
            .or_else(|| std::env::var_os("ICEMELT_CONFIG"))
            .map_or_else(|| PathBuf::from(DEFAULT_PATH), PathBuf::from)
    }

    fn from_file(path: &Path) -> Result<Self, FileConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| FileConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ICEMELT_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("ICEMELT_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("ICEMELT_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("ICEMELT_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), FileConfigError> {
        if self.server.port == 0 {
            return Err(FileConfigError::Validation(
                "port must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Build the validated machine configuration.
    ///
    /// Trigger declarations that do not parse are logged and dropped.
    ///
    /// # Errors
    ///
    /// Returns [`FileConfigError::Machine`] for anything the machine cannot
    /// run with.
    pub fn machine_config(&self) -> Result<MachineConfig, FileConfigError> {
        let mut builder = MachineConfig::builder()
            .listen(self.server.host.clone(), self.server.port)
            .max_cascade_depth(self.server.max_cascade_depth);
        if let Some(initial) = &self.server.initial_state {
            builder = builder.initial_state(initial.clone());
        }

        for (name, channel) in &self.sensors {
            let (raw, display) = channel.ranges(ChannelKind::Sensor, name)?;
            builder = builder.sensor(SensorSpec::new(
                name.clone(),
                raw,
                display,
                channel.format.as_deref(),
            )?);
        }
        for (name, channel) in &self.controls {
            let (raw, display) = channel.ranges(ChannelKind::Control, name)?;
            builder = builder.control(ControlSpec::new(
                name.clone(),
                raw,
                display,
                channel.format.as_deref(),
            )?);
        }
        for (name, state) in &self.states {
            builder = builder.state(state.definition(name)?);
        }
        for (name, pid) in &self.pid {
            builder = builder.process_controller(pid.spec(name));
        }

        Ok(builder.build()?)
    }
}

impl ChannelConfig {
    fn ranges(
        &self,
        kind: ChannelKind,
        name: &str,
    ) -> Result<((i64, i64), (f64, f64)), ConfigError> {
        let raw_high = self.raw_high.ok_or_else(|| ConfigError::MissingRawHigh {
            kind,
            name: name.to_string(),
        })?;
        Ok((
            (self.raw_low, raw_high),
            (self.display_low, self.display_high),
        ))
    }
}

impl StateConfig {
    fn definition(&self, name: &str) -> Result<StateDefinition, ConfigError> {
        let mut state = StateDefinition::new(name);
        for setting in &self.controls {
            state = state.control(setting.control.clone(), setting.value);
        }
        for trigger in &self.triggers {
            match Trigger::parse(&trigger.when, trigger.target.clone()) {
                Ok(parsed) => state = state.trigger(parsed),
                Err(err) => {
                    tracing::warn!(
                        state = %name,
                        when = %trigger.when,
                        error = %err,
                        "dropping malformed trigger"
                    );
                }
            }
        }
        if let Some(timed) = &self.timed {
            state = state.timed(TimedTransition::from_secs(
                name,
                timed.duration,
                timed.target.clone(),
            )?);
        }
        for action in &self.actions {
            state = state.action(action.label.clone(), action.target.clone());
        }
        Ok(state)
    }
}

impl PidConfig {
    fn spec(&self, name: &str) -> ProcessControlSpec {
        let mut spec = ProcessControlSpec::new(name, self.sensor.clone());
        if let Some(gain) = self.proportional_gain {
            spec.proportional_gain = gain;
        }
        if let Some(gain) = self.integral_gain {
            spec.integral_gain = gain;
        }
        if let Some(gain) = self.derivative_gain {
            spec.derivative_gain = gain;
        }
        if let Some(pom) = self.proportional_on_measurement {
            spec.proportional_on_measurement = pom;
        }
        if let Some(rate) = self.rate_hz {
            spec.rate_hz = rate;
        }
        spec
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 80,
            initial_state: None,
            max_cascade_depth: icemelt_domain::config::DEFAULT_MAX_CASCADE_DEPTH,
            assets_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "icemeltd=info,icemelt=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            raw_low: 0,
            raw_high: None,
            display_low: 0.0,
            display_high: 100.0,
            format: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum FileConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file parsed but describes a machine that cannot run.
    #[error("invalid machine configuration")]
    Machine(#[from] ConfigError),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const MELT: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 8080
        initial_state = "idle"

        [logging]
        filter = "debug"

        [sensors.temp]
        raw_high = 1023
        format = "{:.1f}°C"

        [controls.heater]
        raw_high = 255

        [states.idle]
        controls = [{ control = "heater", value = 0 }]
        triggers = [
            { when = "sensor temp above 32", target = "melting" },
            { when = "sensor temp sideways 3", target = "melting" },
        ]
        actions = [{ label = "Start melting", target = "melting" }]

        [states.melting]
        controls = [{ control = "heater", value = 100 }]
        timed = { duration = 30, target = "idle" }

        [pid.melt_loop]
        sensor = "temp"
        integral_gain = 0.5
    "#;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 80);
        assert_eq!(config.server.max_cascade_depth, 16);
        assert!(config.server.initial_state.is_none());
        assert!(config.states.is_empty());
    }

    #[test]
    fn should_parse_full_toml() {
        let config: Config = toml::from_str(MELT).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.sensors["temp"].raw_high, Some(1023));
        assert!((config.sensors["temp"].display_high - 100.0).abs() < f64::EPSILON);
        assert_eq!(config.states["idle"].triggers.len(), 2);
        assert_eq!(config.pid["melt_loop"].sensor, "temp");
    }

    #[test]
    fn should_build_machine_config_and_drop_malformed_trigger() {
        let config: Config = toml::from_str(MELT).unwrap();
        let machine = config.machine_config().unwrap();

        assert_eq!(machine.initial_state(), "idle");
        assert_eq!(machine.listen().to_string(), "127.0.0.1:8080");
        let idle = machine.state("idle").unwrap();
        assert_eq!(idle.triggers.len(), 1);
        assert_eq!(idle.triggers[0].target, "melting");
        assert_eq!(idle.actions[0].label, "Start melting");
        let melting = machine.state("melting").unwrap();
        assert_eq!(
            melting.timed.as_ref().unwrap().after,
            std::time::Duration::from_secs(30)
        );
        assert_eq!(machine.sensor("temp").unwrap().render(1023), "100.0°C");
        assert!(machine.warnings().is_empty());

        let pid = &machine.process_controllers()[0];
        assert_eq!(pid.name, "melt_loop");
        assert!((pid.integral_gain - 0.5).abs() < f64::EPSILON);
        assert!((pid.proportional_gain - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_require_raw_high() {
        let config: Config = toml::from_str(
            r#"
            [server]
            initial_state = "idle"
            [sensors.temp]
            raw_low = 5
            [states.idle]
            "#,
        )
        .unwrap();

        let err = config.machine_config().unwrap_err();
        assert!(matches!(
            err,
            FileConfigError::Machine(ConfigError::MissingRawHigh {
                kind: ChannelKind::Sensor,
                ..
            })
        ));
    }

    #[test]
    fn should_reject_zero_width_scale() {
        let config: Config = toml::from_str(
            r#"
            [server]
            initial_state = "idle"
            [controls.heater]
            raw_low = 10
            raw_high = 10
            [states.idle]
            "#,
        )
        .unwrap();

        assert!(matches!(
            config.machine_config(),
            Err(FileConfigError::Machine(ConfigError::Scale { .. }))
        ));
    }

    #[test]
    fn should_reject_negative_duration() {
        let config: Config = toml::from_str(
            r#"
            [server]
            initial_state = "idle"
            [states.idle]
            timed = { duration = -1, target = "idle" }
            "#,
        )
        .unwrap();

        assert!(matches!(
            config.machine_config(),
            Err(FileConfigError::Machine(ConfigError::InvalidDuration { .. }))
        ));
    }

    #[test]
    fn should_require_initial_state() {
        let config: Config = toml::from_str("[states.idle]").unwrap();

        assert!(matches!(
            config.machine_config(),
            Err(FileConfigError::Machine(ConfigError::MissingInitialState))
        ));
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("[server]\nport = 'eighty'");
        assert!(result.is_err());
    }

    #[test]
    fn should_fail_when_file_not_found() {
        let err = Config::from_file(Path::new("nonexistent.toml")).unwrap_err();
        assert!(matches!(err, FileConfigError::Io { .. }));
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }
}
