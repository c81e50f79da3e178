//! The supervisory state machine.
//!
//! A single [`StateMachine`] owns the current state, the live sensor and
//! control values and the active timed transition. Every read and mutation
//! happens under one non-reentrant lock scoped to a single logical operation;
//! no I/O is performed while it is held.
//!
//! Races between the sensor feed, operator requests and timers are resolved
//! by the source-state guard on [`StateMachine::transition`]: a request only
//! applies if the caller's view of the current state is still accurate.
//! Trigger cascades run to completion inside the same lock acquisition, so
//! other actors never observe an intermediate hop.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use icemelt_domain::config::MachineConfig;
use icemelt_domain::event::{EventKind, IgnoreReason, MachineEvent};
use icemelt_domain::live::{ControlReading, SensorReading, SensorValue, Timestamp, now};
use icemelt_domain::state::TimedTransition;
use icemelt_domain::status::{ControlStatus, SensorStatus, StatusSnapshot};

use crate::ports::{ControlOutput, EventPublisher};
use crate::timer::{TimerHandle, TimerService};

/// Errors raised while constructing a [`StateMachine`].
#[derive(Debug, thiserror::Error)]
pub enum MachineError {
    /// Timed transitions need a tokio runtime to schedule on.
    #[error("state machine must be created inside a tokio runtime")]
    NoRuntime,
}

/// Result of a guarded transition request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The machine entered the requested state and followed `hops` cascaded
    /// transitions, ending in `state`.
    Applied { state: String, hops: usize },
    /// Nothing changed.
    Ignored(IgnoreReason),
}

impl TransitionOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Result of recording a sensor reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorOutcome {
    /// No sensor with that name is declared; nothing was recorded.
    UnknownSensor,
    /// Recorded; no trigger of the current state fired.
    Recorded,
    /// Recorded, and a trigger requested a transition.
    Triggered(TransitionOutcome),
}

#[derive(Debug, Default)]
struct Inner {
    current: Option<String>,
    since: Option<Timestamp>,
    sensors: BTreeMap<String, Option<SensorReading>>,
    controls: BTreeMap<String, Option<ControlReading>>,
    timer: Option<TimerHandle>,
}

struct Shared<O, P> {
    config: MachineConfig,
    output: O,
    publisher: P,
    timers: TimerService,
    this: Weak<Shared<O, P>>,
    inner: Mutex<Inner>,
}

/// Shared handle to the running machine. Cloning is cheap.
pub struct StateMachine<O, P> {
    shared: Arc<Shared<O, P>>,
}

impl<O, P> Clone for StateMachine<O, P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<O, P> StateMachine<O, P>
where
    O: ControlOutput + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Build the machine and seed it with a transition from "no state" into
    /// the configured initial state.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::NoRuntime`] when called outside a tokio
    /// runtime.
    pub fn new(config: MachineConfig, output: O, publisher: P) -> Result<Self, MachineError> {
        let timers = TimerService::from_current()?;
        Ok(Self::with_timers(config, output, publisher, timers))
    }

    /// Like [`new`](Self::new), scheduling timed transitions on `timers`.
    pub fn with_timers(
        config: MachineConfig,
        output: O,
        publisher: P,
        timers: TimerService,
    ) -> Self {
        let inner = Inner {
            sensors: config.sensors().keys().map(|name| (name.clone(), None)).collect(),
            controls: config.controls().keys().map(|name| (name.clone(), None)).collect(),
            ..Inner::default()
        };
        let shared = Arc::new_cyclic(|this| Shared {
            config,
            output,
            publisher,
            timers,
            this: this.clone(),
            inner: Mutex::new(inner),
        });
        let initial = shared.config.initial_state().to_string();
        shared.transition(None, &initial);
        Self { shared }
    }

    #[must_use]
    pub fn config(&self) -> &MachineConfig {
        &self.shared.config
    }

    /// Move from `source` to `target` if `source` is still the current state
    /// and `target` is declared, then follow any trigger cascade.
    pub fn transition(&self, source: &str, target: &str) -> TransitionOutcome {
        self.shared.transition(Some(source), target)
    }

    /// Apply a guarded transition and return the resulting status.
    pub fn request_transition(&self, source: &str, target: &str) -> StatusSnapshot {
        self.transition(source, target);
        self.status()
    }

    /// Invoke manual action `index` of `believed_state`.
    ///
    /// A no-op when the machine has since left `believed_state`, or when the
    /// state offers no such action.
    pub fn invoke_action(&self, believed_state: &str, index: usize) -> TransitionOutcome {
        let action = self
            .shared
            .config
            .state(believed_state)
            .and_then(|state| state.actions.get(index));
        match action {
            Some(action) => self.transition(believed_state, &action.target),
            None => {
                tracing::debug!(state = %believed_state, index, "no such manual action");
                TransitionOutcome::Ignored(IgnoreReason::UnknownAction)
            }
        }
    }

    /// Record a raw sensor reading and check the current state's triggers on
    /// that sensor.
    ///
    /// The transition for a matching trigger is requested after the lock is
    /// released, from the state that was current when the reading was
    /// checked.
    pub fn set_sensor(&self, name: &str, raw: i64) -> SensorOutcome {
        let shared = &self.shared;
        let pending = {
            let mut inner = shared.inner.lock();
            let Some(slot) = inner.sensors.get_mut(name) else {
                tracing::debug!(sensor = %name, raw, "ignoring reading for unknown sensor");
                return SensorOutcome::UnknownSensor;
            };
            *slot = Some(SensorReading { raw, at: now() });
            shared.publisher.publish(MachineEvent::new(EventKind::SensorUpdated {
                sensor: name.to_string(),
                raw,
            }));

            let display = shared
                .config
                .sensor(name)
                .map(|spec| spec.display_value(raw));
            match (inner.current.clone(), display) {
                (Some(current), Some(display)) => shared
                    .config
                    .state(&current)
                    .and_then(|state| state.trigger_for(name, display))
                    .map(|target| (current, target)),
                _ => None,
            }
        };

        match pending {
            Some((state, target)) => {
                tracing::debug!(sensor = %name, raw, %state, %target, "trigger fired");
                SensorOutcome::Triggered(shared.transition(Some(&state), target))
            }
            None => SensorOutcome::Recorded,
        }
    }

    /// Apply a control setting outside of a state entry, through the same
    /// path state entries use. Returns `false` for an undeclared control.
    pub fn apply_control(&self, control: &str, display: f64) -> bool {
        let mut inner = self.shared.inner.lock();
        self.shared.apply_setting(&mut inner, control, display)
    }

    /// Latest value of a sensor.
    #[must_use]
    pub fn sensor_value(&self, name: &str) -> SensorValue {
        let Some(spec) = self.shared.config.sensor(name) else {
            return SensorValue::Unknown;
        };
        let reading = self.shared.inner.lock().sensors.get(name).copied().flatten();
        match reading {
            Some(reading) => SensorValue::Reading {
                raw: reading.raw,
                display: spec.display_value(reading.raw),
                at: reading.at,
            },
            None => SensorValue::NotYetAvailable,
        }
    }

    #[must_use]
    pub fn current_state(&self) -> Option<String> {
        self.shared.inner.lock().current.clone()
    }

    /// Consistent snapshot for the status surface. Rendering happens after
    /// the lock is released.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        let config = &self.shared.config;
        let (state, since, sensors, controls) = {
            let inner = self.shared.inner.lock();
            (
                inner.current.clone(),
                inner.since,
                inner.sensors.clone(),
                inner.controls.clone(),
            )
        };

        let actions = state
            .as_deref()
            .and_then(|name| config.state(name))
            .map(|def| def.actions.clone())
            .unwrap_or_default();

        StatusSnapshot {
            sensors: config
                .sensors()
                .values()
                .map(|spec| SensorStatus::new(spec, sensors.get(&spec.name).copied().flatten()))
                .collect(),
            controls: config
                .controls()
                .values()
                .map(|spec| ControlStatus::new(spec, controls.get(&spec.name).copied().flatten()))
                .collect(),
            state,
            since,
            actions,
        }
    }
}

impl<O, P> Shared<O, P>
where
    O: ControlOutput + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    fn transition(&self, source: Option<&str>, target: &str) -> TransitionOutcome {
        let mut inner = self.inner.lock();
        self.apply(&mut inner, source, target)
    }

    fn apply(&self, inner: &mut Inner, source: Option<&str>, target: &str) -> TransitionOutcome {
        let reason = if inner.current.as_deref() != source {
            Some(IgnoreReason::StaleSource)
        } else if self.config.state(target).is_none() {
            Some(IgnoreReason::UnknownTarget)
        } else {
            None
        };
        if let Some(reason) = reason {
            tracing::debug!(?source, %target, current = ?inner.current, ?reason, "transition ignored");
            self.ignored(inner, source, target, reason);
            return TransitionOutcome::Ignored(reason);
        }

        let mut from = source.map(str::to_string);
        let mut state = target;
        let mut hops = 0;
        loop {
            self.enter(inner, from.as_deref(), state, hops);

            let Some(next) = self.cascade_target(inner, state) else {
                break;
            };
            if self.config.state(next).is_none() {
                tracing::warn!(%state, target = %next, "cascade to undeclared state");
                self.ignored(inner, Some(state), next, IgnoreReason::UnknownTarget);
                break;
            }
            if hops >= self.config.max_cascade_depth() {
                tracing::warn!(%state, depth = hops, "cascade limit reached");
                self.publisher
                    .publish(MachineEvent::new(EventKind::CascadeLimitReached {
                        state: state.to_string(),
                        depth: hops,
                    }));
                break;
            }

            from = Some(state.to_string());
            state = next;
            hops += 1;
        }

        TransitionOutcome::Applied {
            state: state.to_string(),
            hops,
        }
    }

    fn ignored(&self, inner: &Inner, source: Option<&str>, target: &str, reason: IgnoreReason) {
        self.publisher
            .publish(MachineEvent::new(EventKind::TransitionIgnored {
                source: source.map(str::to_string),
                target: target.to_string(),
                current: inner.current.clone(),
                reason,
            }));
    }

    /// Enter a declared state: apply its controls, replace the timer and
    /// stamp the transition.
    fn enter(&self, inner: &mut Inner, from: Option<&str>, name: &str, cascade: usize) {
        let Some(state) = self.config.state(name) else {
            return;
        };
        tracing::info!(?from, to = %name, cascade, "entering state");
        inner.current = Some(name.to_string());
        self.publisher
            .publish(MachineEvent::new(EventKind::Transitioned {
                from: from.map(str::to_string),
                to: name.to_string(),
                cascade,
            }));

        for setting in &state.controls {
            self.apply_setting(inner, &setting.control, setting.value);
        }

        if let Some(timer) = inner.timer.take() {
            timer.cancel();
        }
        if let Some(timed) = &state.timed {
            inner.timer = Some(self.arm(name, timed));
        }

        inner.since = Some(now());
    }

    fn apply_setting(&self, inner: &mut Inner, control: &str, display: f64) -> bool {
        let Some(spec) = self.config.control(control) else {
            tracing::warn!(%control, "ignoring setting for unknown control");
            return false;
        };
        let command = spec.command(display);
        inner.controls.insert(
            control.to_string(),
            Some(ControlReading { display, at: now() }),
        );
        self.output.send(&command);
        self.publisher
            .publish(MachineEvent::new(EventKind::ControlApplied(command)));
        true
    }

    fn arm(&self, source: &str, timed: &TimedTransition) -> TimerHandle {
        tracing::debug!(%source, target = %timed.target, after = ?timed.after, "arming timer");
        self.publisher.publish(MachineEvent::new(EventKind::TimerArmed {
            source: source.to_string(),
            target: timed.target.clone(),
            after_secs: timed.after.as_secs_f64(),
        }));

        let this = self.this.clone();
        let source = source.to_string();
        let target = timed.target.clone();
        self.timers.schedule(timed.after, move || {
            if let Some(shared) = this.upgrade() {
                shared.transition(Some(&source), &target);
            }
        })
    }

    /// First trigger of `state` whose sensor has a reading that satisfies it.
    fn cascade_target<'a>(&'a self, inner: &Inner, state: &str) -> Option<&'a str> {
        let definition = self.config.state(state)?;
        definition.triggers.iter().find_map(|trigger| {
            let reading = inner.sensors.get(&trigger.sensor).copied().flatten()?;
            let spec = self.config.sensor(&trigger.sensor)?;
            trigger
                .matches(spec.display_value(reading.raw))
                .then_some(trigger.target.as_str())
        })
    }
}
