//! Line-oriented sensor feed.
//!
//! Each line carries one reading, `<sensor name> <raw integer>`. The name
//! may contain spaces; the value is whatever follows the last one.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::ports::{ControlOutput, EventPublisher};
use crate::state_machine::StateMachine;

/// Counts of lines consumed by [`run_sensor_feed`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedSummary {
    pub accepted: usize,
    pub skipped: usize,
}

/// Split a feed line into a sensor name and raw value.
#[must_use]
pub fn parse_line(line: &str) -> Option<(&str, i64)> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (name, value) = line.rsplit_once(' ')?;
    if name.is_empty() {
        return None;
    }
    let raw = value.parse().ok()?;
    Some((name, raw))
}

/// Deliver readings from `reader` to the machine, one at a time, until EOF.
///
/// Malformed lines are skipped. Readings for undeclared sensors count as
/// accepted; the machine ignores them.
///
/// # Errors
///
/// Returns the underlying I/O error if reading fails.
pub async fn run_sensor_feed<R, O, P>(
    reader: R,
    machine: StateMachine<O, P>,
) -> std::io::Result<FeedSummary>
where
    R: AsyncBufRead + Unpin,
    O: ControlOutput + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let mut lines = reader.lines();
    let mut summary = FeedSummary::default();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Some((name, raw)) => {
                machine.set_sensor(name, raw);
                summary.accepted += 1;
            }
            None => {
                tracing::debug!(%line, "skipping malformed sensor line");
                summary.skipped += 1;
            }
        }
    }
    tracing::info!(
        accepted = summary.accepted,
        skipped = summary.skipped,
        "sensor feed closed"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use icemelt_domain::config::MachineConfig;
    use icemelt_domain::live::SensorValue;
    use icemelt_domain::scale::SensorSpec;
    use icemelt_domain::state::StateDefinition;
    use icemelt_domain::trigger::{Direction, Trigger};

    use super::*;
    use crate::control_output::TracingControlOutput;
    use crate::event_bus::InProcessEventBus;

    #[test]
    fn should_split_on_last_space() {
        assert_eq!(parse_line("temp 40"), Some(("temp", 40)));
        assert_eq!(parse_line("water temp -3"), Some(("water temp", -3)));
        assert_eq!(parse_line("temp 40\r"), Some(("temp", 40)));
    }

    #[test]
    fn should_reject_malformed_lines() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("temp"), None);
        assert_eq!(parse_line("temp forty"), None);
        assert_eq!(parse_line("temp 4.5"), None);
        assert_eq!(parse_line(" 12"), None);
    }

    #[tokio::test]
    async fn should_feed_readings_into_machine() {
        let config = MachineConfig::builder()
            .sensor(SensorSpec::new("water temp", (0, 100), (0.0, 100.0), None).unwrap())
            .state(StateDefinition::new("idle").trigger(Trigger::new(
                "water temp",
                Direction::Above,
                32.0,
                "melting",
            )))
            .state(StateDefinition::new("melting"))
            .initial_state("idle")
            .build()
            .unwrap();
        let machine = StateMachine::new(
            config,
            TracingControlOutput,
            Arc::new(InProcessEventBus::new(16)),
        )
        .unwrap();

        let input: &[u8] = b"water temp 10\ngarbage\nwater temp 40\npressure 3\n";
        let summary = run_sensor_feed(input, machine.clone()).await.unwrap();

        assert_eq!(
            summary,
            FeedSummary {
                accepted: 3,
                skipped: 1
            }
        );
        assert_eq!(machine.current_state().as_deref(), Some("melting"));
        assert!(matches!(
            machine.sensor_value("water temp"),
            SensorValue::Reading { raw: 40, .. }
        ));
    }
}
