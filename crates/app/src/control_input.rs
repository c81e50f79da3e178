//! Driver for [`ControlInputSource`]s.

use crate::ports::{ControlInputSource, ControlOutput, EventPublisher};
use crate::state_machine::StateMachine;

/// Poll `source` on its period and apply what it proposes through the same
/// control path state entries use. Runs until the task is dropped.
pub async fn run_control_input<S, O, P>(mut source: S, machine: StateMachine<O, P>)
where
    S: ControlInputSource,
    O: ControlOutput + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(source.period());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tracing::info!(source = %source.name(), period = ?source.period(), "control input started");
    loop {
        ticker.tick().await;
        let sensors = machine.status().sensors;
        for setting in source.compute(&sensors) {
            if !machine.apply_control(&setting.control, setting.value) {
                tracing::warn!(
                    source = %source.name(),
                    control = %setting.control,
                    "control input proposed an unknown control"
                );
            }
        }
    }
}
