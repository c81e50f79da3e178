//! Shared application state for axum handlers.

use std::sync::Arc;

use icemelt_app::event_bus::InProcessEventBus;
use icemelt_app::state_machine::StateMachine;

/// Application state shared across all axum handlers.
///
/// Generic over the machine's control output and event publisher to avoid
/// dynamic dispatch. `Clone` is implemented manually so those types need
/// not be `Clone` themselves.
pub struct AppState<O, P> {
    /// Handle to the running machine.
    pub machine: StateMachine<O, P>,
    /// Bus the SSE stream subscribes to.
    pub event_bus: Arc<InProcessEventBus>,
}

impl<O, P> Clone for AppState<O, P> {
    fn clone(&self) -> Self {
        Self {
            machine: self.machine.clone(),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}

impl<O, P> AppState<O, P> {
    pub fn new(machine: StateMachine<O, P>, event_bus: Arc<InProcessEventBus>) -> Self {
        Self { machine, event_bus }
    }
}
