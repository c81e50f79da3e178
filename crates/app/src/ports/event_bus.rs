//! Event bus port — publish diagnostic machine events.

use icemelt_domain::event::MachineEvent;

/// Publishes machine events to interested subscribers.
///
/// Called while the machine lock is held: implementations must not block
/// and must tolerate having no subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: MachineEvent);
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: MachineEvent) {
        (**self).publish(event);
    }
}
