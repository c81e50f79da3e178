//! In-process event bus backed by a tokio broadcast channel.

use tokio::sync::broadcast;

use icemelt_domain::event::MachineEvent;

use crate::ports::EventPublisher;

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped). Slow subscribers lag rather than
/// blocking the publisher.
pub struct InProcessEventBus {
    sender: broadcast::Sender<MachineEvent>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MachineEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: MachineEvent) {
        // Fails only when nobody is subscribed.
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icemelt_domain::event::EventKind;

    fn sensor_event(raw: i64) -> MachineEvent {
        MachineEvent::new(EventKind::SensorUpdated {
            sensor: "temp".to_string(),
            raw,
        })
    }

    #[tokio::test]
    async fn should_deliver_event_to_subscriber() {
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();

        let event = sensor_event(40);
        bus.publish(event.clone());

        let received = rx.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn should_deliver_event_to_multiple_subscribers() {
        let bus = InProcessEventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(sensor_event(1));

        assert_eq!(rx1.recv().await.unwrap().kind, sensor_event(1).kind);
        assert_eq!(rx2.recv().await.unwrap().kind, sensor_event(1).kind);
    }

    #[test]
    fn should_not_fail_when_no_subscribers() {
        let bus = InProcessEventBus::new(16);
        bus.publish(sensor_event(1));
    }

    #[tokio::test]
    async fn should_not_deliver_events_published_before_subscription() {
        let bus = InProcessEventBus::new(16);
        bus.publish(sensor_event(1));

        let mut rx = bus.subscribe();
        bus.publish(sensor_event(2));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, sensor_event(2).kind);
    }
}
