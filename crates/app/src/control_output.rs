//! Stock [`ControlOutput`] implementations.

use tokio::sync::mpsc;

use icemelt_domain::event::ControlCommand;

use crate::ports::ControlOutput;

/// Logs every setting. Stands in for a hardware driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingControlOutput;

impl ControlOutput for TracingControlOutput {
    fn send(&self, command: &ControlCommand) {
        tracing::info!(
            control = %command.control,
            display = command.display,
            raw = command.raw,
            "set {} to {}",
            command.control,
            command.raw
        );
    }
}

/// Hands settings off to an async driver task over an unbounded channel.
///
/// Sending never blocks. Commands are dropped with a warning once the
/// receiving side is gone.
#[derive(Debug, Clone)]
pub struct ChannelControlOutput {
    sender: mpsc::UnboundedSender<ControlCommand>,
}

impl ChannelControlOutput {
    /// Create the output together with the receiver the driver consumes.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ControlCommand>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ControlOutput for ChannelControlOutput {
    fn send(&self, command: &ControlCommand) {
        if self.sender.send(command.clone()).is_err() {
            tracing::warn!(control = %command.control, "control driver is gone, dropping setting");
        }
    }
}
