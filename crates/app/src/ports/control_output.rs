//! Control output port — where applied control settings go.

use icemelt_domain::event::ControlCommand;

/// Receives every control setting the machine applies, in order.
///
/// Called while the machine lock is held. Implementations hand the command
/// off (log it, queue it for a driver task) and return immediately; the
/// machine assumes neither synchronous nor reliable delivery.
pub trait ControlOutput {
    fn send(&self, command: &ControlCommand);
}

impl<T: ControlOutput + Send + Sync> ControlOutput for std::sync::Arc<T> {
    fn send(&self, command: &ControlCommand) {
        (**self).send(command);
    }
}
