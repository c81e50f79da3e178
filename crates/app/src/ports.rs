//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the state machine and the outside world.
//! They are defined here (in `app`) so that both the core and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod control_input;
pub mod control_output;
pub mod event_bus;

pub use control_input::ControlInputSource;
pub use control_output::ControlOutput;
pub use event_bus::EventPublisher;
