//! # icemelt-app
//!
//! Application layer — the supervisory state machine and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Own the live machine: current state, sensor and control values, the
//!   active timed transition, and the guarded transition protocol
//!   (`StateMachine`)
//! - Define **port traits** that adapters implement:
//!   - `ControlOutput` — receives every applied control setting
//!   - `EventPublisher` — receives diagnostic machine events
//!   - `ControlInputSource` — periodic producer of control settings
//!     (reserved for closed-loop process control)
//! - Provide **in-process infrastructure** that doesn't need IO
//!   (event bus, timers, stock control outputs, sensor line feed)
//!
//! ## Dependency rule
//! Depends on `icemelt-domain` only (plus `tokio` for timers, channels and
//! async reading). Never imports adapter crates. Adapters depend on *this*
//! crate, not the reverse.

pub mod control_input;
pub mod control_output;
pub mod event_bus;
pub mod ports;
pub mod sensor_feed;
pub mod state_machine;
pub mod timer;
