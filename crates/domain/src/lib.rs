//! # icemelt-domain
//!
//! Pure domain model for the icemelt supervisor.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, live values and timestamps
//! - Define **scales** (linear raw ↔ display conversion and rendering)
//! - Define **triggers** (sensor threshold conditions bound to a target state)
//! - Define **states** (control settings, triggers, timed transition, manual actions)
//! - Define the immutable **machine configuration** consumed by the state machine
//! - Define **status snapshots** and **machine events** exposed to outer layers
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;

pub mod config;
pub mod event;
pub mod format;
pub mod live;
pub mod scale;
pub mod state;
pub mod status;
pub mod trigger;
