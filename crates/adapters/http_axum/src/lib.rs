//! # icemelt-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum), with
//! [askama](https://docs.rs/askama) templates for the status page.
//!
//! ## Responsibilities
//! - Serve a **server-side-rendered status page** (`/`, `/content-only`)
//!   with one button per manual action of the current state; buttons issue
//!   guarded transitions (`/transition/{source}/{target}`) through htmx
//!   attributes and swap the returned fragment in place
//! - Serve a small **JSON API** (`/api/status`, `/api/transition`,
//!   `/api/states/{state}/actions/{index}`)
//! - Stream diagnostic machine events over **SSE** (`/api/events/stream`)
//! - Optionally serve static assets under `/assets`, with `htmx.js` also
//!   at `/htmx.js` where the page loads it
//!
//! ## Dependency rule
//! Depends on `icemelt-app` (for the machine handle and port traits) and
//! `icemelt-domain` (for snapshot types). Never leaks axum types into the
//! domain.

pub mod api;
pub mod dashboard;
pub mod error;
pub mod router;
pub mod state;
