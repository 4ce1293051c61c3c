//! Session Module
//!
//! Coordinates discovery, connection, authentication and headset management for the
//! companion device.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  SessionService                  │
//! │  (tokio task - owns all state, API via handle)   │
//! │    (one worker applies link changes in order)    │
//! └─────────────────────────┬────────────────────────┘
//!                           │
//!         ┌─────────────────┼─────────────────┐
//!         │                 │                 │
//!         ▼                 ▼                 ▼
//! ┌──────────────┐  ┌──────────────┐  ┌──────────────┐
//! │ Router       │  │ Commands     │  │ Listener     │
//! │              │  │              │  │              │
//! │ - events     │  │ - requests   │  │ - tracing    │
//! │ - state      │  │ - results    │  │   observer   │
//! │ - registries │  │              │  │              │
//! └──────────────┘  └──────────────┘  └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`router`] - Event router: transitions, registries, observer fan-out
//! - [`commands`] - Collaborator requests and their completions
//! - [`listener`] - Logging observer
//! - [`service`] - Coordination task and its handle

pub mod commands;
pub mod listener;
pub mod router;
pub mod service;

pub use listener::TracingListener;
pub use router::{EventRouter, StartSnapshot};
pub use service::{Collaborators, HeadsetRequest, SessionHandle, SessionService};
