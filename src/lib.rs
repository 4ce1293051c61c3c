//! Companion device session coordinator.
//!
//! Drives discovery of nearby companion devices, connection and credential exchange,
//! account-conflict resolution and headset management, and reports everything to
//! host-supplied observers.

pub mod domain;
pub mod infrastructure;

pub use domain::errors::{HeadsetError, SessionError};
pub use domain::state_machine::SessionState;
pub use infrastructure::session::{Collaborators, SessionHandle, SessionService};
