//! Requests the router queues for collaborators, and the completions they post back.

use crate::domain::errors::{CredentialError, HeadsetFailure};
use crate::domain::models::{
    Compatibility, CredentialRequest, DeviceId, Headset, HeadsetId, HeadsetOperation, LinkState,
};

/// Why the link is being changed; decides what happens once the change completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionPurpose {
    /// Attach to a candidate; completion moves the session to `ConnectingToDevice`
    Connect { device: DeviceId },
    /// Tear the link down
    Teardown { resume_discovery: bool },
    /// Detach a link left over from a previous session, then enter discovery
    StartupTeardown,
}

/// Collaborator request queued by the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AttachHandlers,
    DetachHandlers,
    StartDiscovery,
    StopDiscovery,
    ChangeConnection {
        target: Option<DeviceId>,
        purpose: ConnectionPurpose,
    },
    SendCredentials(CredentialRequest),
    ResolveConflict {
        rewrite: bool,
    },
    RetrieveHeadsetHistory,
    RetrieveAllHeadsets,
    Headset {
        operation: HeadsetOperation,
        headset: Headset,
    },
    RequestRename {
        device: DeviceId,
        current_name: String,
    },
}

/// Collaborator completion, resumed on the coordination task
#[derive(Debug, Clone)]
pub enum Completion {
    ConnectionChanged(ConnectionPurpose),
    CredentialsSent {
        result: Result<Compatibility, CredentialError>,
        /// Link state sampled when the exchange finished
        link: LinkState,
    },
    ConflictResolved {
        rewrite: bool,
        result: Result<Compatibility, CredentialError>,
    },
    HeadsetHistory(Result<Vec<Headset>, HeadsetFailure>),
    HeadsetsScanned(Result<Vec<Headset>, HeadsetFailure>),
    Headset {
        operation: HeadsetOperation,
        id: HeadsetId,
        result: Result<(), HeadsetFailure>,
    },
    Renamed {
        device: DeviceId,
        name: String,
    },
}
