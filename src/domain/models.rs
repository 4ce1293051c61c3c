use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a primary companion device (one per physical unit)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-row status of a primary device as shown to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceStatus {
    #[default]
    NotConnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDevice {
    pub id: DeviceId,
    pub name: String,
    #[serde(default)]
    pub status: DeviceStatus,
}

impl CandidateDevice {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: DeviceId::new(id),
            name: name.into(),
            status: DeviceStatus::NotConnected,
        }
    }

    /// Name offered to the user when renaming
    pub fn display_name(&self) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            "Unknown".to_string()
        } else {
            name.to_string()
        }
    }
}

/// Firmware compatibility reported by a successful credential exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compatibility {
    Compatible,
    UpdateRecommended,
    UpdateRequired,
}

/// Radio power state as reported by the scan and credential-sync collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioState {
    Enabled,
    Disabled,
    Unknown,
}

/// Radio badge pushed to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadioIndicator {
    Enabled,
    Disabled,
    NotSupported,
    Unknown,
}

impl From<RadioState> for RadioIndicator {
    fn from(state: RadioState) -> Self {
        match state {
            RadioState::Enabled => RadioIndicator::Enabled,
            RadioState::Disabled => RadioIndicator::Disabled,
            RadioState::Unknown => RadioIndicator::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanFailure {
    BluetoothDisabled,
    BluetoothUnsupported,
}

/// Events pushed by the scan collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    Found(CandidateDevice),
    Lost(DeviceId),
    ScanFailed(ScanFailure),
    RadioStateChanged(RadioState),
}

/// Communication link state of the credential-sync collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Linked,
    Unlinked,
    ConnectionFailed,
}

/// Login state of the credential-sync collaborator at session start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    NotLinked,
    Linked(Compatibility),
}

/// Events pushed by the credential-sync collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    Radio(RadioState),
    Link(LinkState),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub account_id: String,
    pub display_name: String,
    pub token: String,
}

/// Linked music-service account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicAccount {
    pub service: String,
    pub username: String,
    pub token: String,
}

/// Validated user context required before any authentication attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialContext {
    pub user: UserRecord,
    pub music: Option<MusicAccount>,
}

/// Payload handed to the credential-sync collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRequest {
    pub app: AppInfo,
    pub user: UserRecord,
    pub music: Option<MusicAccount>,
}

/// MAC-like headset identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeadsetId(pub String);

impl HeadsetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for HeadsetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadsetStatus {
    Unpaired,
    Pairing,
    Paired,
    Connecting,
    Connected,
}

impl HeadsetStatus {
    /// Pairing or connecting; at most one headset may be here
    pub fn is_in_flight(self) -> bool {
        matches!(self, HeadsetStatus::Pairing | HeadsetStatus::Connecting)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headset {
    pub id: HeadsetId,
    pub name: String,
    pub status: HeadsetStatus,
}

impl Headset {
    pub fn new(id: impl Into<String>, name: impl Into<String>, status: HeadsetStatus) -> Self {
        Self {
            id: HeadsetId::new(id),
            name: name.into(),
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadsetOperation {
    Pair,
    Connect,
    Disconnect,
    Unpair,
}
