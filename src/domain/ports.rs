//! Collaborator and observer interfaces.
//!
//! Collaborators push events through unbounded channels handed out by `subscribe`;
//! requests with a completion are async methods. Observers are plain synchronous sinks.

use crate::domain::errors::{CredentialError, HeadsetError, HeadsetFailure};
use crate::domain::models::{
    CandidateDevice, Compatibility, CredentialRequest, DeviceId, Headset, LinkState, LoginState,
    RadioIndicator, RadioState, ScanEvent, SyncEvent,
};
use crate::domain::state_machine::SessionState;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Radio-level discovery
pub trait ScanPort: Send + Sync {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<ScanEvent>;
    fn unsubscribe(&self);
    fn radio_state(&self) -> RadioState;
    fn start_scan(&self);
    fn stop_scan(&self);
}

/// Low-level link establishment
#[async_trait]
pub trait ConnectionPort: Send + Sync {
    /// Device the link is currently attached to, if any
    fn current_device(&self) -> Option<DeviceId>;

    /// Attach the link to `target`, or tear it down with `None`
    async fn change_connection(&self, target: Option<DeviceId>);
}

/// Credential exchange with the companion device
#[async_trait]
pub trait CredentialSyncPort: Send + Sync {
    fn is_working(&self) -> bool;
    fn start_service(&self);
    fn login_state(&self) -> LoginState;
    /// Device the collaborator is logged in to
    fn connected_device(&self) -> Option<CandidateDevice>;
    fn radio_state(&self) -> RadioState;
    fn link_state(&self) -> LinkState;

    fn subscribe(&self) -> mpsc::UnboundedReceiver<SyncEvent>;
    fn unsubscribe(&self);

    async fn send_credentials(
        &self,
        request: CredentialRequest,
    ) -> Result<Compatibility, CredentialError>;

    async fn resolve_conflict(&self, rewrite: bool) -> Result<Compatibility, CredentialError>;
}

/// Classic pairing of secondary peripherals
#[async_trait]
pub trait HeadsetPort: Send + Sync {
    fn start_service(&self);
    async fn retrieve_history(&self) -> Result<Vec<Headset>, HeadsetFailure>;
    async fn retrieve_all(&self) -> Result<Vec<Headset>, HeadsetFailure>;
    async fn connect(&self, headset: &Headset) -> Result<(), HeadsetFailure>;
    async fn pair(&self, headset: &Headset) -> Result<(), HeadsetFailure>;
    async fn unpair(&self, headset: &Headset) -> Result<(), HeadsetFailure>;
    async fn disconnect(&self, headset: &Headset) -> Result<(), HeadsetFailure>;
}

/// Host prompt for a new device name
#[async_trait]
pub trait RenamePort: Send + Sync {
    /// `None` when the user dismissed the prompt
    async fn request_rename(&self, current_name: String) -> Option<String>;
}

/// Sink for the remembered device identifier
pub trait RememberedDeviceStore: Send + Sync {
    fn load(&self) -> Option<DeviceId>;
    fn save(&self, device: Option<DeviceId>) -> anyhow::Result<()>;
}

/// List and state channel
pub trait SessionListener: Send + Sync {
    fn state_changed(&self, state: &SessionState);
    fn devices_changed(&self, devices: &[CandidateDevice], header_visible: bool);
    fn headsets_changed(&self, headsets: &[Headset]);
    fn radio_changed(&self, radio: RadioIndicator);
    fn headset_error(&self, error: &HeadsetError);
}

/// Per-item status channel
pub trait StatusListener: Send + Sync {
    fn device_status_changed(&self, device: &CandidateDevice);
    fn headset_status_changed(&self, headset: &Headset);
}

#[cfg(test)]
mockall::mock! {
    pub RememberedStore {}

    impl RememberedDeviceStore for RememberedStore {
        fn load(&self) -> Option<DeviceId>;
        fn save(&self, device: Option<DeviceId>) -> anyhow::Result<()>;
    }
}
