//! Event router.
//!
//! Adapts collaborator events and host commands into state-machine transitions and
//! registry mutations, then fans the result out to observers. The router performs no IO:
//! collaborator requests are queued as [`Command`]s and drained by the session service.

use crate::domain::conflict::ConflictResolver;
use crate::domain::device_registry::{DeviceRegistry, Discovery};
use crate::domain::errors::{CredentialError, HeadsetError, HeadsetFailure, SessionError};
use crate::domain::headset_registry::HeadsetRegistry;
use crate::domain::models::{
    CandidateDevice, Compatibility, CredentialContext, CredentialRequest, DeviceId, Headset,
    HeadsetId, HeadsetOperation, HeadsetStatus, LinkState, LoginState, RadioIndicator,
    RadioState, ScanEvent, ScanFailure, SyncEvent,
};
use crate::domain::ports::{RememberedDeviceStore, SessionListener, StatusListener};
use crate::domain::settings::SessionConfig;
use crate::domain::state_machine::{
    FollowUp, SessionEvent, SessionState, SessionStateMachine, SetupStep,
};
use crate::infrastructure::session::commands::{Command, Completion, ConnectionPurpose};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Collaborator state sampled when the session starts
#[derive(Debug, Clone)]
pub struct StartSnapshot {
    pub login: LoginState,
    /// Device the credential-sync collaborator is logged in to
    pub logged_in_device: Option<CandidateDevice>,
    /// Device the link is still attached to from an earlier session
    pub attached_device: Option<DeviceId>,
    pub radio: RadioState,
}

pub struct EventRouter {
    machine: SessionStateMachine,
    devices: DeviceRegistry,
    headsets: HeadsetRegistry,
    config: SessionConfig,
    credentials: Option<CredentialContext>,
    store: Arc<dyn RememberedDeviceStore>,
    listener: Option<Arc<dyn SessionListener>>,
    status_listener: Option<Arc<dyn StatusListener>>,
    radio: RadioState,
    running: bool,
    handlers_attached: bool,
    discovering: bool,
    /// Link teardowns requested but not yet completed
    pending_teardowns: usize,
    outbox: Vec<Command>,
}

impl EventRouter {
    pub fn new(config: SessionConfig, store: Arc<dyn RememberedDeviceStore>) -> Self {
        Self {
            machine: SessionStateMachine::new(config.handle_headsets),
            devices: DeviceRegistry::new(),
            headsets: HeadsetRegistry::new(),
            config,
            credentials: None,
            store,
            listener: None,
            status_listener: None,
            radio: RadioState::Unknown,
            running: false,
            handlers_attached: false,
            discovering: false,
            pending_teardowns: 0,
            outbox: Vec::new(),
        }
    }

    pub fn set_listener(&mut self, listener: Arc<dyn SessionListener>) {
        listener.devices_changed(&self.devices.visible(), self.devices.header_visible());
        listener.headsets_changed(self.headsets.headsets());
        self.listener = Some(listener);
    }

    pub fn set_status_listener(&mut self, listener: Arc<dyn StatusListener>) {
        self.status_listener = Some(listener);
    }

    pub fn state(&self) -> &SessionState {
        self.machine.state()
    }

    /// Device rows as observers see them
    pub fn devices(&self) -> Vec<CandidateDevice> {
        self.devices.visible()
    }

    pub fn candidates(&self) -> &[CandidateDevice] {
        self.devices.candidates()
    }

    pub fn connected_device(&self) -> Option<&CandidateDevice> {
        self.devices.connected()
    }

    pub fn remembered_device(&self) -> Option<&DeviceId> {
        self.devices.remembered()
    }

    pub fn headsets(&self) -> &[Headset] {
        self.headsets.headsets()
    }

    pub fn connected_headset(&self) -> Option<&Headset> {
        self.headsets.connected()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_discovering(&self) -> bool {
        self.discovering
    }

    pub fn handlers_attached(&self) -> bool {
        self.handlers_attached
    }

    /// Take the collaborator requests queued so far
    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }

    // ---------------------------------------------------------------
    // Session lifecycle
    // ---------------------------------------------------------------

    pub fn start(&mut self, snapshot: StartSnapshot) {
        if self.running {
            debug!("Session already running, ignoring start");
            return;
        }
        self.running = true;
        self.credentials = self.config.credentials();
        if self.credentials.is_none() {
            warn!("Session started without login data; connection attempts will be refused");
        }
        self.devices.set_remembered(self.store.load());
        self.radio = snapshot.radio;
        self.attach_handlers();

        match (snapshot.login, snapshot.logged_in_device) {
            (LoginState::Linked(compatibility), Some(device)) => {
                info!("Restoring authenticated session with {}", device.id);
                self.devices.confirm_connected(device);
                self.publish_radio(RadioIndicator::Enabled);
                self.apply(SessionEvent::RestoreAuthenticated(compatibility));
            }
            (login, _) => {
                if let LoginState::Linked(_) = login {
                    warn!("Credential service is linked but reports no device; rediscovering");
                }
                if let Some(device) = snapshot.attached_device {
                    info!("Detaching link left on {} before discovery", device);
                    self.tear_down_link(ConnectionPurpose::StartupTeardown);
                } else {
                    self.enter_discovery();
                }
            }
        }
    }

    /// Reset everything and detach from collaborators. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        info!("Cancelling session");
        self.running = false;
        self.detach_handlers();
        self.devices.clear();
        self.headsets.clear();
        self.apply(SessionEvent::Cancel);
        self.tear_down_link(ConnectionPurpose::Teardown {
            resume_discovery: false,
        });
        self.stop_discovery();
    }

    /// Drop the current device, forget it, and go back to discovery once the link is down
    pub fn disconnect_current(&mut self) -> Result<(), SessionError> {
        if !self.running {
            return Err(SessionError::NotRunning);
        }
        info!("Disconnecting current device");
        self.devices.set_remembered(None);
        self.apply(SessionEvent::Reset {
            radio_enabled: self.radio_enabled(),
        });
        self.tear_down_link(ConnectionPurpose::Teardown {
            resume_discovery: true,
        });
        Ok(())
    }

    // ---------------------------------------------------------------
    // Collaborator events
    // ---------------------------------------------------------------

    pub fn on_scan_event(&mut self, event: ScanEvent) {
        if !self.handlers_attached {
            debug!("Scan event while detached: {:?}", event);
            return;
        }
        match event {
            ScanEvent::Found(device) => self.on_device_found(device),
            ScanEvent::Lost(id) => self.on_device_lost(&id),
            ScanEvent::ScanFailed(failure) => self.on_scan_failed(failure),
            ScanEvent::RadioStateChanged(radio) => self.on_radio_changed(radio),
        }
    }

    pub fn on_sync_event(&mut self, event: SyncEvent) {
        if !self.handlers_attached {
            debug!("Credential-sync event while detached: {:?}", event);
            return;
        }
        match event {
            SyncEvent::Radio(radio) => self.on_radio_changed(radio),
            SyncEvent::Link(LinkState::Linked) => self.synchronize_credentials(),
            SyncEvent::Link(LinkState::Unlinked | LinkState::ConnectionFailed) => {
                self.on_link_dropped()
            }
        }
    }

    fn on_device_found(&mut self, device: CandidateDevice) {
        if !self.discovering {
            debug!("Discovery stopped, ignoring {}", device.id);
            return;
        }
        match self.devices.on_discovered(device) {
            Discovery::Remembered(device) => {
                info!("Remembered device {} found, connecting automatically", device.id);
                self.stop_discovery();
                if let Err(e) = self.connect_device(device, true) {
                    warn!("Automatic connection refused: {}", e);
                }
            }
            Discovery::Added(device) | Discovery::Refreshed(device) => {
                debug!("Discovered {} ({})", device.id, device.name);
                self.publish_devices();
                self.apply(SessionEvent::DeviceDiscovered);
            }
        }
    }

    fn on_device_lost(&mut self, id: &DeviceId) {
        if !self.discovering {
            return;
        }
        let outcome = self.devices.on_lost(id);
        if outcome.removed {
            debug!("Lost {}", id);
            self.publish_devices();
        } else {
            debug!("Lost unknown device {}", id);
        }
        if outcome.exhausted {
            self.apply(SessionEvent::CandidatesExhausted);
        }
    }

    fn on_scan_failed(&mut self, failure: ScanFailure) {
        match failure {
            // a radio state change follows
            ScanFailure::BluetoothDisabled => debug!("Scan failed: radio disabled"),
            ScanFailure::BluetoothUnsupported => {
                warn!("Scan failed: radio not supported");
                self.apply(SessionEvent::RadioUnsupported);
                self.publish_radio(RadioIndicator::NotSupported);
            }
        }
    }

    fn on_radio_changed(&mut self, radio: RadioState) {
        if self.radio == radio {
            return;
        }
        info!("Radio state changed: {:?} -> {:?}", self.radio, radio);
        self.radio = radio;
        self.publish_radio(radio.into());
        match radio {
            RadioState::Enabled => {
                self.apply(SessionEvent::RadioEnabled);
            }
            RadioState::Disabled => {
                self.apply(SessionEvent::RadioDisabled);
            }
            RadioState::Unknown => {}
        }
    }

    fn on_link_dropped(&mut self) {
        if self.pending_teardowns > 0 {
            debug!("Link down while a requested teardown is outstanding, ignoring");
            return;
        }
        let radio_enabled = self.radio_enabled();
        if self.apply(SessionEvent::LinkDropped { radio_enabled }) {
            info!("Communication link dropped");
        }
    }

    fn synchronize_credentials(&mut self) {
        if !self.machine.state().is_connecting() {
            debug!("Link up outside a connection attempt, not sending credentials");
            return;
        }
        match &self.credentials {
            Some(context) => {
                info!("Link up, sending credentials");
                self.outbox
                    .push(Command::SendCredentials(CredentialRequest {
                        app: self.config.app_info.clone(),
                        user: context.user.clone(),
                        music: context.music.clone(),
                    }));
            }
            None => {
                warn!("Link up but no login data to send");
                self.apply(SessionEvent::MissingLoginData);
            }
        }
    }

    // ---------------------------------------------------------------
    // Completions
    // ---------------------------------------------------------------

    pub fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::ConnectionChanged(purpose) => self.on_connection_changed(purpose),
            Completion::CredentialsSent { result, link } => self.on_credentials_sent(result, link),
            Completion::ConflictResolved { rewrite, result } => {
                self.on_conflict_resolved(rewrite, result)
            }
            Completion::HeadsetHistory(result) => self.on_headset_history(result),
            Completion::HeadsetsScanned(result) => {
                self.on_headsets_scanned(result);
            }
            Completion::Headset {
                operation,
                id,
                result,
            } => self.on_headset_completed(operation, &id, result),
            Completion::Renamed { device, name } => self.on_renamed(&device, name),
        }
    }

    fn on_connection_changed(&mut self, purpose: ConnectionPurpose) {
        match purpose {
            ConnectionPurpose::Connect { device } => {
                if self.devices.connecting().map(|d| &d.id) == Some(&device) {
                    self.apply(SessionEvent::LinkEstablished);
                } else {
                    debug!("Link change to {} completed after the attempt ended", device);
                }
            }
            ConnectionPurpose::Teardown { resume_discovery } => {
                self.pending_teardowns = self.pending_teardowns.saturating_sub(1);
                if !resume_discovery || !self.running {
                    return;
                }
                if self.is_idle() {
                    self.resume_discovery();
                } else {
                    debug!("Teardown finished in {:?}, not resuming discovery", self.state());
                }
            }
            ConnectionPurpose::StartupTeardown => {
                self.pending_teardowns = self.pending_teardowns.saturating_sub(1);
                if !self.running {
                    return;
                }
                if self.is_idle() {
                    self.enter_discovery();
                } else {
                    debug!("Startup teardown finished in {:?}, not entering discovery", self.state());
                }
            }
        }
    }

    fn on_credentials_sent(&mut self, result: Result<Compatibility, CredentialError>, link: LinkState) {
        if let Err(e) = &result {
            warn!("Credential exchange failed: {}", e);
        }
        match ConflictResolver::authentication_event(result, link) {
            Some(event) => {
                self.apply(event);
            }
            None => warn!("Credential exchange finished after the link dropped, discarding"),
        }
    }

    fn on_conflict_resolved(&mut self, rewrite: bool, result: Result<Compatibility, CredentialError>) {
        if !self.machine.state().is_conflict() {
            debug!("Conflict resolution finished outside a conflict, ignoring");
            return;
        }
        if rewrite {
            self.apply(ConflictResolver::rewrite_event(result));
            return;
        }

        if let Err(e) = &result {
            debug!("Abandoning conflict, collaborator reported: {}", e);
        }
        // the abandoned device must not be auto-connected again on rediscovery
        self.devices.set_remembered(None);
        if self.apply(SessionEvent::ConflictAbandoned) {
            self.tear_down_link(ConnectionPurpose::Teardown {
                resume_discovery: true,
            });
        }
    }

    fn on_headset_history(&mut self, result: Result<Vec<Headset>, HeadsetFailure>) {
        match result {
            Ok(headsets) => {
                if self.devices.connected().is_none() {
                    info!("Headset history arrived with no device connected, discarding");
                    return;
                }
                debug!("Headset history: {} entries", headsets.len());
                self.headsets.replace_all(headsets);
                self.publish_headsets();
            }
            Err(e) => warn!("Error retrieving headset history: {}", e),
        }
    }

    /// Apply a full headset scan and return the list handed to the caller
    pub fn on_headsets_scanned(&mut self, result: Result<Vec<Headset>, HeadsetFailure>) -> Vec<Headset> {
        match result {
            Ok(headsets) => {
                self.headsets.replace_all(headsets.clone());
                self.publish_headsets();
                headsets
            }
            Err(e) => {
                warn!("Headset scan failed: {}", e);
                Vec::new()
            }
        }
    }

    fn on_headset_completed(
        &mut self,
        operation: HeadsetOperation,
        id: &HeadsetId,
        result: Result<(), HeadsetFailure>,
    ) {
        if let (HeadsetOperation::Unpair, Err(e)) = (operation, &result) {
            warn!("Unpairing {} reported {}, removing it anyway", id, e);
        }
        let update = self.headsets.complete(operation, id, result);
        for headset in &update.changed {
            self.notify_headset_status(headset);
        }
        if !update.changed.is_empty() || update.removed.is_some() {
            self.publish_headsets();
        }
        if let Some(error) = update.error {
            warn!("Headset {:?} on {} failed: {}", operation, id, error);
            self.notify_headset_error(&error);
        }
    }

    fn on_renamed(&mut self, device: &DeviceId, name: String) {
        if self.devices.connected().map(|d| &d.id) != Some(device) {
            debug!("Rename for {} arrived after it disconnected, discarding", device);
            return;
        }
        if let Some(renamed) = self.devices.rename_connected(name) {
            info!("Renamed {} to {}", renamed.id, renamed.name);
            self.notify_device_status(&renamed);
            self.publish_devices();
        }
    }

    // ---------------------------------------------------------------
    // Host commands
    // ---------------------------------------------------------------

    /// User picked a candidate from the list
    pub fn connect_to(&mut self, id: &DeviceId) -> Result<(), SessionError> {
        if !self.running {
            return Err(SessionError::NotRunning);
        }
        let device = self
            .devices
            .find(id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownDevice(id.clone()))?;
        self.stop_discovery();
        self.connect_device(device, false)
    }

    /// User tapped a device row; on the connected device this asks for a new name
    pub fn select_device(&mut self, id: &DeviceId) {
        match self.devices.connected() {
            Some(device) if &device.id == id => {
                self.outbox.push(Command::RequestRename {
                    device: device.id.clone(),
                    current_name: device.display_name(),
                });
            }
            _ => debug!("Selected {} which is not the connected device", id),
        }
    }

    pub fn resolve_account_conflict(&mut self, rewrite: bool) -> Result<(), SessionError> {
        ConflictResolver::ensure_pending(self.machine.state())?;
        info!("Resolving account conflict (rewrite: {})", rewrite);
        self.outbox.push(Command::ResolveConflict { rewrite });
        Ok(())
    }

    pub fn scan_for_new_headsets(&mut self) {
        self.outbox.push(Command::RetrieveAllHeadsets);
    }

    /// Headset row button: connect a paired headset, pair anything else
    pub fn headset_action(&mut self, id: &HeadsetId) -> Result<(), HeadsetError> {
        let status = self.headset_status(id)?;
        if status == HeadsetStatus::Paired {
            self.connect_headset(id)
        } else {
            self.pair_headset(id)
        }
    }

    /// Headset row remove button: disconnect a connected headset, unpair a paired one
    pub fn headset_secondary_action(&mut self, id: &HeadsetId) -> Result<(), HeadsetError> {
        match self.headset_status(id)? {
            HeadsetStatus::Connected => self.disconnect_headset(id),
            HeadsetStatus::Paired => self.unpair_headset(id),
            status => {
                debug!("No secondary action for {} while {:?}", id, status);
                Ok(())
            }
        }
    }

    pub fn connect_headset(&mut self, id: &HeadsetId) -> Result<(), HeadsetError> {
        let result = self.headsets.begin_connect(id);
        self.start_headset_operation(HeadsetOperation::Connect, result)
    }

    pub fn pair_headset(&mut self, id: &HeadsetId) -> Result<(), HeadsetError> {
        let result = self.headsets.begin_pair(id);
        self.start_headset_operation(HeadsetOperation::Pair, result)
    }

    pub fn disconnect_headset(&mut self, id: &HeadsetId) -> Result<(), HeadsetError> {
        let result = self.headsets.begin_disconnect(id);
        self.start_headset_operation(HeadsetOperation::Disconnect, result)
    }

    pub fn unpair_headset(&mut self, id: &HeadsetId) -> Result<(), HeadsetError> {
        let result = self.headsets.begin_unpair(id);
        self.start_headset_operation(HeadsetOperation::Unpair, result)
    }

    fn headset_status(&self, id: &HeadsetId) -> Result<HeadsetStatus, HeadsetError> {
        match self.headsets.get(id) {
            Some(headset) => Ok(headset.status),
            None => {
                let error = HeadsetError::UnknownHeadset(id.clone());
                self.notify_headset_error(&error);
                Err(error)
            }
        }
    }

    fn start_headset_operation(
        &mut self,
        operation: HeadsetOperation,
        started: Result<Headset, HeadsetError>,
    ) -> Result<(), HeadsetError> {
        match started {
            Ok(headset) => {
                debug!("Starting headset {:?} on {}", operation, headset.id);
                if operation != HeadsetOperation::Unpair {
                    self.notify_headset_status(&headset);
                    self.publish_headsets();
                }
                self.outbox.push(Command::Headset { operation, headset });
                Ok(())
            }
            Err(error) => {
                warn!("Headset {:?} rejected: {}", operation, error);
                self.notify_headset_error(&error);
                Err(error)
            }
        }
    }

    // ---------------------------------------------------------------
    // Transitions
    // ---------------------------------------------------------------

    /// Apply `event`; returns whether the state machine took it
    fn apply(&mut self, event: SessionEvent) -> bool {
        let Some(transition) = self.machine.apply(event.clone()) else {
            debug!("Ignoring {:?} in {:?}", event, self.machine.state());
            return false;
        };
        info!("Session state {:?} -> {:?}", transition.from, transition.to);

        for step in &transition.setup {
            self.run_setup(*step);
        }
        self.notify_state(&transition.to);
        for follow_up in &transition.then {
            match follow_up {
                FollowUp::ResumeDiscovery => self.resume_discovery(),
                FollowUp::DisconnectCandidate => {
                    if let Err(e) = self.disconnect_current() {
                        debug!("Skipping disconnect: {}", e);
                    }
                }
            }
        }
        true
    }

    fn run_setup(&mut self, step: SetupStep) {
        match step {
            SetupStep::PromoteConnectedDevice => {
                let device = self
                    .devices
                    .connecting()
                    .or(self.devices.connected())
                    .cloned();
                match device {
                    Some(device) => {
                        let connected = self.devices.confirm_connected(device);
                        self.notify_device_status(&connected);
                        self.publish_devices();
                    }
                    None => warn!("Authenticated without a device to promote"),
                }
            }
            SetupStep::ClearDevices => {
                self.devices.clear();
                self.publish_devices();
            }
            SetupStep::RestoreCandidates => {
                if let Some(device) = self.devices.cancel_connecting() {
                    self.notify_device_status(&device);
                }
                self.publish_devices();
            }
            SetupStep::ClearHeadsets => {
                if !self.headsets.headsets().is_empty() {
                    self.headsets.clear();
                    self.publish_headsets();
                }
            }
            SetupStep::PersistRememberedDevice => {
                let device = self.devices.connected().map(|d| d.id.clone());
                if device.is_some() {
                    self.devices.set_remembered(device.clone());
                }
                if let Err(e) = self.store.save(device) {
                    warn!("Failed to persist remembered device: {}", e);
                }
            }
            SetupStep::RetrieveHeadsetHistory => {
                self.outbox.push(Command::RetrieveHeadsetHistory);
            }
        }
    }

    /// Clear to the idle state for the current radio and start discovering
    fn enter_discovery(&mut self) {
        self.apply(SessionEvent::Reset {
            radio_enabled: self.radio_enabled(),
        });
        self.resume_discovery();
    }

    fn resume_discovery(&mut self) {
        if !self.running {
            return;
        }
        self.publish_radio(self.radio.into());
        self.discovering = true;
        self.outbox.push(Command::StartDiscovery);
    }

    /// No link is wanted: an idle state with nothing connecting or connected
    fn is_idle(&self) -> bool {
        matches!(
            self.machine.state(),
            SessionState::NoBluetooth { .. } | SessionState::NoDeviceFound | SessionState::DeviceFound
        ) && self.devices.connecting().is_none()
            && self.devices.connected().is_none()
    }

    fn tear_down_link(&mut self, purpose: ConnectionPurpose) {
        self.pending_teardowns += 1;
        self.outbox.push(Command::ChangeConnection {
            target: None,
            purpose,
        });
    }

    fn stop_discovery(&mut self) {
        if self.discovering {
            self.discovering = false;
            self.outbox.push(Command::StopDiscovery);
        }
    }

    fn attach_handlers(&mut self) {
        if !self.handlers_attached {
            self.handlers_attached = true;
            self.outbox.push(Command::AttachHandlers);
        }
    }

    fn detach_handlers(&mut self) {
        if self.handlers_attached {
            self.handlers_attached = false;
            self.outbox.push(Command::DetachHandlers);
        }
    }

    fn connect_device(&mut self, device: CandidateDevice, automatic: bool) -> Result<(), SessionError> {
        if self.credentials.is_none() {
            warn!("Cannot connect to {} without login data", device.id);
            self.apply(SessionEvent::MissingLoginData);
            return Err(SessionError::MissingLoginData);
        }
        if !self.machine.accepts(&SessionEvent::ConnectRequested { automatic }) {
            return Err(SessionError::ConnectInProgress);
        }
        let device = self.devices.begin_connecting(device)?;
        info!("Connecting to {} (automatic: {})", device.id, automatic);
        self.notify_device_status(&device);
        self.publish_devices();
        self.apply(SessionEvent::ConnectRequested { automatic });
        self.outbox.push(Command::ChangeConnection {
            target: Some(device.id.clone()),
            purpose: ConnectionPurpose::Connect { device: device.id },
        });
        Ok(())
    }

    fn radio_enabled(&self) -> bool {
        self.radio == RadioState::Enabled
    }

    // ---------------------------------------------------------------
    // Observer fan-out
    // ---------------------------------------------------------------

    fn notify_state(&self, state: &SessionState) {
        if let Some(listener) = &self.listener {
            listener.state_changed(state);
        }
    }

    fn publish_devices(&self) {
        if let Some(listener) = &self.listener {
            listener.devices_changed(&self.devices.visible(), self.devices.header_visible());
        }
    }

    fn publish_headsets(&self) {
        if let Some(listener) = &self.listener {
            listener.headsets_changed(self.headsets.headsets());
        }
    }

    fn publish_radio(&self, radio: RadioIndicator) {
        if let Some(listener) = &self.listener {
            listener.radio_changed(radio);
        }
    }

    fn notify_device_status(&self, device: &CandidateDevice) {
        if let Some(listener) = &self.status_listener {
            listener.device_status_changed(device);
        }
    }

    fn notify_headset_status(&self, headset: &Headset) {
        if let Some(listener) = &self.status_listener {
            listener.headset_status_changed(headset);
        }
    }

    fn notify_headset_error(&self, error: &HeadsetError) {
        if let Some(listener) = &self.listener {
            listener.headset_error(error);
        }
    }
}

#[cfg(test)]
mod tests;
