//! In-process collaborators.
//!
//! `SimulatedCompanion` plays the radio scanner, the link layer and the credential-sync
//! service of one companion device; `SimulatedHeadsets` plays the classic-pairing service.
//! Both are scripted from the outside and are used by the demo binary and the tests.

use crate::domain::errors::{CredentialError, HeadsetFailure};
use crate::domain::models::{
    CandidateDevice, Compatibility, CredentialRequest, DeviceId, Headset, HeadsetOperation,
    HeadsetStatus, LinkState, LoginState, RadioState, ScanEvent, ScanFailure, SyncEvent,
};
use crate::domain::ports::{ConnectionPort, CredentialSyncPort, HeadsetPort, ScanPort};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::{mpsc, Notify};
use tracing::debug;

struct CompanionState {
    radio: RadioState,
    scanning: bool,
    scan_tx: Option<mpsc::UnboundedSender<ScanEvent>>,
    sync_tx: Option<mpsc::UnboundedSender<SyncEvent>>,
    working: bool,
    known: HashMap<DeviceId, CandidateDevice>,
    current: Option<DeviceId>,
    link: LinkState,
    login: LoginState,
    logged_in: Option<CandidateDevice>,
    auth_outcomes: VecDeque<Result<Compatibility, CredentialError>>,
    conflict_outcomes: VecDeque<Result<Compatibility, CredentialError>>,
    sent: Vec<CredentialRequest>,
    connection_changes: Vec<Option<DeviceId>>,
}

pub struct SimulatedCompanion {
    state: Mutex<CompanionState>,
}

impl Default for SimulatedCompanion {
    fn default() -> Self {
        Self::new(RadioState::Enabled)
    }
}

impl SimulatedCompanion {
    pub fn new(radio: RadioState) -> Self {
        Self {
            state: Mutex::new(CompanionState {
                radio,
                scanning: false,
                scan_tx: None,
                sync_tx: None,
                working: false,
                known: HashMap::new(),
                current: None,
                link: LinkState::Unlinked,
                login: LoginState::NotLinked,
                logged_in: None,
                auth_outcomes: VecDeque::new(),
                conflict_outcomes: VecDeque::new(),
                sent: Vec::new(),
                connection_changes: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CompanionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Pretend the credential service is still logged in to `device` from an earlier run
    pub fn restore_login(&self, device: CandidateDevice, compatibility: Compatibility) {
        let mut state = self.lock();
        state.current = Some(device.id.clone());
        state.link = LinkState::Linked;
        state.login = LoginState::Linked(compatibility);
        state.logged_in = Some(device);
    }

    /// Pretend a link from an earlier run is still attached
    pub fn attach_stale_link(&self, device: DeviceId) {
        let mut state = self.lock();
        state.current = Some(device);
        state.link = LinkState::Linked;
    }

    pub fn advertise(&self, device: CandidateDevice) {
        let mut state = self.lock();
        state.known.insert(device.id.clone(), device.clone());
        if let Some(tx) = &state.scan_tx {
            let _ = tx.send(ScanEvent::Found(device));
        }
    }

    pub fn vanish(&self, id: &DeviceId) {
        let mut state = self.lock();
        state.known.remove(id);
        if let Some(tx) = &state.scan_tx {
            let _ = tx.send(ScanEvent::Lost(id.clone()));
        }
    }

    pub fn fail_scan(&self, failure: ScanFailure) {
        if let Some(tx) = &self.lock().scan_tx {
            let _ = tx.send(ScanEvent::ScanFailed(failure));
        }
    }

    /// Toggle the radio; both the scanner and the credential service report it
    pub fn set_radio(&self, radio: RadioState) {
        let mut state = self.lock();
        state.radio = radio;
        if let Some(tx) = &state.scan_tx {
            let _ = tx.send(ScanEvent::RadioStateChanged(radio));
        }
        if let Some(tx) = &state.sync_tx {
            let _ = tx.send(SyncEvent::Radio(radio));
        }
    }

    /// Drop the link as if the device went out of range
    pub fn drop_link(&self) {
        let mut state = self.lock();
        state.current = None;
        state.link = LinkState::Unlinked;
        state.login = LoginState::NotLinked;
        state.logged_in = None;
        if let Some(tx) = &state.sync_tx {
            let _ = tx.send(SyncEvent::Link(LinkState::Unlinked));
        }
    }

    /// Queue the outcome of the next credential exchange; default is `Compatible`
    pub fn push_auth_outcome(&self, outcome: Result<Compatibility, CredentialError>) {
        self.lock().auth_outcomes.push_back(outcome);
    }

    /// Queue the outcome of the next conflict resolution; default is `Compatible`
    pub fn push_conflict_outcome(&self, outcome: Result<Compatibility, CredentialError>) {
        self.lock().conflict_outcomes.push_back(outcome);
    }

    pub fn sent_credentials(&self) -> Vec<CredentialRequest> {
        self.lock().sent.clone()
    }

    pub fn connection_changes(&self) -> Vec<Option<DeviceId>> {
        self.lock().connection_changes.clone()
    }

    pub fn is_scanning(&self) -> bool {
        self.lock().scanning
    }

    pub fn is_subscribed(&self) -> bool {
        let state = self.lock();
        state.scan_tx.is_some() || state.sync_tx.is_some()
    }

    fn finish_exchange(
        &self,
        outcome: Result<Compatibility, CredentialError>,
    ) -> Result<Compatibility, CredentialError> {
        if let Ok(compatibility) = &outcome {
            let mut state = self.lock();
            let logged_in = state.current.as_ref().map(|id| match state.known.get(id) {
                Some(device) => device.clone(),
                None => CandidateDevice::new(id.0.clone(), ""),
            });
            state.login = LoginState::Linked(*compatibility);
            state.logged_in = logged_in;
        }
        outcome
    }
}

impl ScanPort for SimulatedCompanion {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<ScanEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().scan_tx = Some(tx);
        rx
    }

    fn unsubscribe(&self) {
        self.lock().scan_tx = None;
    }

    fn radio_state(&self) -> RadioState {
        self.lock().radio
    }

    fn start_scan(&self) {
        let mut state = self.lock();
        state.scanning = true;
        if state.radio == RadioState::Disabled {
            if let Some(tx) = &state.scan_tx {
                let _ = tx.send(ScanEvent::ScanFailed(ScanFailure::BluetoothDisabled));
            }
            return;
        }
        // devices already in range are reported again
        if let Some(tx) = &state.scan_tx {
            for device in state.known.values() {
                let _ = tx.send(ScanEvent::Found(device.clone()));
            }
        }
    }

    fn stop_scan(&self) {
        self.lock().scanning = false;
    }
}

#[async_trait]
impl ConnectionPort for SimulatedCompanion {
    fn current_device(&self) -> Option<DeviceId> {
        self.lock().current.clone()
    }

    async fn change_connection(&self, target: Option<DeviceId>) {
        tokio::task::yield_now().await;
        let mut state = self.lock();
        state.connection_changes.push(target.clone());
        match target {
            Some(device) => {
                debug!("Simulated link attached to {}", device);
                state.current = Some(device);
                state.link = LinkState::Linked;
                if let Some(tx) = &state.sync_tx {
                    let _ = tx.send(SyncEvent::Link(LinkState::Linked));
                }
            }
            None => {
                let was_linked = state.current.take().is_some();
                state.link = LinkState::Unlinked;
                state.login = LoginState::NotLinked;
                state.logged_in = None;
                if was_linked {
                    if let Some(tx) = &state.sync_tx {
                        let _ = tx.send(SyncEvent::Link(LinkState::Unlinked));
                    }
                }
            }
        }
    }
}

#[async_trait]
impl CredentialSyncPort for SimulatedCompanion {
    fn is_working(&self) -> bool {
        self.lock().working
    }

    fn start_service(&self) {
        self.lock().working = true;
    }

    fn login_state(&self) -> LoginState {
        self.lock().login
    }

    fn connected_device(&self) -> Option<CandidateDevice> {
        self.lock().logged_in.clone()
    }

    fn radio_state(&self) -> RadioState {
        self.lock().radio
    }

    fn link_state(&self) -> LinkState {
        self.lock().link
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<SyncEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().sync_tx = Some(tx);
        rx
    }

    fn unsubscribe(&self) {
        self.lock().sync_tx = None;
    }

    async fn send_credentials(
        &self,
        request: CredentialRequest,
    ) -> Result<Compatibility, CredentialError> {
        tokio::task::yield_now().await;
        let outcome = {
            let mut state = self.lock();
            state.sent.push(request);
            state
                .auth_outcomes
                .pop_front()
                .unwrap_or(Ok(Compatibility::Compatible))
        };
        self.finish_exchange(outcome)
    }

    async fn resolve_conflict(&self, rewrite: bool) -> Result<Compatibility, CredentialError> {
        tokio::task::yield_now().await;
        let outcome = self
            .lock()
            .conflict_outcomes
            .pop_front()
            .unwrap_or(Ok(Compatibility::Compatible));
        if rewrite {
            self.finish_exchange(outcome)
        } else {
            outcome
        }
    }
}

/// Classic-pairing service with a scripted headset population
pub struct SimulatedHeadsets {
    history: Mutex<Vec<Headset>>,
    nearby: Mutex<Vec<Headset>>,
    failures: Mutex<Vec<(HeadsetOperation, HeadsetFailure)>>,
    started: AtomicBool,
    held: AtomicBool,
    release: Notify,
}

impl SimulatedHeadsets {
    pub fn new(history: Vec<Headset>, nearby: Vec<Headset>) -> Self {
        Self {
            history: Mutex::new(history),
            nearby: Mutex::new(nearby),
            failures: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
            held: AtomicBool::new(false),
            release: Notify::new(),
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Make the next `operation` fail with `failure`
    pub fn fail_next(&self, operation: HeadsetOperation, failure: HeadsetFailure) {
        lock(&self.failures).push((operation, failure));
    }

    /// While held, operations wait for [`SimulatedHeadsets::release_one`]
    pub fn hold(&self, held: bool) {
        self.held.store(held, Ordering::SeqCst);
    }

    pub fn release_one(&self) {
        self.release.notify_one();
    }

    async fn perform(
        &self,
        operation: HeadsetOperation,
        headset: &Headset,
        on_success: HeadsetStatus,
    ) -> Result<(), HeadsetFailure> {
        if self.held.load(Ordering::SeqCst) {
            self.release.notified().await;
        } else {
            tokio::task::yield_now().await;
        }

        let failure = {
            let mut failures = lock(&self.failures);
            failures
                .iter()
                .position(|(op, _)| *op == operation)
                .map(|index| failures.remove(index).1)
        };
        if let Some(failure) = failure {
            return Err(failure);
        }

        let mut history = lock(&self.history);
        if operation == HeadsetOperation::Unpair {
            history.retain(|h| h.id != headset.id);
            return Ok(());
        }
        if on_success == HeadsetStatus::Connected {
            for other in history.iter_mut() {
                if other.status == HeadsetStatus::Connected {
                    other.status = HeadsetStatus::Paired;
                }
            }
        }
        match history.iter_mut().find(|h| h.id == headset.id) {
            Some(known) => known.status = on_success,
            None => history.push(Headset {
                status: on_success,
                ..headset.clone()
            }),
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl HeadsetPort for SimulatedHeadsets {
    fn start_service(&self) {
        self.started.store(true, Ordering::SeqCst);
    }

    async fn retrieve_history(&self) -> Result<Vec<Headset>, HeadsetFailure> {
        tokio::task::yield_now().await;
        Ok(lock(&self.history).clone())
    }

    async fn retrieve_all(&self) -> Result<Vec<Headset>, HeadsetFailure> {
        tokio::task::yield_now().await;
        let mut all = lock(&self.history).clone();
        for headset in lock(&self.nearby).iter() {
            if !all.iter().any(|h| h.id == headset.id) {
                all.push(headset.clone());
            }
        }
        Ok(all)
    }

    async fn connect(&self, headset: &Headset) -> Result<(), HeadsetFailure> {
        self.perform(HeadsetOperation::Connect, headset, HeadsetStatus::Connected)
            .await
    }

    async fn pair(&self, headset: &Headset) -> Result<(), HeadsetFailure> {
        self.perform(HeadsetOperation::Pair, headset, HeadsetStatus::Connected)
            .await
    }

    async fn unpair(&self, headset: &Headset) -> Result<(), HeadsetFailure> {
        self.perform(HeadsetOperation::Unpair, headset, HeadsetStatus::Unpaired)
            .await
    }

    async fn disconnect(&self, headset: &Headset) -> Result<(), HeadsetFailure> {
        self.perform(HeadsetOperation::Disconnect, headset, HeadsetStatus::Paired)
            .await
    }
}
