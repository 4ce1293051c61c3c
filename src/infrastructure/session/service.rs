//! Session service.
//!
//! A single tokio task owns the [`EventRouter`]. Host commands, collaborator events and
//! collaborator completions are all funnelled into that task, so registries and session
//! state are only ever touched from one place.

use crate::domain::errors::{HeadsetError, SessionError};
use crate::domain::models::{
    CandidateDevice, DeviceId, Headset, HeadsetId, HeadsetOperation, ScanEvent, SyncEvent,
};
use crate::domain::ports::{
    ConnectionPort, CredentialSyncPort, HeadsetPort, RememberedDeviceStore, RenamePort, ScanPort,
    SessionListener, StatusListener,
};
use crate::domain::settings::SessionConfig;
use crate::domain::state_machine::SessionState;
use crate::infrastructure::session::commands::{Command, Completion, ConnectionPurpose};
use crate::infrastructure::session::router::{EventRouter, StartSnapshot};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// External collaborators the session drives
#[derive(Clone)]
pub struct Collaborators {
    pub scanner: Arc<dyn ScanPort>,
    pub connection: Arc<dyn ConnectionPort>,
    pub credentials: Arc<dyn CredentialSyncPort>,
    pub headsets: Arc<dyn HeadsetPort>,
    pub rename: Option<Arc<dyn RenamePort>>,
}

/// Headset operations a host can request by id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadsetRequest {
    Action,
    SecondaryAction,
    Pair,
    Connect,
    Disconnect,
    Unpair,
}

type Reply<T> = oneshot::Sender<T>;

type ConnectionRequest = (Option<DeviceId>, ConnectionPurpose);

enum SessionCommand {
    Start,
    Cancel,
    ConnectTo(DeviceId, Reply<Result<(), SessionError>>),
    SelectDevice(DeviceId),
    DisconnectCurrent(Reply<Result<(), SessionError>>),
    ResolveConflict(bool, Reply<Result<(), SessionError>>),
    Headset(HeadsetRequest, HeadsetId, Reply<Result<(), HeadsetError>>),
    ScanForNewHeadsets(Reply<Vec<Headset>>),
    State(Reply<SessionState>),
    Devices(Reply<Vec<CandidateDevice>>),
    Headsets(Reply<Vec<Headset>>),
    Shutdown(Reply<()>),
}

/// Cloneable front door to a running session service
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.tx
            .send(command)
            .map_err(|_| SessionError::ServiceStopped)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(build(reply))?;
        rx.await.map_err(|_| SessionError::ServiceStopped)
    }

    pub fn start(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Start)
    }

    pub fn cancel(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Cancel)
    }

    pub async fn connect_to(&self, id: DeviceId) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::ConnectTo(id, reply))
            .await?
    }

    pub fn select_device(&self, id: DeviceId) -> Result<(), SessionError> {
        self.send(SessionCommand::SelectDevice(id))
    }

    pub async fn disconnect_current(&self) -> Result<(), SessionError> {
        self.request(SessionCommand::DisconnectCurrent).await?
    }

    pub async fn resolve_account_conflict(&self, rewrite: bool) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::ResolveConflict(rewrite, reply))
            .await?
    }

    /// Outer error: the service is gone. Inner error: the operation was rejected.
    pub async fn headset(
        &self,
        request: HeadsetRequest,
        id: HeadsetId,
    ) -> Result<Result<(), HeadsetError>, SessionError> {
        self.request(|reply| SessionCommand::Headset(request, id, reply))
            .await
    }

    pub async fn headset_action(&self, id: HeadsetId) -> Result<Result<(), HeadsetError>, SessionError> {
        self.headset(HeadsetRequest::Action, id).await
    }

    pub async fn headset_secondary_action(
        &self,
        id: HeadsetId,
    ) -> Result<Result<(), HeadsetError>, SessionError> {
        self.headset(HeadsetRequest::SecondaryAction, id).await
    }

    pub async fn pair_headset(&self, id: HeadsetId) -> Result<Result<(), HeadsetError>, SessionError> {
        self.headset(HeadsetRequest::Pair, id).await
    }

    pub async fn connect_headset(&self, id: HeadsetId) -> Result<Result<(), HeadsetError>, SessionError> {
        self.headset(HeadsetRequest::Connect, id).await
    }

    pub async fn disconnect_headset(
        &self,
        id: HeadsetId,
    ) -> Result<Result<(), HeadsetError>, SessionError> {
        self.headset(HeadsetRequest::Disconnect, id).await
    }

    pub async fn unpair_headset(&self, id: HeadsetId) -> Result<Result<(), HeadsetError>, SessionError> {
        self.headset(HeadsetRequest::Unpair, id).await
    }

    /// Full headset scan; resolves once the collaborator answers
    pub async fn scan_for_new_headsets(&self) -> Result<Vec<Headset>, SessionError> {
        self.request(SessionCommand::ScanForNewHeadsets).await
    }

    pub async fn state(&self) -> Result<SessionState, SessionError> {
        self.request(SessionCommand::State).await
    }

    pub async fn devices(&self) -> Result<Vec<CandidateDevice>, SessionError> {
        self.request(SessionCommand::Devices).await
    }

    pub async fn headsets(&self) -> Result<Vec<Headset>, SessionError> {
        self.request(SessionCommand::Headsets).await
    }

    /// Cancel the session and stop the service task
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.request(SessionCommand::Shutdown).await
    }
}

enum Input {
    Command(Option<SessionCommand>),
    Completion(Completion),
    Scan(Option<ScanEvent>),
    Sync(Option<SyncEvent>),
}

pub struct SessionService {
    router: EventRouter,
    collaborators: Collaborators,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    connection_requests: mpsc::UnboundedSender<ConnectionRequest>,
    scan_events: Option<mpsc::UnboundedReceiver<ScanEvent>>,
    sync_events: Option<mpsc::UnboundedReceiver<SyncEvent>>,
    pending_scans: Vec<Reply<Vec<Headset>>>,
}

impl SessionService {
    /// Spawn the service on the current tokio runtime
    pub fn spawn(
        config: SessionConfig,
        store: Arc<dyn RememberedDeviceStore>,
        collaborators: Collaborators,
        listener: Option<Arc<dyn SessionListener>>,
        status_listener: Option<Arc<dyn StatusListener>>,
    ) -> (SessionHandle, JoinHandle<()>) {
        let handle_headsets = config.handle_headsets;
        let mut router = EventRouter::new(config, store);
        if let Some(listener) = listener {
            router.set_listener(listener);
        }
        if let Some(listener) = status_listener {
            router.set_status_listener(listener);
        }
        if handle_headsets {
            collaborators.headsets.start_service();
        }

        let (tx, commands) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let connection_requests =
            spawn_connection_worker(collaborators.connection.clone(), completions_tx.clone());
        let service = SessionService {
            router,
            collaborators,
            commands,
            completions_tx,
            completions,
            connection_requests,
            scan_events: None,
            sync_events: None,
            pending_scans: Vec::new(),
        };
        let task = tokio::spawn(service.run());
        (SessionHandle { tx }, task)
    }

    async fn run(mut self) {
        info!("Session service started");
        loop {
            // link events are handled before the completion of the request that raised them
            let input = tokio::select! {
                biased;
                command = self.commands.recv() => Input::Command(command),
                event = recv_subscribed(&mut self.sync_events) => Input::Sync(event),
                event = recv_subscribed(&mut self.scan_events) => Input::Scan(event),
                Some(completion) = self.completions.recv() => Input::Completion(completion),
            };

            match input {
                Input::Command(Some(SessionCommand::Shutdown(reply))) => {
                    self.stop();
                    let _ = reply.send(());
                    break;
                }
                Input::Command(Some(command)) => self.handle_command(command),
                Input::Command(None) => {
                    debug!("All session handles dropped");
                    self.stop();
                    break;
                }
                Input::Completion(completion) => self.handle_completion(completion),
                Input::Scan(Some(event)) => self.router.on_scan_event(event),
                Input::Scan(None) => {
                    warn!("Scan event stream closed");
                    self.scan_events = None;
                }
                Input::Sync(Some(event)) => self.router.on_sync_event(event),
                Input::Sync(None) => {
                    warn!("Credential-sync event stream closed");
                    self.sync_events = None;
                }
            }
            self.dispatch();
        }
        info!("Session service stopped");
    }

    fn stop(&mut self) {
        if self.router.is_running() || self.router.handlers_attached() {
            self.router.cancel();
        }
        self.dispatch();
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Start => {
                let snapshot = self.snapshot();
                self.router.start(snapshot);
            }
            SessionCommand::Cancel => self.router.cancel(),
            SessionCommand::ConnectTo(id, reply) => {
                let _ = reply.send(self.router.connect_to(&id));
            }
            SessionCommand::SelectDevice(id) => self.router.select_device(&id),
            SessionCommand::DisconnectCurrent(reply) => {
                let _ = reply.send(self.router.disconnect_current());
            }
            SessionCommand::ResolveConflict(rewrite, reply) => {
                let _ = reply.send(self.router.resolve_account_conflict(rewrite));
            }
            SessionCommand::Headset(request, id, reply) => {
                let result = match request {
                    HeadsetRequest::Action => self.router.headset_action(&id),
                    HeadsetRequest::SecondaryAction => self.router.headset_secondary_action(&id),
                    HeadsetRequest::Pair => self.router.pair_headset(&id),
                    HeadsetRequest::Connect => self.router.connect_headset(&id),
                    HeadsetRequest::Disconnect => self.router.disconnect_headset(&id),
                    HeadsetRequest::Unpair => self.router.unpair_headset(&id),
                };
                let _ = reply.send(result);
            }
            SessionCommand::ScanForNewHeadsets(reply) => {
                self.pending_scans.push(reply);
                // one collaborator scan serves every waiting caller
                if self.pending_scans.len() == 1 {
                    self.router.scan_for_new_headsets();
                }
            }
            SessionCommand::State(reply) => {
                let _ = reply.send(self.router.state().clone());
            }
            SessionCommand::Devices(reply) => {
                let _ = reply.send(self.router.devices());
            }
            SessionCommand::Headsets(reply) => {
                let _ = reply.send(self.router.headsets().to_vec());
            }
            SessionCommand::Shutdown(reply) => {
                self.stop();
                let _ = reply.send(());
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::HeadsetsScanned(result) => {
                let headsets = self.router.on_headsets_scanned(result);
                for reply in self.pending_scans.drain(..) {
                    let _ = reply.send(headsets.clone());
                }
            }
            other => self.router.handle_completion(other),
        }
    }

    fn snapshot(&self) -> StartSnapshot {
        let credentials = &self.collaborators.credentials;
        if !credentials.is_working() {
            info!("Starting credential-sync service");
            credentials.start_service();
        }
        StartSnapshot {
            login: credentials.login_state(),
            logged_in_device: credentials.connected_device(),
            attached_device: self.collaborators.connection.current_device(),
            radio: self.collaborators.scanner.radio_state(),
        }
    }

    /// Carry out every request the router queued
    fn dispatch(&mut self) {
        for command in self.router.drain_commands() {
            debug!("Dispatching {:?}", command);
            self.execute(command);
        }
    }

    fn execute(&mut self, command: Command) {
        let c = &self.collaborators;
        match command {
            Command::AttachHandlers => {
                self.scan_events = Some(c.scanner.subscribe());
                self.sync_events = Some(c.credentials.subscribe());
            }
            Command::DetachHandlers => {
                c.scanner.unsubscribe();
                c.credentials.unsubscribe();
                self.scan_events = None;
                self.sync_events = None;
            }
            Command::StartDiscovery => c.scanner.start_scan(),
            Command::StopDiscovery => c.scanner.stop_scan(),
            Command::ChangeConnection { target, purpose } => {
                if self.connection_requests.send((target, purpose)).is_err() {
                    error!("Connection worker gone, dropping link change");
                }
            }
            Command::SendCredentials(request) => {
                let credentials = c.credentials.clone();
                self.complete_with(async move {
                    let result = credentials.send_credentials(request).await;
                    let link = credentials.link_state();
                    Some(Completion::CredentialsSent { result, link })
                });
            }
            Command::ResolveConflict { rewrite } => {
                let credentials = c.credentials.clone();
                self.complete_with(async move {
                    let result = credentials.resolve_conflict(rewrite).await;
                    Some(Completion::ConflictResolved { rewrite, result })
                });
            }
            Command::RetrieveHeadsetHistory => {
                let headsets = c.headsets.clone();
                self.complete_with(async move {
                    Some(Completion::HeadsetHistory(headsets.retrieve_history().await))
                });
            }
            Command::RetrieveAllHeadsets => {
                let headsets = c.headsets.clone();
                self.complete_with(async move {
                    Some(Completion::HeadsetsScanned(headsets.retrieve_all().await))
                });
            }
            Command::Headset { operation, headset } => {
                let headsets = c.headsets.clone();
                self.complete_with(async move {
                    let result = match operation {
                        HeadsetOperation::Pair => headsets.pair(&headset).await,
                        HeadsetOperation::Connect => headsets.connect(&headset).await,
                        HeadsetOperation::Disconnect => headsets.disconnect(&headset).await,
                        HeadsetOperation::Unpair => headsets.unpair(&headset).await,
                    };
                    Some(Completion::Headset {
                        operation,
                        id: headset.id,
                        result,
                    })
                });
            }
            Command::RequestRename {
                device,
                current_name,
            } => match &c.rename {
                Some(rename) => {
                    let rename = rename.clone();
                    self.complete_with(async move {
                        let name = rename.request_rename(current_name).await?;
                        Some(Completion::Renamed { device, name })
                    });
                }
                None => debug!("No rename prompt available for {}", device),
            },
        }
    }

    /// Run a collaborator call on its own task and post the result back here
    fn complete_with<F>(&self, work: F)
    where
        F: std::future::Future<Output = Option<Completion>> + Send + 'static,
    {
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            if let Some(completion) = work.await {
                if tx.send(completion).is_err() {
                    error!("Session service gone, dropping collaborator completion");
                }
            }
        });
    }
}

/// Link changes run one at a time, in the order the router asked for them
fn spawn_connection_worker(
    connection: Arc<dyn ConnectionPort>,
    completions: mpsc::UnboundedSender<Completion>,
) -> mpsc::UnboundedSender<ConnectionRequest> {
    let (tx, mut rx) = mpsc::unbounded_channel::<ConnectionRequest>();
    tokio::spawn(async move {
        while let Some((target, purpose)) = rx.recv().await {
            connection.change_connection(target).await;
            if completions.send(Completion::ConnectionChanged(purpose)).is_err() {
                break;
            }
        }
        debug!("Connection worker stopped");
    });
    tx
}

async fn recv_subscribed<T>(rx: &mut Option<mpsc::UnboundedReceiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
