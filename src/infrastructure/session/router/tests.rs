use super::*;
use crate::domain::models::{AppInfo, DeviceStatus, UserRecord};
use crate::domain::ports::MockRememberedStore;
use crate::infrastructure::persistence::InMemoryDeviceStore;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
enum Observed {
    State(SessionState),
    Devices(Vec<CandidateDevice>, bool),
    Headsets(Vec<Headset>),
    Radio(RadioIndicator),
    HeadsetError(HeadsetError),
    DeviceStatus(DeviceId, DeviceStatus),
    HeadsetStatus(HeadsetId, HeadsetStatus),
}

#[derive(Default)]
struct RecordingListener {
    seen: Mutex<Vec<Observed>>,
}

impl RecordingListener {
    fn take(&self) -> Vec<Observed> {
        std::mem::take(&mut *self.seen.lock().unwrap())
    }

    fn states(&self) -> Vec<SessionState> {
        self.take()
            .into_iter()
            .filter_map(|o| match o {
                Observed::State(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    fn push(&self, observed: Observed) {
        self.seen.lock().unwrap().push(observed);
    }
}

impl SessionListener for RecordingListener {
    fn state_changed(&self, state: &SessionState) {
        self.push(Observed::State(state.clone()));
    }

    fn devices_changed(&self, devices: &[CandidateDevice], header_visible: bool) {
        self.push(Observed::Devices(devices.to_vec(), header_visible));
    }

    fn headsets_changed(&self, headsets: &[Headset]) {
        self.push(Observed::Headsets(headsets.to_vec()));
    }

    fn radio_changed(&self, radio: RadioIndicator) {
        self.push(Observed::Radio(radio));
    }

    fn headset_error(&self, error: &HeadsetError) {
        self.push(Observed::HeadsetError(error.clone()));
    }
}

impl StatusListener for RecordingListener {
    fn device_status_changed(&self, device: &CandidateDevice) {
        self.push(Observed::DeviceStatus(device.id.clone(), device.status));
    }

    fn headset_status_changed(&self, headset: &Headset) {
        self.push(Observed::HeadsetStatus(headset.id.clone(), headset.status));
    }
}

fn config(with_user: bool) -> SessionConfig {
    SessionConfig {
        app_info: AppInfo {
            name: "companion".into(),
            version: "1.0".into(),
        },
        user: with_user.then(|| UserRecord {
            account_id: "acc-1".into(),
            display_name: "Ada".into(),
            token: "t0k3n".into(),
        }),
        music_account: None,
        handle_headsets: true,
    }
}

fn idle_snapshot() -> StartSnapshot {
    StartSnapshot {
        login: LoginState::NotLinked,
        logged_in_device: None,
        attached_device: None,
        radio: RadioState::Enabled,
    }
}

fn device(id: &str) -> CandidateDevice {
    CandidateDevice::new(id, format!("Speaker {}", id))
}

fn headset(id: &str, status: HeadsetStatus) -> Headset {
    Headset::new(id, format!("Buds {}", id), status)
}

struct Harness {
    router: EventRouter,
    listener: Arc<RecordingListener>,
    store: Arc<InMemoryDeviceStore>,
}

fn harness(with_user: bool, remembered: Option<&str>) -> Harness {
    let store = Arc::new(InMemoryDeviceStore::new(remembered.map(DeviceId::new)));
    let listener = Arc::new(RecordingListener::default());
    let mut router = EventRouter::new(config(with_user), store.clone());
    router.set_listener(listener.clone());
    router.set_status_listener(listener.clone());
    listener.take();
    Harness {
        router,
        listener,
        store,
    }
}

fn started(with_user: bool, remembered: Option<&str>) -> Harness {
    let mut h = harness(with_user, remembered);
    h.router.start(idle_snapshot());
    h.router.drain_commands();
    h.listener.take();
    h
}

/// Drive a manual connection up to `Authenticated`
fn authenticated(id: &str) -> Harness {
    let mut h = started(true, None);
    h.router.on_scan_event(ScanEvent::Found(device(id)));
    h.router.connect_to(&DeviceId::new(id)).unwrap();
    h.router.handle_completion(Completion::ConnectionChanged(ConnectionPurpose::Connect {
        device: DeviceId::new(id),
    }));
    h.router.on_sync_event(SyncEvent::Link(LinkState::Linked));
    h.router.handle_completion(Completion::CredentialsSent {
        result: Ok(Compatibility::Compatible),
        link: LinkState::Linked,
    });
    h.router.drain_commands();
    h.listener.take();
    h
}

#[test]
fn test_start_attaches_and_discovers() {
    let mut h = harness(true, None);
    h.router.start(idle_snapshot());

    assert_eq!(h.router.state(), &SessionState::NoDeviceFound);
    assert!(h.router.is_running());
    assert!(h.router.is_discovering());
    assert_eq!(
        h.router.drain_commands(),
        vec![Command::AttachHandlers, Command::StartDiscovery]
    );
    assert!(h
        .listener
        .take()
        .contains(&Observed::Radio(RadioIndicator::Enabled)));
}

#[test]
fn test_start_with_radio_off_reports_no_bluetooth() {
    let mut h = harness(true, None);
    h.router.start(StartSnapshot {
        radio: RadioState::Disabled,
        ..idle_snapshot()
    });
    assert_eq!(
        h.router.state(),
        &SessionState::NoBluetooth { was_enabled: true }
    );
}

#[test]
fn test_start_restores_authenticated_session() {
    let mut h = harness(true, None);
    h.router.start(StartSnapshot {
        login: LoginState::Linked(Compatibility::UpdateRecommended),
        logged_in_device: Some(device("D1")),
        attached_device: Some(DeviceId::new("D1")),
        radio: RadioState::Enabled,
    });

    assert_eq!(
        h.router.state(),
        &SessionState::Authenticated(Compatibility::UpdateRecommended)
    );
    assert_eq!(h.router.connected_device().unwrap().id, DeviceId::new("D1"));
    assert_eq!(h.store.current(), Some(DeviceId::new("D1")));
    assert!(!h.router.is_discovering());
    assert!(h
        .router
        .drain_commands()
        .contains(&Command::RetrieveHeadsetHistory));
}

#[test]
fn test_start_tears_down_stale_link_before_discovery() {
    let mut h = harness(true, None);
    h.router.start(StartSnapshot {
        attached_device: Some(DeviceId::new("D9")),
        ..idle_snapshot()
    });
    assert!(!h.router.is_discovering());
    assert_eq!(
        h.router.drain_commands(),
        vec![
            Command::AttachHandlers,
            Command::ChangeConnection {
                target: None,
                purpose: ConnectionPurpose::StartupTeardown,
            },
        ]
    );

    h.router
        .handle_completion(Completion::ConnectionChanged(ConnectionPurpose::StartupTeardown));
    assert!(h.router.is_discovering());
    assert_eq!(h.router.drain_commands(), vec![Command::StartDiscovery]);
}

#[test]
fn test_discovery_lists_candidates_once() {
    let mut h = started(true, None);
    h.router.on_scan_event(ScanEvent::Found(device("D1")));
    h.router.on_scan_event(ScanEvent::Found(device("D1")));
    h.router.on_scan_event(ScanEvent::Found(device("D2")));

    assert_eq!(h.router.state(), &SessionState::DeviceFound);
    assert_eq!(h.router.candidates().len(), 2);
}

#[test]
fn test_losing_last_candidate_returns_to_no_device_found() {
    let mut h = started(true, None);
    h.router.on_scan_event(ScanEvent::Found(device("D1")));
    h.router.on_scan_event(ScanEvent::Lost(DeviceId::new("D1")));

    assert_eq!(h.router.state(), &SessionState::NoDeviceFound);
    assert!(h.router.candidates().is_empty());
}

#[test]
fn test_remembered_device_connects_without_listing() {
    let mut h = started(true, Some("D1"));
    h.router.on_scan_event(ScanEvent::Found(device("D1")));

    assert_eq!(
        h.router.state(),
        &SessionState::PrepareToConnect { automatic: true }
    );
    assert!(h.router.candidates().is_empty());
    assert!(!h.router.is_discovering());
    let commands = h.router.drain_commands();
    assert_eq!(commands[0], Command::StopDiscovery);
    assert_eq!(
        commands[1],
        Command::ChangeConnection {
            target: Some(DeviceId::new("D1")),
            purpose: ConnectionPurpose::Connect {
                device: DeviceId::new("D1")
            },
        }
    );
}

#[test]
fn test_remembered_device_without_login_data_is_interactor_error() {
    let mut h = started(false, Some("D1"));
    h.router.on_scan_event(ScanEvent::Found(device("D1")));

    assert_eq!(
        h.router.state(),
        &SessionState::InteractorError(crate::domain::errors::InteractorError::NoLoginData)
    );
    assert!(h.router.candidates().is_empty());
    assert!(!h
        .router
        .drain_commands()
        .iter()
        .any(|c| matches!(c, Command::ChangeConnection { .. })));
}

#[test]
fn test_manual_connect_rejects_without_login_data() {
    let mut h = started(false, None);
    h.router.on_scan_event(ScanEvent::Found(device("D1")));
    assert_eq!(
        h.router.connect_to(&DeviceId::new("D1")),
        Err(SessionError::MissingLoginData)
    );
    assert!(matches!(h.router.state(), SessionState::InteractorError(_)));
}

#[test]
fn test_second_connect_is_rejected_while_first_is_in_flight() {
    let mut h = started(true, None);
    h.router.on_scan_event(ScanEvent::Found(device("D1")));
    h.router.on_scan_event(ScanEvent::Found(device("D2")));
    h.router.connect_to(&DeviceId::new("D1")).unwrap();

    assert_eq!(
        h.router.connect_to(&DeviceId::new("D2")),
        Err(SessionError::ConnectInProgress)
    );
    assert_eq!(
        h.router.devices(),
        vec![CandidateDevice {
            status: DeviceStatus::Connecting,
            ..device("D1")
        }]
    );
}

#[test]
fn test_connect_to_unknown_device() {
    let mut h = started(true, None);
    assert_eq!(
        h.router.connect_to(&DeviceId::new("nope")),
        Err(SessionError::UnknownDevice(DeviceId::new("nope")))
    );
}

#[test]
fn test_connect_requires_running_session() {
    let mut h = harness(true, None);
    assert_eq!(
        h.router.connect_to(&DeviceId::new("D1")),
        Err(SessionError::NotRunning)
    );
}

#[test]
fn test_full_connection_flow() {
    let mut h = started(true, None);
    h.router.on_scan_event(ScanEvent::Found(device("D1")));
    h.router.connect_to(&DeviceId::new("D1")).unwrap();
    h.router.handle_completion(Completion::ConnectionChanged(ConnectionPurpose::Connect {
        device: DeviceId::new("D1"),
    }));
    assert_eq!(
        h.router.state(),
        &SessionState::ConnectingToDevice { automatic: false }
    );

    h.router.drain_commands();
    h.router.on_sync_event(SyncEvent::Link(LinkState::Linked));
    let commands = h.router.drain_commands();
    match &commands[..] {
        [Command::SendCredentials(request)] => {
            assert_eq!(request.user.account_id, "acc-1");
            assert_eq!(request.app.name, "companion");
        }
        other => panic!("unexpected commands {:?}", other),
    }

    h.router.handle_completion(Completion::CredentialsSent {
        result: Ok(Compatibility::Compatible),
        link: LinkState::Linked,
    });
    assert_eq!(
        h.router.state(),
        &SessionState::Authenticated(Compatibility::Compatible)
    );
    assert_eq!(h.router.devices().len(), 1);
    assert_eq!(h.router.devices()[0].status, DeviceStatus::Connected);
    assert_eq!(h.store.current(), Some(DeviceId::new("D1")));
    assert_eq!(h.router.remembered_device(), Some(&DeviceId::new("D1")));
    assert_eq!(
        h.router.drain_commands(),
        vec![Command::RetrieveHeadsetHistory]
    );
}

#[test]
fn test_auth_success_after_link_drop_is_discarded() {
    let mut h = started(true, None);
    h.router.on_scan_event(ScanEvent::Found(device("D1")));
    h.router.connect_to(&DeviceId::new("D1")).unwrap();
    h.router.handle_completion(Completion::CredentialsSent {
        result: Ok(Compatibility::Compatible),
        link: LinkState::Unlinked,
    });
    assert_eq!(
        h.router.state(),
        &SessionState::PrepareToConnect { automatic: false }
    );
}

#[test]
fn test_auth_failure_reports_error_then_resets() {
    let mut h = started(true, None);
    h.router.on_scan_event(ScanEvent::Found(device("D1")));
    h.router.connect_to(&DeviceId::new("D1")).unwrap();
    h.listener.take();
    h.router.handle_completion(Completion::CredentialsSent {
        result: Err(CredentialError::Other("timeout".into())),
        link: LinkState::Linked,
    });

    assert_eq!(
        h.listener.states(),
        vec![
            SessionState::ConnectionError("timeout".into()),
            SessionState::NoDeviceFound,
        ]
    );
    assert!(h.router.devices().is_empty());
    assert_eq!(h.store.current(), None);
    assert!(h.router.drain_commands().contains(&Command::ChangeConnection {
        target: None,
        purpose: ConnectionPurpose::Teardown {
            resume_discovery: true
        },
    }));
}

#[test]
fn test_conflict_abandon_restores_candidates() {
    let mut h = started(true, None);
    h.router.on_scan_event(ScanEvent::Found(device("D1")));
    h.router.on_scan_event(ScanEvent::Found(device("D2")));
    h.router.connect_to(&DeviceId::new("D1")).unwrap();
    h.router.handle_completion(Completion::CredentialsSent {
        result: Err(CredentialError::CloudAccountConflict),
        link: LinkState::Linked,
    });
    assert_eq!(h.router.state(), &SessionState::CloudAccountConflict);

    h.router.resolve_account_conflict(false).unwrap();
    assert_eq!(
        h.router.drain_commands().last(),
        Some(&Command::ResolveConflict { rewrite: false })
    );
    h.listener.take();
    h.router.handle_completion(Completion::ConflictResolved {
        rewrite: false,
        result: Ok(Compatibility::Compatible),
    });

    assert_eq!(h.router.state(), &SessionState::NoDeviceFound);
    let devices = h.router.devices();
    assert_eq!(devices.len(), 2);
    assert!(devices.iter().all(|d| d.status == DeviceStatus::NotConnected));
    assert!(h
        .listener
        .take()
        .contains(&Observed::DeviceStatus(DeviceId::new("D1"), DeviceStatus::NotConnected)));
    assert_eq!(h.router.remembered_device(), None);
}

#[test]
fn test_late_abandon_teardown_does_not_disturb_next_connection() {
    let mut h = started(true, None);
    h.router.on_scan_event(ScanEvent::Found(device("D1")));
    h.router.on_scan_event(ScanEvent::Found(device("D2")));
    h.router.connect_to(&DeviceId::new("D1")).unwrap();
    h.router.handle_completion(Completion::CredentialsSent {
        result: Err(CredentialError::CloudAccountConflict),
        link: LinkState::Linked,
    });
    h.router.handle_completion(Completion::ConflictResolved {
        rewrite: false,
        result: Ok(Compatibility::Compatible),
    });
    h.router.drain_commands();

    h.router.connect_to(&DeviceId::new("D2")).unwrap();
    h.router.drain_commands();

    // the abandon teardown drops the D1 link and then completes
    h.router.on_sync_event(SyncEvent::Link(LinkState::Unlinked));
    h.router.handle_completion(Completion::ConnectionChanged(ConnectionPurpose::Teardown {
        resume_discovery: true,
    }));
    assert_eq!(
        h.router.state(),
        &SessionState::PrepareToConnect { automatic: false }
    );
    assert!(!h.router.is_discovering());
    assert!(!h.router.drain_commands().contains(&Command::StartDiscovery));

    h.router.handle_completion(Completion::ConnectionChanged(ConnectionPurpose::Connect {
        device: DeviceId::new("D2"),
    }));
    h.router.on_sync_event(SyncEvent::Link(LinkState::Linked));
    h.router.handle_completion(Completion::CredentialsSent {
        result: Ok(Compatibility::Compatible),
        link: LinkState::Linked,
    });
    assert_eq!(
        h.router.state(),
        &SessionState::Authenticated(Compatibility::Compatible)
    );
    assert_eq!(
        h.router.connected_device().map(|d| d.id.clone()),
        Some(DeviceId::new("D2"))
    );

    h.router.on_scan_event(ScanEvent::Found(device("D9")));
    assert!(!h.router.is_discovering());
    assert!(h.router.candidates().iter().all(|d| d.id != DeviceId::new("D9")));
}

#[test]
fn test_link_drop_after_teardown_completes_is_handled() {
    let mut h = authenticated("D1");
    h.router.disconnect_current().unwrap();
    h.router.handle_completion(Completion::ConnectionChanged(ConnectionPurpose::Teardown {
        resume_discovery: true,
    }));
    assert!(h.router.is_discovering());

    h.router.on_scan_event(ScanEvent::Found(device("D2")));
    h.router.connect_to(&DeviceId::new("D2")).unwrap();
    h.router.handle_completion(Completion::ConnectionChanged(ConnectionPurpose::Connect {
        device: DeviceId::new("D2"),
    }));
    assert_eq!(
        h.router.state(),
        &SessionState::ConnectingToDevice { automatic: false }
    );

    h.router.on_sync_event(SyncEvent::Link(LinkState::ConnectionFailed));
    assert_eq!(h.router.state(), &SessionState::NoDeviceFound);
}

#[test]
fn test_conflict_rewrite_keeps_music_conflict_resolvable() {
    let mut h = started(true, None);
    h.router.on_scan_event(ScanEvent::Found(device("D1")));
    h.router.connect_to(&DeviceId::new("D1")).unwrap();
    h.router.handle_completion(Completion::CredentialsSent {
        result: Err(CredentialError::CloudAccountConflict),
        link: LinkState::Linked,
    });
    h.router.handle_completion(Completion::ConflictResolved {
        rewrite: true,
        result: Err(CredentialError::MusicAccountConflict),
    });
    assert_eq!(h.router.state(), &SessionState::MusicAccountConflict);

    h.router.handle_completion(Completion::ConflictResolved {
        rewrite: true,
        result: Ok(Compatibility::UpdateRequired),
    });
    assert_eq!(
        h.router.state(),
        &SessionState::Authenticated(Compatibility::UpdateRequired)
    );
}

#[test]
fn test_resolve_conflict_requires_pending_conflict() {
    let mut h = started(true, None);
    assert_eq!(
        h.router.resolve_account_conflict(true),
        Err(SessionError::NoConflictPending)
    );
    assert!(h.router.drain_commands().is_empty());
}

#[test]
fn test_link_drop_resets_and_resumes_discovery() {
    let mut h = authenticated("D1");
    h.router.on_sync_event(SyncEvent::Link(LinkState::Unlinked));

    assert_eq!(h.router.state(), &SessionState::NoDeviceFound);
    assert!(h.router.devices().is_empty());
    assert!(h.router.is_discovering());
    assert_eq!(h.router.drain_commands(), vec![Command::StartDiscovery]);
}

#[test]
fn test_radio_toggle_is_deduped() {
    let mut h = started(true, None);
    h.router
        .on_scan_event(ScanEvent::RadioStateChanged(RadioState::Disabled));
    h.router.on_sync_event(SyncEvent::Radio(RadioState::Disabled));
    assert_eq!(
        h.listener.states(),
        vec![SessionState::NoBluetooth { was_enabled: true }]
    );

    h.router.on_sync_event(SyncEvent::Radio(RadioState::Enabled));
    assert_eq!(h.router.state(), &SessionState::NoDeviceFound);
}

#[test]
fn test_unsupported_radio() {
    let mut h = started(true, None);
    h.router.on_scan_event(ScanEvent::ScanFailed(ScanFailure::BluetoothUnsupported));
    assert_eq!(
        h.router.state(),
        &SessionState::NoBluetooth { was_enabled: false }
    );
    assert!(h
        .listener
        .take()
        .contains(&Observed::Radio(RadioIndicator::NotSupported)));

    h.router.on_sync_event(SyncEvent::Radio(RadioState::Disabled));
    h.router.on_sync_event(SyncEvent::Radio(RadioState::Enabled));
    assert_eq!(
        h.router.state(),
        &SessionState::NoBluetooth { was_enabled: false }
    );
    assert!(!h.router.drain_commands().contains(&Command::StartDiscovery));
}

#[test]
fn test_disconnect_current_forgets_device() {
    let mut h = authenticated("D1");
    h.router.disconnect_current().unwrap();

    assert_eq!(h.router.state(), &SessionState::NoDeviceFound);
    assert_eq!(h.router.remembered_device(), None);
    assert_eq!(h.store.current(), None);
    assert_eq!(
        h.router.drain_commands(),
        vec![Command::ChangeConnection {
            target: None,
            purpose: ConnectionPurpose::Teardown {
                resume_discovery: true
            },
        }]
    );
}

#[test]
fn test_cancel_is_idempotent() {
    let mut h = authenticated("D1");
    assert_eq!(h.store.current(), Some(DeviceId::new("D1")));
    h.router.cancel();
    let first = h.router.drain_commands();
    assert!(first.contains(&Command::DetachHandlers));
    assert!(!h.router.handlers_attached());

    h.router.cancel();
    assert_eq!(h.router.state(), &SessionState::NoDeviceFound);
    assert!(h.router.devices().is_empty());
    assert!(h.router.headsets().is_empty());
    assert_eq!(h.store.current(), None);
    assert!(!h.router.drain_commands().contains(&Command::DetachHandlers));
}

#[test]
fn test_events_ignored_after_cancel() {
    let mut h = started(true, None);
    h.router.cancel();
    h.router.on_scan_event(ScanEvent::Found(device("D1")));
    assert!(h.router.candidates().is_empty());
    assert_eq!(h.router.state(), &SessionState::NoDeviceFound);
}

#[test]
fn test_headset_history_applies_only_while_connected() {
    let mut h = started(true, None);
    h.router.handle_completion(Completion::HeadsetHistory(Ok(vec![headset(
        "H1",
        HeadsetStatus::Paired,
    )])));
    assert!(h.router.headsets().is_empty());

    let mut h = authenticated("D1");
    h.router.handle_completion(Completion::HeadsetHistory(Ok(vec![
        headset("H1", HeadsetStatus::Paired),
        headset("H2", HeadsetStatus::Connected),
    ])));
    assert_eq!(h.router.headsets().len(), 2);
    assert_eq!(h.router.connected_headset().unwrap().id, HeadsetId::new("H2"));
}

#[test]
fn test_headset_connect_flow() {
    let mut h = authenticated("D1");
    h.router.handle_completion(Completion::HeadsetHistory(Ok(vec![
        headset("H1", HeadsetStatus::Paired),
        headset("H2", HeadsetStatus::Connected),
    ])));
    h.listener.take();

    h.router.headset_action(&HeadsetId::new("H1")).unwrap();
    assert!(matches!(
        h.router.drain_commands()[..],
        [Command::Headset {
            operation: HeadsetOperation::Connect,
            ..
        }]
    ));
    assert_eq!(
        h.router.pair_headset(&HeadsetId::new("H2")),
        Err(HeadsetError::OperationInProgress)
    );

    h.router.handle_completion(Completion::Headset {
        operation: HeadsetOperation::Connect,
        id: HeadsetId::new("H1"),
        result: Ok(()),
    });
    assert_eq!(h.router.connected_headset().unwrap().id, HeadsetId::new("H1"));
    let seen = h.listener.take();
    assert!(seen.contains(&Observed::HeadsetStatus(
        HeadsetId::new("H2"),
        HeadsetStatus::Paired
    )));
    assert!(seen.contains(&Observed::HeadsetError(HeadsetError::OperationInProgress)));
}

#[test]
fn test_headset_failure_reverts_and_reports() {
    let mut h = authenticated("D1");
    h.router.handle_completion(Completion::HeadsetHistory(Ok(vec![headset(
        "H1",
        HeadsetStatus::Connected,
    )])));
    h.router.headset_secondary_action(&HeadsetId::new("H1")).unwrap();
    h.listener.take();

    let failure = HeadsetFailure::new(-4, "classic");
    h.router.handle_completion(Completion::Headset {
        operation: HeadsetOperation::Disconnect,
        id: HeadsetId::new("H1"),
        result: Err(failure.clone()),
    });
    assert_eq!(h.router.headsets()[0].status, HeadsetStatus::Connected);
    assert!(h
        .listener
        .take()
        .contains(&Observed::HeadsetError(HeadsetError::DisconnectFailed(failure))));
}

#[test]
fn test_unpair_removes_even_on_failure() {
    let mut h = authenticated("D1");
    h.router.handle_completion(Completion::HeadsetHistory(Ok(vec![headset(
        "H1",
        HeadsetStatus::Paired,
    )])));
    h.router.headset_secondary_action(&HeadsetId::new("H1")).unwrap();
    h.router.handle_completion(Completion::Headset {
        operation: HeadsetOperation::Unpair,
        id: HeadsetId::new("H1"),
        result: Err(HeadsetFailure::new(1, "classic")),
    });
    assert!(h.router.headsets().is_empty());
}

#[test]
fn test_unknown_headset_reports_error() {
    let mut h = authenticated("D1");
    assert_eq!(
        h.router.headset_action(&HeadsetId::new("ghost")),
        Err(HeadsetError::UnknownHeadset(HeadsetId::new("ghost")))
    );
    assert_eq!(
        h.listener.take(),
        vec![Observed::HeadsetError(HeadsetError::UnknownHeadset(
            HeadsetId::new("ghost")
        ))]
    );
}

#[test]
fn test_scanned_headsets_are_returned() {
    let mut h = authenticated("D1");
    h.router.scan_for_new_headsets();
    assert_eq!(h.router.drain_commands(), vec![Command::RetrieveAllHeadsets]);
    let found = h
        .router
        .on_headsets_scanned(Ok(vec![headset("H3", HeadsetStatus::Unpaired)]));
    assert_eq!(found.len(), 1);
    assert_eq!(h.router.headsets(), &found[..]);
    assert!(h
        .router
        .on_headsets_scanned(Err(HeadsetFailure::new(2, "classic")))
        .is_empty());
}

#[test]
fn test_rename_connected_device() {
    let mut h = authenticated("D1");
    h.router.select_device(&DeviceId::new("D1"));
    assert_eq!(
        h.router.drain_commands(),
        vec![Command::RequestRename {
            device: DeviceId::new("D1"),
            current_name: "Speaker D1".into(),
        }]
    );
    h.router.handle_completion(Completion::Renamed {
        device: DeviceId::new("D1"),
        name: "Kitchen".into(),
    });
    assert_eq!(h.router.connected_device().unwrap().name, "Kitchen");

    h.router.select_device(&DeviceId::new("D2"));
    assert!(h.router.drain_commands().is_empty());
}

#[test]
fn test_persist_failure_does_not_block_authentication() {
    let mut store = MockRememberedStore::new();
    store.expect_load().returning(|| None);
    store
        .expect_save()
        .returning(|_| Err(anyhow::anyhow!("disk full")));
    let mut router = EventRouter::new(config(true), Arc::new(store));
    router.start(idle_snapshot());
    router.on_scan_event(ScanEvent::Found(device("D1")));
    router.connect_to(&DeviceId::new("D1")).unwrap();
    router.handle_completion(Completion::CredentialsSent {
        result: Ok(Compatibility::Compatible),
        link: LinkState::Linked,
    });
    assert_eq!(
        router.state(),
        &SessionState::Authenticated(Compatibility::Compatible)
    );
}

#[test]
fn test_authentication_persists_connected_device() {
    let mut store = MockRememberedStore::new();
    store.expect_load().returning(|| None);
    store
        .expect_save()
        .withf(|device| device.is_none())
        .returning(|_| Ok(()));
    store
        .expect_save()
        .withf(|device| device.as_ref() == Some(&DeviceId::new("D1")))
        .times(1)
        .returning(|_| Ok(()));
    let mut router = EventRouter::new(config(true), Arc::new(store));
    router.start(idle_snapshot());
    router.on_scan_event(ScanEvent::Found(device("D1")));
    router.connect_to(&DeviceId::new("D1")).unwrap();
    router.handle_completion(Completion::CredentialsSent {
        result: Ok(Compatibility::Compatible),
        link: LinkState::Linked,
    });
}
