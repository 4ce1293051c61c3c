//! Session state machine.
//!
//! Holds the single authoritative session state. Transitions are a pure function of
//! (state, event); pairs without a row in the table leave the state untouched.

use crate::domain::errors::InteractorError;
use crate::domain::models::Compatibility;
use serde::{Deserialize, Serialize};

/// Session state, exactly one variant active at a time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    NoDeviceFound,
    NoBluetooth { was_enabled: bool },
    DeviceFound,
    PrepareToConnect { automatic: bool },
    ConnectingToDevice { automatic: bool },
    Authenticated(Compatibility),
    CloudAccountConflict,
    MusicAccountConflict,
    ConnectionError(String),
    InteractorError(InteractorError),
}

impl SessionState {
    fn idle(radio_enabled: bool) -> Self {
        if radio_enabled {
            SessionState::NoDeviceFound
        } else {
            SessionState::NoBluetooth { was_enabled: true }
        }
    }

    /// A candidate is being connected or authenticated
    pub fn is_connecting(&self) -> bool {
        matches!(
            self,
            SessionState::PrepareToConnect { .. } | SessionState::ConnectingToDevice { .. }
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            SessionState::CloudAccountConflict | SessionState::MusicAccountConflict
        )
    }
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    RadioEnabled,
    RadioDisabled,
    RadioUnsupported,
    DeviceDiscovered,
    CandidatesExhausted,
    MissingLoginData,
    ConnectRequested { automatic: bool },
    LinkEstablished,
    AuthSucceeded(Compatibility),
    RestoreAuthenticated(Compatibility),
    CloudAccountConflict,
    MusicAccountConflict,
    AuthFailed(String),
    ConflictAbandoned,
    LinkDropped { radio_enabled: bool },
    Reset { radio_enabled: bool },
    Cancel,
}

/// State-dependent setup, completed before observers hear about the new state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    /// Snapshot the connecting device as connected and clear its transient flags
    PromoteConnectedDevice,
    /// Drop candidates plus the connecting and connected device
    ClearDevices,
    /// Put the connecting device back among the candidates
    RestoreCandidates,
    ClearHeadsets,
    /// Persist the connected device identifier, or an absent one
    PersistRememberedDevice,
    RetrieveHeadsetHistory,
}

/// Work started after the state change has been announced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    ResumeDiscovery,
    DisconnectCandidate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: SessionState,
    pub to: SessionState,
    pub setup: Vec<SetupStep>,
    pub then: Vec<FollowUp>,
}

/// Transition table.
pub fn transition(
    state: &SessionState,
    event: &SessionEvent,
    handle_headsets: bool,
) -> Option<(SessionState, Vec<SetupStep>, Vec<FollowUp>)> {
    use SessionEvent as E;
    use SessionState as S;

    let reset = |to: SessionState, then: Vec<FollowUp>| {
        Some((
            to,
            vec![
                SetupStep::ClearDevices,
                SetupStep::ClearHeadsets,
                SetupStep::PersistRememberedDevice,
            ],
            then,
        ))
    };
    let authenticated = |compatibility: Compatibility| {
        let mut setup = vec![
            SetupStep::PromoteConnectedDevice,
            SetupStep::PersistRememberedDevice,
        ];
        if handle_headsets {
            setup.push(SetupStep::RetrieveHeadsetHistory);
        }
        Some((S::Authenticated(compatibility), setup, Vec::new()))
    };

    match (state, event) {
        (_, E::Cancel) => reset(S::NoDeviceFound, Vec::new()),
        (_, E::Reset { radio_enabled }) => reset(S::idle(*radio_enabled), Vec::new()),
        // an unsupported radio is final until an explicit reset or cancel
        (S::NoBluetooth { was_enabled: false }, E::RadioEnabled | E::RadioDisabled) => None,
        (_, E::RadioDisabled) => reset(S::NoBluetooth { was_enabled: true }, Vec::new()),
        (_, E::RadioUnsupported) => reset(S::NoBluetooth { was_enabled: false }, Vec::new()),

        (S::NoBluetooth { was_enabled: true } | S::NoDeviceFound | S::DeviceFound, E::RadioEnabled) => {
            reset(S::NoDeviceFound, vec![FollowUp::ResumeDiscovery])
        }

        (S::NoDeviceFound | S::DeviceFound, E::DeviceDiscovered) => {
            Some((S::DeviceFound, Vec::new(), Vec::new()))
        }
        (S::DeviceFound, E::CandidatesExhausted) => reset(S::NoDeviceFound, Vec::new()),

        (S::NoDeviceFound | S::DeviceFound, E::MissingLoginData) => Some((
            S::InteractorError(InteractorError::NoLoginData),
            Vec::new(),
            Vec::new(),
        )),
        (S::PrepareToConnect { .. } | S::ConnectingToDevice { .. }, E::MissingLoginData) => Some((
            S::InteractorError(InteractorError::NoLoginData),
            Vec::new(),
            vec![FollowUp::DisconnectCandidate],
        )),

        (
            S::NoDeviceFound | S::DeviceFound | S::InteractorError(_),
            E::ConnectRequested { automatic },
        ) => Some((
            S::PrepareToConnect {
                automatic: *automatic,
            },
            Vec::new(),
            Vec::new(),
        )),
        (S::PrepareToConnect { automatic }, E::LinkEstablished) => Some((
            S::ConnectingToDevice {
                automatic: *automatic,
            },
            Vec::new(),
            Vec::new(),
        )),

        (
            S::PrepareToConnect { .. }
            | S::ConnectingToDevice { .. }
            | S::CloudAccountConflict
            | S::MusicAccountConflict,
            E::AuthSucceeded(compatibility),
        ) => authenticated(*compatibility),
        (S::NoDeviceFound | S::NoBluetooth { .. }, E::RestoreAuthenticated(compatibility)) => {
            authenticated(*compatibility)
        }

        (S::PrepareToConnect { .. } | S::ConnectingToDevice { .. }, E::CloudAccountConflict) => {
            Some((S::CloudAccountConflict, Vec::new(), Vec::new()))
        }
        (
            S::PrepareToConnect { .. }
            | S::ConnectingToDevice { .. }
            | S::CloudAccountConflict
            | S::MusicAccountConflict,
            E::MusicAccountConflict,
        ) => Some((S::MusicAccountConflict, Vec::new(), Vec::new())),
        (
            S::PrepareToConnect { .. }
            | S::ConnectingToDevice { .. }
            | S::CloudAccountConflict
            | S::MusicAccountConflict,
            E::AuthFailed(reason),
        ) => Some((
            S::ConnectionError(reason.clone()),
            Vec::new(),
            vec![FollowUp::DisconnectCandidate],
        )),

        (S::CloudAccountConflict | S::MusicAccountConflict, E::ConflictAbandoned) => Some((
            S::NoDeviceFound,
            vec![SetupStep::RestoreCandidates],
            Vec::new(),
        )),

        (
            S::PrepareToConnect { .. }
            | S::ConnectingToDevice { .. }
            | S::Authenticated(_)
            | S::CloudAccountConflict
            | S::MusicAccountConflict
            | S::ConnectionError(_),
            E::LinkDropped { radio_enabled },
        ) => reset(S::idle(*radio_enabled), vec![FollowUp::ResumeDiscovery]),

        _ => None,
    }
}

/// Owner of the current session state
#[derive(Debug)]
pub struct SessionStateMachine {
    state: SessionState,
    handle_headsets: bool,
}

impl SessionStateMachine {
    pub fn new(handle_headsets: bool) -> Self {
        Self {
            state: SessionState::NoDeviceFound,
            handle_headsets,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether `event` has a row for the current state
    pub fn accepts(&self, event: &SessionEvent) -> bool {
        transition(&self.state, event, self.handle_headsets).is_some()
    }

    /// Apply an event. `None` means the pair is unhandled and nothing changed.
    pub fn apply(&mut self, event: SessionEvent) -> Option<Transition> {
        let (to, setup, then) = transition(&self.state, &event, self.handle_headsets)?;
        let from = std::mem::replace(&mut self.state, to.clone());
        Some(Transition {
            from,
            to,
            setup,
            then,
        })
    }
}
