//! Error taxonomy of the session coordinator.

use crate::domain::models::{DeviceId, HeadsetId, HeadsetStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejections of caller-issued session operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no user login data available")]
    MissingLoginData,
    #[error("a device connection is already in progress")]
    ConnectInProgress,
    #[error("no account conflict is pending")]
    NoConflictPending,
    #[error("session is not running")]
    NotRunning,
    #[error("unknown device: {0}")]
    UnknownDevice(DeviceId),
    #[error("session service has stopped")]
    ServiceStopped,
}

/// Interactor-level failure carried by `SessionState::InteractorError`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum InteractorError {
    #[error("no login data")]
    NoLoginData,
}

/// Outcome failures of a credential exchange
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("device is linked to a different cloud account")]
    CloudAccountConflict,
    #[error("device is linked to a different music account")]
    MusicAccountConflict,
    #[error("credential exchange failed: {0}")]
    Other(String),
}

/// Cause reported by the headset collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{domain} error {code}")]
pub struct HeadsetFailure {
    pub code: i64,
    pub domain: String,
}

impl HeadsetFailure {
    pub fn new(code: i64, domain: impl Into<String>) -> Self {
        Self {
            code,
            domain: domain.into(),
        }
    }
}

/// Errors surfaced through the headset-error notification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeadsetError {
    #[error("another headset operation is in progress")]
    OperationInProgress,
    #[error("headset connection failed: {0}")]
    ConnectionFailed(HeadsetFailure),
    #[error("headset disconnect failed: {0}")]
    DisconnectFailed(HeadsetFailure),
    #[error("unknown headset: {0}")]
    UnknownHeadset(HeadsetId),
    #[error("headset {id} cannot do that while {status:?}")]
    InvalidStatus { id: HeadsetId, status: HeadsetStatus },
}
