//! Maps credential-exchange outcomes onto session events, including the two-branch
//! account-conflict resolution flow.

use crate::domain::errors::{CredentialError, SessionError};
use crate::domain::models::{Compatibility, LinkState};
use crate::domain::state_machine::{SessionEvent, SessionState};

pub struct ConflictResolver;

impl ConflictResolver {
    /// Event for the first credential exchange after the link comes up.
    ///
    /// A success is only honoured while the link is still up; `None` means the result
    /// arrived after the link dropped and is discarded.
    pub fn authentication_event(
        result: Result<Compatibility, CredentialError>,
        link: LinkState,
    ) -> Option<SessionEvent> {
        match result {
            Ok(compatibility) if link == LinkState::Linked => {
                Some(SessionEvent::AuthSucceeded(compatibility))
            }
            Ok(_) => None,
            Err(CredentialError::CloudAccountConflict) => Some(SessionEvent::CloudAccountConflict),
            Err(CredentialError::MusicAccountConflict) => Some(SessionEvent::MusicAccountConflict),
            Err(CredentialError::Other(reason)) => Some(SessionEvent::AuthFailed(reason)),
        }
    }

    /// Event after re-submitting with the overwrite directive.
    ///
    /// Only a remaining music-account conflict stays resolvable; anything else is fatal
    /// to the attempt.
    pub fn rewrite_event(result: Result<Compatibility, CredentialError>) -> SessionEvent {
        match result {
            Ok(compatibility) => SessionEvent::AuthSucceeded(compatibility),
            Err(CredentialError::MusicAccountConflict) => SessionEvent::MusicAccountConflict,
            Err(other) => SessionEvent::AuthFailed(other.to_string()),
        }
    }

    /// Resolution may only be requested while a conflict is pending
    pub fn ensure_pending(state: &SessionState) -> Result<(), SessionError> {
        if state.is_conflict() {
            Ok(())
        } else {
            Err(SessionError::NoConflictPending)
        }
    }
}
