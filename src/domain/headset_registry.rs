//! Secondary peripheral (headset) registry.
//!
//! At most one headset is `Connected`, and at most one connect or pair is in flight
//! across the whole set.

use crate::domain::errors::{HeadsetError, HeadsetFailure};
use crate::domain::models::{Headset, HeadsetId, HeadsetOperation, HeadsetStatus};

/// Result of applying a headset operation completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadsetUpdate {
    pub changed: Vec<Headset>,
    pub removed: Option<Headset>,
    pub error: Option<HeadsetError>,
}

#[derive(Debug, Default)]
pub struct HeadsetRegistry {
    headsets: Vec<Headset>,
    connected: Option<HeadsetId>,
}

impl HeadsetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headsets(&self) -> &[Headset] {
        &self.headsets
    }

    pub fn connected(&self) -> Option<&Headset> {
        let id = self.connected.as_ref()?;
        self.get(id)
    }

    pub fn get(&self, id: &HeadsetId) -> Option<&Headset> {
        self.headsets.iter().find(|h| &h.id == id)
    }

    /// The headset currently pairing or connecting, if any
    pub fn in_flight(&self) -> Option<&Headset> {
        self.headsets.iter().find(|h| h.status.is_in_flight())
    }

    /// Replace the known set. A single entry reporting `Connected` becomes the tracked one.
    pub fn replace_all(&mut self, headsets: Vec<Headset>) {
        let mut connected = headsets
            .iter()
            .filter(|h| h.status == HeadsetStatus::Connected);
        self.connected = match (connected.next(), connected.next()) {
            (Some(only), None) => Some(only.id.clone()),
            _ => None,
        };
        self.headsets = headsets;
    }

    pub fn clear(&mut self) {
        self.headsets.clear();
        self.connected = None;
    }

    pub fn begin_pair(&mut self, id: &HeadsetId) -> Result<Headset, HeadsetError> {
        self.begin(id, HeadsetStatus::Pairing, |status| {
            matches!(status, HeadsetStatus::Unpaired | HeadsetStatus::Paired)
        })
    }

    pub fn begin_connect(&mut self, id: &HeadsetId) -> Result<Headset, HeadsetError> {
        self.begin(id, HeadsetStatus::Connecting, |status| {
            status == HeadsetStatus::Paired
        })
    }

    /// Disconnect shows the transient `Connecting` flag until it completes
    pub fn begin_disconnect(&mut self, id: &HeadsetId) -> Result<Headset, HeadsetError> {
        let headset = self.get_mut(id)?;
        if headset.status != HeadsetStatus::Connected {
            return Err(HeadsetError::InvalidStatus {
                id: id.clone(),
                status: headset.status,
            });
        }
        headset.status = HeadsetStatus::Connecting;
        Ok(headset.clone())
    }

    /// Unpair is requested regardless of the current status
    pub fn begin_unpair(&self, id: &HeadsetId) -> Result<Headset, HeadsetError> {
        self.get(id)
            .cloned()
            .ok_or_else(|| HeadsetError::UnknownHeadset(id.clone()))
    }

    pub fn complete(
        &mut self,
        operation: HeadsetOperation,
        id: &HeadsetId,
        result: Result<(), HeadsetFailure>,
    ) -> HeadsetUpdate {
        if self.get(id).is_none() {
            return HeadsetUpdate::default();
        }

        match (operation, result) {
            (HeadsetOperation::Pair | HeadsetOperation::Connect, Ok(())) => HeadsetUpdate {
                changed: self.mark_connected(id),
                ..Default::default()
            },
            (HeadsetOperation::Pair, Err(cause)) => HeadsetUpdate {
                changed: self.set_status(id, HeadsetStatus::Unpaired),
                error: Some(HeadsetError::ConnectionFailed(cause)),
                ..Default::default()
            },
            (HeadsetOperation::Connect, Err(cause)) => HeadsetUpdate {
                changed: self.set_status(id, HeadsetStatus::Paired),
                error: Some(HeadsetError::ConnectionFailed(cause)),
                ..Default::default()
            },
            (HeadsetOperation::Disconnect, Ok(())) => {
                if self.connected.as_ref() == Some(id) {
                    self.connected = None;
                }
                HeadsetUpdate {
                    changed: self.set_status(id, HeadsetStatus::Paired),
                    ..Default::default()
                }
            }
            (HeadsetOperation::Disconnect, Err(cause)) => HeadsetUpdate {
                changed: self.set_status(id, HeadsetStatus::Connected),
                error: Some(HeadsetError::DisconnectFailed(cause)),
                ..Default::default()
            },
            // Unpair removes the record whatever the collaborator reported
            (HeadsetOperation::Unpair, _) => {
                if self.connected.as_ref() == Some(id) {
                    self.connected = None;
                }
                let index = self.headsets.iter().position(|h| &h.id == id);
                HeadsetUpdate {
                    removed: index.map(|i| self.headsets.remove(i)),
                    ..Default::default()
                }
            }
        }
    }

    fn begin(
        &mut self,
        id: &HeadsetId,
        next: HeadsetStatus,
        allowed: impl Fn(HeadsetStatus) -> bool,
    ) -> Result<Headset, HeadsetError> {
        if self.get(id).is_none() {
            return Err(HeadsetError::UnknownHeadset(id.clone()));
        }
        if self.in_flight().is_some() {
            return Err(HeadsetError::OperationInProgress);
        }
        let headset = self.get_mut(id)?;
        if !allowed(headset.status) {
            return Err(HeadsetError::InvalidStatus {
                id: id.clone(),
                status: headset.status,
            });
        }
        headset.status = next;
        Ok(headset.clone())
    }

    fn get_mut(&mut self, id: &HeadsetId) -> Result<&mut Headset, HeadsetError> {
        self.headsets
            .iter_mut()
            .find(|h| &h.id == id)
            .ok_or_else(|| HeadsetError::UnknownHeadset(id.clone()))
    }

    fn set_status(&mut self, id: &HeadsetId, status: HeadsetStatus) -> Vec<Headset> {
        match self.get_mut(id) {
            Ok(headset) => {
                headset.status = status;
                vec![headset.clone()]
            }
            Err(_) => Vec::new(),
        }
    }

    fn mark_connected(&mut self, id: &HeadsetId) -> Vec<Headset> {
        let mut changed = Vec::new();
        for headset in self.headsets.iter_mut() {
            if &headset.id == id {
                headset.status = HeadsetStatus::Connected;
                changed.push(headset.clone());
            } else if headset.status == HeadsetStatus::Connected {
                headset.status = HeadsetStatus::Paired;
                changed.push(headset.clone());
            }
        }
        self.connected = Some(id.clone());
        changed
    }
}
