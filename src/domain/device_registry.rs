//! Primary device registry.
//!
//! Tracks discovered candidates plus the single connecting and connected device.
//! Observers always receive [`DeviceRegistry::visible`], so what they see cannot drift
//! from what the registry holds.

use crate::domain::errors::SessionError;
use crate::domain::models::{CandidateDevice, DeviceId, DeviceStatus};

/// What a discovery event did to the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    /// Matches the remembered device; kept out of the candidate list
    Remembered(CandidateDevice),
    Added(CandidateDevice),
    /// Already known; name refreshed in place
    Refreshed(CandidateDevice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LostOutcome {
    pub removed: bool,
    /// Candidate list is empty and nothing is connecting
    pub exhausted: bool,
}

#[derive(Debug, Default)]
pub struct DeviceRegistry {
    candidates: Vec<CandidateDevice>,
    connecting: Option<CandidateDevice>,
    connected: Option<CandidateDevice>,
    remembered: Option<DeviceId>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_remembered(&mut self, remembered: Option<DeviceId>) {
        self.remembered = remembered;
    }

    pub fn remembered(&self) -> Option<&DeviceId> {
        self.remembered.as_ref()
    }

    pub fn candidates(&self) -> &[CandidateDevice] {
        &self.candidates
    }

    pub fn connecting(&self) -> Option<&CandidateDevice> {
        self.connecting.as_ref()
    }

    pub fn connected(&self) -> Option<&CandidateDevice> {
        self.connected.as_ref()
    }

    pub fn find(&self, id: &DeviceId) -> Option<&CandidateDevice> {
        self.candidates.iter().find(|d| &d.id == id)
    }

    /// Rows shown to observers: the connected or connecting device alone, else all candidates
    pub fn visible(&self) -> Vec<CandidateDevice> {
        match (&self.connected, &self.connecting) {
            (Some(device), _) | (None, Some(device)) => vec![device.clone()],
            (None, None) => self.candidates.clone(),
        }
    }

    /// Header row is shown while a device is connecting or connected
    pub fn header_visible(&self) -> bool {
        self.connected.is_some() || self.connecting.is_some()
    }

    pub fn on_discovered(&mut self, mut device: CandidateDevice) -> Discovery {
        device.status = DeviceStatus::NotConnected;
        if self.remembered.as_ref() == Some(&device.id) {
            return Discovery::Remembered(device);
        }
        match self.candidates.iter_mut().find(|d| d.id == device.id) {
            Some(existing) => {
                existing.name = device.name;
                Discovery::Refreshed(existing.clone())
            }
            None => {
                self.candidates.push(device.clone());
                Discovery::Added(device)
            }
        }
    }

    pub fn on_lost(&mut self, id: &DeviceId) -> LostOutcome {
        let before = self.candidates.len();
        self.candidates.retain(|d| &d.id != id);
        LostOutcome {
            removed: self.candidates.len() != before,
            exhausted: self.candidates.is_empty() && self.connecting.is_none(),
        }
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
        self.connecting = None;
        self.connected = None;
    }

    /// Mark `device` as connecting. Only one device may be connecting at a time.
    pub fn begin_connecting(&mut self, mut device: CandidateDevice) -> Result<CandidateDevice, SessionError> {
        if self.connecting.is_some() {
            return Err(SessionError::ConnectInProgress);
        }
        device.status = DeviceStatus::Connecting;
        self.connecting = Some(device.clone());
        Ok(device)
    }

    /// Make `device` the connected device and clear any transient connecting state
    pub fn confirm_connected(&mut self, mut device: CandidateDevice) -> CandidateDevice {
        device.status = DeviceStatus::Connected;
        self.connecting = None;
        self.connected = Some(device.clone());
        device
    }

    /// Abandon the connecting device; it is returned as not connected
    pub fn cancel_connecting(&mut self) -> Option<CandidateDevice> {
        self.connecting.take().map(|mut device| {
            device.status = DeviceStatus::NotConnected;
            device
        })
    }

    pub fn rename_connected(&mut self, name: String) -> Option<CandidateDevice> {
        let device = self.connected.as_mut()?;
        device.name = name;
        Some(device.clone())
    }
}
