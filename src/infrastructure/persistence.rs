use crate::domain::models::DeviceId;
use crate::domain::ports::RememberedDeviceStore;
use crate::domain::settings::SettingsService;
use std::sync::{Arc, Mutex};

/// Remembered device kept in the settings file
pub struct SettingsDeviceStore {
    settings: Arc<Mutex<SettingsService>>,
}

impl SettingsDeviceStore {
    pub fn new(settings: Arc<Mutex<SettingsService>>) -> Self {
        Self { settings }
    }
}

impl RememberedDeviceStore for SettingsDeviceStore {
    fn load(&self) -> Option<DeviceId> {
        match self.settings.lock() {
            Ok(settings) => settings.get().last_device.clone(),
            Err(_) => {
                tracing::error!("Settings lock poisoned, no remembered device");
                None
            }
        }
    }

    fn save(&self, device: Option<DeviceId>) -> anyhow::Result<()> {
        let mut settings = self
            .settings
            .lock()
            .map_err(|_| anyhow::anyhow!("Settings lock poisoned"))?;
        settings.set_last_device(device)
    }
}

/// Process-local store, used by tests and the demo
#[derive(Default)]
pub struct InMemoryDeviceStore {
    device: Mutex<Option<DeviceId>>,
}

impl InMemoryDeviceStore {
    pub fn new(device: Option<DeviceId>) -> Self {
        Self {
            device: Mutex::new(device),
        }
    }

    pub fn current(&self) -> Option<DeviceId> {
        self.device.lock().ok().and_then(|d| d.clone())
    }
}

impl RememberedDeviceStore for InMemoryDeviceStore {
    fn load(&self) -> Option<DeviceId> {
        self.current()
    }

    fn save(&self, device: Option<DeviceId>) -> anyhow::Result<()> {
        let mut slot = self
            .device
            .lock()
            .map_err(|_| anyhow::anyhow!("Device store lock poisoned"))?;
        *slot = device;
        Ok(())
    }
}
