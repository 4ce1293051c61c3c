use crate::domain::errors::HeadsetError;
use crate::domain::models::{CandidateDevice, Headset, RadioIndicator};
use crate::domain::ports::{SessionListener, StatusListener};
use crate::domain::state_machine::SessionState;
use tracing::{info, warn};

/// Observer that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl SessionListener for TracingListener {
    fn state_changed(&self, state: &SessionState) {
        info!("[session] state: {:?}", state);
    }

    fn devices_changed(&self, devices: &[CandidateDevice], header_visible: bool) {
        let names: Vec<String> = devices
            .iter()
            .map(|d| format!("{} ({:?})", d.display_name(), d.status))
            .collect();
        info!(
            "[session] devices: [{}] header: {}",
            names.join(", "),
            header_visible
        );
    }

    fn headsets_changed(&self, headsets: &[Headset]) {
        let names: Vec<String> = headsets
            .iter()
            .map(|h| format!("{} ({:?})", h.name, h.status))
            .collect();
        info!("[session] headsets: [{}]", names.join(", "));
    }

    fn radio_changed(&self, radio: RadioIndicator) {
        info!("[session] radio: {:?}", radio);
    }

    fn headset_error(&self, error: &HeadsetError) {
        warn!("[session] headset error: {}", error);
    }
}

impl StatusListener for TracingListener {
    fn device_status_changed(&self, device: &CandidateDevice) {
        info!("[session] {} is now {:?}", device.id, device.status);
    }

    fn headset_status_changed(&self, headset: &Headset) {
        info!("[session] headset {} is now {:?}", headset.id, headset.status);
    }
}
