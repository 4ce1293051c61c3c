use companion_session::domain::models::{
    CandidateDevice, Headset, HeadsetId, HeadsetStatus, UserRecord,
};
use companion_session::domain::ports::{SessionListener, StatusListener};
use companion_session::domain::settings::{SessionConfig, SettingsService};
use companion_session::domain::state_machine::SessionState;
use companion_session::infrastructure::logging::init_logger;
use companion_session::infrastructure::persistence::SettingsDeviceStore;
use companion_session::infrastructure::session::{
    Collaborators, SessionHandle, SessionService, TracingListener,
};
use companion_session::infrastructure::simulator::{SimulatedCompanion, SimulatedHeadsets};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info};

fn demo_user() -> UserRecord {
    let account_id =
        std::env::var("COMPANION_SESSION_USER").unwrap_or_else(|_| "demo-account".to_string());
    UserRecord {
        display_name: account_id.clone(),
        account_id,
        token: "demo-token".to_string(),
    }
}

async fn wait_for(
    handle: &SessionHandle,
    wanted: impl Fn(&SessionState) -> bool,
) -> anyhow::Result<SessionState> {
    for _ in 0..50 {
        let state = handle.state().await?;
        if wanted(&state) {
            return Ok(state);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    Err(anyhow::anyhow!("Timed out waiting for session state"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings_service = SettingsService::new()?;
    let _log_guard = init_logger(&settings_service.get().log_settings)
        .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
        .ok();

    info!("Starting companion session demo");

    let config = SessionConfig::from_settings(settings_service.get(), Some(demo_user()));
    let settings = Arc::new(Mutex::new(settings_service));
    let store = Arc::new(SettingsDeviceStore::new(settings.clone()));

    let companion = Arc::new(SimulatedCompanion::default());
    let headsets = Arc::new(SimulatedHeadsets::new(
        vec![Headset::new("H1", "Studio Buds", HeadsetStatus::Paired)],
        vec![Headset::new("H2", "Travel Cans", HeadsetStatus::Unpaired)],
    ));
    let collaborators = Collaborators {
        scanner: companion.clone(),
        connection: companion.clone(),
        credentials: companion.clone(),
        headsets: headsets.clone(),
        rename: None,
    };

    let listener: Arc<dyn SessionListener> = Arc::new(TracingListener);
    let status_listener: Arc<dyn StatusListener> = Arc::new(TracingListener);
    let (handle, task) = SessionService::spawn(
        config,
        store,
        collaborators,
        Some(listener),
        Some(status_listener),
    );
    handle.start()?;

    let speaker = CandidateDevice::new("A4:C1:38:00:00:01", "Living Room Speaker");
    companion.advertise(CandidateDevice::new("A4:C1:38:00:00:02", "Bedroom Speaker"));
    companion.advertise(speaker.clone());

    let state = wait_for(&handle, |s| {
        matches!(s, SessionState::DeviceFound | SessionState::Authenticated(_))
    })
    .await?;
    if state == SessionState::DeviceFound {
        handle.connect_to(speaker.id.clone()).await?;
    }

    wait_for(&handle, |s| matches!(s, SessionState::Authenticated(_))).await?;
    // history retrieval follows authentication
    tokio::time::sleep(Duration::from_millis(50)).await;
    for headset in handle.headsets().await? {
        info!("Known headset: {} ({:?})", headset.name, headset.status);
    }

    if let Err(e) = handle.headset_action(HeadsetId::new("H1")).await? {
        error!("Headset action rejected: {}", e);
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    let nearby = handle.scan_for_new_headsets().await?;
    info!("Headset scan found {} headsets", nearby.len());

    info!("Final state: {:?}", handle.state().await?);
    handle.shutdown().await?;
    task.await?;
    Ok(())
}
