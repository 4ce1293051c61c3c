pub mod conflict;
pub mod device_registry;
pub mod errors;
pub mod headset_registry;
pub mod models;
pub mod ports;
pub mod settings;
pub mod state_machine;
