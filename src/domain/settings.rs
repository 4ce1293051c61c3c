use crate::domain::models::{AppInfo, CredentialContext, DeviceId, MusicAccount, UserRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_false")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_false(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_false(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "companion_session".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}
fn default_app_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}
fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub log_settings: LogSettings,

    /// Retrieve and manage headsets once a device is authenticated
    #[serde(default = "default_true")]
    pub handle_headsets: bool,

    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_version")]
    pub app_version: String,

    /// Remembered device used to bias auto-connect
    #[serde(default)]
    pub last_device: Option<DeviceId>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_settings: LogSettings::default(),
            handle_headsets: default_true(),
            app_name: default_app_name(),
            app_version: default_app_version(),
            last_device: None,
        }
    }
}

impl Settings {
    pub fn app_info(&self) -> AppInfo {
        AppInfo {
            name: self.app_name.clone(),
            version: self.app_version.clone(),
        }
    }
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Ok(Self::with_path(settings_path))
    }

    /// Load from an explicit file, falling back to defaults when missing or unreadable
    pub fn with_path(settings_path: PathBuf) -> Self {
        let settings = Self::load_from_file(&settings_path).unwrap_or_default();
        Self {
            settings,
            settings_path,
        }
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("CompanionSession");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn set_last_device(&mut self, device: Option<DeviceId>) -> anyhow::Result<()> {
        if self.settings.last_device != device {
            self.settings.last_device = device;
            self.save()?;
        }
        Ok(())
    }
}

/// Session-start configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub app_info: AppInfo,
    pub user: Option<UserRecord>,
    pub music_account: Option<MusicAccount>,
    pub handle_headsets: bool,
}

impl SessionConfig {
    pub fn from_settings(settings: &Settings, user: Option<UserRecord>) -> Self {
        Self {
            app_info: settings.app_info(),
            user,
            music_account: None,
            handle_headsets: settings.handle_headsets,
        }
    }

    pub fn with_music_account(mut self, account: MusicAccount) -> Self {
        self.music_account = Some(account);
        self
    }

    /// Credential context, or `None` when no usable user record is configured
    pub fn credentials(&self) -> Option<CredentialContext> {
        let user = self.user.as_ref()?;
        if user.account_id.trim().is_empty() {
            return None;
        }
        Some(CredentialContext {
            user: user.clone(),
            music: self.music_account.clone(),
        })
    }
}
