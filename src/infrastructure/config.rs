use crate::application::dispatch_policy::{DispatchPolicy, RetryConfig};
use crate::application::sensor_poller::DEFAULT_POLL_INTERVAL;
use crate::application::sync_dispatcher::SyncPolicies;
use crate::domain::configuration::DraftMargins;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_FILE: &str = "config/incubator";
pub const ENV_PREFIX: &str = "INCUBATOR";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub controller: ControllerEndpointSettings,
    pub profile_store: ProfileStoreSettings,
    #[serde(default)]
    pub local_state: LocalStateSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub draft: DraftMargins,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ControllerEndpointSettings {
    #[serde(default = "default_controller_url")]
    pub base_url: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ControllerEndpointSettings {
    fn default() -> Self {
        Self {
            base_url: default_controller_url(),
            timeout_secs: None,
        }
    }
}

fn default_controller_url() -> String {
    "http://localhost:3000/api".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProfileStoreSettings {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_profile_table")]
    pub table: String,
    #[serde(default = "default_sensor_table")]
    pub sensor_table: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ProfileStoreSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            table: default_profile_table(),
            sensor_table: default_sensor_table(),
            timeout_secs: None,
        }
    }
}

fn default_profile_table() -> String {
    "egg_info".to_string()
}

fn default_sensor_table() -> String {
    "sensor_data".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocalStateSettings {
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

impl Default for LocalStateSettings {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

fn default_state_path() -> PathBuf {
    PathBuf::from("data/local-state.json")
}

/// Retry policy per outbound call site
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SyncSettings {
    #[serde(default)]
    pub mode: RetryConfig,
    #[serde(default)]
    pub egg_type: RetryConfig,
    #[serde(default)]
    pub settings: RetryConfig,
}

impl SyncSettings {
    pub fn policies(&self) -> SyncPolicies {
        SyncPolicies {
            mode: DispatchPolicy::from(&self.mode),
            egg_type: DispatchPolicy::from(&self.egg_type),
        }
    }

    pub fn settings_policy(&self) -> DispatchPolicy {
        DispatchPolicy::from(&self.settings)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingSettings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

impl ControllerEndpointSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl ProfileStoreSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl PollingSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Load `config/incubator.*`, overridden by `INCUBATOR__SECTION__KEY`
/// environment variables
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(CONFIG_FILE).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
