// Key/value trait for device-local state that survives restarts
use crate::application::error::IncubatorError;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub const CONTROL_MODE_KEY: &str = "controlMode";
pub const MANUAL_STATES_KEY: &str = "manualStates";
pub const AUTO_SETTINGS_KEY: &str = "autoSettings";

/// Local cache only; the profile store stays the source of truth for profiles.
pub trait LocalStateStore: Send + Sync {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn store(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Decode a JSON value cached under `key`; unreadable entries yield None
pub fn load_json<T: DeserializeOwned>(store: &dyn LocalStateStore, key: &str) -> Option<T> {
    match store.load(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring unreadable local state '{}': {}", key, e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("Failed to load local state '{}': {}", key, e);
            None
        }
    }
}

pub fn store_json<T: Serialize>(
    store: &dyn LocalStateStore,
    key: &str,
    value: &T,
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(value)?;
    store.store(key, &raw)
}

/// Result of a state change whose local persistence is best-effort
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Persisted<T> {
    pub value: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Write `value` under `key`, turning a failure into a logged warning
pub fn persist<T: Serialize>(store: &dyn LocalStateStore, key: &str, value: T) -> Persisted<T> {
    let warning = store_json(store, key, &value).err().map(|e| {
        let err = IncubatorError::local_persistence(key, e);
        tracing::warn!("{}", err);
        err.to_string()
    });
    Persisted { value, warning }
}
