// Gateway trait for the local incubator controller process
use crate::domain::control_mode::ControlMode;
use crate::domain::egg_type::{EggTypeProfile, FALLBACK_EGG_TYPE_ID};
use crate::domain::settings::ControllerSettings;
use async_trait::async_trait;
use serde::Serialize;

/// Body of an egg type push: the full profile, or a bare id when no profile
/// could be resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EggTypePayload {
    Profile(EggTypeProfile),
    Id(String),
}

impl EggTypePayload {
    pub fn resolve(profile: Option<&EggTypeProfile>) -> Self {
        match profile {
            Some(profile) => EggTypePayload::Profile(profile.clone()),
            None => EggTypePayload::Id(FALLBACK_EGG_TYPE_ID.to_string()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            EggTypePayload::Profile(profile) => &profile.id,
            EggTypePayload::Id(id) => id,
        }
    }
}

#[async_trait]
pub trait ControllerGateway: Send + Sync {
    async fn push_settings(&self, settings: &ControllerSettings) -> anyhow::Result<()>;

    /// Raw status string reported by the controller
    async fn status(&self) -> anyhow::Result<String>;

    async fn push_mode(&self, mode: ControlMode) -> anyhow::Result<()>;

    async fn push_egg_type(&self, payload: &EggTypePayload) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::egg_type::default_profiles;

    #[test]
    fn test_payload_falls_back_to_chicken_literal() {
        let payload = EggTypePayload::resolve(None);
        assert_eq!(serde_json::to_string(&payload).unwrap(), "\"chicken\"");
    }

    #[test]
    fn test_payload_carries_profile_id() {
        let quail = default_profiles().into_iter().nth(1).unwrap();
        let payload = EggTypePayload::resolve(Some(&quail));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["id"], "quail");
        assert_eq!(payload.id(), "quail");
    }
}
