// Connection service - controller settings and connectivity status
use crate::application::controller_gateway::ControllerGateway;
use crate::application::dispatch_policy::DispatchPolicy;
use crate::application::error::{IncubatorError, Result};
use crate::application::sensor_poller::SensorPoller;
use crate::domain::settings::{ConnectionStatus, ControllerSettings};
use parking_lot::RwLock;
use std::sync::Arc;

pub struct ConnectionService {
    controller: Arc<dyn ControllerGateway>,
    policy: DispatchPolicy,
    settings: RwLock<ControllerSettings>,
    status: RwLock<ConnectionStatus>,
    poller: Arc<SensorPoller>,
}

impl ConnectionService {
    pub fn new(
        controller: Arc<dyn ControllerGateway>,
        policy: DispatchPolicy,
        settings: ControllerSettings,
        poller: Arc<SensorPoller>,
    ) -> Self {
        Self {
            controller,
            policy,
            settings: RwLock::new(settings),
            status: RwLock::new(ConnectionStatus::default()),
            poller,
        }
    }

    pub fn settings(&self) -> ControllerSettings {
        self.settings.read().clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.read()
    }

    /// Keeps the new settings even when the controller cannot be reached
    pub async fn save_settings(&self, settings: ControllerSettings) -> Result<ControllerSettings> {
        let previous = std::mem::replace(&mut *self.settings.write(), settings.clone());

        if previous.refresh_interval() != settings.refresh_interval() {
            match settings.refresh_interval() {
                Some(interval) => self.poller.start(interval),
                None => tracing::warn!(
                    "Ignoring invalid refresh rate '{}', polling unchanged",
                    settings.refresh_rate
                ),
            }
        }

        self.push_settings(&settings).await.map_err(|e| {
            tracing::warn!("Failed to send settings to controller: {:#}", e);
            IncubatorError::ControllerUnreachable(format!("{:#}", e))
        })?;

        tracing::info!("Controller settings saved");
        Ok(settings)
    }

    pub async fn test_connection(&self) -> Result<ConnectionStatus> {
        let settings = self.settings();
        let result: anyhow::Result<String> = async {
            self.push_settings(&settings).await?;
            self.controller.status().await
        }
        .await;

        match result {
            Ok(reported) => {
                let status = ConnectionStatus::from_reported(&reported);
                tracing::info!("Controller reports status '{}'", reported);
                *self.status.write() = status;
                Ok(status)
            }
            Err(e) => {
                tracing::warn!("Controller connection test failed: {:#}", e);
                *self.status.write() = ConnectionStatus::Disconnected;
                Err(IncubatorError::ControllerUnreachable(format!("{:#}", e)))
            }
        }
    }

    async fn push_settings(&self, settings: &ControllerSettings) -> anyhow::Result<()> {
        let controller = &self.controller;
        self.policy
            .run("settings push", move || controller.push_settings(settings))
            .await
    }
}
