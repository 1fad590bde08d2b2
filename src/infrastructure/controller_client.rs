// HTTP client for the local incubator controller process
use crate::application::controller_gateway::{ControllerGateway, EggTypePayload};
use crate::domain::control_mode::ControlMode;
use crate::domain::settings::ControllerSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ControllerClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

impl ControllerClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build controller client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<()> {
        let url = self.endpoint(path);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to controller at {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Controller {} failed with status {}: {}", path, status, body);
        }

        Ok(())
    }
}

#[async_trait]
impl ControllerGateway for ControllerClient {
    async fn push_settings(&self, settings: &ControllerSettings) -> Result<()> {
        self.post_json("settings", settings).await
    }

    async fn status(&self) -> Result<String> {
        let url = self.endpoint("status");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to controller at {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Controller status failed with status {}", response.status());
        }

        let body = response
            .json::<StatusResponse>()
            .await
            .context("Failed to parse controller status")?;
        Ok(body.status)
    }

    /// Body is the bare JSON string literal, e.g. `"manual"`
    async fn push_mode(&self, mode: ControlMode) -> Result<()> {
        self.post_json("controlMode", &mode).await
    }

    async fn push_egg_type(&self, payload: &EggTypePayload) -> Result<()> {
        self.post_json("EggType", payload).await
    }
}
