// PostgREST profile store and sensor table client
use crate::application::error::StoreError;
use crate::application::profile_store::{ProfileStore, SensorSource, StoreResult};
use crate::domain::egg_type::ProfileRow;
use crate::domain::telemetry::SensorReading;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Postgres `insufficient_privilege`, reported when row-level security
/// rejects a write
const INSUFFICIENT_PRIVILEGE: &str = "42501";

#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
    sensor_table: String,
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SensorRow {
    temperature: f64,
    humidity: f64,
    #[serde(default)]
    created_at: Option<String>,
}

impl PostgrestStore {
    pub fn new(
        base_url: &str,
        api_key: String,
        table: String,
        sensor_table: String,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build profile store client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            table,
            sensor_table,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn select_all_url(&self) -> String {
        format!("{}?select=*", self.table_url(&self.table))
    }

    fn update_url(&self, egg_type: &str) -> String {
        format!(
            "{}?egg_type=eq.{}",
            self.table_url(&self.table),
            urlencoding::encode(egg_type)
        )
    }

    fn latest_reading_url(&self) -> String {
        format!(
            "{}?select=temperature,humidity,created_at&order=created_at.desc&limit=1",
            self.table_url(&self.sensor_table)
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
    }

    async fn execute(&self, request: RequestBuilder, table: &str) -> StoreResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .context("Failed to send request to profile store")
            .map_err(|e| StoreError::Access(format!("{:#}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body, table))
    }
}

/// Map a failed PostgREST response onto the store error taxonomy
fn classify_failure(status: StatusCode, body: &str, table: &str) -> StoreError {
    let parsed = serde_json::from_str::<PostgrestError>(body).ok();
    let code = parsed.as_ref().and_then(|e| e.code.as_deref());
    let detail = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| body.to_string());

    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || code == Some(INSUFFICIENT_PRIVILEGE)
    {
        return StoreError::Permission {
            table: table.to_string(),
            detail,
        };
    }

    StoreError::Access(format!("status {}: {}", status, detail))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    // `timestamp without time zone` columns carry no offset
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[async_trait]
impl ProfileStore for PostgrestStore {
    async fn select_all(&self) -> StoreResult<Vec<ProfileRow>> {
        let url = self.select_all_url();
        tracing::debug!("Fetching egg types from {}", url);

        let response = self
            .execute(self.request(Method::GET, &url), &self.table)
            .await?;
        let rows = response
            .json::<Vec<ProfileRow>>()
            .await
            .context("Failed to parse egg type rows")
            .map_err(|e| StoreError::Access(format!("{:#}", e)))?;

        tracing::debug!("Fetched {} egg type rows", rows.len());
        Ok(rows)
    }

    async fn insert_batch(&self, rows: &[ProfileRow]) -> StoreResult<()> {
        let url = self.table_url(&self.table);
        let request = self
            .request(Method::POST, &url)
            .header("Prefer", "return=minimal")
            .json(rows);

        self.execute(request, &self.table).await?;
        tracing::info!("Inserted {} egg type rows", rows.len());
        Ok(())
    }

    async fn update_by_key(&self, row: &ProfileRow) -> StoreResult<()> {
        let url = self.update_url(&row.egg_type);
        let request = self
            .request(Method::PATCH, &url)
            .header("Prefer", "return=minimal")
            .json(row);

        self.execute(request, &self.table).await?;
        Ok(())
    }
}

#[async_trait]
impl SensorSource for PostgrestStore {
    async fn latest_reading(&self) -> anyhow::Result<Option<SensorReading>> {
        let url = self.latest_reading_url();
        let response = self
            .execute(self.request(Method::GET, &url), &self.sensor_table)
            .await?;

        let rows = response
            .json::<Vec<SensorRow>>()
            .await
            .context("Failed to parse sensor rows")?;

        Ok(rows.into_iter().next().map(|row| {
            let recorded_at = row.created_at.as_deref().and_then(parse_timestamp);
            SensorReading::new(row.temperature, row.humidity, recorded_at)
        }))
    }
}
