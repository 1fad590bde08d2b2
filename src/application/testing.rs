// In-memory fakes of the outbound seams, shared by the service tests
use crate::application::controller_gateway::{ControllerGateway, EggTypePayload};
use crate::application::error::StoreError;
use crate::application::local_state::LocalStateStore;
use crate::application::profile_store::{ProfileStore, SensorSource, StoreResult};
use crate::domain::control_mode::ControlMode;
use crate::domain::egg_type::ProfileRow;
use crate::domain::settings::ControllerSettings;
use crate::domain::telemetry::SensorReading;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Default)]
pub struct InMemoryProfileStore {
    pub rows: Mutex<Vec<ProfileRow>>,
    pub failure: Mutex<Option<StoreError>>,
    pub insert_failure: Mutex<Option<StoreError>>,
    pub updates: Mutex<Vec<ProfileRow>>,
    pub inserts: AtomicUsize,
}

impl InMemoryProfileStore {
    pub fn with_rows(rows: Vec<ProfileRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    pub fn failing(error: StoreError) -> Self {
        Self {
            failure: Mutex::new(Some(error)),
            ..Default::default()
        }
    }

    fn check(&self) -> StoreResult<()> {
        match self.failure.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn select_all(&self) -> StoreResult<Vec<ProfileRow>> {
        self.check()?;
        Ok(self.rows.lock().clone())
    }

    async fn insert_batch(&self, rows: &[ProfileRow]) -> StoreResult<()> {
        self.check()?;
        if let Some(err) = self.insert_failure.lock().clone() {
            return Err(err);
        }
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().extend_from_slice(rows);
        Ok(())
    }

    async fn update_by_key(&self, row: &ProfileRow) -> StoreResult<()> {
        self.check()?;
        self.updates.lock().push(row.clone());
        let mut rows = self.rows.lock();
        if let Some(existing) = rows.iter_mut().find(|r| r.egg_type == row.egg_type) {
            *existing = row.clone();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerCall {
    Settings(ControllerSettings),
    Status,
    Mode(ControlMode),
    EggType(String),
}

pub struct RecordingController {
    pub calls: Mutex<Vec<ControllerCall>>,
    pub unreachable: AtomicBool,
    pub reported_status: Mutex<String>,
    /// Fail this many calls before succeeding
    pub failures_before_success: AtomicUsize,
}

impl Default for RecordingController {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            unreachable: AtomicBool::new(false),
            reported_status: Mutex::new("Connected".to_string()),
            failures_before_success: AtomicUsize::new(0),
        }
    }
}

impl RecordingController {
    pub fn unreachable() -> Self {
        let controller = Self::default();
        controller.unreachable.store(true, Ordering::SeqCst);
        controller
    }

    pub fn calls(&self) -> Vec<ControllerCall> {
        self.calls.lock().clone()
    }

    pub fn last_mode(&self) -> Option<ControlMode> {
        self.calls.lock().iter().rev().find_map(|c| match c {
            ControllerCall::Mode(mode) => Some(*mode),
            _ => None,
        })
    }

    pub fn egg_type_pushes(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                ControllerCall::EggType(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ControllerCall) -> anyhow::Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        let pending = self.failures_before_success.load(Ordering::SeqCst);
        if pending > 0 {
            self.failures_before_success.store(pending - 1, Ordering::SeqCst);
            anyhow::bail!("controller returned status 503");
        }
        self.calls.lock().push(call);
        Ok(())
    }
}

#[async_trait]
impl ControllerGateway for RecordingController {
    async fn push_settings(&self, settings: &ControllerSettings) -> anyhow::Result<()> {
        self.record(ControllerCall::Settings(settings.clone()))
    }

    async fn status(&self) -> anyhow::Result<String> {
        self.record(ControllerCall::Status)?;
        Ok(self.reported_status.lock().clone())
    }

    async fn push_mode(&self, mode: ControlMode) -> anyhow::Result<()> {
        self.record(ControllerCall::Mode(mode))
    }

    async fn push_egg_type(&self, payload: &EggTypePayload) -> anyhow::Result<()> {
        self.record(ControllerCall::EggType(payload.id().to_string()))
    }
}

#[derive(Default)]
pub struct MemoryLocalState {
    pub values: Mutex<HashMap<String, String>>,
    pub read_only: AtomicBool,
}

impl MemoryLocalState {
    pub fn with(entries: &[(&str, &str)]) -> Self {
        let values = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            values: Mutex::new(values),
            ..Default::default()
        }
    }

    pub fn read_only() -> Self {
        let store = Self::default();
        store.read_only.store(true, Ordering::SeqCst);
        store
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }
}

impl LocalStateStore for MemoryLocalState {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.get(key))
    }

    fn store(&self, key: &str, value: &str) -> anyhow::Result<()> {
        if self.read_only.load(Ordering::SeqCst) {
            anyhow::bail!("storage quota exceeded");
        }
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Sensor source that counts reads and tracks how many overlap
#[derive(Default)]
pub struct SlowSensorSource {
    pub delay: Duration,
    pub reads: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub fail: AtomicBool,
}

impl SlowSensorSource {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }
}

#[async_trait]
impl SensorSource for SlowSensorSource {
    async fn latest_reading(&self) -> anyhow::Result<Option<SensorReading>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        // Released on drop so an aborted read is not counted as overlapping
        let _guard = InFlight(&self.in_flight);
        tokio::time::sleep(self.delay).await;

        let count = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("sensor table unavailable");
        }
        Ok(Some(SensorReading::new(37.0 + count as f64 * 0.1, 60.0, None)))
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
