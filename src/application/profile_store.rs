// Repository traits for the remote profile store and sensor table
use crate::application::error::StoreError;
use crate::domain::egg_type::ProfileRow;
use crate::domain::telemetry::SensorReading;
use async_trait::async_trait;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Read every egg type row
    async fn select_all(&self) -> StoreResult<Vec<ProfileRow>>;

    /// Insert rows in a single batch (used to seed an empty table)
    async fn insert_batch(&self, rows: &[ProfileRow]) -> StoreResult<()>;

    /// Update the row whose `egg_type` equals `row.egg_type`
    async fn update_by_key(&self, row: &ProfileRow) -> StoreResult<()>;
}

#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Most recent reading, if the table has any
    async fn latest_reading(&self) -> anyhow::Result<Option<SensorReading>>;
}
