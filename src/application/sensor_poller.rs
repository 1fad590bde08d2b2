// Sensor poller - cancellable periodic refresh of the latest reading
use crate::application::profile_store::SensorSource;
use crate::domain::telemetry::SensorReading;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

struct PollTask {
    handle: JoinHandle<()>,
    interval: Duration,
}

/// Polls sequentially inside one task, so at most one read is in flight.
/// Rescheduling aborts the previous task before spawning the next; dropping
/// the poller cancels it.
pub struct SensorPoller {
    source: Arc<dyn SensorSource>,
    latest: Arc<RwLock<Option<SensorReading>>>,
    task: Mutex<Option<PollTask>>,
}

impl SensorPoller {
    pub fn new(source: Arc<dyn SensorSource>) -> Self {
        Self {
            source,
            latest: Arc::new(RwLock::new(None)),
            task: Mutex::new(None),
        }
    }

    /// Must be called from within a tokio runtime
    pub fn start(&self, interval: Duration) {
        let mut task = self.task.lock();
        if let Some(previous) = task.take() {
            previous.handle.abort();
        }

        tracing::info!("Polling sensor readings every {:?}", interval);
        let handle = tokio::spawn(poll_loop(self.source.clone(), self.latest.clone(), interval));
        *task = Some(PollTask { handle, interval });
    }

    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.handle.abort();
            tracing::info!("Stopped sensor polling");
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.task.lock().as_ref().map(|t| t.interval)
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    pub fn latest(&self) -> Option<SensorReading> {
        self.latest.read().clone()
    }
}

impl Drop for SensorPoller {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.handle.abort();
        }
    }
}

async fn poll_loop(
    source: Arc<dyn SensorSource>,
    latest: Arc<RwLock<Option<SensorReading>>>,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match source.latest_reading().await {
            Ok(Some(reading)) => {
                tracing::debug!(
                    "Latest reading: {:.1}°C, {:.0}%",
                    reading.temperature, reading.humidity
                );
                *latest.write() = Some(reading);
            }
            Ok(None) => tracing::debug!("No sensor readings available yet"),
            Err(e) => tracing::warn!("Failed to fetch sensor reading: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::SlowSensorSource;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_polling_replaces_latest_reading() {
        let source = Arc::new(SlowSensorSource::new(Duration::from_millis(1)));
        let poller = SensorPoller::new(source.clone());
        assert!(poller.latest().is_none());

        poller.start(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(source.reads.load(Ordering::SeqCst) >= 2);
        assert!(poller.latest().unwrap().temperature > 37.0);
        assert_eq!(poller.interval(), Some(Duration::from_millis(10)));
    }

    #[tokio::test]
    async fn test_slow_reads_never_overlap() {
        let source = Arc::new(SlowSensorSource::new(Duration::from_millis(30)));
        let poller = SensorPoller::new(source.clone());

        poller.start(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(20)).await;
        poller.start(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_cancels_polling() {
        let source = Arc::new(SlowSensorSource::new(Duration::from_millis(1)));
        let poller = SensorPoller::new(source.clone());

        poller.start(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(40)).await;
        poller.stop();
        assert!(!poller.is_running());
        tokio::time::sleep(Duration::from_millis(20)).await;

        let reads = source.reads.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.reads.load(Ordering::SeqCst), reads);
    }

    #[tokio::test]
    async fn test_failed_read_keeps_previous_reading() {
        let source = Arc::new(SlowSensorSource::new(Duration::from_millis(1)));
        let poller = SensorPoller::new(source.clone());

        poller.start(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(40)).await;
        source.fail.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let before = poller.latest();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(before.is_some());
        assert_eq!(poller.latest(), before);
    }
}
