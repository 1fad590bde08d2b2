// Retry policy for outbound notifications, chosen per call site
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPolicy {
    /// Single attempt, failure reported to the caller
    #[default]
    Once,
    /// Up to `attempts` tries, doubling the delay after each failure
    Backoff { attempts: u32, initial_delay: Duration },
}

/// Configuration form of a policy: `kind = "none" | "backoff"`
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

fn default_kind() -> String {
    "none".to_string()
}

fn default_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            attempts: default_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

impl From<&RetryConfig> for DispatchPolicy {
    fn from(config: &RetryConfig) -> Self {
        match config.kind.as_str() {
            "backoff" => DispatchPolicy::Backoff {
                attempts: config.attempts.max(1),
                initial_delay: Duration::from_millis(config.initial_delay_ms),
            },
            "none" => DispatchPolicy::Once,
            other => {
                tracing::warn!("Unknown retry kind '{}', using single attempt", other);
                DispatchPolicy::Once
            }
        }
    }
}

impl DispatchPolicy {
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let (attempts, mut delay) = match *self {
            DispatchPolicy::Once => (1, Duration::ZERO),
            DispatchPolicy::Backoff {
                attempts,
                initial_delay,
            } => (attempts.max(1), initial_delay),
        };

        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    tracing::debug!(
                        "{} attempt {}/{} failed: {}, retrying in {:?}",
                        label, attempt, attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
