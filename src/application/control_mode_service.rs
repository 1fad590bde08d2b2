// Control mode service - manual/automatic flag persisted across restarts
use crate::application::error::IncubatorError;
use crate::application::local_state::{CONTROL_MODE_KEY, LocalStateStore, Persisted};
use crate::domain::control_mode::ControlMode;
use std::sync::Arc;
use tokio::sync::watch;

pub struct ControlModeService {
    mode_tx: watch::Sender<ControlMode>,
    local: Arc<dyn LocalStateStore>,
}

impl ControlModeService {
    /// Starts from the cached literal, or `automatic` when absent or invalid
    pub fn new(local: Arc<dyn LocalStateStore>) -> Self {
        let initial = match local.load(CONTROL_MODE_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring cached control mode: {}", e);
                ControlMode::default()
            }),
            Ok(None) => ControlMode::default(),
            Err(e) => {
                tracing::warn!("Failed to load control mode from local state: {}", e);
                ControlMode::default()
            }
        };
        tracing::info!("Control mode initialised to {}", initial);

        let (mode_tx, _) = watch::channel(initial);
        Self { mode_tx, local }
    }

    pub fn get_mode(&self) -> ControlMode {
        *self.mode_tx.borrow()
    }

    /// Applies the mode in memory first; a persistence failure only yields a
    /// warning
    pub fn set_mode(&self, mode: ControlMode) -> Persisted<ControlMode> {
        let changed = self.mode_tx.send_if_modified(|current| {
            if *current == mode {
                false
            } else {
                *current = mode;
                true
            }
        });
        if changed {
            tracing::info!("Control mode changed to {}", mode);
        }

        let warning = self
            .local
            .store(CONTROL_MODE_KEY, mode.as_str())
            .err()
            .map(|e| {
                let err = IncubatorError::local_persistence(CONTROL_MODE_KEY, e);
                tracing::warn!("{}", err);
                err.to_string()
            });

        Persisted {
            value: mode,
            warning,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ControlMode> {
        self.mode_tx.subscribe()
    }
}
