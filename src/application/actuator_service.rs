// Actuator service - manual actuator switches and automatic subsystem flags
use crate::application::control_mode_service::ControlModeService;
use crate::application::error::{IncubatorError, Result};
use crate::application::local_state::{
    AUTO_SETTINGS_KEY, LocalStateStore, MANUAL_STATES_KEY, Persisted, load_json, persist,
};
use crate::domain::actuators::{Actuator, ActuatorStateSet, AutoControlSet, AutoSubsystem};
use parking_lot::RwLock;
use std::sync::Arc;

pub struct ActuatorService {
    mode: Arc<ControlModeService>,
    local: Arc<dyn LocalStateStore>,
    states: RwLock<ActuatorStateSet>,
    auto_controls: RwLock<AutoControlSet>,
}

impl ActuatorService {
    pub fn new(mode: Arc<ControlModeService>, local: Arc<dyn LocalStateStore>) -> Self {
        let states = load_json(local.as_ref(), MANUAL_STATES_KEY).unwrap_or_default();
        let auto_controls = load_json(local.as_ref(), AUTO_SETTINGS_KEY).unwrap_or_default();
        Self {
            mode,
            local,
            states: RwLock::new(states),
            auto_controls: RwLock::new(auto_controls),
        }
    }

    pub fn states(&self) -> ActuatorStateSet {
        *self.states.read()
    }

    pub fn auto_controls(&self) -> AutoControlSet {
        *self.auto_controls.read()
    }

    /// Refused while the incubator is in automatic mode
    pub fn toggle(&self, actuator: Actuator, on: bool) -> Result<Persisted<ActuatorStateSet>> {
        if !self.mode.get_mode().allows_actuator_writes() {
            tracing::warn!("Rejected {:?} toggle in automatic mode", actuator);
            return Err(IncubatorError::ActuatorLocked(actuator));
        }

        let states = {
            let mut states = self.states.write();
            states.set(actuator, on);
            *states
        };
        tracing::info!("Manual control: {:?} {}", actuator, if on { "ON" } else { "OFF" });

        Ok(persist(self.local.as_ref(), MANUAL_STATES_KEY, states))
    }

    /// Emergency stop. Bypasses the mode gate since it only ever clears.
    pub fn stop_all(&self) -> Persisted<ActuatorStateSet> {
        let states = {
            let mut states = self.states.write();
            *states = ActuatorStateSet::all_off();
            *states
        };
        tracing::warn!("All actuators stopped");

        persist(self.local.as_ref(), MANUAL_STATES_KEY, states)
    }

    pub fn set_auto_control(
        &self,
        subsystem: AutoSubsystem,
        enabled: bool,
    ) -> Result<Persisted<AutoControlSet>> {
        self.update_auto_controls(Some(subsystem), |controls| controls.set(subsystem, enabled))
    }

    pub fn enable_all_auto_controls(&self) -> Result<Persisted<AutoControlSet>> {
        self.update_auto_controls(None, |controls| {
            *controls = AutoControlSet::all_enabled()
        })
    }

    fn update_auto_controls(
        &self,
        subsystem: Option<AutoSubsystem>,
        f: impl FnOnce(&mut AutoControlSet),
    ) -> Result<Persisted<AutoControlSet>> {
        if self.mode.get_mode().allows_actuator_writes() {
            return Err(IncubatorError::AutoControlLocked(subsystem));
        }

        let controls = {
            let mut controls = self.auto_controls.write();
            f(&mut controls);
            *controls
        };

        Ok(persist(self.local.as_ref(), AUTO_SETTINGS_KEY, controls))
    }
}
