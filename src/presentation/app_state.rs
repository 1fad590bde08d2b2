// Application state for HTTP handlers
use crate::application::actuator_service::ActuatorService;
use crate::application::configuration_reconciler::ConfigurationReconciler;
use crate::application::connection_service::ConnectionService;
use crate::application::control_mode_service::ControlModeService;
use crate::application::controller_gateway::ControllerGateway;
use crate::application::egg_type_service::EggTypeService;
use crate::application::local_state::LocalStateStore;
use crate::application::profile_store::{ProfileStore, SensorSource};
use crate::application::sensor_poller::SensorPoller;
use crate::application::sync_dispatcher::SyncDispatcher;
use crate::domain::egg_type::EggTypeRegistry;
use crate::domain::settings::ControllerSettings;
use crate::infrastructure::config::AppConfig;
use std::sync::Arc;

/// Outbound collaborators the services are wired against
pub struct Adapters {
    pub store: Arc<dyn ProfileStore>,
    pub sensors: Arc<dyn SensorSource>,
    pub controller: Arc<dyn ControllerGateway>,
    pub local: Arc<dyn LocalStateStore>,
}

pub struct AppState {
    pub egg_types: Arc<EggTypeService>,
    pub mode: Arc<ControlModeService>,
    pub actuators: ActuatorService,
    pub reconciler: ConfigurationReconciler,
    pub dispatcher: Arc<SyncDispatcher>,
    pub poller: Arc<SensorPoller>,
    pub connection: ConnectionService,
}

impl AppState {
    /// Built-in defaults first, then the local cache (mode, actuators).
    /// The remote catalog is overlaid later by `ConfigurationReconciler::ensure_catalog`.
    pub fn new(config: &AppConfig, adapters: Adapters) -> Self {
        let egg_types = Arc::new(EggTypeService::new(EggTypeRegistry::default()));
        let mode = Arc::new(ControlModeService::new(adapters.local.clone()));
        let actuators = ActuatorService::new(mode.clone(), adapters.local);

        let dispatcher = Arc::new(SyncDispatcher::new(
            adapters.controller.clone(),
            config.sync.policies(),
        ));
        let reconciler = ConfigurationReconciler::new(
            egg_types.clone(),
            adapters.store,
            dispatcher.clone(),
            config.draft,
            config.profile_store.table.clone(),
        );

        let poller = Arc::new(SensorPoller::new(adapters.sensors));
        let settings = ControllerSettings {
            refresh_rate: config.polling.interval().as_secs().to_string(),
            ..ControllerSettings::default()
        };
        let connection = ConnectionService::new(
            adapters.controller,
            config.sync.settings_policy(),
            settings,
            poller.clone(),
        );

        Self {
            egg_types,
            mode,
            actuators,
            reconciler,
            dispatcher,
            poller,
            connection,
        }
    }
}
