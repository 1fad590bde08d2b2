// Application layer - stateful services and the seams to outside systems
pub mod actuator_service;
pub mod configuration_reconciler;
pub mod connection_service;
pub mod control_mode_service;
pub mod controller_gateway;
pub mod dispatch_policy;
pub mod egg_type_service;
pub mod error;
pub mod local_state;
pub mod profile_store;
pub mod sensor_poller;
pub mod sync_dispatcher;

#[cfg(test)]
pub mod testing;
