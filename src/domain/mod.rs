// Domain layer - incubation profiles, modes and configuration rules
pub mod actuators;
pub mod configuration;
pub mod control_mode;
pub mod egg_type;
pub mod settings;
pub mod telemetry;
