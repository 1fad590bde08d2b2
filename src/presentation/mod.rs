// Presentation layer - local JSON API consumed by the dashboard GUI
pub mod app_state;
pub mod handlers;
