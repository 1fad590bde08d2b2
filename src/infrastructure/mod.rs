// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod controller_client;
pub mod http_response;
pub mod local_state_file;
pub mod postgrest_store;
