pub mod config_store;
pub mod defaults;
pub mod http_api;
