// Hideout services
// Address resolution, proxy fetching, settings, configuration and persistence.

pub mod config_loader;
pub mod persistence;
pub mod proxy_client;
pub mod remote_sync;
pub mod settings_engine;
pub mod url_resolver;
