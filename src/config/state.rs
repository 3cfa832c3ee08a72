// Application state module

use super::types::Config;

/// Shared application state.
///
/// Holds the configuration loaded at startup. Every handler reads only this
/// and its own request inputs; nothing here is mutable after construction.
pub struct AppState {
    pub config: Config,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }
}
