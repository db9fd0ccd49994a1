//! Application state

use std::sync::Arc;
use std::time::Duration;

use valstore_auth_core::AuthService;

use crate::config::Config;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Auth service for cookie login, session validation and storefront calls
    pub auth: Arc<AuthService>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(auth: AuthService, config: Config) -> Self {
        Self {
            auth: Arc::new(auth),
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> Duration {
        self.config.request_timeout
    }
}
