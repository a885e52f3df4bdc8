use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthSettings;
use crate::config::Config;
use crate::db::DbPool;
use crate::integrations::Integrations;

/// Settings handlers need that are not tied to an integration
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the public site, used in emails and checkout redirects
    pub public_base_url: String,
}

impl Settings {
    /// Absolute URL for a site path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.public_base_url.trim_end_matches('/'), path)
    }
}

/// Shared application state
///
/// Handlers extract only the part they need, e.g. `State<Arc<DbPool>>`.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub auth: AuthSettings,
    pub integrations: Arc<Integrations>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Builds the state from a connection pool and the loaded configuration
    pub fn new(pool: Arc<DbPool>, config: &Config) -> Self {
        Self {
            pool,
            auth: AuthSettings::new(config.identity_secret.as_deref()),
            integrations: Arc::new(Integrations::from_config(config)),
            settings: Arc::new(Settings {
                public_base_url: config.public_base_url.clone(),
            }),
        }
    }

    /// State with no integrations configured
    pub fn with_pool(pool: Arc<DbPool>, identity_secret: Option<&str>) -> Self {
        Self {
            pool,
            auth: AuthSettings::new(identity_secret),
            integrations: Arc::new(Integrations::default()),
            settings: Arc::new(Settings {
                public_base_url: "http://localhost:3000".to_string(),
            }),
        }
    }
}
