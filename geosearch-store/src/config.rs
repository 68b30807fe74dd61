//! Datastore connection configuration.

use serde::{Deserialize, Serialize};

/// Default connection pool size for pooled implementations.
pub const DEFAULT_POOL_SIZE: usize = 4;

/// Connection settings handed to a [`crate::Connector`] at plugin init.
///
/// Credentials may be given literally or as `env:NAME`, in which case
/// the value is read from the environment at connect time — config files
/// then never carry secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Datastore URL (scheme and shape are the connector's business).
    pub url: String,

    /// User name, literal or `env:NAME`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Password, literal or `env:NAME`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Connection pool size for implementations that pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_pool_size() -> usize {
    DEFAULT_POOL_SIZE
}

impl StoreConfig {
    /// Create a config for the given URL with default pooling.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user: None,
            password: None,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }

    /// Set the user name.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the pool size.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// The user name with `env:NAME` indirection resolved.
    pub fn resolved_user(&self) -> Option<String> {
        self.user.as_deref().and_then(resolve_value)
    }

    /// The password with `env:NAME` indirection resolved.
    pub fn resolved_password(&self) -> Option<String> {
        self.password.as_deref().and_then(resolve_value)
    }
}

fn resolve_value(value: &str) -> Option<String> {
    match value.strip_prefix("env:") {
        Some(name) => std::env::var(name).ok(),
        None => Some(value.to_string()),
    }
}
