use std::sync::Arc;

use crate::fallback::kv::KeyValueStore;
use crate::models::Role;

/// Where the process is running. The relational engine can only be opened on
/// the native platform; on the web every primary operation fails fast so the
/// executor always takes the fallback path without a wasted round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Native,
    Web,
}

impl Platform {
    pub fn is_native(&self) -> bool {
        matches!(self, Platform::Native)
    }
}

/// The currently signed-in account, as provided by the app shell.
///
/// The storage layer never authenticates anyone; it only consumes the role
/// and username that the surrounding app has already established.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub username: String,
    pub role: Role,
    pub display_name: Option<String>,
}

impl SessionContext {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Profile name to use when the legacy data carries none.
    pub fn profile_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// Capability object selecting the backends, passed once at startup instead
/// of platform checks sprinkled through call sites. Tests substitute an
/// in-memory key-value store and whatever platform they want to exercise.
#[derive(Clone)]
pub struct StorageBackend {
    pub platform: Platform,
    pub database_url: String,
    pub key_value: Arc<dyn KeyValueStore>,
}

impl StorageBackend {
    pub fn new(
        platform: Platform,
        database_url: impl Into<String>,
        key_value: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            platform,
            database_url: database_url.into(),
            key_value,
        }
    }
}
