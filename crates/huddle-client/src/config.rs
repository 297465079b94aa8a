//! Client configuration loaded from environment variables.
//!
//! All settings have defaults so the client can start with zero
//! configuration.

use std::path::PathBuf;

use huddle_shared::types::{UserId, UserProfile};
use huddle_store::{Database, KeyStore, LocalKeyStore, MemoryStorage, StoreError};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// SQLite file holding identity and room keys.
    /// Env: `HUDDLE_DB_PATH`
    /// Default: `huddle.db` in the platform data directory.
    pub db_path: Option<PathBuf>,

    /// Keep keys in memory only; nothing is written to disk.
    /// Env: `HUDDLE_EPHEMERAL` (true/false)
    /// Default: `false`
    pub ephemeral: bool,

    /// Identifier of the local user.
    /// Env: `HUDDLE_USER_ID`
    /// Default: `1`
    pub user_id: UserId,

    /// Name attached to outgoing messages.
    /// Env: `HUDDLE_DISPLAY_NAME`
    /// Default: `"Me"`
    pub display_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            ephemeral: false,
            user_id: UserId(1),
            display_name: "Me".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("HUDDLE_DB_PATH") {
            if !path.trim().is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = lookup("HUDDLE_EPHEMERAL") {
            config.ephemeral = val == "true" || val == "1";
        }

        if let Some(val) = lookup("HUDDLE_USER_ID") {
            match val.trim().parse::<u64>() {
                Ok(id) => config.user_id = UserId(id),
                Err(e) => {
                    tracing::warn!(value = %val, error = %e, "Invalid HUDDLE_USER_ID, using default");
                }
            }
        }

        if let Some(name) = lookup("HUDDLE_DISPLAY_NAME") {
            let name = name.trim();
            if !name.is_empty() {
                config.display_name = name.to_string();
            }
        }

        config
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile::new(self.user_id, self.display_name.clone())
    }

    /// Open the key store this configuration points at.
    pub fn open_key_store(&self) -> Result<Box<dyn KeyStore>, StoreError> {
        if self.ephemeral {
            tracing::info!("using in-memory key store");
            return Ok(Box::new(LocalKeyStore::new(MemoryStorage::new())));
        }

        let db = match &self.db_path {
            Some(path) => Database::open_at(path)?,
            None => Database::new()?,
        };
        Ok(Box::new(LocalKeyStore::new(db)))
    }
}
