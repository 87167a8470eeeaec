//! Store configuration.

use serde::{Deserialize, Serialize};

use crate::error::{PrefsError, PrefsResult};

/// Name used when none is configured.
pub const DEFAULT_STORE_NAME: &str = "default";

/// Options for opening a [`crate::Preferences`] store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefsConfig {
    /// Name of the preference file or platform store.
    pub name: String,
    /// Encrypt key names as well as values.
    pub encrypt_keys: bool,
}

impl Default for PrefsConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_STORE_NAME.to_string(),
            encrypt_keys: true,
        }
    }
}

impl PrefsConfig {
    /// Default configuration for the store called `name`.
    #[must_use]
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the configuration with key encryption switched on or off.
    #[must_use]
    pub const fn with_encrypt_keys(mut self, encrypt_keys: bool) -> Self {
        self.encrypt_keys = encrypt_keys;
        self
    }

    /// Parses a JSON configuration. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::Backing`] if `json` is not a valid configuration.
    pub fn from_json(json: &str) -> PrefsResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| PrefsError::backing(format!("invalid preference config: {e}")))
    }
}
