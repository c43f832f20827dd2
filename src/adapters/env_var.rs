// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment variable configuration source adapter.
//!
//! The process environment is snapshotted on first use and served from that
//! snapshot until [`EnvVarAdapter::reload`] is called. Keys are listed in
//! sorted order.

use crate::domain::{ConfigKey, ConfigValue, Result};
use crate::ports::{ConfigSource, Named};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::sync::{Arc, PoisonError, RwLock};

/// Maximum length for environment variable keys (prevents DoS)
const MAX_ENV_KEY_LEN: usize = 512;

/// Maximum length for environment variable values (prevents DoS)
const MAX_ENV_VALUE_LEN: usize = 1048576; // 1MB

type Snapshot = Arc<BTreeMap<ConfigKey, ConfigValue>>;

/// Configuration source adapter for environment variables.
///
/// Supports optional prefix filtering (only variables starting with `APP_`,
/// with the prefix stripped) and key transformation (lowercasing, underscores
/// to dots).
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::EnvVarAdapter;
///
/// // Read all environment variables
/// let adapter = EnvVarAdapter::new();
///
/// // Read only variables with a specific prefix, as `database.host` style keys
/// let adapter = EnvVarAdapter::with_prefix("APP_").lowercase_keys(true);
/// ```
#[derive(Debug)]
pub struct EnvVarAdapter {
    /// Optional prefix to filter environment variables
    prefix: Option<String>,
    /// Whether to convert keys to lowercase
    lowercase_keys: bool,
    /// Whether to replace underscores with dots
    replace_underscores: bool,
    /// Lazily loaded snapshot of the environment
    snapshot: RwLock<Option<Snapshot>>,
}

impl EnvVarAdapter {
    /// Creates an adapter over every environment variable.
    pub fn new() -> Self {
        Self {
            prefix: None,
            lowercase_keys: false,
            replace_underscores: true,
            snapshot: RwLock::new(None),
        }
    }

    /// Creates an adapter over variables starting with `prefix`.
    ///
    /// The prefix is stripped from the key.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::new()
        }
    }

    /// Sets whether to convert keys to lowercase.
    pub fn lowercase_keys(mut self, enabled: bool) -> Self {
        self.lowercase_keys = enabled;
        self
    }

    /// Sets whether to replace underscores with dots in keys (default: on).
    pub fn replace_underscores(mut self, enabled: bool) -> Self {
        self.replace_underscores = enabled;
        self
    }

    /// Creates an adapter with pre-populated values instead of the process
    /// environment. Intended for tests.
    pub fn with_values(values: HashMap<String, String>) -> Self {
        let snapshot = values
            .into_iter()
            .map(|(k, v)| (ConfigKey::from(k), ConfigValue::from(v)))
            .collect();
        Self {
            prefix: None,
            lowercase_keys: false,
            replace_underscores: false,
            snapshot: RwLock::new(Some(Arc::new(snapshot))),
        }
    }

    /// Drops the snapshot so that the next read sees the current environment.
    pub fn reload(&self) {
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn transform_key(&self, raw: String) -> Option<String> {
        let key = match &self.prefix {
            Some(prefix) => raw.strip_prefix(prefix.as_str())?.to_string(),
            None => raw,
        };
        let key = if self.lowercase_keys {
            key.to_lowercase()
        } else {
            key
        };
        Some(if self.replace_underscores {
            key.replace('_', ".")
        } else {
            key
        })
    }

    fn load(&self) -> BTreeMap<ConfigKey, ConfigValue> {
        let mut values = BTreeMap::new();

        for (key, value) in env::vars() {
            if key.len() > MAX_ENV_KEY_LEN || value.len() > MAX_ENV_VALUE_LEN {
                tracing::warn!(
                    "Skipping oversized environment variable: key_len={}, value_len={} (max key={}, max value={})",
                    key.len(),
                    value.len(),
                    MAX_ENV_KEY_LEN,
                    MAX_ENV_VALUE_LEN
                );
                continue;
            }

            if let Some(key) = self.transform_key(key) {
                values.insert(ConfigKey::from(key), ConfigValue::from(value));
            }
        }

        tracing::debug!(
            "Loaded {} environment variables (prefix={:?}, lowercase={}, replace_underscores={})",
            values.len(),
            self.prefix,
            self.lowercase_keys,
            self.replace_underscores
        );

        values
    }

    fn snapshot(&self) -> Snapshot {
        if let Some(snapshot) = self
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Arc::clone(snapshot);
        }

        let fresh = Arc::new(self.load());
        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Another reader may have loaded it while we were reading the environment.
        Arc::clone(guard.get_or_insert(fresh))
    }
}

impl Default for EnvVarAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Named for EnvVarAdapter {
    fn name(&self) -> &str {
        "env"
    }
}

impl ConfigSource for EnvVarAdapter {
    fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
        Ok(self.snapshot().get(key).cloned())
    }

    fn all_keys(&self) -> Result<Vec<ConfigKey>> {
        Ok(self.snapshot().keys().cloned().collect())
    }

    fn get_all(&self) -> Result<HashMap<ConfigKey, ConfigValue>> {
        Ok(self
            .snapshot()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
