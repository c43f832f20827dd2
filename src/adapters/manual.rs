// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory configuration source.
//!
//! Useful for programmatic overrides and for tests. Values can be changed at
//! any time through a shared handle; the change is visible on the next read
//! that reaches this source.
//!
//! Keys are listed in sorted order, so middleware that settles collisions by
//! listing order behaves the same on every run.

use crate::domain::{ConfigKey, ConfigValue, Result};
use crate::ports::{ConfigSource, Named};
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

/// An in-memory, mutable configuration source.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::ManualSource;
/// use layercfg::ports::ConfigSource;
///
/// let source = ManualSource::new("overrides").with_value("log.level", "debug");
/// source.set("log.format", "json");
///
/// assert_eq!(source.all_keys().unwrap().len(), 2);
/// ```
#[derive(Debug)]
pub struct ManualSource<V = ConfigValue> {
    name: String,
    values: RwLock<BTreeMap<ConfigKey, V>>,
}

impl ManualSource<ConfigValue> {
    /// Creates an empty source of raw values.
    pub fn new(name: impl Into<String>) -> Self {
        Self::empty(name)
    }
}

impl<V> ManualSource<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty source of any value type.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates a source pre-populated with `values`.
    pub fn with_values<K, I>(name: impl Into<String>, values: I) -> Self
    where
        K: Into<ConfigKey>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            name: name.into(),
            values: RwLock::new(values.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Adds a value, builder style.
    pub fn with_value(self, key: impl Into<ConfigKey>, value: impl Into<V>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets or replaces a value.
    pub fn set(&self, key: impl Into<ConfigKey>, value: impl Into<V>) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// Removes a value, returning the previous one.
    pub fn unset(&self, key: impl Into<ConfigKey>) -> Option<V> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key.into())
    }

    /// Removes every value.
    pub fn clear(&self) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of keys currently defined.
    pub fn len(&self) -> usize {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no keys are defined.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Named for ManualSource<V>
where
    V: Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }
}

impl<V> ConfigSource<V> for ManualSource<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &ConfigKey) -> Result<Option<V>> {
        Ok(self
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn all_keys(&self) -> Result<Vec<ConfigKey>> {
        Ok(self
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect())
    }

    fn get_all(&self) -> Result<HashMap<ConfigKey, V>> {
        Ok(self
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
