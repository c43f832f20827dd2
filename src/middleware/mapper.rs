// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key mapping middleware.
//!
//! A [`Mapper`] renames every key of an inner source with a function. A key the
//! function maps to `None` disappears. When several inner keys map to the
//! same outer key, the first one in the inner source's listing order wins, for
//! reads and listings alike. The bundled adapters list keys sorted, so the
//! winner is the smallest colliding inner key.

use crate::domain::{ConfigKey, Fetched, Result};
use crate::ports::{AsyncConfigSource, ConfigSource, Named, SourceRef};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

type MapFn = Arc<dyn Fn(&ConfigKey) -> Option<ConfigKey> + Send + Sync>;

/// Middleware that renames or filters the keys of an inner source.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::ManualSource;
/// use layercfg::domain::{ConfigKey, ConfigValue};
/// use layercfg::middleware::Mapper;
/// use layercfg::ports::{ConfigSource, SourceRef};
/// use std::sync::Arc;
///
/// let raw = Arc::new(ManualSource::new("raw").with_value("APP_PORT", "80"));
/// let mapped = Mapper::new(SourceRef::blocking(raw), |key| {
///     key.as_str()
///         .strip_prefix("APP_")
///         .map(|rest| ConfigKey::from(rest.to_lowercase()))
/// });
///
/// assert_eq!(mapped.get_str("port").unwrap(), Some(ConfigValue::from("80")));
/// assert_eq!(mapped.get_str("APP_PORT").unwrap(), None);
/// ```
pub struct Mapper<V>
where
    V: Send + Sync + 'static,
{
    name: String,
    inner: SourceRef<V>,
    map: MapFn,
}

impl<V> Mapper<V>
where
    V: Send + Sync + 'static,
{
    /// Maps the keys of `inner` through `f`.
    pub fn new<F>(inner: SourceRef<V>, f: F) -> Self
    where
        F: Fn(&ConfigKey) -> Option<ConfigKey> + Send + Sync + 'static,
    {
        Self {
            name: format!("map({})", inner.name()),
            inner,
            map: Arc::new(f),
        }
    }

    /// Wraps the mapper in a [`SourceRef`] declaring both capability sets.
    pub fn into_source(self) -> SourceRef<V> {
        SourceRef::dual(Arc::new(self))
    }

    /// The inner key that backs `outer`, searching in listing order.
    fn inner_key(&self, inner_keys: Vec<ConfigKey>, outer: &ConfigKey) -> Option<ConfigKey> {
        inner_keys
            .into_iter()
            .find(|k| (self.map)(k).as_ref() == Some(outer))
    }

    fn mapped_keys(&self, inner_keys: Vec<ConfigKey>) -> Vec<ConfigKey> {
        let mut seen = HashSet::new();
        inner_keys
            .iter()
            .filter_map(|k| (self.map)(k))
            .filter(|k| seen.insert(k.clone()))
            .collect()
    }

    fn mapped_entries(
        &self,
        inner_keys: Vec<ConfigKey>,
        mut raw: HashMap<ConfigKey, V>,
    ) -> HashMap<ConfigKey, V> {
        let mut mapped = HashMap::new();
        for key in inner_keys {
            let Some(outer) = (self.map)(&key) else {
                continue;
            };
            if mapped.contains_key(&outer) {
                continue;
            }
            if let Some(value) = raw.remove(&key) {
                mapped.insert(outer, value);
            }
        }
        mapped
    }
}

impl<V> fmt::Debug for Mapper<V>
where
    V: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper").field("inner", &self.inner).finish()
    }
}

impl<V> Named for Mapper<V>
where
    V: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }
}

impl<V> ConfigSource<V> for Mapper<V>
where
    V: Send + Sync + 'static,
{
    fn get(&self, key: &ConfigKey) -> Result<Option<V>> {
        Ok(self.lookup(key)?.map(Fetched::into_value))
    }

    fn all_keys(&self) -> Result<Vec<ConfigKey>> {
        Ok(self.mapped_keys(self.inner.list_sync()?))
    }

    fn lookup(&self, key: &ConfigKey) -> Result<Option<Fetched<V>>> {
        match self.inner_key(self.inner.list_sync()?, key) {
            Some(inner) => self.inner.read_sync(&inner),
            None => Ok(None),
        }
    }

    fn get_all(&self) -> Result<HashMap<ConfigKey, V>> {
        let keys = self.inner.list_sync()?;
        Ok(self.mapped_entries(keys, self.inner.read_all_sync()?))
    }
}

#[async_trait]
impl<V> AsyncConfigSource<V> for Mapper<V>
where
    V: Send + Sync + 'static,
{
    async fn get_async(&self, key: &ConfigKey) -> Result<Option<V>> {
        Ok(self.lookup_async(key).await?.map(Fetched::into_value))
    }

    async fn all_keys_async(&self) -> Result<Vec<ConfigKey>> {
        Ok(self.mapped_keys(self.inner.list().await?))
    }

    async fn lookup_async(&self, key: &ConfigKey) -> Result<Option<Fetched<V>>> {
        match self.inner_key(self.inner.list().await?, key) {
            Some(inner) => self.inner.read(&inner).await,
            None => Ok(None),
        }
    }

    async fn get_all_async(&self) -> Result<HashMap<ConfigKey, V>> {
        let keys = self.inner.list().await?;
        Ok(self.mapped_entries(keys, self.inner.read_all().await?))
    }
}
