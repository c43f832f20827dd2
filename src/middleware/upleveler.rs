// SPDX-License-Identifier: MIT OR Apache-2.0

//! Nested-table flattening middleware.
//!
//! An [`Upleveler`] wraps a source whose values are tables (for instance a
//! whole parsed document exposed under one key) and serves the entries of
//! those tables as its own top-level keys.
//!
//! The merged view is kept in a small internal cache so that bursts of reads
//! do not re-read the inner source every time. That cache is private to the
//! upleveler; an aggregator above it caches independently.

use crate::domain::{CacheLength, Clock, ConfigKey, ConfigValue, Expiry, Result, SystemClock};
use crate::ports::{AsyncConfigSource, ConfigSource, Named, SourceRef};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Default lifetime of the merged view.
pub const DEFAULT_UPLEVEL_CACHE: Duration = Duration::from_millis(10_000);

type Merged = Arc<HashMap<ConfigKey, ConfigValue>>;

/// Lifetime of an [`Upleveler`]'s internal merged view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UplevelCache {
    /// Read the inner source once and keep the result.
    Forever,
    /// Re-read the inner source once the duration has elapsed.
    For(Duration),
    /// Re-read the inner source on every access.
    Disabled,
}

impl UplevelCache {
    /// Converts a millisecond count: `0` keeps forever, negative disables.
    pub fn from_millis(ms: i64) -> Self {
        match u64::try_from(ms) {
            Ok(0) => UplevelCache::Forever,
            Ok(ms) => UplevelCache::For(Duration::from_millis(ms)),
            Err(_) => UplevelCache::Disabled,
        }
    }
}

impl Default for UplevelCache {
    fn default() -> Self {
        UplevelCache::For(DEFAULT_UPLEVEL_CACHE)
    }
}

/// Middleware that promotes the entries of table values to top-level keys.
///
/// When two inner keys hold tables defining the same entry, the inner key
/// visited first wins and the later one is dropped. Inner keys are visited in
/// allow-list order when one is set, otherwise in the inner listing order,
/// which is sorted by key for every bundled adapter. Scalar values are ignored.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::ManualSource;
/// use layercfg::domain::ConfigValue;
/// use layercfg::middleware::Upleveler;
/// use layercfg::ports::{ConfigSource, SourceRef};
/// use std::sync::Arc;
///
/// let doc = ConfigValue::table([("a", "1"), ("b", "2")]);
/// let raw = Arc::new(ManualSource::new("raw").with_value("cfg", doc));
/// let flat = Upleveler::new(SourceRef::blocking(raw));
///
/// assert_eq!(flat.get_str("a").unwrap(), Some(ConfigValue::from("1")));
/// assert_eq!(flat.get_str("cfg").unwrap(), None);
/// ```
pub struct Upleveler {
    name: String,
    inner: SourceRef,
    only: Option<Vec<ConfigKey>>,
    cache: UplevelCache,
    clock: Arc<dyn Clock>,
    merged: RwLock<Option<(Merged, Expiry)>>,
}

impl Upleveler {
    /// Uplevels every table value of `inner`, with the default cache window.
    pub fn new(inner: SourceRef) -> Self {
        Self {
            name: format!("uplevel({})", inner.name()),
            inner,
            only: None,
            cache: UplevelCache::default(),
            clock: Arc::new(SystemClock),
            merged: RwLock::new(None),
        }
    }

    /// Restricts upleveling to the listed inner keys, visited in this order.
    pub fn only<K, I>(mut self, keys: I) -> Self
    where
        K: Into<ConfigKey>,
        I: IntoIterator<Item = K>,
    {
        self.only = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the internal cache lifetime.
    pub fn cache(mut self, cache: UplevelCache) -> Self {
        self.cache = cache;
        self
    }

    /// Sets the clock the cache window is measured with.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Drops the merged view so the next read goes to the inner source.
    pub fn invalidate(&self) {
        *self.merged.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Wraps the upleveler in a [`SourceRef`] declaring both capability sets.
    pub fn into_source(self) -> SourceRef {
        SourceRef::dual(Arc::new(self))
    }

    fn cached(&self) -> Option<Merged> {
        if self.cache == UplevelCache::Disabled {
            return None;
        }
        let now = self.clock.now();
        let guard = self.merged.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some((merged, expiry)) if !expiry.is_expired(now) => {
                tracing::trace!("{}: serving merged view from cache", self.name);
                Some(Arc::clone(merged))
            }
            _ => None,
        }
    }

    fn store(&self, merged: HashMap<ConfigKey, ConfigValue>) -> Merged {
        let merged = Arc::new(merged);
        let length = match self.cache {
            UplevelCache::Disabled => return merged,
            UplevelCache::Forever => CacheLength::Forever,
            UplevelCache::For(d) => CacheLength::For(d),
        };
        let expiry = length.expiry_from(self.clock.now());
        *self.merged.write().unwrap_or_else(PoisonError::into_inner) =
            Some((Arc::clone(&merged), expiry));
        merged
    }

    fn scope(&self, listed: impl FnOnce() -> Result<Vec<ConfigKey>>) -> Result<Vec<ConfigKey>> {
        match &self.only {
            Some(keys) => Ok(keys.clone()),
            None => listed(),
        }
    }

    fn merged_sync(&self) -> Result<Merged> {
        if let Some(merged) = self.cached() {
            return Ok(merged);
        }
        // A suspend-only inner source shows nothing here; keep that out of
        // the cache so async readers still see the real view.
        if !self.inner.supports_sync() {
            return Ok(Arc::new(HashMap::new()));
        }
        let mut merged = HashMap::new();
        for key in self.scope(|| self.inner.list_sync())? {
            if let Some(fetched) = self.inner.read_sync(&key)? {
                merge_into(&mut merged, fetched.value);
            }
        }
        tracing::debug!("{}: merged {} keys", self.name, merged.len());
        Ok(self.store(merged))
    }

    async fn merged_async(&self) -> Result<Merged> {
        if let Some(merged) = self.cached() {
            return Ok(merged);
        }
        let keys = match &self.only {
            Some(keys) => keys.clone(),
            None => self.inner.list().await?,
        };
        let mut merged = HashMap::new();
        for key in keys {
            if let Some(fetched) = self.inner.read(&key).await? {
                merge_into(&mut merged, fetched.value);
            }
        }
        tracing::debug!("{}: merged {} keys", self.name, merged.len());
        Ok(self.store(merged))
    }
}

// First definition wins.
fn merge_into(merged: &mut HashMap<ConfigKey, ConfigValue>, value: ConfigValue) {
    if let ConfigValue::Table(entries) = value {
        for (key, value) in entries {
            merged.entry(ConfigKey::from(key)).or_insert(value);
        }
    }
}

impl std::fmt::Debug for Upleveler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upleveler")
            .field("inner", &self.inner)
            .field("only", &self.only)
            .field("cache", &self.cache)
            .finish()
    }
}

impl Named for Upleveler {
    fn name(&self) -> &str {
        &self.name
    }
}

impl ConfigSource for Upleveler {
    fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
        Ok(self.merged_sync()?.get(key).cloned())
    }

    fn all_keys(&self) -> Result<Vec<ConfigKey>> {
        Ok(self.merged_sync()?.keys().cloned().collect())
    }

    fn get_all(&self) -> Result<HashMap<ConfigKey, ConfigValue>> {
        Ok(self.merged_sync()?.as_ref().clone())
    }
}

#[async_trait]
impl AsyncConfigSource for Upleveler {
    async fn get_async(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
        Ok(self.merged_async().await?.get(key).cloned())
    }

    async fn all_keys_async(&self) -> Result<Vec<ConfigKey>> {
        Ok(self.merged_async().await?.keys().cloned().collect())
    }

    async fn get_all_async(&self) -> Result<HashMap<ConfigKey, ConfigValue>> {
        Ok(self.merged_async().await?.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ManualSource;
    use crate::domain::ManualClock;

    fn val(s: &str) -> Option<ConfigValue> {
        Some(ConfigValue::from(s))
    }

    #[test]
    fn test_cache_from_millis() {
        assert_eq!(UplevelCache::from_millis(0), UplevelCache::Forever);
        assert_eq!(UplevelCache::from_millis(-1), UplevelCache::Disabled);
        assert_eq!(
            UplevelCache::from_millis(250),
            UplevelCache::For(Duration::from_millis(250))
        );
        assert_eq!(
            UplevelCache::default(),
            UplevelCache::For(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_stale_within_window() {
        let clock = ManualClock::new();
        let raw = Arc::new(
            ManualSource::new("raw").with_value("cfg", ConfigValue::table([("a", "1"), ("b", "2")])),
        );
        let flat = Upleveler::new(SourceRef::blocking(raw.clone())).clock(Arc::new(clock.clone()));

        assert_eq!(flat.get_str("a").unwrap(), val("1"));

        raw.set("cfg", ConfigValue::table([("a", "9")]));
        clock.advance(Duration::from_secs(9));
        assert_eq!(flat.get_str("a").unwrap(), val("1"));
        assert_eq!(flat.get_str("b").unwrap(), val("2"));

        clock.advance(Duration::from_secs(1));
        assert_eq!(flat.get_str("a").unwrap(), val("9"));
        assert_eq!(flat.get_str("b").unwrap(), None);
    }

    #[test]
    fn test_disabled_cache_always_rereads() {
        let raw = Arc::new(ManualSource::new("raw").with_value("cfg", ConfigValue::table([("a", "1")])));
        let flat = Upleveler::new(SourceRef::blocking(raw.clone())).cache(UplevelCache::Disabled);

        assert_eq!(flat.get_str("a").unwrap(), val("1"));
        raw.set("cfg", ConfigValue::table([("a", "2")]));
        assert_eq!(flat.get_str("a").unwrap(), val("2"));
    }

    #[test]
    fn test_forever_cache_reads_once() {
        let clock = ManualClock::new();
        let raw = Arc::new(ManualSource::new("raw").with_value("cfg", ConfigValue::table([("a", "1")])));
        let flat = Upleveler::new(SourceRef::blocking(raw.clone()))
            .cache(UplevelCache::Forever)
            .clock(Arc::new(clock.clone()));

        assert_eq!(flat.get_str("a").unwrap(), val("1"));
        raw.set("cfg", ConfigValue::table([("a", "2")]));
        clock.advance(Duration::from_secs(3600));
        assert_eq!(flat.get_str("a").unwrap(), val("1"));

        flat.invalidate();
        assert_eq!(flat.get_str("a").unwrap(), val("2"));
    }

    #[test]
    fn test_first_inner_key_wins_and_scalars_ignored() {
        let raw = Arc::new(
            ManualSource::new("raw")
                .with_value("one", ConfigValue::table([("shared", "from-one"), ("x", "1")]))
                .with_value("two", ConfigValue::table([("shared", "from-two"), ("y", "2")]))
                .with_value("plain", "scalar"),
        );
        let flat = Upleveler::new(SourceRef::blocking(raw))
            .only(["one", "two", "plain"])
            .cache(UplevelCache::Disabled);

        assert_eq!(flat.get_str("shared").unwrap(), val("from-one"));
        assert_eq!(flat.get_str("y").unwrap(), val("2"));
        assert_eq!(flat.get_str("plain").unwrap(), None);

        let mut keys = flat.all_keys().unwrap();
        keys.sort();
        assert_eq!(
            keys,
            vec![ConfigKey::from("shared"), ConfigKey::from("x"), ConfigKey::from("y")]
        );
    }

    #[test]
    fn test_collision_without_allow_list_is_stable() {
        for _ in 0..32 {
            let raw = Arc::new(
                ManualSource::new("raw")
                    .with_value("zeta", ConfigValue::table([("shared", "from-zeta")]))
                    .with_value("alpha", ConfigValue::table([("shared", "from-alpha")])),
            );
            let flat = Upleveler::new(SourceRef::blocking(raw)).cache(UplevelCache::Disabled);

            assert_eq!(flat.get_str("shared").unwrap(), val("from-alpha"));
            assert_eq!(flat.get_all().unwrap().get("shared").cloned(), val("from-alpha"));
        }
    }

    #[test]
    fn test_allow_list_limits_scope() {
        let raw = Arc::new(
            ManualSource::new("raw")
                .with_value("one", ConfigValue::table([("x", "1")]))
                .with_value("two", ConfigValue::table([("y", "2")])),
        );
        let flat = Upleveler::new(SourceRef::blocking(raw)).only(["two"]);

        assert_eq!(flat.get_str("x").unwrap(), None);
        assert_eq!(flat.get_str("y").unwrap(), val("2"));
        assert_eq!(flat.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_async_path_shares_cache() {
        let clock = ManualClock::new();
        let raw = Arc::new(ManualSource::new("raw").with_value("cfg", ConfigValue::table([("a", "1")])));
        let flat = Upleveler::new(SourceRef::blocking(raw.clone())).clock(Arc::new(clock));

        assert_eq!(flat.get_str("a").unwrap(), val("1"));
        raw.set("cfg", ConfigValue::table([("a", "2")]));

        let key = ConfigKey::from("a");
        assert_eq!(tokio_test::block_on(flat.get_async(&key)).unwrap(), val("1"));
        assert_eq!(flat.name(), "uplevel(raw)");
    }
}
