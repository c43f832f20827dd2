// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration source traits.
//!
//! A source exposes two capability sets, declared separately:
//!
//! - [`ConfigSource`] never blocks. It is what synchronous callers see.
//! - [`AsyncConfigSource`] may suspend, e.g. while talking to a remote store.
//!
//! A source implements whichever set(s) it can honor and is registered through
//! a [`SourceRef`] that records that choice. Sources that only block are still
//! fully usable from async callers; sources that only suspend contribute
//! nothing to synchronous callers.
//!
//! In both sets, `Ok(None)` means "this key is absent here" and is never an
//! error. Every key the bulk read would populate must be enumerated by the
//! key listing.

use crate::domain::{ConfigKey, ConfigValue, Fetched, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Identification shared by both capability sets.
pub trait Named: Send + Sync {
    /// A short identifier used in logs and diagnostics, like `"env"` or `"yaml-file"`.
    fn name(&self) -> &str;
}

/// The never-blocking capability set.
///
/// # Examples
///
/// ```rust
/// use layercfg::domain::{ConfigKey, ConfigValue, Result};
/// use layercfg::ports::{ConfigSource, Named};
///
/// struct Fixed;
///
/// impl Named for Fixed {
///     fn name(&self) -> &str {
///         "fixed"
///     }
/// }
///
/// impl ConfigSource for Fixed {
///     fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
///         Ok((key.as_str() == "app.name").then(|| ConfigValue::from("MyApp")))
///     }
///
///     fn all_keys(&self) -> Result<Vec<ConfigKey>> {
///         Ok(vec![ConfigKey::from("app.name")])
///     }
/// }
///
/// let source = Fixed;
/// assert!(source.get_str("app.name").unwrap().is_some());
/// assert!(source.get_str("missing").unwrap().is_none());
/// ```
pub trait ConfigSource<V = ConfigValue>: Named
where
    V: Send + Sync + 'static,
{
    /// Retrieves the value for `key`, or `Ok(None)` if this source does not define it.
    fn get(&self, key: &ConfigKey) -> Result<Option<V>>;

    /// Returns every key this source defines.
    fn all_keys(&self) -> Result<Vec<ConfigKey>>;

    /// Like [`get`](Self::get), but may attach a result-level cache length.
    fn lookup(&self, key: &ConfigKey) -> Result<Option<Fetched<V>>> {
        Ok(self.get(key)?.map(Fetched::new))
    }

    /// Returns every key/value pair this source defines.
    fn get_all(&self) -> Result<HashMap<ConfigKey, V>> {
        let mut all = HashMap::new();
        for key in self.all_keys()? {
            if let Some(value) = self.get(&key)? {
                all.insert(key, value);
            }
        }
        Ok(all)
    }

    /// Retrieves a value by string key.
    fn get_str(&self, key: &str) -> Result<Option<V>> {
        self.get(&ConfigKey::from(key))
    }
}

/// The may-suspend capability set.
#[async_trait]
pub trait AsyncConfigSource<V = ConfigValue>: Named
where
    V: Send + Sync + 'static,
{
    /// Retrieves the value for `key`, or `Ok(None)` if this source does not define it.
    async fn get_async(&self, key: &ConfigKey) -> Result<Option<V>>;

    /// Returns every key this source defines.
    async fn all_keys_async(&self) -> Result<Vec<ConfigKey>>;

    /// Like [`get_async`](Self::get_async), but may attach a result-level cache length.
    async fn lookup_async(&self, key: &ConfigKey) -> Result<Option<Fetched<V>>> {
        Ok(self.get_async(key).await?.map(Fetched::new))
    }

    /// Returns every key/value pair this source defines.
    async fn get_all_async(&self) -> Result<HashMap<ConfigKey, V>> {
        let mut all = HashMap::new();
        for key in self.all_keys_async().await? {
            if let Some(value) = self.get_async(&key).await? {
                all.insert(key, value);
            }
        }
        Ok(all)
    }
}

/// A source that implements both capability sets.
pub trait DualSource<V>: ConfigSource<V> + AsyncConfigSource<V>
where
    V: Send + Sync + 'static,
{
}

impl<V, T> DualSource<V> for T
where
    V: Send + Sync + 'static,
    T: ConfigSource<V> + AsyncConfigSource<V> + ?Sized,
{
}

/// A shared handle to a source, tagged with the capability set(s) it declares.
///
/// Two handles refer to the same source when they point at the same
/// allocation; see [`SourceRef::same_source`]. This is how the aggregator
/// recognises a source on re-registration and removal.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::ManualSource;
/// use layercfg::ports::SourceRef;
/// use std::sync::Arc;
///
/// let manual = Arc::new(ManualSource::new("overrides"));
/// let a = SourceRef::blocking(manual.clone());
/// let b = SourceRef::blocking(manual);
/// assert!(a.same_source(&b));
/// assert_eq!(a.name(), "overrides");
/// ```
pub enum SourceRef<V = ConfigValue>
where
    V: Send + Sync + 'static,
{
    /// Only the never-blocking set.
    Blocking(Arc<dyn ConfigSource<V>>),
    /// Only the may-suspend set.
    Suspending(Arc<dyn AsyncConfigSource<V>>),
    /// Both sets.
    Dual(Arc<dyn DualSource<V>>),
}

impl<V> SourceRef<V>
where
    V: Send + Sync + 'static,
{
    /// Wraps a source that only implements [`ConfigSource`].
    pub fn blocking<S>(source: Arc<S>) -> Self
    where
        S: ConfigSource<V> + 'static,
    {
        SourceRef::Blocking(source)
    }

    /// Wraps a source that only implements [`AsyncConfigSource`].
    pub fn suspending<S>(source: Arc<S>) -> Self
    where
        S: AsyncConfigSource<V> + 'static,
    {
        SourceRef::Suspending(source)
    }

    /// Wraps a source that implements both capability sets.
    pub fn dual<S>(source: Arc<S>) -> Self
    where
        S: ConfigSource<V> + AsyncConfigSource<V> + 'static,
    {
        SourceRef::Dual(source)
    }

    /// The source's name.
    pub fn name(&self) -> &str {
        match self {
            SourceRef::Blocking(s) => s.name(),
            SourceRef::Suspending(s) => s.name(),
            SourceRef::Dual(s) => Named::name(&**s),
        }
    }

    /// Whether synchronous callers can see anything from this source.
    pub fn supports_sync(&self) -> bool {
        !matches!(self, SourceRef::Suspending(_))
    }

    /// Returns `true` if both handles point at the same source instance.
    pub fn same_source(&self, other: &SourceRef<V>) -> bool {
        std::ptr::eq(self.data_ptr(), other.data_ptr())
    }

    fn data_ptr(&self) -> *const () {
        match self {
            SourceRef::Blocking(s) => Arc::as_ptr(s) as *const (),
            SourceRef::Suspending(s) => Arc::as_ptr(s) as *const (),
            SourceRef::Dual(s) => Arc::as_ptr(s) as *const (),
        }
    }

    /// Synchronous single-key lookup. Suspend-only sources yield `None`.
    pub fn read_sync(&self, key: &ConfigKey) -> Result<Option<Fetched<V>>> {
        match self {
            SourceRef::Blocking(s) => s.lookup(key),
            SourceRef::Dual(s) => ConfigSource::lookup(&**s, key),
            SourceRef::Suspending(_) => Ok(None),
        }
    }

    /// Synchronous bulk read. Suspend-only sources yield an empty map.
    pub fn read_all_sync(&self) -> Result<HashMap<ConfigKey, V>> {
        match self {
            SourceRef::Blocking(s) => s.get_all(),
            SourceRef::Dual(s) => ConfigSource::get_all(&**s),
            SourceRef::Suspending(_) => Ok(HashMap::new()),
        }
    }

    /// Synchronous key listing. Suspend-only sources yield an empty list.
    pub fn list_sync(&self) -> Result<Vec<ConfigKey>> {
        match self {
            SourceRef::Blocking(s) => s.all_keys(),
            SourceRef::Dual(s) => ConfigSource::all_keys(&**s),
            SourceRef::Suspending(_) => Ok(Vec::new()),
        }
    }

    /// Asynchronous single-key lookup.
    pub async fn read(&self, key: &ConfigKey) -> Result<Option<Fetched<V>>> {
        match self {
            SourceRef::Blocking(s) => s.lookup(key),
            SourceRef::Suspending(s) => s.lookup_async(key).await,
            SourceRef::Dual(s) => AsyncConfigSource::lookup_async(&**s, key).await,
        }
    }

    /// Asynchronous bulk read.
    pub async fn read_all(&self) -> Result<HashMap<ConfigKey, V>> {
        match self {
            SourceRef::Blocking(s) => s.get_all(),
            SourceRef::Suspending(s) => s.get_all_async().await,
            SourceRef::Dual(s) => AsyncConfigSource::get_all_async(&**s).await,
        }
    }

    /// Asynchronous key listing.
    pub async fn list(&self) -> Result<Vec<ConfigKey>> {
        match self {
            SourceRef::Blocking(s) => s.all_keys(),
            SourceRef::Suspending(s) => s.all_keys_async().await,
            SourceRef::Dual(s) => AsyncConfigSource::all_keys_async(&**s).await,
        }
    }
}

impl<V> Clone for SourceRef<V>
where
    V: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        match self {
            SourceRef::Blocking(s) => SourceRef::Blocking(Arc::clone(s)),
            SourceRef::Suspending(s) => SourceRef::Suspending(Arc::clone(s)),
            SourceRef::Dual(s) => SourceRef::Dual(Arc::clone(s)),
        }
    }
}

impl<V> fmt::Debug for SourceRef<V>
where
    V: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            SourceRef::Blocking(_) => "Blocking",
            SourceRef::Suspending(_) => "Suspending",
            SourceRef::Dual(_) => "Dual",
        };
        f.debug_struct("SourceRef")
            .field("kind", &kind)
            .field("name", &self.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SyncOnly;

    impl Named for SyncOnly {
        fn name(&self) -> &str {
            "sync-only"
        }
    }

    impl ConfigSource for SyncOnly {
        fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
            Ok((key.as_str() == "k").then(|| ConfigValue::from("sync")))
        }

        fn all_keys(&self) -> Result<Vec<ConfigKey>> {
            Ok(vec![ConfigKey::from("k")])
        }
    }

    struct AsyncOnly;

    impl Named for AsyncOnly {
        fn name(&self) -> &str {
            "async-only"
        }
    }

    #[async_trait]
    impl AsyncConfigSource for AsyncOnly {
        async fn get_async(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
            Ok((key.as_str() == "k").then(|| ConfigValue::from("async")))
        }

        async fn all_keys_async(&self) -> Result<Vec<ConfigKey>> {
            Ok(vec![ConfigKey::from("k")])
        }
    }

    #[test]
    fn test_default_get_all_uses_keys() {
        let all = SyncOnly.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all.get("k"), Some(&ConfigValue::from("sync")));
    }

    #[test]
    fn test_default_lookup_has_no_cache_length() {
        let fetched = SyncOnly.lookup(&ConfigKey::from("k")).unwrap().unwrap();
        assert_eq!(fetched.cache_length, None);
    }

    #[test]
    fn test_blocking_source_serves_async_callers() {
        let source: SourceRef = SourceRef::blocking(Arc::new(SyncOnly));
        let key = ConfigKey::from("k");

        let value = tokio_test::block_on(source.read(&key)).unwrap();
        assert_eq!(value.map(Fetched::into_value), Some(ConfigValue::from("sync")));
        assert_eq!(tokio_test::block_on(source.list()).unwrap().len(), 1);
        assert!(source.supports_sync());
    }

    #[test]
    fn test_suspending_source_is_invisible_to_sync_callers() {
        let source: SourceRef = SourceRef::suspending(Arc::new(AsyncOnly));
        let key = ConfigKey::from("k");

        assert!(source.read_sync(&key).unwrap().is_none());
        assert!(source.read_all_sync().unwrap().is_empty());
        assert!(source.list_sync().unwrap().is_empty());
        assert!(!source.supports_sync());

        let value = tokio_test::block_on(source.read(&key)).unwrap();
        assert_eq!(value.map(Fetched::into_value), Some(ConfigValue::from("async")));
        let all = tokio_test::block_on(source.read_all()).unwrap();
        assert_eq!(all.get("k"), Some(&ConfigValue::from("async")));
    }

    #[test]
    fn test_identity_is_by_allocation() {
        let shared = Arc::new(SyncOnly);
        let a: SourceRef = SourceRef::blocking(shared.clone());
        let b: SourceRef = SourceRef::blocking(shared);
        let c: SourceRef = SourceRef::blocking(Arc::new(SyncOnly));

        assert!(a.same_source(&b));
        assert!(a.same_source(&a.clone()));
        assert!(!a.same_source(&c));
    }

    #[test]
    fn test_debug_shows_kind_and_name() {
        let source: SourceRef = SourceRef::suspending(Arc::new(AsyncOnly));
        let debug = format!("{:?}", source);
        assert!(debug.contains("Suspending"));
        assert!(debug.contains("async-only"));
    }
}
