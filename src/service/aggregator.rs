// SPDX-License-Identifier: MIT OR Apache-2.0

//! The resolution engine.
//!
//! An [`Aggregator`] holds an ordered list of source registrations, an alias
//! table and a result cache, and answers reads by asking its sources in
//! registration order.
//!
//! # Resolution
//!
//! 1. A cached entity for the key is purged if it has expired.
//! 2. Unless the aggregator was built with `cache_respects_priority(true)`, a
//!    live cached entity is returned straight away.
//! 3. Otherwise the cached entity's priority becomes the floor: only a source
//!    of strictly higher priority can displace it.
//! 4. The candidate keys are the alias targets when the key is an alias, or
//!    the key itself.
//! 5. Every (candidate key, registration) pair is tried in order. Sources
//!    below the running priority, ignored sources and absent values are
//!    skipped. An accepted value raises the running priority, so among sources
//!    of equal priority the one registered last wins.
//! 6. A fresh winner is cached with the first cache length found among the
//!    result itself, its registration, and the aggregator default.
//!
//! Absent results are never cached, and the registration list is snapshotted
//! before a resolution starts.

use crate::domain::{
    CacheLength, Clock, ConfigError, ConfigKey, ConfigValue, Expiry, Fetched, Result, SystemClock,
};
use crate::ports::{AsyncConfigSource, ConfigSource, Named, SourceRef};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

type IgnoreFn = Arc<dyn Fn() -> bool + Send + Sync>;

/// Registration metadata for one source.
///
/// # Examples
///
/// ```rust
/// use layercfg::domain::CacheLength;
/// use layercfg::service::SourceOptions;
///
/// let options = SourceOptions::new()
///     .priority(10)
///     .cache_length(CacheLength::millis(5_000))
///     .ignore_if(|| std::env::var("CI").is_ok());
/// ```
#[derive(Clone, Default)]
pub struct SourceOptions {
    priority: i32,
    cache_length: Option<CacheLength>,
    ignore_if: Option<IgnoreFn>,
}

impl SourceOptions {
    /// Priority 0, the aggregator's default cache length, never ignored.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the priority. Higher wins.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Overrides the aggregator's default cache length for values from this source.
    pub fn cache_length(mut self, cache_length: CacheLength) -> Self {
        self.cache_length = Some(cache_length);
        self
    }

    /// Skips the source for every read during which `condition` returns `true`.
    pub fn ignore_if<F>(mut self, condition: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.ignore_if = Some(Arc::new(condition));
        self
    }

    fn is_ignored(&self) -> bool {
        self.ignore_if.as_ref().is_some_and(|condition| condition())
    }
}

impl fmt::Debug for SourceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceOptions")
            .field("priority", &self.priority)
            .field("cache_length", &self.cache_length)
            .field("ignore_if", &self.ignore_if.is_some())
            .finish()
    }
}

/// A partial update of a registration, for [`Aggregator::edit_source`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceEdit {
    /// New priority, if any.
    pub priority: Option<i32>,
    /// New cache length, if any.
    pub cache_length: Option<CacheLength>,
}

impl SourceEdit {
    /// An edit that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes the priority.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Changes the cache length.
    pub fn cache_length(mut self, cache_length: CacheLength) -> Self {
        self.cache_length = Some(cache_length);
        self
    }
}

/// One resolved value and where it came from.
#[derive(Clone, Debug)]
pub struct CachedEntity<V>
where
    V: Send + Sync + 'static,
{
    /// The key the value was resolved for (an alias caches under its own name).
    pub key: ConfigKey,
    /// The resolved value.
    pub value: V,
    /// Priority of the winning registration.
    pub priority: i32,
    /// The winning source.
    pub source: SourceRef<V>,
    /// When the entity goes stale.
    pub expiry: Expiry,
}

#[derive(Clone)]
struct Registration<V>
where
    V: Send + Sync + 'static,
{
    source: SourceRef<V>,
    options: SourceOptions,
}

/// Lowest priority a source needs to be considered.
#[derive(Clone, Copy, Debug)]
enum Floor {
    Open,
    Above(i32),
    AtLeast(i32),
}

impl Floor {
    fn admits(self, priority: i32) -> bool {
        match self {
            Floor::Open => true,
            Floor::Above(floor) => priority > floor,
            Floor::AtLeast(floor) => priority >= floor,
        }
    }
}

enum Start<V> {
    Hit(V),
    Resolve { cached: Option<V>, floor: Floor },
}

struct Winner<V>
where
    V: Send + Sync + 'static,
{
    fetched: Fetched<V>,
    source: SourceRef<V>,
    priority: i32,
    cache_length: Option<CacheLength>,
}

impl<V> Winner<V>
where
    V: Send + Sync + 'static,
{
    fn new(fetched: Fetched<V>, registration: &Registration<V>) -> Self {
        Self {
            fetched,
            source: registration.source.clone(),
            priority: registration.options.priority,
            cache_length: registration.options.cache_length,
        }
    }
}

/// Merges several sources into one lookup surface.
///
/// The aggregator is itself a source (both capability sets), so it can be
/// registered inside another aggregator or wrapped by any middleware.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::ManualSource;
/// use layercfg::domain::ConfigValue;
/// use layercfg::ports::SourceRef;
/// use layercfg::service::{Aggregator, SourceOptions};
/// use std::sync::Arc;
///
/// # fn main() -> layercfg::domain::Result<()> {
/// let defaults = SourceRef::blocking(Arc::new(ManualSource::new("defaults").with_value("k", "1")));
/// let overrides = SourceRef::blocking(Arc::new(ManualSource::new("overrides").with_value("k", "2")));
///
/// let config = Aggregator::builder()
///     .with_source(defaults, SourceOptions::new())
///     .with_source(overrides.clone(), SourceOptions::new().priority(1))
///     .build()?;
///
/// assert_eq!(config.read_sync("k")?, Some(ConfigValue::from("2")));
///
/// config.remove_source(&overrides);
/// config.clear_cache();
/// assert_eq!(config.read_sync("k")?, Some(ConfigValue::from("1")));
/// # Ok(())
/// # }
/// ```
pub struct Aggregator<V = ConfigValue>
where
    V: Send + Sync + 'static,
{
    name: String,
    registrations: RwLock<Vec<Registration<V>>>,
    aliases: RwLock<HashMap<ConfigKey, Vec<ConfigKey>>>,
    cache: RwLock<HashMap<ConfigKey, CachedEntity<V>>>,
    cache_respects_priority: bool,
    default_cache_length: CacheLength,
    clock: Arc<dyn Clock>,
}

impl<V> Aggregator<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty aggregator with default settings.
    pub fn new() -> Self {
        AggregatorBuilder::new().assemble()
    }

    /// Creates a new builder.
    pub fn builder() -> AggregatorBuilder<V> {
        AggregatorBuilder::new()
    }

    /// Wraps the aggregator in a [`SourceRef`] declaring both capability sets.
    pub fn into_source(self) -> SourceRef<V> {
        SourceRef::dual(Arc::new(self))
    }

    /// Whether cached values are re-checked against higher priority sources.
    pub fn cache_respects_priority(&self) -> bool {
        self.cache_respects_priority
    }

    /// Registers a source. Registering the same source again replaces its
    /// options and keeps its position.
    pub fn add_source(&self, source: SourceRef<V>, options: SourceOptions) {
        let mut registrations = self
            .registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match registrations
            .iter_mut()
            .find(|r| r.source.same_source(&source))
        {
            Some(existing) => {
                tracing::debug!(
                    "Re-registering source '{}' with priority {}",
                    source.name(),
                    options.priority
                );
                existing.options = options;
            }
            None => {
                tracing::debug!(
                    "Registering source '{}' with priority {}",
                    source.name(),
                    options.priority
                );
                registrations.push(Registration { source, options });
            }
        }
    }

    /// Updates the priority and/or cache length of a registered source.
    ///
    /// Returns `false` if the source is not registered.
    pub fn edit_source(&self, source: &SourceRef<V>, edit: SourceEdit) -> bool {
        let mut registrations = self
            .registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(existing) = registrations
            .iter_mut()
            .find(|r| r.source.same_source(source))
        else {
            return false;
        };
        if let Some(priority) = edit.priority {
            existing.options.priority = priority;
        }
        if let Some(cache_length) = edit.cache_length {
            existing.options.cache_length = Some(cache_length);
        }
        true
    }

    /// Unregisters a source. Cached values it produced stay cached until they
    /// expire or are cleared.
    ///
    /// Returns `false` if the source was not registered.
    pub fn remove_source(&self, source: &SourceRef<V>) -> bool {
        let mut registrations = self
            .registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = registrations.len();
        registrations.retain(|r| !r.source.same_source(source));
        let removed = registrations.len() != before;
        if removed {
            tracing::debug!("Removed source '{}'", source.name());
        }
        removed
    }

    /// Number of registered sources.
    pub fn source_count(&self) -> usize {
        self.registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Makes `alias` resolve through `keys`. The alias has its own cache slot,
    /// which is cleared by re-aliasing.
    pub fn alias<K, I>(&self, alias: impl Into<ConfigKey>, keys: I)
    where
        K: Into<ConfigKey>,
        I: IntoIterator<Item = K>,
    {
        let alias = alias.into();
        let keys: Vec<ConfigKey> = keys.into_iter().map(Into::into).collect();
        tracing::debug!("Aliasing '{}' to {:?}", alias, keys);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&alias);
        self.aliases
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(alias, keys);
    }

    /// Resolves a key without suspending. Suspend-only sources are not consulted.
    pub fn read_sync(&self, key: impl Into<ConfigKey>) -> Result<Option<V>> {
        self.resolve_sync(&key.into())
    }

    /// Resolves a key, consulting every source.
    pub async fn read(&self, key: impl Into<ConfigKey>) -> Result<Option<V>> {
        let key = key.into();
        self.resolve(&key).await
    }

    /// Like [`read_sync`](Self::read_sync), but absence is an error.
    pub fn require_sync(&self, key: impl Into<ConfigKey>) -> Result<V> {
        let key = key.into();
        self.resolve_sync(&key)?.ok_or_else(|| ConfigError::not_found(key.as_str()))
    }

    /// Like [`read`](Self::read), but absence is an error.
    pub async fn require(&self, key: impl Into<ConfigKey>) -> Result<V> {
        let key = key.into();
        self.resolve(&key).await?.ok_or_else(|| ConfigError::not_found(key.as_str()))
    }

    /// Every visible key, deduplicated: the keys of each non-ignored
    /// sync-capable source plus the alias keys.
    pub fn list_sync(&self) -> Result<Vec<ConfigKey>> {
        let mut keys = KeySet::default();
        for registration in self.active_registrations() {
            keys.extend(registration.source.list_sync()?);
        }
        keys.extend(self.alias_keys());
        Ok(keys.into_vec())
    }

    /// Every visible key, deduplicated, including suspend-only sources.
    pub async fn list(&self) -> Result<Vec<ConfigKey>> {
        let mut keys = KeySet::default();
        for registration in self.active_registrations() {
            keys.extend(registration.source.list().await?);
        }
        keys.extend(self.alias_keys());
        Ok(keys.into_vec())
    }

    /// Resolves every visible key. Keys that resolve to nothing are omitted.
    ///
    /// This performs one full resolution per key.
    pub fn read_all_sync(&self) -> Result<HashMap<ConfigKey, V>> {
        let mut all = HashMap::new();
        for key in self.list_sync()? {
            if let Some(value) = self.resolve_sync(&key)? {
                all.insert(key, value);
            }
        }
        Ok(all)
    }

    /// Async counterpart of [`read_all_sync`](Self::read_all_sync).
    pub async fn read_all(&self) -> Result<HashMap<ConfigKey, V>> {
        let mut all = HashMap::new();
        for key in self.list().await? {
            if let Some(value) = self.resolve(&key).await? {
                all.insert(key, value);
            }
        }
        Ok(all)
    }

    /// Peeks at the live cached entity for a key without resolving anything.
    pub fn describe(&self, key: impl Into<ConfigKey>) -> Option<CachedEntity<V>> {
        let key = key.into();
        let now = self.clock.now();
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .filter(|entity| !entity.expiry.is_expired(now))
            .cloned()
    }

    /// Snapshot of every live cached value. Nothing is resolved.
    pub fn export(&self) -> HashMap<ConfigKey, V> {
        let now = self.clock.now();
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, entity)| !entity.expiry.is_expired(now))
            .map(|(key, entity)| (key.clone(), entity.value.clone()))
            .collect()
    }

    /// Empties the result cache.
    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Removes one key from the result cache. Returns `true` if it was cached.
    pub fn clear_cache_key(&self, key: impl Into<ConfigKey>) -> bool {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key.into())
            .is_some()
    }

    fn resolve_sync(&self, key: &ConfigKey) -> Result<Option<V>> {
        let (cached, mut floor) = match self.start(key) {
            Start::Hit(value) => return Ok(Some(value)),
            Start::Resolve { cached, floor } => (cached, floor),
        };
        let (keys, registrations) = self.plan(key);

        let mut winner = None;
        for source_key in &keys {
            for registration in &registrations {
                if !floor.admits(registration.options.priority) {
                    continue;
                }
                if let Some(fetched) = registration.source.read_sync(source_key)? {
                    floor = Floor::AtLeast(registration.options.priority);
                    winner = Some(Winner::new(fetched, registration));
                }
            }
        }
        Ok(self.settle(key, winner, cached))
    }

    async fn resolve(&self, key: &ConfigKey) -> Result<Option<V>> {
        let (cached, mut floor) = match self.start(key) {
            Start::Hit(value) => return Ok(Some(value)),
            Start::Resolve { cached, floor } => (cached, floor),
        };
        let (keys, registrations) = self.plan(key);

        let mut winner = None;
        for source_key in &keys {
            for registration in &registrations {
                if !floor.admits(registration.options.priority) {
                    continue;
                }
                if let Some(fetched) = registration.source.read(source_key).await? {
                    floor = Floor::AtLeast(registration.options.priority);
                    winner = Some(Winner::new(fetched, registration));
                }
            }
        }
        Ok(self.settle(key, winner, cached))
    }

    fn start(&self, key: &ConfigKey) -> Start<V> {
        let now = self.clock.now();
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            match cache.get(key) {
                None => {
                    return Start::Resolve {
                        cached: None,
                        floor: Floor::Open,
                    }
                }
                Some(entity) if !entity.expiry.is_expired(now) => {
                    if !self.cache_respects_priority {
                        tracing::trace!("Cache hit for key '{}'", key);
                        return Start::Hit(entity.value.clone());
                    }
                    return Start::Resolve {
                        cached: Some(entity.value.clone()),
                        floor: Floor::Above(entity.priority),
                    };
                }
                Some(_) => {}
            }
        }

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        if cache
            .get(key)
            .is_some_and(|entity| entity.expiry.is_expired(now))
        {
            tracing::debug!("Cached value for key '{}' expired", key);
            cache.remove(key);
        }
        Start::Resolve {
            cached: None,
            floor: Floor::Open,
        }
    }

    fn plan(&self, key: &ConfigKey) -> (Vec<ConfigKey>, Vec<Registration<V>>) {
        let keys = self
            .aliases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .unwrap_or_else(|| vec![key.clone()]);
        (keys, self.active_registrations())
    }

    // Snapshot first: ignore conditions run without any lock held.
    fn active_registrations(&self) -> Vec<Registration<V>> {
        let snapshot = self
            .registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        snapshot
            .into_iter()
            .filter(|registration| {
                let ignored = registration.options.is_ignored();
                if ignored {
                    tracing::debug!(
                        "Skipping source '{}': ignore condition is set",
                        registration.source.name()
                    );
                }
                !ignored
            })
            .collect()
    }

    fn alias_keys(&self) -> Vec<ConfigKey> {
        self.aliases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    fn settle(&self, key: &ConfigKey, winner: Option<Winner<V>>, cached: Option<V>) -> Option<V> {
        let Some(winner) = winner else {
            return cached;
        };
        let cache_length = winner
            .fetched
            .cache_length
            .or(winner.cache_length)
            .unwrap_or(self.default_cache_length);
        let expiry = cache_length.expiry_from(self.clock.now());
        tracing::debug!(
            "Resolved key '{}' from source '{}' (priority {}, {:?})",
            key,
            winner.source.name(),
            winner.priority,
            cache_length
        );

        let value = winner.fetched.value;
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                key.clone(),
                CachedEntity {
                    key: key.clone(),
                    value: value.clone(),
                    priority: winner.priority,
                    source: winner.source,
                    expiry,
                },
            );
        Some(value)
    }
}

impl Aggregator<ConfigValue> {
    /// Creates an aggregator with the stock sources: environment variables at
    /// priority 2 and, if it can be read, `config.yaml` from the OS
    /// configuration directory at priority 1.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use layercfg::service::Aggregator;
    ///
    /// # fn main() -> layercfg::domain::Result<()> {
    /// let config = Aggregator::with_defaults("myapp", "com.example")?;
    /// let level = config.read_sync("log.level")?;
    /// # Ok(())
    /// # }
    /// ```
    #[allow(unused_mut, unused_variables)]
    pub fn with_defaults(app_name: &str, qualifier: &str) -> Result<Self> {
        let mut builder = Self::builder();

        #[cfg(feature = "env")]
        {
            use crate::adapters::EnvVarAdapter;
            let env = Arc::new(EnvVarAdapter::new().lowercase_keys(true));
            builder = builder.with_source(SourceRef::blocking(env), SourceOptions::new().priority(2));
        }

        #[cfg(feature = "yaml")]
        {
            use crate::adapters::YamlFileAdapter;
            match YamlFileAdapter::from_default_location(app_name, qualifier) {
                Ok(adapter) => {
                    builder = builder.with_source(
                        SourceRef::blocking(Arc::new(adapter)),
                        SourceOptions::new().priority(1),
                    );
                }
                Err(e @ ConfigError::ParseError { .. }) => {
                    tracing::warn!("Ignoring unreadable default configuration file: {}", e);
                }
                Err(e) => {
                    tracing::debug!("No default configuration file: {}", e);
                }
            }
        }

        builder.build()
    }
}

impl<V> Default for Aggregator<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Aggregator<V>
where
    V: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources: Vec<String> = self
            .registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|r| format!("{}@{}", r.source.name(), r.options.priority))
            .collect();
        f.debug_struct("Aggregator")
            .field("name", &self.name)
            .field("sources", &sources)
            .field("cache_respects_priority", &self.cache_respects_priority)
            .field("default_cache_length", &self.default_cache_length)
            .finish()
    }
}

impl<V> Named for Aggregator<V>
where
    V: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }
}

impl<V> ConfigSource<V> for Aggregator<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &ConfigKey) -> Result<Option<V>> {
        self.resolve_sync(key)
    }

    fn all_keys(&self) -> Result<Vec<ConfigKey>> {
        self.list_sync()
    }

    fn get_all(&self) -> Result<HashMap<ConfigKey, V>> {
        self.read_all_sync()
    }
}

#[async_trait]
impl<V> AsyncConfigSource<V> for Aggregator<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get_async(&self, key: &ConfigKey) -> Result<Option<V>> {
        self.resolve(key).await
    }

    async fn all_keys_async(&self) -> Result<Vec<ConfigKey>> {
        self.list().await
    }

    async fn get_all_async(&self) -> Result<HashMap<ConfigKey, V>> {
        self.read_all().await
    }
}

// Insertion-ordered set of keys.
#[derive(Default)]
struct KeySet {
    seen: HashSet<ConfigKey>,
    keys: Vec<ConfigKey>,
}

impl KeySet {
    fn extend(&mut self, keys: impl IntoIterator<Item = ConfigKey>) {
        for key in keys {
            if self.seen.insert(key.clone()) {
                self.keys.push(key);
            }
        }
    }

    fn into_vec(self) -> Vec<ConfigKey> {
        self.keys
    }
}

/// Builder for constructing an [`Aggregator`].
///
/// # Examples
///
/// ```rust
/// use layercfg::domain::CacheLength;
/// use layercfg::service::AggregatorBuilder;
///
/// # fn main() -> layercfg::domain::Result<()> {
/// let config = AggregatorBuilder::new()
///     .with_env_prefix("MYAPP_")
///     .default_cache_length(CacheLength::millis(30_000))
///     .with_alias("port", ["server.port", "port"])
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct AggregatorBuilder<V = ConfigValue>
where
    V: Send + Sync + 'static,
{
    name: String,
    sources: Vec<(SourceRef<V>, SourceOptions)>,
    aliases: Vec<(ConfigKey, Vec<ConfigKey>)>,
    cache_respects_priority: bool,
    default_cache_length: CacheLength,
    clock: Arc<dyn Clock>,
}

impl<V> AggregatorBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            name: "aggregator".to_string(),
            sources: Vec::new(),
            aliases: Vec::new(),
            cache_respects_priority: false,
            default_cache_length: CacheLength::Forever,
            clock: Arc::new(SystemClock),
        }
    }

    /// Names the aggregator, for logs and for when it is nested as a source.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// When `true`, cached values are displaced by higher priority sources
    /// instead of being served without consulting any source.
    pub fn cache_respects_priority(mut self, enabled: bool) -> Self {
        self.cache_respects_priority = enabled;
        self
    }

    /// Cache length for values whose source and registration set none.
    pub fn default_cache_length(mut self, cache_length: CacheLength) -> Self {
        self.default_cache_length = cache_length;
        self
    }

    /// Clock used to judge expiry.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Adds a configuration source.
    pub fn with_source(mut self, source: SourceRef<V>, options: SourceOptions) -> Self {
        self.sources.push((source, options));
        self
    }

    /// Adds an alias resolving through `keys`.
    pub fn with_alias<K, I>(mut self, alias: impl Into<ConfigKey>, keys: I) -> Self
    where
        K: Into<ConfigKey>,
        I: IntoIterator<Item = K>,
    {
        self.aliases
            .push((alias.into(), keys.into_iter().map(Into::into).collect()));
        self
    }

    /// Builds the aggregator.
    pub fn build(self) -> Result<Aggregator<V>> {
        Ok(self.assemble())
    }

    fn assemble(self) -> Aggregator<V> {
        let aggregator = Aggregator {
            name: self.name,
            registrations: RwLock::new(Vec::new()),
            aliases: RwLock::new(HashMap::new()),
            cache: RwLock::new(HashMap::new()),
            cache_respects_priority: self.cache_respects_priority,
            default_cache_length: self.default_cache_length,
            clock: self.clock,
        };
        for (source, options) in self.sources {
            aggregator.add_source(source, options);
        }
        for (alias, keys) in self.aliases {
            aggregator.alias(alias, keys);
        }
        aggregator
    }
}

impl AggregatorBuilder<ConfigValue> {
    /// Adds environment variables (lowercased, underscores as dots) at priority 0.
    #[cfg(feature = "env")]
    pub fn with_env_vars(self) -> Self {
        use crate::adapters::EnvVarAdapter;
        let env = Arc::new(EnvVarAdapter::new().lowercase_keys(true));
        self.with_source(SourceRef::blocking(env), SourceOptions::new())
    }

    /// Adds environment variables starting with `prefix` at priority 0.
    #[cfg(feature = "env")]
    pub fn with_env_prefix(self, prefix: impl Into<String>) -> Self {
        use crate::adapters::EnvVarAdapter;
        let env = Arc::new(EnvVarAdapter::with_prefix(prefix).lowercase_keys(true));
        self.with_source(SourceRef::blocking(env), SourceOptions::new())
    }

    /// Adds a YAML file at priority 0.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use layercfg::service::AggregatorBuilder;
    ///
    /// # fn main() -> layercfg::domain::Result<()> {
    /// let config = AggregatorBuilder::new()
    ///     .with_yaml_file("/etc/myapp/config.yaml")?
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    #[cfg(feature = "yaml")]
    pub fn with_yaml_file(self, path: impl AsRef<std::path::Path>) -> Result<Self> {
        use crate::adapters::YamlFileAdapter;
        let adapter = Arc::new(YamlFileAdapter::from_file(path)?);
        Ok(self.with_source(SourceRef::blocking(adapter), SourceOptions::new()))
    }
}

impl<V> Default for AggregatorBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
