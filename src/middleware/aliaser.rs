// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key aliasing middleware.

use crate::domain::{ConfigKey, Fetched, Result};
use crate::ports::{AsyncConfigSource, ConfigSource, Named, SourceRef};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Which inner keys stay visible next to their aliases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Passthrough {
    /// Every inner key stays readable; aliases are extra names.
    #[default]
    Full,
    /// Inner keys that are alias targets are hidden; other keys pass through.
    Partial,
    /// Only aliases are visible.
    AliasesOnly,
}

/// Middleware that exposes inner keys under alternate names.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::ManualSource;
/// use layercfg::domain::ConfigValue;
/// use layercfg::middleware::{Aliaser, Passthrough};
/// use layercfg::ports::{ConfigSource, SourceRef};
/// use std::sync::Arc;
///
/// let raw = Arc::new(ManualSource::new("raw").with_value("X", "val"));
/// let aliased = Aliaser::new(SourceRef::blocking(raw), Passthrough::AliasesOnly)
///     .alias("Y", "X");
///
/// assert_eq!(aliased.get_str("Y").unwrap(), Some(ConfigValue::from("val")));
/// assert_eq!(aliased.get_str("X").unwrap(), None);
/// ```
#[derive(Debug)]
pub struct Aliaser<V>
where
    V: Send + Sync + 'static,
{
    name: String,
    inner: SourceRef<V>,
    /// alias -> inner key
    aliases: BTreeMap<ConfigKey, ConfigKey>,
    targets: HashSet<ConfigKey>,
    passthrough: Passthrough,
}

impl<V> Aliaser<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates an aliaser with no aliases yet.
    pub fn new(inner: SourceRef<V>, passthrough: Passthrough) -> Self {
        Self {
            name: format!("alias({})", inner.name()),
            inner,
            aliases: BTreeMap::new(),
            targets: HashSet::new(),
            passthrough,
        }
    }

    /// Creates an aliaser from an `alias -> inner key` map.
    pub fn with_aliases<A, K, I>(inner: SourceRef<V>, aliases: I, passthrough: Passthrough) -> Self
    where
        A: Into<ConfigKey>,
        K: Into<ConfigKey>,
        I: IntoIterator<Item = (A, K)>,
    {
        aliases
            .into_iter()
            .fold(Self::new(inner, passthrough), |aliaser, (alias, key)| {
                aliaser.alias(alias, key)
            })
    }

    /// Adds an alias, builder style. Re-aliasing a name replaces its target.
    pub fn alias(mut self, alias: impl Into<ConfigKey>, key: impl Into<ConfigKey>) -> Self {
        self.aliases.insert(alias.into(), key.into());
        self.targets = self.aliases.values().cloned().collect();
        self
    }

    /// The passthrough policy.
    pub fn passthrough(&self) -> Passthrough {
        self.passthrough
    }

    /// Wraps the aliaser in a [`SourceRef`] declaring both capability sets.
    pub fn into_source(self) -> SourceRef<V> {
        SourceRef::dual(Arc::new(self))
    }

    /// Maps an outer key to the inner key it reads, if any.
    fn target<'a>(&'a self, key: &'a ConfigKey) -> Option<&'a ConfigKey> {
        if let Some(target) = self.aliases.get(key) {
            return Some(target);
        }
        match self.passthrough {
            Passthrough::Full => Some(key),
            Passthrough::Partial if !self.targets.contains(key) => Some(key),
            Passthrough::Partial | Passthrough::AliasesOnly => None,
        }
    }

    fn visible_keys(&self, inner_keys: Vec<ConfigKey>) -> Vec<ConfigKey> {
        let passthrough: Vec<ConfigKey> = match self.passthrough {
            Passthrough::Full => inner_keys,
            Passthrough::Partial => inner_keys
                .into_iter()
                .filter(|k| !self.targets.contains(k))
                .collect(),
            Passthrough::AliasesOnly => Vec::new(),
        };
        let mut seen = HashSet::new();
        passthrough
            .into_iter()
            .chain(self.aliases.keys().cloned())
            .filter(|k| seen.insert(k.clone()))
            .collect()
    }

    fn visible_entries(&self, mut inner: HashMap<ConfigKey, V>) -> HashMap<ConfigKey, V> {
        let mut visible = HashMap::new();
        for (alias, target) in &self.aliases {
            if let Some(value) = inner.get(target) {
                visible.insert(alias.clone(), value.clone());
            }
        }
        match self.passthrough {
            Passthrough::Full => {}
            Passthrough::Partial => inner.retain(|k, _| !self.targets.contains(k)),
            Passthrough::AliasesOnly => inner.clear(),
        }
        // An alias shadows an inner key of the same name, even when its target is unset.
        for (key, value) in inner {
            if !self.aliases.contains_key(&key) {
                visible.insert(key, value);
            }
        }
        visible
    }
}

impl<V> Named for Aliaser<V>
where
    V: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }
}

impl<V> ConfigSource<V> for Aliaser<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &ConfigKey) -> Result<Option<V>> {
        Ok(self.lookup(key)?.map(Fetched::into_value))
    }

    fn all_keys(&self) -> Result<Vec<ConfigKey>> {
        Ok(self.visible_keys(self.inner.list_sync()?))
    }

    fn lookup(&self, key: &ConfigKey) -> Result<Option<Fetched<V>>> {
        match self.target(key) {
            Some(target) => self.inner.read_sync(target),
            None => Ok(None),
        }
    }

    fn get_all(&self) -> Result<HashMap<ConfigKey, V>> {
        Ok(self.visible_entries(self.inner.read_all_sync()?))
    }
}

#[async_trait]
impl<V> AsyncConfigSource<V> for Aliaser<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get_async(&self, key: &ConfigKey) -> Result<Option<V>> {
        Ok(self.lookup_async(key).await?.map(Fetched::into_value))
    }

    async fn all_keys_async(&self) -> Result<Vec<ConfigKey>> {
        Ok(self.visible_keys(self.inner.list().await?))
    }

    async fn lookup_async(&self, key: &ConfigKey) -> Result<Option<Fetched<V>>> {
        match self.target(key) {
            Some(target) => self.inner.read(target).await,
            None => Ok(None),
        }
    }

    async fn get_all_async(&self) -> Result<HashMap<ConfigKey, V>> {
        Ok(self.visible_entries(self.inner.read_all().await?))
    }
}
