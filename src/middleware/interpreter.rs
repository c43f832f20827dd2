// SPDX-License-Identifier: MIT OR Apache-2.0

//! Value interpretation middleware.
//!
//! An [`Interpreter`] wraps a source of raw values and turns each one into an
//! application-level value through a user function. The function sees the key,
//! the inner source and the raw value (which may be absent) and answers with:
//!
//! - `Ok(Some(v))`: the interpreted value,
//! - `Ok(None)`: "nothing usable here", so an aggregator falls through to
//!   lower priority sources,
//! - `Err(e)`: a hard failure that aborts the whole resolution.
//!
//! The function runs exactly once per read; caching is the aggregator's job.
//! Interpretation never changes which keys exist, so key listings pass
//! through untouched.

use crate::domain::{CacheLength, ConfigKey, Fetched, Result};
use crate::ports::{AsyncConfigSource, ConfigSource, Named, SourceRef};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// What an interpretation function receives.
#[derive(Debug, Clone)]
pub struct RawEntry<I>
where
    I: Send + Sync + 'static,
{
    /// The key being read.
    pub key: ConfigKey,
    /// The source the raw value came from.
    pub source: SourceRef<I>,
    /// The raw value, or `None` when the inner source does not define the key.
    pub value: Option<I>,
}

type SyncFn<I, O> = Arc<dyn Fn(RawEntry<I>) -> Result<Option<Fetched<O>>> + Send + Sync>;
type AsyncFn<I, O> =
    Arc<dyn Fn(RawEntry<I>) -> BoxFuture<'static, Result<Option<Fetched<O>>>> + Send + Sync>;

/// A pair of interpretation functions, one per capability set.
///
/// A synchronous function alone serves both synchronous and asynchronous
/// reads. An asynchronous function alone makes the interpreter invisible to
/// synchronous callers.
pub struct Interpretation<I, O>
where
    I: Send + Sync + 'static,
{
    sync: Option<SyncFn<I, O>>,
    asynchronous: Option<AsyncFn<I, O>>,
}

impl<I, O> Interpretation<I, O>
where
    I: Send + Sync + 'static,
    O: Send + 'static,
{
    /// A synchronous function, also used for asynchronous reads.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(RawEntry<I>) -> Result<Option<O>> + Send + Sync + 'static,
    {
        Self::sync_expiring(move |entry| Ok(f(entry)?.map(Fetched::new)))
    }

    /// A synchronous function that may attach a cache length to its results.
    pub fn sync_expiring<F>(f: F) -> Self
    where
        F: Fn(RawEntry<I>) -> Result<Option<Fetched<O>>> + Send + Sync + 'static,
    {
        Self {
            sync: Some(Arc::new(f)),
            asynchronous: None,
        }
    }

    /// An asynchronous-only function.
    pub fn asynchronous<F, Fut>(f: F) -> Self
    where
        F: Fn(RawEntry<I>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<O>>> + Send + 'static,
    {
        Self::asynchronous_expiring(move |entry| {
            let fut = f(entry);
            async move { Ok(fut.await?.map(Fetched::new)) }
        })
    }

    /// An asynchronous-only function that may attach a cache length to its results.
    pub fn asynchronous_expiring<F, Fut>(f: F) -> Self
    where
        F: Fn(RawEntry<I>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Fetched<O>>>> + Send + 'static,
    {
        let f: AsyncFn<I, O> = Arc::new(move |entry| f(entry).boxed());
        Self {
            sync: None,
            asynchronous: Some(f),
        }
    }

    /// Adds (or replaces) the asynchronous function, keeping the synchronous one.
    pub fn with_async<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(RawEntry<I>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<O>>> + Send + 'static,
    {
        self.asynchronous = Self::asynchronous(f).asynchronous;
        self
    }

    /// Whether synchronous reads are interpreted at all.
    pub fn has_sync(&self) -> bool {
        self.sync.is_some()
    }
}

impl<I, O> Clone for Interpretation<I, O>
where
    I: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            sync: self.sync.clone(),
            asynchronous: self.asynchronous.clone(),
        }
    }
}

/// Middleware that interprets the values of an inner source.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::ManualSource;
/// use layercfg::middleware::Interpreter;
/// use layercfg::ports::{ConfigSource, SourceRef};
/// use std::sync::Arc;
///
/// let raw = Arc::new(ManualSource::new("raw").with_value("port", "8080"));
/// let ports = Interpreter::new(SourceRef::blocking(raw), |entry| {
///     Ok(entry.value.and_then(|v| v.parse::<u16>(entry.key.as_str()).ok()))
/// });
///
/// assert_eq!(ports.get_str("port").unwrap(), Some(8080));
/// ```
pub struct Interpreter<I, O>
where
    I: Send + Sync + 'static,
{
    name: String,
    inner: SourceRef<I>,
    interpretation: Interpretation<I, O>,
}

impl<I, O> Interpreter<I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    /// Interprets `inner` with a single synchronous function.
    pub fn new<F>(inner: SourceRef<I>, f: F) -> Self
    where
        F: Fn(RawEntry<I>) -> Result<Option<O>> + Send + Sync + 'static,
    {
        Self::with(inner, Interpretation::sync(f))
    }

    /// Interprets `inner` with an explicit [`Interpretation`].
    pub fn with(inner: SourceRef<I>, interpretation: Interpretation<I, O>) -> Self {
        Self {
            name: format!("interpret({})", inner.name()),
            inner,
            interpretation,
        }
    }

    /// Wraps the interpreter in a [`SourceRef`] declaring both capability sets.
    pub fn into_source(self) -> SourceRef<O> {
        SourceRef::dual(Arc::new(self))
    }

    fn entry(
        &self,
        key: &ConfigKey,
        raw: Option<Fetched<I>>,
    ) -> (RawEntry<I>, Option<CacheLength>) {
        let (value, inherited) = match raw {
            Some(fetched) => (Some(fetched.value), fetched.cache_length),
            None => (None, None),
        };
        (
            RawEntry {
                key: key.clone(),
                source: self.inner.clone(),
                value,
            },
            inherited,
        )
    }

    fn interpret_sync(
        &self,
        f: &SyncFn<I, O>,
        key: &ConfigKey,
        raw: Option<Fetched<I>>,
    ) -> Result<Option<Fetched<O>>> {
        let (entry, inherited) = self.entry(key, raw);
        Ok(f(entry)?.map(|fetched| inherit(fetched, inherited)))
    }

    async fn interpret_async(
        &self,
        key: &ConfigKey,
        raw: Option<Fetched<I>>,
    ) -> Result<Option<Fetched<O>>> {
        let (entry, inherited) = self.entry(key, raw);
        let result = match (&self.interpretation.asynchronous, &self.interpretation.sync) {
            (Some(f), _) => f(entry).await?,
            (None, Some(f)) => f(entry)?,
            (None, None) => None,
        };
        Ok(result.map(|fetched| inherit(fetched, inherited)))
    }
}

// A result without its own cache length keeps the inner source's.
fn inherit<O>(mut fetched: Fetched<O>, inherited: Option<CacheLength>) -> Fetched<O> {
    if fetched.cache_length.is_none() {
        fetched.cache_length = inherited;
    }
    fetched
}

impl<I, O> fmt::Debug for Interpreter<I, O>
where
    I: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("inner", &self.inner)
            .field("sync", &self.interpretation.sync.is_some())
            .field("async", &self.interpretation.asynchronous.is_some())
            .finish()
    }
}

impl<I, O> Named for Interpreter<I, O>
where
    I: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }
}

impl<I, O> ConfigSource<O> for Interpreter<I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    fn get(&self, key: &ConfigKey) -> Result<Option<O>> {
        Ok(self.lookup(key)?.map(Fetched::into_value))
    }

    fn all_keys(&self) -> Result<Vec<ConfigKey>> {
        self.inner.list_sync()
    }

    fn lookup(&self, key: &ConfigKey) -> Result<Option<Fetched<O>>> {
        let Some(f) = &self.interpretation.sync else {
            return Ok(None);
        };
        // A suspend-only inner source offers sync callers nothing, not even absence.
        if !self.inner.supports_sync() {
            return Ok(None);
        }
        let raw = self.inner.read_sync(key)?;
        self.interpret_sync(f, key, raw)
    }

    fn get_all(&self) -> Result<HashMap<ConfigKey, O>> {
        let Some(f) = &self.interpretation.sync else {
            return Ok(HashMap::new());
        };
        let mut raw = self.inner.read_all_sync()?;
        let mut all = HashMap::new();
        for key in self.inner.list_sync()? {
            let value = raw.remove(&key).map(Fetched::new);
            if let Some(fetched) = self.interpret_sync(f, &key, value)? {
                all.insert(key, fetched.value);
            }
        }
        Ok(all)
    }
}

#[async_trait]
impl<I, O> AsyncConfigSource<O> for Interpreter<I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    async fn get_async(&self, key: &ConfigKey) -> Result<Option<O>> {
        Ok(self.lookup_async(key).await?.map(Fetched::into_value))
    }

    async fn all_keys_async(&self) -> Result<Vec<ConfigKey>> {
        self.inner.list().await
    }

    async fn lookup_async(&self, key: &ConfigKey) -> Result<Option<Fetched<O>>> {
        let raw = self.inner.read(key).await?;
        self.interpret_async(key, raw).await
    }

    async fn get_all_async(&self) -> Result<HashMap<ConfigKey, O>> {
        let mut raw = self.inner.read_all().await?;
        let mut all = HashMap::new();
        for key in self.inner.list().await? {
            let value = raw.remove(&key).map(Fetched::new);
            if let Some(fetched) = self.interpret_async(&key, value).await? {
                all.insert(key, fetched.value);
            }
        }
        Ok(all)
    }
}
