// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache lifetime vocabulary shared by sources, middleware and the aggregator.

use std::time::{Duration, Instant};

/// How long a resolved value may be served from a cache.
///
/// # Examples
///
/// ```
/// use layercfg::domain::CacheLength;
/// use std::time::Duration;
///
/// assert_eq!(CacheLength::millis(1500), CacheLength::For(Duration::from_millis(1500)));
/// assert_eq!(CacheLength::default(), CacheLength::Forever);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheLength {
    /// Never expires.
    #[default]
    Forever,
    /// Expires once the duration has elapsed. A zero duration is stale on the
    /// very next access.
    For(Duration),
}

impl CacheLength {
    /// Shorthand for `CacheLength::For(Duration::from_millis(ms))`.
    pub fn millis(ms: u64) -> Self {
        CacheLength::For(Duration::from_millis(ms))
    }

    /// Computes the absolute expiry of an entry stored at `now`.
    pub fn expiry_from(self, now: Instant) -> Expiry {
        match self {
            CacheLength::Forever => Expiry::Never,
            // An instant too far in the future to represent is as good as never.
            CacheLength::For(d) => now.checked_add(d).map_or(Expiry::Never, Expiry::At),
        }
    }
}

/// Absolute expiry of a cached entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expiry {
    /// The entry never goes stale.
    Never,
    /// The entry is stale at or after this instant.
    At(Instant),
}

impl Expiry {
    /// Returns `true` if the entry is stale at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(at) => *at <= now,
        }
    }
}

/// A value returned by a source lookup, with an optional result-level cache
/// length that overrides the registration and aggregator defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fetched<V> {
    /// The value itself.
    pub value: V,
    /// Result-level cache length, if the producer asked for one.
    pub cache_length: Option<CacheLength>,
}

impl<V> Fetched<V> {
    /// Wraps a value with no cache preference.
    pub fn new(value: V) -> Self {
        Self {
            value,
            cache_length: None,
        }
    }

    /// Wraps a value that should be cached for exactly `cache_length`.
    pub fn expiring(value: V, cache_length: CacheLength) -> Self {
        Self {
            value,
            cache_length: Some(cache_length),
        }
    }

    /// Transforms the value, keeping the cache preference.
    pub fn map<U>(self, f: impl FnOnce(V) -> U) -> Fetched<U> {
        Fetched {
            value: f(self.value),
            cache_length: self.cache_length,
        }
    }

    /// Discards the cache preference.
    pub fn into_value(self) -> V {
        self.value
    }
}

impl<V> From<V> for Fetched<V> {
    fn from(value: V) -> Self {
        Fetched::new(value)
    }
}
