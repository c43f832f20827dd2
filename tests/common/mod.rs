// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared helpers for the integration tests.

use async_trait::async_trait;
use layercfg::adapters::ManualSource;
use layercfg::domain::{ConfigKey, ConfigValue, Result};
use layercfg::ports::{AsyncConfigSource, ConfigSource, Named};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A blocking source that counts how often it is read.
#[allow(dead_code)]
#[derive(Debug)]
pub struct CountingSource {
    values: ManualSource,
    reads: AtomicUsize,
}

#[allow(dead_code)]
impl CountingSource {
    pub fn new(name: &str) -> Self {
        Self {
            values: ManualSource::new(name),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.values.set(key, value);
        self
    }

    pub fn set(&self, key: &str, value: &str) {
        self.values.set(key, value);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Named for CountingSource {
    fn name(&self) -> &str {
        self.values.name()
    }
}

impl ConfigSource for CountingSource {
    fn get(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.values.get(key)
    }

    fn all_keys(&self) -> Result<Vec<ConfigKey>> {
        self.values.all_keys()
    }
}

/// A source that only implements the may-suspend capability set.
#[allow(dead_code)]
#[derive(Debug)]
pub struct SuspendingSource {
    values: ManualSource,
}

#[allow(dead_code)]
impl SuspendingSource {
    pub fn new(name: &str) -> Self {
        Self {
            values: ManualSource::new(name),
        }
    }

    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.values.set(key, value);
        self
    }
}

impl Named for SuspendingSource {
    fn name(&self) -> &str {
        self.values.name()
    }
}

#[async_trait]
impl AsyncConfigSource for SuspendingSource {
    async fn get_async(&self, key: &ConfigKey) -> Result<Option<ConfigValue>> {
        tokio::task::yield_now().await;
        self.values.get(key)
    }

    async fn all_keys_async(&self) -> Result<Vec<ConfigKey>> {
        tokio::task::yield_now().await;
        self.values.all_keys()
    }
}

/// Shorthand for a present text value.
#[allow(dead_code)]
pub fn text(s: &str) -> Option<ConfigValue> {
    Some(ConfigValue::from(s))
}

/// Routes `tracing` output to the test harness. Safe to call repeatedly.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}
