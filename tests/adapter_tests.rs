// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the stock adapters behind an aggregator.

mod common;

use common::text;
use layercfg::prelude::*;
use std::env;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Helper to set and clean up environment variables
struct EnvGuard {
    keys: Vec<String>,
}

impl EnvGuard {
    fn new() -> Self {
        EnvGuard { keys: Vec::new() }
    }

    fn set(&mut self, key: &str, value: &str) {
        env::set_var(key, value);
        self.keys.push(key.to_string());
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in &self.keys {
            env::remove_var(key);
        }
    }
}

fn yaml_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[test]
#[cfg(all(feature = "env", feature = "yaml"))]
fn test_env_over_yaml_by_priority() {
    let mut guard = EnvGuard::new();
    guard.set("LCADAPT_DATABASE_HOST", "env-host");

    let file = yaml_file("database:\n  host: yaml-host\n  port: 5432\n");
    let yaml = Arc::new(YamlFileAdapter::from_file(file.path()).unwrap());
    let vars = Arc::new(EnvVarAdapter::with_prefix("LCADAPT_").lowercase_keys(true));

    let config = Aggregator::builder()
        .with_source(SourceRef::blocking(yaml), SourceOptions::new().priority(1))
        .with_source(SourceRef::blocking(vars), SourceOptions::new().priority(2))
        .build()
        .unwrap();

    assert_eq!(config.read_sync("database.host").unwrap(), text("env-host"));
    assert_eq!(config.read_sync("database.port").unwrap(), text("5432"));
    assert_eq!(
        config.describe("database.port").unwrap().source.name(),
        "yaml-file"
    );
}

#[test]
#[cfg(feature = "yaml")]
fn test_builder_with_yaml_file() {
    let file = yaml_file("app:\n  name: demo\n  debug: true\n");
    let config = AggregatorBuilder::new()
        .with_yaml_file(file.path())
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(config.read_sync("app.name").unwrap(), text("demo"));
    assert!(config.require_sync("app.debug").unwrap().as_bool("app.debug").unwrap());

    let mut keys = config.list_sync().unwrap();
    keys.sort();
    assert_eq!(keys, vec![ConfigKey::from("app.debug"), ConfigKey::from("app.name")]);
}

#[test]
#[cfg(feature = "yaml")]
fn test_builder_with_missing_yaml_file() {
    let result = AggregatorBuilder::new().with_yaml_file("/nonexistent/layercfg/config.yaml");
    assert!(matches!(result, Err(ConfigError::SourceError { .. })));
}

#[test]
#[cfg(feature = "yaml")]
fn test_nested_yaml_through_upleveler() {
    use layercfg::adapters::KeyLayout;

    let file = yaml_file("defaults:\n  color: blue\n  size: m\nsite:\n  color: red\n");
    let nested = YamlFileAdapter::from_file(file.path())
        .unwrap()
        .layout(KeyLayout::Nested);
    let flat = Upleveler::new(SourceRef::blocking(Arc::new(nested))).only(["site", "defaults"]);

    let config = Aggregator::builder()
        .with_source(flat.into_source(), SourceOptions::new())
        .build()
        .unwrap();

    assert_eq!(config.read_sync("color").unwrap(), text("red"));
    assert_eq!(config.read_sync("size").unwrap(), text("m"));
}

#[test]
#[cfg(feature = "yaml")]
fn test_yaml_reload_is_seen_after_cache_clear() {
    let file = yaml_file("level: info\n");
    let yaml = Arc::new(YamlFileAdapter::from_file(file.path()).unwrap());
    let config = Aggregator::builder()
        .with_source(SourceRef::blocking(yaml.clone()), SourceOptions::new())
        .build()
        .unwrap();
    assert_eq!(config.read_sync("level").unwrap(), text("info"));

    std::fs::write(file.path(), "level: debug\n").unwrap();
    yaml.reload().unwrap();

    assert_eq!(config.read_sync("level").unwrap(), text("info"));
    config.clear_cache();
    assert_eq!(config.read_sync("level").unwrap(), text("debug"));
}

#[test]
#[cfg(feature = "env")]
fn test_builder_with_env_prefix() {
    let mut guard = EnvGuard::new();
    guard.set("LCBUILD_SERVER_PORT", "9000");

    let config = AggregatorBuilder::new()
        .with_env_prefix("LCBUILD_")
        .build()
        .unwrap();

    assert_eq!(config.read_sync("server.port").unwrap(), text("9000"));
    assert_eq!(config.source_count(), 1);
}

#[test]
#[cfg(feature = "env")]
fn test_env_gated_source() {
    let mut guard = EnvGuard::new();
    guard.set("LCGATE_MODE", "env");

    let overrides = Arc::new(ManualSource::new("overrides").with_value("mode", "manual"));
    let vars = Arc::new(EnvVarAdapter::with_prefix("LCGATE_").lowercase_keys(true));
    let config = Aggregator::builder()
        .with_source(SourceRef::blocking(vars), SourceOptions::new())
        .with_source(
            SourceRef::blocking(overrides),
            SourceOptions::new()
                .priority(1)
                .ignore_if(|| env::var("LCGATE_DISABLE_OVERRIDES").is_ok()),
        )
        .build()
        .unwrap();

    assert_eq!(config.read_sync("mode").unwrap(), text("manual"));

    guard.set("LCGATE_DISABLE_OVERRIDES", "1");
    config.clear_cache();
    assert_eq!(config.read_sync("mode").unwrap(), text("env"));
}

#[test]
#[cfg(feature = "env")]
fn test_with_defaults_reads_environment() {
    let mut guard = EnvGuard::new();
    guard.set("LCDEFAULTS_MARKER", "present");

    let config = Aggregator::with_defaults("layercfg-test-app", "org.layercfg.test").unwrap();
    assert!(config.source_count() >= 1);
    assert_eq!(config.read_sync("lcdefaults.marker").unwrap(), text("present"));
}
