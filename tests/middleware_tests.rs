// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for middleware composition.

mod common;

use common::{text, SuspendingSource};
use layercfg::domain::{ConfigKey, ConfigValue, ManualClock};
use layercfg::interpret;
use layercfg::middleware::{Interpretation, RawEntry, UplevelCache};
use layercfg::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_aliaser_without_passthrough() {
    let raw = Arc::new(ManualSource::new("raw").with_value("X", "val"));
    let aliased = Aliaser::new(SourceRef::blocking(raw), Passthrough::AliasesOnly).alias("Y", "X");

    assert_eq!(aliased.get_str("Y").unwrap(), text("val"));
    assert_eq!(aliased.get_str("X").unwrap(), None);
}

#[test]
fn test_upleveler_stale_window() {
    common::init_tracing();
    let clock = ManualClock::new();
    let raw = Arc::new(
        ManualSource::new("raw").with_value("cfg", ConfigValue::table([("a", "1"), ("b", "2")])),
    );
    let flat = Upleveler::new(SourceRef::blocking(raw.clone())).clock(Arc::new(clock.clone()));

    assert_eq!(flat.get_str("a").unwrap(), text("1"));
    raw.set("cfg", ConfigValue::table([("a", "9")]));
    assert_eq!(flat.get_str("a").unwrap(), text("1"));

    clock.advance(Duration::from_millis(10_000));
    assert_eq!(flat.get_str("a").unwrap(), text("9"));
}

#[test]
fn test_uplevel_then_alias_then_interpret() {
    let doc = ConfigValue::table([("listen_port", "8080"), ("debug", "yes")]);
    let raw = Arc::new(ManualSource::new("file").with_value("server", doc));

    let flat = Upleveler::new(SourceRef::blocking(raw))
        .cache(UplevelCache::Disabled)
        .into_source();
    let aliased = Aliaser::new(flat, Passthrough::Partial)
        .alias("port", "listen_port")
        .into_source();
    let ports = Interpreter::new(aliased, interpret::parsed::<u16>());

    assert_eq!(ports.get_str("port").unwrap(), Some(8080));
    assert_eq!(ports.get_str("listen_port").unwrap(), None);
    assert_eq!(ports.get_str("debug").unwrap(), None);
    assert_eq!(ports.name(), "interpret(alias(uplevel(file)))");

    let mut keys = ports.all_keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec![ConfigKey::from("debug"), ConfigKey::from("port")]);
}

#[test]
fn test_mapper_strips_prefix_for_aggregator() {
    let raw = Arc::new(
        ManualSource::new("raw")
            .with_value("APP_DB_HOST", "db")
            .with_value("HOME", "/root"),
    );
    let mapped = Mapper::new(SourceRef::blocking(raw), |key| {
        key.as_str()
            .strip_prefix("APP_")
            .map(|rest| ConfigKey::from(rest.to_lowercase().replace('_', ".")))
    });
    let config = Aggregator::builder()
        .with_source(mapped.into_source(), SourceOptions::new())
        .build()
        .unwrap();

    assert_eq!(config.read_sync("db.host").unwrap(), text("db"));
    assert_eq!(config.read_sync("HOME").unwrap(), None);
    assert_eq!(config.list_sync().unwrap(), vec![ConfigKey::from("db.host")]);
}

#[tokio::test]
async fn test_async_interpretation_over_suspending_source() {
    let slow = Arc::new(SuspendingSource::new("remote").with_value("token", "abc"));
    let upper = Interpreter::with(
        SourceRef::suspending(slow),
        Interpretation::asynchronous(|entry: RawEntry<ConfigValue>| async move {
            Ok(entry
                .value
                .and_then(|v| v.as_str().map(str::to_uppercase)))
        }),
    );
    let config: Aggregator<String> = Aggregator::builder()
        .with_source(upper.into_source(), SourceOptions::new())
        .build()
        .unwrap();

    assert_eq!(config.read_sync("token").unwrap(), None);
    assert_eq!(config.read("token").await.unwrap(), Some("ABC".to_string()));
}

#[test]
fn test_interpreter_over_aggregator() {
    let raw = Arc::new(ManualSource::new("raw").with_value("flags", "a, b ,c"));
    let inner = Aggregator::builder()
        .with_source(SourceRef::blocking(raw), SourceOptions::new())
        .build()
        .unwrap();
    let lists = Interpreter::new(inner.into_source(), interpret::list(','));

    assert_eq!(
        lists.get_str("flags").unwrap(),
        Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
    );
}

fn winner(value: Option<ConfigValue>) -> String {
    value
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_default()
}

#[test]
fn test_collisions_resolve_the_same_on_every_build() {
    let mut uplevel_winners = std::collections::HashSet::new();
    let mut mapper_winners = std::collections::HashSet::new();

    for _ in 0..64 {
        let docs = Arc::new(
            ManualSource::new("docs")
                .with_value("two", ConfigValue::table([("shared", "from-two")]))
                .with_value("one", ConfigValue::table([("shared", "from-one")])),
        );
        let flat = Upleveler::new(SourceRef::blocking(docs)).cache(UplevelCache::Disabled);
        uplevel_winners.insert(winner(flat.get_str("shared").unwrap()));

        let raw = Arc::new(
            ManualSource::new("raw")
                .with_value("key", "second")
                .with_value("KEY", "first"),
        );
        let mapped = Mapper::new(SourceRef::blocking(raw), |key| {
            Some(ConfigKey::from(key.as_str().to_lowercase()))
        });
        mapper_winners.insert(winner(mapped.get_str("key").unwrap()));
    }

    assert_eq!(uplevel_winners.len(), 1);
    assert!(uplevel_winners.contains("from-one"));
    assert_eq!(mapper_winners.len(), 1);
    assert!(mapper_winners.contains("first"));
}
