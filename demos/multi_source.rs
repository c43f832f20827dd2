// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-source configuration example.
//!
//! This example demonstrates:
//! - Registering several sources with different priorities
//! - Flattening per-section YAML tables with an `Upleveler`
//! - Renaming keys with an `Aliaser` and an aggregator-level alias
//! - Typed reads through an `Interpreter` over the whole aggregator
//!
//! To run this example:
//! ```bash
//! # Environment variables with the DEMO_ prefix override the YAML file
//! export DEMO_LOG_LEVEL="debug"
//!
//! cargo run --example multi_source
//! ```

use layercfg::adapters::KeyLayout;
use layercfg::interpret;
use layercfg::middleware::UplevelCache;
use layercfg::prelude::*;
use std::sync::Arc;

fn main() -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    println!("=== layercfg: Multi-Source Example ===\n");

    // The document keeps one table per section. `site` overrides `defaults`.
    let yaml_content = r#"
site:
  listen_port: "9090"
  name: "edge-1"

defaults:
  listen_port: "8080"
  log.level: "info"
  workers: "4"
"#;

    let temp_file = tempfile::NamedTempFile::new()?;
    std::fs::write(temp_file.path(), yaml_content)?;
    println!("Created temporary YAML config file at: {:?}\n", temp_file.path());

    // Sections become top-level keys, `site` first so it wins collisions.
    let yaml = YamlFileAdapter::from_file(temp_file.path())?.layout(KeyLayout::Nested);
    let flat = Upleveler::new(SourceRef::blocking(Arc::new(yaml)))
        .only(["site", "defaults"])
        .cache(UplevelCache::Forever)
        .into_source();

    // Expose `listen_port` as `port` and hide the original name.
    let file = Aliaser::new(flat, Passthrough::Partial)
        .alias("port", "listen_port")
        .into_source();

    let vars = Arc::new(EnvVarAdapter::with_prefix("DEMO_").lowercase_keys(true));
    let overrides = Arc::new(ManualSource::new("overrides"));

    // Priority order (highest to lowest):
    //   1. Manual overrides (priority 10)
    //   2. Environment variables (priority 2)
    //   3. YAML file (priority 1)
    let config = Aggregator::builder()
        .name("demo")
        .with_source(file, SourceOptions::new().priority(1))
        .with_source(SourceRef::blocking(vars), SourceOptions::new().priority(2))
        .with_source(
            SourceRef::blocking(overrides.clone()),
            SourceOptions::new().priority(10),
        )
        .with_alias("server.port", ["port"])
        .build()?;

    println!("Resolved values:");
    for key in ["name", "port", "server.port", "workers", "log.level"] {
        let value = config.read_sync(key)?;
        let source = config
            .describe(key)
            .map(|entity| format!("{} @ {}", entity.source.name(), entity.priority))
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<12} = {:<10} ({})", key, show(value), source);
    }

    // An override only shows up once the cached value is dropped.
    overrides.set("workers", "16");
    println!("\nAfter setting an override for 'workers':");
    println!("  cached      = {}", show(config.read_sync("workers")?));
    config.clear_cache_key("workers");
    println!("  refreshed   = {}", show(config.read_sync("workers")?));

    // Typed view over the whole aggregator.
    let typed = Interpreter::new(config.into_source(), interpret::parsed::<u16>());
    println!("\nTyped reads:");
    println!("  port as u16    = {:?}", typed.get_str("port")?);
    println!("  workers as u16 = {:?}", typed.get_str("workers")?);
    println!("  name as u16    = {:?}", typed.get_str("name")?);

    println!("\n=== Example Complete ===");
    Ok(())
}

fn show(value: Option<ConfigValue>) -> String {
    value
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_else(|| "<unset>".to_string())
}
