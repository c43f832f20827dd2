// SPDX-License-Identifier: MIT OR Apache-2.0

//! A layered configuration aggregator.
//!
//! This crate merges key/value configuration from several sources
//! (environment variables, YAML files, in-memory overrides, other
//! aggregators) into one lookup surface, resolving conflicts by priority and
//! caching the outcome per key.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: Core types (`ConfigKey`, `ConfigValue`, errors, cache lengths, clocks)
//! - **Ports**: The source contract (`ConfigSource`, `AsyncConfigSource`, `SourceRef`) and the parser port
//! - **Adapters**: Concrete sources (manual overrides, env vars, YAML files)
//! - **Middleware**: Sources wrapping sources (`Interpreter`, `Aliaser`, `Mapper`, `Upleveler`)
//! - **Service**: The resolution engine (`Aggregator`)
//!
//! A source declares which capability set it implements: [`ports::ConfigSource`]
//! never blocks, [`ports::AsyncConfigSource`] may suspend. Middleware and the
//! aggregator implement both, so any of them can be nested inside another.
//!
//! # Feature Flags
//!
//! - `yaml`: Enable YAML file support (default)
//! - `env`: Enable environment variable support (default)
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust
//! use layercfg::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<()> {
//! let defaults = Arc::new(ManualSource::new("defaults").with_value("server.port", "8080"));
//! let overrides = Arc::new(ManualSource::new("overrides"));
//!
//! let config = Aggregator::builder()
//!     .with_source(SourceRef::blocking(defaults), SourceOptions::new())
//!     .with_source(SourceRef::blocking(overrides.clone()), SourceOptions::new().priority(10))
//!     .with_alias("port", ["server.port"])
//!     .build()?;
//!
//! assert_eq!(config.require_sync("port")?.as_u32("port")?, 8080);
//!
//! overrides.set("server.port", "9090");
//! config.clear_cache();
//! assert_eq!(config.require_sync("server.port")?.as_u32("server.port")?, 9090);
//! # Ok(())
//! # }
//! ```
//!
//! # Interpretation
//!
//! ```rust
//! use layercfg::prelude::*;
//! use layercfg::interpret;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<()> {
//! let raw = Arc::new(ManualSource::new("raw").with_value("workers", "4"));
//! let typed = Interpreter::new(SourceRef::blocking(raw), interpret::parsed::<usize>());
//!
//! let config: Aggregator<usize> = Aggregator::builder()
//!     .with_source(typed.into_source(), SourceOptions::new())
//!     .build()?;
//!
//! assert_eq!(config.read_sync("workers")?, Some(4));
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod interpret;
pub mod middleware;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::adapters::ManualSource;
    pub use crate::domain::{CacheLength, ConfigError, ConfigKey, ConfigValue, Fetched, Result};
    pub use crate::middleware::{Aliaser, Interpretation, Interpreter, Mapper, Passthrough, Upleveler};
    pub use crate::ports::{AsyncConfigSource, ConfigSource, Named, SourceRef};
    pub use crate::service::{Aggregator, AggregatorBuilder, SourceEdit, SourceOptions};

    // Re-export adapters based on feature flags
    #[cfg(feature = "env")]
    pub use crate::adapters::EnvVarAdapter;
    #[cfg(feature = "yaml")]
    pub use crate::adapters::{YamlFileAdapter, YamlParser};
}
