// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing configuration source implementations.
//!
//! This module contains concrete implementations of the source traits
//! defined in the ports layer. Each adapter provides configuration from one
//! kind of origin; the aggregator and the middleware only ever see the traits.

#[cfg(feature = "env")]
pub mod env_var;
pub mod manual;
#[cfg(feature = "yaml")]
pub mod yaml_file;

// Re-export adapters based on feature flags
#[cfg(feature = "env")]
pub use env_var::EnvVarAdapter;
pub use manual::ManualSource;
#[cfg(feature = "yaml")]
pub use yaml_file::{KeyLayout, YamlFileAdapter, YamlParser};
