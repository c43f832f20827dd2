// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer containing the resolution engine.
//!
//! The [`Aggregator`] is the main entry point of the library: it merges the
//! registered sources into one lookup surface with priorities, caching and
//! aliases.

pub mod aggregator;

// Re-export commonly used types
pub use aggregator::{Aggregator, AggregatorBuilder, CachedEntity, SourceEdit, SourceOptions};
