// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core types.
//!
//! This module contains the keys, values, errors and cache vocabulary used
//! throughout the library. It has no knowledge of any concrete source.

pub mod cache;
pub mod clock;
pub mod config_key;
pub mod config_value;
pub mod errors;

// Re-export commonly used types
pub use cache::{CacheLength, Expiry, Fetched};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config_key::ConfigKey;
pub use config_value::ConfigValue;
pub use errors::{ConfigError, Result};
