// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the interfaces the rest of the crate is written
//! against: the two source capability sets, the tagged [`SourceRef`] handle
//! used to register sources, and the document parser port.

pub mod parser;
pub mod source;

// Re-export commonly used types
pub use parser::ConfigParser;
pub use source::{AsyncConfigSource, ConfigSource, DualSource, Named, SourceRef};
