// SPDX-License-Identifier: MIT OR Apache-2.0

//! Middleware sources.
//!
//! Each middleware wraps another source through a [`SourceRef`](crate::ports::SourceRef)
//! and is itself a source, so they nest freely: an aliaser over an
//! interpreter over an upleveler over a file is just another source to the
//! aggregator.

pub mod aliaser;
pub mod interpreter;
pub mod mapper;
pub mod upleveler;

pub use aliaser::{Aliaser, Passthrough};
pub use interpreter::{Interpretation, Interpreter, RawEntry};
pub use mapper::Mapper;
pub use upleveler::{UplevelCache, Upleveler};
