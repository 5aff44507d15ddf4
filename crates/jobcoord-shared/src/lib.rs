//! # jobcoord-shared
//!
//! Building blocks shared by the coordinator and task-runner services:
//! the wire-level API types, the unified error taxonomy, and the
//! per-entity log plumbing.

pub mod error;
pub mod logging;
pub mod types;

pub use error::{CoordError, CoordResult};
