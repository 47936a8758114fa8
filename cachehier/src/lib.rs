//! # CacheHier
//!
//! CacheHier simulates a hierarchy of CPU caches against a memory access trace, reporting which
//! accesses hit at each level and how many fall through to main memory
//!
//! It provides a generic cache implementation which is parameterised by a replacement policy
//! (round robin, least recently used, or least frequently used), and a simulator which splits
//! accesses into cache lines and walks the hierarchy for each of them
//!
//! While designed to accommodate high performance, it prioritises flexibility, being easy to
//! maintain and expand with new policies

/// Contains the implementation of the cache, and a utility enum for the existing cache types
pub mod cache;

/// Contains definitions for the JSON input format
pub mod config;

/// Error type shared by the library
pub mod error;

/// Derives the shape of a cache and splits addresses into tag, set index, and offset
pub mod geometry;

/// Opening trace files
pub mod io;

/// Contains the per line storage shared by every cache
pub mod line;

/// Tag to line lookup strategies
pub mod lookup;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Renders simulation results as JSON or console text
pub mod report;

/// Contains the simulator used to replay a trace against a cache configuration
pub mod simulator;

/// Decoding of textual memory access traces
pub mod trace;

/// Contains utilities for generating traces in tests and benchmarks.
pub mod util;

// Generated from the build.rs, private
mod hex {
    include!(concat!(env!("OUT_DIR"), "/hex.rs"));
}
#[cfg(test)]
mod test;

pub use error::{Error, Result};
