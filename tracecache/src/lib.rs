//! # TraceCache
//!
//! TraceCache is a library for replaying memory access traces against a set-associative cache
//!
//! It provides a cache model parameterised by a replacement policy, a simulator which classifies
//! every access as a hit, compulsory miss or conflict miss while charging a flat cycle cost, and
//! the derived hit rate, CPI and unused capacity figures for a finished run
//!
//! One `Simulator` corresponds to one trace. Simulating several traces means building several
//! simulators, no cache state is shared between them

/// Contains the cache store, the lookup result type and a utility enum over the provided policies
pub mod cache;

/// Contains the cache configuration, which can be deserialised from JSON or built from the
/// command line, and the memory size parser
pub mod config;

/// Contains the error types of the library
pub mod error;

/// Contains the address geometry (tag, index and offset widths) and the address decoder
pub mod geometry;

/// Contains the trace file reader used by the binary
pub mod io;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Contains the simulator used to replay a trace with a given cache configuration
pub mod simulator;

/// Contains the statistics collected during a run and the metrics derived from them
pub mod stats;

/// Contains the access event types and the trace line parser
pub mod trace;

#[cfg(test)]
mod test;

/// Contains utilities for running the fixture tests and benchmarks.
pub mod util;
