//! Benchmark support crate for vicinity.
//!
//! Provides seeded synthetic candidates and parameter types used by the
//! Criterion benchmarks for top-K search and descriptor matching.

pub mod error;
pub mod params;
pub mod source;
