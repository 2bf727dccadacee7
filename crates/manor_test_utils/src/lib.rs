//! # Manor Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Catalog, treasury and manager fixtures
//! - A manually driven clock
//! - A fault-injecting store wrapper
//! - A thread contention harness for counters
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod contention;
pub mod faults;
pub mod fixtures;
pub mod strategies;

/// Re-export proptest for convenience.
pub use proptest;
