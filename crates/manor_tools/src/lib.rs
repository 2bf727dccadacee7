//! # Manor Development Tools
//!
//! Command-line tools for development:
//! - Catalog and server config validators
//! - Schedule inspection

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod schedule;
pub mod validate;
