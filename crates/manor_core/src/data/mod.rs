//! Data structures for the manor catalog.
//!
//! This module contains pure data structures that describe which seeds and
//! crops exist, which castle sells each seed, and their reference prices.
//! All structs are designed to be deserialized from RON files.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `manor_server` and `manor_tools`.

mod catalog_data;
mod crop_data;
mod seed_data;

pub use catalog_data::CatalogData;
pub use crop_data::CropData;
pub use seed_data::SeedData;
