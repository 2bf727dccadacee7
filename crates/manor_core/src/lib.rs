//! # Manor Core
//!
//! Castle manor economy engine.
//!
//! Every castle runs a manor with two daily periods: the current one players
//! trade against, and the next one the castle lord prepares. This crate holds:
//!
//! - Lock-free resource counters for the trading hot path
//! - The daily mode cycle and the schedule that drives it
//! - The manager that rotates periods, settles treasuries and persists rows
//! - Collaborator seams for storage, treasuries and the item catalog
//!
//! ## Crate Structure
//!
//! - [`counter`] - Seed production and crop procurement lines
//! - [`mode`] - Manor period modes
//! - [`schedule`] - Daily transition times and clocks
//! - [`manager`] - The manor manager
//! - [`service`] - Background loop lifecycle
//! - [`store`] - Persistence seam and backends
//! - [`treasury`] - Treasury seam and in-memory treasury
//! - [`catalog`] / [`data`] - Catalog seam and RON catalog data

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod catalog;
pub mod config;
pub mod counter;
pub mod data;
pub mod error;
pub mod ids;
pub mod manager;
pub mod mode;
pub mod schedule;
pub mod service;
pub mod store;
pub mod treasury;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::ManorCatalog;
    pub use crate::config::ManorConfig;
    pub use crate::counter::{CropProcure, RewardType, SeedProduction};
    pub use crate::data::{CatalogData, CropData, SeedData};
    pub use crate::error::{ManorError, Result, StoreError, StoreOp};
    pub use crate::ids::{CastleId, CropId, ItemId, SeedId};
    pub use crate::manager::{ManorManager, ProcureList, ProductionList};
    pub use crate::mode::ManorMode;
    pub use crate::schedule::{Clock, ManorSchedule, SystemClock};
    pub use crate::service::ManorService;
    pub use crate::store::{
        FileManorStore, ManorStore, MemoryManorStore, ProcureRow, ProductionRow, StoreResult,
    };
    pub use crate::treasury::{CastleTreasury, MemoryTreasury};
}
