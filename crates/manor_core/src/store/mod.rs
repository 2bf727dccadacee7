//! Persistence seam for manor rows.
//!
//! A castle's manor is stored as two row sets, seed production and crop
//! procurement, each row flagged as belonging to the current or the next
//! period. Backends store and return rows verbatim; catalog validation
//! happens in the manager when rows are turned back into counters.

mod file;
mod memory;

pub use file::FileManorStore;
pub use memory::MemoryManorStore;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::counter::{CropProcure, RewardType, SeedProduction};
use crate::error::{Result, StoreError};
use crate::ids::{CastleId, CropId, SeedId};

/// Result type for backend operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One persisted seed production line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRow {
    /// Owning castle.
    pub castle_id: CastleId,
    /// Seed sold.
    pub seed_id: SeedId,
    /// Seeds remaining.
    pub amount: u64,
    /// Seeds offered at period start.
    pub start_amount: u64,
    /// Price per seed.
    pub price: u64,
    /// Row belongs to the next period rather than the current one.
    pub next_period: bool,
}

impl ProductionRow {
    /// Snapshot a live production line.
    #[must_use]
    pub fn from_seed(castle_id: CastleId, seed: &SeedProduction, next_period: bool) -> Self {
        Self {
            castle_id,
            seed_id: seed.seed_id(),
            amount: seed.amount(),
            start_amount: seed.start_amount(),
            price: seed.price(),
            next_period,
        }
    }

    /// Rebuild the production line this row describes.
    pub fn to_seed(&self) -> Result<SeedProduction> {
        SeedProduction::new(self.seed_id, self.amount, self.start_amount, self.price)
    }
}

/// One persisted crop procurement line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcureRow {
    /// Owning castle.
    pub castle_id: CastleId,
    /// Crop bought.
    pub crop_id: CropId,
    /// Crops the castle will still buy.
    pub amount: u64,
    /// Crops offered at period start.
    pub start_amount: u64,
    /// Price per crop.
    pub price: u64,
    /// Reward paid per crop.
    pub reward_type: RewardType,
    /// Row belongs to the next period rather than the current one.
    pub next_period: bool,
}

impl ProcureRow {
    /// Snapshot a live procurement line.
    #[must_use]
    pub fn from_crop(castle_id: CastleId, crop: &CropProcure, next_period: bool) -> Self {
        Self {
            castle_id,
            crop_id: crop.crop_id(),
            amount: crop.amount(),
            start_amount: crop.start_amount(),
            price: crop.price(),
            reward_type: crop.reward_type(),
            next_period,
        }
    }

    /// Rebuild the procurement line this row describes.
    pub fn to_crop(&self) -> Result<CropProcure> {
        CropProcure::new(
            self.crop_id,
            self.amount,
            self.reward_type,
            self.start_amount,
            self.price,
        )
    }
}

/// Durable storage for manor rows.
///
/// Every method may be cancelled by dropping its future; the manager bounds
/// each call with the configured store timeout.
pub trait ManorStore: Send + Sync + 'static {
    /// Load every production row of a castle, current and next period.
    fn load_production(
        &self,
        castle: CastleId,
    ) -> impl Future<Output = StoreResult<Vec<ProductionRow>>> + Send;

    /// Load every procurement row of a castle, current and next period.
    fn load_procure(
        &self,
        castle: CastleId,
    ) -> impl Future<Output = StoreResult<Vec<ProcureRow>>> + Send;

    /// Replace every stored row of a castle.
    fn save_all(
        &self,
        castle: CastleId,
        production: Vec<ProductionRow>,
        procure: Vec<ProcureRow>,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Remove every stored row of a castle.
    fn delete_all(&self, castle: CastleId) -> impl Future<Output = StoreResult<()>> + Send;
}
