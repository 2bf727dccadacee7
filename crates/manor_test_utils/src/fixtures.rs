//! Test fixtures and helpers.
//!
//! A small two-castle world with a fixed catalog, so tests can talk about
//! known seeds, crops and prices.

use std::sync::Arc;

use manor_core::config::ManorConfig;
use manor_core::counter::{CropProcure, RewardType, SeedProduction};
use manor_core::data::CatalogData;
use manor_core::ids::{CastleId, CropId, SeedId};
use manor_core::manager::ManorManager;
use manor_core::store::ManorStore;
use manor_core::treasury::MemoryTreasury;

use crate::clock::ManualClock;

/// First test castle.
pub const ADEN: CastleId = CastleId::new(1);
/// Second test castle.
pub const GIRAN: CastleId = CastleId::new(2);

/// Seed sold by Aden, reference price 100.
pub const DARK_COBOL: SeedId = SeedId::new(5016);
/// Seed sold by Aden, reference price 50.
pub const CHILLY_COBOL: SeedId = SeedId::new(5017);
/// Seed sold by Giran, reference price 80.
pub const BLUE_COBOL: SeedId = SeedId::new(5018);

/// Crop grown from [`DARK_COBOL`].
pub const RIPE_DARK_COBOL: CropId = CropId::new(5073);
/// Crop grown from [`CHILLY_COBOL`].
pub const RIPE_CHILLY_COBOL: CropId = CropId::new(5074);
/// Crop grown from [`BLUE_COBOL`].
pub const RIPE_BLUE_COBOL: CropId = CropId::new(5075);

const CATALOG: &str = r"
    CatalogData(
        seeds: [
            SeedData(id: 5016, crop_id: 5073, castle_id: 1, level: 10, reference_price: 100),
            SeedData(id: 5017, crop_id: 5074, castle_id: 1, level: 13, reference_price: 50),
            SeedData(id: 5018, crop_id: 5075, castle_id: 2, level: 16, reference_price: 80),
        ],
        crops: [
            CropData(id: 5073, rewards: (5026, 5027)),
            CropData(id: 5074, rewards: (5028, 5029)),
            CropData(id: 5075, rewards: (5030, 5031)),
        ],
    )
";

/// The fixed test catalog.
///
/// # Panics
///
/// Panics if the embedded catalog fails to parse.
#[must_use]
pub fn catalog() -> CatalogData {
    CatalogData::from_ron_str(CATALOG, "fixtures").expect("fixture catalog parses")
}

/// Treasury holding both test castles with the given balances.
#[must_use]
pub fn treasury(aden: u64, giran: u64) -> Arc<MemoryTreasury> {
    Arc::new(MemoryTreasury::new([(ADEN, aden), (GIRAN, giran)]))
}

/// Seed production line with `start` seeds at `price`, fully available.
#[must_use]
pub fn seed_offer(seed: SeedId, start: u64, price: u64) -> SeedProduction {
    SeedProduction::offer(seed, start, price)
}

/// Crop procurement line buying `start` crops at `price`, fully available.
#[must_use]
pub fn crop_offer(crop: CropId, start: u64, price: u64) -> CropProcure {
    CropProcure::offer(crop, start, RewardType::First, price)
}

/// Manager over the fixture catalog with an injected clock.
#[must_use]
pub fn manager<S: ManorStore>(
    store: S,
    treasury: Arc<MemoryTreasury>,
    clock: Arc<ManualClock>,
    config: ManorConfig,
) -> ManorManager<S> {
    ManorManager::new(store, treasury, Arc::new(catalog()), config).with_clock(clock)
}
