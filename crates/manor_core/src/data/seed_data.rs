//! Seed definitions for data-driven manor catalogs.

use serde::{Deserialize, Serialize};

use crate::ids::{CastleId, CropId, SeedId};

/// Data-driven seed definition.
///
/// # Example RON
///
/// ```ron
/// SeedData(
///     id: 5016,
///     crop_id: 5073,
///     castle_id: 1,
///     level: 10,
///     reference_price: 120,
///     limit_seeds: 4000,
///     limit_crops: 2000,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedData {
    /// Seed item identifier.
    pub id: SeedId,

    /// Crop this seed grows into.
    pub crop_id: CropId,

    /// Castle whose manor sells this seed.
    pub castle_id: CastleId,

    /// Seed level, used by the sowing rules.
    #[serde(default = "default_level")]
    pub level: u32,

    /// Baseline price used for manor cost accounting.
    pub reference_price: u64,

    /// Most seeds a castle may offer per period.
    #[serde(default)]
    pub limit_seeds: u64,

    /// Most crops a castle may procure per period.
    #[serde(default)]
    pub limit_crops: u64,
}

/// Default level for seeds without explicit level.
const fn default_level() -> u32 {
    1
}
