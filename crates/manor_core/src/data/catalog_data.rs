//! Seed and crop catalog loaded from RON.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::crop_data::CropData;
use super::seed_data::SeedData;
use crate::catalog::ManorCatalog;
use crate::error::{ManorError, Result};
use crate::ids::{CropId, SeedId};

/// Complete manor catalog.
///
/// # Example RON
///
/// ```ron
/// CatalogData(
///     seeds: [
///         SeedData(id: 5016, crop_id: 5073, castle_id: 1, reference_price: 120),
///     ],
///     crops: [
///         CropData(id: 5073, rewards: (5026, 5027)),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    /// All known seeds.
    #[serde(default)]
    pub seeds: Vec<SeedData>,

    /// All known crops.
    #[serde(default)]
    pub crops: Vec<CropData>,
}

impl CatalogData {
    /// Parse a catalog from RON text.
    ///
    /// `origin` names the source in the error message.
    pub fn from_ron_str(text: &str, origin: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| ManorError::DataParse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Find a seed by its ID.
    #[must_use]
    pub fn get_seed(&self, id: SeedId) -> Option<&SeedData> {
        self.seeds.iter().find(|s| s.id == id)
    }

    /// Find a crop by its ID.
    #[must_use]
    pub fn get_crop(&self, id: CropId) -> Option<&CropData> {
        self.crops.iter().find(|c| c.id == id)
    }

    /// Validate internal consistency of the catalog.
    ///
    /// Checks for duplicate seed and crop IDs and seeds growing unknown crops.
    /// Returns a list of validation errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let mut seen_seeds = BTreeSet::new();
        for seed in &self.seeds {
            if !seen_seeds.insert(seed.id) {
                errors.push(format!("Duplicate seed id {}", seed.id));
            }
            if self.get_crop(seed.crop_id).is_none() {
                errors.push(format!(
                    "Seed {} grows unknown crop {}",
                    seed.id, seed.crop_id
                ));
            }
        }

        let mut seen_crops = BTreeSet::new();
        for crop in &self.crops {
            if !seen_crops.insert(crop.id) {
                errors.push(format!("Duplicate crop id {}", crop.id));
            }
        }

        errors
    }
}

impl ManorCatalog for CatalogData {
    fn seed_ids(&self) -> BTreeSet<SeedId> {
        self.seeds.iter().map(|s| s.id).collect()
    }

    fn crop_ids(&self) -> BTreeSet<CropId> {
        self.crops.iter().map(|c| c.id).collect()
    }

    fn seed_reference_price(&self, seed: SeedId) -> Option<u64> {
        self.get_seed(seed).map(|s| s.reference_price)
    }
}
