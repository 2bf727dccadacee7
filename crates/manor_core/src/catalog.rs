//! Catalog collaborator interface.

use std::collections::BTreeSet;

use crate::ids::{CropId, SeedId};

/// Static reference data the manager validates rows against and prices seeds with.
///
/// Implemented by [`crate::data::CatalogData`]; other implementations can
/// wrap whatever item database the host server uses.
pub trait ManorCatalog: Send + Sync {
    /// Every seed ID the catalog knows.
    fn seed_ids(&self) -> BTreeSet<SeedId>;

    /// Every crop ID the catalog knows.
    fn crop_ids(&self) -> BTreeSet<CropId>;

    /// Reference price of a seed, if the seed is known.
    fn seed_reference_price(&self, seed: SeedId) -> Option<u64>;
}
