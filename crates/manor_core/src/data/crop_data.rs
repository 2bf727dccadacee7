//! Crop definitions for data-driven manor catalogs.

use serde::{Deserialize, Serialize};

use crate::ids::{CropId, ItemId};

/// Data-driven crop definition.
///
/// # Example RON
///
/// ```ron
/// CropData(
///     id: 5073,
///     rewards: (5026, 5027),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropData {
    /// Crop item identifier.
    pub id: CropId,

    /// The two items a castle can pay out when procuring this crop.
    pub rewards: (ItemId, ItemId),
}
