//! Manor period modes.

use serde::{Deserialize, Serialize};

/// Phase of the daily manor cycle.
///
/// The normal cycle is `Approved -> Maintenance -> Modifiable -> Approved`.
/// `Disabled` is an administrative override the cycle never reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManorMode {
    /// Manor is switched off.
    Disabled,
    /// Castle lords may edit next period settings.
    Modifiable,
    /// Periods are being rotated; nothing may be edited.
    Maintenance,
    /// Next period settings are locked in and paid for.
    Approved,
}

impl ManorMode {
    /// Short display name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Modifiable => "modifiable",
            Self::Maintenance => "maintenance",
            Self::Approved => "approved",
        }
    }
}

impl std::fmt::Display for ManorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
