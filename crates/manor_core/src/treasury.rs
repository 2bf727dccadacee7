//! Territory treasury collaborator.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::ids::CastleId;

/// Owner of each castle's currency balance.
///
/// Implementations must be safe to call from several tasks at once and must
/// never let a balance go below zero.
pub trait CastleTreasury: Send + Sync {
    /// Castles that run a manor.
    fn castle_ids(&self) -> Vec<CastleId>;

    /// Current balance of a castle.
    fn treasury(&self, castle: CastleId) -> u64;

    /// Add `delta` to a castle's balance; negative values debit.
    ///
    /// The balance is clamped at zero.
    fn add_to_treasury(&self, castle: CastleId, delta: i64);
}

/// Convert an unsigned currency amount into a treasury delta, saturating.
#[must_use]
pub fn credit(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

/// Convert an unsigned currency amount into a negative treasury delta, saturating.
#[must_use]
pub fn debit(amount: u64) -> i64 {
    -credit(amount)
}

/// In-process treasury keyed by castle.
#[derive(Debug, Default)]
pub struct MemoryTreasury {
    balances: Mutex<BTreeMap<CastleId, u64>>,
}

impl MemoryTreasury {
    /// Create a treasury with the given starting balances.
    #[must_use]
    pub fn new(balances: impl IntoIterator<Item = (CastleId, u64)>) -> Self {
        Self {
            balances: Mutex::new(balances.into_iter().collect()),
        }
    }

    /// Overwrite a castle's balance, registering the castle if needed.
    pub fn set_treasury(&self, castle: CastleId, amount: u64) {
        self.lock().insert(castle, amount);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<CastleId, u64>> {
        self.balances.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CastleTreasury for MemoryTreasury {
    fn castle_ids(&self) -> Vec<CastleId> {
        self.lock().keys().copied().collect()
    }

    fn treasury(&self, castle: CastleId) -> u64 {
        self.lock().get(&castle).copied().unwrap_or(0)
    }

    fn add_to_treasury(&self, castle: CastleId, delta: i64) {
        let mut balances = self.lock();
        let balance = balances.entry(castle).or_insert(0);
        *balance = if delta >= 0 {
            balance.saturating_add(delta.unsigned_abs())
        } else {
            balance.saturating_sub(delta.unsigned_abs())
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_and_debit() {
        let treasury = MemoryTreasury::new([(CastleId::new(1), 1_000)]);

        treasury.add_to_treasury(CastleId::new(1), 500);
        assert_eq!(treasury.treasury(CastleId::new(1)), 1_500);

        treasury.add_to_treasury(CastleId::new(1), -700);
        assert_eq!(treasury.treasury(CastleId::new(1)), 800);
    }

    #[test]
    fn test_debit_clamps_at_zero() {
        let treasury = MemoryTreasury::new([(CastleId::new(1), 100)]);

        treasury.add_to_treasury(CastleId::new(1), -250);
        assert_eq!(treasury.treasury(CastleId::new(1)), 0);
    }

    #[test]
    fn test_castle_ids_sorted() {
        let treasury = MemoryTreasury::new([(CastleId::new(3), 0), (CastleId::new(1), 0)]);
        treasury.set_treasury(CastleId::new(2), 10);

        assert_eq!(
            treasury.castle_ids(),
            vec![CastleId::new(1), CastleId::new(2), CastleId::new(3)]
        );
    }

    #[test]
    fn test_delta_conversion_saturates() {
        assert_eq!(credit(u64::MAX), i64::MAX);
        assert_eq!(debit(40), -40);
    }
}
