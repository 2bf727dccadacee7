//! Tradable resource lines for one castle in one period.
//!
//! A counter has an immutable identity, start amount and price, and a
//! remaining amount that player trades draw down concurrently. The remaining
//! amount is a per-counter atomic so the trading hot path never takes the
//! manager's lock.
//!
//! Invariant: `0 <= amount <= start_amount` at every observable instant.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{ManorError, Result};
use crate::ids::{CropId, SeedId};

/// Remaining quantity, start quantity and unit price of one resource line.
#[derive(Debug)]
pub struct ResourceCounter {
    amount: AtomicU64,
    start_amount: u64,
    price: u64,
}

impl ResourceCounter {
    /// Create a counter, rejecting `amount > start_amount`.
    ///
    /// `id` is only used to describe the failure.
    pub fn new(id: u32, amount: u64, start_amount: u64, price: u64) -> Result<Self> {
        if amount > start_amount {
            return Err(ManorError::InvalidCounter {
                id,
                amount,
                start_amount,
            });
        }
        Ok(Self {
            amount: AtomicU64::new(amount),
            start_amount,
            price,
        })
    }

    /// Create a counter with its full start amount remaining.
    #[must_use]
    pub const fn full(start_amount: u64, price: u64) -> Self {
        Self {
            amount: AtomicU64::new(start_amount),
            start_amount,
            price,
        }
    }

    /// Current remaining amount.
    #[must_use]
    pub fn amount(&self) -> u64 {
        self.amount.load(Ordering::Acquire)
    }

    /// Amount this line started the period with.
    #[must_use]
    pub const fn start_amount(&self) -> u64 {
        self.start_amount
    }

    /// Price per unit.
    #[must_use]
    pub const fn price(&self) -> u64 {
        self.price
    }

    /// Overwrite the remaining amount.
    ///
    /// Values above the start amount are clamped to it.
    pub fn set_amount(&self, amount: u64) {
        let clamped = amount.min(self.start_amount);
        if clamped != amount {
            tracing::warn!(
                requested = amount,
                start_amount = self.start_amount,
                "Clamped counter amount to its start amount"
            );
        }
        self.amount.store(clamped, Ordering::Release);
    }

    /// Subtract `delta` from the remaining amount if enough remains.
    ///
    /// Returns true if the subtraction was applied. Never blocks; concurrent
    /// callers retry on contention until one of them observes too little.
    pub fn decrease_amount(&self, delta: u64) -> bool {
        let mut current = self.amount.load(Ordering::Acquire);
        loop {
            if current < delta {
                return false;
            }
            match self.amount.compare_exchange_weak(
                current,
                current - delta,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// `amount * price`, saturating.
    #[must_use]
    pub fn remaining_value(&self) -> u64 {
        self.amount().saturating_mul(self.price)
    }

    /// Fresh copy with the full start amount remaining.
    #[must_use]
    pub const fn refilled(&self) -> Self {
        Self::full(self.start_amount, self.price)
    }
}

/// A castle's offer to sell seeds during one period.
#[derive(Debug)]
pub struct SeedProduction {
    seed_id: SeedId,
    counter: ResourceCounter,
}

impl SeedProduction {
    /// Create a seed production line from persisted values.
    pub fn new(seed_id: SeedId, amount: u64, start_amount: u64, price: u64) -> Result<Self> {
        Ok(Self {
            seed_id,
            counter: ResourceCounter::new(seed_id.0, amount, start_amount, price)?,
        })
    }

    /// Create a fresh seed production line, as submitted for the next period.
    #[must_use]
    pub const fn offer(seed_id: SeedId, start_amount: u64, price: u64) -> Self {
        Self {
            seed_id,
            counter: ResourceCounter::full(start_amount, price),
        }
    }

    /// Seed being sold.
    #[must_use]
    pub const fn seed_id(&self) -> SeedId {
        self.seed_id
    }

    /// Seeds still available.
    #[must_use]
    pub fn amount(&self) -> u64 {
        self.counter.amount()
    }

    /// Seeds offered at the start of the period.
    #[must_use]
    pub const fn start_amount(&self) -> u64 {
        self.counter.start_amount()
    }

    /// Sale price per seed.
    #[must_use]
    pub const fn price(&self) -> u64 {
        self.counter.price()
    }

    /// See [`ResourceCounter::set_amount`].
    pub fn set_amount(&self, amount: u64) {
        self.counter.set_amount(amount);
    }

    /// See [`ResourceCounter::decrease_amount`].
    pub fn decrease_amount(&self, delta: u64) -> bool {
        self.counter.decrease_amount(delta)
    }

    /// Copy of this line with the full start amount available again.
    #[must_use]
    pub const fn refilled(&self) -> Self {
        Self {
            seed_id: self.seed_id,
            counter: self.counter.refilled(),
        }
    }
}

/// Which of a crop's two configured reward items a procurement pays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardType {
    /// First configured reward.
    First,
    /// Second configured reward.
    Second,
}

/// A castle's offer to buy crops during one period.
#[derive(Debug)]
pub struct CropProcure {
    crop_id: CropId,
    reward_type: RewardType,
    counter: ResourceCounter,
}

impl CropProcure {
    /// Create a crop procurement line from persisted values.
    pub fn new(
        crop_id: CropId,
        amount: u64,
        reward_type: RewardType,
        start_amount: u64,
        price: u64,
    ) -> Result<Self> {
        Ok(Self {
            crop_id,
            reward_type,
            counter: ResourceCounter::new(crop_id.0, amount, start_amount, price)?,
        })
    }

    /// Create a fresh procurement line, as submitted for the next period.
    #[must_use]
    pub const fn offer(
        crop_id: CropId,
        start_amount: u64,
        reward_type: RewardType,
        price: u64,
    ) -> Self {
        Self {
            crop_id,
            reward_type,
            counter: ResourceCounter::full(start_amount, price),
        }
    }

    /// Crop being bought.
    #[must_use]
    pub const fn crop_id(&self) -> CropId {
        self.crop_id
    }

    /// Reward paid out per sale.
    #[must_use]
    pub const fn reward_type(&self) -> RewardType {
        self.reward_type
    }

    /// Crops the castle will still buy.
    #[must_use]
    pub fn amount(&self) -> u64 {
        self.counter.amount()
    }

    /// Crops the castle offered to buy at the start of the period.
    #[must_use]
    pub const fn start_amount(&self) -> u64 {
        self.counter.start_amount()
    }

    /// Purchase price per crop.
    #[must_use]
    pub const fn price(&self) -> u64 {
        self.counter.price()
    }

    /// See [`ResourceCounter::set_amount`].
    pub fn set_amount(&self, amount: u64) {
        self.counter.set_amount(amount);
    }

    /// See [`ResourceCounter::decrease_amount`].
    pub fn decrease_amount(&self, delta: u64) -> bool {
        self.counter.decrease_amount(delta)
    }

    /// Currency reserved for crops nobody sold, refunded at rotation.
    #[must_use]
    pub fn unspent_funds(&self) -> u64 {
        self.counter.remaining_value()
    }

    /// Copy of this line with the full start amount available again.
    #[must_use]
    pub const fn refilled(&self) -> Self {
        Self {
            crop_id: self.crop_id,
            reward_type: self.reward_type,
            counter: self.counter.refilled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_decrease_within_amount() {
        let counter = ResourceCounter::full(100, 5);

        assert!(counter.decrease_amount(30));
        assert_eq!(counter.amount(), 70);

        assert!(counter.decrease_amount(70));
        assert_eq!(counter.amount(), 0);
    }

    #[test]
    fn test_decrease_beyond_amount_is_rejected() {
        let counter = ResourceCounter::full(10, 5);

        assert!(!counter.decrease_amount(11));
        assert_eq!(counter.amount(), 10); // Unchanged

        assert!(counter.decrease_amount(10));
        assert!(!counter.decrease_amount(1));
        assert_eq!(counter.amount(), 0);
    }

    #[test]
    fn test_new_rejects_amount_above_start() {
        let err = ResourceCounter::new(7, 11, 10, 1).unwrap_err();
        assert!(matches!(
            err,
            ManorError::InvalidCounter {
                id: 7,
                amount: 11,
                start_amount: 10
            }
        ));
        assert!(ResourceCounter::new(7, 10, 10, 1).is_ok());
    }

    #[test]
    fn test_set_amount_clamps_to_start() {
        let counter = ResourceCounter::full(50, 1);
        counter.set_amount(20);
        assert_eq!(counter.amount(), 20);

        counter.set_amount(80);
        assert_eq!(counter.amount(), 50);
    }

    #[test]
    fn test_refilled_restores_start_amount() {
        let crop = CropProcure::new(CropId::new(5), 12, RewardType::Second, 40, 9).unwrap();
        let fresh = crop.refilled();

        assert_eq!(fresh.crop_id(), CropId::new(5));
        assert_eq!(fresh.reward_type(), RewardType::Second);
        assert_eq!(fresh.amount(), 40);
        assert_eq!(fresh.price(), 9);
        assert_eq!(crop.amount(), 12); // Original untouched
    }

    #[test]
    fn test_unspent_funds() {
        let crop = CropProcure::new(CropId::new(1), 60, RewardType::First, 100, 100).unwrap();
        assert_eq!(crop.unspent_funds(), 6000);
    }

    #[test]
    fn test_concurrent_decrements_lose_nothing() {
        let seed = Arc::new(SeedProduction::offer(SeedId::new(1), 1_000, 10));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let seed = Arc::clone(&seed);
                std::thread::spawn(move || (0..200).filter(|_| seed.decrease_amount(1)).count())
            })
            .collect();

        let successes: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(successes, 1_000);
        assert_eq!(seed.amount(), 0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// A decrement either applies exactly or leaves the counter untouched.
            #[test]
            fn prop_decrease_is_exact_or_noop(
                start in 0u64..10_000,
                used in 0u64..10_000,
                delta in 0u64..20_000,
            ) {
                let amount = used.min(start);
                let counter = ResourceCounter::new(1, amount, start, 1).unwrap();

                let applied = counter.decrease_amount(delta);

                if delta <= amount {
                    prop_assert!(applied);
                    prop_assert_eq!(counter.amount(), amount - delta);
                } else {
                    prop_assert!(!applied);
                    prop_assert_eq!(counter.amount(), amount);
                }
                prop_assert!(counter.amount() <= counter.start_amount());
            }
        }
    }
}
