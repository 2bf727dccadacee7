//! Proptest strategies for manor values.

use proptest::prelude::*;

/// Start amount and price of a plausible offer line.
pub fn offer_terms() -> impl Strategy<Value = (u64, u64)> {
    (0u64..100_000, 0u64..10_000)
}

/// A start amount together with a remaining amount not above it.
pub fn start_and_remaining() -> impl Strategy<Value = (u64, u64)> {
    (0u64..100_000).prop_flat_map(|start| (Just(start), 0..=start))
}

/// Several offer lines, for cost computations.
pub fn offer_lines(max_len: usize) -> impl Strategy<Value = Vec<(u64, u64)>> {
    prop::collection::vec(offer_terms(), 0..=max_len)
}
