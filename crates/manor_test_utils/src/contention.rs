//! Thread contention harness.
//!
//! Hammers a shared operation from many OS threads at once and counts how
//! many attempts succeeded, so tests can check that no update was lost.
//!
//! # Example
//!
//! ```ignore
//! use manor_test_utils::contention::hammer;
//!
//! let seed = SeedProduction::offer(SeedId::new(1), 1_000, 10);
//! let result = hammer(8, 500, || seed.decrease_amount(1));
//! result.assert_exhausted(1_000);
//! assert_eq!(seed.amount(), 0);
//! ```

use std::sync::Barrier;
use std::thread;

/// Outcome of a contention run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentionResult {
    /// Successful attempts per thread.
    pub successes_per_thread: Vec<u64>,
    /// Attempts each thread made.
    pub attempts_per_thread: u64,
}

impl ContentionResult {
    /// Successful attempts across every thread.
    #[must_use]
    pub fn total_successes(&self) -> u64 {
        self.successes_per_thread.iter().sum()
    }

    /// Attempts across every thread.
    #[must_use]
    pub fn total_attempts(&self) -> u64 {
        self.attempts_per_thread * self.successes_per_thread.len() as u64
    }

    /// Assert that exactly `min(pool, attempts)` attempts succeeded.
    ///
    /// # Panics
    ///
    /// Panics with per-thread details if any update was lost or duplicated.
    pub fn assert_exhausted(&self, pool: u64) {
        let expected = pool.min(self.total_attempts());
        assert!(
            self.total_successes() == expected,
            "Lost or duplicated updates!\n\
             Pool: {}\n\
             Attempts: {}\n\
             Expected successes: {}\n\
             Actual successes: {}\n\
             Per thread: {:?}",
            pool,
            self.total_attempts(),
            expected,
            self.total_successes(),
            self.successes_per_thread
        );
    }
}

/// Run `op` `attempts` times on each of `threads` threads, all released together.
pub fn hammer<F>(threads: usize, attempts: u64, op: F) -> ContentionResult
where
    F: Fn() -> bool + Sync,
{
    let barrier = Barrier::new(threads);
    let successes_per_thread = thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    (0..attempts).map(|_| u64::from(op())).sum::<u64>()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    });

    ContentionResult {
        successes_per_thread,
        attempts_per_thread: attempts,
    }
}
