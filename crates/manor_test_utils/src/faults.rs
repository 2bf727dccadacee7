//! Fault-injecting store wrapper.
//!
//! Wraps any [`ManorStore`] and, while a fault is armed, fails, stalls or
//! delays the matching calls instead of forwarding them straight away.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use manor_core::error::StoreError;
use manor_core::ids::CastleId;
use manor_core::store::{ManorStore, ProcureRow, ProductionRow, StoreResult};

#[derive(Debug, Default)]
struct Faults {
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    fail_deletes: AtomicBool,
    stall_saves: AtomicBool,
    next_save_delay: Mutex<Option<Duration>>,
}

/// Store that can be told to misbehave.
///
/// Clones share both the inner store and the armed faults.
#[derive(Debug, Clone)]
pub struct FaultyStore<S> {
    inner: S,
    faults: Arc<Faults>,
}

impl<S: ManorStore> FaultyStore<S> {
    /// Wrap `inner` with every fault disarmed.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            faults: Arc::default(),
        }
    }

    /// Wrapped store.
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Make loads fail.
    pub fn fail_loads(&self, on: bool) {
        self.faults.fail_loads.store(on, Ordering::SeqCst);
    }

    /// Make saves fail.
    pub fn fail_saves(&self, on: bool) {
        self.faults.fail_saves.store(on, Ordering::SeqCst);
    }

    /// Make deletes fail.
    pub fn fail_deletes(&self, on: bool) {
        self.faults.fail_deletes.store(on, Ordering::SeqCst);
    }

    /// Make saves hang forever.
    pub fn stall_saves(&self, on: bool) {
        self.faults.stall_saves.store(on, Ordering::SeqCst);
    }

    /// Make the next save wait `delay` before reaching the wrapped store.
    pub fn delay_next_save(&self, delay: Duration) {
        *self.lock_delay() = Some(delay);
    }

    fn lock_delay(&self) -> std::sync::MutexGuard<'_, Option<Duration>> {
        self.faults
            .next_save_delay
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn check(flag: &AtomicBool, what: &str) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(format!("injected {what} failure")))
        } else {
            Ok(())
        }
    }
}

impl<S: ManorStore> ManorStore for FaultyStore<S> {
    async fn load_production(&self, castle: CastleId) -> StoreResult<Vec<ProductionRow>> {
        Self::check(&self.faults.fail_loads, "load")?;
        self.inner.load_production(castle).await
    }

    async fn load_procure(&self, castle: CastleId) -> StoreResult<Vec<ProcureRow>> {
        Self::check(&self.faults.fail_loads, "load")?;
        self.inner.load_procure(castle).await
    }

    async fn save_all(
        &self,
        castle: CastleId,
        production: Vec<ProductionRow>,
        procure: Vec<ProcureRow>,
    ) -> StoreResult<()> {
        if self.faults.stall_saves.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let delay = self.lock_delay().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Self::check(&self.faults.fail_saves, "save")?;
        self.inner.save_all(castle, production, procure).await
    }

    async fn delete_all(&self, castle: CastleId) -> StoreResult<()> {
        Self::check(&self.faults.fail_deletes, "delete")?;
        self.inner.delete_all(castle).await
    }
}
