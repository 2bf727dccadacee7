//! In-process manor store.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::{ManorStore, ProcureRow, ProductionRow, StoreResult};
use crate::ids::CastleId;

#[derive(Debug, Default, Clone)]
struct CastleRows {
    production: Vec<ProductionRow>,
    procure: Vec<ProcureRow>,
}

/// Volatile store keeping rows in memory.
///
/// Clones share the same rows, so a second manager built from a clone sees
/// what the first one saved.
#[derive(Debug, Default, Clone)]
pub struct MemoryManorStore {
    castles: Arc<Mutex<BTreeMap<CastleId, CastleRows>>>,
}

impl MemoryManorStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the rows of a castle directly.
    pub fn insert_rows(
        &self,
        castle: CastleId,
        production: Vec<ProductionRow>,
        procure: Vec<ProcureRow>,
    ) {
        self.lock().insert(castle, CastleRows { production, procure });
    }

    /// Stored rows of a castle, if any were saved.
    #[must_use]
    pub fn rows(&self, castle: CastleId) -> Option<(Vec<ProductionRow>, Vec<ProcureRow>)> {
        self.lock()
            .get(&castle)
            .map(|rows| (rows.production.clone(), rows.procure.clone()))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<CastleId, CastleRows>> {
        self.castles.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ManorStore for MemoryManorStore {
    async fn load_production(&self, castle: CastleId) -> StoreResult<Vec<ProductionRow>> {
        Ok(self
            .lock()
            .get(&castle)
            .map(|rows| rows.production.clone())
            .unwrap_or_default())
    }

    async fn load_procure(&self, castle: CastleId) -> StoreResult<Vec<ProcureRow>> {
        Ok(self
            .lock()
            .get(&castle)
            .map(|rows| rows.procure.clone())
            .unwrap_or_default())
    }

    async fn save_all(
        &self,
        castle: CastleId,
        production: Vec<ProductionRow>,
        procure: Vec<ProcureRow>,
    ) -> StoreResult<()> {
        self.insert_rows(castle, production, procure);
        Ok(())
    }

    async fn delete_all(&self, castle: CastleId) -> StoreResult<()> {
        self.lock().remove(&castle);
        Ok(())
    }
}
