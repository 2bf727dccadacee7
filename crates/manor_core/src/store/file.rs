//! File-backed manor store.
//!
//! Each castle is one bincode file in the data directory. Writes go to a
//! temporary file first and are renamed into place, so a crash mid-save
//! leaves the previous snapshot intact. Every write gets its own temporary
//! file, so overlapping saves of one castle never clobber each other.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::{ManorStore, ProcureRow, ProductionRow, StoreResult};
use crate::error::StoreError;
use crate::ids::CastleId;

/// Snapshot format version for compatibility.
pub const SNAPSHOT_VERSION: u32 = 1;

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Default, Serialize, Deserialize)]
struct CastleSnapshot {
    version: u32,
    production: Vec<ProductionRow>,
    procure: Vec<ProcureRow>,
}

/// Store writing one snapshot file per castle.
#[derive(Debug, Clone)]
pub struct FileManorStore {
    dir: PathBuf,
}

impl FileManorStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the snapshots.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self, castle: CastleId) -> PathBuf {
        self.dir.join(format!("castle_{}.manor", castle.0))
    }

    fn tmp_path(&self, castle: CastleId) -> PathBuf {
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!(
            "castle_{}.manor.{}.{seq}.tmp",
            castle.0,
            std::process::id()
        ))
    }

    async fn read_snapshot(&self, castle: CastleId) -> StoreResult<CastleSnapshot> {
        let bytes = match tokio::fs::read(self.snapshot_path(castle)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CastleSnapshot::default()),
            Err(e) => return Err(e.into()),
        };
        let snapshot: CastleSnapshot =
            bincode::deserialize(&bytes).map_err(|e| StoreError::Decode(e.to_string()))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::Decode(format!(
                "snapshot version mismatch: expected {}, got {}",
                SNAPSHOT_VERSION, snapshot.version
            )));
        }
        Ok(snapshot)
    }
}

impl ManorStore for FileManorStore {
    async fn load_production(&self, castle: CastleId) -> StoreResult<Vec<ProductionRow>> {
        Ok(self.read_snapshot(castle).await?.production)
    }

    async fn load_procure(&self, castle: CastleId) -> StoreResult<Vec<ProcureRow>> {
        Ok(self.read_snapshot(castle).await?.procure)
    }

    async fn save_all(
        &self,
        castle: CastleId,
        production: Vec<ProductionRow>,
        procure: Vec<ProcureRow>,
    ) -> StoreResult<()> {
        let snapshot = CastleSnapshot {
            version: SNAPSHOT_VERSION,
            production,
            procure,
        };
        let bytes = bincode::serialize(&snapshot).map_err(|e| StoreError::Encode(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = self.tmp_path(castle);
        let written = match tokio::fs::write(&tmp, bytes).await {
            Ok(()) => tokio::fs::rename(&tmp, self.snapshot_path(castle)).await,
            Err(e) => Err(e),
        };
        if written.is_err() {
            // Best effort, the original error is what matters
            let _ = tokio::fs::remove_file(&tmp).await;
        }
        written.map_err(Into::into)
    }

    async fn delete_all(&self, castle: CastleId) -> StoreResult<()> {
        match tokio::fs::remove_file(self.snapshot_path(castle)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
