//! Castle manor manager.
//!
//! Owns every castle's current and next period seed production and crop
//! procurement lists plus the global [`ManorMode`], and drives the daily
//! cycle:
//!
//! | From | To | Side effects |
//! |---|---|---|
//! | Approved | Maintenance | Refund unspent procurement funds, rotate next into current, refill next if affordable. Persist. |
//! | Maintenance | Modifiable | None. |
//! | Modifiable | Approved | Debit the next period's cost, or clear next if the treasury cannot pay. Persist. |
//!
//! # Locking
//!
//! One `RwLock` guards list membership and the mode. Counter amounts are
//! atomics outside that lock, so trades never contend with it. Lists are
//! `Arc` snapshots replaced wholesale under the write lock; a reader holding
//! an old snapshot keeps a consistent (if stale) view. No guard is held
//! across an `.await`: mutations run in synchronous sections and
//! persistence works on rows copied out afterwards.
//!
//! A separate async mutex orders persistence. It is held from the row copy
//! until the store call returns, so a snapshot taken earlier can never land
//! after one taken later.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::catalog::ManorCatalog;
use crate::config::ManorConfig;
use crate::counter::{CropProcure, SeedProduction};
use crate::error::{ManorError, Result, StoreOp};
use crate::ids::{CastleId, CropId, SeedId};
use crate::mode::ManorMode;
use crate::schedule::{Clock, SystemClock};
use crate::store::{ManorStore, ProcureRow, ProductionRow, StoreResult};
use crate::treasury::{credit, debit, CastleTreasury};

/// Shared snapshot of a seed production list.
pub type ProductionList = Arc<[Arc<SeedProduction>]>;

/// Shared snapshot of a crop procurement list.
pub type ProcureList = Arc<[Arc<CropProcure>]>;

fn empty<T>() -> Arc<[T]> {
    Arc::from(Vec::new())
}

/// Both periods of one castle's manor.
#[derive(Debug, Clone)]
struct CastleManor {
    production: ProductionList,
    production_next: ProductionList,
    procure: ProcureList,
    procure_next: ProcureList,
}

impl Default for CastleManor {
    fn default() -> Self {
        Self {
            production: empty(),
            production_next: empty(),
            procure: empty(),
            procure_next: empty(),
        }
    }
}

impl CastleManor {
    fn production(&self, next: bool) -> &ProductionList {
        if next {
            &self.production_next
        } else {
            &self.production
        }
    }

    fn procure(&self, next: bool) -> &ProcureList {
        if next {
            &self.procure_next
        } else {
            &self.procure
        }
    }

    fn clear_next(&mut self) {
        self.production_next = empty();
        self.procure_next = empty();
    }

    fn rows(&self, castle: CastleId) -> (Vec<ProductionRow>, Vec<ProcureRow>) {
        let production = self
            .production
            .iter()
            .map(|s| ProductionRow::from_seed(castle, s, false))
            .chain(
                self.production_next
                    .iter()
                    .map(|s| ProductionRow::from_seed(castle, s, true)),
            )
            .collect();
        let procure = self
            .procure
            .iter()
            .map(|c| ProcureRow::from_crop(castle, c, false))
            .chain(
                self.procure_next
                    .iter()
                    .map(|c| ProcureRow::from_crop(castle, c, true)),
            )
            .collect();
        (production, procure)
    }
}

#[derive(Debug)]
struct ManorState {
    mode: ManorMode,
    castles: BTreeMap<CastleId, CastleManor>,
}

/// Rows of one castle copied out of the state for persistence.
type CastleRows = (CastleId, Vec<ProductionRow>, Vec<ProcureRow>);

/// Orchestrates every castle's manor.
///
/// Built by the composition root with its collaborators, then loaded with
/// [`ManorManager::init`]. Share it behind an `Arc`; see
/// [`crate::service::ManorService`] for running the background loops.
pub struct ManorManager<S> {
    store: S,
    treasury: Arc<dyn CastleTreasury>,
    catalog: Arc<dyn ManorCatalog>,
    clock: Arc<dyn Clock>,
    config: ManorConfig,
    state: RwLock<ManorState>,
    persist: Mutex<()>,
}

impl<S: ManorStore> ManorManager<S> {
    /// Create a manager. It holds no castles and stays `Disabled` until
    /// [`ManorManager::init`] runs.
    pub fn new(
        store: S,
        treasury: Arc<dyn CastleTreasury>,
        catalog: Arc<dyn ManorCatalog>,
        config: ManorConfig,
    ) -> Self {
        Self {
            store,
            treasury,
            catalog,
            clock: Arc::new(SystemClock),
            config,
            state: RwLock::new(ManorState {
                mode: ManorMode::Disabled,
                castles: BTreeMap::new(),
            }),
            persist: Mutex::new(()),
        }
    }

    /// Replace the wall clock used for mode scheduling.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Configuration the manager runs with.
    #[must_use]
    pub fn config(&self) -> &ManorConfig {
        &self.config
    }

    /// Persistence backend.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn read(&self) -> RwLockReadGuard<'_, ManorState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ManorState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    async fn with_deadline<T>(
        &self,
        castle: CastleId,
        op: StoreOp,
        call: impl Future<Output = StoreResult<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.config.store_timeout(), call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(ManorError::Store { castle, op, source }),
            Err(_) => Err(ManorError::StoreTimeout { castle, op }),
        }
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Load every castle's rows and derive the current mode from the clock.
    ///
    /// Rows naming seeds or crops the catalog does not know, or claiming
    /// more remaining than they started with, are skipped with a warning.
    /// Fails only when the store fails.
    pub async fn init(&self) -> Result<()> {
        let seed_ids = self.catalog.seed_ids();
        let crop_ids = self.catalog.crop_ids();
        let mut castles = BTreeMap::new();

        for castle in self.treasury.castle_ids() {
            let production = self
                .with_deadline(
                    castle,
                    StoreOp::LoadProduction,
                    self.store.load_production(castle),
                )
                .await?;
            let procure = self
                .with_deadline(castle, StoreOp::LoadProcure, self.store.load_procure(castle))
                .await?;

            let manor = load_castle(castle, &production, &procure, &seed_ids, &crop_ids);
            castles.insert(castle, manor);
        }

        let mode = if self.config.enabled {
            self.config.schedule.determine_mode(self.clock.now().time())
        } else {
            ManorMode::Disabled
        };
        let castle_count = castles.len();
        self.install(castles, mode);

        info!(castles = castle_count, mode = %mode, "Manor initialized");
        Ok(())
    }

    fn install(&self, castles: BTreeMap<CastleId, CastleManor>, mode: ManorMode) {
        let mut state = self.write();
        state.castles = castles;
        state.mode = mode;
    }

    // ---------------------------------------------------------------------
    // Mode queries
    // ---------------------------------------------------------------------

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> ManorMode {
        self.read().mode
    }

    /// Whether next period settings may be edited.
    #[must_use]
    pub fn is_modifiable(&self) -> bool {
        self.mode() == ManorMode::Modifiable
    }

    /// Whether next period settings are locked in.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.mode() == ManorMode::Approved
    }

    /// Whether periods are being rotated.
    #[must_use]
    pub fn is_under_maintenance(&self) -> bool {
        self.mode() == ManorMode::Maintenance
    }

    /// Whether the manor is switched off.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.mode() == ManorMode::Disabled
    }

    /// Instant the mode loop will next change mode, if any.
    #[must_use]
    pub fn next_mode_change(&self) -> Option<NaiveDateTime> {
        self.config
            .schedule
            .next_transition(self.mode(), self.clock.now())
    }

    // ---------------------------------------------------------------------
    // List access
    // ---------------------------------------------------------------------

    /// Castles loaded by [`ManorManager::init`].
    #[must_use]
    pub fn castle_ids(&self) -> Vec<CastleId> {
        self.read().castles.keys().copied().collect()
    }

    /// Seed production list of a castle. Empty for unknown castles.
    #[must_use]
    pub fn seed_production(&self, castle: CastleId, next: bool) -> ProductionList {
        self.read()
            .castles
            .get(&castle)
            .map_or_else(empty, |m| Arc::clone(m.production(next)))
    }

    /// Crop procurement list of a castle. Empty for unknown castles.
    #[must_use]
    pub fn crop_procure_list(&self, castle: CastleId, next: bool) -> ProcureList {
        self.read()
            .castles
            .get(&castle)
            .map_or_else(empty, |m| Arc::clone(m.procure(next)))
    }

    /// Both lists of one period, read under a single lock.
    ///
    /// Unlike calling [`ManorManager::seed_production`] and
    /// [`ManorManager::crop_procure_list`] in turn, the pair always belongs
    /// to the same side of a rotation or approval.
    #[must_use]
    pub fn period(&self, castle: CastleId, next: bool) -> (ProductionList, ProcureList) {
        self.read().castles.get(&castle).map_or_else(
            || (empty(), empty()),
            |m| (Arc::clone(m.production(next)), Arc::clone(m.procure(next))),
        )
    }

    /// Production line for one seed, if the castle sells it.
    #[must_use]
    pub fn seed_product(
        &self,
        castle: CastleId,
        seed: SeedId,
        next: bool,
    ) -> Option<Arc<SeedProduction>> {
        self.seed_production(castle, next)
            .iter()
            .find(|s| s.seed_id() == seed)
            .cloned()
    }

    /// Procurement line for one crop, if the castle buys it.
    #[must_use]
    pub fn crop_procure(
        &self,
        castle: CastleId,
        crop: CropId,
        next: bool,
    ) -> Option<Arc<CropProcure>> {
        self.crop_procure_list(castle, next)
            .iter()
            .find(|c| c.crop_id() == crop)
            .cloned()
    }

    /// Replace a castle's next period seed production.
    ///
    /// Accepted in any mode; callers decide whether editing is allowed.
    /// Castles not loaded by [`ManorManager::init`] are rejected with
    /// [`ManorError::UnknownCastle`]. With `save_all_actions` the castle is
    /// persisted before returning.
    pub async fn set_next_seed_production(
        &self,
        castle: CastleId,
        list: Vec<SeedProduction>,
    ) -> Result<()> {
        let list: ProductionList = list.into_iter().map(Arc::new).collect();
        self.edit_castle(castle, |manor| manor.production_next = list)?;

        if self.config.save_all_actions {
            self.save_castle(castle).await?;
        }
        Ok(())
    }

    /// Replace a castle's next period crop procurement.
    ///
    /// Same rules as [`ManorManager::set_next_seed_production`].
    pub async fn set_next_crop_procure(
        &self,
        castle: CastleId,
        list: Vec<CropProcure>,
    ) -> Result<()> {
        let list: ProcureList = list.into_iter().map(Arc::new).collect();
        self.edit_castle(castle, |manor| manor.procure_next = list)?;

        if self.config.save_all_actions {
            self.save_castle(castle).await?;
        }
        Ok(())
    }

    fn edit_castle(&self, castle: CastleId, edit: impl FnOnce(&mut CastleManor)) -> Result<()> {
        let mut state = self.write();
        let Some(manor) = state.castles.get_mut(&castle) else {
            warn!(castle = %castle, "Rejected next period edit for unknown castle");
            return Err(ManorError::UnknownCastle(castle));
        };
        edit(manor);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Costs
    // ---------------------------------------------------------------------

    /// Currency a castle's period commits: seeds at reference price plus
    /// crops at procurement price, both by start amount.
    #[must_use]
    pub fn manor_cost(&self, castle: CastleId, next: bool) -> u64 {
        let (production, procure) = self.period(castle, next);
        self.cost_of(&production, &procure)
    }

    fn cost_of(&self, production: &[Arc<SeedProduction>], procure: &[Arc<CropProcure>]) -> u64 {
        let seeds = production
            .iter()
            .map(|s| {
                let reference = self
                    .catalog
                    .seed_reference_price(s.seed_id())
                    .unwrap_or_else(|| {
                        warn!(seed = %s.seed_id(), "No reference price, costing seed at zero");
                        0
                    });
                reference.saturating_mul(s.start_amount())
            })
            .fold(0u64, u64::saturating_add);
        let crops = procure
            .iter()
            .map(|c| c.price().saturating_mul(c.start_amount()))
            .fold(0u64, u64::saturating_add);
        seeds.saturating_add(crops)
    }

    // ---------------------------------------------------------------------
    // State machine
    // ---------------------------------------------------------------------

    /// Advance the mode one step and apply its side effects.
    ///
    /// Returns the new mode. A `Disabled` manor stays disabled.
    pub async fn change_mode(&self) -> Result<ManorMode> {
        let (from, to) = self.advance_mode();
        if from == to {
            return Ok(to);
        }
        info!(from = %from, to = %to, "Manor mode changed");

        if matches!(to, ManorMode::Maintenance | ManorMode::Approved) {
            self.save().await?;
        }
        Ok(to)
    }

    fn advance_mode(&self) -> (ManorMode, ManorMode) {
        let mut state = self.write();
        let from = state.mode;
        let to = match from {
            ManorMode::Approved => {
                self.rotate_periods(&mut state);
                ManorMode::Maintenance
            }
            ManorMode::Maintenance => ManorMode::Modifiable,
            ManorMode::Modifiable => {
                self.approve_next_periods(&mut state);
                ManorMode::Approved
            }
            ManorMode::Disabled => ManorMode::Disabled,
        };
        state.mode = to;
        (from, to)
    }

    fn rotate_periods(&self, state: &mut ManorState) {
        for (&castle, manor) in &mut state.castles {
            let refund = manor
                .procure
                .iter()
                .map(|c| c.unspent_funds())
                .fold(0u64, u64::saturating_add);
            if refund > 0 {
                self.treasury.add_to_treasury(castle, credit(refund));
                debug!(castle = %castle, refund, "Refunded unspent crop procurement");
            }

            manor.production = Arc::clone(&manor.production_next);
            manor.procure = Arc::clone(&manor.procure_next);

            let cost = self.cost_of(&manor.production, &manor.procure);
            let treasury = self.treasury.treasury(castle);
            if treasury < cost {
                warn!(
                    castle = %castle,
                    cost,
                    treasury,
                    "Treasury cannot cover another manor period, clearing next period"
                );
                manor.clear_next();
            } else {
                manor.production_next = manor
                    .production
                    .iter()
                    .map(|s| Arc::new(s.refilled()))
                    .collect();
                manor.procure_next = manor
                    .procure
                    .iter()
                    .map(|c| Arc::new(c.refilled()))
                    .collect();
            }
        }
    }

    fn approve_next_periods(&self, state: &mut ManorState) {
        for (&castle, manor) in &mut state.castles {
            let cost = self.cost_of(&manor.production_next, &manor.procure_next);
            let treasury = self.treasury.treasury(castle);
            if treasury < cost {
                warn!(
                    castle = %castle,
                    cost,
                    treasury,
                    "Treasury cannot pay for next manor period, discarding it"
                );
                manor.clear_next();
            } else if cost > 0 {
                self.treasury.add_to_treasury(castle, debit(cost));
                debug!(castle = %castle, cost, "Paid for next manor period");
            }
        }
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Wipe a castle's manor in memory and in the store.
    pub async fn reset_manor_data(&self, castle: CastleId) -> Result<()> {
        let _persist = self.persist.lock().await;
        self.clear_castle(castle);
        self.with_deadline(castle, StoreOp::DeleteAll, self.store.delete_all(castle))
            .await?;
        info!(castle = %castle, "Manor data reset");
        Ok(())
    }

    fn clear_castle(&self, castle: CastleId) {
        if let Some(manor) = self.write().castles.get_mut(&castle) {
            *manor = CastleManor::default();
        }
    }

    /// Persist every castle. Stops at the first castle that fails.
    pub async fn save(&self) -> Result<()> {
        let _persist = self.persist.lock().await;
        let snapshots = self.snapshot_rows();
        let castle_count = snapshots.len();
        for (castle, production, procure) in snapshots {
            self.with_deadline(
                castle,
                StoreOp::SaveAll,
                self.store.save_all(castle, production, procure),
            )
            .await?;
        }
        debug!(castles = castle_count, "Manor data saved");
        Ok(())
    }

    /// Persist a single castle. Unknown castles are a no-op.
    pub async fn save_castle(&self, castle: CastleId) -> Result<()> {
        let _persist = self.persist.lock().await;
        let Some((production, procure)) = self.castle_rows(castle) else {
            return Ok(());
        };
        self.with_deadline(
            castle,
            StoreOp::SaveAll,
            self.store.save_all(castle, production, procure),
        )
        .await
    }

    fn snapshot_rows(&self) -> Vec<CastleRows> {
        self.read()
            .castles
            .iter()
            .map(|(&castle, manor)| {
                let (production, procure) = manor.rows(castle);
                (castle, production, procure)
            })
            .collect()
    }

    fn castle_rows(&self, castle: CastleId) -> Option<(Vec<ProductionRow>, Vec<ProcureRow>)> {
        self.read().castles.get(&castle).map(|m| m.rows(castle))
    }

    // ---------------------------------------------------------------------
    // Background loops
    // ---------------------------------------------------------------------

    /// Change mode at each scheduled boundary until shutdown is signalled.
    ///
    /// Errors are logged and the loop keeps going. Returns immediately when
    /// the manor is disabled. Shutdown never forces an extra transition.
    pub async fn run_mode_loop(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                return;
            }
            let now = self.clock.now();
            let Some(next) = self.config.schedule.next_transition(self.mode(), now) else {
                debug!("Manor disabled, mode loop idle");
                return;
            };
            let delay = (next - now).to_std().unwrap_or(Duration::ZERO);
            debug!(next = %next, "Next manor mode change scheduled");

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => {
                    debug!("Manor mode loop stopping");
                    return;
                }
            }

            if let Err(e) = self.change_mode().await {
                warn!(error = %e, "Manor mode change failed");
            }
        }
    }

    /// Save every `interval` until shutdown, then save once more.
    ///
    /// Periodic failures are logged and retried next tick. After shutdown
    /// this returns the final save's error if it failed, otherwise
    /// [`ManorError::Cancelled`].
    pub async fn run_save_loop(
        &self,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.save().await {
                        warn!(error = %e, "Periodic manor save failed");
                    }
                }
                _ = shutdown.changed() => {
                    debug!("Manor save loop stopping, saving one last time");
                    self.save().await?;
                    return Err(ManorError::Cancelled);
                }
            }
        }
    }
}

/// Turn stored rows into a castle's lists, dropping rows that cannot be trusted.
fn load_castle(
    castle: CastleId,
    production_rows: &[ProductionRow],
    procure_rows: &[ProcureRow],
    seed_ids: &BTreeSet<SeedId>,
    crop_ids: &BTreeSet<CropId>,
) -> CastleManor {
    let mut production = Vec::new();
    let mut production_next = Vec::new();
    for row in production_rows {
        if !seed_ids.contains(&row.seed_id) {
            warn!(castle = %castle, seed = %row.seed_id, "Skipping manor row for unknown seed");
            continue;
        }
        match row.to_seed() {
            Ok(seed) if row.next_period => production_next.push(Arc::new(seed)),
            Ok(seed) => production.push(Arc::new(seed)),
            Err(e) => warn!(castle = %castle, error = %e, "Skipping invalid manor production row"),
        }
    }

    let mut procure = Vec::new();
    let mut procure_next = Vec::new();
    for row in procure_rows {
        if !crop_ids.contains(&row.crop_id) {
            warn!(castle = %castle, crop = %row.crop_id, "Skipping manor row for unknown crop");
            continue;
        }
        match row.to_crop() {
            Ok(crop) if row.next_period => procure_next.push(Arc::new(crop)),
            Ok(crop) => procure.push(Arc::new(crop)),
            Err(e) => warn!(castle = %castle, error = %e, "Skipping invalid manor procure row"),
        }
    }

    CastleManor {
        production: production.into(),
        production_next: production_next.into(),
        procure: procure.into(),
        procure_next: procure_next.into(),
    }
}
