//! Saving, loading and resetting manor rows through the store seam.

use std::sync::Arc;
use std::time::Duration;

use manor_core::prelude::*;
use manor_test_utils::clock::ManualClock;
use manor_test_utils::faults::FaultyStore;
use manor_test_utils::fixtures::{
    self, crop_offer, seed_offer, ADEN, CHILLY_COBOL, DARK_COBOL, GIRAN, RIPE_DARK_COBOL,
};

fn manager_over<S: ManorStore>(store: S, config: ManorConfig) -> ManorManager<S> {
    fixtures::manager(
        store,
        fixtures::treasury(1_000_000, 1_000_000),
        Arc::new(ManualClock::at(10, 0)),
        config,
    )
}

#[tokio::test]
async fn saved_state_survives_restart() {
    let store = MemoryManorStore::new();
    let first = manager_over(store.clone(), ManorConfig::default());
    first.init().await.unwrap();
    first
        .set_next_seed_production(ADEN, vec![seed_offer(DARK_COBOL, 40, 15)])
        .await
        .unwrap();
    first
        .set_next_crop_procure(ADEN, vec![crop_offer(RIPE_DARK_COBOL, 20, 300)])
        .await
        .unwrap();
    first.change_mode().await.unwrap(); // Approved
    first.change_mode().await.unwrap(); // Maintenance
    first
        .seed_product(ADEN, DARK_COBOL, false)
        .unwrap()
        .decrease_amount(7);
    first.save().await.unwrap();

    let second = manager_over(store, ManorConfig::default());
    second.init().await.unwrap();

    let seed = second.seed_product(ADEN, DARK_COBOL, false).unwrap();
    assert_eq!(seed.amount(), 33);
    assert_eq!(seed.start_amount(), 40);
    assert_eq!(seed.price(), 15);
    assert_eq!(
        second.seed_product(ADEN, DARK_COBOL, true).unwrap().amount(),
        40
    );
    let crop = second.crop_procure(ADEN, RIPE_DARK_COBOL, false).unwrap();
    assert_eq!(crop.amount(), 20);
    assert_eq!(crop.reward_type(), RewardType::First);
}

#[tokio::test]
async fn file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let first = manager_over(FileManorStore::new(dir.path()), ManorConfig::default());
    first.init().await.unwrap();
    first
        .set_next_seed_production(GIRAN, vec![seed_offer(CHILLY_COBOL, 12, 60)])
        .await
        .unwrap();
    first.save().await.unwrap();

    let second = manager_over(FileManorStore::new(dir.path()), ManorConfig::default());
    second.init().await.unwrap();

    let next = second.seed_production(GIRAN, true);
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].seed_id(), CHILLY_COBOL);
    assert_eq!(next[0].start_amount(), 12);
}

#[tokio::test]
async fn init_skips_rows_for_unknown_items() {
    let store = MemoryManorStore::new();
    store.insert_rows(
        ADEN,
        vec![
            ProductionRow {
                castle_id: ADEN,
                seed_id: DARK_COBOL,
                amount: 1,
                start_amount: 2,
                price: 3,
                next_period: false,
            },
            ProductionRow {
                castle_id: ADEN,
                seed_id: SeedId::new(9_999),
                amount: 1,
                start_amount: 2,
                price: 3,
                next_period: false,
            },
        ],
        vec![ProcureRow {
            castle_id: ADEN,
            crop_id: CropId::new(9_998),
            amount: 1,
            start_amount: 2,
            price: 3,
            reward_type: RewardType::Second,
            next_period: true,
        }],
    );

    let manager = manager_over(store, ManorConfig::default());
    manager.init().await.unwrap();

    let production = manager.seed_production(ADEN, false);
    assert_eq!(production.len(), 1);
    assert_eq!(production[0].seed_id(), DARK_COBOL);
    assert!(manager.crop_procure_list(ADEN, true).is_empty());
}

#[tokio::test]
async fn save_all_actions_persists_each_edit() {
    let store = MemoryManorStore::new();
    let manager = manager_over(
        store.clone(),
        ManorConfig {
            save_all_actions: true,
            ..ManorConfig::default()
        },
    );
    manager.init().await.unwrap();

    manager
        .set_next_seed_production(ADEN, vec![seed_offer(DARK_COBOL, 5, 5)])
        .await
        .unwrap();

    let (production, procure) = store.rows(ADEN).unwrap();
    assert_eq!(production.len(), 1);
    assert!(production[0].next_period);
    assert!(procure.is_empty());
    assert!(store.rows(GIRAN).is_none());
}

#[tokio::test]
async fn edits_wait_for_save_without_save_all_actions() {
    let store = MemoryManorStore::new();
    let manager = manager_over(store.clone(), ManorConfig::default());
    manager.init().await.unwrap();

    manager
        .set_next_seed_production(ADEN, vec![seed_offer(DARK_COBOL, 5, 5)])
        .await
        .unwrap();

    assert!(store.rows(ADEN).is_none());
}

#[tokio::test]
async fn reset_wipes_memory_and_store() {
    let store = MemoryManorStore::new();
    let manager = manager_over(store.clone(), ManorConfig::default());
    manager.init().await.unwrap();
    manager
        .set_next_seed_production(ADEN, vec![seed_offer(DARK_COBOL, 5, 5)])
        .await
        .unwrap();
    manager
        .set_next_seed_production(GIRAN, vec![seed_offer(CHILLY_COBOL, 5, 5)])
        .await
        .unwrap();
    manager.save().await.unwrap();

    manager.reset_manor_data(ADEN).await.unwrap();

    assert!(manager.seed_production(ADEN, true).is_empty());
    assert!(store.rows(ADEN).is_none());
    assert_eq!(manager.seed_production(GIRAN, true).len(), 1);
    assert!(store.rows(GIRAN).is_some());
}

#[tokio::test]
async fn load_failure_names_castle_and_operation() {
    let store = FaultyStore::new(MemoryManorStore::new());
    store.fail_loads(true);
    let manager = manager_over(store, ManorConfig::default());

    let err = manager.init().await.unwrap_err();

    assert!(matches!(
        err,
        ManorError::Store {
            castle: ADEN,
            op: StoreOp::LoadProduction,
            ..
        }
    ));
    assert!(manager.is_disabled());
}

#[tokio::test]
async fn save_failure_is_reported() {
    let store = FaultyStore::new(MemoryManorStore::new());
    let manager = manager_over(store.clone(), ManorConfig::default());
    manager.init().await.unwrap();
    store.fail_saves(true);

    let err = manager.save().await.unwrap_err();
    assert!(matches!(
        err,
        ManorError::Store {
            op: StoreOp::SaveAll,
            ..
        }
    ));

    store.fail_saves(false);
    manager.save().await.unwrap();
    assert!(store.inner().rows(ADEN).is_some());
}

#[tokio::test]
async fn failed_transition_save_keeps_new_mode() {
    let store = FaultyStore::new(MemoryManorStore::new());
    let manager = manager_over(store.clone(), ManorConfig::default());
    manager.init().await.unwrap();
    store.fail_saves(true);

    assert!(manager.change_mode().await.is_err());
    assert!(manager.is_approved());
}

#[tokio::test]
async fn reset_failure_is_reported() {
    let store = FaultyStore::new(MemoryManorStore::new());
    let manager = manager_over(store.clone(), ManorConfig::default());
    manager.init().await.unwrap();
    store.fail_deletes(true);

    let err = manager.reset_manor_data(GIRAN).await.unwrap_err();
    assert!(matches!(
        err,
        ManorError::Store {
            castle: GIRAN,
            op: StoreOp::DeleteAll,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn stalled_save_times_out() {
    let store = FaultyStore::new(MemoryManorStore::new());
    let manager = manager_over(
        store.clone(),
        ManorConfig {
            store_timeout_secs: 5,
            ..ManorConfig::default()
        },
    );
    manager.init().await.unwrap();
    store.stall_saves(true);

    let started = tokio::time::Instant::now();
    let err = manager.save_castle(ADEN).await.unwrap_err();

    assert!(matches!(
        err,
        ManorError::StoreTimeout {
            castle: ADEN,
            op: StoreOp::SaveAll
        }
    ));
    assert!(started.elapsed() >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn slow_periodic_save_cannot_undo_rotation() {
    let store = FaultyStore::new(MemoryManorStore::new());
    let manager = Arc::new(manager_over(store.clone(), ManorConfig::default()));
    manager.init().await.unwrap();
    manager
        .set_next_seed_production(ADEN, vec![seed_offer(DARK_COBOL, 40, 15)])
        .await
        .unwrap();
    manager.change_mode().await.unwrap(); // Approved

    // A periodic save copies pre-rotation rows, then lingers in the store
    store.delay_next_save(Duration::from_millis(200));
    let periodic = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.save().await })
    };
    tokio::task::yield_now().await;

    manager.change_mode().await.unwrap(); // Maintenance, rotates and saves
    periodic.await.unwrap().unwrap();

    let (rows, _) = store.inner().rows(ADEN).unwrap();
    assert_eq!(rows.iter().filter(|r| !r.next_period).count(), 1);

    let restarted = manager_over(store.inner().clone(), ManorConfig::default());
    restarted.init().await.unwrap();
    assert_eq!(
        restarted.seed_product(ADEN, DARK_COBOL, false).unwrap().amount(),
        40
    );
}

#[tokio::test]
async fn edits_for_unlisted_castle_are_rejected() {
    let store = MemoryManorStore::new();
    let manager = manager_over(
        store.clone(),
        ManorConfig {
            save_all_actions: true,
            ..ManorConfig::default()
        },
    );
    manager.init().await.unwrap();
    let stranger = CastleId::new(99);

    let err = manager
        .set_next_seed_production(stranger, vec![seed_offer(DARK_COBOL, 5, 5)])
        .await
        .unwrap_err();
    assert!(matches!(err, ManorError::UnknownCastle(id) if id == stranger));
    assert!(manager
        .set_next_crop_procure(stranger, vec![crop_offer(RIPE_DARK_COBOL, 5, 5)])
        .await
        .is_err());

    assert_eq!(manager.castle_ids(), vec![ADEN, GIRAN]);
    assert!(store.rows(stranger).is_none());
}
