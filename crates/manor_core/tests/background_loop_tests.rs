//! Mode loop, save loop and service lifecycle under paused tokio time.

use std::sync::Arc;
use std::time::Duration;

use manor_core::prelude::*;
use manor_test_utils::clock::{test_day_at, ManualClock};
use manor_test_utils::faults::FaultyStore;
use manor_test_utils::fixtures::{self, seed_offer, ADEN, DARK_COBOL};
use tokio::sync::watch;

fn manager_at<S: ManorStore>(store: S, hour: u32, minute: u32) -> Arc<ManorManager<S>> {
    Arc::new(fixtures::manager(
        store,
        fixtures::treasury(1_000_000, 0),
        Arc::new(ManualClock::at(hour, minute)),
        ManorConfig::default(),
    ))
}

#[tokio::test(start_paused = true)]
async fn mode_loop_changes_mode_at_boundary() {
    let clock = Arc::new(ManualClock::at(5, 59));
    let manager = Arc::new(fixtures::manager(
        MemoryManorStore::new(),
        fixtures::treasury(0, 0),
        Arc::clone(&clock),
        ManorConfig::default(),
    ));
    manager.init().await.unwrap();
    assert!(manager.is_approved());
    assert_eq!(manager.next_mode_change(), Some(test_day_at(6, 0)));

    let (tx, rx) = watch::channel(false);
    let task = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.run_mode_loop(rx).await })
    };

    tokio::time::sleep(Duration::from_secs(59)).await;
    assert!(manager.is_approved());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(manager.is_under_maintenance());

    // Wall clock catches up with the boundary the loop slept through
    clock.advance(chrono::Duration::minutes(1));
    assert_eq!(manager.next_mode_change(), Some(test_day_at(6, 3)));

    tx.send(true).unwrap();
    task.await.unwrap();
    assert!(manager.is_under_maintenance());
}

#[tokio::test]
async fn next_mode_change_follows_clock() {
    let clock = Arc::new(ManualClock::at(10, 0));
    let manager = fixtures::manager(
        MemoryManorStore::new(),
        fixtures::treasury(0, 0),
        Arc::clone(&clock),
        ManorConfig::default(),
    );
    manager.init().await.unwrap();
    assert_eq!(manager.next_mode_change(), Some(test_day_at(20, 0)));

    clock.set(test_day_at(23, 0));
    manager.change_mode().await.unwrap(); // Approved

    // Refresh is tomorrow morning
    let tomorrow = test_day_at(6, 0) + chrono::Duration::days(1);
    assert_eq!(manager.next_mode_change(), Some(tomorrow));
}

#[tokio::test(start_paused = true)]
async fn mode_loop_exits_when_disabled() {
    let manager = Arc::new(fixtures::manager(
        MemoryManorStore::new(),
        fixtures::treasury(0, 0),
        Arc::new(ManualClock::at(10, 0)),
        ManorConfig {
            enabled: false,
            ..ManorConfig::default()
        },
    ));
    manager.init().await.unwrap();

    let (_tx, rx) = watch::channel(false);
    manager.run_mode_loop(rx).await;

    assert!(manager.is_disabled());
}

#[tokio::test(start_paused = true)]
async fn save_loop_saves_every_interval() {
    let store = MemoryManorStore::new();
    let manager = manager_at(store.clone(), 10, 0);
    manager.init().await.unwrap();
    manager
        .set_next_seed_production(ADEN, vec![seed_offer(DARK_COBOL, 3, 3)])
        .await
        .unwrap();

    let (tx, rx) = watch::channel(false);
    let task = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.run_save_loop(Duration::from_secs(60), rx).await })
    };

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(store.rows(ADEN).is_none());

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(store.rows(ADEN).is_some());

    tx.send(true).unwrap();
    assert!(matches!(task.await.unwrap(), Err(ManorError::Cancelled)));
}

#[tokio::test(start_paused = true)]
async fn save_loop_reports_failed_final_save() {
    let store = FaultyStore::new(MemoryManorStore::new());
    let manager = manager_at(store.clone(), 10, 0);
    manager.init().await.unwrap();
    store.fail_saves(true);

    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();
    let outcome = manager.run_save_loop(Duration::from_secs(60), rx).await;

    assert!(matches!(outcome, Err(ManorError::Store { .. })));
}

#[tokio::test(start_paused = true)]
async fn service_stop_performs_final_save() {
    let store = MemoryManorStore::new();
    let manager = manager_at(store.clone(), 10, 0);
    manager.init().await.unwrap();
    let service = ManorService::start(Arc::clone(&manager));

    service
        .manager()
        .set_next_seed_production(ADEN, vec![seed_offer(DARK_COBOL, 8, 2)])
        .await
        .unwrap();
    assert!(store.rows(ADEN).is_none());

    service.stop().await.unwrap();

    let (production, _) = store.rows(ADEN).unwrap();
    assert_eq!(production.len(), 1);
    assert!(manager.is_modifiable());
}

#[tokio::test(start_paused = true)]
async fn service_stop_surfaces_final_save_error() {
    let store = FaultyStore::new(MemoryManorStore::new());
    let manager = manager_at(store.clone(), 10, 0);
    manager.init().await.unwrap();
    let service = ManorService::start(manager);
    store.fail_saves(true);

    assert!(service.stop().await.is_err());
}
