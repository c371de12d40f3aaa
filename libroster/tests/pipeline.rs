//! End-to-end tests for the reactive user-list pipeline:
//! store -> repository -> state holder -> observers.

use std::time::Duration;

use libroster::config::Config;
use libroster::db::Database;
use libroster::service::RosterService;
use libroster::types::User;
use tokio::sync::watch;
use tokio::time::timeout;

async fn service() -> RosterService {
    let db = Database::in_memory().await.unwrap();
    RosterService::with_database(Config::default_config(), db)
}

async fn next_snapshot(rx: &mut watch::Receiver<Vec<User>>) -> Vec<User> {
    timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("no snapshot arrived")
        .unwrap();
    rx.borrow_and_update().clone()
}

#[tokio::test]
async fn push_view_always_matches_pull_view() {
    let service = service().await;
    let state = service.user_list().await.unwrap();
    let mut rx = state.subscribe();
    rx.borrow_and_update();

    // A mixed sequence of mutations; after each one the pushed snapshot
    // must equal a direct read-back of the store.
    state.add("Alice", "a@x.com", 30).await.unwrap();
    let pushed = next_snapshot(&mut rx).await;
    assert_eq!(pushed, service.database().list_users().await.unwrap());

    state.add("Bob", "b@x.com", 25).await.unwrap();
    let pushed = next_snapshot(&mut rx).await;
    assert_eq!(pushed, service.database().list_users().await.unwrap());

    let bob = pushed[1].clone();
    state
        .update(&User::new("Bob", "bob@y.com", 26).with_id(bob.id.unwrap()))
        .await
        .unwrap();
    let pushed = next_snapshot(&mut rx).await;
    assert_eq!(pushed, service.database().list_users().await.unwrap());
    assert_eq!(pushed[1].email, "bob@y.com");

    state.delete(&pushed[0]).await.unwrap();
    let pushed = next_snapshot(&mut rx).await;
    assert_eq!(pushed, service.database().list_users().await.unwrap());
    assert_eq!(pushed.len(), 1);
}

#[tokio::test]
async fn replace_on_conflict_keeps_one_row_per_identity() {
    let service = service().await;
    let state = service.user_list().await.unwrap();
    let mut rx = state.subscribe();
    rx.borrow_and_update();

    state.add("Alice", "a@x.com", 30).await.unwrap();
    next_snapshot(&mut rx).await;

    // Insert with the same identity replaces, never duplicates
    service
        .repository()
        .insert(&User::new("Alicia", "alicia@x.com", 31).with_id(1))
        .await
        .unwrap();

    let snapshot = next_snapshot(&mut rx).await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, Some(1));
    assert_eq!(snapshot[0].name, "Alicia");
}

#[tokio::test]
async fn late_observer_catches_up_without_waiting() {
    let service = service().await;

    for i in 0..5i64 {
        service
            .repository()
            .insert(&User::new(format!("user{i}"), format!("u{i}@x.com"), 20 + i))
            .await
            .unwrap();
    }

    // State holder created after the writes: its cell must already hold all 5
    let state = service.user_list().await.unwrap();
    let snapshot = state.subscribe().borrow().clone();
    assert_eq!(snapshot.len(), 5);
    assert_eq!(snapshot[4].name, "user4");
}

#[tokio::test]
async fn two_observers_see_identical_snapshots() {
    let service = service().await;
    let state = service.user_list().await.unwrap();

    let mut rx1 = state.subscribe();
    let mut rx2 = state.subscribe();
    rx1.borrow_and_update();
    rx2.borrow_and_update();

    state.add("Alice", "a@x.com", 30).await.unwrap();

    let s1 = next_snapshot(&mut rx1).await;
    let s2 = next_snapshot(&mut rx2).await;
    assert_eq!(s1, s2);
}

#[tokio::test]
async fn clear_twice_is_idempotent() {
    let service = service().await;
    let state = service.user_list().await.unwrap();

    state.add("Alice", "a@x.com", 30).await.unwrap();
    state.clear().await.unwrap();
    state.clear().await.unwrap();

    assert!(service.database().list_users().await.unwrap().is_empty());
    assert!(!*state.busy().borrow());
}

#[tokio::test]
async fn concurrent_mutations_settle_on_store_order() {
    let service = service().await;
    let state = std::sync::Arc::new(service.user_list().await.unwrap());

    let mut handles = Vec::new();
    for i in 0..10 {
        let state = std::sync::Arc::clone(&state);
        handles.push(tokio::spawn(async move {
            state
                .add(&format!("user{i}"), &format!("u{i}@x.com"), 20)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Whatever order the store committed, the final snapshot reflects it
    let final_rows = service.database().list_users().await.unwrap();
    assert_eq!(final_rows.len(), 10);

    let mut rx = state.subscribe();
    let mut settled = rx.borrow_and_update().clone();
    while settled.len() != 10 {
        settled = next_snapshot(&mut rx).await;
    }
    assert_eq!(settled, final_rows);
}
