mod common;

use std::collections::HashSet;

use api::error::AppError;
use api::services::ExpiryService;
use chrono::{Duration, Utc};
use common::*;
use infra::models::{LaneScheduleStatus, MembershipStatus, ReservationStatus};
use infra::BookingStore;
use uuid::Uuid;

async fn slot_status(app: &TestApp, id: Uuid) -> LaneScheduleStatus {
    app.store.get_slot(id).await.unwrap().unwrap().status
}

#[tokio::test]
async fn test_reserve_up_to_four_available_slots() {
    let app = setup_test_app();
    let seeded = seed_pool(&app.store, "Olympic Pool", 1);
    let coordinator = app.state.coordinator();

    for count in 1..=4 {
        let slots = seed_slots_on(&app, &seeded, count);
        let ids: Vec<Uuid> = slots.iter().map(|s| s.id).collect();
        let user_id = Uuid::new_v4();

        let reservation = coordinator
            .create_reservation(user_id, &ids)
            .await
            .expect("Reservation should succeed");

        assert_eq!(reservation.reservation.status, ReservationStatus::Pending);
        assert_eq!(reservation.reservation.user_id, user_id);
        assert_eq!(reservation.slot_ids(), ids, "Slots keep request order");
        for id in &ids {
            let slot = app.store.get_slot(*id).await.unwrap().unwrap();
            assert_eq!(slot.status, LaneScheduleStatus::Pending);
            assert_eq!(slot.reservation_id, Some(reservation.reservation.id));
        }
    }
}

/// Slots on a fresh date so every batch starts from available inventory.
fn seed_slots_on(
    app: &TestApp,
    seeded: &SeededPool,
    count: u32,
) -> Vec<infra::models::LaneScheduleRow> {
    let day = chrono::NaiveDate::from_ymd_opt(2024, 6, count).unwrap();
    (0..count)
        .map(|h| seed_slot(&app.store, &seeded.lanes[0], day, h))
        .collect()
}

#[tokio::test]
async fn test_second_user_conflicts_on_held_slot() {
    let app = setup_test_app();
    let seeded = seed_pool(&app.store, "Olympic Pool", 1);
    let date = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let slot = seed_slot(&app.store, &seeded.lanes[0], date, 0);
    let coordinator = app.state.coordinator();

    let first = coordinator
        .create_reservation(Uuid::new_v4(), &[slot.id])
        .await
        .unwrap();

    let err = coordinator
        .create_reservation(Uuid::new_v4(), &[slot.id])
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)), "got {err:?}");
    assert!(err.to_string().starts_with("slot already taken"));

    let held = app.store.get_slot(slot.id).await.unwrap().unwrap();
    assert_eq!(held.status, LaneScheduleStatus::Pending);
    assert_eq!(held.reservation_id, Some(first.reservation.id));
}

#[tokio::test]
async fn test_conflict_leaves_available_slots_untouched() {
    let app = setup_test_app();
    let seeded = seed_pool(&app.store, "Olympic Pool", 1);
    let slots = seed_slots(&app.store, &seeded.lanes[0], 3);
    assert!(app.store.block_slot(slots[1].id));

    let ids: Vec<Uuid> = slots.iter().map(|s| s.id).collect();
    let err = app
        .state
        .coordinator()
        .create_reservation(Uuid::new_v4(), &ids)
        .await
        .unwrap_err();

    assert_eq!(err.code(), "CONFLICT");
    assert!(err.to_string().contains(&slots[1].id.to_string()));
    assert_eq!(slot_status(&app, slots[0].id).await, LaneScheduleStatus::Available);
    assert_eq!(slot_status(&app, slots[1].id).await, LaneScheduleStatus::Blocked);
    assert_eq!(slot_status(&app, slots[2].id).await, LaneScheduleStatus::Available);
    assert!(app
        .store
        .get_slot(slots[0].id)
        .await
        .unwrap()
        .unwrap()
        .reservation_id
        .is_none());
}

#[tokio::test]
async fn test_unknown_slot_is_validation_error_without_effect() {
    let app = setup_test_app();
    let seeded = seed_pool(&app.store, "Olympic Pool", 1);
    let slots = seed_slots(&app.store, &seeded.lanes[0], 1);
    let holder = app
        .state
        .coordinator()
        .create_reservation(Uuid::new_v4(), &[slots[0].id])
        .await
        .unwrap();
    let missing = Uuid::new_v4();

    // Unknown ids are reported even when another slot is also taken
    let err = app
        .state
        .coordinator()
        .create_reservation(Uuid::new_v4(), &[slots[0].id, missing])
        .await
        .unwrap_err();

    assert_eq!(err.code(), "VALIDATION");
    assert!(err.to_string().contains(&missing.to_string()));
    let held = app.store.get_slot(slots[0].id).await.unwrap().unwrap();
    assert_eq!(held.status, LaneScheduleStatus::Pending);
    assert_eq!(held.reservation_id, Some(holder.reservation.id));
}

#[tokio::test]
async fn test_batch_shape_validation() {
    let app = setup_test_app();
    let seeded = seed_pool(&app.store, "Olympic Pool", 1);
    let slots = seed_slots(&app.store, &seeded.lanes[0], 5);
    let ids: Vec<Uuid> = slots.iter().map(|s| s.id).collect();
    let coordinator = app.state.coordinator();
    let user_id = Uuid::new_v4();

    let err = coordinator.create_reservation(user_id, &[]).await.unwrap_err();
    assert_eq!(err.to_string(), "no slots provided");

    let err = coordinator.create_reservation(user_id, &ids).await.unwrap_err();
    assert!(err.to_string().starts_with("cardinality exceeded"));

    let err = coordinator
        .create_reservation(user_id, &[ids[0], ids[0]])
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION");

    for id in &ids {
        assert_eq!(slot_status(&app, *id).await, LaneScheduleStatus::Available);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_have_one_winner() {
    let app = setup_test_app();
    let seeded = seed_pool(&app.store, "Olympic Pool", 1);
    let slot_id = seed_slots(&app.store, &seeded.lanes[0], 1)[0].id;

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let coordinator = app.state.coordinator();
            tokio::spawn(async move {
                coordinator
                    .create_reservation(Uuid::new_v4(), &[slot_id])
                    .await
            })
        })
        .collect();

    let results = futures_util::future::join_all(handles).await;
    let mut winners = 0;
    for result in results {
        match result.unwrap() {
            Ok(_) => winners += 1,
            Err(e) => assert_eq!(e.code(), "CONFLICT", "unexpected error: {e}"),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_batches_never_share_a_slot() {
    let app = setup_test_app();
    let seeded = seed_pool(&app.store, "Olympic Pool", 2);
    let slots = seed_slots(&app.store, &seeded.lanes[0], 4);
    let ids: Vec<Uuid> = slots.iter().map(|s| s.id).collect();

    // Every batch overlaps its neighbours by at least one slot
    let batches: Vec<Vec<Uuid>> = vec![
        vec![ids[0], ids[1]],
        vec![ids[1], ids[2]],
        vec![ids[2], ids[3]],
        vec![ids[3], ids[0]],
        vec![ids[0], ids[1], ids[2], ids[3]],
    ];

    let handles: Vec<_> = batches
        .into_iter()
        .map(|batch| {
            let coordinator = app.state.coordinator();
            tokio::spawn(async move { coordinator.create_reservation(Uuid::new_v4(), &batch).await })
        })
        .collect();

    let mut claimed = HashSet::new();
    for result in futures_util::future::join_all(handles).await {
        if let Ok(reservation) = result.unwrap() {
            for id in reservation.slot_ids() {
                assert!(claimed.insert(id), "slot {id} claimed twice");
            }
        }
    }
    assert!(!claimed.is_empty(), "at least one batch must win");

    for id in &ids {
        let slot = app.store.get_slot(*id).await.unwrap().unwrap();
        assert_eq!(slot.status == LaneScheduleStatus::Pending, claimed.contains(id));
    }
}

#[tokio::test]
async fn test_release_reverts_slots_and_is_idempotent() {
    let app = setup_test_app();
    let seeded = seed_pool(&app.store, "Olympic Pool", 1);
    let slots = seed_slots(&app.store, &seeded.lanes[0], 2);
    let ids: Vec<Uuid> = slots.iter().map(|s| s.id).collect();
    let coordinator = app.state.coordinator();

    let reservation = coordinator
        .create_reservation(Uuid::new_v4(), &ids)
        .await
        .unwrap();
    let id = reservation.reservation.id;

    let released = coordinator.release_slots(id).await.unwrap();
    assert_eq!(released.reservation.status, ReservationStatus::Canceled);
    for slot in &released.slots {
        assert_eq!(slot.status, LaneScheduleStatus::Available);
        assert!(slot.reservation_id.is_none());
    }

    let again = coordinator.release_slots(id).await.unwrap();
    assert_eq!(again.reservation.status, ReservationStatus::Canceled);

    // Released slots can be booked again
    coordinator
        .create_reservation(Uuid::new_v4(), &ids)
        .await
        .expect("Released slots should be bookable");
}

#[tokio::test]
async fn test_release_unknown_reservation_is_not_found() {
    let app = setup_test_app();

    let err = app
        .state
        .coordinator()
        .release_slots(Uuid::new_v4())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_confirm_then_release() {
    let app = setup_test_app();
    let seeded = seed_pool(&app.store, "Olympic Pool", 1);
    let slots = seed_slots(&app.store, &seeded.lanes[0], 2);
    let ids: Vec<Uuid> = slots.iter().map(|s| s.id).collect();
    let admin_id = create_pool_admin(&app.store, seeded.pool.id);
    let coordinator = app.state.coordinator();

    let reservation = coordinator
        .create_reservation(Uuid::new_v4(), &ids)
        .await
        .unwrap();
    let id = reservation.reservation.id;

    let confirmed = coordinator.confirm(admin_id, id).await.unwrap();
    assert_eq!(confirmed.reservation.status, ReservationStatus::Confirmed);
    assert!(confirmed
        .slots
        .iter()
        .all(|s| s.status == LaneScheduleStatus::Confirmed));

    // Confirming twice is a conflict, not a silent success
    let err = coordinator.confirm(admin_id, id).await.unwrap_err();
    assert_eq!(err.code(), "CONFLICT");

    let released = coordinator.release_slots(id).await.unwrap();
    assert_eq!(released.reservation.status, ReservationStatus::Canceled);
    for id in &ids {
        assert_eq!(slot_status(&app, *id).await, LaneScheduleStatus::Available);
    }
}

#[tokio::test]
async fn test_reject_releases_slots() {
    let app = setup_test_app();
    let seeded = seed_pool(&app.store, "Olympic Pool", 1);
    let slots = seed_slots(&app.store, &seeded.lanes[0], 1);
    let admin_id = create_pool_admin(&app.store, seeded.pool.id);
    let coordinator = app.state.coordinator();

    let reservation = coordinator
        .create_reservation(Uuid::new_v4(), &[slots[0].id])
        .await
        .unwrap();

    let rejected = coordinator
        .reject(admin_id, reservation.reservation.id)
        .await
        .unwrap();

    assert_eq!(rejected.reservation.status, ReservationStatus::Rejected);
    assert_eq!(slot_status(&app, slots[0].id).await, LaneScheduleStatus::Available);

    let err = coordinator
        .confirm(admin_id, reservation.reservation.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CONFLICT");
}

#[tokio::test]
async fn test_confirm_requires_active_membership() {
    let app = setup_test_app();
    let seeded = seed_pool(&app.store, "Olympic Pool", 1);
    let other = seed_pool(&app.store, "Other Pool", 1);
    let slots = seed_slots(&app.store, &seeded.lanes[0], 1);
    let coordinator = app.state.coordinator();

    let reservation = coordinator
        .create_reservation(Uuid::new_v4(), &[slots[0].id])
        .await
        .unwrap();
    let id = reservation.reservation.id;

    let stranger = Uuid::new_v4();
    let other_admin = create_pool_admin(&app.store, other.pool.id);
    let disabled_admin = Uuid::new_v4();
    app.store
        .grant_membership(disabled_admin, seeded.pool.id, MembershipStatus::Disabled);

    for admin_id in [stranger, other_admin, disabled_admin] {
        let err = coordinator.confirm(admin_id, id).await.unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }
    assert_eq!(slot_status(&app, slots[0].id).await, LaneScheduleStatus::Pending);
}

#[tokio::test]
async fn test_only_owner_or_admin_can_cancel_or_view() {
    let app = setup_test_app();
    let seeded = seed_pool(&app.store, "Olympic Pool", 1);
    let slots = seed_slots(&app.store, &seeded.lanes[0], 1);
    let admin_id = create_pool_admin(&app.store, seeded.pool.id);
    let owner = Uuid::new_v4();
    let coordinator = app.state.coordinator();

    let reservation = coordinator
        .create_reservation(owner, &[slots[0].id])
        .await
        .unwrap();
    let id = reservation.reservation.id;

    let stranger = Uuid::new_v4();
    assert_eq!(
        coordinator.get_reservation(stranger, id).await.unwrap_err().code(),
        "FORBIDDEN"
    );
    assert_eq!(
        coordinator
            .cancel_reservation(stranger, id)
            .await
            .unwrap_err()
            .code(),
        "FORBIDDEN"
    );

    assert!(coordinator.get_reservation(owner, id).await.is_ok());
    assert!(coordinator.get_reservation(admin_id, id).await.is_ok());

    let canceled = coordinator.cancel_reservation(owner, id).await.unwrap();
    assert_eq!(canceled.reservation.status, ReservationStatus::Canceled);
}

#[tokio::test]
async fn test_expiry_releases_only_stale_pending_reservations() {
    let app = setup_test_app();
    let seeded = seed_pool(&app.store, "Olympic Pool", 1);
    let slots = seed_slots(&app.store, &seeded.lanes[0], 3);
    let admin_id = create_pool_admin(&app.store, seeded.pool.id);
    let coordinator = app.state.coordinator();

    let stale = coordinator
        .create_reservation(Uuid::new_v4(), &[slots[0].id])
        .await
        .unwrap();
    let fresh = coordinator
        .create_reservation(Uuid::new_v4(), &[slots[1].id])
        .await
        .unwrap();
    let confirmed = coordinator
        .create_reservation(Uuid::new_v4(), &[slots[2].id])
        .await
        .unwrap();
    coordinator
        .confirm(admin_id, confirmed.reservation.id)
        .await
        .unwrap();

    let long_ago = Utc::now() - Duration::hours(2);
    app.store
        .set_reservation_created_at(stale.reservation.id, long_ago);
    app.store
        .set_reservation_created_at(confirmed.reservation.id, long_ago);

    let mut config = api::config::AppConfig::for_tests("test-secret");
    config.reservation_pending_ttl_minutes = 30;
    let state = api::AppState::new(app.store.clone(), config);

    let released = ExpiryService::new(state).sweep().await.unwrap();
    assert_eq!(released, 1);

    assert_eq!(slot_status(&app, slots[0].id).await, LaneScheduleStatus::Available);
    assert_eq!(slot_status(&app, slots[1].id).await, LaneScheduleStatus::Pending);
    assert_eq!(slot_status(&app, slots[2].id).await, LaneScheduleStatus::Confirmed);

    let fresh_after = app
        .store
        .get_reservation(fresh.reservation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fresh_after.reservation.status, ReservationStatus::Pending);
}

#[tokio::test]
async fn test_store_outage_is_retryable_infra_error() {
    let app = setup_test_app();
    let seeded = seed_pool(&app.store, "Olympic Pool", 1);
    let slots = seed_slots(&app.store, &seeded.lanes[0], 1);
    app.store.set_unavailable(true);

    let err = app
        .state
        .coordinator()
        .create_reservation(Uuid::new_v4(), &[slots[0].id])
        .await
        .unwrap_err();

    assert_eq!(err.code(), "INFRA");
    assert!(err.retryable());
    assert_eq!(err.to_string(), "reservation failed");
}
