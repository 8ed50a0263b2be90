//! Integration tests for the Enter/Exit state machine and the lot ledger.
//!
//! Each test runs against a fresh migrated database.

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parkwise_core::error::CoreError;
use parkwise_core::roles::UserRole;
use parkwise_core::session_status::SessionStatus;
use parkwise_db::ledger::{LotLedger, SessionLedger};
use parkwise_db::models::lot::{CreateLot, Lot, UpdateLot};
use parkwise_db::models::session::EnterLot;
use parkwise_db::models::user::{CreateUser, User};
use parkwise_db::repositories::{LotRepo, SessionRepo, UserRepo};
use parkwise_db::LedgerError;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, username: &str) -> User {
    let input = CreateUser {
        username: username.to_string(),
        password_hash: "not-a-real-hash".to_string(),
        role: UserRole::Customer,
    };
    UserRepo::create(pool, &input).await.unwrap()
}

async fn new_lot(pool: &PgPool, name: &str, capacity: i32, fee_rate: f64) -> Lot {
    let input = CreateLot {
        name: name.to_string(),
        location: format!("{name} Street"),
        description: String::new(),
        capacity,
        fee_rate,
    };
    LotRepo::create(pool, &input).await.unwrap()
}

fn enter(user: &User, lot: &Lot, plate: &str) -> EnterLot {
    EnterLot {
        user_id: user.id,
        lot_id: lot.id,
        vehicle_id: plate.to_string(),
    }
}

fn ten_am() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap()
}

async fn occupancy_of(pool: &PgPool, lot: &Lot) -> i32 {
    LotRepo::find_by_id(pool, lot.id).await.unwrap().unwrap().occupancy
}

// ---------------------------------------------------------------------------
// Enter
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn enter_creates_parked_session_and_takes_a_slot(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let lot = new_lot(&pool, "North", 2, 10.0).await;

    let session = SessionLedger::enter(&pool, &enter(&user, &lot, " ab 123 "), ten_am())
        .await
        .unwrap();

    assert_eq!(session.status, SessionStatus::Parked);
    assert_eq!(session.vehicle_id, "AB123");
    assert_eq!(session.amount, 0.0);
    assert!(session.exit_time.is_none());
    assert_eq!(session.entry_time, ten_am());
    assert_eq!(occupancy_of(&pool, &lot).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn enter_full_lot_fails_and_leaves_occupancy_unchanged(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let bob = new_user(&pool, "bob").await;
    let lot = new_lot(&pool, "Tiny", 1, 5.0).await;

    SessionLedger::enter(&pool, &enter(&alice, &lot, "A1"), ten_am())
        .await
        .unwrap();
    let err = SessionLedger::enter(&pool, &enter(&bob, &lot, "B2"), ten_am())
        .await
        .unwrap_err();

    assert_matches!(err, LedgerError::Rejected(CoreError::LotFull { lot_id }) if lot_id == lot.id);
    assert_eq!(occupancy_of(&pool, &lot).await, 1);
    assert!(SessionRepo::find_active_by_user(&pool, bob.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn enter_missing_lot_is_not_found(pool: PgPool) {
    let user = new_user(&pool, "alice").await;
    let input = EnterLot {
        user_id: user.id,
        lot_id: 9_999,
        vehicle_id: "ZZ9".into(),
    };

    let err = SessionLedger::enter(&pool, &input, ten_am()).await.unwrap_err();

    assert_matches!(err, LedgerError::Rejected(CoreError::NotFound { entity: "Lot", id: 9_999 }));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn vehicle_cannot_park_twice(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let bob = new_user(&pool, "bob").await;
    let north = new_lot(&pool, "North", 5, 1.0).await;
    let south = new_lot(&pool, "South", 5, 1.0).await;

    SessionLedger::enter(&pool, &enter(&alice, &north, "CAR-1"), ten_am())
        .await
        .unwrap();
    // Same plate written differently, different user, different lot.
    let err = SessionLedger::enter(&pool, &enter(&bob, &south, "car-1"), ten_am())
        .await
        .unwrap_err();

    assert_matches!(err, LedgerError::Rejected(CoreError::Conflict(_)));
    assert_eq!(occupancy_of(&pool, &south).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn user_cannot_hold_two_active_sessions(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let lot = new_lot(&pool, "North", 5, 1.0).await;

    SessionLedger::enter(&pool, &enter(&alice, &lot, "ONE"), ten_am())
        .await
        .unwrap();
    let err = SessionLedger::enter(&pool, &enter(&alice, &lot, "TWO"), ten_am())
        .await
        .unwrap_err();

    assert_matches!(err, LedgerError::Rejected(CoreError::Conflict(_)));
    assert_eq!(occupancy_of(&pool, &lot).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_plate_is_rejected_before_any_write(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let lot = new_lot(&pool, "North", 5, 1.0).await;

    let err = SessionLedger::enter(&pool, &enter(&alice, &lot, "   "), ten_am())
        .await
        .unwrap_err();

    assert_matches!(err, LedgerError::Rejected(CoreError::Validation(_)));
    assert_eq!(occupancy_of(&pool, &lot).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn racing_entries_for_last_slot_admit_exactly_one(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let bob = new_user(&pool, "bob").await;
    let lot = new_lot(&pool, "Last", 1, 3.0).await;

    let first = enter(&alice, &lot, "RACE-A");
    let second = enter(&bob, &lot, "RACE-B");
    let (a, b) = futures::join!(
        SessionLedger::enter(&pool, &first, ten_am()),
        SessionLedger::enter(&pool, &second, ten_am()),
    );

    let results = [a, b];
    let admitted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(admitted, 1, "exactly one racer may take the last slot");
    let rejected = results.into_iter().find_map(Result::err).unwrap();
    assert_matches!(rejected, LedgerError::Rejected(CoreError::LotFull { .. }));
    assert_eq!(occupancy_of(&pool, &lot).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_entries_never_exceed_capacity(pool: PgPool) {
    let lot = new_lot(&pool, "Busy", 3, 3.0).await;
    let mut inputs = Vec::new();
    for i in 0..8 {
        let user = new_user(&pool, &format!("driver{i}")).await;
        inputs.push(enter(&user, &lot, &format!("CAR{i}")));
    }

    let results = futures::future::join_all(
        inputs
            .iter()
            .map(|input| SessionLedger::enter(&pool, input, ten_am())),
    )
    .await;

    let admitted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(admitted, 3);
    for err in results.into_iter().filter_map(Result::err) {
        assert_matches!(err, LedgerError::Rejected(CoreError::LotFull { .. }));
    }
    assert_eq!(occupancy_of(&pool, &lot).await, 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn same_plate_racing_into_two_lots_parks_once(pool: PgPool) {
    let north = new_lot(&pool, "North", 5, 2.0).await;
    let south = new_lot(&pool, "South", 5, 2.0).await;

    for round in 0..10 {
        let alice = new_user(&pool, &format!("alice{round}")).await;
        let bob = new_user(&pool, &format!("bob{round}")).await;
        let plate = format!("SAME{round}");
        let first = enter(&alice, &north, &plate);
        let second = enter(&bob, &south, &plate);

        let (a, b) = futures::join!(
            SessionLedger::enter(&pool, &first, ten_am()),
            SessionLedger::enter(&pool, &second, ten_am()),
        );

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let rejected = results.into_iter().find_map(Result::err).unwrap();
        assert_matches!(rejected, LedgerError::Rejected(CoreError::Conflict(_)));

        let active = SessionRepo::find_active_by_vehicle(&pool, &plate)
            .await
            .unwrap()
            .unwrap();
        SessionLedger::exit(&pool, active.id, active.user_id, ten_am())
            .await
            .unwrap();
    }

    assert_eq!(occupancy_of(&pool, &north).await, 0);
    assert_eq!(occupancy_of(&pool, &south).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_enter_and_exit_keep_the_counter_exact(pool: PgPool) {
    let lot = new_lot(&pool, "Shared", 2, 4.0).await;
    let first = new_user(&pool, "driver0").await;
    let mut parked = SessionLedger::enter(&pool, &enter(&first, &lot, "CAR0"), ten_am())
        .await
        .unwrap();

    for round in 1..=10 {
        let next = new_user(&pool, &format!("driver{round}")).await;
        let input = enter(&next, &lot, &format!("CAR{round}"));

        let (exited, entered) = futures::join!(
            SessionLedger::exit(&pool, parked.id, parked.user_id, ten_am()),
            SessionLedger::enter(&pool, &input, ten_am()),
        );

        assert_eq!(exited.unwrap().status, SessionStatus::Completed);
        parked = entered.unwrap();
        assert_eq!(occupancy_of(&pool, &lot).await, 1, "round {round}");
    }

    let active = SessionRepo::list_by_status(&pool, SessionStatus::Parked, 50, 0)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, parked.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn regional_plate_is_stored_by_character_length(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let bob = new_user(&pool, "bob").await;
    let lot = new_lot(&pool, "North", 5, 1.0).await;

    let session = SessionLedger::enter(&pool, &enter(&alice, &lot, "京a 12345"), ten_am())
        .await
        .unwrap();
    assert_eq!(session.vehicle_id, "京A12345");

    let long_plate = "京".repeat(20);
    let session = SessionLedger::enter(&pool, &enter(&bob, &lot, &long_plate), ten_am())
        .await
        .unwrap();
    assert_eq!(session.vehicle_id, long_plate);
    assert_eq!(occupancy_of(&pool, &lot).await, 2);
}

// ---------------------------------------------------------------------------
// Exit
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn exit_bills_completes_and_releases_the_slot(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let lot = new_lot(&pool, "North", 2, 10.0).await;
    let session = SessionLedger::enter(&pool, &enter(&alice, &lot, "AB123"), ten_am())
        .await
        .unwrap();

    let exit_at = ten_am() + Duration::minutes(90);
    let done = SessionLedger::exit(&pool, session.id, alice.id, exit_at)
        .await
        .unwrap();

    assert_eq!(done.status, SessionStatus::Completed);
    assert_eq!(done.exit_time, Some(exit_at));
    assert_eq!(done.amount, 15.0);
    assert_eq!(occupancy_of(&pool, &lot).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_exit_is_already_completed_without_side_effects(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let bob = new_user(&pool, "bob").await;
    let lot = new_lot(&pool, "North", 2, 10.0).await;
    let first = SessionLedger::enter(&pool, &enter(&alice, &lot, "AAA"), ten_am())
        .await
        .unwrap();
    SessionLedger::enter(&pool, &enter(&bob, &lot, "BBB"), ten_am())
        .await
        .unwrap();

    let exit_at = ten_am() + Duration::hours(1);
    let done = SessionLedger::exit(&pool, first.id, alice.id, exit_at)
        .await
        .unwrap();
    let err = SessionLedger::exit(&pool, first.id, alice.id, exit_at + Duration::hours(5))
        .await
        .unwrap_err();

    assert_matches!(
        err,
        LedgerError::Rejected(CoreError::AlreadyCompleted { session_id }) if session_id == first.id
    );
    // Bob is still parked; the slot count reflects only Alice's single exit.
    assert_eq!(occupancy_of(&pool, &lot).await, 1);
    let reread = SessionRepo::find_by_id(&pool, first.id).await.unwrap().unwrap();
    assert_eq!(reread.amount, done.amount);
    assert_eq!(reread.exit_time, done.exit_time);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn exit_by_another_user_is_forbidden(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let mallory = new_user(&pool, "mallory").await;
    let lot = new_lot(&pool, "North", 2, 10.0).await;
    let session = SessionLedger::enter(&pool, &enter(&alice, &lot, "AAA"), ten_am())
        .await
        .unwrap();

    let err = SessionLedger::exit(&pool, session.id, mallory.id, ten_am() + Duration::hours(1))
        .await
        .unwrap_err();

    assert_matches!(err, LedgerError::Rejected(CoreError::Forbidden(_)));
    let reread = SessionRepo::find_by_id(&pool, session.id).await.unwrap().unwrap();
    assert_eq!(reread.status, SessionStatus::Parked);
    assert!(reread.exit_time.is_none());
    assert_eq!(occupancy_of(&pool, &lot).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn exit_unknown_session_is_not_found(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;

    let err = SessionLedger::exit(&pool, 4_242, alice.id, ten_am())
        .await
        .unwrap_err();

    assert_matches!(err, LedgerError::Rejected(CoreError::NotFound { entity: "Session", .. }));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn vehicle_can_park_again_after_exit(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let lot = new_lot(&pool, "North", 1, 2.0).await;
    let first = SessionLedger::enter(&pool, &enter(&alice, &lot, "AAA"), ten_am())
        .await
        .unwrap();
    SessionLedger::exit(&pool, first.id, alice.id, ten_am() + Duration::hours(2))
        .await
        .unwrap();

    let second = SessionLedger::enter(&pool, &enter(&alice, &lot, "AAA"), ten_am() + Duration::hours(3))
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(occupancy_of(&pool, &lot).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn exit_with_drifted_counter_fails_loudly(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let lot = new_lot(&pool, "North", 2, 2.0).await;
    let session = SessionLedger::enter(&pool, &enter(&alice, &lot, "AAA"), ten_am())
        .await
        .unwrap();
    sqlx::query("UPDATE lots SET occupancy = 0 WHERE id = $1")
        .bind(lot.id)
        .execute(&pool)
        .await
        .unwrap();

    let err = SessionLedger::exit(&pool, session.id, alice.id, ten_am() + Duration::hours(1))
        .await
        .unwrap_err();

    assert_matches!(err, LedgerError::Rejected(CoreError::Conflict(_)));
    let reread = SessionRepo::find_by_id(&pool, session.id).await.unwrap().unwrap();
    assert_eq!(reread.status, SessionStatus::Parked, "rollback must leave the session parked");
}

// ---------------------------------------------------------------------------
// Lot ledger
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn occupy_and_vacate_respect_bounds(pool: PgPool) {
    let lot = new_lot(&pool, "Pair", 1, 1.0).await;
    let mut conn = pool.acquire().await.unwrap();

    assert_matches!(
        LotLedger::vacate(&mut conn, lot.id).await,
        Err(LedgerError::Rejected(CoreError::Conflict(_)))
    );
    assert_eq!(LotLedger::occupy(&mut conn, lot.id).await.unwrap().occupancy, 1);
    assert_matches!(
        LotLedger::occupy(&mut conn, lot.id).await,
        Err(LedgerError::Rejected(CoreError::LotFull { .. }))
    );
    assert_eq!(LotLedger::vacate(&mut conn, lot.id).await.unwrap().occupancy, 0);
    assert_matches!(
        LotLedger::occupy(&mut conn, 77_777).await,
        Err(LedgerError::Rejected(CoreError::NotFound { .. }))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_lot_applies_partial_fields(pool: PgPool) {
    let lot = new_lot(&pool, "Old Name", 10, 4.0).await;
    let input = UpdateLot {
        name: Some("New Name".into()),
        fee_rate: Some(6.5),
        ..UpdateLot::default()
    };

    let updated = LotLedger::update(&pool, lot.id, &input).await.unwrap();

    assert_eq!(updated.name, "New Name");
    assert_eq!(updated.fee_rate, 6.5);
    assert_eq!(updated.location, lot.location);
    assert_eq!(updated.capacity, 10);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_lot_cannot_shrink_below_occupancy(pool: PgPool) {
    let alice = new_user(&pool, "alice").await;
    let bob = new_user(&pool, "bob").await;
    let lot = new_lot(&pool, "North", 3, 1.0).await;
    SessionLedger::enter(&pool, &enter(&alice, &lot, "AAA"), ten_am())
        .await
        .unwrap();
    SessionLedger::enter(&pool, &enter(&bob, &lot, "BBB"), ten_am())
        .await
        .unwrap();

    let shrink = UpdateLot {
        capacity: Some(1),
        ..UpdateLot::default()
    };
    let err = LotLedger::update(&pool, lot.id, &shrink).await.unwrap_err();
    assert_matches!(err, LedgerError::Rejected(CoreError::Conflict(_)));

    let exact = UpdateLot {
        capacity: Some(2),
        ..UpdateLot::default()
    };
    let updated = LotLedger::update(&pool, lot.id, &exact).await.unwrap();
    assert!(!updated.available);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_missing_lot_is_not_found(pool: PgPool) {
    let err = LotLedger::update(&pool, 31_337, &UpdateLot::default())
        .await
        .unwrap_err();
    assert_matches!(err, LedgerError::Rejected(CoreError::NotFound { entity: "Lot", .. }));
}
