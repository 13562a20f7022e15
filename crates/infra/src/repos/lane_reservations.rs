use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::models::{LaneReservationRow, ReservationStatus};

pub async fn insert_pending<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> SqlxResult<LaneReservationRow> {
    sqlx::query_as::<_, LaneReservationRow>(
        r#"
        INSERT INTO lane_reservation (user_id, status)
        VALUES ($1, 'pending')
        RETURNING id, user_id, status, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<LaneReservationRow>> {
    sqlx::query_as::<_, LaneReservationRow>(
        r#"
        SELECT id, user_id, status, created_at, updated_at
        FROM lane_reservation
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Same as [`get_by_id`] but holds a row lock until the transaction ends.
pub async fn get_for_update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<LaneReservationRow>> {
    sqlx::query_as::<_, LaneReservationRow>(
        r#"
        SELECT id, user_id, status, created_at, updated_at
        FROM lane_reservation
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn set_status<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    status: ReservationStatus,
) -> SqlxResult<LaneReservationRow> {
    sqlx::query_as::<_, LaneReservationRow>(
        r#"
        UPDATE lane_reservation
        SET status = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, user_id, status, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(status)
    .fetch_one(executor)
    .await
}

/// Record the ordered slot claims of a reservation.
pub async fn insert_slot_claims<'e>(
    executor: impl PgExecutor<'e>,
    reservation_id: Uuid,
    slot_ids: &[Uuid],
) -> SqlxResult<()> {
    sqlx::query(
        r#"
        INSERT INTO lane_reservation_slot (reservation_id, schedule_id, position)
        SELECT $1, s.schedule_id, s.position::smallint
        FROM UNNEST($2::uuid[]) WITH ORDINALITY AS s(schedule_id, position)
        "#,
    )
    .bind(reservation_id)
    .bind(slot_ids)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn release_slot_claims<'e>(
    executor: impl PgExecutor<'e>,
    reservation_id: Uuid,
) -> SqlxResult<()> {
    sqlx::query(
        r#"
        UPDATE lane_reservation_slot
        SET released_at = NOW()
        WHERE reservation_id = $1 AND released_at IS NULL
        "#,
    )
    .bind(reservation_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list_pool_ids<'e>(
    executor: impl PgExecutor<'e>,
    reservation_id: Uuid,
) -> SqlxResult<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT ls.pool_id
        FROM lane_reservation_slot lrs
        JOIN lane_schedule ls ON ls.id = lrs.schedule_id
        WHERE lrs.reservation_id = $1
        "#,
    )
    .bind(reservation_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn list_stale_pending<'e>(
    executor: impl PgExecutor<'e>,
    created_before: DateTime<Utc>,
) -> SqlxResult<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT id
        FROM lane_reservation
        WHERE status = 'pending' AND created_at < $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(created_before)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}
