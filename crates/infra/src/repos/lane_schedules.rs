use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

use crate::models::{LaneScheduleRow, LaneScheduleStatus, LaneSlotRow, ScheduleStatusRow};

#[derive(Debug, Clone)]
pub struct CreateLaneSchedule {
    pub lane_id: Uuid,
    pub pool_id: Uuid,
    pub schedule_date: NaiveDate,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub capacity: Option<i32>,
    pub price_amount: Option<i32>,
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateLaneSchedule,
) -> SqlxResult<LaneScheduleRow> {
    sqlx::query_as::<_, LaneScheduleRow>(
        r#"
        INSERT INTO lane_schedule (
            lane_id, pool_id, schedule_date, starts_at, ends_at, capacity, price_amount
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, lane_id, pool_id, schedule_date, starts_at, ends_at, capacity,
                  price_amount, status, reservation_id, created_at, updated_at
        "#,
    )
    .bind(data.lane_id)
    .bind(data.pool_id)
    .bind(data.schedule_date)
    .bind(data.starts_at)
    .bind(data.ends_at)
    .bind(data.capacity)
    .bind(data.price_amount)
    .fetch_one(executor)
    .await
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<LaneScheduleRow>> {
    sqlx::query_as::<_, LaneScheduleRow>(
        r#"
        SELECT id, lane_id, pool_id, schedule_date, starts_at, ends_at, capacity,
               price_amount, status, reservation_id, created_at, updated_at
        FROM lane_schedule
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Lock the given slot rows in id order and return the ids that exist.
///
/// Locking in a fixed order keeps two overlapping claims from deadlocking.
pub async fn lock_existing<'e>(
    executor: impl PgExecutor<'e>,
    ids: &[Uuid],
) -> SqlxResult<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT id
        FROM lane_schedule
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(ids)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Move every listed slot that is still `available` to `pending`, held by
/// `reservation_id`. Slots in any other state are left untouched and are
/// absent from the returned rows.
pub async fn claim_available<'e>(
    executor: impl PgExecutor<'e>,
    reservation_id: Uuid,
    ids: &[Uuid],
) -> SqlxResult<Vec<LaneScheduleRow>> {
    sqlx::query_as::<_, LaneScheduleRow>(
        r#"
        UPDATE lane_schedule
        SET status = 'pending',
            reservation_id = $1,
            updated_at = NOW()
        WHERE id = ANY($2) AND status = 'available'
        RETURNING id, lane_id, pool_id, schedule_date, starts_at, ends_at, capacity,
                  price_amount, status, reservation_id, created_at, updated_at
        "#,
    )
    .bind(reservation_id)
    .bind(ids)
    .fetch_all(executor)
    .await
}

/// Slots that were claimed by a reservation, in claim order.
pub async fn list_for_reservation<'e>(
    executor: impl PgExecutor<'e>,
    reservation_id: Uuid,
) -> SqlxResult<Vec<LaneScheduleRow>> {
    sqlx::query_as::<_, LaneScheduleRow>(
        r#"
        SELECT ls.id, ls.lane_id, ls.pool_id, ls.schedule_date, ls.starts_at, ls.ends_at,
               ls.capacity, ls.price_amount, ls.status, ls.reservation_id,
               ls.created_at, ls.updated_at
        FROM lane_reservation_slot lrs
        JOIN lane_schedule ls ON ls.id = lrs.schedule_id
        WHERE lrs.reservation_id = $1
        ORDER BY lrs.position ASC
        "#,
    )
    .bind(reservation_id)
    .fetch_all(executor)
    .await
}

/// Lock every slot held by the reservation, in id order.
pub async fn lock_held_by<'e>(
    executor: impl PgExecutor<'e>,
    reservation_id: Uuid,
) -> SqlxResult<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT id
        FROM lane_schedule
        WHERE reservation_id = $1
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(reservation_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Return every slot still held by the reservation to inventory.
///
/// Held slots that an administrator has since blocked stay blocked but lose
/// their holder.
pub async fn release_held_by<'e>(
    executor: impl PgExecutor<'e>,
    reservation_id: Uuid,
) -> SqlxResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE lane_schedule
        SET status = CASE
                WHEN status IN ('pending', 'confirmed') THEN 'available'::lane_schedule_status_enum
                ELSE status
            END,
            reservation_id = NULL,
            updated_at = NOW()
        WHERE reservation_id = $1
        "#,
    )
    .bind(reservation_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

pub async fn confirm_held_by<'e>(
    executor: impl PgExecutor<'e>,
    reservation_id: Uuid,
) -> SqlxResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE lane_schedule
        SET status = 'confirmed', updated_at = NOW()
        WHERE reservation_id = $1 AND status = 'pending'
        "#,
    )
    .bind(reservation_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Compare-and-set on a single slot: applies `next` only when the slot still
/// has status `expected` and holder `expected_holder`.
pub async fn set_status_if<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    expected: LaneScheduleStatus,
    expected_holder: Option<Uuid>,
    next: LaneScheduleStatus,
) -> SqlxResult<Option<LaneScheduleRow>> {
    sqlx::query_as::<_, LaneScheduleRow>(
        r#"
        UPDATE lane_schedule
        SET status = $4, updated_at = NOW()
        WHERE id = $1
          AND status = $2
          AND reservation_id IS NOT DISTINCT FROM $3
        RETURNING id, lane_id, pool_id, schedule_date, starts_at, ends_at, capacity,
                  price_amount, status, reservation_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(expected)
    .bind(expected_holder)
    .bind(next)
    .fetch_optional(executor)
    .await
}

pub async fn list_statuses_between<'e>(
    executor: impl PgExecutor<'e>,
    pool_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> SqlxResult<Vec<ScheduleStatusRow>> {
    sqlx::query_as::<_, ScheduleStatusRow>(
        r#"
        SELECT schedule_date, status
        FROM lane_schedule
        WHERE pool_id = $1
          AND schedule_date >= $2
          AND schedule_date <= $3
        ORDER BY schedule_date ASC
        "#,
    )
    .bind(pool_id)
    .bind(from)
    .bind(to)
    .fetch_all(executor)
    .await
}

pub async fn list_for_date_with_lanes<'e>(
    executor: impl PgExecutor<'e>,
    pool_id: Uuid,
    date: NaiveDate,
) -> SqlxResult<Vec<LaneSlotRow>> {
    sqlx::query_as::<_, LaneSlotRow>(
        r#"
        SELECT ls.id, ls.lane_id, l.lane_no, ls.starts_at, ls.ends_at,
               ls.capacity, ls.price_amount, ls.status
        FROM lane_schedule ls
        JOIN lanes l ON l.id = ls.lane_id
        WHERE ls.pool_id = $1 AND ls.schedule_date = $2
        ORDER BY l.lane_no ASC, ls.starts_at ASC
        "#,
    )
    .bind(pool_id)
    .bind(date)
    .fetch_all(executor)
    .await
}
