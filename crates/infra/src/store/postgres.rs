use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::{in_request_order, BookingStore, ClaimError, ReservationTransition, StoreError};
use crate::db::Db;
use crate::models::{
    AdminUserRow, AppUserRow, LaneScheduleRow, LaneScheduleStatus, LaneSlotRow, PoolRow,
    ReservationStatus, ReservationWithSlots, ScheduleStatusRow,
};
use crate::repos::{
    lane_reservations, lane_schedules, memberships, pools, users, CreateProfile, PoolFilter,
};

#[derive(Clone)]
pub struct PgBookingStore {
    db: Db,
}

impl PgBookingStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let _one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.db).await?;
        Ok(())
    }

    async fn list_pools(&self, filter: PoolFilter) -> Result<Vec<PoolRow>, StoreError> {
        Ok(pools::list(&self.db, filter).await?)
    }

    async fn pools_by_ids(&self, ids: &[Uuid]) -> Result<Vec<PoolRow>, StoreError> {
        Ok(pools::list_by_ids(&self.db, ids).await?)
    }

    async fn get_slot(&self, id: Uuid) -> Result<Option<LaneScheduleRow>, StoreError> {
        Ok(lane_schedules::get_by_id(&self.db, id).await?)
    }

    async fn month_statuses(
        &self,
        pool_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ScheduleStatusRow>, StoreError> {
        Ok(lane_schedules::list_statuses_between(&self.db, pool_id, from, to).await?)
    }

    async fn day_slots(
        &self,
        pool_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<LaneSlotRow>, StoreError> {
        Ok(lane_schedules::list_for_date_with_lanes(&self.db, pool_id, date).await?)
    }

    async fn set_slot_status_if(
        &self,
        id: Uuid,
        expected: LaneScheduleStatus,
        expected_holder: Option<Uuid>,
        next: LaneScheduleStatus,
    ) -> Result<Option<LaneScheduleRow>, StoreError> {
        Ok(lane_schedules::set_status_if(&self.db, id, expected, expected_holder, next).await?)
    }

    async fn claim_slots(
        &self,
        user_id: Uuid,
        slot_ids: &[Uuid],
    ) -> Result<ReservationWithSlots, ClaimError> {
        if slot_ids.is_empty() {
            return Err(ClaimError::NoSlots);
        }

        let mut tx = self.db.begin().await?;

        let existing = lane_schedules::lock_existing(&mut *tx, slot_ids).await?;
        let unknown: Vec<Uuid> = slot_ids
            .iter()
            .filter(|id| !existing.contains(*id))
            .copied()
            .collect();
        if !unknown.is_empty() {
            tx.rollback().await?;
            return Err(ClaimError::UnknownSlots(unknown));
        }

        let reservation = lane_reservations::insert_pending(&mut *tx, user_id).await?;

        // Rows are locked, so the status test below reads the latest committed state
        let claimed = lane_schedules::claim_available(&mut *tx, reservation.id, slot_ids).await?;
        if claimed.len() != slot_ids.len() {
            let taken: Vec<Uuid> = slot_ids
                .iter()
                .filter(|id| !claimed.iter().any(|s| s.id == **id))
                .copied()
                .collect();
            tx.rollback().await?;
            return Err(ClaimError::SlotsTaken(taken));
        }

        if let Err(e) = lane_reservations::insert_slot_claims(&mut *tx, reservation.id, slot_ids).await
        {
            let e = StoreError::from(e);
            tx.rollback().await?;
            if e.is_unique_violation() {
                return Err(ClaimError::SlotsTaken(slot_ids.to_vec()));
            }
            return Err(e.into());
        }

        tx.commit().await?;

        Ok(ReservationWithSlots {
            reservation,
            slots: in_request_order(claimed, slot_ids),
        })
    }

    async fn get_reservation(&self, id: Uuid) -> Result<Option<ReservationWithSlots>, StoreError> {
        let Some(reservation) = lane_reservations::get_by_id(&self.db, id).await? else {
            return Ok(None);
        };
        let slots = lane_schedules::list_for_reservation(&self.db, id).await?;
        Ok(Some(ReservationWithSlots { reservation, slots }))
    }

    async fn transition_reservation(
        &self,
        id: Uuid,
        next: ReservationStatus,
        expected: Option<ReservationStatus>,
    ) -> Result<ReservationTransition, StoreError> {
        let mut tx = self.db.begin().await?;

        let Some(current) = lane_reservations::get_for_update(&mut *tx, id).await? else {
            tx.rollback().await?;
            return Ok(ReservationTransition::NotFound);
        };

        if !current.status.can_transition_to(next)
            || expected.is_some_and(|s| s != current.status)
        {
            let slots = lane_schedules::list_for_reservation(&mut *tx, id).await?;
            tx.commit().await?;
            return Ok(ReservationTransition::Unchanged(ReservationWithSlots {
                reservation: current,
                slots,
            }));
        }

        // Held slots are locked in id order, as claims lock them
        lane_schedules::lock_held_by(&mut *tx, id).await?;

        match next {
            ReservationStatus::Confirmed => {
                lane_schedules::confirm_held_by(&mut *tx, id).await?;
            }
            ReservationStatus::Canceled | ReservationStatus::Rejected => {
                lane_schedules::release_held_by(&mut *tx, id).await?;
                lane_reservations::release_slot_claims(&mut *tx, id).await?;
            }
            ReservationStatus::Pending => {}
        }

        let reservation = lane_reservations::set_status(&mut *tx, id, next).await?;
        let slots = lane_schedules::list_for_reservation(&mut *tx, id).await?;
        tx.commit().await?;

        Ok(ReservationTransition::Applied(ReservationWithSlots {
            reservation,
            slots,
        }))
    }

    async fn reservation_pool_ids(&self, id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(lane_reservations::list_pool_ids(&self.db, id).await?)
    }

    async fn stale_pending_reservations(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, StoreError> {
        Ok(lane_reservations::list_stale_pending(&self.db, created_before).await?)
    }

    async fn is_active_member(&self, admin_id: Uuid, pool_id: Uuid) -> Result<bool, StoreError> {
        Ok(memberships::is_active_member(&self.db, admin_id, pool_id).await?)
    }

    async fn active_pool_ids(&self, admin_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(memberships::list_active_pool_ids(&self.db, admin_id).await?)
    }

    async fn insert_app_user(&self, data: CreateProfile) -> Result<AppUserRow, StoreError> {
        Ok(users::insert_app_user(&self.db, data).await?)
    }

    async fn insert_admin_user(&self, data: CreateProfile) -> Result<AdminUserRow, StoreError> {
        Ok(users::insert_admin_user(&self.db, data).await?)
    }
}
