//! Store handle consumed by the booking services.
//!
//! Every mutation that must be atomic (claiming slots, moving a reservation
//! through its lifecycle, admin compare-and-set on a slot) is a single trait
//! method, so each implementation owns its own transaction boundary.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AdminUserRow, AppUserRow, LaneScheduleRow, LaneScheduleStatus, LaneSlotRow, PoolRow,
    ReservationStatus, ReservationWithSlots, ScheduleStatusRow,
};
use crate::repos::{CreateProfile, PoolFilter};

pub mod memory;
pub mod postgres;

pub use memory::MemoryBookingStore;
pub use postgres::PgBookingStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("foreign key violation: {0}")]
    ForeignKey(String),

    #[error("unique violation: {0}")]
    Duplicate(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            StoreError::ForeignKey(_) => true,
            StoreError::Db(sqlx::Error::Database(e)) => e.is_foreign_key_violation(),
            _ => false,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::Duplicate(_) => true,
            StoreError::Db(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}

/// Why an atomic claim did not commit. No slot changed in any of these cases.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("no_schedules")]
    NoSlots,

    #[error("invalid_schedule_id: {0:?}")]
    UnknownSlots(Vec<Uuid>),

    #[error("slot_already_taken: {0:?}")]
    SlotsTaken(Vec<Uuid>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for ClaimError {
    fn from(e: sqlx::Error) -> Self {
        ClaimError::Store(StoreError::Db(e))
    }
}

/// Result of asking a reservation to move to another status.
#[derive(Debug, Clone)]
pub enum ReservationTransition {
    /// The transition was committed together with its slot effects.
    Applied(ReservationWithSlots),
    /// The reservation exists but its current status does not allow the move.
    Unchanged(ReservationWithSlots),
    NotFound,
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    async fn list_pools(&self, filter: PoolFilter) -> Result<Vec<PoolRow>, StoreError>;

    async fn pools_by_ids(&self, ids: &[Uuid]) -> Result<Vec<PoolRow>, StoreError>;

    async fn get_slot(&self, id: Uuid) -> Result<Option<LaneScheduleRow>, StoreError>;

    async fn month_statuses(
        &self,
        pool_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ScheduleStatusRow>, StoreError>;

    /// Slots of one pool and date, ordered by lane number then start time.
    async fn day_slots(&self, pool_id: Uuid, date: NaiveDate)
        -> Result<Vec<LaneSlotRow>, StoreError>;

    /// Compare-and-set on a slot. `None` means the slot was not in the
    /// expected state (or does not exist) and nothing changed.
    async fn set_slot_status_if(
        &self,
        id: Uuid,
        expected: LaneScheduleStatus,
        expected_holder: Option<Uuid>,
        next: LaneScheduleStatus,
    ) -> Result<Option<LaneScheduleRow>, StoreError>;

    /// Atomically move every slot in `slot_ids` from `available` to `pending`
    /// under a new pending reservation owned by `user_id`.
    async fn claim_slots(
        &self,
        user_id: Uuid,
        slot_ids: &[Uuid],
    ) -> Result<ReservationWithSlots, ClaimError>;

    async fn get_reservation(&self, id: Uuid) -> Result<Option<ReservationWithSlots>, StoreError>;

    /// Move a reservation to `next` and apply the slot effect in one
    /// transaction: `confirmed` confirms held slots, `canceled`/`rejected`
    /// return them to inventory. With `expected` set, the move only happens
    /// from that status.
    async fn transition_reservation(
        &self,
        id: Uuid,
        next: ReservationStatus,
        expected: Option<ReservationStatus>,
    ) -> Result<ReservationTransition, StoreError>;

    /// Pools touched by the slots of a reservation.
    async fn reservation_pool_ids(&self, id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    async fn stale_pending_reservations(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, StoreError>;

    async fn is_active_member(&self, admin_id: Uuid, pool_id: Uuid) -> Result<bool, StoreError>;

    async fn active_pool_ids(&self, admin_id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    async fn insert_app_user(&self, data: CreateProfile) -> Result<AppUserRow, StoreError>;

    async fn insert_admin_user(&self, data: CreateProfile) -> Result<AdminUserRow, StoreError>;
}

/// Reorder `slots` to follow `requested`.
pub(crate) fn in_request_order(
    mut slots: Vec<LaneScheduleRow>,
    requested: &[Uuid],
) -> Vec<LaneScheduleRow> {
    slots.sort_by_key(|s| requested.iter().position(|id| *id == s.id));
    slots
}
