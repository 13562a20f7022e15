use async_graphql::{Enum, SimpleObject, ID};
use chrono::{DateTime, NaiveDate, Utc};
use infra::models::{LaneScheduleRow, ReservationStatus, ReservationWithSlots};

use crate::gql::domains::pools::types::SlotStatus;

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReservationState {
    Pending,
    Confirmed,
    Rejected,
    Canceled,
}

impl From<ReservationStatus> for ReservationState {
    fn from(status: ReservationStatus) -> Self {
        match status {
            ReservationStatus::Pending => ReservationState::Pending,
            ReservationStatus::Confirmed => ReservationState::Confirmed,
            ReservationStatus::Rejected => ReservationState::Rejected,
            ReservationStatus::Canceled => ReservationState::Canceled,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct Slot {
    pub id: ID,
    pub lane_id: ID,
    pub pool_id: ID,
    pub schedule_date: NaiveDate,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: SlotStatus,
    pub capacity: Option<i32>,
    pub price_amount: Option<i32>,
}

impl From<LaneScheduleRow> for Slot {
    fn from(row: LaneScheduleRow) -> Self {
        Self {
            id: row.id.into(),
            lane_id: row.lane_id.into(),
            pool_id: row.pool_id.into(),
            schedule_date: row.schedule_date,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            status: row.status.into(),
            capacity: row.capacity,
            price_amount: row.price_amount,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct Reservation {
    pub id: ID,
    pub user_id: ID,
    pub status: ReservationState,
    /// Slots in the order they were requested.
    pub slots: Vec<Slot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReservationWithSlots> for Reservation {
    fn from(r: ReservationWithSlots) -> Self {
        Self {
            id: r.reservation.id.into(),
            user_id: r.reservation.user_id.into(),
            status: r.reservation.status.into(),
            slots: r.slots.into_iter().map(Slot::from).collect(),
            created_at: r.reservation.created_at,
            updated_at: r.reservation.updated_at,
        }
    }
}
