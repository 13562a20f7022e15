use std::collections::BTreeMap;

use async_graphql::{Enum, SimpleObject, ID};
use chrono::{DateTime, NaiveDate, Utc};
use infra::models::{LaneScheduleStatus, PoolRow};

use crate::services::availability::{DayAvailability, GridSlot, LaneGrid};

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum SlotStatus {
    Available,
    Pending,
    Confirmed,
    Blocked,
}

impl From<LaneScheduleStatus> for SlotStatus {
    fn from(status: LaneScheduleStatus) -> Self {
        match status {
            LaneScheduleStatus::Available => SlotStatus::Available,
            LaneScheduleStatus::Pending => SlotStatus::Pending,
            LaneScheduleStatus::Confirmed => SlotStatus::Confirmed,
            LaneScheduleStatus::Blocked => SlotStatus::Blocked,
        }
    }
}

impl From<SlotStatus> for LaneScheduleStatus {
    fn from(status: SlotStatus) -> Self {
        match status {
            SlotStatus::Available => LaneScheduleStatus::Available,
            SlotStatus::Pending => LaneScheduleStatus::Pending,
            SlotStatus::Confirmed => LaneScheduleStatus::Confirmed,
            SlotStatus::Blocked => LaneScheduleStatus::Blocked,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct Pool {
    pub id: ID,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    /// `use` or `unused`
    pub status: String,
    /// `25m` or `50m`
    pub length: String,
    pub starting_block: Option<String>,
    pub region: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<PoolRow> for Pool {
    fn from(row: PoolRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            description: row.description,
            address: row.address,
            status: row.status.as_str().to_string(),
            length: row.length.as_str().to_string(),
            starting_block: row.starting_block.map(|b| b.as_str().to_string()),
            region: row.region,
            created_at: row.created_at,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct DayStats {
    pub date: NaiveDate,
    pub open: u32,
    pub in_progress: u32,
    pub closed: u32,
}

#[derive(SimpleObject, Clone)]
pub struct LaneScheduleStats {
    pub pool_id: ID,
    pub year: i32,
    pub month: i32,
    /// Dates with at least one slot, ascending.
    pub days: Vec<DayStats>,
}

impl LaneScheduleStats {
    pub fn new(
        pool_id: ID,
        year: i32,
        month: i32,
        days: BTreeMap<NaiveDate, DayAvailability>,
    ) -> Self {
        Self {
            pool_id,
            year,
            month,
            days: days
                .into_iter()
                .map(|(date, d)| DayStats {
                    date,
                    open: d.open,
                    in_progress: d.in_progress,
                    closed: d.closed,
                })
                .collect(),
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct LaneSlot {
    pub id: ID,
    pub time: String,
    pub status: SlotStatus,
    pub capacity: Option<i32>,
    pub price_amount: Option<i32>,
}

impl From<GridSlot> for LaneSlot {
    fn from(slot: GridSlot) -> Self {
        Self {
            id: slot.id.into(),
            time: slot.time,
            status: slot.status.into(),
            capacity: slot.capacity,
            price_amount: slot.price_amount,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct LaneSchedule {
    pub lane_id: ID,
    pub lane_no: i32,
    pub name: String,
    pub schedule: Vec<LaneSlot>,
}

impl From<LaneGrid> for LaneSchedule {
    fn from(lane: LaneGrid) -> Self {
        Self {
            lane_id: lane.lane_id.into(),
            lane_no: lane.lane_no,
            name: lane.label,
            schedule: lane.slots.into_iter().map(LaneSlot::from).collect(),
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct LaneScheduleDay {
    pub pool_id: ID,
    pub date: String,
    pub lanes: Vec<LaneSchedule>,
}
