//! Read-only projections over the slot inventory.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use infra::models::{LaneScheduleStatus, LaneSlotRow, PoolRow, ScheduleStatusRow};
use infra::repos::PoolFilter;
use infra::BookingStore;
use uuid::Uuid;

use crate::error::AppError;

/// Slot counts for one date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayAvailability {
    pub open: u32,
    pub in_progress: u32,
    pub closed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSlot {
    pub id: Uuid,
    /// `HH:MM ~ HH:MM` in the pool's local time.
    pub time: String,
    pub status: LaneScheduleStatus,
    pub capacity: Option<i32>,
    pub price_amount: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneGrid {
    pub lane_id: Uuid,
    pub lane_no: i32,
    pub label: String,
    pub slots: Vec<GridSlot>,
}

pub async fn list_pools(
    store: &dyn BookingStore,
    region: Option<String>,
    name: Option<String>,
) -> Result<Vec<PoolRow>, AppError> {
    let filter = PoolFilter {
        region: region.filter(|r| !r.trim().is_empty()),
        name: name.filter(|n| !n.trim().is_empty()),
    };
    Ok(store.list_pools(filter).await?)
}

pub async fn monthly_availability(
    store: &dyn BookingStore,
    pool_id: Uuid,
    year: i32,
    month: u32,
) -> Result<BTreeMap<NaiveDate, DayAvailability>, AppError> {
    let (first, last) = month_bounds(year, month)?;
    let rows = store.month_statuses(pool_id, first, last).await?;
    Ok(count_by_date(&rows))
}

pub async fn daily_grid(
    store: &dyn BookingStore,
    pool_id: Uuid,
    date: &str,
    offset: FixedOffset,
) -> Result<Vec<LaneGrid>, AppError> {
    let date = parse_schedule_date(date)?;
    let rows = store.day_slots(pool_id, date).await?;
    Ok(group_by_lane(rows, offset))
}

/// First and last day of a month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), AppError> {
    if !(1..=12).contains(&month) {
        return Err(AppError::Validation(
            "Month must be between 1 and 12".to_string(),
        ));
    }

    let invalid = || AppError::Validation(format!("Year {year} is out of range"));
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    let last = next.pred_opt().ok_or_else(invalid)?;

    Ok((first, last))
}

/// Accepts exactly `YYYY-MM-DD` naming a real calendar date.
pub fn parse_schedule_date(date: &str) -> Result<NaiveDate, AppError> {
    let invalid = || AppError::Validation("Date must be in YYYY-MM-DD format".to_string());

    let shaped = date.len() == 10
        && date.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid())
}

pub fn count_by_date(rows: &[ScheduleStatusRow]) -> BTreeMap<NaiveDate, DayAvailability> {
    let mut days: BTreeMap<NaiveDate, DayAvailability> = BTreeMap::new();
    for row in rows {
        let day = days.entry(row.schedule_date).or_default();
        match row.status {
            LaneScheduleStatus::Available => day.open += 1,
            LaneScheduleStatus::Pending => day.in_progress += 1,
            LaneScheduleStatus::Confirmed | LaneScheduleStatus::Blocked => day.closed += 1,
        }
    }
    days
}

/// Group slots by lane. Lanes come out by lane number, slots by start time.
pub fn group_by_lane(mut rows: Vec<LaneSlotRow>, offset: FixedOffset) -> Vec<LaneGrid> {
    rows.sort_by_key(|r| (r.lane_no, r.starts_at));

    let mut lanes: Vec<LaneGrid> = Vec::new();
    for row in rows {
        let slot = GridSlot {
            id: row.id,
            time: format_time_range(row.starts_at, row.ends_at, offset),
            status: row.status,
            capacity: row.capacity,
            price_amount: row.price_amount,
        };

        match lanes.last_mut() {
            Some(lane) if lane.lane_id == row.lane_id => lane.slots.push(slot),
            _ => lanes.push(LaneGrid {
                lane_id: row.lane_id,
                lane_no: row.lane_no,
                label: format!("Lane {}", row.lane_no),
                slots: vec![slot],
            }),
        }
    }
    lanes
}

pub fn format_time_range(
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    offset: FixedOffset,
) -> String {
    format!(
        "{} ~ {}",
        starts_at.with_timezone(&offset).format("%H:%M"),
        ends_at.with_timezone(&offset).format("%H:%M")
    )
}

/// Current calendar year in the pools' local time.
pub fn current_year(offset: FixedOffset) -> i32 {
    Utc::now().with_timezone(&offset).year()
}
