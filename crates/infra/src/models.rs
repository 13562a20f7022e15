use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Most slots a single reservation may claim.
pub const MAX_SLOTS_PER_RESERVATION: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "lane_schedule_status_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LaneScheduleStatus {
    Available,
    Pending,
    Confirmed,
    Blocked,
}

impl LaneScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaneScheduleStatus::Available => "available",
            LaneScheduleStatus::Pending => "pending",
            LaneScheduleStatus::Confirmed => "confirmed",
            LaneScheduleStatus::Blocked => "blocked",
        }
    }

    /// Whether `self -> next` is an edge of the slot lifecycle graph.
    pub fn can_transition_to(&self, next: LaneScheduleStatus) -> bool {
        use LaneScheduleStatus::*;

        matches!(
            (self, next),
            (Available, Pending)
                | (Pending, Confirmed)
                | (Pending, Available)
                | (Confirmed, Available)
                | (Confirmed, Blocked)
                | (Available, Blocked)
                | (Blocked, Available)
        )
    }

    /// Pending and confirmed slots belong to the reservation that holds them.
    pub fn is_held(&self) -> bool {
        matches!(self, LaneScheduleStatus::Pending | LaneScheduleStatus::Confirmed)
    }

    /// Edges an administrator may apply directly, outside the reservation path.
    pub fn is_admin_transition(&self, next: LaneScheduleStatus) -> bool {
        use LaneScheduleStatus::*;

        matches!(
            (self, next),
            (Available, Blocked) | (Blocked, Available) | (Confirmed, Blocked)
        )
    }
}

impl fmt::Display for LaneScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "lane_reservation_status_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Rejected,
    Canceled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Rejected => "rejected",
            ReservationStatus::Canceled => "canceled",
        }
    }

    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;

        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Rejected) | (Pending, Canceled) | (Confirmed, Canceled)
        )
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "membership_status_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Active,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "use_status_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UseStatus {
    Use,
    Unused,
}

impl UseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UseStatus::Use => "use",
            UseStatus::Unused => "unused",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "pool_length_enum")]
pub enum PoolLength {
    #[sqlx(rename = "25m")]
    #[serde(rename = "25m")]
    Length25m,
    #[sqlx(rename = "50m")]
    #[serde(rename = "50m")]
    Length50m,
}

impl PoolLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolLength::Length25m => "25m",
            PoolLength::Length50m => "50m",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "starting_block_type_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StartingBlockType {
    New,
    Old,
    Deck,
    Mixed,
}

impl StartingBlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartingBlockType::New => "new",
            StartingBlockType::Old => "old",
            StartingBlockType::Deck => "deck",
            StartingBlockType::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PoolRow {
    pub id: Uuid,
    pub name: String,
    #[sqlx(rename = "desc")]
    pub description: Option<String>,
    pub address: Option<String>,
    pub status: UseStatus,
    pub length: PoolLength,
    pub starting_block: Option<StartingBlockType>,
    pub region: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LaneRow {
    pub id: Uuid,
    pub pool_id: Uuid,
    pub lane_no: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LaneScheduleRow {
    pub id: Uuid,
    pub lane_id: Uuid,
    pub pool_id: Uuid,
    pub schedule_date: NaiveDate,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub capacity: Option<i32>,
    pub price_amount: Option<i32>,
    pub status: LaneScheduleStatus,
    pub reservation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A slot joined with the number of the lane it belongs to.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LaneSlotRow {
    pub id: Uuid,
    pub lane_id: Uuid,
    pub lane_no: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub capacity: Option<i32>,
    pub price_amount: Option<i32>,
    pub status: LaneScheduleStatus,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScheduleStatusRow {
    pub schedule_date: NaiveDate,
    pub status: LaneScheduleStatus,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LaneReservationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reservation together with its slots, in the order they were requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationWithSlots {
    pub reservation: LaneReservationRow,
    pub slots: Vec<LaneScheduleRow>,
}

impl ReservationWithSlots {
    pub fn slot_ids(&self) -> Vec<Uuid> {
        self.slots.iter().map(|s| s.id).collect()
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MembershipRow {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub pool_id: Uuid,
    pub status: MembershipStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AppUserRow {
    pub id: Uuid,
    pub display_name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AdminUserRow {
    pub id: Uuid,
    pub display_name: String,
    pub phone: Option<String>,
    pub status: UseStatus,
    pub created_at: DateTime<Utc>,
}
