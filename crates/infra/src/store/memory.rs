//! In-process [`BookingStore`] backed by a single mutex.
//!
//! Every trait method runs under one lock acquisition, which gives the same
//! all-or-nothing behaviour the Postgres store gets from its transactions.
//! Used by the service and schema tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use super::{in_request_order, BookingStore, ClaimError, ReservationTransition, StoreError};
use crate::models::{
    AdminUserRow, AppUserRow, LaneReservationRow, LaneRow, LaneScheduleRow, LaneScheduleStatus,
    LaneSlotRow, MembershipRow, MembershipStatus, PoolLength, PoolRow, ReservationStatus,
    ReservationWithSlots, ScheduleStatusRow, UseStatus,
};
use crate::repos::{CreateLaneSchedule, CreateProfile, PoolFilter};

#[derive(Default)]
struct MemoryState {
    pools: HashMap<Uuid, PoolRow>,
    lanes: HashMap<Uuid, LaneRow>,
    slots: HashMap<Uuid, LaneScheduleRow>,
    reservations: HashMap<Uuid, LaneReservationRow>,
    // reservation id -> slot ids in request order
    claims: HashMap<Uuid, Vec<Uuid>>,
    memberships: Vec<MembershipRow>,
    identities: HashSet<Uuid>,
    app_users: HashMap<Uuid, AppUserRow>,
    admin_users: HashMap<Uuid, AdminUserRow>,
    unavailable: bool,
}

impl MemoryState {
    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }

    fn reservation_with_slots(&self, id: Uuid) -> Option<ReservationWithSlots> {
        let reservation = self.reservations.get(&id)?.clone();
        let slots = self
            .claims
            .get(&id)
            .map(|ids| ids.iter().filter_map(|s| self.slots.get(s).cloned()).collect())
            .unwrap_or_default();
        Some(ReservationWithSlots { reservation, slots })
    }
}

#[derive(Default)]
pub struct MemoryBookingStore {
    state: Mutex<MemoryState>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pool(&self, name: &str, region: Option<&str>) -> PoolRow {
        let row = PoolRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            address: None,
            status: UseStatus::Use,
            length: PoolLength::Length25m,
            starting_block: None,
            region: region.map(str::to_string),
            created_at: Utc::now(),
        };
        self.state.lock().pools.insert(row.id, row.clone());
        row
    }

    pub fn add_lane(&self, pool_id: Uuid, lane_no: i32) -> LaneRow {
        let row = LaneRow {
            id: Uuid::new_v4(),
            pool_id,
            lane_no,
            created_at: Utc::now(),
        };
        self.state.lock().lanes.insert(row.id, row.clone());
        row
    }

    /// Insert a slot, enforcing one slot per (lane, start time).
    pub fn add_slot(&self, data: CreateLaneSchedule) -> Result<LaneScheduleRow, StoreError> {
        let mut state = self.state.lock();
        if state
            .slots
            .values()
            .any(|s| s.lane_id == data.lane_id && s.starts_at == data.starts_at)
        {
            return Err(StoreError::Duplicate(format!(
                "lane {} already has a slot starting at {}",
                data.lane_id, data.starts_at
            )));
        }

        let now = Utc::now();
        let row = LaneScheduleRow {
            id: Uuid::new_v4(),
            lane_id: data.lane_id,
            pool_id: data.pool_id,
            schedule_date: data.schedule_date,
            starts_at: data.starts_at,
            ends_at: data.ends_at,
            capacity: data.capacity,
            price_amount: data.price_amount,
            status: LaneScheduleStatus::Available,
            reservation_id: None,
            created_at: now,
            updated_at: now,
        };
        state.slots.insert(row.id, row.clone());
        Ok(row)
    }

    /// Block an available, unheld slot. Returns false when the slot is
    /// missing or not blockable.
    pub fn block_slot(&self, id: Uuid) -> bool {
        let mut state = self.state.lock();
        match state.slots.get_mut(&id) {
            Some(slot)
                if slot.reservation_id.is_none()
                    && slot.status.is_admin_transition(LaneScheduleStatus::Blocked) =>
            {
                slot.status = LaneScheduleStatus::Blocked;
                slot.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }

    pub fn grant_membership(&self, admin_id: Uuid, pool_id: Uuid, status: MembershipStatus) {
        let mut state = self.state.lock();
        state
            .memberships
            .retain(|m| !(m.admin_id == admin_id && m.pool_id == pool_id));
        state.memberships.push(MembershipRow {
            id: Uuid::new_v4(),
            admin_id,
            pool_id,
            status,
            created_at: Utc::now(),
        });
    }

    /// Make an identity visible to profile inserts.
    pub fn publish_identity(&self, id: Uuid) {
        self.state.lock().identities.insert(id);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Backdate a reservation, for expiry tests.
    pub fn set_reservation_created_at(&self, id: Uuid, created_at: DateTime<Utc>) {
        if let Some(r) = self.state.lock().reservations.get_mut(&id) {
            r.created_at = created_at;
        }
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.state.lock().check_available()
    }

    async fn list_pools(&self, filter: PoolFilter) -> Result<Vec<PoolRow>, StoreError> {
        let state = self.state.lock();
        state.check_available()?;

        let needle = filter.name.map(|n| n.to_lowercase());
        let mut rows: Vec<PoolRow> = state
            .pools
            .values()
            .filter(|p| {
                filter
                    .region
                    .as_deref()
                    .is_none_or(|r| p.region.as_deref() == Some(r))
            })
            .filter(|p| {
                needle
                    .as_deref()
                    .is_none_or(|n| p.name.to_lowercase().contains(n))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn pools_by_ids(&self, ids: &[Uuid]) -> Result<Vec<PoolRow>, StoreError> {
        let state = self.state.lock();
        state.check_available()?;

        let mut rows: Vec<PoolRow> = ids
            .iter()
            .filter_map(|id| state.pools.get(id).cloned())
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn get_slot(&self, id: Uuid) -> Result<Option<LaneScheduleRow>, StoreError> {
        let state = self.state.lock();
        state.check_available()?;
        Ok(state.slots.get(&id).cloned())
    }

    async fn month_statuses(
        &self,
        pool_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ScheduleStatusRow>, StoreError> {
        let state = self.state.lock();
        state.check_available()?;

        let mut rows: Vec<ScheduleStatusRow> = state
            .slots
            .values()
            .filter(|s| s.pool_id == pool_id && s.schedule_date >= from && s.schedule_date <= to)
            .map(|s| ScheduleStatusRow {
                schedule_date: s.schedule_date,
                status: s.status,
            })
            .collect();
        rows.sort_by_key(|r| r.schedule_date);
        Ok(rows)
    }

    async fn day_slots(
        &self,
        pool_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<LaneSlotRow>, StoreError> {
        let state = self.state.lock();
        state.check_available()?;

        let mut rows: Vec<LaneSlotRow> = state
            .slots
            .values()
            .filter(|s| s.pool_id == pool_id && s.schedule_date == date)
            .filter_map(|s| {
                let lane = state.lanes.get(&s.lane_id)?;
                Some(LaneSlotRow {
                    id: s.id,
                    lane_id: s.lane_id,
                    lane_no: lane.lane_no,
                    starts_at: s.starts_at,
                    ends_at: s.ends_at,
                    capacity: s.capacity,
                    price_amount: s.price_amount,
                    status: s.status,
                })
            })
            .collect();
        rows.sort_by_key(|r| (r.lane_no, r.starts_at));
        Ok(rows)
    }

    async fn set_slot_status_if(
        &self,
        id: Uuid,
        expected: LaneScheduleStatus,
        expected_holder: Option<Uuid>,
        next: LaneScheduleStatus,
    ) -> Result<Option<LaneScheduleRow>, StoreError> {
        let mut state = self.state.lock();
        state.check_available()?;

        let Some(slot) = state.slots.get_mut(&id) else {
            return Ok(None);
        };
        if slot.status != expected || slot.reservation_id != expected_holder {
            return Ok(None);
        }
        slot.status = next;
        slot.updated_at = Utc::now();
        Ok(Some(slot.clone()))
    }

    async fn claim_slots(
        &self,
        user_id: Uuid,
        slot_ids: &[Uuid],
    ) -> Result<ReservationWithSlots, ClaimError> {
        if slot_ids.is_empty() {
            return Err(ClaimError::NoSlots);
        }

        let mut state = self.state.lock();
        state.check_available()?;

        let unknown: Vec<Uuid> = slot_ids
            .iter()
            .filter(|id| !state.slots.contains_key(*id))
            .copied()
            .collect();
        if !unknown.is_empty() {
            return Err(ClaimError::UnknownSlots(unknown));
        }

        let taken: Vec<Uuid> = slot_ids
            .iter()
            .filter(|id| {
                state
                    .slots
                    .get(*id)
                    .is_some_and(|s| s.status != LaneScheduleStatus::Available)
            })
            .copied()
            .collect();
        if !taken.is_empty() {
            return Err(ClaimError::SlotsTaken(taken));
        }

        // Every check passed: apply all mutations before releasing the lock
        let now = Utc::now();
        let reservation = LaneReservationRow {
            id: Uuid::new_v4(),
            user_id,
            status: ReservationStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let mut claimed = Vec::with_capacity(slot_ids.len());
        for id in slot_ids {
            if let Some(slot) = state.slots.get_mut(id) {
                slot.status = LaneScheduleStatus::Pending;
                slot.reservation_id = Some(reservation.id);
                slot.updated_at = now;
                claimed.push(slot.clone());
            }
        }

        state.claims.insert(reservation.id, slot_ids.to_vec());
        state.reservations.insert(reservation.id, reservation.clone());

        Ok(ReservationWithSlots {
            reservation,
            slots: in_request_order(claimed, slot_ids),
        })
    }

    async fn get_reservation(&self, id: Uuid) -> Result<Option<ReservationWithSlots>, StoreError> {
        let state = self.state.lock();
        state.check_available()?;
        Ok(state.reservation_with_slots(id))
    }

    async fn transition_reservation(
        &self,
        id: Uuid,
        next: ReservationStatus,
        expected: Option<ReservationStatus>,
    ) -> Result<ReservationTransition, StoreError> {
        let mut state = self.state.lock();
        state.check_available()?;

        let Some(current) = state.reservations.get(&id).map(|r| r.status) else {
            return Ok(ReservationTransition::NotFound);
        };

        if !current.can_transition_to(next) || expected.is_some_and(|s| s != current) {
            return Ok(state
                .reservation_with_slots(id)
                .map(ReservationTransition::Unchanged)
                .unwrap_or(ReservationTransition::NotFound));
        }

        let now = Utc::now();
        let slot_ids = state.claims.get(&id).cloned().unwrap_or_default();
        for slot_id in &slot_ids {
            let Some(slot) = state.slots.get_mut(slot_id) else {
                continue;
            };
            if slot.reservation_id != Some(id) {
                continue;
            }
            match next {
                ReservationStatus::Confirmed => {
                    if slot.status.can_transition_to(LaneScheduleStatus::Confirmed) {
                        slot.status = LaneScheduleStatus::Confirmed;
                        slot.updated_at = now;
                    }
                }
                ReservationStatus::Canceled | ReservationStatus::Rejected => {
                    // Blocked slots stay blocked and only lose their holder
                    if slot.status.is_held()
                        && slot.status.can_transition_to(LaneScheduleStatus::Available)
                    {
                        slot.status = LaneScheduleStatus::Available;
                    }
                    slot.reservation_id = None;
                    slot.updated_at = now;
                }
                ReservationStatus::Pending => {}
            }
        }

        if let Some(reservation) = state.reservations.get_mut(&id) {
            reservation.status = next;
            reservation.updated_at = now;
        }

        Ok(state
            .reservation_with_slots(id)
            .map(ReservationTransition::Applied)
            .unwrap_or(ReservationTransition::NotFound))
    }

    async fn reservation_pool_ids(&self, id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let state = self.state.lock();
        state.check_available()?;

        let mut pool_ids: Vec<Uuid> = state
            .claims
            .get(&id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|s| state.slots.get(s).map(|slot| slot.pool_id))
                    .collect()
            })
            .unwrap_or_default();
        pool_ids.sort();
        pool_ids.dedup();
        Ok(pool_ids)
    }

    async fn stale_pending_reservations(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, StoreError> {
        let state = self.state.lock();
        state.check_available()?;

        let mut stale: Vec<&LaneReservationRow> = state
            .reservations
            .values()
            .filter(|r| r.status == ReservationStatus::Pending && r.created_at < created_before)
            .collect();
        stale.sort_by_key(|r| r.created_at);
        Ok(stale.into_iter().map(|r| r.id).collect())
    }

    async fn is_active_member(&self, admin_id: Uuid, pool_id: Uuid) -> Result<bool, StoreError> {
        let state = self.state.lock();
        state.check_available()?;

        Ok(state.memberships.iter().any(|m| {
            m.admin_id == admin_id && m.pool_id == pool_id && m.status == MembershipStatus::Active
        }))
    }

    async fn active_pool_ids(&self, admin_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let state = self.state.lock();
        state.check_available()?;

        Ok(state
            .memberships
            .iter()
            .filter(|m| m.admin_id == admin_id && m.status == MembershipStatus::Active)
            .map(|m| m.pool_id)
            .collect())
    }

    async fn insert_app_user(&self, data: CreateProfile) -> Result<AppUserRow, StoreError> {
        let mut state = self.state.lock();
        state.check_available()?;

        if !state.identities.contains(&data.id) {
            return Err(StoreError::ForeignKey(format!(
                "app_user.id {} is not present in auth.users",
                data.id
            )));
        }
        if state.app_users.contains_key(&data.id) {
            return Err(StoreError::Duplicate(format!("app_user {} already exists", data.id)));
        }

        let row = AppUserRow {
            id: data.id,
            display_name: data.display_name,
            phone: data.phone,
            created_at: Utc::now(),
        };
        state.app_users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn insert_admin_user(&self, data: CreateProfile) -> Result<AdminUserRow, StoreError> {
        let mut state = self.state.lock();
        state.check_available()?;

        if !state.identities.contains(&data.id) {
            return Err(StoreError::ForeignKey(format!(
                "admin_user.id {} is not present in auth.users",
                data.id
            )));
        }
        if state.admin_users.contains_key(&data.id) {
            return Err(StoreError::Duplicate(format!(
                "admin_user {} already exists",
                data.id
            )));
        }

        let row = AdminUserRow {
            id: data.id,
            display_name: data.display_name,
            phone: data.phone,
            status: UseStatus::Use,
            created_at: Utc::now(),
        };
        state.admin_users.insert(row.id, row.clone());
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn seeded(count: u32) -> (MemoryBookingStore, Vec<Uuid>) {
        let store = MemoryBookingStore::new();
        let pool = store.add_pool("Olympic Pool", Some("Seoul"));
        let lane = store.add_lane(pool.id, 1);
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let ids = (0..count)
            .map(|hour| {
                let starts_at = Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap();
                store
                    .add_slot(CreateLaneSchedule {
                        lane_id: lane.id,
                        pool_id: pool.id,
                        schedule_date: date,
                        starts_at,
                        ends_at: starts_at + chrono::Duration::hours(1),
                        capacity: None,
                        price_amount: None,
                    })
                    .unwrap()
                    .id
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn rejects_second_slot_at_same_start() {
        let (store, ids) = seeded(1);
        let slot = store.state.lock().slots[&ids[0]].clone();

        let err = store
            .add_slot(CreateLaneSchedule {
                lane_id: slot.lane_id,
                pool_id: slot.pool_id,
                schedule_date: slot.schedule_date,
                starts_at: slot.starts_at,
                ends_at: slot.ends_at,
                capacity: None,
                price_amount: None,
            })
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn claim_returns_slots_in_request_order() {
        let (store, ids) = seeded(3);
        let requested = vec![ids[2], ids[0], ids[1]];

        let reservation = store.claim_slots(Uuid::new_v4(), &requested).await.unwrap();
        assert_eq!(reservation.slot_ids(), requested);
    }

    #[tokio::test]
    async fn unknown_ids_are_reported_before_taken_ones() {
        let (store, ids) = seeded(1);
        assert!(store.block_slot(ids[0]));
        let missing = Uuid::new_v4();

        let err = store
            .claim_slots(Uuid::new_v4(), &[ids[0], missing])
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::UnknownSlots(ref u) if u == &vec![missing]));
    }

    #[tokio::test]
    async fn release_keeps_blocked_slots_blocked_but_drops_holder() {
        let (store, ids) = seeded(2);
        let reservation = store.claim_slots(Uuid::new_v4(), &ids).await.unwrap();
        let id = reservation.reservation.id;
        store
            .transition_reservation(id, ReservationStatus::Confirmed, None)
            .await
            .unwrap();
        store
            .set_slot_status_if(
                ids[1],
                LaneScheduleStatus::Confirmed,
                Some(id),
                LaneScheduleStatus::Blocked,
            )
            .await
            .unwrap()
            .expect("slot still confirmed");

        store
            .transition_reservation(id, ReservationStatus::Canceled, None)
            .await
            .unwrap();

        let first = store.get_slot(ids[0]).await.unwrap().unwrap();
        let second = store.get_slot(ids[1]).await.unwrap().unwrap();
        assert_eq!(first.status, LaneScheduleStatus::Available);
        assert_eq!(second.status, LaneScheduleStatus::Blocked);
        assert_eq!(second.reservation_id, None);
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let (store, ids) = seeded(1);
        store.set_unavailable(true);

        assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));
        assert!(matches!(
            store.claim_slots(Uuid::new_v4(), &ids).await,
            Err(ClaimError::Store(StoreError::Unavailable(_)))
        ));
    }
}
