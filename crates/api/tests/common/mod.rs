use std::sync::Arc;

use api::auth::Claims;
use api::config::AppConfig;
use api::gql::{build_schema, LanebookSchema};
use api::AppState;
use async_graphql::{Request, Variables};
use chrono::{NaiveDate, TimeZone, Utc};
use infra::models::{LaneRow, LaneScheduleRow, MembershipStatus, PoolRow};
use infra::repos::CreateLaneSchedule;
use infra::MemoryBookingStore;
use uuid::Uuid;

pub struct TestApp {
    pub store: Arc<MemoryBookingStore>,
    pub state: AppState,
    pub schema: LanebookSchema,
}

pub fn setup_test_app() -> TestApp {
    let store = Arc::new(MemoryBookingStore::new());
    let state = AppState::new(store.clone(), AppConfig::for_tests("test-secret"));
    let schema = build_schema(state.clone());

    TestApp {
        store,
        state,
        schema,
    }
}

/// Helper function to execute GraphQL queries and mutations
pub async fn execute_graphql(
    schema: &LanebookSchema,
    query: &str,
    variables: Option<Variables>,
    auth_claims: Option<Claims>,
) -> async_graphql::Response {
    let mut request = Request::new(query);

    if let Some(vars) = variables {
        request = request.variables(vars);
    }

    if let Some(claims) = auth_claims {
        request = request.data(claims);
    }

    schema.execute(request).await
}

pub fn claims_for(user_id: Uuid) -> Claims {
    Claims::new(user_id, format!("{user_id}@example.com"), 60)
}

/// Error code carried in the first GraphQL error, if any.
#[allow(dead_code)]
pub fn error_code(response: &async_graphql::Response) -> Option<String> {
    let error = serde_json::to_value(response.errors.first()?).ok()?;
    error["extensions"]["code"].as_str().map(str::to_string)
}

#[allow(dead_code)]
pub struct SeededPool {
    pub pool: PoolRow,
    pub lanes: Vec<LaneRow>,
}

/// Pool with `lane_count` lanes numbered from 1.
#[allow(dead_code)]
pub fn seed_pool(store: &MemoryBookingStore, name: &str, lane_count: i32) -> SeededPool {
    let pool = store.add_pool(name, Some("Seoul"));
    let lanes = (1..=lane_count)
        .map(|n| store.add_lane(pool.id, n))
        .collect();
    SeededPool { pool, lanes }
}

/// One hour slot on `date` starting at `hour` UTC.
#[allow(dead_code)]
pub fn seed_slot(
    store: &MemoryBookingStore,
    lane: &LaneRow,
    date: NaiveDate,
    hour: u32,
) -> LaneScheduleRow {
    let starts_at = Utc.from_utc_datetime(&date.and_hms_opt(hour, 0, 0).unwrap());
    store
        .add_slot(CreateLaneSchedule {
            lane_id: lane.id,
            pool_id: lane.pool_id,
            schedule_date: date,
            starts_at,
            ends_at: starts_at + chrono::Duration::hours(1),
            capacity: Some(6),
            price_amount: Some(5000),
        })
        .expect("Failed to seed slot")
}

/// `count` consecutive slots on the first lane, starting at 00:00 UTC.
#[allow(dead_code)]
pub fn seed_slots(store: &MemoryBookingStore, lane: &LaneRow, count: u32) -> Vec<LaneScheduleRow> {
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    (0..count).map(|h| seed_slot(store, lane, date, h)).collect()
}

/// Admin identity with an active membership on `pool_id`.
#[allow(dead_code)]
pub fn create_pool_admin(store: &MemoryBookingStore, pool_id: Uuid) -> Uuid {
    let admin_id = Uuid::new_v4();
    store.grant_membership(admin_id, pool_id, MembershipStatus::Active);
    admin_id
}
