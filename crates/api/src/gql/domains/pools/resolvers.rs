use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use super::types::{LaneScheduleDay, LaneScheduleStats, Pool};
use crate::gql::error::GqlResultExt;
use crate::services::availability;
use crate::state::AppState;

#[derive(Default)]
pub struct PoolQuery;

#[Object]
impl PoolQuery {
    /// Pool directory. `region` matches exactly, `name` is a case-insensitive substring.
    async fn pools(
        &self,
        ctx: &Context<'_>,
        region: Option<String>,
        name: Option<String>,
    ) -> Result<Vec<Pool>> {
        let state = ctx.data::<AppState>()?;
        let rows = availability::list_pools(state.store.as_ref(), region, name)
            .await
            .gql()?;
        Ok(rows.into_iter().map(Pool::from).collect())
    }

    /// Per-date slot counts for one month. `year` defaults to the current year.
    async fn lane_schedule_stats(
        &self,
        ctx: &Context<'_>,
        pool_id: Uuid,
        year: Option<i32>,
        month: i32,
    ) -> Result<LaneScheduleStats> {
        let state = ctx.data::<AppState>()?;
        let year = year.unwrap_or_else(|| availability::current_year(state.pool_offset()));

        // Negative months fall through to the range check as 0
        let days = availability::monthly_availability(
            state.store.as_ref(),
            pool_id,
            year,
            u32::try_from(month).unwrap_or(0),
        )
        .await
        .gql()?;

        Ok(LaneScheduleStats::new(pool_id.into(), year, month, days))
    }

    /// Lane grid of one pool for one `YYYY-MM-DD` date.
    async fn lane_schedule(
        &self,
        ctx: &Context<'_>,
        pool_id: Uuid,
        date: String,
    ) -> Result<LaneScheduleDay> {
        let state = ctx.data::<AppState>()?;
        let lanes =
            availability::daily_grid(state.store.as_ref(), pool_id, &date, state.pool_offset())
                .await
                .gql()?;

        Ok(LaneScheduleDay {
            pool_id: pool_id.into(),
            date,
            lanes: lanes.into_iter().map(Into::into).collect(),
        })
    }
}
