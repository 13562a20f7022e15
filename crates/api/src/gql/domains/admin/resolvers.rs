use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use crate::auth::permissions::require_user;
use crate::gql::domains::pools::types::{Pool, SlotStatus};
use crate::gql::domains::reservations::types::{Reservation, Slot};
use crate::gql::error::GqlResultExt;
use crate::services::{access, slots};
use crate::state::AppState;

#[derive(Default)]
pub struct AdminQuery;

#[Object]
impl AdminQuery {
    /// Pools the caller holds an active membership for.
    async fn my_managed_pools(&self, ctx: &Context<'_>) -> Result<Vec<Pool>> {
        let admin_id = require_user(ctx).gql()?;
        let state = ctx.data::<AppState>()?;

        let rows = access::managed_pools(state.store.as_ref(), admin_id)
            .await
            .gql()?;
        Ok(rows.into_iter().map(Pool::from).collect())
    }
}

#[derive(Default)]
pub struct AdminMutation;

#[Object]
impl AdminMutation {
    async fn confirm_reservation(
        &self,
        ctx: &Context<'_>,
        reservation_id: Uuid,
    ) -> Result<Reservation> {
        let admin_id = require_user(ctx).gql()?;
        let state = ctx.data::<AppState>()?;

        let reservation = state
            .coordinator()
            .confirm(admin_id, reservation_id)
            .await
            .gql()?;
        Ok(reservation.into())
    }

    async fn reject_reservation(
        &self,
        ctx: &Context<'_>,
        reservation_id: Uuid,
    ) -> Result<Reservation> {
        let admin_id = require_user(ctx).gql()?;
        let state = ctx.data::<AppState>()?;

        let reservation = state
            .coordinator()
            .reject(admin_id, reservation_id)
            .await
            .gql()?;
        Ok(reservation.into())
    }

    /// Block or unblock a slot.
    async fn set_slot_status(
        &self,
        ctx: &Context<'_>,
        slot_id: Uuid,
        status: SlotStatus,
    ) -> Result<Slot> {
        let admin_id = require_user(ctx).gql()?;
        let state = ctx.data::<AppState>()?;

        let row = slots::set_slot_status(state.store.as_ref(), admin_id, slot_id, status.into())
            .await
            .gql()?;
        Ok(row.into())
    }
}
