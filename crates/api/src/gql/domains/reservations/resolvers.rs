use async_graphql::{Context, Object, Result};
use uuid::Uuid;

use super::types::Reservation;
use crate::auth::permissions::require_user;
use crate::gql::error::GqlResultExt;
use crate::state::AppState;

#[derive(Default)]
pub struct ReservationQuery;

#[Object]
impl ReservationQuery {
    /// A reservation visible to its owner or to the admins of its pools.
    async fn reservation(&self, ctx: &Context<'_>, id: Uuid) -> Result<Reservation> {
        let user_id = require_user(ctx).gql()?;
        let state = ctx.data::<AppState>()?;

        let reservation = state
            .coordinator()
            .get_reservation(user_id, id)
            .await
            .gql()?;
        Ok(reservation.into())
    }
}

#[derive(Default)]
pub struct ReservationMutation;

#[Object]
impl ReservationMutation {
    /// Claim 1 to 4 slots at once. Either every slot is reserved or none is.
    async fn create_reservation(
        &self,
        ctx: &Context<'_>,
        schedule_ids: Vec<Uuid>,
    ) -> Result<Reservation> {
        let user_id = require_user(ctx).gql()?;
        let state = ctx.data::<AppState>()?;

        let reservation = state
            .coordinator()
            .create_reservation(user_id, &schedule_ids)
            .await
            .gql()?;
        Ok(reservation.into())
    }

    async fn cancel_reservation(
        &self,
        ctx: &Context<'_>,
        reservation_id: Uuid,
    ) -> Result<Reservation> {
        let user_id = require_user(ctx).gql()?;
        let state = ctx.data::<AppState>()?;

        let reservation = state
            .coordinator()
            .cancel_reservation(user_id, reservation_id)
            .await
            .gql()?;
        Ok(reservation.into())
    }
}
