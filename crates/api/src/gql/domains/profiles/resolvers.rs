use async_graphql::{Context, Object, Result};

use super::types::{AdminProfile, RegisterProfileInput, UserProfile};
use crate::auth::permissions::require_user;
use crate::gql::error::GqlResultExt;
use crate::services::profiles;
use crate::state::AppState;

#[derive(Default)]
pub struct ProfileMutation;

#[Object]
impl ProfileMutation {
    /// Create the app profile of the calling identity, right after sign-up.
    async fn register_profile(
        &self,
        ctx: &Context<'_>,
        input: RegisterProfileInput,
    ) -> Result<UserProfile> {
        let identity_id = require_user(ctx).gql()?;
        let state = ctx.data::<AppState>()?;

        let row = profiles::register_user_profile(
            state.store.as_ref(),
            identity_id,
            &input.display_name,
            input.phone.as_deref(),
        )
        .await
        .gql()?;
        Ok(row.into())
    }

    async fn register_admin_profile(
        &self,
        ctx: &Context<'_>,
        input: RegisterProfileInput,
    ) -> Result<AdminProfile> {
        let identity_id = require_user(ctx).gql()?;
        let state = ctx.data::<AppState>()?;

        let row = profiles::register_admin_profile(
            state.store.as_ref(),
            identity_id,
            &input.display_name,
            input.phone.as_deref(),
        )
        .await
        .gql()?;
        Ok(row.into())
    }
}
