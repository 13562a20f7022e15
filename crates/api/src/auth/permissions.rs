use async_graphql::Context;
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::AppError;

/// Identity of the caller, taken from the verified bearer token.
pub fn require_user(ctx: &Context<'_>) -> Result<Uuid, AppError> {
    let claims = ctx.data::<Claims>().map_err(|_| {
        AppError::Unauthenticated("You must be logged in to perform this action".to_string())
    })?;

    claims.user_id()
}
