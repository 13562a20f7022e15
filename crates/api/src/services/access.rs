//! Membership is the only administrative capability. Roles carried in
//! tokens are ignored.

use infra::models::PoolRow;
use infra::BookingStore;
use uuid::Uuid;

use crate::error::AppError;

/// True iff `admin_id` holds an active membership for `pool_id`.
pub async fn is_authorized_admin(
    store: &dyn BookingStore,
    admin_id: Uuid,
    pool_id: Uuid,
) -> Result<bool, AppError> {
    Ok(store.is_active_member(admin_id, pool_id).await?)
}

pub async fn require_pool_admin(
    store: &dyn BookingStore,
    admin_id: Uuid,
    pool_id: Uuid,
) -> Result<(), AppError> {
    if is_authorized_admin(store, admin_id, pool_id).await? {
        Ok(())
    } else {
        tracing::warn!(%admin_id, %pool_id, "admin action without active membership");
        Err(AppError::Forbidden(
            "Access denied: you do not manage this pool".to_string(),
        ))
    }
}

/// Require membership on every pool in `pool_ids`. An empty list is denied,
/// since nobody manages it.
pub async fn require_admin_of_all(
    store: &dyn BookingStore,
    admin_id: Uuid,
    pool_ids: &[Uuid],
) -> Result<(), AppError> {
    if pool_ids.is_empty() {
        return Err(AppError::Forbidden(
            "Access denied: reservation is not attached to any pool".to_string(),
        ));
    }
    for pool_id in pool_ids {
        require_pool_admin(store, admin_id, *pool_id).await?;
    }
    Ok(())
}

/// Pools the admin currently manages, ordered by name.
pub async fn managed_pools(
    store: &dyn BookingStore,
    admin_id: Uuid,
) -> Result<Vec<PoolRow>, AppError> {
    let pool_ids = store.active_pool_ids(admin_id).await?;
    if pool_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(store.pools_by_ids(&pool_ids).await?)
}
