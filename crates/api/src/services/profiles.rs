use infra::models::{AdminUserRow, AppUserRow};
use infra::repos::CreateProfile;
use infra::{BookingStore, StoreError};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::services::propagation::{with_identity_propagation, PropagationError};

pub async fn register_user_profile(
    store: &dyn BookingStore,
    identity_id: Uuid,
    display_name: &str,
    phone: Option<&str>,
) -> Result<AppUserRow, AppError> {
    let data = profile_input(identity_id, display_name, phone)?;

    let row = with_identity_propagation("app_user insert", || {
        store.insert_app_user(data.clone())
    })
    .await
    .map_err(profile_error)?;

    info!(user_id = %row.id, "user profile registered");
    Ok(row)
}

pub async fn register_admin_profile(
    store: &dyn BookingStore,
    identity_id: Uuid,
    display_name: &str,
    phone: Option<&str>,
) -> Result<AdminUserRow, AppError> {
    let data = profile_input(identity_id, display_name, phone)?;

    let row = with_identity_propagation("admin_user insert", || {
        store.insert_admin_user(data.clone())
    })
    .await
    .map_err(profile_error)?;

    info!(admin_id = %row.id, "admin profile registered");
    Ok(row)
}

fn profile_input(
    identity_id: Uuid,
    display_name: &str,
    phone: Option<&str>,
) -> Result<CreateProfile, AppError> {
    let display_name = display_name.trim();
    if display_name.is_empty() {
        return Err(AppError::Validation("display name is required".to_string()));
    }

    Ok(CreateProfile {
        id: identity_id,
        display_name: display_name.to_string(),
        phone: phone
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
    })
}

fn profile_error(e: PropagationError<StoreError>) -> AppError {
    match e {
        PropagationError::Failed(e) if e.is_unique_violation() => {
            AppError::Conflict("profile already exists".to_string())
        }
        PropagationError::Failed(e) => AppError::infra("profile registration failed", &e),
        PropagationError::Exhausted {
            last_error,
            attempts,
        } => AppError::infra(
            &format!("identity not visible after {attempts} attempts"),
            &last_error,
        ),
    }
}
